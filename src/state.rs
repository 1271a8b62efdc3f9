use std::env;

use crate::{
  prelude::*,
  sv::{
    self,
    clerk::{Clerk, Identity},
    mail::{HttpMailer, Mailer},
    mux::{Mux, VideoHost},
    paystack::{Payments, Paystack},
  },
};

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  /// Shared with the auth edge
  pub auth_secret: String,
  /// Trust identity headers without a secret; local development only
  pub insecure_headers: bool,
  pub clerk_secret_key: String,
  pub paystack_secret_key: String,
  pub mux_token_id: String,
  pub mux_token_secret: String,
  pub mail_api_url: String,
  pub mail_api_key: String,
  pub mail_from: String,
  pub reconcile_interval: Duration,
  pub reconcile_batch: u64,
  pub video_poll_attempts: u32,
  pub video_poll_interval: Duration,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: String::from("sqlite:academy.db?mode=rwc"),
      port: 3000,
      auth_secret: String::new(),
      insecure_headers: false,
      clerk_secret_key: String::new(),
      paystack_secret_key: String::new(),
      mux_token_id: String::new(),
      mux_token_secret: String::new(),
      mail_api_url: String::new(),
      mail_api_key: String::new(),
      mail_from: String::from("Academy <no-reply@academy.local>"),

      reconcile_interval: Duration::from_secs(300),
      reconcile_batch: 50,
      video_poll_attempts: 60,
      video_poll_interval: Duration::from_secs(2),
    }
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    Self::from_vars(|name| env::var(name).ok())
  }

  fn from_vars(
    lookup: impl Fn(&str) -> Option<String>,
  ) -> anyhow::Result<Self> {
    let mut config = Self::default();
    let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(url) = var("DATABASE_URL") {
      config.database_url = url;
    }
    if let Some(port) = var("PORT") {
      config.port = port.parse().context("PORT must be a port number")?;
    }
    if let Some(interval) = var("RECONCILE_INTERVAL") {
      config.reconcile_interval = humantime::parse_duration(&interval)
        .context("RECONCILE_INTERVAL must look like `5m`")?;
    }
    if let Some(interval) = var("VIDEO_POLL_INTERVAL") {
      config.video_poll_interval = humantime::parse_duration(&interval)
        .context("VIDEO_POLL_INTERVAL must look like `2s`")?;
    }

    config.auth_secret = var("AUTH_SECRET").unwrap_or_default();
    config.insecure_headers = var("AUTH_INSECURE")
      .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    config.clerk_secret_key = var("CLERK_SECRET_KEY").unwrap_or_default();
    config.paystack_secret_key =
      var("PAYSTACK_SECRET_KEY").unwrap_or_default();
    config.mux_token_id = var("MUX_TOKEN_ID").unwrap_or_default();
    config.mux_token_secret = var("MUX_TOKEN_SECRET").unwrap_or_default();
    config.mail_api_url = var("MAIL_API_URL").unwrap_or_default();
    config.mail_api_key = var("MAIL_API_KEY").unwrap_or_default();
    if let Some(from) = var("MAIL_FROM") {
      config.mail_from = from;
    }

    if config.auth_secret.is_empty() {
      if !config.insecure_headers {
        anyhow::bail!(
          "AUTH_SECRET not set (AUTH_INSECURE=true trusts identity headers as is)"
        );
      }
      warn!("AUTH_INSECURE is on, identity headers are trusted as is");
    }

    Ok(config)
  }
}

/// Clients for everything that lives outside the database.
#[derive(Clone)]
pub struct External {
  pub identity: Arc<dyn Identity>,
  pub mailer: Arc<dyn Mailer>,
  pub payments: Arc<dyn Payments>,
  pub video: Arc<dyn VideoHost>,
}

impl External {
  pub fn from_config(config: &Config) -> Self {
    Self {
      identity: Arc::new(Clerk::new(config.clerk_secret_key.clone())),
      mailer: Arc::new(HttpMailer::new(
        config.mail_api_url.clone(),
        config.mail_api_key.clone(),
        config.mail_from.clone(),
      )),
      payments: Arc::new(Paystack::new(config.paystack_secret_key.clone())),
      video: Arc::new(Mux::new(
        config.mux_token_id.clone(),
        config.mux_token_secret.clone(),
      )),
    }
  }
}

pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub moderation: sv::Moderation<'a>,
  pub course: sv::Course<'a>,
  pub content: sv::Content<'a>,
  pub quiz: sv::Quiz<'a>,
  pub progress: sv::Progress<'a>,
  pub gamification: sv::Gamification<'a>,
  pub path: sv::LearningPath<'a>,
  pub checkout: sv::Checkout<'a>,
  pub engagement: sv::Engagement<'a>,
  pub discussion: sv::Discussion<'a>,
  pub recommend: sv::Recommend<'a>,
  pub analytics: sv::Analytics<'a>,
  pub video: sv::Video<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  pub external: External,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    let external = External::from_config(&config);
    Self::with_external(config, external).await
  }

  pub async fn with_external(
    config: Config,
    external: External,
  ) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    migration::Migrator::up(&db, None)
      .await
      .context("Failed to run migrations")?;

    Ok(Self { db, config, external })
  }

  pub fn sv(&self) -> Services<'_> {
    let ext = &self.external;

    Services {
      user: sv::User::new(&self.db),
      moderation: sv::Moderation::new(
        &self.db,
        ext.identity.clone(),
        ext.mailer.clone(),
      ),
      course: sv::Course::new(&self.db),
      content: sv::Content::new(&self.db),
      quiz: sv::Quiz::new(&self.db),
      progress: sv::Progress::new(&self.db),
      gamification: sv::Gamification::new(&self.db),
      path: sv::LearningPath::new(&self.db),
      checkout: sv::Checkout::new(&self.db, ext.payments.clone()),
      engagement: sv::Engagement::new(&self.db),
      discussion: sv::Discussion::new(&self.db),
      recommend: sv::Recommend::new(&self.db),
      analytics: sv::Analytics::new(&self.db),
      video: sv::Video::new(
        &self.db,
        ext.video.clone(),
        self.config.video_poll_attempts,
        self.config.video_poll_interval,
      ),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    move |name| map.get(name).cloned()
  }

  #[test]
  fn test_auth_secret_is_required() {
    assert!(Config::from_vars(vars(&[])).is_err());
    assert!(Config::from_vars(vars(&[("AUTH_INSECURE", "no")])).is_err());
  }

  #[test]
  fn test_insecure_mode_is_explicit() {
    let config =
      Config::from_vars(vars(&[("AUTH_INSECURE", "true")])).unwrap();
    assert!(config.insecure_headers);
    assert!(config.auth_secret.is_empty());
  }

  #[test]
  fn test_env_values() {
    let config = Config::from_vars(vars(&[
      ("AUTH_SECRET", "s3cret"),
      ("PORT", "8080"),
      ("RECONCILE_INTERVAL", "10m"),
    ]))
    .unwrap();

    assert_eq!(config.auth_secret, "s3cret");
    assert!(!config.insecure_headers);
    assert_eq!(config.port, 8080);
    assert_eq!(config.reconcile_interval, Duration::from_secs(600));
  }
}
