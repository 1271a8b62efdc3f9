use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::prelude::*;

#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct Message<'a> {
  from: &'a str,
  to: [&'a str; 1],
  subject: &'a str,
  html: &'a str,
}

/// Transactional mail over a JSON HTTP endpoint.
#[derive(Clone)]
pub struct HttpMailer {
  client: Client,
  url: String,
  api_key: String,
  from: String,
}

impl HttpMailer {
  pub fn new(url: String, api_key: String, from: String) -> Self {
    Self { client: Client::new(), url, api_key, from }
  }
}

#[async_trait]
impl Mailer for HttpMailer {
  async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
    if self.url.is_empty() {
      debug!("Mail endpoint not configured, dropping `{subject}` to {to}");
      return Ok(());
    }

    let message = Message { from: &self.from, to: [to], subject, html };

    let response = self
      .client
      .post(&self.url)
      .bearer_auth(&self.api_key)
      .json(&message)
      .send()
      .await
      .map_err(|e| Error::External(format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
      return Err(Error::External(format!(
        "Mail rejected with {}",
        response.status()
      )));
    }

    Ok(())
  }
}

pub fn tutor_approved(name: Option<&str>) -> (String, String) {
  let subject = "Your tutor account has been approved".to_string();
  let html = format!(
    "<p>Hi {},</p><p>Your tutor application was approved. You can now \
     create courses and submit them for review.</p>",
    name.unwrap_or("there")
  );
  (subject, html)
}
