//! Caller identity as asserted by the auth edge.
//!
//! Sessions are verified upstream by the identity provider; the edge forwards
//! the subject and its claims as headers together with a shared secret.

use axum::{
  extract::{FromRequestParts, OptionalFromRequestParts},
  http::request::Parts,
};

use crate::{
  entity::{UserRole, UserStatus},
  prelude::*,
  state::{AppState, Config},
};

pub const USER_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-user-role";
pub const STATUS_HEADER: &str = "x-user-status";
pub const SECRET_HEADER: &str = "x-auth-secret";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
  /// Subject id issued by the identity provider
  pub clerk_id: String,
  pub role: UserRole,
  pub status: Option<UserStatus>,
}

impl AuthContext {
  pub fn new(clerk_id: impl Into<String>, role: UserRole) -> Self {
    Self { clerk_id: clerk_id.into(), role, status: None }
  }

  pub fn is_admin(&self) -> bool {
    self.role == UserRole::Admin
  }

  pub fn require_admin(&self) -> Result<()> {
    if self.is_admin() { Ok(()) } else { Err(Error::Forbidden) }
  }

  pub fn require_tutor(&self) -> Result<()> {
    if self.role == UserRole::Tutor { Ok(()) } else { Err(Error::Forbidden) }
  }

  fn from_headers(parts: &Parts, config: &Config) -> Result<Self> {
    let header = |name: &str| {
      parts.headers.get(name).and_then(|value| value.to_str().ok())
    };

    let secret = config.auth_secret.as_str();
    let trusted = if secret.is_empty() {
      config.insecure_headers
    } else {
      header(SECRET_HEADER) == Some(secret)
    };
    if !trusted {
      return Err(Error::Unauthorized);
    }

    let clerk_id = header(USER_HEADER)
      .map(str::trim)
      .filter(|id| !id.is_empty())
      .ok_or(Error::Unauthorized)?;

    Ok(Self {
      clerk_id: clerk_id.to_string(),
      role: header(ROLE_HEADER).map(UserRole::from_claim).unwrap_or_default(),
      status: header(STATUS_HEADER).and_then(UserStatus::from_claim),
    })
  }
}

impl FromRequestParts<Arc<AppState>> for AuthContext {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self> {
    Self::from_headers(parts, &app.config)
  }
}

/// Anonymous when no subject is forwarded; a bad secret still rejects.
impl OptionalFromRequestParts<Arc<AppState>> for AuthContext {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Option<Self>> {
    if !parts.headers.contains_key(USER_HEADER) {
      return Ok(None);
    }
    Self::from_headers(parts, &app.config).map(Some)
  }
}
