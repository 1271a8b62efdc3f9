//! Identity provider mirror.
//!
//! The local `users` row is authoritative; the provider only receives a copy
//! of role and status in the user's public metadata so that session claims
//! pick it up on the next token refresh.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::{
  entity::{UserRole, UserStatus},
  prelude::*,
};

pub const API_URL: &str = "https://api.clerk.com/v1/";

#[async_trait]
pub trait Identity: Send + Sync {
  async fn set_status(
    &self,
    clerk_id: &str,
    role: UserRole,
    status: UserStatus,
  ) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct MetadataPatch {
  public_metadata: PublicMetadata,
}

#[derive(Debug, Serialize)]
struct PublicMetadata {
  role: &'static str,
  status: UserStatus,
}

fn role_claim(role: UserRole) -> &'static str {
  match role {
    UserRole::Admin => "org:admin",
    UserRole::Tutor => "TUTOR",
    UserRole::Learner => "LEARNER",
  }
}

#[derive(Clone)]
pub struct Clerk {
  client: Client,
  base_url: String,
  secret_key: String,
}

impl Clerk {
  pub fn new(secret_key: String) -> Self {
    Self { client: Client::new(), base_url: API_URL.to_string(), secret_key }
  }
}

#[async_trait]
impl Identity for Clerk {
  async fn set_status(
    &self,
    clerk_id: &str,
    role: UserRole,
    status: UserStatus,
  ) -> Result<()> {
    if self.secret_key.is_empty() {
      return Err(Error::External("Identity provider not configured".into()));
    }

    let url = format!("{}users/{}/metadata", self.base_url, clerk_id);
    let body = MetadataPatch {
      public_metadata: PublicMetadata { role: role_claim(role), status },
    };

    let response = self
      .client
      .patch(&url)
      .bearer_auth(&self.secret_key)
      .json(&body)
      .send()
      .await
      .map_err(|e| Error::External(format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
      return Err(Error::External(format!(
        "Metadata update rejected with {}",
        response.status()
      )));
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_metadata_shape() {
    let body = MetadataPatch {
      public_metadata: PublicMetadata {
        role: role_claim(UserRole::Tutor),
        status: UserStatus::Suspended,
      },
    };

    assert_eq!(
      json::to_value(&body).unwrap(),
      json::json!({
        "public_metadata": { "role": "TUTOR", "status": "SUSPENDED" }
      })
    );
  }

  #[test]
  fn test_admin_claim_round_trips() {
    assert_eq!(UserRole::from_claim(role_claim(UserRole::Admin)), UserRole::Admin);
  }
}
