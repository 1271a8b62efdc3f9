//! Payment verification against Paystack.
//! API docs: https://paystack.com/docs/api/transaction/#verify

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use serde::Deserialize;
use sha2::Sha512;

use crate::prelude::*;

pub const API_URL: &str = "https://api.paystack.co/";

/// A settled charge as reported by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
  pub reference: String,
  /// Minor currency units
  pub amount: i64,
  pub success: bool,
}

#[async_trait]
pub trait Payments: Send + Sync {
  async fn verify(&self, reference: &str) -> Result<Verified>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
  status: bool,
  message: String,
  data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Transaction {
  status: String,
  reference: String,
  amount: i64,
}

/// Webhook envelope; only `charge.success` is acted on.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
  pub event: String,
  pub data: WebhookCharge,
}

#[derive(Debug, Deserialize)]
pub struct WebhookCharge {
  pub reference: String,
  #[serde(default)]
  pub metadata: ChargeMetadata,
}

/// Metadata attached by the checkout page when the charge was created.
#[derive(Debug, Default, Deserialize)]
pub struct ChargeMetadata {
  pub user_id: Option<String>,
  pub course_id: Option<String>,
  pub path_id: Option<String>,
}

#[derive(Clone)]
pub struct Paystack {
  client: Client,
  base_url: String,
  secret_key: String,
}

impl Paystack {
  pub fn new(secret_key: String) -> Self {
    Self { client: Client::new(), base_url: API_URL.to_string(), secret_key }
  }

  /// Checks the `x-paystack-signature` header: hex HMAC-SHA512 of the raw
  /// body keyed by the secret key.
  pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
      return false;
    };
    let Ok(mut mac) = Hmac::<Sha512>::new_from_slice(secret.as_bytes()) else {
      return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
  }

  /// `transaction/verify/{reference}` with the reference as one encoded
  /// path segment.
  fn verify_url(&self, reference: &str) -> Result<Url> {
    let mut url = Url::parse(&self.base_url)
      .map_err(|e| Error::Internal(format!("Bad Paystack url: {e}")))?;
    url
      .path_segments_mut()
      .map_err(|_| Error::Internal("Paystack url cannot take a path".into()))?
      .pop_if_empty()
      .extend(["transaction", "verify", reference]);
    Ok(url)
  }
}

#[async_trait]
impl Payments for Paystack {
  async fn verify(&self, reference: &str) -> Result<Verified> {
    let url = self.verify_url(reference)?;

    let response = self
      .client
      .get(url)
      .bearer_auth(&self.secret_key)
      .send()
      .await
      .map_err(|e| Error::External(format!("Request failed: {}", e)))?;

    let api_response: ApiResponse<Transaction> =
      response.json().await.map_err(|e| {
        Error::External(format!("Failed to parse response: {}", e))
      })?;

    if !api_response.status {
      return Err(Error::Payment(api_response.message));
    }

    let tx = api_response
      .data
      .ok_or_else(|| Error::Payment("Empty verification result".into()))?;

    Ok(Verified {
      reference: tx.reference,
      amount: tx.amount,
      success: tx.status == "success",
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
  }

  #[test]
  fn test_signature_accepts_matching_digest() {
    let body = br#"{"event":"charge.success"}"#;
    let signature = sign("sk_test", body);

    assert!(Paystack::verify_signature("sk_test", body, &signature));
  }

  #[test]
  fn test_signature_rejects_tampering() {
    let body = br#"{"event":"charge.success"}"#;
    let signature = sign("sk_test", body);

    assert!(!Paystack::verify_signature("sk_other", body, &signature));
    assert!(!Paystack::verify_signature("sk_test", b"{}", &signature));
    assert!(!Paystack::verify_signature("sk_test", body, "not-hex"));
  }

  #[test]
  fn test_verify_url_keeps_reference_in_one_segment() {
    let paystack = Paystack::new("sk_test".into());

    let url = paystack.verify_url("T123").unwrap();
    assert_eq!(url.as_str(), "https://api.paystack.co/transaction/verify/T123");

    let url = paystack.verify_url("R?x=1/y").unwrap();
    assert_eq!(url.query(), None);
    assert_eq!(url.path(), "/transaction/verify/R%3Fx=1%2Fy");
  }

  #[test]
  fn test_webhook_parses_metadata() {
    let event: WebhookEvent = json::from_str(
      r#"{
        "event": "charge.success",
        "data": {
          "reference": "ref_1",
          "metadata": { "user_id": "u1", "course_id": "c1" }
        }
      }"#,
    )
    .unwrap();

    assert_eq!(event.event, "charge.success");
    assert_eq!(event.data.metadata.course_id.as_deref(), Some("c1"));
    assert_eq!(event.data.metadata.path_id, None);
  }
}
