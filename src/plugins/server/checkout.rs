use axum::{
  Json,
  body::Bytes,
  extract::{Path, State},
  http::HeaderMap,
};
use serde::Deserialize;

use super::{Ack, ack};
use crate::{
  entity::{purchase, user_learning_path},
  prelude::*,
  state::AppState,
  sv::{
    checkout::WebhookOutcome,
    paystack::{Paystack, WebhookEvent},
  },
};

const SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Deserialize)]
pub struct PurchaseReq {
  reference: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EnrollPathReq {
  reference: Option<String>,
}

pub async fn purchase(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(req): Json<PurchaseReq>,
) -> Result<Json<purchase::Model>> {
  let purchase =
    app.sv().checkout.purchase_course(&ctx, &id, &req.reference).await?;
  Ok(Json(purchase))
}

pub async fn enroll(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Json<purchase::Model>> {
  Ok(Json(app.sv().checkout.enroll_free(&ctx, &id).await?))
}

pub async fn enroll_path(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(req): Json<EnrollPathReq>,
) -> Result<Json<user_learning_path::Model>> {
  let enrolment = app
    .sv()
    .checkout
    .enroll_path(&ctx, &id, req.reference.as_deref())
    .await?;
  Ok(Json(enrolment))
}

/// Paystack charge notifications. The raw body is needed for the signature.
pub async fn webhook(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Ack> {
  let secret = &app.config.paystack_secret_key;
  let signature = headers
    .get(SIGNATURE_HEADER)
    .and_then(|value| value.to_str().ok())
    .unwrap_or_default();

  if secret.is_empty() || !Paystack::verify_signature(secret, &body, signature)
  {
    warn!("Rejected payment webhook with a bad signature");
    return Err(Error::Unauthorized);
  }

  let event: WebhookEvent = json::from_slice(&body)
    .map_err(|err| Error::InvalidArgs(format!("Malformed event: {err}")))?;

  match app.sv().checkout.handle_webhook(event).await? {
    WebhookOutcome::Ignored => {}
    WebhookOutcome::Course(purchase) => {
      info!(reference = %purchase.payment_reference, "course purchase recorded");
    }
    WebhookOutcome::Path(enrolment) => {
      info!(path = %enrolment.path_id, "path enrolment recorded");
    }
  }

  Ok(ack())
}
