mod account;
mod admin;
mod catalog;
mod checkout;
mod learn;
mod studio;

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::{
  Json, Router,
  routing::{delete, get, patch, post, put},
};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

type Ack = Json<json::Value>;

fn ack() -> Ack {
  Json(json::json!({ "success": true }))
}

#[derive(Debug, Deserialize)]
struct Order {
  ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Body {
  body: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Limit {
  limit: Option<u64>,
}

async fn health() -> Ack {
  ack()
}

pub fn router(app: Arc<AppState>) -> Router {
  let api = Router::new()
    // catalog
    .route("/courses", get(catalog::courses))
    .route("/courses/{id}", get(catalog::course))
    .route("/courses/{id}/outline", get(catalog::outline))
    .route("/courses/{id}/reviews", get(catalog::reviews))
    .route("/courses/{id}/stats", get(catalog::stats))
    .route("/popular", get(catalog::popular))
    .route("/paths", get(catalog::paths))
    .route("/paths/{id}", get(catalog::path))
    .route("/leaderboard", get(catalog::leaderboard))
    // account
    .route("/me", get(account::me))
    .route("/me/sync", post(account::sync))
    .route("/me/preferences", put(account::preferences))
    .route("/me/points", get(account::points))
    .route("/me/points/history", get(account::history))
    .route("/me/watch", post(account::watch))
    .route("/me/courses", get(account::courses))
    .route("/me/progress", get(account::progress))
    .route("/me/paths", get(account::paths))
    .route("/me/wishlist", get(account::wishlist))
    .route("/me/recommendations", get(account::recommendations))
    // learning
    .route("/courses/{id}/access", get(learn::access))
    .route("/courses/{id}/progress", get(learn::progress))
    .route("/courses/{id}/resume", get(learn::resume))
    .route("/courses/{id}/review", put(learn::review).delete(learn::unreview))
    .route("/courses/{id}/like", post(learn::like))
    .route("/courses/{id}/wishlist", put(learn::wish).delete(learn::unwish))
    .route("/lessons/{id}/complete", post(learn::complete))
    .route("/lessons/{id}/touch", post(learn::touch))
    .route("/lessons/{id}/quiz", get(learn::quiz).post(learn::submit))
    .route("/lessons/{id}/quiz/attempts", get(learn::attempts))
    .route("/lessons/{id}/questions", get(learn::threads).post(learn::ask))
    .route("/lessons/{id}/notes", get(learn::notes).post(learn::add_note))
    .route("/questions/{id}", delete(learn::delete_question))
    .route("/questions/{id}/answers", post(learn::answer))
    .route("/notes/{id}", patch(learn::edit_note).delete(learn::delete_note))
    // checkout
    .route("/courses/{id}/purchase", post(checkout::purchase))
    .route("/courses/{id}/enroll", post(checkout::enroll))
    .route("/paths/{id}/enroll", post(checkout::enroll_path))
    .route("/webhooks/paystack", post(checkout::webhook))
    // tutor studio
    .route("/studio/dashboard", get(studio::dashboard))
    .route("/studio/courses", get(studio::courses).post(studio::create))
    .route(
      "/studio/courses/{id}",
      patch(studio::update).delete(studio::delete),
    )
    .route("/studio/courses/{id}/submit", post(studio::submit))
    .route("/studio/courses/{id}/chapters", post(studio::create_chapter))
    .route("/studio/courses/{id}/chapters/order", put(studio::order_chapters))
    .route(
      "/studio/chapters/{id}",
      patch(studio::update_chapter).delete(studio::delete_chapter),
    )
    .route("/studio/chapters/{id}/lessons", post(studio::create_lesson))
    .route("/studio/chapters/{id}/lessons/order", put(studio::order_lessons))
    .route(
      "/studio/lessons/{id}",
      patch(studio::update_lesson).delete(studio::delete_lesson),
    )
    .route(
      "/studio/lessons/{id}/questions",
      get(studio::answer_key).post(studio::add_question),
    )
    .route(
      "/studio/questions/{id}",
      put(studio::update_question).delete(studio::delete_question),
    )
    .route("/studio/lessons/{id}/upload", post(studio::upload))
    .route("/studio/lessons/{id}/playback", post(studio::playback))
    // admin
    .route("/admin/overview", get(admin::overview))
    .route("/admin/tutors", get(admin::tutors))
    .route("/admin/tutors/pending", get(admin::pending_tutors))
    .route("/admin/tutors/{id}/{action}", post(admin::moderate_tutor))
    .route("/admin/courses", get(admin::courses))
    .route("/admin/courses/pending", get(admin::pending_courses))
    .route("/admin/courses/{id}/approve", post(admin::approve_course))
    .route("/admin/courses/{id}/reject", post(admin::reject_course))
    .route("/admin/paths", get(admin::paths).post(admin::create_path))
    .route(
      "/admin/paths/{id}",
      patch(admin::update_path).delete(admin::delete_path),
    )
    .route("/admin/paths/{id}/courses", post(admin::add_path_course))
    .route(
      "/admin/paths/{id}/courses/{course_id}",
      delete(admin::remove_path_course),
    )
    .route("/admin/paths/{id}/courses/order", put(admin::order_path_courses))
    .route("/admin/paths/{id}/publish", post(admin::publish_path));

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .with_state(app)
}

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(100)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let limiter = governor_conf.limiter().clone();
    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));

    let router = router(app)
      .layer(
        ServiceBuilder::new()
          .layer(TraceLayer::new_for_http())
          .layer(GovernorLayer::new(governor_conf))
          .layer(
            CorsLayer::new()
              .allow_origin(Any)
              .allow_methods(Any)
              .allow_headers(Any),
          ),
      )
      .into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP Server listening on {addr}");

    let limiter = async {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        limiter.retain_recent();
      }
    };

    let server = async {
      axum::serve(listener, router).await.context("Axum server error")
    };

    tokio::select! {
      result = server => {
        match &result {
          Ok(_) => info!("Server stopped gracefully"),
          Err(err) => error!("Server stopped with error: {err}"),
        }
        result
      }
      _ = limiter => {
        error!("Rate limiter cleaner stopped unexpectedly!");
        Ok(())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use axum::{body::Body as HttpBody, http::Request};
  use tower::ServiceExt;

  use super::*;
  use crate::{
    auth::{ROLE_HEADER, SECRET_HEADER, USER_HEADER},
    state::{Config, External},
    sv::test_utils::{FakeIdentity, FakeMailer, FakePayments, FakeVideo},
  };

  async fn app() -> Arc<AppState> {
    let config = Config {
      database_url: "sqlite::memory:".into(),
      auth_secret: "edge-secret".into(),
      ..Default::default()
    };
    let external = External {
      identity: Arc::new(FakeIdentity::default()),
      mailer: Arc::new(FakeMailer::default()),
      payments: Arc::new(FakePayments::default()),
      video: Arc::new(FakeVideo::default()),
    };
    Arc::new(AppState::with_external(config, external).await.unwrap())
  }

  async fn status(app: &Arc<AppState>, request: Request<HttpBody>) -> u16 {
    router(app.clone()).oneshot(request).await.unwrap().status().as_u16()
  }

  #[tokio::test]
  async fn test_health() {
    let app = app().await;
    let request = Request::get("/health").body(HttpBody::empty()).unwrap();

    assert_eq!(status(&app, request).await, 200);
  }

  #[tokio::test]
  async fn test_catalog_is_public_and_account_is_not() {
    let app = app().await;

    let request =
      Request::get("/api/courses?page=1").body(HttpBody::empty()).unwrap();
    assert_eq!(status(&app, request).await, 200);

    let request = Request::get("/api/me").body(HttpBody::empty()).unwrap();
    assert_eq!(status(&app, request).await, 401);
  }

  #[tokio::test]
  async fn test_learner_cannot_reach_admin() {
    let app = app().await;
    let request = Request::get("/api/admin/overview")
      .header(USER_HEADER, "clerk_1")
      .header(ROLE_HEADER, "learner")
      .header(SECRET_HEADER, "edge-secret")
      .body(HttpBody::empty())
      .unwrap();

    assert_eq!(status(&app, request).await, 403);
  }

  #[tokio::test]
  async fn test_claims_without_secret_are_rejected() {
    let app = app().await;
    let request = Request::get("/api/admin/overview")
      .header(USER_HEADER, "clerk_1")
      .header(ROLE_HEADER, "org:admin")
      .body(HttpBody::empty())
      .unwrap();

    assert_eq!(status(&app, request).await, 401);
  }
}
