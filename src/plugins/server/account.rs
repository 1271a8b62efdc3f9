use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;

use super::Limit;
use crate::{
  entity::{course, point_transaction, user},
  prelude::*,
  state::AppState,
  sv::{
    gamification::{Summary, WatchTick},
    learning_path::EnrolledPath,
    progress::CourseCompletion,
    user::Profile,
  },
  utils::{Page, PageQuery},
};

#[derive(Debug, Deserialize)]
pub struct Preferences {
  #[serde(default)]
  interests: Vec<String>,
  goal: Option<String>,
}

pub async fn me(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
) -> Result<Json<user::Model>> {
  Ok(Json(app.sv().user.current(&ctx).await?))
}

/// Called by the frontend after sign-in with the provider's profile.
pub async fn sync(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Json(profile): Json<Profile>,
) -> Result<Json<user::Model>> {
  Ok(Json(app.sv().user.sync(&ctx, profile).await?))
}

pub async fn preferences(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Json(req): Json<Preferences>,
) -> Result<Json<user::Model>> {
  let user =
    app.sv().user.update_preferences(&ctx, req.interests, req.goal).await?;
  Ok(Json(user))
}

pub async fn points(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
) -> Result<Json<Summary>> {
  Ok(Json(app.sv().gamification.summary(&ctx).await?))
}

pub async fn history(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Query(query): Query<PageQuery>,
) -> Result<Json<Page<point_transaction::Model>>> {
  Ok(Json(app.sv().gamification.history(&ctx, &query).await?))
}

/// Player heartbeat, sent once per watched minute.
pub async fn watch(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
) -> Result<Json<WatchTick>> {
  Ok(Json(app.sv().gamification.log_watch_minute(&ctx).await?))
}

pub async fn courses(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
) -> Result<Json<Vec<course::Model>>> {
  Ok(Json(app.sv().checkout.purchased_courses(&ctx).await?))
}

pub async fn progress(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
) -> Result<Json<Vec<CourseCompletion>>> {
  Ok(Json(app.sv().progress.course_completion(&ctx).await?))
}

pub async fn paths(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
) -> Result<Json<Vec<EnrolledPath>>> {
  Ok(Json(app.sv().path.my_paths(&ctx).await?))
}

pub async fn wishlist(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
) -> Result<Json<Vec<course::Model>>> {
  Ok(Json(app.sv().engagement.wishlist(&ctx).await?))
}

pub async fn recommendations(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Query(Limit { limit }): Query<Limit>,
) -> Result<Json<Vec<course::Model>>> {
  let courses =
    app.sv().recommend.for_user(&ctx, limit.unwrap_or(10)).await?;
  Ok(Json(courses))
}
