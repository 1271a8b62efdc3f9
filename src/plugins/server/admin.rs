use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;

use super::{Ack, Order, ack};
use crate::{
  entity::{course, learning_path, learning_path_course, user},
  prelude::*,
  state::AppState,
  sv::{
    analytics::AdminOverview,
    learning_path::{PathInput, PathSummary},
    moderation::TutorAction,
  },
  utils::{Page, PageQuery},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RejectReq {
  reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathCourseReq {
  course_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PublishReq {
  published: bool,
}

pub async fn overview(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
) -> Result<Json<AdminOverview>> {
  Ok(Json(app.sv().analytics.admin_overview(&ctx).await?))
}

pub async fn tutors(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Query(query): Query<PageQuery>,
) -> Result<Json<Page<user::Model>>> {
  Ok(Json(app.sv().moderation.all_tutors(&ctx, &query).await?))
}

pub async fn pending_tutors(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
) -> Result<Json<Vec<user::Model>>> {
  Ok(Json(app.sv().moderation.pending_tutors(&ctx).await?))
}

/// `approve`, `reject`, `suspend`, `retract`, `ban` or `unban`.
pub async fn moderate_tutor(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path((id, action)): Path<(String, TutorAction)>,
) -> Result<Json<user::Model>> {
  Ok(Json(app.sv().moderation.transition(&ctx, &id, action).await?))
}

pub async fn courses(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Query(query): Query<PageQuery>,
) -> Result<Json<Page<course::Model>>> {
  Ok(Json(app.sv().course.all_courses(&ctx, &query).await?))
}

pub async fn pending_courses(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
) -> Result<Json<Vec<course::Model>>> {
  Ok(Json(app.sv().moderation.pending_courses(&ctx).await?))
}

pub async fn approve_course(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Json<course::Model>> {
  Ok(Json(app.sv().moderation.approve_course(&ctx, &id).await?))
}

pub async fn reject_course(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(req): Json<RejectReq>,
) -> Result<Json<course::Model>> {
  let course =
    app.sv().moderation.reject_course(&ctx, &id, req.reason).await?;
  Ok(Json(course))
}

pub async fn paths(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
) -> Result<Json<Vec<PathSummary>>> {
  Ok(Json(app.sv().path.all_paths(&ctx).await?))
}

pub async fn create_path(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Json(input): Json<PathInput>,
) -> Result<Json<learning_path::Model>> {
  Ok(Json(app.sv().path.create(&ctx, input).await?))
}

pub async fn update_path(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(input): Json<PathInput>,
) -> Result<Json<learning_path::Model>> {
  Ok(Json(app.sv().path.update(&ctx, &id, input).await?))
}

pub async fn delete_path(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Ack> {
  app.sv().path.delete(&ctx, &id).await?;
  Ok(ack())
}

pub async fn add_path_course(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(req): Json<PathCourseReq>,
) -> Result<Json<learning_path_course::Model>> {
  Ok(Json(app.sv().path.add_course(&ctx, &id, &req.course_id).await?))
}

pub async fn remove_path_course(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path((id, course_id)): Path<(String, String)>,
) -> Result<Ack> {
  app.sv().path.remove_course(&ctx, &id, &course_id).await?;
  Ok(ack())
}

pub async fn order_path_courses(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(order): Json<Order>,
) -> Result<Ack> {
  app.sv().path.reorder_courses(&ctx, &id, order.ids).await?;
  Ok(ack())
}

pub async fn publish_path(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(req): Json<PublishReq>,
) -> Result<Json<learning_path::Model>> {
  Ok(Json(app.sv().path.set_published(&ctx, &id, req.published).await?))
}
