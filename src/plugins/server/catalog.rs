use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Serialize;

use super::Limit;
use crate::{
  entity::{course, review},
  prelude::*,
  state::AppState,
  sv::{
    content::Outline,
    engagement::CourseStats,
    gamification::LeaderboardEntry,
    learning_path::{PathDetail, PathSummary},
  },
  utils::{Page, PageQuery},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
  #[serde(flatten)]
  course: course::Model,
  stats: CourseStats,
}

pub async fn courses(
  State(app): State<Arc<AppState>>,
  Query(query): Query<PageQuery>,
) -> Result<Json<Page<course::Model>>> {
  Ok(Json(app.sv().course.marketplace_courses(&query).await?))
}

pub async fn course(
  State(app): State<Arc<AppState>>,
  ctx: Option<AuthContext>,
  Path(id): Path<String>,
) -> Result<Json<CourseDetail>> {
  let sv = app.sv();
  let course = sv.course.visible(ctx.as_ref(), &id).await?;
  let stats = sv.engagement.course_stats(&course.id).await?;
  Ok(Json(CourseDetail { course, stats }))
}

pub async fn outline(
  State(app): State<Arc<AppState>>,
  ctx: Option<AuthContext>,
  Path(id): Path<String>,
) -> Result<Json<Outline>> {
  Ok(Json(app.sv().content.course_outline(ctx.as_ref(), &id).await?))
}

pub async fn reviews(
  State(app): State<Arc<AppState>>,
  Path(id): Path<String>,
  Query(query): Query<PageQuery>,
) -> Result<Json<Page<review::Model>>> {
  Ok(Json(app.sv().engagement.reviews(&id, &query).await?))
}

pub async fn stats(
  State(app): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<CourseStats>> {
  Ok(Json(app.sv().engagement.course_stats(&id).await?))
}

pub async fn popular(
  State(app): State<Arc<AppState>>,
  Query(Limit { limit }): Query<Limit>,
) -> Result<Json<Vec<course::Model>>> {
  Ok(Json(app.sv().recommend.popular(limit.unwrap_or(10)).await?))
}

pub async fn paths(
  State(app): State<Arc<AppState>>,
) -> Result<Json<Vec<PathSummary>>> {
  Ok(Json(app.sv().path.published_paths().await?))
}

pub async fn path(
  State(app): State<Arc<AppState>>,
  ctx: Option<AuthContext>,
  Path(id): Path<String>,
) -> Result<Json<PathDetail>> {
  Ok(Json(app.sv().path.detail(ctx.as_ref(), &id).await?))
}

pub async fn leaderboard(
  State(app): State<Arc<AppState>>,
  Query(Limit { limit }): Query<Limit>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
  Ok(Json(app.sv().gamification.leaderboard(limit.unwrap_or(10)).await?))
}
