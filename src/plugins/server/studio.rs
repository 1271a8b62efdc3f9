use axum::{
  Json,
  extract::{Path, Query, State},
};

use super::{Ack, Order, ack};
use crate::{
  entity::{chapter, course, lesson, mux_data, quiz_question},
  prelude::*,
  state::AppState,
  sv::{
    analytics::TutorDashboard,
    content::{ChapterInput, LessonInput, LessonPatch},
    course::{CourseInput, CoursePatch},
    mux::Upload,
    quiz::QuestionInput,
  },
  utils::{Page, PageQuery},
};

pub async fn dashboard(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
) -> Result<Json<TutorDashboard>> {
  Ok(Json(app.sv().analytics.tutor_dashboard(&ctx).await?))
}

pub async fn courses(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Query(query): Query<PageQuery>,
) -> Result<Json<Page<course::Model>>> {
  Ok(Json(app.sv().course.tutor_courses(&ctx, &query).await?))
}

pub async fn create(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Json(input): Json<CourseInput>,
) -> Result<Json<course::Model>> {
  Ok(Json(app.sv().course.create(&ctx, input).await?))
}

pub async fn update(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(patch): Json<CoursePatch>,
) -> Result<Json<course::Model>> {
  Ok(Json(app.sv().course.update(&ctx, &id, patch).await?))
}

pub async fn delete(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Ack> {
  app.sv().course.delete(&ctx, &id).await?;
  Ok(ack())
}

pub async fn submit(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Json<course::Model>> {
  Ok(Json(app.sv().course.submit_for_review(&ctx, &id).await?))
}

pub async fn create_chapter(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(input): Json<ChapterInput>,
) -> Result<Json<chapter::Model>> {
  Ok(Json(app.sv().content.create_chapter(&ctx, &id, input).await?))
}

pub async fn update_chapter(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(input): Json<ChapterInput>,
) -> Result<Json<chapter::Model>> {
  Ok(Json(app.sv().content.update_chapter(&ctx, &id, input).await?))
}

pub async fn delete_chapter(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Ack> {
  app.sv().content.delete_chapter(&ctx, &id).await?;
  Ok(ack())
}

pub async fn order_chapters(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(order): Json<Order>,
) -> Result<Ack> {
  app.sv().content.reorder_chapters(&ctx, &id, order.ids).await?;
  Ok(ack())
}

pub async fn create_lesson(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(input): Json<LessonInput>,
) -> Result<Json<lesson::Model>> {
  Ok(Json(app.sv().content.create_lesson(&ctx, &id, input).await?))
}

pub async fn update_lesson(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(patch): Json<LessonPatch>,
) -> Result<Json<lesson::Model>> {
  Ok(Json(app.sv().content.update_lesson(&ctx, &id, patch).await?))
}

pub async fn delete_lesson(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Ack> {
  app.sv().content.delete_lesson(&ctx, &id).await?;
  Ok(ack())
}

pub async fn order_lessons(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(order): Json<Order>,
) -> Result<Ack> {
  app.sv().content.reorder_lessons(&ctx, &id, order.ids).await?;
  Ok(ack())
}

pub async fn answer_key(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Json<Vec<quiz_question::Model>>> {
  Ok(Json(app.sv().quiz.answer_key(&ctx, &id).await?))
}

pub async fn add_question(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(input): Json<QuestionInput>,
) -> Result<Json<quiz_question::Model>> {
  Ok(Json(app.sv().quiz.add_question(&ctx, &id, input).await?))
}

pub async fn update_question(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(input): Json<QuestionInput>,
) -> Result<Json<quiz_question::Model>> {
  Ok(Json(app.sv().quiz.update_question(&ctx, &id, input).await?))
}

pub async fn delete_question(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Ack> {
  app.sv().quiz.delete_question(&ctx, &id).await?;
  Ok(ack())
}

pub async fn upload(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Json<Upload>> {
  Ok(Json(app.sv().video.create_upload(&ctx, &id).await?))
}

/// Blocks until the host reports the asset playable or polling gives up.
pub async fn playback(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Json<mux_data::Model>> {
  Ok(Json(app.sv().video.await_playback(&ctx, &id).await?))
}
