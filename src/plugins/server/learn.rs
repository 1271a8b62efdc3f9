use axum::{
  Json,
  extract::{Path, State},
};
use serde::Deserialize;

use super::{Ack, Body, ack};
use crate::{
  entity::{
    lesson_answer, lesson_question, note, quiz_attempt, review, user_progress,
  },
  prelude::*,
  state::AppState,
  sv::{
    discussion::Thread,
    progress::{Completion, CourseProgress},
    quiz::{QuestionView, QuizResult},
  },
};

#[derive(Debug, Deserialize)]
pub struct Submission {
  /// Question id to the chosen option index
  answers: HashMap<String, i32>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewReq {
  rating: i32,
  comment: Option<String>,
}

pub async fn access(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Ack> {
  let has_access = app.sv().checkout.has_access(&ctx, &id).await?;
  Ok(Json(json::json!({ "hasAccess": has_access })))
}

pub async fn progress(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Json<CourseProgress>> {
  Ok(Json(app.sv().progress.user_progress(&ctx, &id).await?))
}

pub async fn resume(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Ack> {
  let lesson_id = app.sv().progress.resume_lesson(&ctx, &id).await?;
  Ok(Json(json::json!({ "lessonId": lesson_id })))
}

pub async fn complete(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Json<Completion>> {
  Ok(Json(app.sv().progress.mark_lesson_complete(&ctx, &id).await?))
}

pub async fn touch(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Json<user_progress::Model>> {
  Ok(Json(app.sv().progress.touch_lesson(&ctx, &id).await?))
}

pub async fn quiz(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Json<Vec<QuestionView>>> {
  Ok(Json(app.sv().quiz.questions(&ctx, &id).await?))
}

pub async fn submit(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(req): Json<Submission>,
) -> Result<Json<QuizResult>> {
  Ok(Json(app.sv().quiz.submit(&ctx, &id, &req.answers).await?))
}

pub async fn attempts(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Json<Vec<quiz_attempt::Model>>> {
  Ok(Json(app.sv().quiz.attempts(&ctx, &id).await?))
}

pub async fn threads(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Json<Vec<Thread>>> {
  Ok(Json(app.sv().discussion.threads(&ctx, &id).await?))
}

pub async fn ask(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(req): Json<Body>,
) -> Result<Json<lesson_question::Model>> {
  Ok(Json(app.sv().discussion.ask(&ctx, &id, &req.body).await?))
}

pub async fn answer(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(req): Json<Body>,
) -> Result<Json<lesson_answer::Model>> {
  Ok(Json(app.sv().discussion.answer(&ctx, &id, &req.body).await?))
}

pub async fn delete_question(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Ack> {
  app.sv().discussion.delete_question(&ctx, &id).await?;
  Ok(ack())
}

pub async fn notes(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Json<Vec<note::Model>>> {
  Ok(Json(app.sv().discussion.notes(&ctx, &id).await?))
}

pub async fn add_note(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(req): Json<Body>,
) -> Result<Json<note::Model>> {
  Ok(Json(app.sv().discussion.add_note(&ctx, &id, &req.body).await?))
}

pub async fn edit_note(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(req): Json<Body>,
) -> Result<Json<note::Model>> {
  Ok(Json(app.sv().discussion.update_note(&ctx, &id, &req.body).await?))
}

pub async fn delete_note(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Ack> {
  app.sv().discussion.delete_note(&ctx, &id).await?;
  Ok(ack())
}

pub async fn review(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
  Json(req): Json<ReviewReq>,
) -> Result<Json<review::Model>> {
  let review = app
    .sv()
    .engagement
    .upsert_review(&ctx, &id, req.rating, req.comment)
    .await?;
  Ok(Json(review))
}

pub async fn unreview(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Ack> {
  app.sv().engagement.delete_review(&ctx, &id).await?;
  Ok(ack())
}

pub async fn like(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Ack> {
  let liked = app.sv().engagement.toggle_like(&ctx, &id).await?;
  Ok(Json(json::json!({ "liked": liked })))
}

pub async fn wish(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Ack> {
  app.sv().engagement.add_to_wishlist(&ctx, &id).await?;
  Ok(ack())
}

pub async fn unwish(
  State(app): State<Arc<AppState>>,
  ctx: AuthContext,
  Path(id): Path<String>,
) -> Result<Ack> {
  app.sv().engagement.remove_from_wishlist(&ctx, &id).await?;
  Ok(ack())
}
