use sea_orm::{JoinType, RelationTrait, sea_query::OnConflict};
use serde::Serialize;

use crate::{
  entity::{chapter, course, lesson, purchase, user, user_progress},
  prelude::*,
  sv::{self, checkout, gamification::AwardOutcome},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
  pub completed: u64,
  pub total: u64,
  pub percentage: u32,
}

impl CourseProgress {
  pub fn new(completed: u64, total: u64) -> Self {
    Self { completed, total, percentage: utils::percentage(completed, total) }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseCompletion {
  pub course_id: String,
  pub title: String,
  #[serde(flatten)]
  pub progress: CourseProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
  pub progress: user_progress::Model,
  pub module_award: Option<AwardOutcome>,
}

/// Marks the lesson completed for the user, keeping a single row.
pub async fn upsert_completed<C: ConnectionTrait>(
  db: &C,
  user_id: &str,
  lesson_id: &str,
) -> Result<()> {
  let row = user_progress::ActiveModel {
    user_id: Set(user_id.to_string()),
    lesson_id: Set(lesson_id.to_string()),
    is_completed: Set(true),
    last_accessed_at: Set(utils::now()),
  };

  user_progress::Entity::insert(row)
    .on_conflict(
      OnConflict::columns([
        user_progress::Column::UserId,
        user_progress::Column::LessonId,
      ])
      .update_columns([
        user_progress::Column::IsCompleted,
        user_progress::Column::LastAccessedAt,
      ])
      .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

  Ok(())
}

pub struct Progress<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Progress<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Lesson the caller may consume, with the caller and the lesson's chapter.
  pub(crate) async fn accessible_lesson(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
  ) -> Result<(user::Model, lesson::Model, chapter::Model)> {
    let user = sv::User::new(self.db).current(ctx).await?;
    let (lesson, chapter, course) =
      sv::Content::new(self.db).lesson(lesson_id).await?;

    if !checkout::has_access(self.db, &user, &course).await? {
      return Err(Error::Forbidden);
    }
    Ok((user, lesson, chapter))
  }

  async fn row(
    &self,
    user_id: &str,
    lesson_id: &str,
  ) -> Result<user_progress::Model> {
    user_progress::Entity::find_by_id((
      user_id.to_string(),
      lesson_id.to_string(),
    ))
    .one(self.db)
    .await?
    .ok_or(Error::NotFound("Progress"))
  }

  pub async fn mark_lesson_complete(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
  ) -> Result<Completion> {
    let (user, lesson, chapter) =
      self.accessible_lesson(ctx, lesson_id).await?;

    upsert_completed(self.db, &user.id, &lesson.id).await?;

    let module_award = sv::Gamification::new(self.db)
      .check_module_completion(&user.id, &chapter.id)
      .await?;

    Ok(Completion { progress: self.row(&user.id, &lesson.id).await?, module_award })
  }

  /// Records a lesson view; never reverts a completion.
  pub async fn touch_lesson(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
  ) -> Result<user_progress::Model> {
    let user = sv::User::new(self.db).current(ctx).await?;
    let (lesson, _, course) =
      sv::Content::new(self.db).lesson(lesson_id).await?;

    if !lesson.is_free_preview
      && !checkout::has_access(self.db, &user, &course).await?
    {
      return Err(Error::Forbidden);
    }

    let row = user_progress::ActiveModel {
      user_id: Set(user.id.clone()),
      lesson_id: Set(lesson.id.clone()),
      is_completed: Set(false),
      last_accessed_at: Set(utils::now()),
    };

    user_progress::Entity::insert(row)
      .on_conflict(
        OnConflict::columns([
          user_progress::Column::UserId,
          user_progress::Column::LessonId,
        ])
        .update_column(user_progress::Column::LastAccessedAt)
        .to_owned(),
      )
      .exec_without_returning(self.db)
      .await?;

    self.row(&user.id, &lesson.id).await
  }

  async fn count_lessons(&self, course_id: &str) -> Result<u64> {
    let total = lesson::Entity::find()
      .inner_join(chapter::Entity)
      .filter(chapter::Column::CourseId.eq(course_id))
      .count(self.db)
      .await?;
    Ok(total)
  }

  async fn count_completed(&self, user_id: &str, course_id: &str) -> Result<u64> {
    let completed = user_progress::Entity::find()
      .join(JoinType::InnerJoin, user_progress::Relation::Lesson.def())
      .join(JoinType::InnerJoin, lesson::Relation::Chapter.def())
      .filter(user_progress::Column::UserId.eq(user_id))
      .filter(user_progress::Column::IsCompleted.eq(true))
      .filter(chapter::Column::CourseId.eq(course_id))
      .count(self.db)
      .await?;
    Ok(completed)
  }

  pub async fn user_progress(
    &self,
    ctx: &AuthContext,
    course_id: &str,
  ) -> Result<CourseProgress> {
    let user = sv::User::new(self.db).current(ctx).await?;

    let (completed, total) = futures::try_join!(
      self.count_completed(&user.id, course_id),
      self.count_lessons(course_id),
    )?;

    Ok(CourseProgress::new(completed, total))
  }

  /// Progress across every purchased course, from two grouped queries.
  pub async fn course_completion(
    &self,
    ctx: &AuthContext,
  ) -> Result<Vec<CourseCompletion>> {
    let user = sv::User::new(self.db).current(ctx).await?;

    let courses: Vec<(String, String)> = purchase::Entity::find()
      .select_only()
      .column(course::Column::Id)
      .column(course::Column::Title)
      .inner_join(course::Entity)
      .filter(purchase::Column::UserId.eq(user.id.as_str()))
      .order_by_desc(purchase::Column::CreatedAt)
      .into_tuple()
      .all(self.db)
      .await?;

    if courses.is_empty() {
      return Ok(Vec::new());
    }
    let course_ids: Vec<String> =
      courses.iter().map(|(id, _)| id.clone()).collect();

    let totals: Vec<(String, i64)> = lesson::Entity::find()
      .select_only()
      .column(chapter::Column::CourseId)
      .column_as(lesson::Column::Id.count(), "total")
      .inner_join(chapter::Entity)
      .filter(chapter::Column::CourseId.is_in(course_ids.clone()))
      .group_by(chapter::Column::CourseId)
      .into_tuple()
      .all(self.db)
      .await?;

    let completed: Vec<(String, i64)> = user_progress::Entity::find()
      .select_only()
      .column(chapter::Column::CourseId)
      .column_as(user_progress::Column::LessonId.count(), "completed")
      .join(JoinType::InnerJoin, user_progress::Relation::Lesson.def())
      .join(JoinType::InnerJoin, lesson::Relation::Chapter.def())
      .filter(user_progress::Column::UserId.eq(user.id.as_str()))
      .filter(user_progress::Column::IsCompleted.eq(true))
      .filter(chapter::Column::CourseId.is_in(course_ids))
      .group_by(chapter::Column::CourseId)
      .into_tuple()
      .all(self.db)
      .await?;

    let totals: HashMap<String, i64> = totals.into_iter().collect();
    let completed: HashMap<String, i64> = completed.into_iter().collect();

    Ok(
      courses
        .into_iter()
        .map(|(course_id, title)| {
          let total = totals.get(&course_id).copied().unwrap_or(0) as u64;
          let done = completed.get(&course_id).copied().unwrap_or(0) as u64;
          CourseCompletion {
            course_id,
            title,
            progress: CourseProgress::new(done, total),
          }
        })
        .collect(),
    )
  }

  /// Most recently viewed lesson of the course, or its first lesson.
  pub async fn resume_lesson(
    &self,
    ctx: &AuthContext,
    course_id: &str,
  ) -> Result<Option<String>> {
    let user = sv::User::new(self.db).current(ctx).await?;

    let last: Option<String> = user_progress::Entity::find()
      .select_only()
      .column(user_progress::Column::LessonId)
      .join(JoinType::InnerJoin, user_progress::Relation::Lesson.def())
      .join(JoinType::InnerJoin, lesson::Relation::Chapter.def())
      .filter(user_progress::Column::UserId.eq(user.id.as_str()))
      .filter(chapter::Column::CourseId.eq(course_id))
      .order_by_desc(user_progress::Column::LastAccessedAt)
      .into_tuple()
      .one(self.db)
      .await?;

    if last.is_some() {
      return Ok(last);
    }

    let ids = sv::Content::new(self.db).course_lesson_ids(course_id).await?;
    Ok(ids.into_iter().next())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::{CourseStatus, LessonType},
    sv::test_utils::{fixture, test_db},
  };

  #[tokio::test]
  async fn test_empty_course_is_zero_percent() {
    let db = test_db::setup().await;
    let tutor = fixture::tutor(&db).await;
    let learner = fixture::learner(&db).await;
    let course =
      fixture::course(&db, &tutor.id, "c", None, CourseStatus::Published).await;

    let progress = Progress::new(&db)
      .user_progress(&fixture::ctx(&learner), &course.id)
      .await
      .unwrap();

    assert_eq!(progress, CourseProgress { completed: 0, total: 0, percentage: 0 });
  }

  #[tokio::test]
  async fn test_mark_complete_rounds_and_awards_module() {
    let db = test_db::setup().await;
    let tutor = fixture::tutor(&db).await;
    let learner = fixture::learner(&db).await;
    let ctx = fixture::ctx(&learner);
    let course =
      fixture::course(&db, &tutor.id, "c", None, CourseStatus::Published).await;
    let first = fixture::chapter(&db, &course.id, 1).await;
    let second = fixture::chapter(&db, &course.id, 2).await;
    let a = fixture::lesson(&db, &first.id, 1, LessonType::Video).await;
    fixture::lesson(&db, &second.id, 1, LessonType::Video).await;
    fixture::lesson(&db, &second.id, 2, LessonType::Video).await;
    let sv = Progress::new(&db);

    let done = sv.mark_lesson_complete(&ctx, &a.id).await.unwrap();
    assert!(done.progress.is_completed);
    assert_eq!(done.module_award, Some(AwardOutcome::Awarded { points: 10 }));

    let again = sv.mark_lesson_complete(&ctx, &a.id).await.unwrap();
    assert_eq!(again.module_award, Some(AwardOutcome::AlreadyAwarded));

    let progress = sv.user_progress(&ctx, &course.id).await.unwrap();
    assert_eq!(progress, CourseProgress { completed: 1, total: 3, percentage: 33 });
    assert_eq!(user_progress::Entity::find().count(&db).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_paid_lesson_needs_purchase() {
    let db = test_db::setup().await;
    let tutor = fixture::tutor(&db).await;
    let learner = fixture::learner(&db).await;
    let course =
      fixture::course(&db, &tutor.id, "c", Some(900), CourseStatus::Published)
        .await;
    let chapter = fixture::chapter(&db, &course.id, 1).await;
    let lesson = fixture::lesson(&db, &chapter.id, 1, LessonType::Video).await;

    let result = Progress::new(&db)
      .mark_lesson_complete(&fixture::ctx(&learner), &lesson.id)
      .await;
    assert!(matches!(result, Err(Error::Forbidden)));
  }

  #[tokio::test]
  async fn test_touch_keeps_completion() {
    let db = test_db::setup().await;
    let tutor = fixture::tutor(&db).await;
    let learner = fixture::learner(&db).await;
    let ctx = fixture::ctx(&learner);
    let course =
      fixture::course(&db, &tutor.id, "c", None, CourseStatus::Published).await;
    let chapter = fixture::chapter(&db, &course.id, 1).await;
    let lesson = fixture::lesson(&db, &chapter.id, 1, LessonType::Video).await;
    let sv = Progress::new(&db);

    let viewed = sv.touch_lesson(&ctx, &lesson.id).await.unwrap();
    assert!(!viewed.is_completed);

    sv.mark_lesson_complete(&ctx, &lesson.id).await.unwrap();
    let viewed = sv.touch_lesson(&ctx, &lesson.id).await.unwrap();
    assert!(viewed.is_completed);
  }

  #[tokio::test]
  async fn test_course_completion_batches() {
    let db = test_db::setup().await;
    let tutor = fixture::tutor(&db).await;
    let learner = fixture::learner(&db).await;
    let ctx = fixture::ctx(&learner);

    let full =
      fixture::course(&db, &tutor.id, "full", None, CourseStatus::Published)
        .await;
    let empty =
      fixture::course(&db, &tutor.id, "empty", None, CourseStatus::Published)
        .await;
    let chapter = fixture::chapter(&db, &full.id, 1).await;
    let a = fixture::lesson(&db, &chapter.id, 1, LessonType::Video).await;
    fixture::lesson(&db, &chapter.id, 2, LessonType::Video).await;

    fixture::purchase(&db, &learner.id, &full.id, 0).await;
    fixture::purchase(&db, &learner.id, &empty.id, 0).await;
    upsert_completed(&db, &learner.id, &a.id).await.unwrap();

    let mut report = Progress::new(&db).course_completion(&ctx).await.unwrap();
    report.sort_by(|a, b| a.title.cmp(&b.title));

    assert_eq!(report.len(), 2);
    assert_eq!(report[0].title, "empty");
    assert_eq!(report[0].progress.percentage, 0);
    assert_eq!(report[1].progress, CourseProgress::new(1, 2));
    assert_eq!(report[1].progress.percentage, 50);
  }

  #[tokio::test]
  async fn test_resume_falls_back_to_first_lesson() {
    let db = test_db::setup().await;
    let tutor = fixture::tutor(&db).await;
    let learner = fixture::learner(&db).await;
    let ctx = fixture::ctx(&learner);
    let course =
      fixture::course(&db, &tutor.id, "c", None, CourseStatus::Published).await;
    let chapter = fixture::chapter(&db, &course.id, 1).await;
    let first = fixture::lesson(&db, &chapter.id, 1, LessonType::Video).await;
    let second = fixture::lesson(&db, &chapter.id, 2, LessonType::Video).await;
    let sv = Progress::new(&db);

    assert_eq!(sv.resume_lesson(&ctx, &course.id).await.unwrap(), Some(first.id));

    sv.touch_lesson(&ctx, &second.id).await.unwrap();
    assert_eq!(
      sv.resume_lesson(&ctx, &course.id).await.unwrap(),
      Some(second.id)
    );
  }
}
