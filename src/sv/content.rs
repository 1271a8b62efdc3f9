//! Chapters and lessons of a course.
//!
//! Siblings keep dense positions `1..=n`: new children are appended, deletes
//! close the gap and reorders rewrite every position in one transaction.

use sea_orm::{DatabaseTransaction, sea_query::Expr};
use serde::{Deserialize, Serialize};

use crate::{
  entity::{LessonType, chapter, course, lesson},
  prelude::*,
  sv,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterInput {
  pub title: String,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonInput {
  pub title: String,
  pub description: Option<String>,
  #[serde(default)]
  pub lesson_type: LessonType,
  pub video_url: Option<String>,
  #[serde(default)]
  pub is_free_preview: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPatch {
  pub title: Option<String>,
  pub description: Option<String>,
  pub video_url: Option<String>,
  pub is_free_preview: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterOutline {
  #[serde(flatten)]
  pub chapter: chapter::Model,
  pub lessons: Vec<lesson::Model>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outline {
  pub course: course::Model,
  pub chapters: Vec<ChapterOutline>,
}

fn required(title: &str) -> Result<String> {
  let title = title.trim();
  if title.is_empty() {
    return Err(Error::InvalidArgs("Title is required".into()));
  }
  Ok(title.to_string())
}

/// `ids` must name every current item exactly once.
pub(crate) fn check_order(current: &[String], ids: &[String]) -> Result<()> {
  let wanted: HashSet<&String> = ids.iter().collect();
  let existing: HashSet<&String> = current.iter().collect();

  if wanted.len() != ids.len() || wanted != existing {
    return Err(Error::InvalidArgs(
      "Order must list every item exactly once".into(),
    ));
  }
  Ok(())
}

async fn chapter_ids(
  txn: &DatabaseTransaction,
  course_id: &str,
) -> Result<Vec<String>> {
  let ids = chapter::Entity::find()
    .select_only()
    .column(chapter::Column::Id)
    .filter(chapter::Column::CourseId.eq(course_id))
    .order_by_asc(chapter::Column::Position)
    .into_tuple()
    .all(txn)
    .await?;
  Ok(ids)
}

async fn lesson_ids(
  txn: &DatabaseTransaction,
  chapter_id: &str,
) -> Result<Vec<String>> {
  let ids = lesson::Entity::find()
    .select_only()
    .column(lesson::Column::Id)
    .filter(lesson::Column::ChapterId.eq(chapter_id))
    .order_by_asc(lesson::Column::Position)
    .into_tuple()
    .all(txn)
    .await?;
  Ok(ids)
}

async fn write_chapter_positions(
  txn: &DatabaseTransaction,
  ids: &[String],
) -> Result<()> {
  for (index, id) in ids.iter().enumerate() {
    chapter::Entity::update_many()
      .col_expr(chapter::Column::Position, Expr::value(index as i32 + 1))
      .filter(chapter::Column::Id.eq(id.as_str()))
      .exec(txn)
      .await?;
  }
  Ok(())
}

async fn write_lesson_positions(
  txn: &DatabaseTransaction,
  ids: &[String],
) -> Result<()> {
  for (index, id) in ids.iter().enumerate() {
    lesson::Entity::update_many()
      .col_expr(lesson::Column::Position, Expr::value(index as i32 + 1))
      .filter(lesson::Column::Id.eq(id.as_str()))
      .exec(txn)
      .await?;
  }
  Ok(())
}

pub struct Content<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Content<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn chapter(&self, id: &str) -> Result<chapter::Model> {
    chapter::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Chapter"))
  }

  /// Lesson with its chapter and course.
  pub async fn lesson(
    &self,
    id: &str,
  ) -> Result<(lesson::Model, chapter::Model, course::Model)> {
    let lesson = lesson::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Lesson"))?;
    let chapter = self.chapter(&lesson.chapter_id).await?;
    let course = sv::Course::new(self.db).by_id(&chapter.course_id).await?;

    Ok((lesson, chapter, course))
  }

  async fn owned_chapter(
    &self,
    ctx: &AuthContext,
    id: &str,
  ) -> Result<chapter::Model> {
    let chapter = self.chapter(id).await?;
    sv::Course::new(self.db).owned(ctx, &chapter.course_id).await?;
    Ok(chapter)
  }

  pub async fn owned_lesson(
    &self,
    ctx: &AuthContext,
    id: &str,
  ) -> Result<lesson::Model> {
    let (lesson, chapter, _) = self.lesson(id).await?;
    sv::Course::new(self.db).owned(ctx, &chapter.course_id).await?;
    Ok(lesson)
  }

  pub async fn create_chapter(
    &self,
    ctx: &AuthContext,
    course_id: &str,
    input: ChapterInput,
  ) -> Result<chapter::Model> {
    sv::Course::new(self.db).owned(ctx, course_id).await?;

    let last: Option<Option<i32>> = chapter::Entity::find()
      .select_only()
      .column_as(chapter::Column::Position.max(), "position")
      .filter(chapter::Column::CourseId.eq(course_id))
      .into_tuple()
      .one(self.db)
      .await?;

    let chapter = chapter::ActiveModel {
      id: Set(utils::new_id()),
      course_id: Set(course_id.to_string()),
      title: Set(required(&input.title)?),
      description: Set(input.description),
      position: Set(last.flatten().unwrap_or(0) + 1),
      created_at: Set(utils::now()),
    }
    .insert(self.db)
    .await?;

    Ok(chapter)
  }

  pub async fn update_chapter(
    &self,
    ctx: &AuthContext,
    id: &str,
    input: ChapterInput,
  ) -> Result<chapter::Model> {
    let chapter = self.owned_chapter(ctx, id).await?;

    let chapter = chapter::ActiveModel {
      title: Set(required(&input.title)?),
      description: Set(input.description),
      ..chapter.into()
    }
    .update(self.db)
    .await?;

    Ok(chapter)
  }

  pub async fn delete_chapter(&self, ctx: &AuthContext, id: &str) -> Result<()> {
    let chapter = self.owned_chapter(ctx, id).await?;

    let txn = self.db.begin().await?;
    chapter::Entity::delete_by_id(chapter.id).exec(&txn).await?;
    let rest = chapter_ids(&txn, &chapter.course_id).await?;
    write_chapter_positions(&txn, &rest).await?;
    txn.commit().await?;

    Ok(())
  }

  pub async fn reorder_chapters(
    &self,
    ctx: &AuthContext,
    course_id: &str,
    ids: Vec<String>,
  ) -> Result<()> {
    sv::Course::new(self.db).owned(ctx, course_id).await?;

    let txn = self.db.begin().await?;
    let current = chapter_ids(&txn, course_id).await?;
    check_order(&current, &ids)?;
    write_chapter_positions(&txn, &ids).await?;
    txn.commit().await?;

    debug!("Reordered {} chapters of `{course_id}`", ids.len());
    Ok(())
  }

  pub async fn create_lesson(
    &self,
    ctx: &AuthContext,
    chapter_id: &str,
    input: LessonInput,
  ) -> Result<lesson::Model> {
    let chapter = self.owned_chapter(ctx, chapter_id).await?;

    let last: Option<Option<i32>> = lesson::Entity::find()
      .select_only()
      .column_as(lesson::Column::Position.max(), "position")
      .filter(lesson::Column::ChapterId.eq(chapter.id.as_str()))
      .into_tuple()
      .one(self.db)
      .await?;

    let video_url = match input.lesson_type {
      LessonType::Video => input.video_url,
      LessonType::Quiz => None,
    };

    let lesson = lesson::ActiveModel {
      id: Set(utils::new_id()),
      chapter_id: Set(chapter.id),
      title: Set(required(&input.title)?),
      description: Set(input.description),
      lesson_type: Set(input.lesson_type),
      video_url: Set(video_url),
      is_free_preview: Set(input.is_free_preview),
      position: Set(last.flatten().unwrap_or(0) + 1),
      created_at: Set(utils::now()),
    }
    .insert(self.db)
    .await?;

    Ok(lesson)
  }

  pub async fn update_lesson(
    &self,
    ctx: &AuthContext,
    id: &str,
    patch: LessonPatch,
  ) -> Result<lesson::Model> {
    let lesson = self.owned_lesson(ctx, id).await?;
    let is_video = lesson.lesson_type == LessonType::Video;
    let mut model: lesson::ActiveModel = lesson.into();

    if let Some(title) = patch.title {
      model.title = Set(required(&title)?);
    }
    if let Some(description) = patch.description {
      model.description = Set(Some(description));
    }
    if let Some(video_url) = patch.video_url {
      if !is_video {
        return Err(Error::InvalidArgs("Quiz lessons have no video".into()));
      }
      model.video_url = Set(Some(video_url));
    }
    if let Some(preview) = patch.is_free_preview {
      model.is_free_preview = Set(preview);
    }

    Ok(model.update(self.db).await?)
  }

  pub async fn delete_lesson(&self, ctx: &AuthContext, id: &str) -> Result<()> {
    let lesson = self.owned_lesson(ctx, id).await?;

    let txn = self.db.begin().await?;
    lesson::Entity::delete_by_id(lesson.id).exec(&txn).await?;
    let rest = lesson_ids(&txn, &lesson.chapter_id).await?;
    write_lesson_positions(&txn, &rest).await?;
    txn.commit().await?;

    Ok(())
  }

  pub async fn reorder_lessons(
    &self,
    ctx: &AuthContext,
    chapter_id: &str,
    ids: Vec<String>,
  ) -> Result<()> {
    self.owned_chapter(ctx, chapter_id).await?;

    let txn = self.db.begin().await?;
    let current = lesson_ids(&txn, chapter_id).await?;
    check_order(&current, &ids)?;
    write_lesson_positions(&txn, &ids).await?;
    txn.commit().await?;

    Ok(())
  }

  /// Course with ordered chapters and lessons.
  pub async fn course_outline(
    &self,
    ctx: Option<&AuthContext>,
    course_id: &str,
  ) -> Result<Outline> {
    let course = sv::Course::new(self.db).visible(ctx, course_id).await?;

    let chapters = chapter::Entity::find()
      .filter(chapter::Column::CourseId.eq(course.id.as_str()))
      .order_by_asc(chapter::Column::Position)
      .all(self.db)
      .await?;

    let chapter_ids: Vec<String> = chapters.iter().map(|c| c.id.clone()).collect();
    let lessons = lesson::Entity::find()
      .filter(lesson::Column::ChapterId.is_in(chapter_ids))
      .order_by_asc(lesson::Column::Position)
      .all(self.db)
      .await?;

    let mut by_chapter: HashMap<String, Vec<lesson::Model>> = HashMap::new();
    for lesson in lessons {
      by_chapter.entry(lesson.chapter_id.clone()).or_default().push(lesson);
    }

    let chapters = chapters
      .into_iter()
      .map(|chapter| {
        let lessons = by_chapter.remove(&chapter.id).unwrap_or_default();
        ChapterOutline { chapter, lessons }
      })
      .collect();

    Ok(Outline { course, chapters })
  }

  /// Every lesson id of a course, in outline order.
  pub async fn course_lesson_ids(&self, course_id: &str) -> Result<Vec<String>> {
    let ids = lesson::Entity::find()
      .select_only()
      .column(lesson::Column::Id)
      .inner_join(chapter::Entity)
      .filter(chapter::Column::CourseId.eq(course_id))
      .order_by_asc(chapter::Column::Position)
      .order_by_asc(lesson::Column::Position)
      .into_tuple()
      .all(self.db)
      .await?;
    Ok(ids)
  }
}
