use serde::Serialize;

use crate::{
  entity::{lesson_answer, lesson_question, note},
  prelude::*,
  sv,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
  #[serde(flatten)]
  pub question: lesson_question::Model,
  pub answers: Vec<lesson_answer::Model>,
}

fn body(text: &str) -> Result<String> {
  let text = text.trim();
  if text.is_empty() {
    return Err(Error::InvalidArgs("Body must not be empty".into()));
  }
  Ok(text.to_string())
}

pub struct Discussion<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Discussion<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn ask(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
    text: &str,
  ) -> Result<lesson_question::Model> {
    let text = body(text)?;
    let (user, lesson, _) =
      sv::Progress::new(self.db).accessible_lesson(ctx, lesson_id).await?;

    let question = lesson_question::ActiveModel {
      id: Set(utils::new_id()),
      lesson_id: Set(lesson.id),
      user_id: Set(user.id),
      body: Set(text),
      created_at: Set(utils::now()),
    }
    .insert(self.db)
    .await?;

    Ok(question)
  }

  /// Anyone with access to the lesson may answer; the owning tutor's
  /// answers are flagged.
  pub async fn answer(
    &self,
    ctx: &AuthContext,
    question_id: &str,
    text: &str,
  ) -> Result<lesson_answer::Model> {
    let text = body(text)?;
    let question = lesson_question::Entity::find_by_id(question_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Question"))?;

    let (user, _, _) = sv::Progress::new(self.db)
      .accessible_lesson(ctx, &question.lesson_id)
      .await?;
    let (_, _, course) =
      sv::Content::new(self.db).lesson(&question.lesson_id).await?;

    let answer = lesson_answer::ActiveModel {
      id: Set(utils::new_id()),
      question_id: Set(question.id),
      is_tutor: Set(course.is_owned_by(&user.id)),
      user_id: Set(user.id),
      body: Set(text),
      created_at: Set(utils::now()),
    }
    .insert(self.db)
    .await?;

    Ok(answer)
  }

  /// Newest questions first, answers in posting order.
  pub async fn threads(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
  ) -> Result<Vec<Thread>> {
    let (_, lesson, _) =
      sv::Progress::new(self.db).accessible_lesson(ctx, lesson_id).await?;

    let questions = lesson_question::Entity::find()
      .filter(lesson_question::Column::LessonId.eq(lesson.id))
      .order_by_desc(lesson_question::Column::CreatedAt)
      .all(self.db)
      .await?;

    let ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
    let mut answers: HashMap<String, Vec<lesson_answer::Model>> =
      HashMap::new();
    for answer in lesson_answer::Entity::find()
      .filter(lesson_answer::Column::QuestionId.is_in(ids))
      .order_by_asc(lesson_answer::Column::CreatedAt)
      .all(self.db)
      .await?
    {
      answers.entry(answer.question_id.clone()).or_default().push(answer);
    }

    Ok(
      questions
        .into_iter()
        .map(|question| Thread {
          answers: answers.remove(&question.id).unwrap_or_default(),
          question,
        })
        .collect(),
    )
  }

  /// Authors and admins may remove a question with its answers.
  pub async fn delete_question(
    &self,
    ctx: &AuthContext,
    question_id: &str,
  ) -> Result<()> {
    let user = sv::User::new(self.db).current(ctx).await?;
    let question = lesson_question::Entity::find_by_id(question_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Question"))?;

    if question.user_id != user.id && !ctx.is_admin() {
      return Err(Error::Forbidden);
    }

    lesson_question::Entity::delete_by_id(question.id).exec(self.db).await?;
    Ok(())
  }

  pub async fn add_note(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
    text: &str,
  ) -> Result<note::Model> {
    let text = body(text)?;
    let (user, lesson, _) =
      sv::Progress::new(self.db).accessible_lesson(ctx, lesson_id).await?;

    let now = utils::now();
    let note = note::ActiveModel {
      id: Set(utils::new_id()),
      user_id: Set(user.id),
      lesson_id: Set(lesson.id),
      body: Set(text),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(self.db)
    .await?;

    Ok(note)
  }

  /// Notes are private: another user's note is reported as missing.
  async fn own_note(&self, ctx: &AuthContext, id: &str) -> Result<note::Model> {
    let user = sv::User::new(self.db).current(ctx).await?;

    note::Entity::find_by_id(id)
      .filter(note::Column::UserId.eq(user.id))
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Note"))
  }

  pub async fn update_note(
    &self,
    ctx: &AuthContext,
    id: &str,
    text: &str,
  ) -> Result<note::Model> {
    let text = body(text)?;
    let note = self.own_note(ctx, id).await?;

    let note = note::ActiveModel {
      body: Set(text),
      updated_at: Set(utils::now()),
      ..note.into()
    }
    .update(self.db)
    .await?;

    Ok(note)
  }

  pub async fn delete_note(&self, ctx: &AuthContext, id: &str) -> Result<()> {
    let note = self.own_note(ctx, id).await?;
    note::Entity::delete_by_id(note.id).exec(self.db).await?;
    Ok(())
  }

  pub async fn notes(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
  ) -> Result<Vec<note::Model>> {
    let user = sv::User::new(self.db).current(ctx).await?;

    let notes = note::Entity::find()
      .filter(note::Column::UserId.eq(user.id))
      .filter(note::Column::LessonId.eq(lesson_id))
      .order_by_desc(note::Column::CreatedAt)
      .all(self.db)
      .await?;

    Ok(notes)
  }
}
