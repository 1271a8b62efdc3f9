use sea_orm::{DatabaseTransaction, sea_query::Expr};
use serde::{Deserialize, Serialize};

use crate::{
  entity::{LessonType, lesson, quiz_attempt, quiz_question},
  prelude::*,
  sv::{self, gamification::AwardOutcome, progress},
};

pub const PASS_THRESHOLD: i32 = 70;

/// Rounded percentage of correct answers; an empty quiz scores zero.
pub fn score(correct: usize, total: usize) -> i32 {
  utils::percentage(correct as u64, total as u64) as i32
}

async fn write_positions(
  txn: &DatabaseTransaction,
  ids: &[String],
) -> Result<()> {
  for (index, id) in ids.iter().enumerate() {
    quiz_question::Entity::update_many()
      .col_expr(quiz_question::Column::Position, Expr::value(index as i32 + 1))
      .filter(quiz_question::Column::Id.eq(id.as_str()))
      .exec(txn)
      .await?;
  }
  Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
  pub prompt: String,
  pub options: Vec<String>,
  pub correct_option: i32,
}

impl QuestionInput {
  fn validate(self) -> Result<Self> {
    if self.prompt.trim().is_empty() {
      return Err(Error::InvalidArgs("Prompt is required".into()));
    }
    if self.options.len() < 2 {
      return Err(Error::InvalidArgs("At least two options are required".into()));
    }
    if self.correct_option < 0
      || self.correct_option as usize >= self.options.len()
    {
      return Err(Error::InvalidArgs("Correct option is out of range".into()));
    }
    Ok(self)
  }
}

/// Question as shown to a learner, without the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
  pub id: String,
  pub prompt: String,
  pub options: Vec<String>,
  pub position: i32,
}

impl From<quiz_question::Model> for QuestionView {
  fn from(question: quiz_question::Model) -> Self {
    Self {
      options: question.options(),
      id: question.id,
      prompt: question.prompt,
      position: question.position,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
  pub attempt_id: String,
  pub score: i32,
  pub passed: bool,
  pub correct: usize,
  pub total: usize,
  pub mastery: Option<AwardOutcome>,
}

pub struct Quiz<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Quiz<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  async fn question_models(
    &self,
    lesson_id: &str,
  ) -> Result<Vec<quiz_question::Model>> {
    let questions = quiz_question::Entity::find()
      .filter(quiz_question::Column::LessonId.eq(lesson_id))
      .order_by_asc(quiz_question::Column::Position)
      .all(self.db)
      .await?;
    Ok(questions)
  }

  async fn owned_quiz(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
  ) -> Result<lesson::Model> {
    let lesson = sv::Content::new(self.db).owned_lesson(ctx, lesson_id).await?;
    if lesson.lesson_type != LessonType::Quiz {
      return Err(Error::InvalidArgs("Lesson is not a quiz".into()));
    }
    Ok(lesson)
  }

  /// Learner view of a quiz.
  pub async fn questions(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
  ) -> Result<Vec<QuestionView>> {
    sv::Progress::new(self.db).accessible_lesson(ctx, lesson_id).await?;

    let questions = self.question_models(lesson_id).await?;
    Ok(questions.into_iter().map(QuestionView::from).collect())
  }

  /// Author view, answers included.
  pub async fn answer_key(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
  ) -> Result<Vec<quiz_question::Model>> {
    let lesson = self.owned_quiz(ctx, lesson_id).await?;
    self.question_models(&lesson.id).await
  }

  pub async fn add_question(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
    input: QuestionInput,
  ) -> Result<quiz_question::Model> {
    let lesson = self.owned_quiz(ctx, lesson_id).await?;
    let input = input.validate()?;

    let last: Option<Option<i32>> = quiz_question::Entity::find()
      .select_only()
      .column_as(quiz_question::Column::Position.max(), "position")
      .filter(quiz_question::Column::LessonId.eq(lesson.id.as_str()))
      .into_tuple()
      .one(self.db)
      .await?;

    let question = quiz_question::ActiveModel {
      id: Set(utils::new_id()),
      lesson_id: Set(lesson.id),
      prompt: Set(input.prompt.trim().to_string()),
      options: Set(json::json!(input.options)),
      correct_option: Set(input.correct_option),
      position: Set(last.flatten().unwrap_or(0) + 1),
    }
    .insert(self.db)
    .await?;

    Ok(question)
  }

  async fn owned_question(
    &self,
    ctx: &AuthContext,
    question_id: &str,
  ) -> Result<quiz_question::Model> {
    let question = quiz_question::Entity::find_by_id(question_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Question"))?;
    self.owned_quiz(ctx, &question.lesson_id).await?;
    Ok(question)
  }

  pub async fn update_question(
    &self,
    ctx: &AuthContext,
    question_id: &str,
    input: QuestionInput,
  ) -> Result<quiz_question::Model> {
    let question = self.owned_question(ctx, question_id).await?;
    let input = input.validate()?;

    let question = quiz_question::ActiveModel {
      prompt: Set(input.prompt.trim().to_string()),
      options: Set(json::json!(input.options)),
      correct_option: Set(input.correct_option),
      ..question.into()
    }
    .update(self.db)
    .await?;

    Ok(question)
  }

  pub async fn delete_question(
    &self,
    ctx: &AuthContext,
    question_id: &str,
  ) -> Result<()> {
    let question = self.owned_question(ctx, question_id).await?;

    let txn = self.db.begin().await?;
    quiz_question::Entity::delete_by_id(question.id).exec(&txn).await?;
    let rest: Vec<String> = quiz_question::Entity::find()
      .select_only()
      .column(quiz_question::Column::Id)
      .filter(quiz_question::Column::LessonId.eq(question.lesson_id.as_str()))
      .order_by_asc(quiz_question::Column::Position)
      .into_tuple()
      .all(&txn)
      .await?;
    write_positions(&txn, &rest).await?;
    txn.commit().await?;

    Ok(())
  }

  /// Scores one submission. `answers` maps question id to the chosen index.
  pub async fn submit(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
    answers: &HashMap<String, i32>,
  ) -> Result<QuizResult> {
    let (user, lesson, chapter) = sv::Progress::new(self.db)
      .accessible_lesson(ctx, lesson_id)
      .await?;

    if lesson.lesson_type != LessonType::Quiz {
      return Err(Error::InvalidArgs("Lesson is not a quiz".into()));
    }

    let questions = self.question_models(&lesson.id).await?;
    let total = questions.len();
    let correct = questions
      .iter()
      .filter(|q| answers.get(&q.id) == Some(&q.correct_option))
      .count();

    let score = score(correct, total);
    let passed = score >= PASS_THRESHOLD;

    let attempt = quiz_attempt::ActiveModel {
      id: Set(utils::new_id()),
      user_id: Set(user.id.clone()),
      lesson_id: Set(lesson.id.clone()),
      score: Set(score),
      passed: Set(passed),
      created_at: Set(utils::now()),
    }
    .insert(self.db)
    .await?;

    if passed {
      progress::upsert_completed(self.db, &user.id, &lesson.id).await?;
    }

    let mastery = sv::Gamification::new(self.db)
      .check_quiz_mastery(&user.id, &chapter.id)
      .await?;

    debug!("Quiz `{}` scored {score} for {}", lesson.id, user.id);
    Ok(QuizResult {
      attempt_id: attempt.id,
      score,
      passed,
      correct,
      total,
      mastery,
    })
  }

  pub async fn attempts(
    &self,
    ctx: &AuthContext,
    lesson_id: &str,
  ) -> Result<Vec<quiz_attempt::Model>> {
    let user = sv::User::new(self.db).current(ctx).await?;

    let attempts = quiz_attempt::Entity::find()
      .filter(quiz_attempt::Column::UserId.eq(user.id))
      .filter(quiz_attempt::Column::LessonId.eq(lesson_id))
      .order_by_desc(quiz_attempt::Column::CreatedAt)
      .all(self.db)
      .await?;
    Ok(attempts)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::{CourseStatus, chapter, user, user_progress},
    sv::test_utils::{fixture, test_db},
  };

  struct Setup {
    db: DatabaseConnection,
    tutor: user::Model,
    learner: user::Model,
    chapter: chapter::Model,
    lesson: lesson::Model,
    questions: Vec<quiz_question::Model>,
  }

  /// A free course with one chapter holding a ten-question quiz whose
  /// answers are all `1`.
  async fn setup() -> Setup {
    let db = test_db::setup().await;
    let tutor = fixture::tutor(&db).await;
    let learner = fixture::learner(&db).await;
    let course =
      fixture::course(&db, &tutor.id, "c", None, CourseStatus::Published).await;
    let chapter = fixture::chapter(&db, &course.id, 1).await;
    let lesson = fixture::lesson(&db, &chapter.id, 1, LessonType::Quiz).await;

    let mut questions = Vec::new();
    for position in 1..=10 {
      questions.push(fixture::question(&db, &lesson.id, position, 1).await);
    }

    Setup { db, tutor, learner, chapter, lesson, questions }
  }

  fn answers(questions: &[quiz_question::Model], correct: usize) -> HashMap<String, i32> {
    questions
      .iter()
      .enumerate()
      .map(|(i, q)| (q.id.clone(), if i < correct { 1 } else { 0 }))
      .collect()
  }

  #[test]
  fn test_score() {
    assert_eq!(score(7, 10), 70);
    assert_eq!(score(2, 3), 67);
    assert_eq!(score(0, 0), 0);
  }

  #[tokio::test]
  async fn test_seven_of_ten_passes() {
    let s = setup().await;
    let result = Quiz::new(&s.db)
      .submit(&fixture::ctx(&s.learner), &s.lesson.id, &answers(&s.questions, 7))
      .await
      .unwrap();

    assert_eq!(result.score, 70);
    assert!(result.passed);
  }

  #[tokio::test]
  async fn test_six_of_ten_fails() {
    let s = setup().await;
    let result = Quiz::new(&s.db)
      .submit(&fixture::ctx(&s.learner), &s.lesson.id, &answers(&s.questions, 6))
      .await
      .unwrap();

    assert_eq!(result.score, 60);
    assert!(!result.passed);
    assert_eq!(result.mastery, None);
    assert_eq!(user_progress::Entity::find().count(&s.db).await.unwrap(), 0);
    assert_eq!(quiz_attempt::Entity::find().count(&s.db).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_eight_of_ten_records_attempt_and_progress() {
    let s = setup().await;
    let ctx = fixture::ctx(&s.learner);
    let result = Quiz::new(&s.db)
      .submit(&ctx, &s.lesson.id, &answers(&s.questions, 8))
      .await
      .unwrap();

    assert_eq!(result.score, 80);
    assert!(result.passed);
    assert_eq!(result.mastery, Some(AwardOutcome::Awarded { points: 25 }));

    let attempt = quiz_attempt::Entity::find_by_id(&result.attempt_id)
      .one(&s.db)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(attempt.score, 80);

    let progress =
      user_progress::Entity::find_by_id((s.learner.id.clone(), s.lesson.id.clone()))
        .one(&s.db)
        .await
        .unwrap()
        .unwrap();
    assert!(progress.is_completed);
  }

  #[tokio::test]
  async fn test_every_submission_is_kept() {
    let s = setup().await;
    let ctx = fixture::ctx(&s.learner);
    let sv = Quiz::new(&s.db);

    sv.submit(&ctx, &s.lesson.id, &answers(&s.questions, 3)).await.unwrap();
    let result =
      sv.submit(&ctx, &s.lesson.id, &answers(&s.questions, 10)).await.unwrap();
    assert_eq!(result.mastery, Some(AwardOutcome::Awarded { points: 25 }));

    let again =
      sv.submit(&ctx, &s.lesson.id, &answers(&s.questions, 10)).await.unwrap();
    assert_eq!(again.mastery, Some(AwardOutcome::AlreadyAwarded));

    assert_eq!(sv.attempts(&ctx, &s.lesson.id).await.unwrap().len(), 3);
    assert_eq!(user_progress::Entity::find().count(&s.db).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_mastery_needs_every_quiz() {
    let s = setup().await;
    let other =
      fixture::lesson(&s.db, &s.chapter.id, 2, LessonType::Quiz).await;
    fixture::question(&s.db, &other.id, 1, 0).await;

    let result = Quiz::new(&s.db)
      .submit(&fixture::ctx(&s.learner), &s.lesson.id, &answers(&s.questions, 10))
      .await
      .unwrap();

    assert!(result.passed);
    assert_eq!(result.mastery, None);
  }

  #[tokio::test]
  async fn test_learner_view_hides_answers() {
    let s = setup().await;
    let sv = Quiz::new(&s.db);

    let view = sv.questions(&fixture::ctx(&s.learner), &s.lesson.id).await.unwrap();
    assert_eq!(view.len(), 10);
    assert_eq!(view[0].options, vec!["a", "b", "c", "d"]);

    assert!(matches!(
      sv.answer_key(&fixture::ctx(&s.learner), &s.lesson.id).await,
      Err(Error::Forbidden)
    ));
    assert_eq!(
      sv.answer_key(&fixture::ctx(&s.tutor), &s.lesson.id).await.unwrap().len(),
      10
    );
  }

  #[tokio::test]
  async fn test_question_validation() {
    let s = setup().await;
    let ctx = fixture::ctx(&s.tutor);
    let sv = Quiz::new(&s.db);

    let bad = QuestionInput {
      prompt: "Pick".into(),
      options: vec!["yes".into(), "no".into()],
      correct_option: 2,
    };
    assert!(matches!(
      sv.add_question(&ctx, &s.lesson.id, bad).await,
      Err(Error::InvalidArgs(_))
    ));

    let good = QuestionInput {
      prompt: "Pick".into(),
      options: vec!["yes".into(), "no".into()],
      correct_option: 0,
    };
    let question = sv.add_question(&ctx, &s.lesson.id, good).await.unwrap();
    assert_eq!(question.position, 11);
    assert_eq!(question.options(), vec!["yes", "no"]);
  }

  #[tokio::test]
  async fn test_question_positions_stay_dense() {
    let s = setup().await;
    let ctx = fixture::ctx(&s.tutor);
    let sv = Quiz::new(&s.db);

    sv.delete_question(&ctx, &s.questions[0].id).await.unwrap();
    sv.delete_question(&ctx, &s.questions[4].id).await.unwrap();

    let input = QuestionInput {
      prompt: "Pick".into(),
      options: vec!["yes".into(), "no".into()],
      correct_option: 1,
    };
    let added = sv.add_question(&ctx, &s.lesson.id, input).await.unwrap();
    assert_eq!(added.position, 9);

    let positions: Vec<i32> = quiz_question::Entity::find()
      .filter(quiz_question::Column::LessonId.eq(s.lesson.id.as_str()))
      .order_by_asc(quiz_question::Column::Position)
      .all(&s.db)
      .await
      .unwrap()
      .into_iter()
      .map(|q| q.position)
      .collect();
    assert_eq!(positions, (1..=9).collect::<Vec<i32>>());
  }
}
