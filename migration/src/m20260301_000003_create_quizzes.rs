use sea_orm_migration::prelude::*;

use super::{
  m20260301_000001_create_users::Users,
  m20260301_000002_create_courses::Lessons,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(QuizQuestions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(QuizQuestions::Id).string().not_null().primary_key(),
          )
          .col(ColumnDef::new(QuizQuestions::LessonId).string().not_null())
          .col(ColumnDef::new(QuizQuestions::Prompt).text().not_null())
          .col(ColumnDef::new(QuizQuestions::Options).json().not_null())
          .col(ColumnDef::new(QuizQuestions::CorrectOption).integer().not_null())
          .col(ColumnDef::new(QuizQuestions::Position).integer().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_quiz_questions_lesson")
              .from(QuizQuestions::Table, QuizQuestions::LessonId)
              .to(Lessons::Table, Lessons::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(QuizAttempts::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(QuizAttempts::Id).string().not_null().primary_key(),
          )
          .col(ColumnDef::new(QuizAttempts::UserId).string().not_null())
          .col(ColumnDef::new(QuizAttempts::LessonId).string().not_null())
          .col(ColumnDef::new(QuizAttempts::Score).integer().not_null())
          .col(ColumnDef::new(QuizAttempts::Passed).boolean().not_null())
          .col(ColumnDef::new(QuizAttempts::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_quiz_attempts_user")
              .from(QuizAttempts::Table, QuizAttempts::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_quiz_attempts_lesson")
              .from(QuizAttempts::Table, QuizAttempts::LessonId)
              .to(Lessons::Table, Lessons::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_quiz_attempts_user_lesson")
          .table(QuizAttempts::Table)
          .col(QuizAttempts::UserId)
          .col(QuizAttempts::LessonId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(QuizAttempts::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(QuizQuestions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
enum QuizQuestions {
  Table,
  Id,
  LessonId,
  Prompt,
  Options,
  CorrectOption,
  Position,
}

#[derive(DeriveIden)]
enum QuizAttempts {
  Table,
  Id,
  UserId,
  LessonId,
  Score,
  Passed,
  CreatedAt,
}
