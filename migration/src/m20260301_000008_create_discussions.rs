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
          .table(LessonQuestions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(LessonQuestions::Id)
              .string()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(LessonQuestions::LessonId).string().not_null())
          .col(ColumnDef::new(LessonQuestions::UserId).string().not_null())
          .col(ColumnDef::new(LessonQuestions::Body).text().not_null())
          .col(ColumnDef::new(LessonQuestions::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_lesson_questions_lesson")
              .from(LessonQuestions::Table, LessonQuestions::LessonId)
              .to(Lessons::Table, Lessons::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_lesson_questions_user")
              .from(LessonQuestions::Table, LessonQuestions::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(LessonAnswers::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(LessonAnswers::Id).string().not_null().primary_key(),
          )
          .col(ColumnDef::new(LessonAnswers::QuestionId).string().not_null())
          .col(ColumnDef::new(LessonAnswers::UserId).string().not_null())
          .col(ColumnDef::new(LessonAnswers::Body).text().not_null())
          .col(
            ColumnDef::new(LessonAnswers::IsTutor)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(LessonAnswers::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_lesson_answers_question")
              .from(LessonAnswers::Table, LessonAnswers::QuestionId)
              .to(LessonQuestions::Table, LessonQuestions::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_lesson_answers_user")
              .from(LessonAnswers::Table, LessonAnswers::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Notes::Table)
          .if_not_exists()
          .col(ColumnDef::new(Notes::Id).string().not_null().primary_key())
          .col(ColumnDef::new(Notes::UserId).string().not_null())
          .col(ColumnDef::new(Notes::LessonId).string().not_null())
          .col(ColumnDef::new(Notes::Body).text().not_null())
          .col(ColumnDef::new(Notes::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Notes::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_notes_user")
              .from(Notes::Table, Notes::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_notes_lesson")
              .from(Notes::Table, Notes::LessonId)
              .to(Lessons::Table, Lessons::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_notes_user_lesson")
          .table(Notes::Table)
          .col(Notes::UserId)
          .col(Notes::LessonId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Notes::Table).to_owned()).await?;
    manager
      .drop_table(Table::drop().table(LessonAnswers::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(LessonQuestions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
enum LessonQuestions {
  Table,
  Id,
  LessonId,
  UserId,
  Body,
  CreatedAt,
}

#[derive(DeriveIden)]
enum LessonAnswers {
  Table,
  Id,
  QuestionId,
  UserId,
  Body,
  IsTutor,
  CreatedAt,
}

#[derive(DeriveIden)]
enum Notes {
  Table,
  Id,
  UserId,
  LessonId,
  Body,
  CreatedAt,
  UpdatedAt,
}
