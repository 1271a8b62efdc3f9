use sea_orm_migration::prelude::*;

use super::{
  m20260301_000001_create_users::Users,
  m20260301_000002_create_courses::{Courses, Lessons},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Purchases::Table)
          .if_not_exists()
          .col(ColumnDef::new(Purchases::Id).string().not_null().primary_key())
          .col(ColumnDef::new(Purchases::UserId).string().not_null())
          .col(ColumnDef::new(Purchases::CourseId).string().not_null())
          .col(
            ColumnDef::new(Purchases::PaymentReference)
              .string()
              .not_null()
              .unique_key(),
          )
          .col(
            ColumnDef::new(Purchases::Amount)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Purchases::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_purchases_user")
              .from(Purchases::Table, Purchases::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_purchases_course")
              .from(Purchases::Table, Purchases::CourseId)
              .to(Courses::Table, Courses::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_purchases_user_course")
          .table(Purchases::Table)
          .col(Purchases::UserId)
          .col(Purchases::CourseId)
          .unique()
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(UserProgress::Table)
          .if_not_exists()
          .col(ColumnDef::new(UserProgress::UserId).string().not_null())
          .col(ColumnDef::new(UserProgress::LessonId).string().not_null())
          .col(
            ColumnDef::new(UserProgress::IsCompleted)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(UserProgress::LastAccessedAt).date_time().not_null(),
          )
          .primary_key(
            Index::create()
              .col(UserProgress::UserId)
              .col(UserProgress::LessonId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_progress_user")
              .from(UserProgress::Table, UserProgress::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_progress_lesson")
              .from(UserProgress::Table, UserProgress::LessonId)
              .to(Lessons::Table, Lessons::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(UserProgress::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(Purchases::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
enum Purchases {
  Table,
  Id,
  UserId,
  CourseId,
  PaymentReference,
  Amount,
  CreatedAt,
}

#[derive(DeriveIden)]
enum UserProgress {
  Table,
  UserId,
  LessonId,
  IsCompleted,
  LastAccessedAt,
}
