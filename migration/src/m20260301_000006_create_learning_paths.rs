use sea_orm_migration::prelude::*;

use super::{
  m20260301_000001_create_users::Users,
  m20260301_000002_create_courses::Courses,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(LearningPaths::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(LearningPaths::Id).string().not_null().primary_key(),
          )
          .col(ColumnDef::new(LearningPaths::Title).string().not_null())
          .col(ColumnDef::new(LearningPaths::Description).text().null())
          .col(ColumnDef::new(LearningPaths::ImageUrl).string().null())
          .col(ColumnDef::new(LearningPaths::Price).big_integer().null())
          .col(
            ColumnDef::new(LearningPaths::IsPublished)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(LearningPaths::CreatedBy).string().null())
          .col(ColumnDef::new(LearningPaths::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(LearningPaths::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_learning_paths_creator")
              .from(LearningPaths::Table, LearningPaths::CreatedBy)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::SetNull),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(LearningPathCourses::Table)
          .if_not_exists()
          .col(ColumnDef::new(LearningPathCourses::PathId).string().not_null())
          .col(
            ColumnDef::new(LearningPathCourses::CourseId).string().not_null(),
          )
          .col(
            ColumnDef::new(LearningPathCourses::Position).integer().not_null(),
          )
          .primary_key(
            Index::create()
              .col(LearningPathCourses::PathId)
              .col(LearningPathCourses::CourseId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_learning_path_courses_path")
              .from(LearningPathCourses::Table, LearningPathCourses::PathId)
              .to(LearningPaths::Table, LearningPaths::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_learning_path_courses_course")
              .from(LearningPathCourses::Table, LearningPathCourses::CourseId)
              .to(Courses::Table, Courses::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(UserLearningPaths::Table)
          .if_not_exists()
          .col(ColumnDef::new(UserLearningPaths::UserId).string().not_null())
          .col(ColumnDef::new(UserLearningPaths::PathId).string().not_null())
          .col(ColumnDef::new(UserLearningPaths::PaymentReference).string().null())
          .col(
            ColumnDef::new(UserLearningPaths::AmountPaid)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(UserLearningPaths::EnrolledAt).date_time().not_null(),
          )
          .primary_key(
            Index::create()
              .col(UserLearningPaths::UserId)
              .col(UserLearningPaths::PathId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_learning_paths_user")
              .from(UserLearningPaths::Table, UserLearningPaths::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_learning_paths_path")
              .from(UserLearningPaths::Table, UserLearningPaths::PathId)
              .to(LearningPaths::Table, LearningPaths::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(UserLearningPaths::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(LearningPathCourses::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(LearningPaths::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
enum LearningPaths {
  Table,
  Id,
  Title,
  Description,
  ImageUrl,
  Price,
  IsPublished,
  CreatedBy,
  CreatedAt,
  UpdatedAt,
}

#[derive(DeriveIden)]
enum LearningPathCourses {
  Table,
  PathId,
  CourseId,
  Position,
}

#[derive(DeriveIden)]
enum UserLearningPaths {
  Table,
  UserId,
  PathId,
  PaymentReference,
  AmountPaid,
  EnrolledAt,
}
