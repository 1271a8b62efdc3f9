use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Courses::Table)
          .if_not_exists()
          .col(ColumnDef::new(Courses::Id).string().not_null().primary_key())
          .col(ColumnDef::new(Courses::TutorId).string().null())
          .col(ColumnDef::new(Courses::Title).string().not_null())
          .col(ColumnDef::new(Courses::Description).text().null())
          .col(ColumnDef::new(Courses::ImageUrl).string().null())
          .col(ColumnDef::new(Courses::Category).string().null())
          .col(ColumnDef::new(Courses::Price).big_integer().null())
          .col(
            ColumnDef::new(Courses::Status)
              .string()
              .not_null()
              .default("draft"),
          )
          .col(
            ColumnDef::new(Courses::IsPublished)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(Courses::RejectionReason).text().null())
          .col(ColumnDef::new(Courses::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Courses::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_courses_tutor")
              .from(Courses::Table, Courses::TutorId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::SetNull),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_courses_status")
          .table(Courses::Table)
          .col(Courses::Status)
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Chapters::Table)
          .if_not_exists()
          .col(ColumnDef::new(Chapters::Id).string().not_null().primary_key())
          .col(ColumnDef::new(Chapters::CourseId).string().not_null())
          .col(ColumnDef::new(Chapters::Title).string().not_null())
          .col(ColumnDef::new(Chapters::Description).text().null())
          .col(ColumnDef::new(Chapters::Position).integer().not_null())
          .col(ColumnDef::new(Chapters::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_chapters_course")
              .from(Chapters::Table, Chapters::CourseId)
              .to(Courses::Table, Courses::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_chapters_course")
          .table(Chapters::Table)
          .col(Chapters::CourseId)
          .col(Chapters::Position)
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Lessons::Table)
          .if_not_exists()
          .col(ColumnDef::new(Lessons::Id).string().not_null().primary_key())
          .col(ColumnDef::new(Lessons::ChapterId).string().not_null())
          .col(ColumnDef::new(Lessons::Title).string().not_null())
          .col(ColumnDef::new(Lessons::Description).text().null())
          .col(
            ColumnDef::new(Lessons::LessonType)
              .string()
              .not_null()
              .default("video"),
          )
          .col(ColumnDef::new(Lessons::VideoUrl).string().null())
          .col(
            ColumnDef::new(Lessons::IsFreePreview)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(Lessons::Position).integer().not_null())
          .col(ColumnDef::new(Lessons::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_lessons_chapter")
              .from(Lessons::Table, Lessons::ChapterId)
              .to(Chapters::Table, Chapters::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_lessons_chapter")
          .table(Lessons::Table)
          .col(Lessons::ChapterId)
          .col(Lessons::Position)
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(MuxData::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(MuxData::LessonId).string().not_null().primary_key(),
          )
          .col(ColumnDef::new(MuxData::UploadId).string().null())
          .col(ColumnDef::new(MuxData::AssetId).string().null())
          .col(ColumnDef::new(MuxData::PlaybackId).string().null())
          .col(ColumnDef::new(MuxData::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_mux_data_lesson")
              .from(MuxData::Table, MuxData::LessonId)
              .to(Lessons::Table, Lessons::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(MuxData::Table).to_owned()).await?;
    manager.drop_table(Table::drop().table(Lessons::Table).to_owned()).await?;
    manager.drop_table(Table::drop().table(Chapters::Table).to_owned()).await?;
    manager.drop_table(Table::drop().table(Courses::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Courses {
  Table,
  Id,
  TutorId,
  Title,
  Description,
  ImageUrl,
  Category,
  Price,
  Status,
  IsPublished,
  RejectionReason,
  CreatedAt,
  UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Chapters {
  Table,
  Id,
  CourseId,
  Title,
  Description,
  Position,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum Lessons {
  Table,
  Id,
  ChapterId,
  Title,
  Description,
  LessonType,
  VideoUrl,
  IsFreePreview,
  Position,
  CreatedAt,
}

#[derive(DeriveIden)]
enum MuxData {
  Table,
  LessonId,
  UploadId,
  AssetId,
  PlaybackId,
  UpdatedAt,
}
