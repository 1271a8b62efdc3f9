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
          .table(Reviews::Table)
          .if_not_exists()
          .col(ColumnDef::new(Reviews::UserId).string().not_null())
          .col(ColumnDef::new(Reviews::CourseId).string().not_null())
          .col(ColumnDef::new(Reviews::Rating).integer().not_null())
          .col(ColumnDef::new(Reviews::Comment).text().null())
          .col(ColumnDef::new(Reviews::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Reviews::UpdatedAt).date_time().not_null())
          .primary_key(
            Index::create().col(Reviews::UserId).col(Reviews::CourseId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_reviews_user")
              .from(Reviews::Table, Reviews::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_reviews_course")
              .from(Reviews::Table, Reviews::CourseId)
              .to(Courses::Table, Courses::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(CourseLikes::Table)
          .if_not_exists()
          .col(ColumnDef::new(CourseLikes::UserId).string().not_null())
          .col(ColumnDef::new(CourseLikes::CourseId).string().not_null())
          .col(ColumnDef::new(CourseLikes::CreatedAt).date_time().not_null())
          .primary_key(
            Index::create().col(CourseLikes::UserId).col(CourseLikes::CourseId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_course_likes_user")
              .from(CourseLikes::Table, CourseLikes::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_course_likes_course")
              .from(CourseLikes::Table, CourseLikes::CourseId)
              .to(Courses::Table, Courses::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(Wishlists::Table)
          .if_not_exists()
          .col(ColumnDef::new(Wishlists::UserId).string().not_null())
          .col(ColumnDef::new(Wishlists::CourseId).string().not_null())
          .col(ColumnDef::new(Wishlists::CreatedAt).date_time().not_null())
          .primary_key(
            Index::create().col(Wishlists::UserId).col(Wishlists::CourseId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_wishlists_user")
              .from(Wishlists::Table, Wishlists::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_wishlists_course")
              .from(Wishlists::Table, Wishlists::CourseId)
              .to(Courses::Table, Courses::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Wishlists::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(CourseLikes::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(Reviews::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
enum Reviews {
  Table,
  UserId,
  CourseId,
  Rating,
  Comment,
  CreatedAt,
  UpdatedAt,
}

#[derive(DeriveIden)]
enum CourseLikes {
  Table,
  UserId,
  CourseId,
  CreatedAt,
}

#[derive(DeriveIden)]
enum Wishlists {
  Table,
  UserId,
  CourseId,
  CreatedAt,
}
