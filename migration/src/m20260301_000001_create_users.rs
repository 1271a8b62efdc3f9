use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Users::Table)
          .if_not_exists()
          .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
          .col(ColumnDef::new(Users::ClerkId).string().not_null().unique_key())
          .col(ColumnDef::new(Users::Email).string().not_null())
          .col(ColumnDef::new(Users::Name).string().null())
          .col(ColumnDef::new(Users::ImageUrl).string().null())
          .col(
            ColumnDef::new(Users::Role)
              .string()
              .not_null()
              .default("learner"),
          )
          .col(
            ColumnDef::new(Users::Status)
              .string()
              .not_null()
              .default("active"),
          )
          .col(
            ColumnDef::new(Users::Points).big_integer().not_null().default(0),
          )
          .col(
            ColumnDef::new(Users::CurrentStreak)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Users::LongestStreak)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Users::StreakLastActiveDate).date().null())
          .col(ColumnDef::new(Users::Interests).text().null())
          .col(ColumnDef::new(Users::Goal).text().null())
          .col(
            ColumnDef::new(Users::MetadataSynced)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(Users::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Users::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_users_role_status")
          .table(Users::Table)
          .col(Users::Role)
          .col(Users::Status)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Users {
  Table,
  Id,
  ClerkId,
  Email,
  Name,
  ImageUrl,
  Role,
  Status,
  Points,
  CurrentStreak,
  LongestStreak,
  StreakLastActiveDate,
  Interests,
  Goal,
  MetadataSynced,
  CreatedAt,
  UpdatedAt,
}
