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
          .table(PointTransactions::Table)
          .if_not_exists()
          .col(ColumnDef::new(PointTransactions::UserId).string().not_null())
          .col(ColumnDef::new(PointTransactions::Reason).string().not_null())
          .col(
            ColumnDef::new(PointTransactions::ReferenceId).string().not_null(),
          )
          .col(ColumnDef::new(PointTransactions::Amount).integer().not_null())
          .col(
            ColumnDef::new(PointTransactions::CreatedAt).date_time().not_null(),
          )
          .primary_key(
            Index::create()
              .col(PointTransactions::UserId)
              .col(PointTransactions::Reason)
              .col(PointTransactions::ReferenceId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_point_transactions_user")
              .from(PointTransactions::Table, PointTransactions::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(DailyWatchTime::Table)
          .if_not_exists()
          .col(ColumnDef::new(DailyWatchTime::UserId).string().not_null())
          .col(ColumnDef::new(DailyWatchTime::Date).string().not_null())
          .col(
            ColumnDef::new(DailyWatchTime::MinutesWatched)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(DailyWatchTime::UpdatedAt).date_time().not_null())
          .primary_key(
            Index::create()
              .col(DailyWatchTime::UserId)
              .col(DailyWatchTime::Date),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_daily_watch_time_user")
              .from(DailyWatchTime::Table, DailyWatchTime::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(DailyWatchTime::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(PointTransactions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
enum PointTransactions {
  Table,
  UserId,
  Reason,
  ReferenceId,
  Amount,
  CreatedAt,
}

#[derive(DeriveIden)]
enum DailyWatchTime {
  Table,
  UserId,
  Date,
  MinutesWatched,
  UpdatedAt,
}
