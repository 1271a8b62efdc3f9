use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(PaymentReferences::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(PaymentReferences::Reference)
              .string()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(PaymentReferences::UserId).string().not_null())
          .col(ColumnDef::new(PaymentReferences::CourseId).string().null())
          .col(ColumnDef::new(PaymentReferences::PathId).string().null())
          .col(
            ColumnDef::new(PaymentReferences::Amount)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(PaymentReferences::CreatedAt).date_time().not_null(),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(PaymentReferences::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
enum PaymentReferences {
  Table,
  Reference,
  UserId,
  CourseId,
  PathId,
  Amount,
  CreatedAt,
}
