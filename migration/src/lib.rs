pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_courses;
mod m20260301_000003_create_quizzes;
mod m20260301_000004_create_purchases;
mod m20260301_000005_create_gamification;
mod m20260301_000006_create_learning_paths;
mod m20260301_000007_create_engagement;
mod m20260301_000008_create_discussions;
mod m20260301_000009_create_payment_references;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260301_000001_create_users::Migration),
      Box::new(m20260301_000002_create_courses::Migration),
      Box::new(m20260301_000003_create_quizzes::Migration),
      Box::new(m20260301_000004_create_purchases::Migration),
      Box::new(m20260301_000005_create_gamification::Migration),
      Box::new(m20260301_000006_create_learning_paths::Migration),
      Box::new(m20260301_000007_create_engagement::Migration),
      Box::new(m20260301_000008_create_discussions::Migration),
      Box::new(m20260301_000009_create_payment_references::Migration),
    ]
  }
}

#[cfg(test)]
mod tests {
  use sea_orm_migration::sea_orm::Database;

  use super::*;

  #[tokio::test]
  async fn test_up_and_down_on_sqlite() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let manager = SchemaManager::new(&db);

    Migrator::up(&db, None).await.unwrap();
    assert!(manager.has_table("users").await.unwrap());
    assert!(manager.has_table("payment_references").await.unwrap());
    assert_eq!(Migrator::get_applied_migrations(&db).await.unwrap().len(), 9);

    Migrator::down(&db, None).await.unwrap();
    assert!(!manager.has_table("payment_references").await.unwrap());
    assert!(!manager.has_table("users").await.unwrap());
    assert!(Migrator::get_applied_migrations(&db).await.unwrap().is_empty());
  }
}
