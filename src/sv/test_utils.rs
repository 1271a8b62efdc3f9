//! Shared test utilities: in-memory schema, fixtures and fakes

use std::sync::{
  Mutex,
  atomic::{AtomicBool, AtomicU32, Ordering},
};

use async_trait::async_trait;
use sea_orm::{DbBackend, Schema};

use crate::{
  entity::*,
  prelude::*,
  sv::{
    clerk::Identity,
    mail::Mailer,
    mux::{Asset, Upload, VideoHost},
    paystack::{Payments, Verified},
  },
};

pub mod test_db {
  use super::*;

  /// Creates an in-memory SQLite database with every table, parents first
  pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);
    let backend = db.get_database_backend();

    let statements = [
      schema.create_table_from_entity(user::Entity),
      schema.create_table_from_entity(course::Entity),
      schema.create_table_from_entity(chapter::Entity),
      schema.create_table_from_entity(lesson::Entity),
      schema.create_table_from_entity(mux_data::Entity),
      schema.create_table_from_entity(quiz_question::Entity),
      schema.create_table_from_entity(quiz_attempt::Entity),
      schema.create_table_from_entity(purchase::Entity),
      schema.create_table_from_entity(payment_reference::Entity),
      schema.create_table_from_entity(user_progress::Entity),
      schema.create_table_from_entity(point_transaction::Entity),
      schema.create_table_from_entity(daily_watch_time::Entity),
      schema.create_table_from_entity(learning_path::Entity),
      schema.create_table_from_entity(learning_path_course::Entity),
      schema.create_table_from_entity(user_learning_path::Entity),
      schema.create_table_from_entity(review::Entity),
      schema.create_table_from_entity(course_like::Entity),
      schema.create_table_from_entity(wishlist::Entity),
      schema.create_table_from_entity(lesson_question::Entity),
      schema.create_table_from_entity(lesson_answer::Entity),
      schema.create_table_from_entity(note::Entity),
    ];

    for stmt in &statements {
      db.execute(backend.build(stmt)).await.unwrap();
    }

    db
  }
}

pub mod fixture {
  use super::*;

  pub async fn user(
    db: &DatabaseConnection,
    role: UserRole,
    status: UserStatus,
  ) -> user::Model {
    let id = utils::new_id();
    let now = utils::now();

    user::ActiveModel {
      id: Set(id.clone()),
      clerk_id: Set(format!("clerk_{id}")),
      email: Set(format!("{id}@example.com")),
      name: Set(Some("Test User".into())),
      image_url: Set(None),
      role: Set(role),
      status: Set(status),
      points: Set(0),
      current_streak: Set(0),
      longest_streak: Set(0),
      streak_last_active_date: Set(None),
      interests: Set(None),
      goal: Set(None),
      metadata_synced: Set(true),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap()
  }

  pub async fn learner(db: &DatabaseConnection) -> user::Model {
    user(db, UserRole::Learner, UserStatus::Active).await
  }

  pub async fn tutor(db: &DatabaseConnection) -> user::Model {
    user(db, UserRole::Tutor, UserStatus::Active).await
  }

  pub async fn admin(db: &DatabaseConnection) -> user::Model {
    user(db, UserRole::Admin, UserStatus::Active).await
  }

  pub fn ctx(user: &user::Model) -> AuthContext {
    AuthContext::new(&user.clerk_id, user.role)
  }

  pub async fn course(
    db: &DatabaseConnection,
    tutor_id: &str,
    title: &str,
    price: Option<i64>,
    status: CourseStatus,
  ) -> course::Model {
    let now = utils::now();

    course::ActiveModel {
      id: Set(utils::new_id()),
      tutor_id: Set(Some(tutor_id.to_string())),
      title: Set(title.to_string()),
      description: Set(None),
      image_url: Set(None),
      category: Set(None),
      price: Set(price),
      status: Set(status),
      is_published: Set(status == CourseStatus::Published),
      rejection_reason: Set(None),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap()
  }

  pub async fn chapter(
    db: &DatabaseConnection,
    course_id: &str,
    position: i32,
  ) -> chapter::Model {
    chapter::ActiveModel {
      id: Set(utils::new_id()),
      course_id: Set(course_id.to_string()),
      title: Set(format!("Chapter {position}")),
      description: Set(None),
      position: Set(position),
      created_at: Set(utils::now()),
    }
    .insert(db)
    .await
    .unwrap()
  }

  pub async fn lesson(
    db: &DatabaseConnection,
    chapter_id: &str,
    position: i32,
    lesson_type: LessonType,
  ) -> lesson::Model {
    lesson::ActiveModel {
      id: Set(utils::new_id()),
      chapter_id: Set(chapter_id.to_string()),
      title: Set(format!("Lesson {position}")),
      description: Set(None),
      lesson_type: Set(lesson_type),
      video_url: Set(None),
      is_free_preview: Set(false),
      position: Set(position),
      created_at: Set(utils::now()),
    }
    .insert(db)
    .await
    .unwrap()
  }

  pub async fn question(
    db: &DatabaseConnection,
    lesson_id: &str,
    position: i32,
    correct_option: i32,
  ) -> quiz_question::Model {
    quiz_question::ActiveModel {
      id: Set(utils::new_id()),
      lesson_id: Set(lesson_id.to_string()),
      prompt: Set(format!("Question {position}")),
      options: Set(json::json!(["a", "b", "c", "d"])),
      correct_option: Set(correct_option),
      position: Set(position),
    }
    .insert(db)
    .await
    .unwrap()
  }

  pub async fn purchase(
    db: &DatabaseConnection,
    user_id: &str,
    course_id: &str,
    amount: i64,
  ) -> purchase::Model {
    purchase::ActiveModel {
      id: Set(utils::new_id()),
      user_id: Set(user_id.to_string()),
      course_id: Set(course_id.to_string()),
      payment_reference: Set(utils::new_id()),
      amount: Set(amount),
      created_at: Set(utils::now()),
    }
    .insert(db)
    .await
    .unwrap()
  }
}

#[derive(Default)]
pub struct FakeIdentity {
  pub fail: AtomicBool,
  pub calls: Mutex<Vec<(String, UserStatus)>>,
}

#[async_trait]
impl Identity for FakeIdentity {
  async fn set_status(
    &self,
    clerk_id: &str,
    _role: UserRole,
    status: UserStatus,
  ) -> Result<()> {
    self.calls.lock().unwrap().push((clerk_id.to_string(), status));
    if self.fail.load(Ordering::Relaxed) {
      return Err(Error::External("identity provider is down".into()));
    }
    Ok(())
  }
}

#[derive(Default)]
pub struct FakeMailer {
  pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Mailer for FakeMailer {
  async fn send(&self, to: &str, subject: &str, _html: &str) -> Result<()> {
    self.sent.lock().unwrap().push((to.to_string(), subject.to_string()));
    Ok(())
  }
}

#[derive(Default)]
pub struct FakePayments {
  charges: Mutex<HashMap<String, Verified>>,
}

impl FakePayments {
  pub fn charge(&self, reference: &str, amount: i64, success: bool) {
    self.settle(reference, reference, amount, success);
  }

  /// Lookups of `requested` resolve to a successful charge named `settled`.
  pub fn charge_as(&self, requested: &str, settled: &str, amount: i64) {
    self.settle(requested, settled, amount, true);
  }

  fn settle(&self, requested: &str, settled: &str, amount: i64, success: bool) {
    self.charges.lock().unwrap().insert(
      requested.to_string(),
      Verified { reference: settled.to_string(), amount, success },
    );
  }
}

#[async_trait]
impl Payments for FakePayments {
  async fn verify(&self, reference: &str) -> Result<Verified> {
    self
      .charges
      .lock()
      .unwrap()
      .get(reference)
      .cloned()
      .ok_or_else(|| Error::Payment("Transaction reference not found".into()))
  }
}

/// Asset becomes ready after `ready_after` status polls.
#[derive(Default)]
pub struct FakeVideo {
  pub ready_after: u32,
  pub polls: AtomicU32,
}

#[async_trait]
impl VideoHost for FakeVideo {
  async fn create_upload(&self, passthrough: &str) -> Result<Upload> {
    Ok(Upload {
      id: format!("upload_{passthrough}"),
      url: format!("https://storage.test/{passthrough}"),
    })
  }

  async fn upload_asset(&self, _upload_id: &str) -> Result<Option<String>> {
    Ok(Some("asset_1".into()))
  }

  async fn asset(&self, _asset_id: &str) -> Result<Asset> {
    let polls = self.polls.fetch_add(1, Ordering::Relaxed) + 1;
    if polls >= self.ready_after {
      Ok(Asset { status: "ready".into(), playback_id: Some("pb_1".into()) })
    } else {
      Ok(Asset { status: "preparing".into(), playback_id: None })
    }
  }
}
