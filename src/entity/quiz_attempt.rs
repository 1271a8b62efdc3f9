use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{lesson, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quiz_attempts")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub user_id: String,
  pub lesson_id: String,
  pub score: i32,
  pub passed: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::UserId",
    to = "user::Column::Id",
    on_delete = "Cascade"
  )]
  User,
  #[sea_orm(
    belongs_to = "lesson::Entity",
    from = "Column::LessonId",
    to = "lesson::Column::Id",
    on_delete = "Cascade"
  )]
  Lesson,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<lesson::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Lesson.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
