use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{lesson, user};

/// Private learner note attached to a lesson.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notes")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub user_id: String,
  pub lesson_id: String,
  pub body: String,
  pub created_at: DateTime,
  pub updated_at: DateTime,
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

impl ActiveModelBehavior for ActiveModel {}
