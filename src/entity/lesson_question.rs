use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{lesson, lesson_answer, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lesson_questions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub lesson_id: String,
  pub user_id: String,
  pub body: String,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "lesson::Entity",
    from = "Column::LessonId",
    to = "lesson::Column::Id",
    on_delete = "Cascade"
  )]
  Lesson,
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::UserId",
    to = "user::Column::Id",
    on_delete = "Cascade"
  )]
  User,
  #[sea_orm(has_many = "lesson_answer::Entity")]
  Answers,
}

impl Related<lesson_answer::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Answers.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
