use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{lesson_question, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lesson_answers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub question_id: String,
  pub user_id: String,
  pub body: String,
  /// Posted by the tutor who owns the course
  pub is_tutor: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "lesson_question::Entity",
    from = "Column::QuestionId",
    to = "lesson_question::Column::Id",
    on_delete = "Cascade"
  )]
  Question,
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::UserId",
    to = "user::Column::Id",
    on_delete = "Cascade"
  )]
  User,
}

impl Related<lesson_question::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Question.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
