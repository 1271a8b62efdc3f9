use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{course, user};

/// A settled payment granting a learner access to a course. Never updated.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub user_id: String,
  pub course_id: String,
  #[sea_orm(unique)]
  pub payment_reference: String,
  pub amount: i64,
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
    belongs_to = "course::Entity",
    from = "Column::CourseId",
    to = "course::Column::Id",
    on_delete = "Cascade"
  )]
  Course,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<course::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Course.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
