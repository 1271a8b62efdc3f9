use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{course, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course_likes")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: String,
  #[sea_orm(primary_key, auto_increment = false)]
  pub course_id: String,
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

impl ActiveModelBehavior for ActiveModel {}
