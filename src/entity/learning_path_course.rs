use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{course, learning_path};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "learning_path_courses")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub path_id: String,
  #[sea_orm(primary_key, auto_increment = false)]
  pub course_id: String,
  pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "learning_path::Entity",
    from = "Column::PathId",
    to = "learning_path::Column::Id",
    on_delete = "Cascade"
  )]
  Path,
  #[sea_orm(
    belongs_to = "course::Entity",
    from = "Column::CourseId",
    to = "course::Column::Id",
    on_delete = "Cascade"
  )]
  Course,
}

impl Related<learning_path::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Path.def()
  }
}

impl Related<course::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Course.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
