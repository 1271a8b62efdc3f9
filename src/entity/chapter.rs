use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{course, lesson};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chapters")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub course_id: String,
  pub title: String,
  pub description: Option<String>,
  pub position: i32,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "course::Entity",
    from = "Column::CourseId",
    to = "course::Column::Id",
    on_delete = "Cascade"
  )]
  Course,
  #[sea_orm(has_many = "lesson::Entity")]
  Lessons,
}

impl Related<course::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Course.def()
  }
}

impl Related<lesson::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Lessons.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
