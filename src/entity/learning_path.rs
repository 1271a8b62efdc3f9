use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::learning_path_course;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "learning_paths")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub title: String,
  pub description: Option<String>,
  pub image_url: Option<String>,
  pub price: Option<i64>,
  pub is_published: bool,
  pub created_by: Option<String>,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

impl Model {
  pub fn is_free(&self) -> bool {
    self.price.unwrap_or(0) <= 0
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::user::Entity",
    from = "Column::CreatedBy",
    to = "super::user::Column::Id",
    on_delete = "SetNull"
  )]
  Creator,
  #[sea_orm(has_many = "learning_path_course::Entity")]
  Courses,
}

impl Related<learning_path_course::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Courses.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
