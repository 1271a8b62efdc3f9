use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{chapter, purchase, user};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum CourseStatus {
  #[sea_orm(string_value = "draft")]
  #[default]
  Draft,
  #[sea_orm(string_value = "pending")]
  Pending,
  #[sea_orm(string_value = "published")]
  Published,
  #[sea_orm(string_value = "rejected")]
  Rejected,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  /// Survives the tutor's deletion as an orphan
  pub tutor_id: Option<String>,
  pub title: String,
  pub description: Option<String>,
  pub image_url: Option<String>,
  pub category: Option<String>,
  /// Minor currency units; `None` or zero is a free course
  pub price: Option<i64>,
  pub status: CourseStatus,
  pub is_published: bool,
  pub rejection_reason: Option<String>,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

impl Model {
  pub fn is_free(&self) -> bool {
    self.price.unwrap_or(0) <= 0
  }

  pub fn is_owned_by(&self, user_id: &str) -> bool {
    self.tutor_id.as_deref() == Some(user_id)
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::TutorId",
    to = "user::Column::Id",
    on_delete = "SetNull"
  )]
  Tutor,
  #[sea_orm(has_many = "chapter::Entity")]
  Chapters,
  #[sea_orm(has_many = "purchase::Entity")]
  Purchases,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Tutor.def()
  }
}

impl Related<chapter::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Chapters.def()
  }
}

impl Related<purchase::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Purchases.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
