use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{chapter, mux_data, quiz_question};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum LessonType {
  #[sea_orm(string_value = "video")]
  #[default]
  Video,
  #[sea_orm(string_value = "quiz")]
  Quiz,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lessons")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub chapter_id: String,
  pub title: String,
  pub description: Option<String>,
  pub lesson_type: LessonType,
  pub video_url: Option<String>,
  pub is_free_preview: bool,
  pub position: i32,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "chapter::Entity",
    from = "Column::ChapterId",
    to = "chapter::Column::Id",
    on_delete = "Cascade"
  )]
  Chapter,
  #[sea_orm(has_one = "mux_data::Entity")]
  MuxData,
  #[sea_orm(has_many = "quiz_question::Entity")]
  Questions,
}

impl Related<chapter::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Chapter.def()
  }
}

impl Related<mux_data::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::MuxData.def()
  }
}

impl Related<quiz_question::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Questions.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
