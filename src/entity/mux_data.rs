use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::lesson;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mux_data")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub lesson_id: String,
  pub upload_id: Option<String>,
  pub asset_id: Option<String>,
  pub playback_id: Option<String>,
  pub updated_at: DateTime,
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
}

impl Related<lesson::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Lesson.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
