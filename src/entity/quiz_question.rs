use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::lesson;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quiz_questions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub lesson_id: String,
  pub prompt: String,
  /// json array of option labels
  pub options: Json,
  /// Index into `options`
  pub correct_option: i32,
  pub position: i32,
}

impl Model {
  pub fn options(&self) -> Vec<String> {
    json::from_value(self.options.clone()).unwrap_or_default()
  }
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
