use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{learning_path, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_learning_paths")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: String,
  #[sea_orm(primary_key, auto_increment = false)]
  pub path_id: String,
  pub payment_reference: Option<String>,
  pub amount_paid: i64,
  pub enrolled_at: DateTime,
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
    belongs_to = "learning_path::Entity",
    from = "Column::PathId",
    to = "learning_path::Column::Id",
    on_delete = "Cascade"
  )]
  Path,
}

impl Related<learning_path::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Path.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
