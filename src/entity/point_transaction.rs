use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user;

/// Why points were credited. Stored as text in the ledger key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointReason {
  ModuleCompletion,
  ModuleQuizMastery,
  StreakMilestone,
}

impl PointReason {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::ModuleCompletion => "MODULE_COMPLETION",
      Self::ModuleQuizMastery => "MODULE_QUIZ_MASTERY",
      Self::StreakMilestone => "STREAK_MILESTONE",
    }
  }
}

/// Append-only ledger; the composite key makes every award idempotent.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "point_transactions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: String,
  #[sea_orm(primary_key, auto_increment = false)]
  pub reason: String,
  #[sea_orm(primary_key, auto_increment = false)]
  pub reference_id: String,
  pub amount: i32,
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
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
