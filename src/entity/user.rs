use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{course, point_transaction, purchase};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
  #[sea_orm(string_value = "admin")]
  Admin,
  #[sea_orm(string_value = "tutor")]
  Tutor,
  #[sea_orm(string_value = "learner")]
  #[default]
  Learner,
}

impl UserRole {
  /// Parses the role claim issued by the auth provider. Anything unknown,
  /// including a missing claim, is a learner.
  pub fn from_claim(claim: &str) -> Self {
    match claim.trim().to_ascii_lowercase().as_str() {
      "admin" | "org:admin" | "org_admin" => Self::Admin,
      "tutor" => Self::Tutor,
      _ => Self::Learner,
    }
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
  #[sea_orm(string_value = "pending")]
  Pending,
  #[sea_orm(string_value = "active")]
  #[default]
  Active,
  #[sea_orm(string_value = "rejected")]
  Rejected,
  #[sea_orm(string_value = "suspended")]
  Suspended,
  #[sea_orm(string_value = "banned")]
  Banned,
}

impl UserStatus {
  pub fn from_claim(claim: &str) -> Option<Self> {
    match claim.trim().to_ascii_lowercase().as_str() {
      "pending" => Some(Self::Pending),
      "active" => Some(Self::Active),
      "rejected" => Some(Self::Rejected),
      "suspended" => Some(Self::Suspended),
      "banned" => Some(Self::Banned),
      _ => None,
    }
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  /// Identifier issued by the auth provider
  #[sea_orm(unique)]
  pub clerk_id: String,
  pub email: String,
  pub name: Option<String>,
  pub image_url: Option<String>,
  pub role: UserRole,
  pub status: UserStatus,
  pub points: i64,
  pub current_streak: i32,
  pub longest_streak: i32,
  pub streak_last_active_date: Option<Date>,
  /// Comma separated learner interests
  pub interests: Option<String>,
  pub goal: Option<String>,
  /// False while the local status has not reached the auth provider
  pub metadata_synced: bool,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

impl Model {
  pub fn interests(&self) -> Vec<String> {
    self
      .interests
      .as_deref()
      .unwrap_or_default()
      .split(',')
      .map(|s| s.trim().to_lowercase())
      .filter(|s| !s.is_empty())
      .collect()
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "course::Entity")]
  Courses,
  #[sea_orm(has_many = "purchase::Entity")]
  Purchases,
  #[sea_orm(has_many = "point_transaction::Entity")]
  PointTransactions,
}

impl Related<course::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Courses.def()
  }
}

impl Related<purchase::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Purchases.def()
  }
}

impl Related<point_transaction::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::PointTransactions.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
