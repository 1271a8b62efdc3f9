use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Every provider reference ever redeemed, whatever it bought. The key makes
/// a single charge redeemable once; rows outlive the users and goods they
/// point at.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_references")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub reference: String,
  pub user_id: String,
  pub course_id: Option<String>,
  pub path_id: Option<String>,
  pub amount: i64,
  pub created_at: DateTime,
}

impl Model {
  pub fn redeemed_for_course(&self, user_id: &str, course_id: &str) -> bool {
    self.user_id == user_id && self.course_id.as_deref() == Some(course_id)
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
