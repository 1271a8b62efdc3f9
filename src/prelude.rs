pub use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
  time::Duration,
};

pub use anyhow::Context;
pub use chrono::{NaiveDate, NaiveDateTime as DateTime, Utc};
pub use migration::MigratorTrait;
pub use sea_orm::{
  ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection,
  EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
  TransactionTrait,
};
pub use tracing::{debug, error, info, warn};

pub use crate::{
  auth::AuthContext,
  error::{Error, Result},
};
pub(crate) use crate::utils;

