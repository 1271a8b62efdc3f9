use serde::{Deserialize, Serialize};

use crate::prelude::*;

pub const DEFAULT_PAGE_LIMIT: u64 = 20;
pub const MAX_PAGE_LIMIT: u64 = 100;
/// Highest page whose offset still fits the database's signed 64-bit range
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_LIMIT;

pub fn new_id() -> String {
  uuid::Uuid::new_v4().to_string()
}

pub fn now() -> DateTime {
  Utc::now().naive_utc()
}

pub fn today() -> NaiveDate {
  Utc::now().date_naive()
}

/// Day key used by the watch-time table.
pub fn day_key(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

/// Rounded share of `part` in `total`; zero when there is nothing to count.
pub fn percentage(part: u64, total: u64) -> u32 {
  if total == 0 {
    return 0;
  }
  (part as f64 / total as f64 * 100.0).round() as u32
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PageQuery {
  pub page: Option<u64>,
  pub limit: Option<u64>,
  pub search: Option<String>,
  pub category: Option<String>,
}

impl PageQuery {
  pub fn new(page: u64, limit: u64) -> Self {
    Self { page: Some(page), limit: Some(limit), ..Default::default() }
  }

  pub fn page(&self) -> u64 {
    self.page.unwrap_or(1).clamp(1, MAX_PAGE)
  }

  pub fn limit(&self) -> u64 {
    self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
  }

  pub fn offset(&self) -> u64 {
    (self.page() - 1) * self.limit()
  }

  /// Lowercased `%term%` pattern, `None` for blank searches.
  pub fn search_pattern(&self) -> Option<String> {
    let term = self.search.as_deref()?.trim();
    if term.is_empty() {
      return None;
    }
    Some(format!("%{}%", term.to_lowercase()))
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub items: Vec<T>,
  pub total_count: u64,
  pub total_pages: u64,
  pub current_page: u64,
  pub has_next_page: bool,
  pub has_previous_page: bool,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, total_count: u64, query: &PageQuery) -> Self {
    let current_page = query.page();
    let total_pages = total_count.div_ceil(query.limit());

    Self {
      items,
      total_count,
      total_pages,
      current_page,
      has_next_page: current_page < total_pages,
      has_previous_page: current_page > 1,
    }
  }
}
