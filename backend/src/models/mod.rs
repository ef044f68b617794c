//! Data models shared across database access and API handlers.

use serde::Deserialize;

/// Query parameters for page-numbered endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

impl PageQuery {
    /// Returns the requested page, floored at 1.
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    /// Returns the page size clamped to 1..=100 (default 10).
    pub fn page_size(&self) -> i64 {
        self.page_size
            .filter(|ps| *ps > 0 && *ps <= MAX_PAGE_SIZE)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

pub mod attendee;
pub mod email_template;
pub mod event;
pub mod user;
