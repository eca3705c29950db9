//! Business operations composed from the pagination resolver, the filter translator and
//! a [`Repository`](crate::repository::Repository).

pub mod auth;
pub mod tasks;
pub mod users;

use serde::{Deserialize, Serialize};

use crate::pagination::page_count;
use crate::repository::QueryResult;

pub use auth::AuthService;
pub use tasks::TaskService;
pub use users::UserService;

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    /// Number of pages at the requested limit; 0 for an unpaginated request.
    pub pages: u64,
}

impl<T> Page<T> {
    pub fn from_result(result: QueryResult<T>, limit: u32) -> Self {
        Self {
            pages: page_count(result.total_count, limit),
            total_count: result.total_count,
            items: result.items,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            pages: self.pages,
        }
    }
}

/// Splits a comma-separated `relations` parameter into names, dropping blanks.
pub fn parse_relations(raw: Option<&str>) -> Vec<String> {
    raw.map(|r| {
        r.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
