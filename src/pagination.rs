//! Pagination parameters for list endpoints.
//!
//! Raw query values are never rejected: anything missing or unparsable is replaced by a
//! default inside [`resolve`], so list endpoints always answer with a best-effort page.

use serde::{Deserialize, Serialize};

/// Page size used when the caller sends no limit or one outside `1..=MAX_LIMIT`.
pub const DEFAULT_LIMIT: u32 = 10;
/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 50;
pub const DEFAULT_SORT_KEY: &str = "created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Normalized pagination for one request.
///
/// `page` is 0-based and `skip == page * limit`. A `limit` of zero means the request is
/// unpaginated and the repository applies no row limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationRequest {
    pub page: u32,
    pub limit: u32,
    pub skip: u64,
    pub sort_key: String,
    pub sort_direction: SortDirection,
}

/// Per-endpoint fallbacks applied by [`resolve`].
#[derive(Debug, Clone)]
pub struct PaginationDefaults {
    /// 0-based page used when the caller sends none. Negative selects unpaginated mode.
    pub page: i64,
    pub sort_key: String,
    pub sort_direction: SortDirection,
}

impl Default for PaginationDefaults {
    fn default() -> Self {
        Self {
            page: 0,
            sort_key: DEFAULT_SORT_KEY.to_string(),
            sort_direction: SortDirection::Desc,
        }
    }
}

/// Raw pagination values as they arrive in the query string.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(alias = "sortKey")]
    pub sort_key: Option<String>,
    #[serde(alias = "sortAsc")]
    pub sort_asc: Option<String>,
}

impl PaginationQuery {
    pub fn resolve(&self, defaults: &PaginationDefaults) -> PaginationRequest {
        resolve(
            self.page.as_deref(),
            self.limit.as_deref(),
            self.sort_key.as_deref(),
            self.sort_asc.as_deref(),
            defaults,
        )
    }
}

/// Turns raw page/limit/sort values into a [`PaginationRequest`].
///
/// A supplied page is 1-based; absent, non-numeric or non-positive pages fall back to
/// `defaults.page`. The limit must parse and lie within `1..=MAX_LIMIT`, otherwise
/// `DEFAULT_LIMIT` is used. Sorting is ascending only for the literal `"true"`.
pub fn resolve(
    raw_page: Option<&str>,
    raw_limit: Option<&str>,
    raw_sort_key: Option<&str>,
    raw_sort_asc: Option<&str>,
    defaults: &PaginationDefaults,
) -> PaginationRequest {
    let requested_page = raw_page
        .and_then(|p| p.trim().parse::<i64>().ok())
        .filter(|p| *p > 0);

    let limit = raw_limit
        .and_then(|l| l.trim().parse::<i64>().ok())
        .filter(|l| (1..=MAX_LIMIT as i64).contains(l))
        .map(|l| l as u32)
        .unwrap_or(DEFAULT_LIMIT);

    let sort_key = raw_sort_key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .unwrap_or(defaults.sort_key.as_str())
        .to_string();

    let sort_direction = if raw_sort_asc == Some("true") {
        SortDirection::Asc
    } else {
        defaults.sort_direction
    };

    let (page, limit) = match requested_page {
        Some(p) => (clamp_page(p - 1), limit),
        None if defaults.page < 0 => (0, 0),
        None => (clamp_page(defaults.page), limit),
    };

    PaginationRequest {
        page,
        limit,
        skip: page as u64 * limit as u64,
        sort_key,
        sort_direction,
    }
}

fn clamp_page(page: i64) -> u32 {
    page.clamp(0, u32::MAX as i64) as u32
}

/// Number of pages needed for `total` rows, or 0 for an unpaginated (`limit == 0`) request.
pub fn page_count(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit as u64)
}
