use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Page-based pagination parameters for list operations.
///
/// The admin screens page through large tables, so bounds are clamped
/// rather than rejected: page to 1..=9999, page size to 10..=200.
#[derive(Debug, Clone, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: usize,

    #[serde(default = "default_page_size", rename = "pageSize")]
    pub page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    50
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PageParams {
    /// Page number clamped to 1..=9999.
    pub fn page(&self) -> usize {
        self.page.clamp(1, 9999)
    }

    /// Page size clamped to 10..=200.
    pub fn page_size(&self) -> usize {
        self.page_size.clamp(10, 200)
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page() - 1) * self.page_size()
    }
}

/// Result wrapper for list operations.
///
/// `total` is the count of rows matching the filters with no page
/// applied, so callers can derive the page count.
#[derive(Debug, Clone, Serialize)]
pub struct ListResult<T: Serialize> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Generate a new random ID (UUIDv4, no dashes).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}

/// Get the current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Today's date in the server's local timezone.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Add `months` calendar months to a date, clamping to the last day of
/// the target month (2024-01-31 + 1 month = 2024-02-29).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    // Months::new never fails and checked_add_months only returns None
    // far outside any representable due date.
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}
