//! Page selection for list endpoints.

use serde::Serialize;

/// Largest page size the API serves.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Page and page size of a collection request, sent as `p` and `s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Paginator {
    #[serde(rename = "p")]
    page: u32,
    #[serde(rename = "s")]
    per_page: u32,
}

impl Paginator {
    /// Creates a paginator, clamping both values into the accepted range.
    ///
    /// A negative page becomes `0`; the page size is clamped to
    /// `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: u32::try_from(page.max(0)).unwrap_or(u32::MAX),
            per_page: u32::try_from(per_page.clamp(1, i64::from(MAX_PAGE_SIZE)))
                .unwrap_or(MAX_PAGE_SIZE),
        }
    }

    /// Zero-based page index.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Query parameters in wire form.
    #[must_use]
    pub fn to_query(&self) -> [(&'static str, String); 2] {
        [("p", self.page.to_string()), ("s", self.per_page.to_string())]
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            page: 0,
            per_page: MAX_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps() {
        assert_eq!(Paginator::new(-3, 10).page(), 0);
        assert_eq!(Paginator::new(2, 100).per_page(), 50);
        assert_eq!(Paginator::new(2, 0).per_page(), 1);
        assert_eq!(Paginator::new(2, -5).per_page(), 1);
        assert_eq!(Paginator::new(4, 20), Paginator::new(4, 20));
    }

    #[test]
    fn test_query() {
        let query = Paginator::new(1, 25).to_query();
        assert_eq!(query[0], ("p", "1".to_owned()));
        assert_eq!(query[1], ("s", "25".to_owned()));
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let value = serde_json::to_value(Paginator::default()).unwrap();
        assert_eq!(value, serde_json::json!({"p": 0, "s": 50}));
    }
}
