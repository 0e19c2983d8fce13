//! Paginated resource collections.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{CollectionError, PathError, SoldoError};
use crate::path;
use crate::resource::Resource;
use crate::schema::{CollectionSchema, ResourceKind};

static COLLECTION_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/\S*$").expect("valid collection path pattern"));

/// Pagination fields every envelope must carry.
const PAGINATION_FIELDS: [&str; 5] = ["pages", "total", "page_size", "current_page", "results_size"];

/// A page of resources returned by a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceCollection {
    schema: CollectionSchema,
    pages: u64,
    total: u64,
    page_size: u64,
    current_page: u64,
    results_size: u64,
    items: Vec<Resource>,
    filled: bool,
}

impl ResourceCollection {
    /// Creates an empty collection for the given endpoint.
    #[must_use]
    pub const fn new(schema: CollectionSchema) -> Self {
        Self {
            schema,
            pages: 0,
            total: 0,
            page_size: 0,
            current_page: 0,
            results_size: 0,
            items: Vec::new(),
            filled: false,
        }
    }

    /// Creates an empty collection for a resource kind with a list endpoint.
    #[must_use]
    pub fn for_kind(kind: ResourceKind) -> Option<Self> {
        kind.collection().map(Self::new)
    }

    /// Populates the collection from a pagination envelope.
    ///
    /// The envelope must carry non-negative integer `pages`, `total`,
    /// `page_size`, `current_page` and `results_size` (digit-only strings are
    /// accepted) plus a `results` array of objects. Nothing is stored unless
    /// every check and every item build succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SoldoError::Collection`] if the envelope is invalid or the
    /// collection was already filled, and [`SoldoError::Cast`] if an item
    /// cannot be built.
    pub fn fill(&mut self, envelope: &Value) -> Result<&mut Self, SoldoError> {
        if self.filled {
            return Err(CollectionError::new("collection is already populated").into());
        }
        let envelope = envelope
            .as_object()
            .ok_or_else(|| CollectionError::new("envelope is not an object"))?;

        let mut counters = [0_u64; PAGINATION_FIELDS.len()];
        for (slot, field) in counters.iter_mut().zip(PAGINATION_FIELDS) {
            let value = envelope
                .get(field)
                .ok_or_else(|| CollectionError::new(format!("\"{field}\" is missing")))?;
            *slot = path::parse_unsigned(value).ok_or_else(|| {
                CollectionError::new(format!("\"{field}\" is not a non-negative integer"))
            })?;
        }

        let results = envelope
            .get("results")
            .ok_or_else(|| CollectionError::new("\"results\" is missing"))?
            .as_array()
            .ok_or_else(|| CollectionError::new("\"results\" is not an array"))?;

        let items = results
            .iter()
            .enumerate()
            .map(|(index, item)| {
                if !item.is_object() {
                    return Err(CollectionError::new(format!(
                        "result {index} is not an object"
                    ))
                    .into());
                }
                Resource::from_value(self.schema.item, item)
            })
            .collect::<Result<Vec<_>, SoldoError>>()?;

        let [pages, total, page_size, current_page, results_size] = counters;
        self.pages = pages;
        self.total = total;
        self.page_size = page_size;
        self.current_page = current_page;
        self.results_size = results_size;
        self.items = items;
        self.filled = true;

        #[cfg(feature = "telemetry")]
        tracing::debug!(
            resource = self.schema.item.name,
            items = self.items.len(),
            current_page,
            pages,
            "collection populated"
        );

        Ok(self)
    }

    /// Returns the endpoint path of the collection.
    ///
    /// # Errors
    ///
    /// Returns [`SoldoError::Path`] if the path is unset or malformed.
    pub fn remote_path(&self) -> Result<String, SoldoError> {
        let name = self.schema.item.name;
        let path = self
            .schema
            .path
            .ok_or_else(|| PathError::new(name, "collection path is not set"))?;
        if !COLLECTION_PATH.is_match(path) {
            return Err(PathError::new(name, format!("invalid collection path \"{path}\"")).into());
        }
        Ok(path.to_owned())
    }

    /// Returns the items in response order.
    #[must_use]
    pub fn items(&self) -> &[Resource] {
        &self.items
    }

    /// Consumes the collection and returns its items.
    #[must_use]
    pub fn into_items(self) -> Vec<Resource> {
        self.items
    }

    /// Total number of pages.
    #[must_use]
    pub const fn pages(&self) -> u64 {
        self.pages
    }

    /// Total number of results across all pages.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Results per page.
    #[must_use]
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Zero-based index of this page.
    #[must_use]
    pub const fn current_page(&self) -> u64 {
        self.current_page
    }

    /// Number of results on this page.
    #[must_use]
    pub const fn results_size(&self) -> u64 {
        self.results_size
    }

    /// Returns `true` once [`fill`](Self::fill) has succeeded.
    #[must_use]
    pub const fn is_filled(&self) -> bool {
        self.filled
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::{ResourceSchema, WALLET};

    static MOCK: ResourceSchema = ResourceSchema {
        base_path: Some("/resources"),
        ..ResourceSchema::named("MockResource")
    };

    fn collection() -> ResourceCollection {
        ResourceCollection::new(CollectionSchema {
            path: Some("/resources"),
            item: &MOCK,
        })
    }

    fn envelope() -> Value {
        json!({
            "pages": 1,
            "total": 2,
            "page_size": 50,
            "current_page": 0,
            "results_size": 2,
            "results": [{"id": 1, "name": "first"}, {"id": 2, "name": "second"}],
        })
    }

    #[test]
    fn test_fill() {
        let mut collection = collection();
        collection.fill(&envelope()).unwrap();
        assert_eq!(collection.pages(), 1);
        assert_eq!(collection.total(), 2);
        assert_eq!(collection.page_size(), 50);
        assert_eq!(collection.current_page(), 0);
        assert_eq!(collection.results_size(), 2);
        assert_eq!(collection.items().len(), 2);
        assert_eq!(collection.items()[1].value("name"), Some(&json!("second")));
        assert_eq!(collection.items()[0].schema(), &MOCK);
    }

    #[test]
    fn test_fill_accepts_digit_strings() {
        let mut data = envelope();
        data["total"] = json!("2");
        let mut collection = collection();
        collection.fill(&data).unwrap();
        assert_eq!(collection.total(), 2);
    }

    #[test]
    fn test_fill_missing_field() {
        for field in ["pages", "total", "page_size", "current_page", "results_size", "results"] {
            let mut data = envelope();
            data.as_object_mut().unwrap().remove(field);
            let mut collection = collection();
            assert!(
                matches!(collection.fill(&data), Err(SoldoError::Collection(_))),
                "{field}"
            );
            assert!(collection.items().is_empty());
            assert!(!collection.is_filled());
        }
    }

    #[test]
    fn test_fill_invalid_integers() {
        for field in ["pages", "total", "page_size", "current_page"] {
            for bad in [json!("a string"), json!(-1), json!(1.5), json!(null), json!("")] {
                let mut data = envelope();
                data[field] = bad;
                let mut collection = collection();
                assert!(matches!(
                    collection.fill(&data),
                    Err(SoldoError::Collection(_))
                ));
                assert!(collection.items().is_empty());
            }
        }
    }

    #[test]
    fn test_fill_invalid_results() {
        for bad in [json!("results"), json!({"id": 1}), json!([{"id": 1}, 2])] {
            let mut data = envelope();
            data["results"] = bad;
            let mut collection = collection();
            assert!(matches!(
                collection.fill(&data),
                Err(SoldoError::Collection(_))
            ));
            assert!(collection.items().is_empty());
        }
    }

    #[test]
    fn test_fill_twice_is_rejected() {
        let mut collection = collection();
        collection.fill(&envelope()).unwrap();
        assert!(matches!(
            collection.fill(&envelope()),
            Err(SoldoError::Collection(_))
        ));
        assert_eq!(collection.items().len(), 2);
    }

    #[test]
    fn test_remote_path() {
        assert_eq!(collection().remote_path().unwrap(), "/resources");
        let wallets = ResourceCollection::for_kind(ResourceKind::Wallet).unwrap();
        assert_eq!(wallets.remote_path().unwrap(), "/wallets");
        assert!(ResourceCollection::for_kind(ResourceKind::Company).is_none());
    }

    #[test]
    fn test_remote_path_invalid() {
        for path in [None, Some("resources"), Some("/with space")] {
            let collection = ResourceCollection::new(CollectionSchema { path, item: &WALLET });
            assert!(matches!(
                collection.remote_path(),
                Err(SoldoError::Path(_))
            ));
        }
    }
}
