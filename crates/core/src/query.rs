//! List query engine shared by every job listing.
//!
//! A [`ListQuery`] is applied in a fixed order: search, status filter, model
//! filter, sort, paginate. `total` in the returned [`PageMeta`] is the
//! filtered count before pagination.

use std::cmp::Ordering;

use serde::Serialize;

/// Default page number when the caller omits `page`.
pub const DEFAULT_PAGE: i64 = 1;

/// Default page size when the caller omits `pageSize`.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Textual sort key extracted from a record. `None` when the record has no
/// value for the key (or the key is unknown).
pub type SortValue = Option<String>;

/// Records that can be listed through [`query`].
pub trait Queryable {
    /// Case-insensitive substring match. `needle` is already lower-cased.
    fn matches_search(&self, needle: &str) -> bool;

    /// Upper-case status name compared against the status filter.
    fn status_text(&self) -> &str;

    /// Model membership test. Records without models ignore the filter.
    fn matches_model(&self, _model: &str) -> bool {
        true
    }

    /// Textual form of the named field, used for sorting.
    fn sort_value(&self, key: &str) -> SortValue;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// `"asc"` is ascending; any other value is descending.
    pub fn parse(text: &str) -> Self {
        if text == "asc" {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(key: impl Into<String>, order: SortOrder) -> Self {
        Self {
            key: key.into(),
            order,
        }
    }
}

/// A listing request. Build with [`ListQuery::new`] and the `with_*`
/// methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub model: Option<String>,
    pub sort: Option<SortSpec>,
    pub page: i64,
    pub page_size: i64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self {
            search: None,
            status: None,
            model: None,
            sort: None,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_sort(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(SortSpec::new(key, order));
        self
    }

    pub fn with_page(mut self, page: i64, page_size: i64) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Page number clamped to at least 1.
    pub fn effective_page(&self) -> i64 {
        self.page.max(1)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn effective_page_size(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: usize,
    pub page: i64,
    pub page_size: i64,
}

/// One page of results plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Number of pages needed to show `meta.total` records.
    pub fn page_count(&self) -> i64 {
        let total = self.meta.total as i64;
        (total + self.meta.page_size - 1) / self.meta.page_size
    }
}

/// Filter, sort and paginate `records` according to `request`.
///
/// `records` is taken in its current order; sorting is stable, so records
/// with equal sort values keep that order.
pub fn query<T: Queryable>(records: Vec<T>, request: &ListQuery) -> Page<T> {
    let mut rows = filter(records, request);

    if let Some(sort) = &request.sort {
        rows = sort_rows(rows, sort);
    }

    let total = rows.len();
    let page = request.effective_page();
    let page_size = request.effective_page_size();

    let start = usize::try_from((page - 1).saturating_mul(page_size)).unwrap_or(usize::MAX);
    let data: Vec<T> = rows
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .collect();

    Page {
        data,
        meta: PageMeta {
            total,
            page,
            page_size,
        },
    }
}

fn filter<T: Queryable>(records: Vec<T>, request: &ListQuery) -> Vec<T> {
    let needle = request
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    let status = request.status.as_deref().filter(|s| !s.is_empty());
    let model = request.model.as_deref().filter(|s| !s.is_empty());

    records
        .into_iter()
        .filter(|r| needle.as_deref().map_or(true, |n| r.matches_search(n)))
        .filter(|r| status.map_or(true, |s| r.status_text() == s))
        .filter(|r| model.map_or(true, |m| r.matches_model(m)))
        .collect()
}

fn sort_rows<T: Queryable>(rows: Vec<T>, sort: &SortSpec) -> Vec<T> {
    let mut keyed: Vec<(SortValue, T)> = rows
        .into_iter()
        .map(|r| (r.sort_value(&sort.key), r))
        .collect();
    // `sort_by` is stable: rows with equal keys keep their current order.
    keyed.sort_by(|a, b| compare_values(&a.0, &b.0, sort.order));
    keyed.into_iter().map(|(_, r)| r).collect()
}

/// Compare two sort values. Present values compare as text in the requested
/// direction; absent or empty values sort after present ones regardless of
/// direction and are equal to each other.
fn compare_values(a: &SortValue, b: &SortValue, order: SortOrder) -> Ordering {
    let a = a.as_deref().filter(|v| !v.is_empty());
    let b = b.as_deref().filter(|v| !v.is_empty());
    match (a, b) {
        (Some(a), Some(b)) => match order {
            SortOrder::Asc => compare_text(a, b),
            SortOrder::Desc => compare_text(b, a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Alphabetical regardless of case. Values equal ignoring case fall back to
/// byte order so the comparison stays total.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
