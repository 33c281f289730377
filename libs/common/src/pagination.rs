//! Pagination primitives shared by every list endpoint
//!
//! A page request is turned into a [`PageWindow`] using one convention
//! only: `offset = page_no * page_size` and `count = page_size`, which maps
//! directly onto SQL `LIMIT count OFFSET offset` and onto slicing an
//! in-memory collection.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Page size used when the caller supplies none or a non-positive one
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page a single request may ask for
pub const MAX_PAGE_SIZE: i64 = 100;

/// Malformed pagination or identifier input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("parameter `{name}` is not an integer: {value:?}")]
    NotAnInteger { name: &'static str, value: String },

    #[error("parameter `{0}` is required")]
    Missing(&'static str),
}

/// Requested page, already normalised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_no: i64,
    pub page_size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_no: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Normalise raw values: negative pages become 0, non-positive sizes
    /// become [`DEFAULT_PAGE_SIZE`] and oversized ones [`MAX_PAGE_SIZE`].
    pub fn new(page_no: i64, page_size: i64) -> Self {
        let page_size = if page_size <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size.min(MAX_PAGE_SIZE)
        };

        Self {
            page_no: page_no.max(0),
            page_size,
        }
    }

    /// Parse query-string values, reporting the first malformed one
    pub fn parse(page_no: Option<&str>, page_size: Option<&str>) -> Result<Self, ValidationError> {
        let page_no = parse_param("pageNo", page_no)?.unwrap_or(0);
        let page_size = parse_param("pageSize", page_size)?.unwrap_or(DEFAULT_PAGE_SIZE);
        Ok(Self::new(page_no, page_size))
    }

    /// Like [`PageRequest::parse`] but never fails: malformed input
    /// degrades to the default request.
    pub fn lenient(page_no: Option<&str>, page_size: Option<&str>) -> Self {
        Self::parse(page_no, page_size).unwrap_or_else(|e| {
            debug!("Substituting default page request: {}", e);
            Self::default()
        })
    }

    /// Window of rows this request covers
    pub fn window(&self) -> PageWindow {
        PageWindow {
            offset: self.page_no.saturating_mul(self.page_size),
            count: self.page_size,
        }
    }
}

fn parse_param(name: &'static str, raw: Option<&str>) -> Result<Option<i64>, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ValidationError::NotAnInteger {
                name,
                value: value.to_string(),
            }),
    }
}

/// `(offset, count)` pair identifying a slice of an ordered result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub count: i64,
}

impl PageWindow {
    /// The part of `items` covered by this window. Truncated at the end
    /// of the collection, empty once the offset passes it.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.offset)
            .unwrap_or(usize::MAX)
            .min(items.len());
        let count = usize::try_from(self.count).unwrap_or(0);
        let end = start.saturating_add(count).min(items.len());
        &items[start..end]
    }
}

/// One page of assembled records plus the size of the full matching set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    #[serde(rename = "pageNo", skip_serializing_if = "Option::is_none")]
    pub page_no: Option<i64>,
    pub total: i64,
    #[serde(rename = "list")]
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(page_no: i64, total: i64, items: Vec<T>) -> Self {
        Self {
            page_no: Some(page_no),
            total,
            items,
        }
    }

    /// Drop the page number, for listings where it carries no meaning
    pub fn without_page_no(mut self) -> Self {
        self.page_no = None;
        self
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page_no: self.page_no,
            total: self.total,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}
