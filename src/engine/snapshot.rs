use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Page size for listings and snapshots. [`PageSize::All`] puts everything
/// on a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawPageSize", into = "String")]
pub enum PageSize {
    #[default]
    All,
    Fixed(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid page size '{0}', expected \"all\" or a number")]
pub struct PageSizeParseError(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPageSize {
    Number(i64),
    Text(String),
}

impl TryFrom<RawPageSize> for PageSize {
    type Error = PageSizeParseError;

    fn try_from(raw: RawPageSize) -> Result<Self, Self::Error> {
        match raw {
            RawPageSize::Number(n) => Ok(PageSize::from_limit(n)),
            RawPageSize::Text(s) => s.parse(),
        }
    }
}

impl From<PageSize> for String {
    fn from(page_size: PageSize) -> Self {
        page_size.to_string()
    }
}

impl PageSize {
    /// Non-positive limits mean "all".
    pub fn from_limit(limit: i64) -> Self {
        if limit <= 0 {
            PageSize::All
        } else {
            PageSize::Fixed(limit as usize)
        }
    }

    /// Items per page for a list of `total` items (never zero).
    pub fn per_page(self, total: usize) -> usize {
        match self {
            PageSize::All => total.max(1),
            PageSize::Fixed(n) => n.max(1),
        }
    }

    pub fn total_pages(self, total: usize) -> usize {
        total.div_ceil(self.per_page(total)).max(1)
    }

    /// Index range covered by the 1-based `page`. Pages past the end are
    /// empty.
    pub fn page_range(self, page: usize, total: usize) -> Range<usize> {
        let per_page = self.per_page(total);
        let start = page.max(1).saturating_sub(1).saturating_mul(per_page).min(total);
        let end = start.saturating_add(per_page).min(total);
        start..end
    }
}

impl FromStr for PageSize {
    type Err = PageSizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(PageSize::All);
        }
        trimmed
            .parse::<i64>()
            .map(PageSize::from_limit)
            .map_err(|_| PageSizeParseError(s.to_string()))
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::All => f.write_str("all"),
            PageSize::Fixed(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotEntry<T> {
    pub id: T,
    pub page: usize,
}

/// Stamp 1-based page numbers onto an already ordered id list.
///
/// The caller is responsible for passing the exact ordering used by the
/// paged listing this snapshot mirrors.
pub fn snapshot<T: Clone>(ordered_ids: &[T], page_size: PageSize) -> Vec<SnapshotEntry<T>> {
    let per_page = page_size.per_page(ordered_ids.len());
    ordered_ids
        .iter()
        .enumerate()
        .map(|(index, id)| SnapshotEntry {
            id: id.clone(),
            page: index / per_page + 1,
        })
        .collect()
}
