use async_graphql::{Enum, InputObject};
use sea_orm::{ColumnTrait, Condition, EntityTrait, Order, QueryFilter, QueryOrder};

use crate::engine::Locale;
use crate::entities;

pub mod entity_sort_fields;
pub use entity_sort_fields::*;

// ============================================================================
// GraphQL Input Types
// ============================================================================

#[derive(Enum, clap::ValueEnum, Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

#[derive(InputObject, Clone, Debug, Default)]
pub struct PaginationInput {
    pub page: Option<i32>,
    /// Zero or negative puts every track on one page
    pub page_size: Option<i32>,
}

/// Which part of the catalog a listing covers.
#[derive(Enum, clap::ValueEnum, Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum RankFilter {
    /// Tracks currently on the chart
    #[default]
    Ranked,
    /// Tracks that dropped off (or never made) the chart
    Unranked,
    All,
}

#[derive(Enum, clap::ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum RatedFilter {
    Rated,
    Unrated,
}

#[derive(InputObject, Clone, Debug, Default)]
pub struct TrackFilterInput {
    pub rank: Option<RankFilter>,
    pub rated: Option<RatedFilter>,
    /// Only tracks the user rated with exactly this value
    pub rating: Option<f64>,
    /// Substring of the title or the Japanese title
    pub title: Option<String>,
    /// Exact producer token in the requested locale
    pub producer: Option<String>,
    pub voicebank: Option<String>,
}

/// Storage-facing filter set, with defaults resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackFilters {
    pub rank: RankFilter,
    pub rated: Option<RatedFilter>,
    pub exact_rating: Option<f64>,
    pub title: Option<String>,
    pub producer: Option<String>,
    pub voicebank: Option<String>,
}

impl From<TrackFilterInput> for TrackFilters {
    fn from(input: TrackFilterInput) -> Self {
        Self {
            rank: input.rank.unwrap_or_default(),
            rated: input.rated,
            exact_rating: input.rating,
            title: non_blank(input.title),
            producer: non_blank(input.producer),
            voicebank: non_blank(input.voicebank),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ============================================================================
// Generic Helper Functions
// ============================================================================

/// Apply case-insensitive substring search across multiple columns (OR condition).
/// Matches if the search term appears in any of the provided columns.
pub fn apply_multi_column_text_search<T>(
    query: sea_orm::Select<T>,
    columns: Vec<impl ColumnTrait>,
    search_term: &str,
) -> sea_orm::Select<T>
where
    T: EntityTrait,
{
    if search_term.is_empty() || columns.is_empty() {
        return query;
    }

    // SQLite's LIKE is case-insensitive for ASCII characters by default
    let pattern = format!("%{}%", search_term);
    let mut condition = Condition::any();

    for column in columns {
        condition = condition.add(column.like(&pattern));
    }

    query.filter(condition)
}

/// Order a track listing by the requested keys, or by the rank filter's
/// default when there are none. Track id always breaks the remaining ties.
pub fn apply_track_sort(
    mut query: sea_orm::Select<entities::track::Entity>,
    sort_inputs: &[SortInput<TrackSortField>],
    rank: RankFilter,
    locale: Locale,
) -> sea_orm::Select<entities::track::Entity> {
    if sort_inputs.is_empty() {
        let (field, order) = TrackSortField::default_sort(rank);
        query = field.apply(query, order, locale);
    }

    // Apply multiple sorts (first has highest priority)
    for sort in sort_inputs {
        query = sort.field.apply(query, sort.order, locale);
    }

    query.order_by_asc(entities::track::Column::Id)
}

// ============================================================================
// Tests
// ============================================================================
