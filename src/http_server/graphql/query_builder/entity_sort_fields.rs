use async_graphql::{Enum, InputObject};
use sea_orm::sea_query::{Expr, NullOrdering};
use sea_orm::{QueryOrder, Select};

use super::{RankFilter, SortOrder};
use crate::engine::Locale;
use crate::entities;

/// Localized display strings: the Japanese field when it has content.
const PRODUCER_JA: &str = "CASE WHEN TRIM(\"tracks\".\"producer_jp\") <> '' \
     THEN \"tracks\".\"producer_jp\" ELSE \"tracks\".\"producer\" END";
const VOICEBANK_JA: &str = "CASE WHEN TRIM(\"tracks\".\"voicebank_jp\") <> '' \
     THEN \"tracks\".\"voicebank_jp\" ELSE \"tracks\".\"voicebank\" END";

// ============================================================================
// Entity-Specific Sort Field Enums
// ============================================================================

#[derive(Enum, clap::ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "TrackSortField")]
pub enum TrackSortField {
    Id,
    Title,
    /// Locale-aware producer display string
    Producer,
    /// Locale-aware voicebank display string
    Voicebank,
    PublishedAt,
    Rank,
    /// The requesting user's rating
    Rating,
}

impl TrackSortField {
    /// Ordering used when the caller gives none.
    pub fn default_sort(rank: RankFilter) -> (Self, SortOrder) {
        match rank {
            RankFilter::Unranked => (TrackSortField::PublishedAt, SortOrder::Desc),
            RankFilter::Ranked | RankFilter::All => (TrackSortField::Rank, SortOrder::Asc),
        }
    }

    /// Append this field to the query's ordering, missing values last.
    ///
    /// `Rating` reads the `ratings` table, so the query must already be
    /// joined with the requesting user's ratings.
    pub fn apply(
        self,
        query: Select<entities::track::Entity>,
        order: SortOrder,
        locale: Locale,
    ) -> Select<entities::track::Entity> {
        use entities::track::Column;

        let order = order.into();
        let nulls = NullOrdering::Last;
        match (self, locale) {
            (TrackSortField::Id, _) => query.order_by_with_nulls(Column::Id, order, nulls),
            (TrackSortField::Title, _) => query.order_by_with_nulls(Column::Title, order, nulls),
            (TrackSortField::Producer, Locale::En) => {
                query.order_by_with_nulls(Column::Producer, order, nulls)
            }
            (TrackSortField::Producer, Locale::Ja) => {
                query.order_by_with_nulls(Expr::cust(PRODUCER_JA), order, nulls)
            }
            (TrackSortField::Voicebank, Locale::En) => {
                query.order_by_with_nulls(Column::Voicebank, order, nulls)
            }
            (TrackSortField::Voicebank, Locale::Ja) => {
                query.order_by_with_nulls(Expr::cust(VOICEBANK_JA), order, nulls)
            }
            (TrackSortField::PublishedAt, _) => {
                query.order_by_with_nulls(Column::PublishedAt, order, nulls)
            }
            (TrackSortField::Rank, _) => query.order_by_with_nulls(Column::Rank, order, nulls),
            (TrackSortField::Rating, _) => {
                query.order_by_with_nulls(entities::rating::Column::Rating, order, nulls)
            }
        }
    }
}

// ============================================================================
// Entity-Specific Sort Input Types
// ============================================================================

// Entity-specific sort input types (async_graphql doesn't support generic InputObjects)
#[derive(InputObject, Clone, Debug)]
pub struct TrackSortInput {
    pub field: TrackSortField,
    pub order: SortOrder,
}

// Internal generic sort input for use in helper functions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortInput<F> {
    pub field: F,
    pub order: SortOrder,
}

impl From<TrackSortInput> for SortInput<TrackSortField> {
    fn from(input: TrackSortInput) -> Self {
        Self {
            field: input.field,
            order: input.order,
        }
    }
}
