use std::collections::HashSet;
use std::sync::Arc;

use color_eyre::eyre::{Context, Result};
use sea_orm::sea_query::IntoCondition;
use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

use crate::database::Database;
use crate::engine::{Locale, RatedTrack, TrackAttributes};
use crate::entities;
use crate::http_server::graphql::query_builder::{
    RankFilter, RatedFilter, apply_multi_column_text_search, apply_track_sort,
};
use crate::ports::rating_store::{RatingStore, TrackListQuery};
use crate::services::catalog::CreditRole;

/// Two ratings closer than this count as the same value.
const RATING_EPSILON: f64 = 1e-9;

impl From<entities::track::Model> for TrackAttributes {
    fn from(track: entities::track::Model) -> Self {
        Self {
            track_id: track.id,
            producer_en: track.producer,
            producer_jp: track.producer_jp,
            voicebank_en: track.voicebank,
            voicebank_jp: track.voicebank_jp,
            published_at: track.published_at,
            rank: track.rank,
        }
    }
}

/// Production [`RatingStore`] backed by the SQLite catalog.
pub struct SeaOrmRatingStore {
    db: Arc<Database>,
}

impl SeaOrmRatingStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Ids of tracks crediting `name` under `role` in `locale`.
    async fn credited_track_ids(
        &self,
        role: CreditRole,
        name: &str,
        locale: Locale,
    ) -> Result<Vec<i64>> {
        let Some(artist) = entities::artist::Entity::find()
            .filter(entities::artist::Column::Name.eq(name))
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to query artist by name")?
        else {
            return Ok(Vec::new());
        };

        let credits = entities::track_artist::Entity::find()
            .filter(entities::track_artist::Column::ArtistId.eq(artist.id))
            .filter(entities::track_artist::Column::Role.eq(role.as_str()))
            .filter(entities::track_artist::Column::Locale.eq(locale.code()))
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to query track credits")?;

        Ok(credits.into_iter().map(|c| c.track_id).collect())
    }
}

#[async_trait::async_trait]
impl RatingStore for SeaOrmRatingStore {
    async fn fetch_ratings(&self, user_id: Option<i64>) -> Result<Vec<RatedTrack>> {
        let mut query =
            entities::rating::Entity::find().order_by_asc(entities::rating::Column::Id);
        if let Some(user_id) = user_id {
            query = query.filter(entities::rating::Column::UserId.eq(user_id));
        }

        let rows = query
            .find_also_related(entities::track::Entity)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch ratings")?;

        Ok(rows
            .into_iter()
            .filter_map(|(rating, track)| match track {
                Some(track) => Some(RatedTrack {
                    track: track.into(),
                    user_id: rating.user_id,
                    rating: rating.rating,
                    notes: rating.notes,
                }),
                None => {
                    log::warn!("Rating {} points at a missing track", rating.id);
                    None
                }
            })
            .collect())
    }

    async fn fetch_unrated_tracks(&self, excluding: &HashSet<i64>) -> Result<Vec<TrackAttributes>> {
        let tracks = entities::track::Entity::find()
            .filter(entities::track::Column::Id.is_not_in(excluding.iter().copied()))
            .order_by_asc(entities::track::Column::Id)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch unrated tracks")?;

        Ok(tracks.into_iter().map(TrackAttributes::from).collect())
    }

    async fn fetch_ordered_track_ids(&self, query: &TrackListQuery) -> Result<Vec<i64>> {
        let filters = &query.filters;
        let mut select = entities::track::Entity::find();

        select = match filters.rank {
            RankFilter::Ranked => select.filter(entities::track::Column::Rank.is_not_null()),
            RankFilter::Unranked => select.filter(entities::track::Column::Rank.is_null()),
            RankFilter::All => select,
        };

        if let Some(title) = &filters.title {
            select = apply_multi_column_text_search(
                select,
                vec![
                    entities::track::Column::Title,
                    entities::track::Column::TitleJp,
                ],
                title,
            );
        }

        for (role, name) in [
            (CreditRole::Producer, &filters.producer),
            (CreditRole::Voicebank, &filters.voicebank),
        ] {
            if let Some(name) = name {
                let ids = self.credited_track_ids(role, name, query.locale).await?;
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                select = select.filter(entities::track::Column::Id.is_in(ids));
            }
        }

        // Only the requesting user's rating joins, so track rows never repeat
        let user_id = query.user_id;
        select = select.join(
            JoinType::LeftJoin,
            entities::track::Relation::Rating
                .def()
                .on_condition(move |_left, _right| {
                    entities::rating::Column::UserId.eq(user_id).into_condition()
                }),
        );

        select = match filters.rated {
            Some(RatedFilter::Rated) => select.filter(entities::rating::Column::Id.is_not_null()),
            Some(RatedFilter::Unrated) => select.filter(entities::rating::Column::Id.is_null()),
            None => select,
        };

        if let Some(wanted) = filters.exact_rating {
            select = select.filter(
                entities::rating::Column::Rating
                    .between(wanted - RATING_EPSILON, wanted + RATING_EPSILON),
            );
        }

        apply_track_sort(select, &query.sort, filters.rank, query.locale)
            .select_only()
            .column(entities::track::Column::Id)
            .into_tuple::<i64>()
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch ordered track ids")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_server::graphql::query_builder::{
        SortInput, SortOrder, TrackFilters, TrackSortField,
    };
    use crate::services::catalog::CatalogService;
    use crate::services::catalog::tests::catalog_track;
    use crate::test_utils::{TrackSeed, insert_rating, insert_track, test_db};

    /// Tracks with ids 1..=n in order, published on day 1..=n, with
    /// optional ratings by user 1.
    async fn seed_rows(rows: &[(&str, Option<i32>, Option<f64>)]) -> SeaOrmRatingStore {
        let db = test_db().await;
        for (i, (title, rank, rating)) in rows.iter().enumerate() {
            let track = insert_track(
                &db,
                TrackSeed {
                    title: *title,
                    producer: "P",
                    voicebank: "V",
                    rank: *rank,
                    published_day: i as u32 + 1,
                },
            )
            .await;
            if let Some(rating) = rating {
                insert_rating(&db, 1, track.id, *rating).await;
            }
        }
        SeaOrmRatingStore::new(db)
    }

    async fn ordered(
        store: &SeaOrmRatingStore,
        rank: RankFilter,
        sort: Vec<SortInput<TrackSortField>>,
    ) -> Vec<i64> {
        let query = TrackListQuery {
            user_id: 1,
            filters: TrackFilters {
                rank,
                ..Default::default()
            },
            sort,
            ..Default::default()
        };
        store.fetch_ordered_track_ids(&query).await.unwrap()
    }

    fn sort(field: TrackSortField, order: SortOrder) -> Vec<SortInput<TrackSortField>> {
        vec![SortInput { field, order }]
    }

    #[tokio::test]
    async fn test_default_order_is_rank_ascending() {
        let store = seed_rows(&[("a", Some(3), None), ("b", Some(1), None), ("c", Some(2), None)])
            .await;
        assert_eq!(ordered(&store, RankFilter::Ranked, vec![]).await, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_default_order_for_unranked_is_newest_first() {
        let store = seed_rows(&[("a", None, None), ("b", None, None), ("c", None, None)]).await;
        assert_eq!(ordered(&store, RankFilter::Unranked, vec![]).await, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_missing_values_sort_last_both_ways() {
        let store = seed_rows(&[
            ("a", None, Some(5.0)),
            ("b", Some(2), None),
            ("c", Some(1), Some(9.0)),
        ])
        .await;

        let rank_desc = sort(TrackSortField::Rank, SortOrder::Desc);
        assert_eq!(ordered(&store, RankFilter::All, rank_desc).await, vec![2, 3, 1]);

        let rating_asc = sort(TrackSortField::Rating, SortOrder::Asc);
        assert_eq!(ordered(&store, RankFilter::All, rating_asc).await, vec![1, 3, 2]);

        let rating_desc = sort(TrackSortField::Rating, SortOrder::Desc);
        assert_eq!(ordered(&store, RankFilter::All, rating_desc).await, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_ties_break_on_id() {
        let store = seed_rows(&[("a", None, None), ("b", None, None), ("c", None, None)]).await;
        let producer_desc = sort(TrackSortField::Producer, SortOrder::Desc);
        assert_eq!(ordered(&store, RankFilter::All, producer_desc).await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_multiple_sort_keys() {
        let store = seed_rows(&[
            ("b", None, Some(7.0)),
            ("a", None, Some(7.0)),
            ("c", None, Some(9.0)),
        ])
        .await;
        let keys = vec![
            SortInput { field: TrackSortField::Rating, order: SortOrder::Desc },
            SortInput { field: TrackSortField::Title, order: SortOrder::Asc },
        ];
        assert_eq!(ordered(&store, RankFilter::All, keys).await, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_rating_sort_ignores_other_users() {
        let store = seed_rows(&[("a", None, Some(2.0)), ("b", None, None)]).await;
        insert_rating(&store.db, 2, 2, 10.0).await;

        let rating_desc = sort(TrackSortField::Rating, SortOrder::Desc);
        assert_eq!(ordered(&store, RankFilter::All, rating_desc).await, vec![1, 2]);
    }

    async fn seed_listing(db: &Arc<Database>) {
        let catalog = CatalogService::new(db.clone());
        let mut jp = catalog_track("a", "Alpha", "Miku", Some(2));
        jp.title = "Senbonzakura".to_string();
        jp.title_jp = Some("千本桜".to_string());
        jp.producer_jp = Some("アルファ".to_string());
        catalog
            .upsert_tracks(
                vec![
                    jp,
                    catalog_track("b", "Beta", "GUMI", Some(1)),
                    catalog_track("c", "Alpha, Beta", "Miku", None),
                    catalog_track("d", "Gamma", "Rin", Some(3)),
                ],
                false,
            )
            .await
            .unwrap();
        // Ids follow insertion order: a=1, b=2, c=3, d=4
        insert_rating(db, 1, 1, 8.0).await;
        insert_rating(db, 1, 3, 6.0).await;
        insert_rating(db, 2, 2, 10.0).await;
    }

    fn listing(filters: TrackFilters) -> TrackListQuery {
        TrackListQuery {
            user_id: 1,
            filters,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_ordered_ids_rank_filters() {
        let db = test_db().await;
        seed_listing(&db).await;
        let store = SeaOrmRatingStore::new(db);

        let ranked = store
            .fetch_ordered_track_ids(&listing(TrackFilters::default()))
            .await
            .unwrap();
        assert_eq!(ranked, vec![2, 1, 4]);

        let unranked = store
            .fetch_ordered_track_ids(&listing(TrackFilters {
                rank: RankFilter::Unranked,
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(unranked, vec![3]);

        let all = store
            .fetch_ordered_track_ids(&listing(TrackFilters {
                rank: RankFilter::All,
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(all, vec![2, 1, 4, 3]);
    }

    #[tokio::test]
    async fn test_fetch_ordered_ids_rating_filters_are_per_user() {
        let db = test_db().await;
        seed_listing(&db).await;
        let store = SeaOrmRatingStore::new(db);

        let rated = store
            .fetch_ordered_track_ids(&listing(TrackFilters {
                rank: RankFilter::All,
                rated: Some(RatedFilter::Rated),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(rated, vec![1, 3]);

        let unrated = store
            .fetch_ordered_track_ids(&listing(TrackFilters {
                rank: RankFilter::All,
                rated: Some(RatedFilter::Unrated),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(unrated, vec![2, 4]);

        let exact = store
            .fetch_ordered_track_ids(&listing(TrackFilters {
                rank: RankFilter::All,
                exact_rating: Some(6.0),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(exact, vec![3]);
    }

    #[tokio::test]
    async fn test_fetch_ordered_ids_title_matches_either_title() {
        let db = test_db().await;
        seed_listing(&db).await;
        let store = SeaOrmRatingStore::new(db);

        for needle in ["senbon", "千本"] {
            let found = store
                .fetch_ordered_track_ids(&listing(TrackFilters {
                    rank: RankFilter::All,
                    title: Some(needle.to_string()),
                    ..Default::default()
                }))
                .await
                .unwrap();
            assert_eq!(found, vec![1], "searching for {}", needle);
        }
    }

    #[tokio::test]
    async fn test_fetch_ordered_ids_credit_filters_are_locale_aware() {
        let db = test_db().await;
        seed_listing(&db).await;
        let store = SeaOrmRatingStore::new(db);

        let by_alpha = store
            .fetch_ordered_track_ids(&listing(TrackFilters {
                rank: RankFilter::All,
                producer: Some("Alpha".to_string()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(by_alpha, vec![1, 3]);

        let mut query = listing(TrackFilters {
            rank: RankFilter::All,
            producer: Some("アルファ".to_string()),
            ..Default::default()
        });
        query.locale = Locale::Ja;
        assert_eq!(store.fetch_ordered_track_ids(&query).await.unwrap(), vec![1]);

        let nobody = store
            .fetch_ordered_track_ids(&listing(TrackFilters {
                rank: RankFilter::All,
                voicebank: Some("Nobody".to_string()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert!(nobody.is_empty());

        let combined = store
            .fetch_ordered_track_ids(&listing(TrackFilters {
                rank: RankFilter::All,
                producer: Some("Beta".to_string()),
                voicebank: Some("Miku".to_string()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(combined, vec![3]);
    }

    #[tokio::test]
    async fn test_fetch_ordered_ids_sorted_by_locale_producer() {
        let db = test_db().await;
        seed_listing(&db).await;
        let store = SeaOrmRatingStore::new(db);

        let mut query = listing(TrackFilters {
            rank: RankFilter::Ranked,
            ..Default::default()
        });
        query.sort = vec![SortInput {
            field: TrackSortField::Producer,
            order: SortOrder::Asc,
        }];
        assert_eq!(store.fetch_ordered_track_ids(&query).await.unwrap(), vec![1, 2, 4]);

        query.locale = Locale::Ja;
        assert_eq!(store.fetch_ordered_track_ids(&query).await.unwrap(), vec![2, 4, 1]);
    }

    #[tokio::test]
    async fn test_fetch_ratings_scoped_and_joined() {
        let db = test_db().await;
        seed_listing(&db).await;
        let store = SeaOrmRatingStore::new(db);

        let all = store.fetch_ratings(None).await.unwrap();
        assert_eq!(all.len(), 3);

        let mine = store.fetch_ratings(Some(1)).await.unwrap();
        let tracks: Vec<i64> = mine.iter().map(|r| r.track.track_id).collect();
        assert_eq!(tracks, vec![1, 3]);
        assert_eq!(mine[0].track.producer_jp.as_deref(), Some("アルファ"));
        assert_eq!(mine[1].track.producer_en, "Alpha, Beta");
    }

    #[tokio::test]
    async fn test_fetch_unrated_tracks_excludes_ids() {
        let db = test_db().await;
        insert_track(
            &db,
            TrackSeed {
                title: "one",
                producer: "P",
                voicebank: "V",
                rank: None,
                published_day: 1,
            },
        )
        .await;
        insert_track(
            &db,
            TrackSeed {
                title: "two",
                producer: "P",
                voicebank: "V",
                rank: Some(1),
                published_day: 2,
            },
        )
        .await;
        let store = SeaOrmRatingStore::new(db);

        let excluding: HashSet<i64> = [1].into_iter().collect();
        let tracks = store.fetch_unrated_tracks(&excluding).await.unwrap();
        let ids: Vec<i64> = tracks.iter().map(|t| t.track_id).collect();
        assert_eq!(ids, vec![2]);
    }
}
