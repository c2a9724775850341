use std::sync::Arc;

use async_graphql::Context;

use crate::engine::recommender::checked_limit;
use crate::engine::{Locale, PageSize};
use crate::http_server::{graphql_error::GraphqlError, state::AppState};

pub fn get_app_state<'a>(ctx: &Context<'a>) -> Result<&'a Arc<AppState>, GraphqlError> {
    ctx.data::<Arc<AppState>>()
        .map_err(|_| GraphqlError::FailedToGetAppState)
}

/// The user a request acts for, falling back to the configured one.
pub(crate) fn resolve_user(app_state: &AppState, user_id: Option<i64>) -> i64 {
    user_id.unwrap_or(app_state.config.user_id)
}

pub(crate) fn resolve_locale(app_state: &AppState, locale: Option<String>) -> Locale {
    locale
        .map(Locale::from)
        .unwrap_or(app_state.config.locale)
}

pub(crate) fn resolve_page_size(app_state: &AppState, page_size: Option<i32>) -> PageSize {
    page_size
        .map(|size| PageSize::from_limit(size.into()))
        .unwrap_or(app_state.config.page_size)
}

pub(crate) fn resolve_limit(
    app_state: &AppState,
    limit: Option<i32>,
) -> Result<usize, GraphqlError> {
    match limit {
        None => Ok(app_state.config.recommendation_limit),
        Some(limit) => checked_limit(limit.into()).ok_or_else(|| {
            GraphqlError::InvalidArgument(format!("limit must be positive, got {}", limit))
        }),
    }
}
