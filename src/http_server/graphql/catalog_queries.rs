use async_graphql::{Context, Object, SimpleObject};
use chrono::{DateTime, Utc};

use crate::http_server::graphql::context::{get_app_state, resolve_locale};
use crate::http_server::graphql_error::GraphqlResult;
use crate::services::catalog::{CatalogService, CreditRole};

#[derive(Debug, Clone, SimpleObject)]
pub struct CatalogStatusResponse {
    pub last_update: Option<DateTime<Utc>>,
    pub age_days: Option<i64>,
    pub is_outdated: bool,
}

#[derive(Default)]
pub struct CatalogQuery;

#[Object]
impl CatalogQuery {
    /// Every distinct name credited under `role`, ascending.
    async fn credits(
        &self,
        ctx: &Context<'_>,
        role: CreditRole,
        locale: Option<String>,
    ) -> GraphqlResult<Vec<String>> {
        let app_state = get_app_state(ctx)?;
        let locale = resolve_locale(app_state, locale);
        let service = CatalogService::new(app_state.db.clone());
        Ok(service.credits(role, locale).await?)
    }

    async fn catalog_status(&self, ctx: &Context<'_>) -> GraphqlResult<CatalogStatusResponse> {
        let app_state = get_app_state(ctx)?;
        let status = CatalogService::new(app_state.db.clone()).status().await?;

        Ok(CatalogStatusResponse {
            last_update: status.last_update,
            age_days: status.age_days,
            is_outdated: status.is_outdated,
        })
    }
}
