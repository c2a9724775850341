use std::sync::Arc;

use async_graphql_axum::GraphQL;
use axum::{Router, routing::get};
use color_eyre::eyre::{Context, eyre};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::{
    config::Config,
    database::Database,
    http_server::{graphql, state::AppState},
};

pub struct HttpServerConfig {
    pub port: u16,
    pub database: Database,
    pub config: Config,
}

async fn root() -> &'static str {
    "track-rater"
}

pub fn router(app_state: Arc<AppState>) -> Router {
    let schema = graphql::create_schema(app_state.clone());

    #[cfg(debug_assertions)]
    let cors_layer = CorsLayer::permissive();

    #[cfg(not(debug_assertions))]
    let cors_layer = CorsLayer::new()
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(root))
        .route(
            "/graphql",
            get(graphql::graphql).post_service(GraphQL::new(schema)),
        )
        .layer(ServiceBuilder::new().layer(cors_layer))
        .with_state(app_state)
}

pub async fn start(server_config: HttpServerConfig) -> color_eyre::Result<()> {
    let HttpServerConfig {
        port,
        database,
        config,
    } = server_config;

    let app_state = Arc::new(AppState {
        db: Arc::new(database),
        config,
    });
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .wrap_err_with(|| eyre!("Failed to bind to port {}", port))?;
    log::info!("Listening on http://0.0.0.0:{}/graphql", port);
    axum::serve(listener, app)
        .await
        .wrap_err("Failed to start HTTP server")?;

    Ok(())
}
