use agroconnect::{AppState, Config, get_db_pool, router, utils};
use axum::Router;
use axum::http::{HeaderValue, Method};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;
    let db_config = agroconnect::db::DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    agroconnect::db::migrations::run_migrations(&pool).await?;

    let port = config.port;
    let state = AppState::new(pool, config)?;
    if !state.translator.is_available() {
        tracing::warn!("TRANSLATE_URL not set, chat messages will be shown untranslated");
    }
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Server running on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_app(state: AppState) -> Router {
    router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer()),
    )
}

fn create_cors_layer() -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    match allowed_origins() {
        Some(origins) => {
            tracing::info!("CORS restricted to {} origin(s)", origins.len());
            cors.allow_origin(AllowOrigin::list(origins))
        }
        None => cors.allow_origin(Any),
    }
}

/// Parses the comma-separated `ALLOWED_ORIGINS`; `None` means any origin.
fn allowed_origins() -> Option<Vec<HeaderValue>> {
    let raw = std::env::var("ALLOWED_ORIGINS").ok()?;
    let origins: Vec<HeaderValue> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid origin in ALLOWED_ORIGINS: {}", origin);
                None
            }
        })
        .collect();

    (!origins.is_empty()).then_some(origins)
}
