//! # Server Configuration
//!
//! Router assembly, shared state and OpenAPI documentation for the SCOURT sync service.

use std::sync::Arc;

use axum::{
    Router,
    middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::operator_auth_middleware;
use crate::config::AppConfig;
use crate::handlers;
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
}

/// Build an `AppState` for handler tests
pub fn create_test_app_state(config: AppConfig, db: DatabaseConnection) -> AppState {
    AppState {
        config: Arc::new(config),
        db,
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let operator_routes = Router::new()
        .route(
            "/admin/scourt/sync-jobs",
            post(handlers::sync_jobs::trigger_sync_jobs),
        )
        .route("/scourt/sync-jobs", get(handlers::sync_jobs::list_sync_jobs))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            operator_auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route(
            "/cron/scourt-sync-scheduler",
            get(handlers::cron::run_scheduler),
        )
        .merge(operator_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_context_middleware))
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let profile = config.profile.clone();

    let state = AppState {
        config: Arc::new(config),
        db,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::sync_jobs::trigger_sync_jobs,
        crate::handlers::sync_jobs::list_sync_jobs,
        crate::handlers::cron::run_scheduler,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthResponse,
            crate::handlers::sync_jobs::TriggerSyncJobsRequest,
            crate::handlers::sync_jobs::TriggerSyncJobsResponse,
            crate::handlers::sync_jobs::SyncJobInfo,
            crate::handlers::sync_jobs::SyncJobsResponse,
            crate::handlers::cron::SchedulerRunResponse,
            crate::sync_queue::SyncType,
            crate::error::ApiError,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "sync-jobs", description = "SCOURT sync queue"),
        (name = "cron", description = "Scheduled triggers"),
    ),
    info(
        title = "SCOURT Sync API",
        description = "Deduplicated court-portal sync queue",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
