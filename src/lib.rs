pub mod analytics;
pub mod auth;
pub mod calendar;
pub mod client;
pub mod error;
pub mod handlers;
pub mod ical;
pub mod models;
pub mod openapi;
pub mod settings;
pub mod slots;
pub mod store;
pub mod validation;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::LatencyUnit;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::client::BooklyClient;
use crate::handlers::{
    create_booking, create_service, delete_service, export_ical, get_availability,
    get_booking_page, get_calendar, get_closed_dates, get_dashboard, get_history, get_hours,
    healthz_live, healthz_ready, list_services, login, register, root, save_closed_dates,
    save_day_hours, save_hours, update_profile, update_service,
};
use crate::ical::AgendaExporter;
use crate::openapi::ApiDoc;
use crate::settings::Settings;
use crate::store::AppStore;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub client: Arc<BooklyClient>,
    pub store: Arc<AppStore>,
    pub exporter: Arc<AgendaExporter>,
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    let state = AppState {
        settings: settings.clone(),
        client: Arc::new(BooklyClient::new(settings.api_base_url.clone())),
        store: Arc::new(AppStore::new()),
        exporter: Arc::new(AgendaExporter::new()),
    };

    // A failed directory load is not fatal: the gateway starts empty and the
    // refresh task retries the load while the directory stays empty.
    match state.store.load_businesses(&state.client).await {
        Ok(count) => info!("loaded {count} businesses"),
        Err(err) => warn!("initial business load failed: {err}"),
    }

    let _refresh = store::spawn_refresh(
        state.store.clone(),
        state.client.clone(),
        Duration::from_secs(state.settings.refresh_interval_secs),
    );

    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!("Starting Bookly Gateway on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route("/book/{slug}", get(get_booking_page).post(create_booking))
        .route("/book/{slug}/availability", get(get_availability))
        .route("/manage/register", post(register))
        .route("/manage/login", post(login))
        .route("/manage/{business_id}/dashboard", get(get_dashboard))
        .route("/manage/{business_id}/calendar", get(get_calendar))
        .route("/manage/{business_id}/history", get(get_history))
        .route("/manage/{business_id}/profile", put(update_profile))
        .route(
            "/manage/{business_id}/services",
            get(list_services).post(create_service),
        )
        .route(
            "/manage/{business_id}/services/{service_id}",
            put(update_service).delete(delete_service),
        )
        .route(
            "/manage/{business_id}/hours",
            get(get_hours).put(save_hours),
        )
        .route("/manage/{business_id}/hours/{day}", put(save_day_hours))
        .route(
            "/manage/{business_id}/closed-dates",
            get(get_closed_dates).put(save_closed_dates),
        )
        .route("/manage/{business_id}/appointments.ics", get(export_ical))
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router.layer(trace_layer).layer(CorsLayer::permissive())
}
