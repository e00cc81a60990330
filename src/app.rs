use crate::handlers;
use crate::state::AppState;
use axum::{
    http::header,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::ETAG, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/api/results",
            get(handlers::list_results).post(handlers::create_result),
        )
        .route(
            "/api/results/:id",
            put(handlers::update_result).delete(handlers::delete_result),
        )
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/period", get(handlers::get_period))
        .route("/api/commissions", get(handlers::list_commissions))
        .route(
            "/api/commissions/:club",
            put(handlers::upsert_commission).delete(handlers::delete_commission),
        )
        .route("/api/backup", get(handlers::backup))
        .route("/api/restore", post(handlers::restore))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
