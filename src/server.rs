use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Liveness
        .route("/health", get(crate::routes::health::health))
        // Dashboard data
        .route("/report", get(crate::routes::report::get_report))
        // Recipients
        .route(
            "/recipients",
            get(crate::routes::recipients::list_recipients)
                .post(crate::routes::recipients::add_recipient)
                .delete(crate::routes::recipients::remove_recipient),
        )
        .route(
            "/recipients/test",
            post(crate::routes::delivery::send_test_email),
        )
        // Weekly delivery gate
        .route("/weekly/check", post(crate::routes::delivery::check_weekly))
        // Platform-reported events
        .route(
            "/events/not-found",
            get(crate::routes::events::list_not_found).post(crate::routes::events::record_not_found),
        )
        .route(
            "/security/failed-logins",
            post(crate::routes::events::record_failed_login)
                .delete(crate::routes::events::reset_failed_logins),
        )
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
