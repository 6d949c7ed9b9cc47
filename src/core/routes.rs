// HTTP routes configuration

use crate::core::state::AppState;
use crate::handlers::{account, color, fallback, health, username};
use axum::{routing::get, Router};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Identity
        .route("/login", get(account::login_handler))
        .route("/login_as/{id}", get(account::login_as_handler))
        .route("/get_data", get(account::get_data_handler))

        // Color sliders
        .route("/color/red/{value}", get(color::color_red_handler))
        .route("/color/green/{value}", get(color::color_green_handler))
        .route("/color/blue/{value}", get(color::color_blue_handler))

        // Username composition
        .route("/unicode/start/{letter}", get(username::unicode_start_handler))
        .route("/unicode/continue/{letter}", get(username::unicode_continue_handler))
        .route("/letter/{letter}", get(username::letter_handler))
        .route("/finish_username", get(username::finish_username_handler))

        .route("/health", get(health::health_handler))

        // 404 fallback for all unmatched routes
        .fallback(fallback::fallback_handler)

        .with_state(state)
}
