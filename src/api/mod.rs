mod config;
mod handlers;

pub use config::ApiConfig;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    create_router_with_config(state, ApiConfig::from_env())
}

pub fn create_router_with_config(state: AppState, config: ApiConfig) -> Router {
    let api = Router::new()
        // Generation and drafts
        .route("/courses/generate", post(handlers::generate_course))
        .route("/drafts/{id}", get(handlers::get_draft))
        .route("/drafts/{id}", delete(handlers::discard_draft))
        .route("/drafts/{id}/commit", post(handlers::commit_draft))
        // Modules
        .route("/modules", get(handlers::list_modules))
        .route("/modules/{id}", get(handlers::get_module))
        .route("/modules/{id}", delete(handlers::delete_module))
        .route("/modules/{id}/tree", get(handlers::get_module_tree))
        .route("/modules/{id}/units", get(handlers::list_module_units))
        .route("/modules/{id}/activities", get(handlers::list_module_activities))
        .route("/modules/{id}/assessments", get(handlers::list_module_assessments))
        // Units
        .route("/units", get(handlers::list_units))
        .route("/units/{id}", get(handlers::get_unit).put(handlers::update_unit))
        // Outlines
        .route("/outlines/{id}", get(handlers::get_outline))
        // Regeneration
        .route("/regenerate/highlight", post(handlers::regenerate_highlight))
        .route("/regenerate/reason", post(handlers::regenerate_reason))
        .route("/regenerate/confirm", post(handlers::confirm_regeneration))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(config.cors_layer())
        .with_state(state)
}
