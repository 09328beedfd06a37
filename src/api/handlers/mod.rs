use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::CourseError;
use crate::models::*;
use crate::state::AppState;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side; clients only see a generic message.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Map a core error to a status code. Persistence details stay server-side.
fn course_error(e: CourseError) -> (StatusCode, String) {
    match e {
        CourseError::InvalidRequest(_) | CourseError::Range { .. } | CourseError::StaleSelection => {
            tracing::warn!("Rejected request: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        CourseError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        CourseError::Upstream(_) | CourseError::UnitGeneration(_) => {
            tracing::error!("Generation failed: {}", e);
            (StatusCode::BAD_GATEWAY, e.to_string())
        }
        CourseError::Persistence(inner) => internal_error(format!("{:#}", inner)),
    }
}

fn not_found(what: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{} not found", what))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Generation and drafts
// ============================================================

pub async fn generate_course(
    State(state): State<AppState>,
    Json(request): Json<CourseRequest>,
) -> Result<(StatusCode, Json<DraftEntry>), (StatusCode, String)> {
    state
        .generator
        .generate_course(&request)
        .await
        .map(|entry| (StatusCode::CREATED, Json(entry)))
        .map_err(course_error)
}

pub async fn get_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftEntry>, (StatusCode, String)> {
    state.drafts.get(id).map(Json).ok_or_else(|| not_found("Draft"))
}

pub async fn commit_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<CommittedCourse>), (StatusCode, String)> {
    state
        .commit_draft(id)
        .map(|committed| (StatusCode::CREATED, Json(committed)))
        .map_err(course_error)
}

pub async fn discard_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .discard_draft(id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(course_error)
}

// ============================================================
// Modules
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ModuleQuery {
    pub q: Option<String>,
}

pub async fn list_modules(
    State(state): State<AppState>,
    Query(query): Query<ModuleQuery>,
) -> Result<Json<Vec<CourseModule>>, (StatusCode, String)> {
    let modules = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => state.db.search_modules(q),
        _ => state.db.get_all_modules(),
    };
    modules.map(Json).map_err(internal_error)
}

pub async fn get_module(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseModule>, (StatusCode, String)> {
    state
        .db
        .get_module(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Module"))
}

pub async fn get_module_tree(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModuleTree>, (StatusCode, String)> {
    state
        .db
        .get_module_tree(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Module"))
}

pub async fn delete_module(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_module(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Module"))
    }
}

pub async fn list_module_units(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Unit>>, (StatusCode, String)> {
    state
        .db
        .get_units_by_module(id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn list_module_activities(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Activity>>, (StatusCode, String)> {
    state
        .db
        .get_activities_by_module(id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn list_module_assessments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Assessment>>, (StatusCode, String)> {
    state
        .db
        .get_assessments_by_module(id)
        .map(Json)
        .map_err(internal_error)
}

// ============================================================
// Units
// ============================================================

pub async fn list_units(
    State(state): State<AppState>,
) -> Result<Json<Vec<Unit>>, (StatusCode, String)> {
    state.db.get_all_units().map(Json).map_err(internal_error)
}

pub async fn get_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Unit>, (StatusCode, String)> {
    state
        .db
        .get_unit(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Unit"))
}

pub async fn update_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUnitInput>,
) -> Result<Json<Unit>, (StatusCode, String)> {
    state
        .db
        .update_unit(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Unit"))
}

// ============================================================
// Outlines
// ============================================================

pub async fn get_outline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Outline>, (StatusCode, String)> {
    state
        .db
        .get_outline(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("Outline"))
}

// ============================================================
// Regeneration
// ============================================================

pub async fn regenerate_highlight(
    State(state): State<AppState>,
    Json(input): Json<HighlightRegenerationInput>,
) -> Result<Json<RegenerationProposal>, (StatusCode, String)> {
    let selector = RegenerationSelector::Highlight {
        text: input.highlighted_text,
        start: input.start_index,
        end: input.end_index,
    };
    state
        .regeneration
        .propose(input.module_id, input.unit_id, selector)
        .await
        .map(Json)
        .map_err(course_error)
}

pub async fn regenerate_reason(
    State(state): State<AppState>,
    Json(input): Json<ReasonRegenerationInput>,
) -> Result<Json<RegenerationProposal>, (StatusCode, String)> {
    let selector = RegenerationSelector::Reason {
        reason: input.reason,
    };
    state
        .regeneration
        .propose(input.module_id, input.unit_id, selector)
        .await
        .map(Json)
        .map_err(course_error)
}

pub async fn confirm_regeneration(
    State(state): State<AppState>,
    Json(input): Json<ConfirmRegenerationInput>,
) -> Result<Json<Unit>, (StatusCode, String)> {
    state
        .regeneration
        .confirm(
            input.unit_id,
            &input.proposed_text,
            input.start_index,
            input.end_index,
            input.expected_text.as_deref(),
        )
        .map(Json)
        .map_err(course_error)
}
