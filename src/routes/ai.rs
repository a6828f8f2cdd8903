use axum::{Json, extract::State};
use serde::Serialize;

use crate::AppState;
use crate::error::AppResult;
use crate::report::{GenerationRequest, SearchOutcome};

#[derive(Debug, Serialize)]
pub struct OpenReportResponse {
    pub content: String,
}

/// Generate or polish an open report. The orchestrator picks the path
/// (simple / deep research / prefetched) from the request itself.
pub async fn generate_open_report(
    State(state): State<AppState>,
    Json(body): Json<GenerationRequest>,
) -> AppResult<Json<OpenReportResponse>> {
    let content = state.orchestrator.generate(&body).await?;
    Ok(Json(OpenReportResponse { content }))
}

/// Run only the search step so the caller can review and confirm results
/// before generation.
pub async fn search_for_report(
    State(state): State<AppState>,
    Json(body): Json<GenerationRequest>,
) -> AppResult<Json<SearchOutcome>> {
    let outcome = state.orchestrator.search_only(&body).await?;
    Ok(Json(outcome))
}
