use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::store::{Report, ReportCreate, ReportUpdate};

pub async fn list_reports(State(state): State<AppState>) -> AppResult<Json<Vec<Report>>> {
    let reports = state.reports.list().await?;
    Ok(Json(reports))
}

pub async fn create_report(
    State(state): State<AppState>,
    Json(body): Json<ReportCreate>,
) -> AppResult<Json<Report>> {
    if body.title.is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }
    let report = state.reports.create(body).await?;
    Ok(Json(report))
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Report>> {
    let report = state
        .reports
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))?;
    Ok(Json(report))
}

pub async fn update_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ReportUpdate>,
) -> AppResult<Json<Report>> {
    let report = state
        .reports
        .update(&id, body)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))?;
    Ok(Json(report))
}

pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let deleted = state.reports.delete(&id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Report {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
