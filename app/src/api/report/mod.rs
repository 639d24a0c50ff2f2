use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use domain::report::AnalysisReport;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use uuid::Uuid;

use super::AppState;
use super::error::{ApiResult, ErrorBody};
use super::jwt::CurrentUser;

#[cfg(test)]
mod tests;

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_reports, create_report))
        .routes(routes!(get_report))
}

/// List analysis reports, newest first
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Reports", body = [AnalysisReport])),
    security(("bearer" = [])),
    tag = super::REPORT_TAG
)]
async fn list_reports(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<AnalysisReport>>> {
    Ok(Json(state.manager().list_reports(&user.id).await?))
}

/// Generate an analysis report
///
/// Runs the suggestion engine on the current portfolio and stores the result.
#[utoipa::path(
    post,
    path = "/",
    responses(
        (status = 201, description = "Report generated", body = AnalysisReport),
        (status = 422, description = "A stored investment is malformed", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = super::REPORT_TAG
)]
async fn create_report(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<(StatusCode, Json<AnalysisReport>)> {
    let report = state.manager().generate_report(user.id).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// Get one analysis report
#[utoipa::path(
    get,
    path = "/{report_id}",
    params(("report_id" = Uuid, Path, description = "Report UUID")),
    responses(
        (status = 200, description = "Report", body = AnalysisReport),
        (status = 403, description = "Report belongs to another user", body = ErrorBody),
        (status = 404, description = "Report not found", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = super::REPORT_TAG
)]
async fn get_report(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(report_id): Path<Uuid>,
) -> ApiResult<Json<AnalysisReport>> {
    Ok(Json(state.manager().get_report(&user.id, &report_id).await?))
}
