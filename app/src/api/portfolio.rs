use axum::{Extension, Json, extract::State};
use domain::analysis::PortfolioSummary;
use domain::portfolio::Portfolio;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::AppState;
use super::error::{ApiResult, ErrorBody};
use super::jwt::CurrentUser;

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_portfolio))
        .routes(routes!(get_summary))
}

/// Get the current user's portfolio, creating it on first access
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Portfolio", body = Portfolio)),
    security(("bearer" = [])),
    tag = super::PORTFOLIO_TAG
)]
async fn get_portfolio(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Portfolio>> {
    Ok(Json(state.manager().get_or_create_portfolio(&user.id).await?))
}

/// Summarize the current user's investments
///
/// Total value, overall risk level and allocations by type and by sector.
#[utoipa::path(
    get,
    path = "/summary",
    responses(
        (status = 200, description = "Portfolio summary", body = PortfolioSummary),
        (status = 422, description = "A stored investment is malformed", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = super::PORTFOLIO_TAG
)]
async fn get_summary(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<PortfolioSummary>> {
    Ok(Json(state.manager().portfolio_summary(&user.id).await?))
}
