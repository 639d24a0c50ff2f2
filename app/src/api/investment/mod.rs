use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use domain::investment::{InvestmentRecord, NewInvestment};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use uuid::Uuid;

use super::AppState;
use super::error::{ApiResult, ErrorBody};
use super::jwt::CurrentUser;


pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_investments, create_investment))
        .routes(routes!(update_investment, delete_investment))
}

/// List investments
///
/// Investments of the current user, in creation order.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Investments", body = [InvestmentRecord])),
    security(("bearer" = [])),
    tag = super::INVESTMENT_TAG
)]
async fn list_investments(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<InvestmentRecord>>> {
    Ok(Json(state.manager().list_investments(&user.id).await?))
}

/// Add an investment
#[utoipa::path(
    post,
    path = "/",
    request_body = NewInvestment,
    responses(
        (status = 201, description = "Investment created", body = InvestmentRecord),
        (status = 400, description = "Invalid investment", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = super::INVESTMENT_TAG
)]
async fn create_investment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<NewInvestment>,
) -> ApiResult<(StatusCode, Json<InvestmentRecord>)> {
    let record = state.manager().add_investment(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Replace an investment
#[utoipa::path(
    put,
    path = "/{investment_id}",
    params(("investment_id" = Uuid, Path, description = "Investment UUID")),
    request_body = NewInvestment,
    responses(
        (status = 200, description = "Investment updated", body = InvestmentRecord),
        (status = 400, description = "Invalid investment", body = ErrorBody),
        (status = 403, description = "Investment belongs to another user", body = ErrorBody),
        (status = 404, description = "Investment not found", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = super::INVESTMENT_TAG
)]
async fn update_investment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(investment_id): Path<Uuid>,
    Json(payload): Json<NewInvestment>,
) -> ApiResult<Json<InvestmentRecord>> {
    let record = state
        .manager()
        .update_investment(user.id, investment_id, payload)
        .await?;
    Ok(Json(record))
}

/// Delete an investment
#[utoipa::path(
    delete,
    path = "/{investment_id}",
    params(("investment_id" = Uuid, Path, description = "Investment UUID")),
    responses(
        (status = 204, description = "Investment deleted"),
        (status = 403, description = "Investment belongs to another user", body = ErrorBody),
        (status = 404, description = "Investment not found", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = super::INVESTMENT_TAG
)]
async fn delete_investment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(investment_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .manager()
        .delete_investment(user.id, investment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
