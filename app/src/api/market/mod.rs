use std::collections::BTreeMap;

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use domain::market::MarketTick;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::AppState;
use super::error::{ApiResult, ErrorBody};


/// Latest tick of every symbol, keyed by symbol.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct LatestMarketData(pub BTreeMap<String, MarketTick>);

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RecordTickRequest {
    pub symbol: String,
    pub price: f64,
    /// Defaults to the time of the request.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Routes readable without a session.
pub fn public_router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(latest))
}

/// Routes that require a session.
pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(record_tick))
}

/// Get the latest market data
#[utoipa::path(
    get,
    path = "/latest",
    responses((status = 200, description = "Latest tick per symbol", body = LatestMarketData)),
    tag = super::MARKET_TAG
)]
async fn latest(State(state): State<AppState>) -> ApiResult<Json<LatestMarketData>> {
    let ticks = state.manager().latest_market_data().await?;
    Ok(Json(LatestMarketData(
        ticks
            .into_iter()
            .map(|tick| (tick.symbol.clone(), tick))
            .collect(),
    )))
}

/// Record a market tick
#[utoipa::path(
    post,
    path = "/",
    request_body = RecordTickRequest,
    responses(
        (status = 201, description = "Tick recorded", body = MarketTick),
        (status = 400, description = "Invalid symbol or price", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = super::MARKET_TAG
)]
async fn record_tick(
    State(state): State<AppState>,
    Json(payload): Json<RecordTickRequest>,
) -> ApiResult<(StatusCode, Json<MarketTick>)> {
    let tick = state
        .manager()
        .record_market_tick(&payload.symbol, payload.price, payload.timestamp)
        .await?;
    Ok((StatusCode::CREATED, Json(tick)))
}
