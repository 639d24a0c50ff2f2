use axum::{Router, middleware};
use tower_http::trace::TraceLayer;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_swagger_ui::SwaggerUi;

use crate::services::AppHandle;

mod auth;
pub mod error;
mod investment;
pub mod jwt;
mod market;
mod portfolio;
mod profile;
mod report;

#[cfg(test)]
mod tests;

const AUTH_TAG: &str = "auth";
const PROFILE_TAG: &str = "profile";
const INVESTMENT_TAG: &str = "investment";
const PORTFOLIO_TAG: &str = "portfolio";
const REPORT_TAG: &str = "report";
const MARKET_TAG: &str = "market";

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
    ),
    components(
        schemas(
            auth::Credentials,
            auth::AuthResponse,
            market::RecordTickRequest,
            error::ErrorBody
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = AUTH_TAG, description = "Sign up, log in and log out"),
        (name = PROFILE_TAG, description = "Personal details of the current user"),
        (name = INVESTMENT_TAG, description = "Investments of the current user"),
        (name = PORTFOLIO_TAG, description = "Portfolio totals and allocation summary"),
        (name = REPORT_TAG, description = "Suggestion reports"),
        (name = MARKET_TAG, description = "Market price feed")
    )
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Get health of the API.
#[utoipa::path(
    method(get, head),
    path = "/api/health",
    responses(
        (status = OK, description = "Success", body = str, content_type = "text/plain")
    )
)]
async fn health() -> &'static str {
    "ok"
}

pub type AppState = AppHandle;

pub fn create_api(state: AppState) -> Router {
    let (public, mut api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(health))
        .nest("/api/auth", auth::router())
        .nest("/api/market-data", market::public_router())
        .split_for_parts();

    let (protected, protected_api) = OpenApiRouter::new()
        .nest("/api/profile", profile::router())
        .nest("/api/investments", investment::router())
        .nest("/api/portfolio", portfolio::router())
        .nest("/api/reports", report::router())
        .nest("/api/market-data", market::router())
        .split_for_parts();
    api.merge(protected_api);

    let protected = protected.route_layer(middleware::from_fn_with_state(
        state.clone(),
        jwt::auth_middleware,
    ));

    public
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/apidoc/openapi.json", api))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
