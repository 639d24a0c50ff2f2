use axum::{Extension, Json, extract::State};
use domain::core::ServiceError;
use domain::profile::{ProfileInput, UserProfile};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::AppState;
use super::error::{ApiResult, ErrorBody};
use super::jwt::CurrentUser;


pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(get_profile, put_profile))
}

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Profile found", body = UserProfile),
        (status = 404, description = "No profile saved yet", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = super::PROFILE_TAG
)]
async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<UserProfile>> {
    let profile = state
        .manager()
        .get_profile(&user.id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Profile".to_string()))?;
    Ok(Json(profile))
}

/// Create or replace the current user's profile
#[utoipa::path(
    put,
    path = "/",
    request_body = ProfileInput,
    responses(
        (status = 200, description = "Profile saved", body = UserProfile),
        (status = 400, description = "Invalid profile", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = super::PROFILE_TAG
)]
async fn put_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ProfileInput>,
) -> ApiResult<Json<UserProfile>> {
    let profile = state.manager().save_profile(user.id, payload).await?;
    Ok(Json(profile))
}
