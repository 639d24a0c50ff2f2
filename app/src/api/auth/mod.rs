use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use uuid::Uuid;

use super::AppState;
use super::error::{ApiError, ApiResult, ErrorBody};
use super::jwt::logout_cookie;


#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: Uuid,
    pub email: String,
}

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(signup))
        .routes(routes!(login))
        .routes(routes!(logout))
}

fn session_response(
    state: &AppState,
    status: StatusCode,
    user_id: Uuid,
    email: &str,
) -> ApiResult<Response> {
    let email = domain::user::normalize_email(email);
    let token = state
        .jwt()
        .issue(user_id, &email)
        .map_err(|e| ApiError::Internal(format!("Token creation failed: {e}")))?;
    let cookie = state.jwt().auth_cookie(&token);

    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            token,
            user_id,
            email,
        }),
    )
        .into_response())
}

/// Create an account
///
/// Registers a new user and opens a session.
#[utoipa::path(
    post,
    path = "/signup",
    request_body = Credentials,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid email or weak password", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    ),
    tag = super::AUTH_TAG
)]
async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> ApiResult<Response> {
    let user_id = state
        .manager()
        .sign_up(&payload.email, &payload.password)
        .await?;
    session_response(&state, StatusCode::CREATED, user_id, &payload.email)
}

/// Log in
///
/// Returns a bearer token and sets the `token` cookie.
#[utoipa::path(
    post,
    path = "/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = ErrorBody)
    ),
    tag = super::AUTH_TAG
)]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> ApiResult<Response> {
    let user_id = state
        .manager()
        .sign_in(&payload.email, &payload.password)
        .await?;
    session_response(&state, StatusCode::OK, user_id, &payload.email)
}

/// Log out
///
/// Clears the session cookie. Bearer tokens stay valid until they expire.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 204, description = "Logged out")),
    tag = super::AUTH_TAG
)]
async fn logout() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, logout_cookie())],
    )
}
