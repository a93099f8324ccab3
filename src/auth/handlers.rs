use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{LoginRequest, RegisterRequest, TokenResponse, UserIdResponse},
    extractors::AuthUser,
};
use crate::{error::AppResult, extract::ApiJson, response::Data, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Data<UserIdResponse>>)> {
    let id = state.auth.register(&payload.email, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(Data::new(UserIdResponse { id }))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<Data<TokenResponse>>> {
    let access_token = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(Data::new(TokenResponse { access_token })))
}

#[instrument]
pub async fn me(AuthUser(user_id): AuthUser) -> Json<Data<UserIdResponse>> {
    Json(Data::new(UserIdResponse { id: user_id }))
}
