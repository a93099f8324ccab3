use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;

/// `Json<T>` whose rejection is rendered as a `BAD_REQUEST` envelope.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                debug!(error = %rejection, "rejected request body");
                Err(json_rejection(rejection))
            }
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::BadRequest("expected application/json body".into())
        }
        _ => AppError::BadRequest("invalid json".into()),
    }
}

/// `Query<T>` whose rejection is rendered as a `BAD_REQUEST` envelope.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection, "rejected query string");
                AppError::BadRequest("invalid query string".into())
            })?;
        Ok(ApiQuery(value))
    }
}

/// Path ids that are not UUIDs cannot name any row, so they read as
/// not-found like any other unknown id.
pub fn parse_id(raw: &str, not_found: &'static str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(not_found))
}

/// Parses an optional integer query parameter.
pub fn parse_limit(raw: Option<&str>) -> Result<i64, AppError> {
    match raw.filter(|s| !s.is_empty()) {
        None => Ok(0),
        Some(v) => v
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::field("limit", "must be an integer")),
    }
}

/// Parses an optional boolean query parameter.
pub fn parse_bool(field: &str, raw: Option<&str>) -> Result<Option<bool>, AppError> {
    match raw.filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(v) => match v.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Ok(Some(true)),
            "false" | "f" | "0" => Ok(Some(false)),
            _ => Err(AppError::field(field, "must be true or false")),
        },
    }
}
