use axum::{
    extract::{rejection::JsonRejection, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use shared::ValidationError;
use thiserror::Error;

use crate::{config::ConfigError, store::StoreError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid ID format")]
    InvalidId,

    #[error("Todo not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedPayload(rejection.body_text())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::MalformedPayload(_) | AppError::InvalidId => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Storage(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            AppError::Validation(error) => (
                status,
                Json(json!({ "error": "Validation failed", "details": error.detail })),
            )
                .into_response(),
            AppError::MalformedPayload(details) => (
                status,
                Json(json!({ "error": "Malformed payload", "details": details })),
            )
                .into_response(),
            AppError::NotFound => (status, Json(json!({ "error": "Todo not found" }))).into_response(),
            AppError::InvalidId => Fault::new(status, "Invalid ID format").into_response(),
            AppError::Storage(StoreError::Duplicate(_)) => {
                Fault::new(status, "Duplicate entry").into_response()
            }
            AppError::Storage(_) => Fault::new(status, "Database operation failed").into_response(),
        }
    }
}

/// A failure outside the request's control, rendered as
/// `{ error, timestamp, path }`.
///
/// The path is only known to the router, so the response carries the fault as
/// an extension and [`fault_boundary`] fills the path in on the way out.
#[derive(Debug, Clone)]
pub struct Fault {
    status: StatusCode,
    message: &'static str,
}

impl Fault {
    pub fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }

    fn render(&self, path: &str) -> Response {
        let body = json!({
            "error": self.message,
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "path": path,
        });
        (self.status, Json(body)).into_response()
    }
}

impl IntoResponse for Fault {
    fn into_response(self) -> Response {
        let mut response = self.render("");
        response.extensions_mut().insert(self);
        response
    }
}

pub async fn fault_boundary(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;

    match response.extensions().get::<Fault>() {
        Some(fault) => fault.render(&path),
        None => response,
    }
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Could not open the todo store: {0}")]
    Store(#[from] StoreError),

    #[error("Could not bind or serve: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;
    use serde_json::{json, Value};

    async fn body_of(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn validation_error() -> AppError {
        shared::validate_create(&json!({})).unwrap_err().into()
    }

    #[rstest]
    #[case(validation_error(), StatusCode::BAD_REQUEST)]
    #[case(AppError::MalformedPayload("EOF".into()), StatusCode::BAD_REQUEST)]
    #[case(AppError::InvalidId, StatusCode::BAD_REQUEST)]
    #[case(AppError::NotFound, StatusCode::NOT_FOUND)]
    #[case(AppError::Storage(StoreError::Duplicate("todo:1".into())), StatusCode::CONFLICT)]
    #[case(AppError::Storage(StoreError::Backend("down".into())), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(AppError::Storage(StoreError::Corrupt("eof".into())), StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_status(#[case] error: AppError, #[case] status: StatusCode) {
        assert_eq!(error.status_code(), status);
        assert_eq!(error.into_response().status(), status);
    }

    #[rstest]
    #[tokio::test]
    async fn validation_body_names_field() {
        let body = body_of(validation_error().into_response()).await;
        assert_eq!(
            body,
            json!({ "error": "Validation failed", "details": "\"text\" is required" })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn storage_fault_has_timestamp() {
        let response = AppError::Storage(StoreError::Backend("down".into())).into_response();
        assert!(response.extensions().get::<Fault>().is_some());

        let body = body_of(response).await;
        assert_eq!(body["error"], "Database operation failed");
        assert!(body["timestamp"].is_string());
    }
}
