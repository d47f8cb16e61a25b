use crate::store::StoreError;
use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum RecipeError {
    #[error("{0}")]
    MalformedPayload(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Invalid recipe ID")]
    NotFound,

    #[error("Internal server error")]
    InternalServerError,
}

impl From<StoreError> for RecipeError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => RecipeError::NotFound,
            StoreError::InvalidArgument(msg) => RecipeError::InvalidArgument(msg),
            StoreError::Backend(msg) => {
                tracing::error!("recipe store failure: {msg}");
                RecipeError::InternalServerError
            }
        }
    }
}

impl IntoResponse for RecipeError {
    fn into_response(self) -> axum::response::Response {
        let status_code = match self {
            RecipeError::MalformedPayload(_) | RecipeError::InvalidArgument(_) => {
                StatusCode::BAD_REQUEST
            }
            RecipeError::NotFound => StatusCode::NOT_FOUND,
            RecipeError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        (status_code, body).into_response()
    }
}
