// error.rs - Error responses for the admin-facing endpoints

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use database::ShopError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("Shop not found")]
    NotFound,
    #[error("Shop already exists")]
    Conflict,
    #[error("{0}")]
    Internal(&'static str),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.to_string(),
        }))
    }
}

// Database details are logged by the caller, never returned
impl From<ShopError> for ApiError {
    fn from(error: ShopError) -> Self {
        match error {
            ShopError::NotFound(_) => ApiError::NotFound,
            ShopError::Conflict(_) => ApiError::Conflict,
            ShopError::Db(_) => ApiError::Internal("Internal Server Error"),
        }
    }
}
