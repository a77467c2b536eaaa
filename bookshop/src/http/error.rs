use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use super::responses::MessageResponse;

/// Every failure a handler or the session gate can surface to a client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to read input")]
    BadInput(String),
    #[error("Failed to create the hash for password")]
    Hashing(String),
    #[error("Failed to insert user into table users")]
    Persistence(String),
    #[error("Invalid nickname or password")]
    InvalidCredentials,
    #[error("Unable to generate access token")]
    TokenSigning,
    #[error("Unauthorised")]
    Unauthorized,
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadInput(_)
            | ApiError::Hashing(_)
            | ApiError::Persistence(_)
            | ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::TokenSigning | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::BadInput(details)
            | ApiError::Hashing(details)
            | ApiError::Persistence(details) => Some(details.clone()),
            ApiError::Unauthorized => Some(String::from("A valid session is required")),
            ApiError::InvalidCredentials | ApiError::TokenSigning | ApiError::Internal => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = MessageResponse {
            summary: self.to_string(),
            details: self.details(),
        };
        (self.status(), Json(body)).into_response()
    }
}
