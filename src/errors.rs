use crate::assets::AssetStoreError;
use crate::models::db_operations::DbError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Every failure a request can end with. Each variant carries a coarse
/// classification (see [`ServiceError::kind`]) that is sent to the client.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Missing or malformed input; the message names the field.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// The caller is known but may not do this. The text never says why.
    #[error("You are not authorized to perform this action.")]
    Unauthorized,
    #[error("{0}")]
    Unauthenticated(String),
    #[error("Image storage failed: {0}")]
    AssetStore(#[from] AssetStoreError),
    /// Duplicate unique value, or a transition from the wrong state.
    #[error("{0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Blocking task failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
    #[error("Session could not be stored: {0}")]
    Session(#[from] actix_session::SessionInsertError),
}

impl From<rusqlite::Error> for ServiceError {
    fn from(e: rusqlite::Error) -> Self {
        ServiceError::Database(DbError::Rusqlite(e))
    }
}

impl From<r2d2::Error> for ServiceError {
    fn from(e: r2d2::Error) -> Self {
        ServiceError::Database(DbError::Pool(e))
    }
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Unauthorized | ServiceError::Unauthenticated(_) => "unauthorized",
            ServiceError::AssetStore(_) => "provider_failure",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Database(_) | ServiceError::Blocking(_) | ServiceError::Session(_) => {
                "internal"
            }
        }
    }

    /// Message safe to show the client. Internal failures are not described.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Database(_) | ServiceError::Blocking(_) | ServiceError::Session(_) => {
                "An internal error occurred. Please try again later.".to_string()
            }
            ServiceError::AssetStore(_) => {
                "The image could not be stored. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Unauthorized => StatusCode::FORBIDDEN,
            ServiceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ServiceError::AssetStore(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Database(_) | ServiceError::Blocking(_) | ServiceError::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::Database(_) | ServiceError::Blocking(_) | ServiceError::Session(_) => {
                log::error!("Request failed with an internal error: {}", self)
            }
            ServiceError::AssetStore(_) => log::error!("Asset store failure: {}", self),
            _ => log::debug!("Request rejected ({}): {}", self.kind(), self),
        }
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.public_message(),
            "kind": self.kind(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_kind_mapping() {
        let cases = [
            (
                ServiceError::Validation("'title' is required.".into()),
                StatusCode::BAD_REQUEST,
                "validation",
            ),
            (ServiceError::NotFound("gone".into()), StatusCode::NOT_FOUND, "not_found"),
            (ServiceError::Unauthorized, StatusCode::FORBIDDEN, "unauthorized"),
            (
                ServiceError::AssetStore(AssetStoreError::Provider("down".into())),
                StatusCode::BAD_GATEWAY,
                "provider_failure",
            ),
            (ServiceError::Conflict("dup".into()), StatusCode::CONFLICT, "conflict"),
        ];
        for (err, status, kind) in cases {
            assert_eq!(err.status_code(), status);
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = ServiceError::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.kind(), "internal");
        assert!(!err.public_message().contains("Query"));
        assert_eq!(
            ServiceError::Unauthorized.public_message(),
            "You are not authorized to perform this action."
        );
    }
}
