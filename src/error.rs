use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("User not found")]
    UserNotFound,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Not enough stock")]
    InsufficientStock,

    #[error("Cart expired")]
    CartExpired,

    #[error("Item not found in cart")]
    ItemNotInCart,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::ProductNotFound => StatusCode::NOT_FOUND,
            AppError::InsufficientStock => StatusCode::BAD_REQUEST,
            AppError::CartExpired => StatusCode::GONE,
            AppError::ItemNotInCart => StatusCode::NOT_FOUND,
            AppError::EmptyCart => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::OrmError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_distinct_statuses() {
        assert_eq!(AppError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::ProductNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InsufficientStock.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::CartExpired.status(), StatusCode::GONE);
        assert_eq!(AppError::ItemNotInCart.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::EmptyCart.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn expired_cart_is_gone_not_missing() {
        // A lapsed cart existed once; 410 tells clients not to retry.
        assert_ne!(AppError::CartExpired.status(), StatusCode::NOT_FOUND);
    }
}
