//! Handler-boundary error type.
//!
//! Every failure a route can produce ends up here and is rendered as a small
//! HTML page. Internal errors are logged with full detail and answered with an
//! opaque body.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: &'static str,
        retry: &'static str,
    },

    #[error("malformed request body")]
    MalformedBody,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthorized")]
    Unauthorized,

    #[error("user not found")]
    NotFound,

    #[error("mobile number already registered")]
    MobileNumberTaken,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::MalformedBody => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MobileNumberTaken => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> String {
        match self {
            AppError::Validation { message, retry } => {
                format!(r#"{message} Please <a href="{retry}">try again</a>."#)
            }
            AppError::MalformedBody => "Malformed request body.".into(),
            AppError::InvalidCredentials => {
                r#"Invalid Credentials. Please <a href="/login">LogIn</a>"#.into()
            }
            AppError::Unauthorized => r#"Unauthorized. Please <a href="/login">LogIn</a>"#.into(),
            AppError::NotFound => "User not found.".into(),
            AppError::MobileNumberTaken => {
                r#"This mobile number is already registered. Please <a href="/login">LogIn</a> or <a href="/register">SignUp</a> with another number."#.into()
            }
            AppError::Internal(_) => "Internal Server Error".into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(e) = &self {
            error!(error = ?e, "request failed");
        }
        (self.status_code(), Html(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, String) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        let v = AppError::Validation {
            message: "x",
            retry: "/register",
        };
        assert_eq!(v.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MalformedBody.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::MobileNumberTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn validation_links_back_to_form() {
        let (status, body) = body_of(AppError::Validation {
            message: "Fill All The Details.",
            retry: "/register",
        })
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Fill All The Details."));
        assert!(body.contains(r#"href="/register""#));
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let (status, body) =
            body_of(AppError::Internal(anyhow::anyhow!("connection refused to 10.0.0.5"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal Server Error");
    }
}
