use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::utils::{error_codes, error_to_api_response};

// Postgres SQLSTATE
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("invalid credentials")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return AppError::Conflict(db_err.message().to_string());
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    return AppError::NotFound(db_err.message().to_string());
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 为 false 时属于预期的客户端错误，不按 error 级别记录
    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }

    pub fn code(&self) -> i32 {
        match self {
            AppError::Validation(_) => error_codes::VALIDATION_ERROR,
            AppError::Conflict(_) => error_codes::ALREADY_EXISTS,
            AppError::Unauthorized => error_codes::AUTH_FAILED,
            AppError::NotFound(_) => error_codes::NOT_FOUND,
            AppError::Database(_) | AppError::PasswordHash(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = if self.is_server_error() {
            tracing::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, error_to_api_response::<()>(self.code(), msg)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    use axum::body::to_bytes;
    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct PgFailure {
        code: &'static str,
    }

    impl fmt::Display for PgFailure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "postgres failure {}", self.code)
        }
    }

    impl StdError for PgFailure {}

    impl DatabaseError for PgFailure {
        fn message(&self) -> &str {
            "constraint violated"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.code {
                UNIQUE_VIOLATION => ErrorKind::UniqueViolation,
                FOREIGN_KEY_VIOLATION => ErrorKind::ForeignKeyViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn pg_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgFailure { code }))
    }

    #[test]
    fn test_sqlstate_mapping() {
        assert!(matches!(AppError::from(pg_error("23505")), AppError::Conflict(_)));
        assert!(matches!(AppError::from(pg_error("23503")), AppError::NotFound(_)));
        assert!(matches!(AppError::from(pg_error("23502")), AppError::Database(_)));
    }

    #[test]
    fn test_constraint_violations_are_client_errors() {
        assert!(!AppError::from(pg_error("23505")).is_server_error());
        assert!(!AppError::from(pg_error("23503")).is_server_error());
        assert!(AppError::from(pg_error("23502")).is_server_error());
        assert!(AppError::Database(sqlx::Error::PoolTimedOut).is_server_error());
    }

    #[tokio::test]
    async fn test_server_error_hides_details() {
        let response = AppError::from(pg_error("40001")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], error_codes::INTERNAL_ERROR);
        assert_eq!(body["msg"], "Internal server error");
    }

    #[tokio::test]
    async fn test_client_error_keeps_message() {
        let response = AppError::from(pg_error("23503")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], error_codes::NOT_FOUND);
        assert_eq!(body["msg"], "constraint violated");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Conflict("dup".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(AppError::NotFound("x".into()).code(), error_codes::NOT_FOUND);
        assert_eq!(AppError::Unauthorized.code(), error_codes::AUTH_FAILED);
        assert_eq!(
            AppError::Database(sqlx::Error::PoolTimedOut).code(),
            error_codes::INTERNAL_ERROR
        );
    }
}
