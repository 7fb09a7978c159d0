use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use breadfund_types::api::ErrorResponse;

pub const CAMPAIGN_NOT_FOUND: &str = "Campaign Not Found.";
pub const FEED_NOT_FOUND: &str = "Feed Post Not Found.";
pub const USER_NOT_FOUND: &str = "User Not Found.";
pub const USER_ALREADY_REACTED: &str = "User Already Reacted.";
pub const USER_EMAIL_EXISTS: &str = "User Email Already Exists.";
pub const USER_NOT_CAMPAIGN_CREATOR: &str = "User Not Campaign Creator.";
pub const USER_NOT_FEED_POST_CREATOR: &str = "User Not Feed Post Creator.";

/// Request-terminal failures. Each variant maps to one status code and a
/// static detail message; store failures surface as an opaque 500.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("{0}")]
    PermissionDenied(&'static str),
    #[error("Invalid Token.")]
    InvalidAccessToken,
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidAccessToken | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Internal(e) => {
                error!("Unhandled failure: {:#}", e);
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(ErrorResponse { detail });

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_errors_carry_bearer_challenge() {
        for err in [ApiError::InvalidAccessToken, ApiError::InvalidCredentials] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        }
    }

    #[test]
    fn domain_errors_map_to_fixed_statuses() {
        assert_eq!(ApiError::NotFound(CAMPAIGN_NOT_FOUND).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::BadRequest(USER_ALREADY_REACTED).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::PermissionDenied(USER_NOT_CAMPAIGN_CREATOR).status(),
            StatusCode::FORBIDDEN
        );
        let internal = ApiError::from(anyhow::anyhow!("disk on fire"));
        let response = internal.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
