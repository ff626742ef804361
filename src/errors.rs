use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Failure taxonomy of the API gateway façade.
///
/// Every gateway operation resolves to `Result<T, GatewayError>`; nothing else
/// escapes the façade boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Bad input or a non-2xx upstream answer. Carries a user-safe message.
    ValidationFailed(String),
    /// The upstream deadline elapsed.
    Timeout,
    /// Upstream reported 404. Profile reads turn this into an empty section.
    NotFound,
    /// Any other fault (transport, decode). Carries internal detail for logs.
    Unexpected(String),
}

impl GatewayError {
    /// Text that is safe to show in the browser.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::ValidationFailed(msg) => msg.clone(),
            GatewayError::Timeout => {
                "İstek zaman aşımına uğradı. Lütfen tekrar deneyin.".to_string()
            }
            GatewayError::NotFound => "Kayıt bulunamadı.".to_string(),
            GatewayError::Unexpected(_) => "Bir hata oluştu. Lütfen tekrar deneyin.".to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout)
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
            GatewayError::Timeout => write!(f, "Upstream request timed out"),
            GatewayError::NotFound => write!(f, "Upstream resource not found"),
            GatewayError::Unexpected(msg) => write!(f, "Unexpected gateway error: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Unexpected(err.to_string())
        }
    }
}

/// Application-specific error types for the JSON endpoints.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Bad request error (invalid input).
    BadRequest(String),
    /// No verified identity in the session.
    Unauthorized(String),
    /// A gateway operation failed.
    Gateway(GatewayError),
    /// Internal server error.
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Gateway(e) => write!(f, "Gateway error: {}", e),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status and the
    /// `{ "success": false, "message": ... }` body the browser scripts expect.
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized access: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone())
            }
            AppError::Gateway(e) => {
                tracing::error!("Gateway error: {}", e);
                let status = match e {
                    GatewayError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                    GatewayError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
                    GatewayError::NotFound => StatusCode::NOT_FOUND,
                    GatewayError::Unexpected(_) => StatusCode::BAD_GATEWAY,
                };
                (status, e.user_message())
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Bir hata oluştu.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Gateway(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_detail_never_reaches_user_message() {
        let err = GatewayError::Unexpected("connection reset by peer 10.0.0.4".to_string());
        assert!(!err.user_message().contains("10.0.0.4"));
        assert!(err.to_string().contains("10.0.0.4"));
    }

    #[test]
    fn validation_message_is_passed_through() {
        let err = GatewayError::ValidationFailed("Doğrulama başarısız.".to_string());
        assert_eq!(err.user_message(), "Doğrulama başarısız.");
    }

    #[test]
    fn gateway_timeout_maps_to_504() {
        let response = AppError::Gateway(GatewayError::Timeout).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
