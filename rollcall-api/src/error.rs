/// Error handling for the API server
///
/// Every handler returns `Result<T, ApiError>`; the error converts into an
/// HTTP response with a `{"error": message}` JSON body. `From` impls cover
/// the shared-library error types so handlers can use `?` throughout.
///
/// # Status Mapping
///
/// - `BadRequest` → 400 (malformed input, validation failures)
/// - `Unauthorized` → 401 (missing/invalid token, bad credentials)
/// - `Forbidden` → 403 (insufficient role)
/// - `NotFound` → 404
/// - `Conflict` → 409 (uniqueness violations)
/// - `Internal` → 500 (detail logged, generic message returned)
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use rollcall_shared::auth::{
    authorization::AuthzError, jwt::JwtError, password::PasswordError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409), e.g. duplicate email or roll number
    Conflict(String),

    /// Internal server error (500)
    Internal(String),
}

/// JSON error body: `{"error": message}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message
    pub error: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                // Log the detail, return a generic message
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Uniqueness violations become 409s with a message naming the field
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already exists".to_string());
                    }
                    if constraint.contains("roll_number") {
                        return ApiError::Conflict("Roll number already exists".to_string());
                    }
                    if constraint.contains("code") {
                        return ApiError::Conflict("Subject code already exists".to_string());
                    }
                    if constraint.contains("student_subject_date") {
                        return ApiError::Conflict(
                            "Attendance already marked for this date".to_string(),
                        );
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::Internal(format!("Database error: {}", db_err))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        // Flatten field errors into one "field: message; field: message" line
        let mut parts: Vec<String> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "is invalid".to_string());
                    format!("{}: {}", field, message)
                })
            })
            .collect();
        parts.sort();

        ApiError::BadRequest(parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("year is required".to_string());
        assert_eq!(err.to_string(), "Bad request: year is required");

        let err = ApiError::NotFound("Student not found".to_string());
        assert_eq!(err.to_string(), "Not found: Student not found");
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_jwt_expiry_maps_to_401() {
        let err: ApiError = JwtError::Expired.into();
        match err {
            ApiError::Unauthorized(msg) => assert!(msg.contains("expired")),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_errors_flatten() {
        #[derive(Validate)]
        struct Probe {
            #[validate(email(message = "must be a valid email"))]
            email: String,
            #[validate(length(min = 1, message = "is required"))]
            name: String,
        }

        let probe = Probe {
            email: "not-an-email".to_string(),
            name: String::new(),
        };

        let err: ApiError = probe.validate().unwrap_err().into();
        match err {
            ApiError::BadRequest(msg) => {
                assert!(msg.contains("email: must be a valid email"));
                assert!(msg.contains("name: is required"));
            }
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }
}
