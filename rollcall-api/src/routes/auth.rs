/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - create an account
/// - `POST /api/auth/login` - login and get tokens
/// - `POST /api/auth/refresh` - refresh an access token
/// - `GET  /api/auth/me` - current user
///
/// Student accounts are open registration; creating a teacher or admin
/// account requires an admin bearer token on the register call.
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::HeaderMap, http::StatusCode, Extension, Json};
use rollcall_shared::{
    auth::{
        context::AuthContext,
        jwt::{self, Claims, TokenType},
        password,
    },
    models::user::{CreateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "is required"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "must be a valid email"))]
    pub email: String,

    /// Password, checked against the account password policy
    pub password: String,

    /// Requested role; defaults to student
    #[serde(default)]
    pub role: Option<UserRole>,

    /// Optional department
    pub department: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "must be a valid email"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Refresh request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token obtained at login
    pub refresh_token: String,
}

/// Response carrying the user and both tokens
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The account
    pub user: User,

    /// Access token (24 h)
    pub access_token: String,

    /// Refresh token (30 d)
    pub refresh_token: String,
}

/// Refresh response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24 h)
    pub access_token: String,
}

/// Registers a new account
///
/// # Errors
///
/// - `400`: validation or password-policy failure
/// - `401`: privileged role requested with an invalid token
/// - `403`: privileged role requested without an admin token
/// - `409`: email already exists
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    password::validate_password_policy(&req.password)
        .map_err(|msg| ApiError::BadRequest(format!("password: {}", msg)))?;

    let role = req.role.unwrap_or(UserRole::Student);

    // Only admins may create teacher/admin accounts
    if role != UserRole::Student {
        let caller = optional_auth(&state, &headers)?
            .ok_or_else(|| ApiError::Forbidden("Creating this role requires admin".to_string()))?;
        if !caller.is_admin() {
            return Err(ApiError::Forbidden(
                "Creating this role requires admin".to_string(),
            ));
        }
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: super::normalize_email(&req.email),
            password_hash,
            role,
            department: req.department,
        },
    )
    .await?;

    let (access_token, refresh_token) = issue_token_pair(&user, state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user,
            access_token,
            refresh_token,
        }),
    ))
}

/// Authenticates a user and returns a token pair
///
/// # Errors
///
/// - `400`: validation failure
/// - `401`: unknown email, wrong password, or deactivated account
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    // One message for every failure mode; don't leak which part was wrong
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &super::normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active {
        return Err(invalid());
    }

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    let (access_token, refresh_token) = issue_token_pair(&user, state.jwt_secret())?;

    Ok(Json(AuthResponse {
        user,
        access_token,
        refresh_token,
    }))
}

/// Exchanges a refresh token for a new access token
///
/// # Errors
///
/// - `401`: invalid, expired, or wrong-type token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;
    Ok(Json(RefreshResponse { access_token }))
}

/// Returns the authenticated caller's account
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Creates an access + refresh token pair for a user
fn issue_token_pair(user: &User, secret: &str) -> Result<(String, String), ApiError> {
    let access = jwt::create_token(&Claims::new(user.id, user.role, TokenType::Access), secret)?;
    let refresh = jwt::create_token(&Claims::new(user.id, user.role, TokenType::Refresh), secret)?;
    Ok((access, refresh))
}

/// Validates the bearer token if one is present
///
/// `Ok(None)` when no Authorization header was sent; `Err` when one was sent
/// but does not validate.
fn optional_auth(state: &AppState, headers: &HeaderMap) -> ApiResult<Option<AuthContext>> {
    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, &state.config.jwt.secret)?;
    Ok(Some(AuthContext::from_claims(&claims)))
}
