/// User management endpoints (admin only)
///
/// # Endpoints
///
/// - `GET    /api/users` - paginated list with role/department filters
/// - `GET    /api/users/:id` - fetch one account
/// - `PUT    /api/users/:id` - partial update
/// - `DELETE /api/users/:id` - deactivate (soft delete)
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use rollcall_shared::{
    auth::{authorization::require_admin, context::AuthContext},
    models::{
        page::{Page, Pagination},
        user::{UpdateUser, User, UserFilter, UserRole},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<UserRole>,
    pub department: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Update request; only set fields change
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "must not be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,

    pub role: Option<UserRole>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
}

/// Lists accounts, newest first
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<Page<User>>> {
    require_admin(&auth)?;

    let filter = UserFilter {
        role: query.role,
        department: query.department,
        include_inactive: query.include_inactive,
    };
    let pagination = Pagination::from_parts(query.page, query.per_page);

    let users = User::list(&state.db, &filter, pagination.limit(), pagination.offset()).await?;
    let total = User::count(&state.db, &filter).await?;

    Ok(Json(Page::new(users, total, pagination)))
}

/// Fetches one account
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    require_admin(&auth)?;

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Applies a partial update to an account
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    require_admin(&auth)?;
    req.validate()?;

    let update = UpdateUser {
        name: req.name,
        email: req.email.as_deref().map(super::normalize_email),
        password_hash: None,
        role: req.role,
        department: req.department,
        is_active: req.is_active,
    };

    let user = User::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Deactivates an account; it can no longer log in
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    if !User::deactivate(&state.db, id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
