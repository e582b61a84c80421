/// Subject endpoints
///
/// # Endpoints
///
/// - `GET    /api/subjects` - paginated list with filters
/// - `GET    /api/subjects/:id` - fetch one subject
/// - `POST   /api/subjects` - create (admin)
/// - `PUT    /api/subjects/:id` - partial update (admin)
/// - `DELETE /api/subjects/:id` - deactivate (admin)
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
        subject::{CreateSubject, Subject, SubjectFilter, UpdateSubject},
        user::User,
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct SubjectListQuery {
    pub department: Option<String>,
    pub teacher_id: Option<Uuid>,
    #[serde(default)]
    pub include_inactive: bool,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubjectRequest {
    #[validate(length(min = 1, max = 255, message = "is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 50, message = "is required"))]
    pub code: String,

    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub department: String,

    pub teacher_id: Option<Uuid>,

    #[validate(range(min = 1, max = 20, message = "must be between 1 and 20"))]
    #[serde(default = "default_credits")]
    pub credits: i32,
}

fn default_credits() -> i32 {
    3
}

/// Update request; only set fields change
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSubjectRequest {
    #[validate(length(min = 1, max = 255, message = "must not be empty"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 50, message = "must not be empty"))]
    pub code: Option<String>,

    pub department: Option<String>,
    pub teacher_id: Option<Uuid>,

    #[validate(range(min = 1, max = 20, message = "must be between 1 and 20"))]
    pub credits: Option<i32>,

    pub is_active: Option<bool>,
}

/// Lists subjects, ordered by code
pub async fn list_subjects(
    State(state): State<AppState>,
    Query(query): Query<SubjectListQuery>,
) -> ApiResult<Json<Page<Subject>>> {
    let filter = SubjectFilter {
        department: query.department,
        teacher_id: query.teacher_id,
        include_inactive: query.include_inactive,
    };
    let pagination = Pagination::from_parts(query.page, query.per_page);

    let subjects =
        Subject::list(&state.db, &filter, pagination.limit(), pagination.offset()).await?;
    let total = Subject::count(&state.db, &filter).await?;

    Ok(Json(Page::new(subjects, total, pagination)))
}

/// Fetches one subject
pub async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Subject>> {
    let subject = Subject::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subject not found".to_string()))?;

    Ok(Json(subject))
}

/// Creates a subject
///
/// # Errors
///
/// - `400`: validation failure, or `teacher_id` is not a teaching account
/// - `403`: caller is not admin
/// - `409`: duplicate code
pub async fn create_subject(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateSubjectRequest>,
) -> ApiResult<(StatusCode, Json<Subject>)> {
    require_admin(&auth)?;
    req.validate()?;

    if let Some(teacher_id) = req.teacher_id {
        ensure_teaching_account(&state, teacher_id).await?;
    }

    let subject = Subject::create(
        &state.db,
        CreateSubject {
            name: req.name,
            code: req.code.trim().to_uppercase(),
            department: req.department,
            teacher_id: req.teacher_id,
            credits: req.credits,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(subject)))
}

/// Applies a partial update to a subject
pub async fn update_subject(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSubjectRequest>,
) -> ApiResult<Json<Subject>> {
    require_admin(&auth)?;
    req.validate()?;

    if let Some(teacher_id) = req.teacher_id {
        ensure_teaching_account(&state, teacher_id).await?;
    }

    let update = UpdateSubject {
        name: req.name,
        code: req.code.map(|c| c.trim().to_uppercase()),
        department: req.department,
        teacher_id: req.teacher_id,
        credits: req.credits,
        is_active: req.is_active,
    };

    let subject = Subject::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subject not found".to_string()))?;

    Ok(Json(subject))
}

/// Deactivates a subject
pub async fn delete_subject(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    if !Subject::deactivate(&state.db, id).await? {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Rejects a `teacher_id` that is missing, inactive, or cannot teach
async fn ensure_teaching_account(state: &AppState, teacher_id: Uuid) -> ApiResult<()> {
    let user = User::find_by_id(&state.db, teacher_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("teacher_id: no such user".to_string()))?;

    if !user.is_active || !user.role.can_teach() {
        return Err(ApiError::BadRequest(
            "teacher_id: user cannot be assigned as a teacher".to_string(),
        ));
    }

    Ok(())
}
