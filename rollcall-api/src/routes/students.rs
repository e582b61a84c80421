/// Student roster endpoints
///
/// # Endpoints
///
/// - `GET    /api/students` - paginated list with filters and search
/// - `GET    /api/students/:id` - fetch one student
/// - `POST   /api/students` - create (teacher or admin)
/// - `PUT    /api/students/:id` - partial update (teacher or admin)
/// - `DELETE /api/students/:id` - deactivate (admin)
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
    auth::{
        authorization::{require_admin, require_role},
        context::AuthContext,
    },
    models::{
        page::{Page, Pagination},
        student::{CreateStudent, Student, StudentFilter, UpdateStudent},
        user::UserRole,
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct StudentListQuery {
    pub department: Option<String>,
    pub year: Option<i32>,
    pub section: Option<String>,
    /// Substring match over name, roll number, and email
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 255, message = "is required"))]
    pub name: String,

    #[validate(email(message = "must be a valid email"))]
    pub email: String,

    #[validate(length(min = 1, max = 50, message = "is required"))]
    pub roll_number: String,

    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub department: String,

    #[validate(range(min = 1, max = 8, message = "must be between 1 and 8"))]
    pub year: i32,

    pub section: Option<String>,
}

/// Update request; only set fields change
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, max = 255, message = "must not be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 50, message = "must not be empty"))]
    pub roll_number: Option<String>,

    pub department: Option<String>,

    #[validate(range(min = 1, max = 8, message = "must be between 1 and 8"))]
    pub year: Option<i32>,

    pub section: Option<String>,
    pub is_active: Option<bool>,
}

/// Lists students, ordered by roll number
pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<StudentListQuery>,
) -> ApiResult<Json<Page<Student>>> {
    let filter = StudentFilter {
        department: query.department,
        year: query.year,
        section: query.section,
        search: query.search,
        include_inactive: query.include_inactive,
    };
    let pagination = Pagination::from_parts(query.page, query.per_page);

    let students =
        Student::list(&state.db, &filter, pagination.limit(), pagination.offset()).await?;
    let total = Student::count(&state.db, &filter).await?;

    Ok(Json(Page::new(students, total, pagination)))
}

/// Fetches one student
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Student>> {
    let student = Student::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    Ok(Json(student))
}

/// Creates a roster row
///
/// # Errors
///
/// - `400`: validation failure
/// - `403`: caller below teacher
/// - `409`: duplicate email or roll number
pub async fn create_student(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateStudentRequest>,
) -> ApiResult<(StatusCode, Json<Student>)> {
    require_role(&auth, UserRole::Teacher)?;
    req.validate()?;

    let student = Student::create(
        &state.db,
        CreateStudent {
            name: req.name,
            email: super::normalize_email(&req.email),
            roll_number: req.roll_number.trim().to_string(),
            department: req.department,
            year: req.year,
            section: req.section,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(student)))
}

/// Applies a partial update to a roster row
pub async fn update_student(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStudentRequest>,
) -> ApiResult<Json<Student>> {
    require_role(&auth, UserRole::Teacher)?;
    req.validate()?;

    let update = UpdateStudent {
        name: req.name,
        email: req.email.as_deref().map(super::normalize_email),
        roll_number: req.roll_number.map(|r| r.trim().to_string()),
        department: req.department,
        year: req.year,
        section: req.section,
        is_active: req.is_active,
    };

    let student = Student::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    Ok(Json(student))
}

/// Deactivates a roster row; attendance history is kept
pub async fn delete_student(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    if !Student::deactivate(&state.db, id).await? {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
