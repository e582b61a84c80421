/// Attendance endpoints: marking, listing, and reports
///
/// # Endpoints
///
/// - `POST   /api/attendance` - mark one student (teacher or admin)
/// - `POST   /api/attendance/bulk` - mark a whole class in one transaction
/// - `GET    /api/attendance` - paginated list with filters
/// - `PUT    /api/attendance/:id` - correct a record
/// - `DELETE /api/attendance/:id` - remove a record
/// - `GET    /api/attendance/report/student/:id` - per-subject percentages
/// - `GET    /api/attendance/report/subject/:id` - per-student percentages
///
/// Marking upserts on the (student, subject, date) tuple, so re-marking a day
/// replaces the earlier status instead of failing. Callers with the student
/// role are scoped to the roster row matching their own email.
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use rollcall_shared::{
    auth::{
        authorization::{require_role, AuthzError},
        context::AuthContext,
    },
    models::{
        attendance::{
            AttendanceFilter, AttendanceRecord, AttendanceStatus, BulkEntry, MarkAttendance,
            SubjectBreakdown, StudentBreakdown, UpdateAttendance,
        },
        page::{Page, Pagination},
        student::Student,
        subject::Subject,
        user::{User, UserRole},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mark request
#[derive(Debug, Deserialize)]
pub struct MarkRequest {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Bulk mark request: one subject, one date, many students
#[derive(Debug, Deserialize)]
pub struct BulkMarkRequest {
    pub subject_id: Uuid,
    pub date: NaiveDate,
    pub entries: Vec<BulkEntry>,
}

/// Bulk mark response
#[derive(Debug, Serialize)]
pub struct BulkMarkResponse {
    /// Number of records written
    pub marked: u64,
}

/// Update request
#[derive(Debug, Deserialize)]
pub struct UpdateAttendanceRequest {
    pub status: Option<AttendanceStatus>,
    pub remarks: Option<String>,
}

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct AttendanceListQuery {
    pub student_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    pub status: Option<AttendanceStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Report query parameters
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Per-student report response
#[derive(Debug, Serialize)]
pub struct StudentReportResponse {
    pub student: Student,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub subjects: Vec<SubjectBreakdown>,
}

/// Per-subject report response
#[derive(Debug, Serialize)]
pub struct SubjectReportResponse {
    pub subject: Subject,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub students: Vec<StudentBreakdown>,
}

/// Marks one student for one subject on one date
///
/// # Errors
///
/// - `400`: unknown or inactive student/subject
/// - `403`: caller below teacher
pub async fn mark_attendance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<MarkRequest>,
) -> ApiResult<(StatusCode, Json<AttendanceRecord>)> {
    require_role(&auth, UserRole::Teacher)?;

    ensure_markable_student(&state, req.student_id).await?;
    ensure_markable_subject(&state, req.subject_id).await?;

    let record = AttendanceRecord::mark(
        &state.db,
        MarkAttendance {
            student_id: req.student_id,
            subject_id: req.subject_id,
            teacher_id: auth.user_id,
            date: req.date,
            status: req.status,
            remarks: req.remarks,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Marks a whole class for one subject and date
///
/// The batch runs in a single transaction; one bad entry rolls back all of
/// them.
pub async fn mark_attendance_bulk(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<BulkMarkRequest>,
) -> ApiResult<(StatusCode, Json<BulkMarkResponse>)> {
    require_role(&auth, UserRole::Teacher)?;

    if req.entries.is_empty() {
        return Err(ApiError::BadRequest("entries must not be empty".to_string()));
    }

    ensure_markable_subject(&state, req.subject_id).await?;

    let marked = AttendanceRecord::mark_many(
        &state.db,
        req.subject_id,
        auth.user_id,
        req.date,
        &req.entries,
    )
    .await
    .map_err(|e| match e {
        // An unknown student surfaces as a foreign-key violation
        sqlx::Error::Database(ref db_err) if db_err.constraint().is_some() => {
            ApiError::BadRequest("entries reference an unknown student".to_string())
        }
        other => other.into(),
    })?;

    Ok((StatusCode::CREATED, Json(BulkMarkResponse { marked })))
}

/// Lists attendance records, newest date first
///
/// Student callers are scoped to their own roster row; other filters still
/// apply within that scope.
pub async fn list_attendance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<AttendanceListQuery>,
) -> ApiResult<Json<Page<AttendanceRecord>>> {
    let pagination = Pagination::from_parts(query.page, query.per_page);
    let mut filter = AttendanceFilter {
        student_id: query.student_id,
        subject_id: query.subject_id,
        teacher_id: query.teacher_id,
        status: query.status,
        from: query.from,
        to: query.to,
    };

    if auth.is_student() {
        match own_student_row(&state, &auth).await? {
            Some(own) => filter.student_id = Some(own.id),
            // No roster row linked to this login: nothing to see
            None => return Ok(Json(Page::new(vec![], 0, pagination))),
        }
    }

    let records =
        AttendanceRecord::list(&state.db, &filter, pagination.limit(), pagination.offset())
            .await?;
    let total = AttendanceRecord::count(&state.db, &filter).await?;

    Ok(Json(Page::new(records, total, pagination)))
}

/// Corrects the status and/or remarks of a record
pub async fn update_attendance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAttendanceRequest>,
) -> ApiResult<Json<AttendanceRecord>> {
    require_role(&auth, UserRole::Teacher)?;

    let record = AttendanceRecord::update(
        &state.db,
        id,
        UpdateAttendance {
            status: req.status,
            remarks: req.remarks,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Attendance record not found".to_string()))?;

    Ok(Json(record))
}

/// Removes a record
pub async fn delete_attendance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_role(&auth, UserRole::Teacher)?;

    if !AttendanceRecord::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Attendance record not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Per-subject attendance percentages for one student
///
/// Students may fetch only their own report; teachers and admins any.
pub async fn student_report(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<StudentReportResponse>> {
    let student = Student::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    if auth.is_student() {
        let own = own_student_row(&state, &auth).await?;
        if own.map(|s| s.id) != Some(student.id) {
            return Err(AuthzError::NotOwner.into());
        }
    }

    let subjects =
        AttendanceRecord::student_report(&state.db, student.id, query.from, query.to).await?;

    Ok(Json(StudentReportResponse {
        student,
        from: query.from,
        to: query.to,
        subjects,
    }))
}

/// Per-student attendance percentages for one subject
pub async fn subject_report(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<SubjectReportResponse>> {
    require_role(&auth, UserRole::Teacher)?;

    let subject = Subject::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subject not found".to_string()))?;

    let students =
        AttendanceRecord::subject_report(&state.db, subject.id, query.from, query.to).await?;

    Ok(Json(SubjectReportResponse {
        subject,
        from: query.from,
        to: query.to,
        students,
    }))
}

/// Rejects marking against a missing or inactive student
async fn ensure_markable_student(state: &AppState, student_id: Uuid) -> ApiResult<()> {
    match Student::find_by_id(&state.db, student_id).await? {
        Some(s) if s.is_active => Ok(()),
        Some(_) => Err(ApiError::BadRequest(
            "student_id: student is inactive".to_string(),
        )),
        None => Err(ApiError::BadRequest("student_id: no such student".to_string())),
    }
}

/// Rejects marking against a missing or inactive subject
async fn ensure_markable_subject(state: &AppState, subject_id: Uuid) -> ApiResult<()> {
    match Subject::find_by_id(&state.db, subject_id).await? {
        Some(s) if s.is_active => Ok(()),
        Some(_) => Err(ApiError::BadRequest(
            "subject_id: subject is inactive".to_string(),
        )),
        None => Err(ApiError::BadRequest("subject_id: no such subject".to_string())),
    }
}

/// Resolves the roster row linked to a student login (matched by email)
async fn own_student_row(state: &AppState, auth: &AuthContext) -> ApiResult<Option<Student>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(Student::find_by_email(&state.db, &user.email).await?)
}
