/// Dashboard endpoint: one aggregate summary payload
///
/// # Endpoint
///
/// ```text
/// GET /api/dashboard/summary?threshold=75
/// ```
///
/// # Response
///
/// ```json
/// {
///   "total_students": 240,
///   "total_subjects": 18,
///   "total_teachers": 12,
///   "today": { "present": 201, "absent": 26, "late": 13 },
///   "overall_percentage": 91.25,
///   "low_attendance": [ { "student_id": "...", "percentage": 64.1, ... } ]
/// }
/// ```
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use rollcall_shared::{
    auth::{authorization::require_role, context::AuthContext},
    models::{
        attendance::{attendance_percentage, AttendanceRecord, DayCounts, StudentBreakdown},
        student::Student,
        subject::Subject,
        user::{User, UserRole},
    },
};
use serde::{Deserialize, Serialize};

/// Default low-attendance cutoff (percent)
const DEFAULT_THRESHOLD: f64 = 75.0;

/// Summary query parameters
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Low-attendance cutoff; students below it are listed
    pub threshold: Option<f64>,
}

/// Dashboard summary payload
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// Active students
    pub total_students: i64,

    /// Active subjects
    pub total_subjects: i64,

    /// Active teacher accounts
    pub total_teachers: i64,

    /// Today's marked-attendance breakdown
    pub today: DayCounts,

    /// Attendance percentage across every record
    pub overall_percentage: f64,

    /// Cutoff used for the low-attendance list
    pub threshold: f64,

    /// Active students below the cutoff
    pub low_attendance: Vec<StudentBreakdown>,
}

/// Builds the aggregate summary (teacher or admin)
pub async fn summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<Json<SummaryResponse>> {
    require_role(&auth, UserRole::Teacher)?;

    let threshold = query.threshold.unwrap_or(DEFAULT_THRESHOLD);
    let today = Utc::now().date_naive();

    let total_students = Student::count_active(&state.db).await?;
    let total_subjects = Subject::count_active(&state.db).await?;
    let total_teachers = User::count_active_by_role(&state.db, UserRole::Teacher).await?;
    let today_counts = AttendanceRecord::day_counts(&state.db, today).await?;
    let (present, late, total) = AttendanceRecord::overall_counts(&state.db).await?;
    let low_attendance = AttendanceRecord::low_attendance(&state.db, threshold).await?;

    Ok(Json(SummaryResponse {
        total_students,
        total_subjects,
        total_teachers,
        today: today_counts,
        overall_percentage: attendance_percentage(present, late, total),
        threshold,
        low_attendance,
    }))
}
