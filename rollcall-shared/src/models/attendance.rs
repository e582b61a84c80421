/// Attendance model: per-day marks, upserts, and report aggregation
///
/// One record holds one student's status for one subject on one date; the
/// `(student_id, subject_id, date)` tuple is unique and re-marking it upserts
/// in place. Reports are SQL aggregates (`GROUP BY` + filtered counts); the
/// percentage arithmetic lives in [`attendance_percentage`] so both report
/// shapes and the dashboard share one definition.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE attendance_status AS ENUM ('present', 'absent', 'late');
///
/// CREATE TABLE attendance_records (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     student_id UUID NOT NULL REFERENCES students(id) ON DELETE CASCADE,
///     subject_id UUID NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
///     teacher_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     date DATE NOT NULL,
///     status attendance_status NOT NULL,
///     remarks TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT attendance_student_subject_date_key UNIQUE (student_id, subject_id, date)
/// );
/// ```
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Attendance status for one student on one date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// In class on time
    Present,

    /// Not in class
    Absent,

    /// In class, after the cutoff
    Late,
}

impl AttendanceStatus {
    /// Status name as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }

    /// Whether this status counts toward attendance percentage
    ///
    /// Late counts as attended; absence is the only non-attended state.
    pub fn is_attended(&self) -> bool {
        !matches!(self, AttendanceStatus::Absent)
    }
}

/// Attendance record row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    /// Unique record ID
    pub id: Uuid,

    /// Student the mark is for
    pub student_id: Uuid,

    /// Subject the mark is for
    pub subject_id: Uuid,

    /// User who marked it (null if that account was deleted)
    pub teacher_id: Option<Uuid>,

    /// Class date
    pub date: NaiveDate,

    /// Present / absent / late
    pub status: AttendanceStatus,

    /// Free-form note ("medical leave", ...)
    pub remarks: Option<String>,

    /// When the record was first created
    pub created_at: DateTime<Utc>,

    /// When the record was last re-marked
    pub updated_at: DateTime<Utc>,
}

/// Input for marking one student
#[derive(Debug, Clone)]
pub struct MarkAttendance {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub teacher_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
}

/// One entry of a bulk (whole-class) marking call
#[derive(Debug, Clone, Deserialize)]
pub struct BulkEntry {
    pub student_id: Uuid,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Input for correcting an existing record
#[derive(Debug, Clone, Default)]
pub struct UpdateAttendance {
    pub status: Option<AttendanceStatus>,
    pub remarks: Option<String>,
}

/// List filters for attendance records
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub student_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    pub status: Option<AttendanceStatus>,
    /// Inclusive start of the date range
    pub from: Option<NaiveDate>,
    /// Inclusive end of the date range
    pub to: Option<NaiveDate>,
}

/// Per-subject attendance breakdown for one student
#[derive(Debug, Clone, Serialize)]
pub struct SubjectBreakdown {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub subject_code: String,
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub percentage: f64,
}

/// Per-student attendance breakdown for one subject (or overall)
#[derive(Debug, Clone, Serialize)]
pub struct StudentBreakdown {
    pub student_id: Uuid,
    pub student_name: String,
    pub roll_number: String,
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub percentage: f64,
}

/// Status counts for a single day (dashboard)
#[derive(Debug, Clone, Default, Serialize)]
pub struct DayCounts {
    pub present: i64,
    pub absent: i64,
    pub late: i64,
}

/// Attendance percentage with late counted as attended
///
/// Returns 0.0 for an empty record set, rounded to two decimals otherwise.
///
/// # Example
///
/// ```
/// use rollcall_shared::models::attendance::attendance_percentage;
///
/// assert_eq!(attendance_percentage(7, 1, 10), 80.0);
/// assert_eq!(attendance_percentage(0, 0, 0), 0.0);
/// ```
pub fn attendance_percentage(present: i64, late: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let ratio = (present + late) as f64 / total as f64;
    (ratio * 10_000.0).round() / 100.0
}

const RECORD_COLUMNS: &str = "id, student_id, subject_id, teacher_id, date, status, remarks, \
                              created_at, updated_at";

const UPSERT_SQL: &str = "INSERT INTO attendance_records
         (student_id, subject_id, teacher_id, date, status, remarks)
     VALUES ($1, $2, $3, $4, $5, $6)
     ON CONFLICT ON CONSTRAINT attendance_student_subject_date_key
     DO UPDATE SET
         status = EXCLUDED.status,
         remarks = EXCLUDED.remarks,
         teacher_id = EXCLUDED.teacher_id,
         updated_at = NOW()";

const FILTER_WHERE: &str = "($1::uuid IS NULL OR student_id = $1)
       AND ($2::uuid IS NULL OR subject_id = $2)
       AND ($3::uuid IS NULL OR teacher_id = $3)
       AND ($4::attendance_status IS NULL OR status = $4)
       AND ($5::date IS NULL OR date >= $5)
       AND ($6::date IS NULL OR date <= $6)";

impl AttendanceRecord {
    /// Marks one student, upserting on the (student, subject, date) tuple
    ///
    /// Re-marking replaces status, remarks, and the marking teacher.
    pub async fn mark(pool: &PgPool, data: MarkAttendance) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(&format!("{UPSERT_SQL} RETURNING {RECORD_COLUMNS}"))
            .bind(data.student_id)
            .bind(data.subject_id)
            .bind(data.teacher_id)
            .bind(data.date)
            .bind(data.status)
            .bind(data.remarks)
            .fetch_one(pool)
            .await
    }

    /// Marks a whole class in one transaction
    ///
    /// Any failing entry (unknown student, constraint violation) rolls back
    /// the entire batch. Returns the number of records written.
    pub async fn mark_many(
        pool: &PgPool,
        subject_id: Uuid,
        teacher_id: Uuid,
        date: NaiveDate,
        entries: &[BulkEntry],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        for entry in entries {
            sqlx::query(UPSERT_SQL)
                .bind(entry.student_id)
                .bind(subject_id)
                .bind(teacher_id)
                .bind(date)
                .bind(entry.status)
                .bind(entry.remarks.as_deref())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(entries.len() as u64)
    }

    /// Finds a record by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Corrects status and/or remarks on an existing record
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateAttendance,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(&format!(
            "UPDATE attendance_records SET
                 status = COALESCE($2, status),
                 remarks = COALESCE($3, remarks),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {RECORD_COLUMNS}"
        ))
        .bind(id)
        .bind(data.status)
        .bind(data.remarks)
        .fetch_optional(pool)
        .await
    }

    /// Removes a record
    ///
    /// Attendance has no soft-delete lifecycle: a soft-deleted mark would
    /// still occupy the unique (student, subject, date) slot.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM attendance_records WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists records matching the filter, newest date first
    pub async fn list(
        pool: &PgPool,
        filter: &AttendanceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records
             WHERE {FILTER_WHERE}
             ORDER BY date DESC, created_at DESC
             LIMIT $7 OFFSET $8"
        ))
        .bind(filter.student_id)
        .bind(filter.subject_id)
        .bind(filter.teacher_id)
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts records matching the filter
    pub async fn count(pool: &PgPool, filter: &AttendanceFilter) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM attendance_records WHERE {FILTER_WHERE}"
        ))
        .bind(filter.student_id)
        .bind(filter.subject_id)
        .bind(filter.teacher_id)
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Per-subject breakdown for one student over an optional date range
    pub async fn student_report(
        pool: &PgPool,
        student_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<SubjectBreakdown>, sqlx::Error> {
        let rows: Vec<(Uuid, String, String, i64, i64, i64, i64)> = sqlx::query_as(
            "SELECT sub.id, sub.name, sub.code,
                    COUNT(a.id),
                    COUNT(a.id) FILTER (WHERE a.status = 'present'),
                    COUNT(a.id) FILTER (WHERE a.status = 'absent'),
                    COUNT(a.id) FILTER (WHERE a.status = 'late')
             FROM attendance_records a
             JOIN subjects sub ON sub.id = a.subject_id
             WHERE a.student_id = $1
               AND ($2::date IS NULL OR a.date >= $2)
               AND ($3::date IS NULL OR a.date <= $3)
             GROUP BY sub.id, sub.name, sub.code
             ORDER BY sub.code",
        )
        .bind(student_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(subject_id, subject_name, subject_code, total, present, absent, late)| {
                    SubjectBreakdown {
                        subject_id,
                        subject_name,
                        subject_code,
                        total,
                        present,
                        absent,
                        late,
                        percentage: attendance_percentage(present, late, total),
                    }
                },
            )
            .collect())
    }

    /// Per-student breakdown for one subject over an optional date range
    pub async fn subject_report(
        pool: &PgPool,
        subject_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<StudentBreakdown>, sqlx::Error> {
        let rows: Vec<(Uuid, String, String, i64, i64, i64, i64)> = sqlx::query_as(
            "SELECT s.id, s.name, s.roll_number,
                    COUNT(a.id),
                    COUNT(a.id) FILTER (WHERE a.status = 'present'),
                    COUNT(a.id) FILTER (WHERE a.status = 'absent'),
                    COUNT(a.id) FILTER (WHERE a.status = 'late')
             FROM attendance_records a
             JOIN students s ON s.id = a.student_id
             WHERE a.subject_id = $1
               AND ($2::date IS NULL OR a.date >= $2)
               AND ($3::date IS NULL OR a.date <= $3)
             GROUP BY s.id, s.name, s.roll_number
             ORDER BY s.roll_number",
        )
        .bind(subject_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(StudentBreakdown::from_row).collect())
    }

    /// Status counts for one date (dashboard's "today")
    pub async fn day_counts(pool: &PgPool, date: NaiveDate) -> Result<DayCounts, sqlx::Error> {
        let (present, absent, late): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE status = 'present'),
                    COUNT(*) FILTER (WHERE status = 'absent'),
                    COUNT(*) FILTER (WHERE status = 'late')
             FROM attendance_records
             WHERE date = $1",
        )
        .bind(date)
        .fetch_one(pool)
        .await?;

        Ok(DayCounts {
            present,
            absent,
            late,
        })
    }

    /// Overall (present, late, total) counts across every record
    pub async fn overall_counts(pool: &PgPool) -> Result<(i64, i64, i64), sqlx::Error> {
        let (present, late, total): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE status = 'present'),
                    COUNT(*) FILTER (WHERE status = 'late'),
                    COUNT(*)
             FROM attendance_records",
        )
        .fetch_one(pool)
        .await?;

        Ok((present, late, total))
    }

    /// Active students whose overall percentage falls below `threshold`
    ///
    /// Students with no records are not listed; there is nothing to compute a
    /// percentage from.
    pub async fn low_attendance(
        pool: &PgPool,
        threshold: f64,
    ) -> Result<Vec<StudentBreakdown>, sqlx::Error> {
        let rows: Vec<(Uuid, String, String, i64, i64, i64, i64)> = sqlx::query_as(
            "SELECT s.id, s.name, s.roll_number,
                    COUNT(a.id),
                    COUNT(a.id) FILTER (WHERE a.status = 'present'),
                    COUNT(a.id) FILTER (WHERE a.status = 'absent'),
                    COUNT(a.id) FILTER (WHERE a.status = 'late')
             FROM attendance_records a
             JOIN students s ON s.id = a.student_id
             WHERE s.is_active
             GROUP BY s.id, s.name, s.roll_number
             ORDER BY s.roll_number",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(StudentBreakdown::from_row)
            .filter(|b| b.percentage < threshold)
            .collect())
    }
}

impl StudentBreakdown {
    fn from_row(
        (student_id, student_name, roll_number, total, present, absent, late): (
            Uuid,
            String,
            String,
            i64,
            i64,
            i64,
            i64,
        ),
    ) -> Self {
        Self {
            student_id,
            student_name,
            roll_number,
            total,
            present,
            absent,
            late,
            percentage: attendance_percentage(present, late, total),
        }
    }
}
