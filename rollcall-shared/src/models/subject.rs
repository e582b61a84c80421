/// Subject model: taught subjects with an owning teacher
///
/// The subject code is unique. `teacher_id` references a user with the
/// teacher (or admin) role; deleting that user nulls the reference rather
/// than orphaning the subject.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subjects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     code VARCHAR(50) NOT NULL UNIQUE,
///     department VARCHAR(100) NOT NULL,
///     teacher_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     credits INTEGER NOT NULL DEFAULT 3,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Subject row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subject {
    /// Unique subject ID
    pub id: Uuid,

    /// Subject name (e.g. "Data Structures")
    pub name: String,

    /// Subject code, unique (e.g. "CS201")
    pub code: String,

    /// Department offering the subject
    pub department: String,

    /// Teacher responsible for the subject
    pub teacher_id: Option<Uuid>,

    /// Credit count
    pub credits: i32,

    /// Soft-delete flag
    pub is_active: bool,

    /// When the row was created
    pub created_at: DateTime<Utc>,

    /// When the row was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a subject
#[derive(Debug, Clone)]
pub struct CreateSubject {
    pub name: String,
    pub code: String,
    pub department: String,
    pub teacher_id: Option<Uuid>,
    pub credits: i32,
}

/// Input for updating a subject; only set fields change
#[derive(Debug, Clone, Default)]
pub struct UpdateSubject {
    pub name: Option<String>,
    pub code: Option<String>,
    pub department: Option<String>,
    pub teacher_id: Option<Uuid>,
    pub credits: Option<i32>,
    pub is_active: Option<bool>,
}

/// List filters for subjects
#[derive(Debug, Clone, Default)]
pub struct SubjectFilter {
    pub department: Option<String>,
    pub teacher_id: Option<Uuid>,
    pub include_inactive: bool,
}

const SUBJECT_COLUMNS: &str =
    "id, name, code, department, teacher_id, credits, is_active, created_at, updated_at";

impl Subject {
    /// Inserts a new subject
    ///
    /// # Errors
    ///
    /// A duplicate code violates the `subjects_code_key` constraint.
    pub async fn create(pool: &PgPool, data: CreateSubject) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Subject>(&format!(
            "INSERT INTO subjects (name, code, department, teacher_id, credits)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {SUBJECT_COLUMNS}"
        ))
        .bind(data.name)
        .bind(data.code)
        .bind(data.department)
        .bind(data.teacher_id)
        .bind(data.credits)
        .fetch_one(pool)
        .await
    }

    /// Finds a subject by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subject>(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial update, bumping `updated_at`
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateSubject,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subject>(&format!(
            "UPDATE subjects SET
                 name = COALESCE($2, name),
                 code = COALESCE($3, code),
                 department = COALESCE($4, department),
                 teacher_id = COALESCE($5, teacher_id),
                 credits = COALESCE($6, credits),
                 is_active = COALESCE($7, is_active),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {SUBJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.code)
        .bind(data.department)
        .bind(data.teacher_id)
        .bind(data.credits)
        .bind(data.is_active)
        .fetch_optional(pool)
        .await
    }

    /// Soft-deletes a subject
    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE subjects SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists subjects matching the filter, ordered by code
    pub async fn list(
        pool: &PgPool,
        filter: &SubjectFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subject>(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects
             WHERE ($1::text IS NULL OR department = $1)
               AND ($2::uuid IS NULL OR teacher_id = $2)
               AND ($3::bool OR is_active)
             ORDER BY code
             LIMIT $4 OFFSET $5"
        ))
        .bind(filter.department.as_deref())
        .bind(filter.teacher_id)
        .bind(filter.include_inactive)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts subjects matching the filter
    pub async fn count(pool: &PgPool, filter: &SubjectFilter) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM subjects
             WHERE ($1::text IS NULL OR department = $1)
               AND ($2::uuid IS NULL OR teacher_id = $2)
               AND ($3::bool OR is_active)",
        )
        .bind(filter.department.as_deref())
        .bind(filter.teacher_id)
        .bind(filter.include_inactive)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Counts active subjects (dashboard)
    pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM subjects WHERE is_active")
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
