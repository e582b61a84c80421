/// Student model: roster rows owning attendance records
///
/// A student row is a roster entry, not a login; a student *account* (see
/// `models::user`) is linked to its roster row by email. Email and roll
/// number are unique. Deletion is soft so attendance history survives.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE students (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     roll_number VARCHAR(50) NOT NULL UNIQUE,
///     department VARCHAR(100) NOT NULL,
///     year INTEGER NOT NULL,
///     section VARCHAR(10),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Student roster row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    /// Unique student ID
    pub id: Uuid,

    /// Full name
    pub name: String,

    /// Email address, unique, stored lowercase
    pub email: String,

    /// Roll number, unique across the institution
    pub roll_number: String,

    /// Department (e.g. "Computer Science")
    pub department: String,

    /// Year of study (1-based)
    pub year: i32,

    /// Section within the year, if the department uses them
    pub section: Option<String>,

    /// Soft-delete flag
    pub is_active: bool,

    /// When the row was created
    pub created_at: DateTime<Utc>,

    /// When the row was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a student
#[derive(Debug, Clone)]
pub struct CreateStudent {
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub department: String,
    pub year: i32,
    pub section: Option<String>,
}

/// Input for updating a student; only set fields change
#[derive(Debug, Clone, Default)]
pub struct UpdateStudent {
    pub name: Option<String>,
    pub email: Option<String>,
    pub roll_number: Option<String>,
    pub department: Option<String>,
    pub year: Option<i32>,
    pub section: Option<String>,
    pub is_active: Option<bool>,
}

/// List filters for students
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub department: Option<String>,
    pub year: Option<i32>,
    pub section: Option<String>,
    /// Case-insensitive substring match over name, roll number, and email
    pub search: Option<String>,
    pub include_inactive: bool,
}

const STUDENT_COLUMNS: &str =
    "id, name, email, roll_number, department, year, section, is_active, created_at, updated_at";

const STUDENT_FILTER_WHERE: &str = "($1::text IS NULL OR department = $1)
       AND ($2::int IS NULL OR year = $2)
       AND ($3::text IS NULL OR section = $3)
       AND ($4::text IS NULL
            OR name ILIKE '%' || $4 || '%'
            OR roll_number ILIKE '%' || $4 || '%'
            OR email ILIKE '%' || $4 || '%')
       AND ($5::bool OR is_active)";

impl Student {
    /// Inserts a new roster row
    ///
    /// # Errors
    ///
    /// Duplicate email or roll number violates `students_email_key` /
    /// `students_roll_number_key`.
    pub async fn create(pool: &PgPool, data: CreateStudent) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Student>(&format!(
            "INSERT INTO students (name, email, roll_number, department, year, section)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.roll_number)
        .bind(data.department)
        .bind(data.year)
        .bind(data.section)
        .fetch_one(pool)
        .await
    }

    /// Finds a student by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a student by email; used to link a student login to its roster row
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial update, bumping `updated_at`
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateStudent,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>(&format!(
            "UPDATE students SET
                 name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 roll_number = COALESCE($4, roll_number),
                 department = COALESCE($5, department),
                 year = COALESCE($6, year),
                 section = COALESCE($7, section),
                 is_active = COALESCE($8, is_active),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.email)
        .bind(data.roll_number)
        .bind(data.department)
        .bind(data.year)
        .bind(data.section)
        .bind(data.is_active)
        .fetch_optional(pool)
        .await
    }

    /// Soft-deletes a student
    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE students SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists students matching the filter, ordered by roll number
    pub async fn list(
        pool: &PgPool,
        filter: &StudentFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students
             WHERE {STUDENT_FILTER_WHERE}
             ORDER BY roll_number
             LIMIT $6 OFFSET $7"
        ))
        .bind(filter.department.as_deref())
        .bind(filter.year)
        .bind(filter.section.as_deref())
        .bind(filter.search.as_deref())
        .bind(filter.include_inactive)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts students matching the filter
    pub async fn count(pool: &PgPool, filter: &StudentFilter) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM students WHERE {STUDENT_FILTER_WHERE}"
        ))
        .bind(filter.department.as_deref())
        .bind(filter.year)
        .bind(filter.section.as_deref())
        .bind(filter.search.as_deref())
        .bind(filter.include_inactive)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Counts active students (dashboard)
    pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM students WHERE is_active")
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
