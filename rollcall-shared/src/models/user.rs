/// User model: login accounts with roles
///
/// Users authenticate against this table; the `student` role links a login to
/// a roster row (see `models::student`) by email. Deletion is soft: rows are
/// deactivated, never removed, so attendance history keeps its teacher
/// references.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'teacher', 'student');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'student',
///     department VARCHAR(100),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

/// Account role, ordered student < teacher < admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full access: user, student, and subject management
    Admin,

    /// Marks attendance, manages students, views reports
    Teacher,

    /// Views own attendance and reports
    Student,
}

impl UserRole {
    /// Role name as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Teacher => "teacher",
            UserRole::Student => "student",
        }
    }

    /// Numeric rank for permission comparisons
    fn rank(&self) -> u8 {
        match self {
            UserRole::Admin => 3,
            UserRole::Teacher => 2,
            UserRole::Student => 1,
        }
    }

    /// Whether this role satisfies a requirement of `required` or higher
    pub fn outranks_or_is(&self, required: UserRole) -> bool {
        self.rank() >= required.rank()
    }

    /// Whether accounts with this role may be assigned as a subject's teacher
    pub fn can_teach(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Teacher)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User row
///
/// The password hash is deliberately excluded from serialization so model
/// values can be returned from handlers directly.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address, unique, stored lowercase
    pub email: String,

    /// Argon2id password hash; never serialized into responses
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Account role
    pub role: UserRole,

    /// Department the account belongs to
    pub department: Option<String>,

    /// Soft-delete flag; inactive accounts cannot log in
    pub is_active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub department: Option<String>,
}

/// Input for updating a user; only set fields change
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
}

/// List filters for users
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub department: Option<String>,
    pub include_inactive: bool,
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, department, is_active, created_at, updated_at";

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// A duplicate email violates the `users_email_key` constraint.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, role, department)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.department)
        .fetch_one(pool)
        .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by email (callers normalize to lowercase first)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial update, bumping `updated_at`
    ///
    /// Returns `None` when the user does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                 name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 password_hash = COALESCE($4, password_hash),
                 role = COALESCE($5, role),
                 department = COALESCE($6, department),
                 is_active = COALESCE($7, is_active),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.department)
        .bind(data.is_active)
        .fetch_optional(pool)
        .await
    }

    /// Soft-deletes a user by clearing `is_active`
    ///
    /// Returns false when the user does not exist.
    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users matching the filter, newest first
    pub async fn list(
        pool: &PgPool,
        filter: &UserFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE ($1::user_role IS NULL OR role = $1)
               AND ($2::text IS NULL OR department = $2)
               AND ($3::bool OR is_active)
             ORDER BY created_at DESC
             LIMIT $4 OFFSET $5"
        ))
        .bind(filter.role)
        .bind(filter.department.as_deref())
        .bind(filter.include_inactive)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts users matching the filter
    pub async fn count(pool: &PgPool, filter: &UserFilter) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users
             WHERE ($1::user_role IS NULL OR role = $1)
               AND ($2::text IS NULL OR department = $2)
               AND ($3::bool OR is_active)",
        )
        .bind(filter.role)
        .bind(filter.department.as_deref())
        .bind(filter.include_inactive)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Counts active users holding a given role (dashboard)
    pub async fn count_active_by_role(
        pool: &PgPool,
        role: UserRole,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = $1 AND is_active")
                .bind(role)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_rank_ordering() {
        assert!(UserRole::Admin.outranks_or_is(UserRole::Teacher));
        assert!(UserRole::Admin.outranks_or_is(UserRole::Admin));
        assert!(UserRole::Teacher.outranks_or_is(UserRole::Student));
        assert!(!UserRole::Teacher.outranks_or_is(UserRole::Admin));
        assert!(!UserRole::Student.outranks_or_is(UserRole::Teacher));
    }

    #[test]
    fn test_can_teach() {
        assert!(UserRole::Teacher.can_teach());
        assert!(UserRole::Admin.can_teach());
        assert!(!UserRole::Student.can_teach());
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Teacher).unwrap(), "\"teacher\"");
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, UserRole::Admin);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Asha Rao".to_string(),
            email: "asha@example.edu".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: UserRole::Teacher,
            department: Some("Physics".to_string()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
        assert!(json.contains("asha@example.edu"));
    }

    #[test]
    fn test_update_user_default_is_noop() {
        let update = UpdateUser::default();
        assert!(update.name.is_none());
        assert!(update.role.is_none());
        assert!(update.is_active.is_none());
    }

    // Query behavior is covered by the API integration tests.
}
