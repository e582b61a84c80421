/// Shared infrastructure for integration tests
///
/// Tests run against a real PostgreSQL database named by `DATABASE_URL`.
/// When the variable is not set, `TestContext::new` returns `None` and each
/// test skips itself, so the unit-test suite stays runnable anywhere.
use axum::{
    body::Body,
    http::{Request, Response},
};
use rollcall_api::app::{build_router, AppState};
use rollcall_api::config::Config;
use rollcall_shared::auth::jwt::{create_token, Claims, TokenType};
use rollcall_shared::auth::password::hash_password;
use rollcall_shared::models::student::{CreateStudent, Student};
use rollcall_shared::models::subject::{CreateSubject, Subject};
use rollcall_shared::models::user::{CreateUser, User, UserRole};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

/// Password used for every account created by the test helpers
pub const TEST_PASSWORD: &str = "classpass123";

/// Test context: a router wired to a real database plus an admin identity
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub admin: User,
    pub admin_token: String,
}

impl TestContext {
    /// Builds the context, or returns `None` when `DATABASE_URL` is not set
    pub async fn new() -> anyhow::Result<Option<Self>> {
        if std::env::var("DATABASE_URL").is_err() {
            eprintln!("DATABASE_URL not set; skipping integration test");
            return Ok(None);
        }

        // The secret only needs to be consistent within the process
        if std::env::var("JWT_SECRET").is_err() {
            std::env::set_var(
                "JWT_SECRET",
                "integration-test-secret-at-least-32-bytes",
            );
        }

        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;
        sqlx::migrate!("../migrations").run(&db).await?;

        let admin = create_user(&db, UserRole::Admin).await?;
        let admin_token = token_for(&admin, &config.jwt.secret)?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(Some(TestContext {
            db,
            app,
            config,
            admin,
            admin_token,
        }))
    }

    /// Sends a request through the router and returns the raw response
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Issues an access token for an arbitrary user
    pub fn token_for(&self, user: &User) -> String {
        token_for(user, &self.config.jwt.secret).unwrap()
    }
}

/// Reads a response body as JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Short unique suffix for emails, roll numbers, and codes
pub fn unique() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// Creates a user with [`TEST_PASSWORD`] directly in the database
pub async fn create_user(db: &PgPool, role: UserRole) -> anyhow::Result<User> {
    let user = User::create(
        db,
        CreateUser {
            name: format!("Test {}", role.as_str()),
            email: format!("{}-{}@example.edu", role.as_str(), unique()),
            password_hash: hash_password(TEST_PASSWORD)?,
            role,
            department: None,
        },
    )
    .await?;
    Ok(user)
}

/// Creates a roster row in the given department
pub async fn create_student_row(db: &PgPool, department: &str) -> anyhow::Result<Student> {
    let suffix = unique();
    let student = Student::create(
        db,
        CreateStudent {
            name: format!("Student {}", suffix),
            email: format!("student-{}@example.edu", suffix),
            roll_number: format!("R-{}", suffix),
            department: department.to_string(),
            year: 2,
            section: Some("A".to_string()),
        },
    )
    .await?;
    Ok(student)
}

/// Creates a subject taught by the given user
pub async fn create_subject_row(
    db: &PgPool,
    teacher_id: Option<Uuid>,
) -> anyhow::Result<Subject> {
    let suffix = unique();
    let subject = Subject::create(
        db,
        CreateSubject {
            name: format!("Subject {}", suffix),
            code: format!("SUB-{}", suffix),
            department: "Testing".to_string(),
            teacher_id,
            credits: 4,
        },
    )
    .await?;
    Ok(subject)
}

fn token_for(user: &User, secret: &str) -> anyhow::Result<String> {
    let claims = Claims::new(user.id, user.role, TokenType::Access);
    Ok(create_token(&claims, secret)?)
}
