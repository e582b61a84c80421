/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use rollcall_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use rollcall_shared::auth::{context::AuthContext, jwt};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into each handler via `State`
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// JWT signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
///
/// ```text
/// /
/// ├── /health                          # public
/// └── /api
///     ├── /auth
///     │   ├── POST /register           # public (privileged roles need admin token)
///     │   ├── POST /login              # public
///     │   ├── POST /refresh            # public
///     │   └── GET  /me                 # authenticated
///     ├── /users                       # admin
///     ├── /students                    # authenticated, writes role-gated
///     ├── /subjects                    # authenticated, writes admin
///     ├── /attendance                  # authenticated, marking teacher+
///     │   └── /report/...              # aggregate reports
///     └── /dashboard/summary           # teacher+
/// ```
///
/// Middleware stack: request tracing, CORS, and a per-group JWT layer that
/// validates the bearer token and injects [`AuthContext`].
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public: register/login/refresh validate credentials themselves
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let auth_protected = Router::new()
        .route("/me", get(routes::auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/:id", get(routes::users::get_user))
        .route("/:id", put(routes::users::update_user))
        .route("/:id", delete(routes::users::delete_user))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let student_routes = Router::new()
        .route("/", get(routes::students::list_students))
        .route("/", post(routes::students::create_student))
        .route("/:id", get(routes::students::get_student))
        .route("/:id", put(routes::students::update_student))
        .route("/:id", delete(routes::students::delete_student))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let subject_routes = Router::new()
        .route("/", get(routes::subjects::list_subjects))
        .route("/", post(routes::subjects::create_subject))
        .route("/:id", get(routes::subjects::get_subject))
        .route("/:id", put(routes::subjects::update_subject))
        .route("/:id", delete(routes::subjects::delete_subject))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let attendance_routes = Router::new()
        .route("/", post(routes::attendance::mark_attendance))
        .route("/bulk", post(routes::attendance::mark_attendance_bulk))
        .route("/", get(routes::attendance::list_attendance))
        .route("/:id", put(routes::attendance::update_attendance))
        .route("/:id", delete(routes::attendance::delete_attendance))
        .route(
            "/report/student/:id",
            get(routes::attendance::student_report),
        )
        .route(
            "/report/subject/:id",
            get(routes::attendance::subject_report),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let dashboard_routes = Router::new()
        .route("/summary", get(routes::dashboard::summary))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_public.merge(auth_protected))
        .nest("/users", user_routes)
        .nest("/students", student_routes)
        .nest("/subjects", subject_routes)
        .nest("/attendance", attendance_routes)
        .nest("/dashboard", dashboard_routes);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware
///
/// Validates the bearer token from the Authorization header and injects an
/// [`AuthContext`] into request extensions. Only access tokens pass.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::Unauthorized("Expected Bearer token".to_string())
    })?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    req.extensions_mut()
        .insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}
