/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: embedded migration runner (`migrations/` at the workspace root)
pub mod migrations;
pub mod pool;
