/// Database layer for TeamTask
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool (eager or lazy) with health checks
/// - `migrations`: embedded migration runner
///
/// Queries live on the models; the `store` module wraps them behind the
/// `Store` trait.

pub mod migrations;
pub mod pool;
