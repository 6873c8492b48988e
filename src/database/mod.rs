use sqlx::PgPool;

use crate::Result;

mod collections;
mod passages;
mod schema;

/// Database connection pool wrapper
///
/// Implements [`crate::store::VectorStore`] over PostgreSQL with pgvector.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
    /// ivfflat lists scanned per query; equal to the index's list count so
    /// the collection filter never starves the `LIMIT`
    search_probes: usize,
}

/// The PostgreSQL-backed vector store
pub type PgVectorStore = Database;

impl Database {
    #[must_use]
    pub const fn new(pool: PgPool, search_probes: usize) -> Self {
        Self {
            pool,
            search_probes,
        }
    }

    /// Create a new database instance from configuration
    pub async fn from_config(config: &crate::config::AppConfig) -> Result<Self> {
        let pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections())
            .min_connections(config.min_connections())
            .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout()));

        let pool = pool_options.connect(config.database_url()).await?;

        tracing::info!(
            "Database pool configured: max_connections={}, min_connections={}",
            config.max_connections(),
            config.min_connections()
        );

        Ok(Self::new(pool, config.vector_index_lists().max(1)))
    }

    /// Get a reference to the database pool for raw queries
    #[must_use]
    pub const fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}
