use super::Database;
use crate::errors::FinAgentsError;
use crate::Result;

const REQUIRED_TABLES: [&str; 2] = ["collections", "passages"];

impl Database {
    /// Check if database schema is initialized
    /// Returns true if all required tables exist
    pub async fn is_schema_initialized(&self) -> Result<bool> {
        for table_name in REQUIRED_TABLES {
            let exists = sqlx::query_scalar::<_, bool>(
                r"
                SELECT EXISTS (
                    SELECT FROM information_schema.tables
                    WHERE table_schema = 'public'
                    AND table_name = $1
                )
                ",
            )
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;

            if !exists {
                tracing::debug!("Missing required table: {}", table_name);
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Verify database schema or return helpful error
    pub async fn verify_schema_or_error(&self) -> Result<()> {
        if !self.is_schema_initialized().await? {
            return Err(FinAgentsError::StoreError(
                "Database schema not initialized. Run `finagents init` first.".to_string(),
            ));
        }
        Ok(())
    }

    /// Stored vector width, if the schema exists
    pub async fn stored_dimension(&self) -> Result<Option<usize>> {
        let dimension = sqlx::query_scalar::<_, i32>(
            r"
            SELECT atttypmod FROM pg_attribute
            WHERE attrelid = to_regclass('public.passages')
            AND attname = 'embedding'
            ",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(dimension.filter(|d| *d > 0).map(|d| d as usize))
    }

    /// Initialize database schema
    ///
    /// Creates the pgvector extension, the `collections` and `passages`
    /// tables and, when enabled, an ivfflat cosine index on passage vectors.
    pub async fn init_schema(&self, config: &crate::config::AppConfig) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS collections (
                collection_key TEXT PRIMARY KEY,
                embedding_model TEXT NOT NULL,
                dimension INTEGER NOT NULL,
                passage_count BIGINT NOT NULL DEFAULT 0,
                document_count BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        let dimension = config.embedding_dimension();
        if let Some(existing) = self.stored_dimension().await? {
            if existing != dimension {
                return Err(FinAgentsError::StoreError(format!(
                    "passages.embedding is vector({existing}) but embeddings.dimension is {dimension}"
                )));
            }
        }

        // Dimension is a validated integer, not user text
        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS passages (
                collection_key TEXT NOT NULL REFERENCES collections(collection_key) ON DELETE CASCADE,
                passage_id TEXT NOT NULL,
                document_id TEXT NOT NULL,
                source_url TEXT NOT NULL,
                sequence_index INTEGER NOT NULL,
                page INTEGER NOT NULL,
                text TEXT NOT NULL,
                token_count INTEGER NOT NULL,
                embedding VECTOR({dimension}) NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                PRIMARY KEY (collection_key, passage_id)
            )
            "
        ))
        .execute(&self.pool)
        .await?;

        self.create_indexes(config).await?;

        tracing::info!("Schema initialized (vector dimension {})", dimension);
        Ok(())
    }

    async fn create_indexes(&self, config: &crate::config::AppConfig) -> Result<()> {
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_passages_document ON passages(collection_key, document_id)",
        )
        .execute(&self.pool)
        .await?;

        if config.vector_indexes_enabled() {
            let lists = config.vector_index_lists().max(1);
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_passages_embedding ON passages \
                 USING ivfflat (embedding vector_cosine_ops) WITH (lists = {lists})"
            ))
            .execute(&self.pool)
            .await?;
        }

        tracing::debug!("Passage indexes ensured");
        Ok(())
    }
}
