use chrono::DateTime;
use chrono::Utc;

use super::Database;
use crate::models::CollectionInfo;
use crate::Result;

#[derive(sqlx::FromRow)]
pub(super) struct CollectionRow {
    collection_key: String,
    embedding_model: String,
    dimension: i32,
    passage_count: i64,
    document_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CollectionRow> for CollectionInfo {
    fn from(row: CollectionRow) -> Self {
        Self {
            collection_key: row.collection_key,
            embedding_model: row.embedding_model,
            dimension: row.dimension as usize,
            passage_count: row.passage_count as u64,
            document_count: row.document_count as u64,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(super) const COLLECTION_COLUMNS: &str = "collection_key, embedding_model, dimension, \
     passage_count, document_count, created_at, updated_at";

impl Database {
    /// Get one collection's bookkeeping row
    pub async fn get_collection(&self, collection_key: &str) -> Result<Option<CollectionInfo>> {
        let row = sqlx::query_as::<_, CollectionRow>(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections WHERE collection_key = $1"
        ))
        .bind(collection_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CollectionInfo::from))
    }

    /// List all collections by key
    pub async fn list_collection_infos(&self) -> Result<Vec<CollectionInfo>> {
        let rows = sqlx::query_as::<_, CollectionRow>(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections ORDER BY collection_key"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CollectionInfo::from).collect())
    }

    /// Delete a collection; its passages go with it (ON DELETE CASCADE)
    pub async fn remove_collection(&self, collection_key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM collections WHERE collection_key = $1")
            .bind(collection_key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
