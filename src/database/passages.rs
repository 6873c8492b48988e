use async_trait::async_trait;
use pgvector::Vector;

use super::collections::CollectionRow;
use super::collections::COLLECTION_COLUMNS;
use super::Database;
use crate::models::CollectionInfo;
use crate::models::Passage;
use crate::models::PassageBatch;
use crate::models::RetrievedPassage;
use crate::store::check_pin;
use crate::store::validate_batch;
use crate::store::validate_k;
use crate::store::VectorStore;
use crate::Result;

#[derive(sqlx::FromRow)]
struct PassageRow {
    passage_id: String,
    collection_key: String,
    document_id: String,
    source_url: String,
    sequence_index: i32,
    page: i32,
    text: String,
    token_count: i32,
    similarity: f64, // PostgreSQL returns FLOAT8 from the distance operator
}

impl From<PassageRow> for RetrievedPassage {
    fn from(row: PassageRow) -> Self {
        Self {
            passage: Passage {
                passage_id: row.passage_id,
                collection_key: row.collection_key,
                document_id: row.document_id,
                source_url: row.source_url,
                sequence_index: row.sequence_index as u32,
                page: row.page as u32,
                text: row.text,
                token_count: row.token_count as u32,
                embedding: Vec::new(),
            },
            score: row.similarity as f32,
        }
    }
}

impl Database {
    /// Write one document's passages in a single transaction
    ///
    /// The transaction holds an advisory lock on the collection key, so
    /// concurrent writers to one collection commit one after another.
    pub async fn store_passage_batch(&self, batch: &PassageBatch) -> Result<usize> {
        validate_batch(batch)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&batch.collection_key)
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_as::<_, CollectionRow>(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections WHERE collection_key = $1"
        ))
        .bind(&batch.collection_key)
        .fetch_optional(&mut *tx)
        .await?;

        match existing {
            Some(row) => {
                check_pin(
                    &CollectionInfo::from(row),
                    &batch.embedding_model,
                    batch.dimension,
                )?;
            }
            None => {
                sqlx::query(
                    r"
                    INSERT INTO collections (collection_key, embedding_model, dimension)
                    VALUES ($1, $2, $3)
                    ",
                )
                .bind(&batch.collection_key)
                .bind(&batch.embedding_model)
                .bind(batch.dimension as i32)
                .execute(&mut *tx)
                .await?;
            }
        }

        // Re-ingesting a document replaces all of its previous passages
        sqlx::query("DELETE FROM passages WHERE collection_key = $1 AND document_id = $2")
            .bind(&batch.collection_key)
            .bind(&batch.document_id)
            .execute(&mut *tx)
            .await?;

        for passage in &batch.passages {
            sqlx::query(
                r"
                INSERT INTO passages
                (collection_key, passage_id, document_id, source_url, sequence_index,
                 page, text, token_count, embedding)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ",
            )
            .bind(&passage.collection_key)
            .bind(&passage.passage_id)
            .bind(&passage.document_id)
            .bind(&passage.source_url)
            .bind(passage.sequence_index as i32)
            .bind(passage.page as i32)
            .bind(&passage.text)
            .bind(passage.token_count as i32)
            .bind(Vector::from(passage.embedding.clone()))
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r"
            UPDATE collections SET
                passage_count = (SELECT COUNT(*) FROM passages WHERE collection_key = $1),
                document_count = (SELECT COUNT(DISTINCT document_id) FROM passages WHERE collection_key = $1),
                updated_at = NOW()
            WHERE collection_key = $1
            ",
        )
        .bind(&batch.collection_key)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            collection = %batch.collection_key,
            document = %batch.document_id,
            count = batch.passages.len(),
            "upserted passages to pgvector"
        );
        Ok(batch.passages.len())
    }

    /// Cosine similarity search within one collection
    pub async fn search_passages(
        &self,
        collection_key: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        validate_k(k)?;

        let mut tx = self.pool.begin().await?;

        // Scan every ivfflat list; with the default of one list the
        // collection filter runs after the approximate scan and can drop rows
        sqlx::query(&format!("SET LOCAL ivfflat.probes = {}", self.search_probes))
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query_as::<_, PassageRow>(
            r"
            SELECT
                passage_id, collection_key, document_id, source_url,
                sequence_index, page, text, token_count,
                1 - (embedding <=> $2) AS similarity
            FROM passages
            WHERE collection_key = $1
            ORDER BY embedding <=> $2, document_id, sequence_index
            LIMIT $3
            ",
        )
        .bind(collection_key)
        .bind(Vector::from(query_embedding.to_vec()))
        .bind(k as i64)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(rows.into_iter().map(RetrievedPassage::from).collect())
    }
}

#[async_trait]
impl VectorStore for Database {
    async fn upsert(&self, batch: &PassageBatch) -> Result<usize> {
        self.store_passage_batch(batch).await
    }

    async fn similarity_search(
        &self,
        collection_key: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        self.search_passages(collection_key, query_embedding, k).await
    }

    async fn collection(&self, collection_key: &str) -> Result<Option<CollectionInfo>> {
        self.get_collection(collection_key).await
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        self.list_collection_infos().await
    }

    async fn delete_collection(&self, collection_key: &str) -> Result<bool> {
        self.remove_collection(collection_key).await
    }
}
