use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{DocumentStore, StoreError};
use crate::config::StoreConfig;
use crate::query::Query;
use crate::state::{Markable, MarkableState, Marks, StateName};

/// Postgres document store.
///
/// Documents live in one `documents` table keyed by `(document_type, id)`.
/// The document body and its marks are separate JSONB columns so that
/// marks can be updated and queried (`marks @> …`) without rewriting the
/// body.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    body: Json<serde_json::Value>,
    marks: Json<Marks>,
}

impl DocumentRow {
    fn into_document<D: Markable + DeserializeOwned>(self) -> Result<D, StoreError> {
        let mut doc: D = serde_json::from_value(self.body.0)?;
        *doc.marks_mut() = self.marks.0;
        Ok(doc)
    }
}

impl PgDocumentStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the `documents` table if needed.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.into()))
    }

    /// Inserts or replaces a document, including its current marks.
    ///
    /// States already flagged in the stored row are kept, so writing back a
    /// stale copy cannot clear a recorded mark.
    pub async fn insert<D>(&self, doc_type: &str, doc: &D) -> Result<(), StoreError>
    where
        D: Markable + Serialize,
        D::Id: Into<Uuid>,
    {
        let body = serde_json::to_value(doc)?;
        let id: Uuid = doc.id().into();
        sqlx::query(
            r#"
            INSERT INTO documents (document_type, id, body, marks)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (document_type, id) DO UPDATE
            SET body = EXCLUDED.body,
                marks = EXCLUDED.marks || COALESCE(
                    (
                        SELECT jsonb_object_agg(flagged.key, flagged.value)
                        FROM jsonb_each(documents.marks) AS flagged
                        WHERE flagged.value @> '{"flag": true}'::jsonb
                    ),
                    '{}'::jsonb
                ),
                updated_at = NOW()
            "#,
        )
        .bind(doc_type)
        .bind(id)
        .bind(Json(body))
        .bind(Json(doc.marks().clone()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id<D>(&self, doc_type: &str, id: D::Id) -> Result<Option<D>, StoreError>
    where
        D: Markable + DeserializeOwned,
        D::Id: Into<Uuid>,
    {
        let id: Uuid = id.into();
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT body, marks FROM documents WHERE document_type = $1 AND id = $2",
        )
        .bind(doc_type)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DocumentRow::into_document::<D>).transpose()
    }

    /// Documents of the query's type matching all of its filters.
    pub async fn find<D>(&self, query: &Query) -> Result<Vec<D>, StoreError>
    where
        D: Markable + DeserializeOwned,
    {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT body, marks FROM documents
            WHERE document_type = $1 AND marks @> $2
            ORDER BY created_at
            "#,
        )
        .bind(query.doc_type())
        .bind(Json(query.containment()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(DocumentRow::into_document::<D>)
            .collect()
    }
}

#[async_trait]
impl<D> DocumentStore<D> for PgDocumentStore
where
    D: Markable,
    D::Id: Into<Uuid>,
{
    async fn update_mark(
        &self,
        doc_type: &str,
        id: &D::Id,
        state: &StateName,
        mark: &MarkableState,
    ) -> Result<(), StoreError> {
        let uuid: Uuid = id.clone().into();

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET
                marks = jsonb_set(marks, ARRAY[$3::text], $4, true),
                updated_at = NOW()
            WHERE document_type = $1
              AND id = $2
              AND NOT marks @> jsonb_build_object($3::text, jsonb_build_object('flag', true))
            "#,
        )
        .bind(doc_type)
        .bind(uuid)
        .bind(state.as_str())
        .bind(Json(mark.clone()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            debug!(document_type = doc_type, document_id = %id, state = %state, "mark stored");
            return Ok(());
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE document_type = $1 AND id = $2)",
        )
        .bind(doc_type)
        .bind(uuid)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            Err(StoreError::Conflict {
                id: id.to_string(),
                state: state.clone(),
            })
        } else {
            Err(StoreError::NotFound { id: id.to_string() })
        }
    }
}
