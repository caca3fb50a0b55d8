use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scholardesk_application::{RecordListQuery, RecordRepository};
use scholardesk_core::{AppError, AppResult, OwnerId, RecordId};
use scholardesk_domain::{RecordKind, StoredRecord};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

/// PostgreSQL-backed record repository.
#[derive(Clone)]
pub struct PostgresRecordRepository {
    pool: PgPool,
}

impl PostgresRecordRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    kind: String,
    id: Uuid,
    title: String,
    is_favorite: bool,
    data: Value,
    updated_at: DateTime<Utc>,
}

impl RecordRow {
    fn into_stored(self, owner_id: OwnerId) -> AppResult<StoredRecord> {
        let kind = RecordKind::from_str(self.kind.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "persisted record '{}' in owner '{}' has invalid kind: {error}",
                self.id, owner_id
            ))
        })?;

        StoredRecord::new(
            kind,
            RecordId::from_uuid(self.id),
            self.title,
            self.is_favorite,
            self.data,
            self.updated_at,
        )
        .map_err(|error| {
            AppError::Internal(format!(
                "persisted {kind} record '{}' in owner '{}' is invalid: {error}",
                self.id, owner_id
            ))
        })
    }
}

#[async_trait]
impl RecordRepository for PostgresRecordRepository {
    async fn list_records(
        &self,
        owner_id: OwnerId,
        kind: RecordKind,
        query: RecordListQuery,
    ) -> AppResult<Vec<StoredRecord>> {
        let limit = i64::try_from(query.limit).map_err(|error| {
            AppError::Validation(format!("invalid record query limit: {error}"))
        })?;
        let offset = i64::try_from(query.offset).map_err(|error| {
            AppError::Validation(format!("invalid record query offset: {error}"))
        })?;

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT kind, id, title, is_favorite, data, updated_at FROM records WHERE owner_id = ",
        );
        builder.push_bind(owner_id.as_uuid());
        builder.push(" AND kind = ");
        builder.push_bind(kind.as_str());

        if query.favorites_only {
            builder.push(" AND is_favorite");
        }

        if let Some(needle) = query.search_needle() {
            builder.push(" AND strpos(lower(title), ");
            builder.push_bind(needle);
            builder.push(") > 0");
        }

        builder.push(" ORDER BY updated_at DESC, id LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder
            .build_query_as::<RecordRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to list {kind} records in owner '{owner_id}': {error}"
                ))
            })?;

        rows.into_iter()
            .map(|row| row.into_stored(owner_id))
            .collect()
    }

    async fn find_record(
        &self,
        owner_id: OwnerId,
        kind: RecordKind,
        record_id: RecordId,
    ) -> AppResult<Option<StoredRecord>> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT kind, id, title, is_favorite, data, updated_at
            FROM records
            WHERE owner_id = $1 AND kind = $2 AND id = $3
            "#,
        )
        .bind(owner_id.as_uuid())
        .bind(kind.as_str())
        .bind(record_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find {kind} record '{record_id}' in owner '{owner_id}': {error}"
            ))
        })?;

        row.map(|row| row.into_stored(owner_id)).transpose()
    }

    async fn upsert_record(
        &self,
        owner_id: OwnerId,
        record: StoredRecord,
    ) -> AppResult<StoredRecord> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
            INSERT INTO records (owner_id, kind, id, title, is_favorite, data, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (owner_id, kind, id) DO UPDATE
            SET title = EXCLUDED.title,
                is_favorite = EXCLUDED.is_favorite,
                data = EXCLUDED.data,
                updated_at = EXCLUDED.updated_at
            RETURNING kind, id, title, is_favorite, data, updated_at
            "#,
        )
        .bind(owner_id.as_uuid())
        .bind(record.kind().as_str())
        .bind(record.id().as_uuid())
        .bind(record.title().as_str())
        .bind(record.is_favorite())
        .bind(record.data())
        .bind(record.updated_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to save {} record '{}' in owner '{owner_id}': {error}",
                record.kind(),
                record.id()
            ))
        })?;

        row.into_stored(owner_id)
    }

    async fn delete_record(
        &self,
        owner_id: OwnerId,
        kind: RecordKind,
        record_id: RecordId,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM records
            WHERE owner_id = $1 AND kind = $2 AND id = $3
            "#,
        )
        .bind(owner_id.as_uuid())
        .bind(kind.as_str())
        .bind(record_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to delete {kind} record '{record_id}' in owner '{owner_id}': {error}"
            ))
        })?;

        let deleted = result.rows_affected() > 0;
        if !deleted {
            debug!(kind = kind.as_str(), record_id = %record_id, "delete matched no record");
        }

        Ok(deleted)
    }
}
