use std::collections::HashMap;

use async_trait::async_trait;
use scholardesk_application::{RecordListQuery, RecordRepository};
use scholardesk_core::{AppResult, OwnerId, RecordId};
use scholardesk_domain::{RecordKind, StoredRecord};
use tokio::sync::RwLock;

type RecordKey = (OwnerId, RecordKind, RecordId);

/// In-memory record repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryRecordRepository {
    records: RwLock<HashMap<RecordKey, StoredRecord>>,
}

impl InMemoryRecordRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RecordRepository for InMemoryRecordRepository {
    async fn list_records(
        &self,
        owner_id: OwnerId,
        kind: RecordKind,
        query: RecordListQuery,
    ) -> AppResult<Vec<StoredRecord>> {
        let records = self.records.read().await;

        let mut values: Vec<StoredRecord> = records
            .iter()
            .filter_map(|((stored_owner_id, stored_kind, _), record)| {
                (stored_owner_id == &owner_id && stored_kind == &kind && query.matches(record))
                    .then(|| record.clone())
            })
            .collect();
        values.sort_by(|left, right| {
            right
                .updated_at()
                .cmp(&left.updated_at())
                .then_with(|| left.id().cmp(&right.id()))
        });

        Ok(values
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn find_record(
        &self,
        owner_id: OwnerId,
        kind: RecordKind,
        record_id: RecordId,
    ) -> AppResult<Option<StoredRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(&(owner_id, kind, record_id))
            .cloned())
    }

    async fn upsert_record(
        &self,
        owner_id: OwnerId,
        record: StoredRecord,
    ) -> AppResult<StoredRecord> {
        self.records
            .write()
            .await
            .insert((owner_id, record.kind(), record.id()), record.clone());

        Ok(record)
    }

    async fn delete_record(
        &self,
        owner_id: OwnerId,
        kind: RecordKind,
        record_id: RecordId,
    ) -> AppResult<bool> {
        Ok(self
            .records
            .write()
            .await
            .remove(&(owner_id, kind, record_id))
            .is_some())
    }
}
