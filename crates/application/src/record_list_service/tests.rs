use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use scholardesk_core::{AppError, AppResult, OwnerId, RecordId};
use scholardesk_domain::{
    LibraryReference, LibraryReferenceInput, Record, RecordKind, StoredRecord,
};

use super::RecordListService;
use crate::optimistic::MutationOutcome;
use crate::record_events::{RecordEvent, RecordEventBus};
use crate::record_ports::{RecordListQuery, RecordRepository};

#[derive(Default)]
struct FakeRecordRepository {
    rows: tokio::sync::Mutex<HashMap<RecordId, StoredRecord>>,
    rejected_writes: Mutex<HashSet<RecordId>>,
    list_delays: Mutex<VecDeque<Duration>>,
    fail_listing: Mutex<bool>,
}

impl FakeRecordRepository {
    async fn seed(&self, record: &LibraryReference, day: u32) {
        let updated_at = Utc
            .with_ymd_and_hms(2025, 3, day, 9, 0, 0)
            .single()
            .unwrap_or_else(|| unreachable!());
        let stored = StoredRecord::encode(record)
            .unwrap_or_else(|_| unreachable!())
            .with_updated_at(updated_at);
        self.rows.lock().await.insert(record.id(), stored);
    }

    async fn stored(&self, record_id: RecordId) -> Option<StoredRecord> {
        self.rows.lock().await.get(&record_id).cloned()
    }

    fn reject_writes_for(&self, record_id: RecordId) {
        if let Ok(mut rejected) = self.rejected_writes.lock() {
            rejected.insert(record_id);
        }
    }

    fn delay_next_list(&self, delay: Duration) {
        if let Ok(mut delays) = self.list_delays.lock() {
            delays.push_back(delay);
        }
    }

    fn fail_listing(&self) {
        if let Ok(mut fail) = self.fail_listing.lock() {
            *fail = true;
        }
    }

    fn is_rejected(&self, record_id: RecordId) -> bool {
        self.rejected_writes
            .lock()
            .map(|rejected| rejected.contains(&record_id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl RecordRepository for FakeRecordRepository {
    async fn list_records(
        &self,
        _owner_id: OwnerId,
        kind: RecordKind,
        query: RecordListQuery,
    ) -> AppResult<Vec<StoredRecord>> {
        let delay = self
            .list_delays
            .lock()
            .ok()
            .and_then(|mut delays| delays.pop_front());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_listing.lock().map(|fail| *fail).unwrap_or(false) {
            return Err(AppError::Internal("records table unavailable".to_owned()));
        }

        let mut rows: Vec<StoredRecord> = self
            .rows
            .lock()
            .await
            .values()
            .filter(|row| row.kind() == kind && query.matches(row))
            .cloned()
            .collect();
        rows.sort_by(|left, right| {
            right
                .updated_at()
                .cmp(&left.updated_at())
                .then_with(|| left.id().cmp(&right.id()))
        });

        Ok(rows.into_iter().skip(query.offset).take(query.limit).collect())
    }

    async fn find_record(
        &self,
        _owner_id: OwnerId,
        kind: RecordKind,
        record_id: RecordId,
    ) -> AppResult<Option<StoredRecord>> {
        Ok(self.stored(record_id).await.filter(|row| row.kind() == kind))
    }

    async fn upsert_record(
        &self,
        _owner_id: OwnerId,
        record: StoredRecord,
    ) -> AppResult<StoredRecord> {
        if self.is_rejected(record.id()) {
            return Err(AppError::Conflict(format!(
                "write rejected for '{}'",
                record.id()
            )));
        }

        self.rows.lock().await.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn delete_record(
        &self,
        _owner_id: OwnerId,
        _kind: RecordKind,
        record_id: RecordId,
    ) -> AppResult<bool> {
        Ok(self.rows.lock().await.remove(&record_id).is_some())
    }
}

fn reference(title: &str) -> LibraryReference {
    LibraryReference::new(
        RecordId::new(),
        LibraryReferenceInput {
            title: title.to_owned(),
            authors: vec!["Ada Lovelace".to_owned()],
            year: Some(1843),
            venue: None,
            doi: None,
            tags: Vec::new(),
        },
    )
    .unwrap_or_else(|_| unreachable!())
}

fn service(
    repository: &Arc<FakeRecordRepository>,
) -> RecordListService<LibraryReference> {
    let repository: Arc<dyn RecordRepository> = repository.clone();
    RecordListService::new(OwnerId::new(), repository, Duration::from_secs(5))
}

fn titles(records: &[LibraryReference]) -> Vec<&str> {
    records.iter().map(Record::title).collect()
}

async fn seeded() -> (Arc<FakeRecordRepository>, Vec<LibraryReference>) {
    let repository = Arc::new(FakeRecordRepository::default());
    let records = vec![
        reference("Sketch of the Analytical Engine"),
        reference("Notes on Bernoulli numbers"),
        reference("On computable numbers"),
    ];
    for (index, record) in records.iter().enumerate() {
        let day = u32::try_from(10 - index).unwrap_or_else(|_| unreachable!());
        repository.seed(record, day).await;
    }
    (repository, records)
}

#[tokio::test]
async fn refresh_shows_newest_records_first() {
    let (repository, _records) = seeded().await;
    let service = service(&repository);

    assert!(service.refresh(RecordListQuery::default()).await.is_ok());

    assert_eq!(
        titles(&service.items()),
        vec![
            "Sketch of the Analytical Engine",
            "Notes on Bernoulli numbers",
            "On computable numbers",
        ]
    );
    assert!(!service.is_loading());
    assert_eq!(service.last_error(), None);
}

#[tokio::test(start_paused = true)]
async fn newer_refresh_replaces_slower_one() {
    let (repository, _records) = seeded().await;
    let service = service(&repository);
    repository.delay_next_list(Duration::from_millis(500));

    let slow = service.refresh(RecordListQuery::default());
    tokio::task::yield_now().await;
    let fast = service.refresh(RecordListQuery {
        search: Some("NUMBERS".to_owned()),
        ..RecordListQuery::default()
    });

    assert!(fast.await.is_ok());
    assert!(slow.await.is_ok());
    tokio::time::advance(Duration::from_secs(1)).await;

    assert_eq!(
        titles(&service.items()),
        vec!["Notes on Bernoulli numbers", "On computable numbers"]
    );
}

#[tokio::test]
async fn failed_refresh_keeps_items_and_records_error() {
    let (repository, _records) = seeded().await;
    let service = service(&repository);
    assert!(service.refresh(RecordListQuery::default()).await.is_ok());

    repository.fail_listing();
    assert!(service.refresh(RecordListQuery::default()).await.is_ok());

    assert_eq!(service.items().len(), 3);
    assert_eq!(
        service.last_error().as_deref(),
        Some("internal error: records table unavailable")
    );
}

#[tokio::test]
async fn favorite_toggle_persists_and_publishes() {
    let (repository, records) = seeded().await;
    let bus = RecordEventBus::default();
    let service = service(&repository).with_event_bus(bus.clone());
    let mut events = bus
        .subscribe::<LibraryReference>()
        .unwrap_or_else(|_| unreachable!());
    assert!(service.refresh(RecordListQuery::default()).await.is_ok());

    let target = records[1].id();
    let outcome = service.set_favorite(&[target], true).await;

    assert_eq!(outcome, MutationOutcome::Committed);
    let favorites: Vec<bool> = service.items().iter().map(Record::is_favorite).collect();
    assert_eq!(favorites, vec![false, true, false]);
    assert!(
        repository
            .stored(target)
            .await
            .is_some_and(|row| row.is_favorite())
    );

    let event = events.recv().await;
    assert_eq!(event.map(|event| event.record_id()), Some(target));
}

#[tokio::test]
async fn rejected_favorite_rolls_back_whole_batch() {
    let (repository, records) = seeded().await;
    let service = service(&repository);
    assert!(service.refresh(RecordListQuery::default()).await.is_ok());
    let before = service.items();

    repository.reject_writes_for(records[2].id());
    let outcome = service
        .set_favorite(&[records[0].id(), records[2].id()], true)
        .await;

    assert_eq!(outcome, MutationOutcome::RolledBack);
    assert_eq!(service.items(), before);
    assert!(!service.is_syncing());
    assert!(
        service
            .last_error()
            .is_some_and(|message| message.starts_with("conflict: write rejected"))
    );
}

#[tokio::test]
async fn include_appends_stored_records_beyond_the_page() {
    let (repository, records) = seeded().await;
    let service = service(&repository);
    let first_page = RecordListQuery {
        limit: 1,
        ..RecordListQuery::default()
    };
    assert!(service.refresh(first_page).await.is_ok());

    let unknown = RecordId::new();
    let missing = service
        .include(&[records[0].id(), records[2].id(), records[2].id(), unknown])
        .await;

    assert_eq!(missing.ok(), Some(vec![unknown]));
    assert_eq!(
        titles(&service.items()),
        vec!["Sketch of the Analytical Engine", "On computable numbers"]
    );

    let outcome = service.set_favorite(&[records[2].id()], true).await;
    assert_eq!(outcome, MutationOutcome::Committed);
    assert!(
        repository
            .stored(records[2].id())
            .await
            .is_some_and(|row| row.is_favorite())
    );
}

#[tokio::test]
async fn delete_of_missing_row_restores_the_list() {
    let (repository, records) = seeded().await;
    let service = service(&repository);
    assert!(service.refresh(RecordListQuery::default()).await.is_ok());

    let outcome = service.delete(&[records[0].id(), records[0].id()]).await;
    assert_eq!(outcome, MutationOutcome::Committed);
    assert!(repository.stored(records[0].id()).await.is_none());
    let before = service.items();
    assert_eq!(before.len(), 2);

    let removed = repository
        .delete_record(OwnerId::new(), RecordKind::LibraryReference, records[1].id())
        .await;
    assert!(matches!(removed, Ok(true)));

    let outcome = service.delete(&[records[1].id()]).await;
    assert_eq!(outcome, MutationOutcome::RolledBack);
    assert_eq!(service.items(), before);
    assert!(service.last_error().is_some_and(|message| message.contains("delete")));
}

#[tokio::test]
async fn saved_record_reaches_other_following_lists() {
    let (repository, _records) = seeded().await;
    let bus = RecordEventBus::default();
    let editor = service(&repository).with_event_bus(bus.clone());
    let viewer = service(&repository).with_event_bus(bus.clone());
    assert!(viewer.refresh(RecordListQuery::default()).await.is_ok());
    assert!(viewer.follow_events().is_ok());

    let saved = editor.save(reference("Lectures on dynamic programming")).await;
    let saved = saved.unwrap_or_else(|_| unreachable!());
    assert_eq!(editor.items(), vec![saved.clone()]);

    for _ in 0..100 {
        if viewer.items().len() == 4 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(viewer.items().first(), Some(&saved));

    assert!(bus.publish::<LibraryReference>(RecordEvent::Deleted(saved.id())).is_ok());
    for _ in 0..100 {
        if viewer.items().len() == 3 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(viewer.items().iter().all(|record| record.id() != saved.id()));
}

#[tokio::test]
async fn following_requires_an_event_bus() {
    let repository = Arc::new(FakeRecordRepository::default());
    let service = service(&repository);

    assert!(matches!(
        service.follow_events(),
        Err(AppError::Validation(_))
    ));
}
