use async_trait::async_trait;
use scholardesk_core::{AppResult, OwnerId, RecordId};
use scholardesk_domain::{RecordKind, StoredRecord};

/// Default page size used by list screens.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Query inputs for record listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordListQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
    /// Restricts results to starred records.
    pub favorites_only: bool,
    /// Case-insensitive title substring filter.
    pub search: Option<String>,
}

impl Default for RecordListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
            favorites_only: false,
            search: None,
        }
    }
}

impl RecordListQuery {
    /// Returns the trimmed, lowercased search needle when one is set.
    #[must_use]
    pub fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_lowercase)
    }

    /// Returns whether a stored row passes the favorite and search filters.
    #[must_use]
    pub fn matches(&self, record: &StoredRecord) -> bool {
        if self.favorites_only && !record.is_favorite() {
            return false;
        }

        self.search_needle().is_none_or(|needle| {
            record
                .title()
                .as_str()
                .to_lowercase()
                .contains(needle.as_str())
        })
    }
}

/// Generic row-store port for academic records.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Lists rows of one kind, newest write first.
    async fn list_records(
        &self,
        owner_id: OwnerId,
        kind: RecordKind,
        query: RecordListQuery,
    ) -> AppResult<Vec<StoredRecord>>;

    /// Finds one row by identifier.
    async fn find_record(
        &self,
        owner_id: OwnerId,
        kind: RecordKind,
        record_id: RecordId,
    ) -> AppResult<Option<StoredRecord>>;

    /// Inserts or replaces one row and returns the persisted version.
    async fn upsert_record(&self, owner_id: OwnerId, record: StoredRecord)
    -> AppResult<StoredRecord>;

    /// Deletes one row and returns false when nothing matched.
    async fn delete_record(
        &self,
        owner_id: OwnerId,
        kind: RecordKind,
        record_id: RecordId,
    ) -> AppResult<bool>;
}
