use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use scholardesk_core::{AppError, AppResult, NonEmptyString, RecordId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kinds of academic records managed by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Planned or ongoing research work.
    ResearchActivity,
    /// Bibliographic library entry.
    LibraryReference,
    /// Talk, poster, or lecture given by the owner.
    Presentation,
    /// Question kept in the question bank.
    QuestionBankItem,
    /// Literature review in progress.
    LiteratureReview,
    /// Log entry for one teaching session.
    TeachingLog,
}

impl RecordKind {
    /// Every record kind in stable order.
    pub const ALL: [Self; 6] = [
        Self::ResearchActivity,
        Self::LibraryReference,
        Self::Presentation,
        Self::QuestionBankItem,
        Self::LiteratureReview,
        Self::TeachingLog,
    ];

    /// Returns a stable storage value for the record kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResearchActivity => "research_activity",
            Self::LibraryReference => "library_reference",
            Self::Presentation => "presentation",
            Self::QuestionBankItem => "question_bank_item",
            Self::LiteratureReview => "literature_review",
            Self::TeachingLog => "teaching_log",
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "research_activity" => Ok(Self::ResearchActivity),
            "library_reference" => Ok(Self::LibraryReference),
            "presentation" => Ok(Self::Presentation),
            "question_bank_item" => Ok(Self::QuestionBankItem),
            "literature_review" => Ok(Self::LiteratureReview),
            "teaching_log" => Ok(Self::TeachingLog),
            _ => Err(AppError::Validation(format!(
                "unknown record kind '{value}'"
            ))),
        }
    }
}

/// Typed academic record persisted through the generic row store.
pub trait Record:
    Clone + PartialEq + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Storage kind shared by every value of this type.
    const KIND: RecordKind;

    /// Returns the stable record identifier.
    fn id(&self) -> RecordId;

    /// Returns the title shown in list views.
    fn title(&self) -> &str;

    /// Returns whether the owner starred this record.
    fn is_favorite(&self) -> bool;

    /// Returns the record with its favorite flag replaced.
    #[must_use]
    fn with_favorite(self, is_favorite: bool) -> Self;
}

/// Row envelope exchanged with the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    kind: RecordKind,
    id: RecordId,
    title: NonEmptyString,
    is_favorite: bool,
    data: Value,
    updated_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Creates a validated row envelope.
    pub fn new(
        kind: RecordKind,
        id: RecordId,
        title: impl Into<String>,
        is_favorite: bool,
        data: Value,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        if !data.is_object() {
            return Err(AppError::Validation(format!(
                "stored {kind} record '{id}' data must be a JSON object"
            )));
        }

        Ok(Self {
            kind,
            id,
            title: NonEmptyString::new(title)?,
            is_favorite,
            data,
            updated_at,
        })
    }

    /// Serializes a typed record into a row envelope stamped with the current time.
    pub fn encode<R: Record>(record: &R) -> AppResult<Self> {
        let data = serde_json::to_value(record).map_err(|error| {
            AppError::Internal(format!(
                "failed to serialize {} record '{}': {error}",
                R::KIND,
                record.id()
            ))
        })?;

        Self::new(
            R::KIND,
            record.id(),
            record.title(),
            record.is_favorite(),
            data,
            Utc::now(),
        )
    }

    /// Deserializes the row envelope into a typed record.
    pub fn decode<R: Record>(&self) -> AppResult<R> {
        if self.kind != R::KIND {
            return Err(AppError::Validation(format!(
                "record '{}' is a {} record, expected {}",
                self.id,
                self.kind,
                R::KIND
            )));
        }

        let record: R = serde_json::from_value(self.data.clone()).map_err(|error| {
            AppError::Internal(format!(
                "persisted {} record '{}' is invalid: {error}",
                self.kind, self.id
            ))
        })?;

        if record.id() != self.id {
            return Err(AppError::Internal(format!(
                "persisted {} record '{}' carries mismatched id '{}'",
                self.kind,
                self.id,
                record.id()
            )));
        }

        Ok(record)
    }

    /// Returns the record kind.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Returns the record identifier.
    #[must_use]
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Returns the denormalized title.
    #[must_use]
    pub fn title(&self) -> &NonEmptyString {
        &self.title
    }

    /// Returns the denormalized favorite flag.
    #[must_use]
    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    /// Returns the record JSON document.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Returns the last write timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the envelope with a replaced write timestamp.
    #[must_use]
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }
}

/// Trims, lowercases, and deduplicates free-form tags, keeping first occurrences.
pub(crate) fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}
