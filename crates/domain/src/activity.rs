use std::str::FromStr;

use chrono::NaiveDate;
use scholardesk_core::{AppError, AppResult, NonEmptyString, RecordId, normalize_optional_text};
use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordKind};

/// Progress status of a research activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    /// Not started yet.
    Planned,
    /// Currently being worked on.
    InProgress,
    /// Paused without being abandoned.
    OnHold,
    /// Finished.
    Completed,
}

impl ActivityStatus {
    /// Returns a stable storage value for the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for ActivityStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "planned" => Ok(Self::Planned),
            "in_progress" => Ok(Self::InProgress),
            "on_hold" => Ok(Self::OnHold),
            "completed" => Ok(Self::Completed),
            _ => Err(AppError::Validation(format!(
                "unknown activity status '{value}'"
            ))),
        }
    }
}

/// Input payload used to construct a validated research activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchActivityInput {
    /// Activity title.
    pub title: String,
    /// Free-form category such as "fieldwork" or "writing".
    pub category: String,
    /// Current progress status.
    pub status: ActivityStatus,
    /// Optional start date.
    pub starts_on: Option<NaiveDate>,
    /// Optional due date.
    pub due_on: Option<NaiveDate>,
    /// Optional notes.
    pub notes: Option<String>,
}

/// Planned or ongoing piece of research work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchActivity {
    id: RecordId,
    title: NonEmptyString,
    category: NonEmptyString,
    status: ActivityStatus,
    starts_on: Option<NaiveDate>,
    due_on: Option<NaiveDate>,
    notes: Option<String>,
    is_favorite: bool,
}

impl ResearchActivity {
    /// Creates a validated research activity.
    pub fn new(id: RecordId, input: ResearchActivityInput) -> AppResult<Self> {
        let ResearchActivityInput {
            title,
            category,
            status,
            starts_on,
            due_on,
            notes,
        } = input;

        if let (Some(starts_on), Some(due_on)) = (starts_on, due_on)
            && due_on < starts_on
        {
            return Err(AppError::Validation(format!(
                "due date {due_on} must not precede start date {starts_on}"
            )));
        }

        Ok(Self {
            id,
            title: NonEmptyString::new(title)?,
            category: NonEmptyString::new(category)?,
            status,
            starts_on,
            due_on,
            notes: normalize_optional_text(notes),
            is_favorite: false,
        })
    }

    /// Returns the activity category.
    #[must_use]
    pub fn category(&self) -> &NonEmptyString {
        &self.category
    }

    /// Returns the progress status.
    #[must_use]
    pub fn status(&self) -> ActivityStatus {
        self.status
    }

    /// Returns the start date.
    #[must_use]
    pub fn starts_on(&self) -> Option<NaiveDate> {
        self.starts_on
    }

    /// Returns the due date.
    #[must_use]
    pub fn due_on(&self) -> Option<NaiveDate> {
        self.due_on
    }

    /// Returns the notes.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the activity with a new status.
    #[must_use]
    pub fn with_status(mut self, status: ActivityStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns whether the activity is unfinished and past its due date.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != ActivityStatus::Completed && self.due_on.is_some_and(|due| due < today)
    }
}

impl Record for ResearchActivity {
    const KIND: RecordKind = RecordKind::ResearchActivity;

    fn id(&self) -> RecordId {
        self.id
    }

    fn title(&self) -> &str {
        self.title.as_str()
    }

    fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }
}
