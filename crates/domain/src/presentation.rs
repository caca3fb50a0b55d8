use chrono::NaiveDate;
use scholardesk_core::{AppError, AppResult, NonEmptyString, RecordId, normalize_optional_text};
use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordKind};

/// Format of a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationFormat {
    /// Conference or workshop talk.
    Talk,
    /// Poster session.
    Poster,
    /// Invited seminar.
    Seminar,
    /// Course lecture.
    Lecture,
}

/// Input payload used to construct a validated presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationInput {
    /// Presentation title.
    pub title: String,
    /// Event or venue name.
    pub event_name: String,
    /// Presentation format.
    pub format: PresentationFormat,
    /// Date it was (or will be) given.
    pub presented_on: Option<NaiveDate>,
    /// Optional link to the slides.
    pub slides_url: Option<String>,
}

/// Talk, poster, seminar, or lecture given by the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    id: RecordId,
    title: NonEmptyString,
    event_name: NonEmptyString,
    format: PresentationFormat,
    presented_on: Option<NaiveDate>,
    slides_url: Option<String>,
    is_favorite: bool,
}

impl Presentation {
    /// Creates a validated presentation.
    pub fn new(id: RecordId, input: PresentationInput) -> AppResult<Self> {
        let slides_url = normalize_optional_text(input.slides_url);
        if let Some(url) = slides_url.as_deref()
            && !(url.starts_with("https://") || url.starts_with("http://"))
        {
            return Err(AppError::Validation(format!(
                "slides url '{url}' must be an http(s) link"
            )));
        }

        Ok(Self {
            id,
            title: NonEmptyString::new(input.title)?,
            event_name: NonEmptyString::new(input.event_name)?,
            format: input.format,
            presented_on: input.presented_on,
            slides_url,
            is_favorite: false,
        })
    }

    /// Returns the event name.
    #[must_use]
    pub fn event_name(&self) -> &NonEmptyString {
        &self.event_name
    }

    /// Returns the presentation format.
    #[must_use]
    pub fn format(&self) -> PresentationFormat {
        self.format
    }

    /// Returns the presentation date.
    #[must_use]
    pub fn presented_on(&self) -> Option<NaiveDate> {
        self.presented_on
    }

    /// Returns the slides link.
    #[must_use]
    pub fn slides_url(&self) -> Option<&str> {
        self.slides_url.as_deref()
    }
}

impl Record for Presentation {
    const KIND: RecordKind = RecordKind::Presentation;

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
