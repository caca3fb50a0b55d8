use std::collections::HashSet;

use scholardesk_core::{AppResult, NonEmptyString, RecordId, normalize_optional_text};
use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordKind};

/// Editorial stage of a literature review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Being written.
    Draft,
    /// Circulated for feedback.
    InReview,
    /// Signed off.
    Final,
}

/// Input payload used to construct a validated literature review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteratureReviewInput {
    /// Review title.
    pub title: String,
    /// Research question the review answers.
    pub research_question: String,
    /// Running summary.
    pub summary: Option<String>,
    /// Library references covered by the review.
    pub reference_ids: Vec<RecordId>,
    /// Editorial stage.
    pub status: ReviewStatus,
}

/// Literature review linking library references to a research question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteratureReview {
    id: RecordId,
    title: NonEmptyString,
    research_question: NonEmptyString,
    summary: Option<String>,
    reference_ids: Vec<RecordId>,
    status: ReviewStatus,
    is_favorite: bool,
}

impl LiteratureReview {
    /// Creates a validated literature review.
    pub fn new(id: RecordId, input: LiteratureReviewInput) -> AppResult<Self> {
        let mut seen = HashSet::new();
        let reference_ids = input
            .reference_ids
            .into_iter()
            .filter(|reference_id| seen.insert(*reference_id))
            .collect();

        Ok(Self {
            id,
            title: NonEmptyString::new(input.title)?,
            research_question: NonEmptyString::new(input.research_question)?,
            summary: normalize_optional_text(input.summary),
            reference_ids,
            status: input.status,
            is_favorite: false,
        })
    }

    /// Returns the research question.
    #[must_use]
    pub fn research_question(&self) -> &NonEmptyString {
        &self.research_question
    }

    /// Returns the running summary.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Returns linked library reference ids without duplicates.
    #[must_use]
    pub fn reference_ids(&self) -> &[RecordId] {
        &self.reference_ids
    }

    /// Returns the editorial stage.
    #[must_use]
    pub fn status(&self) -> ReviewStatus {
        self.status
    }

    /// Returns the review without links to the given reference.
    #[must_use]
    pub fn without_reference(mut self, reference_id: RecordId) -> Self {
        self.reference_ids.retain(|linked| *linked != reference_id);
        self
    }
}

impl Record for LiteratureReview {
    const KIND: RecordKind = RecordKind::LiteratureReview;

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
