use scholardesk_core::{AppResult, NonEmptyString, RecordId, normalize_optional_text};
use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordKind, normalize_tags};

/// Difficulty rating of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionDifficulty {
    /// Recall-level question.
    Easy,
    /// Application-level question.
    Medium,
    /// Synthesis-level question.
    Hard,
}

/// Input payload used to construct a validated question bank item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBankItemInput {
    /// Question prompt, also used as the list title.
    pub prompt: String,
    /// Optional model answer.
    pub answer: Option<String>,
    /// Difficulty rating.
    pub difficulty: QuestionDifficulty,
    /// Topic tags.
    pub topics: Vec<String>,
}

/// Question kept in the owner's question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBankItem {
    id: RecordId,
    prompt: NonEmptyString,
    answer: Option<String>,
    difficulty: QuestionDifficulty,
    topics: Vec<String>,
    is_favorite: bool,
}

impl QuestionBankItem {
    /// Creates a validated question bank item.
    pub fn new(id: RecordId, input: QuestionBankItemInput) -> AppResult<Self> {
        Ok(Self {
            id,
            prompt: NonEmptyString::new(input.prompt)?,
            answer: normalize_optional_text(input.answer),
            difficulty: input.difficulty,
            topics: normalize_tags(input.topics),
            is_favorite: false,
        })
    }

    /// Returns the model answer.
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// Returns the difficulty rating.
    #[must_use]
    pub fn difficulty(&self) -> QuestionDifficulty {
        self.difficulty
    }

    /// Returns topic tags.
    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Returns whether a model answer has been written.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

impl Record for QuestionBankItem {
    const KIND: RecordKind = RecordKind::QuestionBankItem;

    fn id(&self) -> RecordId {
        self.id
    }

    fn title(&self) -> &str {
        self.prompt.as_str()
    }

    fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }
}
