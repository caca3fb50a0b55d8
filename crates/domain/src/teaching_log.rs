use chrono::NaiveDate;
use scholardesk_core::{AppError, AppResult, NonEmptyString, RecordId, normalize_optional_text};
use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordKind, normalize_tags};

/// Input payload used to construct a validated teaching log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeachingLogInput {
    /// Course title.
    pub course_title: String,
    /// Date of the session.
    pub session_date: NaiveDate,
    /// Contact time in minutes.
    pub duration_minutes: u32,
    /// Topics covered.
    pub topics: Vec<String>,
    /// Optional reflection written after the session.
    pub reflection: Option<String>,
}

/// Log entry for one teaching session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachingLog {
    id: RecordId,
    course_title: NonEmptyString,
    session_date: NaiveDate,
    duration_minutes: u32,
    topics: Vec<String>,
    reflection: Option<String>,
    is_favorite: bool,
}

impl TeachingLog {
    /// Creates a validated teaching log entry.
    pub fn new(id: RecordId, input: TeachingLogInput) -> AppResult<Self> {
        if input.duration_minutes == 0 {
            return Err(AppError::Validation(
                "duration_minutes must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            id,
            course_title: NonEmptyString::new(input.course_title)?,
            session_date: input.session_date,
            duration_minutes: input.duration_minutes,
            topics: normalize_tags(input.topics),
            reflection: normalize_optional_text(input.reflection),
            is_favorite: false,
        })
    }

    /// Returns the session date.
    #[must_use]
    pub fn session_date(&self) -> NaiveDate {
        self.session_date
    }

    /// Returns contact time in minutes.
    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Returns topics covered.
    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Returns the reflection.
    #[must_use]
    pub fn reflection(&self) -> Option<&str> {
        self.reflection.as_deref()
    }
}

impl Record for TeachingLog {
    const KIND: RecordKind = RecordKind::TeachingLog;

    fn id(&self) -> RecordId {
        self.id
    }

    fn title(&self) -> &str {
        self.course_title.as_str()
    }

    fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }
}

/// Sums contact minutes across teaching sessions.
#[must_use]
pub fn total_contact_minutes(logs: &[TeachingLog]) -> u64 {
    logs.iter()
        .map(|log| u64::from(log.duration_minutes))
        .sum()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use scholardesk_core::RecordId;

    use super::{TeachingLog, TeachingLogInput, total_contact_minutes};

    fn input(duration_minutes: u32) -> TeachingLogInput {
        TeachingLogInput {
            course_title: "Research Methods".to_owned(),
            session_date: NaiveDate::from_ymd_opt(2026, 9, 14).unwrap_or_else(|| unreachable!()),
            duration_minutes,
            topics: vec!["Sampling".to_owned()],
            reflection: None,
        }
    }

    #[test]
    fn zero_duration_is_rejected() {
        assert!(TeachingLog::new(RecordId::new(), input(0)).is_err());
    }

    #[test]
    fn contact_minutes_are_summed() {
        let logs = [90, 45]
            .into_iter()
            .map(|minutes| {
                TeachingLog::new(RecordId::new(), input(minutes)).unwrap_or_else(|_| unreachable!())
            })
            .collect::<Vec<_>>();
        assert_eq!(total_contact_minutes(&logs), 135);
    }
}
