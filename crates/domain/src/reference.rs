use scholardesk_core::{AppError, AppResult, NonEmptyString, RecordId, normalize_optional_text};
use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordKind, normalize_tags};

/// Input payload used to construct a validated library reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryReferenceInput {
    /// Work title.
    pub title: String,
    /// Author names in citation order.
    pub authors: Vec<String>,
    /// Publication year.
    pub year: Option<i32>,
    /// Journal, conference, or publisher.
    pub venue: Option<String>,
    /// Digital object identifier.
    pub doi: Option<String>,
    /// Free-form tags.
    pub tags: Vec<String>,
}

/// Bibliographic entry kept in the owner's library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryReference {
    id: RecordId,
    title: NonEmptyString,
    authors: Vec<NonEmptyString>,
    year: Option<i32>,
    venue: Option<String>,
    doi: Option<String>,
    tags: Vec<String>,
    is_favorite: bool,
}

impl LibraryReference {
    /// Creates a validated library reference.
    pub fn new(id: RecordId, input: LibraryReferenceInput) -> AppResult<Self> {
        let LibraryReferenceInput {
            title,
            authors,
            year,
            venue,
            doi,
            tags,
        } = input;

        if let Some(year) = year
            && !(1000..=9999).contains(&year)
        {
            return Err(AppError::Validation(format!(
                "publication year {year} must have four digits"
            )));
        }

        let doi = normalize_optional_text(doi);
        if let Some(doi) = doi.as_deref()
            && !doi.starts_with("10.")
        {
            return Err(AppError::Validation(format!(
                "doi '{doi}' must start with '10.'"
            )));
        }

        let authors = authors
            .into_iter()
            .map(NonEmptyString::new)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            id,
            title: NonEmptyString::new(title)?,
            authors,
            year,
            venue: normalize_optional_text(venue),
            doi,
            tags: normalize_tags(tags),
            is_favorite: false,
        })
    }

    /// Returns author names in citation order.
    #[must_use]
    pub fn authors(&self) -> &[NonEmptyString] {
        &self.authors
    }

    /// Returns the publication year.
    #[must_use]
    pub fn year(&self) -> Option<i32> {
        self.year
    }

    /// Returns the publication venue.
    #[must_use]
    pub fn venue(&self) -> Option<&str> {
        self.venue.as_deref()
    }

    /// Returns the DOI.
    #[must_use]
    pub fn doi(&self) -> Option<&str> {
        self.doi.as_deref()
    }

    /// Returns normalized tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Formats a short "Author (Year)" citation label.
    #[must_use]
    pub fn citation_label(&self) -> String {
        let lead = match self.authors.as_slice() {
            [] => "Anon.".to_owned(),
            [only] => only.as_str().to_owned(),
            [first, second] => format!("{} & {}", first.as_str(), second.as_str()),
            [first, ..] => format!("{} et al.", first.as_str()),
        };

        match self.year {
            Some(year) => format!("{lead} ({year})"),
            None => format!("{lead} (n.d.)"),
        }
    }
}

impl Record for LibraryReference {
    const KIND: RecordKind = RecordKind::LibraryReference;

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

#[cfg(test)]
mod tests {
    use scholardesk_core::RecordId;

    use super::{LibraryReference, LibraryReferenceInput};

    fn input() -> LibraryReferenceInput {
        LibraryReferenceInput {
            title: "Deep Residual Learning".to_owned(),
            authors: vec!["He".to_owned(), "Zhang".to_owned(), "Ren".to_owned()],
            year: Some(2016),
            venue: Some(" CVPR ".to_owned()),
            doi: Some("10.1109/CVPR.2016.90".to_owned()),
            tags: vec!["Vision".to_owned()],
        }
    }

    #[test]
    fn valid_reference_is_accepted() {
        let reference = LibraryReference::new(RecordId::new(), input());
        assert!(reference.is_ok());
        let reference = reference.unwrap_or_else(|_| unreachable!());
        assert_eq!(reference.venue(), Some("CVPR"));
        assert_eq!(reference.tags(), ["vision".to_owned()]);
        assert_eq!(reference.citation_label(), "He et al. (2016)");
    }

    #[test]
    fn malformed_doi_is_rejected() {
        let mut input = input();
        input.doi = Some("doi:1234".to_owned());
        assert!(LibraryReference::new(RecordId::new(), input).is_err());
    }

    #[test]
    fn out_of_range_year_is_rejected() {
        let mut input = input();
        input.year = Some(99);
        assert!(LibraryReference::new(RecordId::new(), input).is_err());
    }

    #[test]
    fn blank_author_is_rejected() {
        let mut input = input();
        input.authors.push("  ".to_owned());
        assert!(LibraryReference::new(RecordId::new(), input).is_err());
    }

    #[test]
    fn two_author_citation_uses_ampersand() {
        let mut input = input();
        input.authors.truncate(2);
        input.year = None;
        let reference =
            LibraryReference::new(RecordId::new(), input).unwrap_or_else(|_| unreachable!());
        assert_eq!(reference.citation_label(), "He & Zhang (n.d.)");
    }
}
