//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod activity;
mod literature_review;
mod presentation;
mod question;
mod record;
mod reference;
mod teaching_log;

pub use activity::{ActivityStatus, ResearchActivity, ResearchActivityInput};
pub use literature_review::{LiteratureReview, LiteratureReviewInput, ReviewStatus};
pub use presentation::{Presentation, PresentationFormat, PresentationInput};
pub use question::{QuestionBankItem, QuestionBankItemInput, QuestionDifficulty};
pub use record::{Record, RecordKind, StoredRecord};
pub use reference::{LibraryReference, LibraryReferenceInput};
pub use teaching_log::{TeachingLog, TeachingLogInput, total_contact_minutes};
