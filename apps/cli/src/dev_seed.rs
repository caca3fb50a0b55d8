use std::str::FromStr;

use chrono::{Duration, NaiveDate, Utc};
use scholardesk_application::RecordRepository;
use scholardesk_core::{AppError, AppResult, OwnerId, RecordId};
use scholardesk_domain::{
    ActivityStatus, LibraryReference, LibraryReferenceInput, LiteratureReview,
    LiteratureReviewInput, Presentation, PresentationFormat, PresentationInput, QuestionBankItem,
    QuestionBankItemInput, QuestionDifficulty, Record, ResearchActivity, ResearchActivityInput,
    ReviewStatus, StoredRecord, TeachingLog, TeachingLogInput,
};
use tracing::info;

const DEV_SEED_ACTIVITY_ID: &str = "1d3f7a20-0c1e-4f55-8d0a-6a51c0a1e001";
const DEV_SEED_REFERENCE_ID: &str = "1d3f7a20-0c1e-4f55-8d0a-6a51c0a1e002";
const DEV_SEED_SECOND_REFERENCE_ID: &str = "1d3f7a20-0c1e-4f55-8d0a-6a51c0a1e003";
const DEV_SEED_PRESENTATION_ID: &str = "1d3f7a20-0c1e-4f55-8d0a-6a51c0a1e004";
const DEV_SEED_QUESTION_ID: &str = "1d3f7a20-0c1e-4f55-8d0a-6a51c0a1e005";
const DEV_SEED_REVIEW_ID: &str = "1d3f7a20-0c1e-4f55-8d0a-6a51c0a1e006";
const DEV_SEED_TEACHING_LOG_ID: &str = "1d3f7a20-0c1e-4f55-8d0a-6a51c0a1e007";

/// Fills an empty store with one small record set per kind and returns the row count.
pub async fn run(repository: &dyn RecordRepository, owner_id: OwnerId) -> AppResult<usize> {
    let reference_id = seed_id(DEV_SEED_REFERENCE_ID)?;
    let second_reference_id = seed_id(DEV_SEED_SECOND_REFERENCE_ID)?;
    let mut seeded = 0_usize;

    let activity = ResearchActivity::new(
        seed_id(DEV_SEED_ACTIVITY_ID)?,
        ResearchActivityInput {
            title: "Replicate sparse attention baselines".to_owned(),
            category: "experiments".to_owned(),
            status: ActivityStatus::InProgress,
            starts_on: Some(date(2025, 9, 1)?),
            due_on: Some(date(2025, 12, 15)?),
            notes: Some("Compare against the dense baseline at equal FLOPs.".to_owned()),
        },
    )?;
    seeded += insert(repository, owner_id, &activity, 0).await?;

    for (record_id, title, year, age_minutes) in [
        (reference_id, "Attention is all you need", 2017, 5),
        (second_reference_id, "Longformer: the long-document transformer", 2020, 10),
    ] {
        let reference = LibraryReference::new(
            record_id,
            LibraryReferenceInput {
                title: title.to_owned(),
                authors: vec!["A. Vaswani".to_owned(), "I. Beltagy".to_owned()],
                year: Some(year),
                venue: Some("arXiv".to_owned()),
                doi: None,
                tags: vec!["transformers".to_owned(), "attention".to_owned()],
            },
        )?;
        seeded += insert(repository, owner_id, &reference, age_minutes).await?;
    }

    let presentation = Presentation::new(
        seed_id(DEV_SEED_PRESENTATION_ID)?,
        PresentationInput {
            title: "Sparse attention in practice".to_owned(),
            event_name: "Lab reading group".to_owned(),
            format: PresentationFormat::Seminar,
            presented_on: Some(date(2025, 10, 8)?),
            slides_url: Some("https://slides.example.org/sparse-attention".to_owned()),
        },
    )?
    .with_favorite(true);
    seeded += insert(repository, owner_id, &presentation, 15).await?;

    let question = QuestionBankItem::new(
        seed_id(DEV_SEED_QUESTION_ID)?,
        QuestionBankItemInput {
            prompt: "Why does self-attention scale quadratically with sequence length?".to_owned(),
            answer: None,
            difficulty: QuestionDifficulty::Medium,
            topics: vec!["attention".to_owned()],
        },
    )?;
    seeded += insert(repository, owner_id, &question, 20).await?;

    let review = LiteratureReview::new(
        seed_id(DEV_SEED_REVIEW_ID)?,
        LiteratureReviewInput {
            title: "Efficient attention survey".to_owned(),
            research_question: "Which sparsity patterns preserve accuracy on long inputs?"
                .to_owned(),
            summary: None,
            reference_ids: vec![reference_id, second_reference_id],
            status: ReviewStatus::Draft,
        },
    )?;
    seeded += insert(repository, owner_id, &review, 25).await?;

    let teaching_log = TeachingLog::new(
        seed_id(DEV_SEED_TEACHING_LOG_ID)?,
        TeachingLogInput {
            course_title: "Deep learning systems".to_owned(),
            session_date: date(2025, 10, 14)?,
            duration_minutes: 90,
            topics: vec!["attention".to_owned(), "kv caching".to_owned()],
            reflection: Some("Students wanted more profiling examples.".to_owned()),
        },
    )?;
    seeded += insert(repository, owner_id, &teaching_log, 30).await?;

    info!(owner_id = %owner_id, seeded, "dev seed applied");
    Ok(seeded)
}

async fn insert<R: Record>(
    repository: &dyn RecordRepository,
    owner_id: OwnerId,
    record: &R,
    age_minutes: i64,
) -> AppResult<usize> {
    let stored =
        StoredRecord::encode(record)?.with_updated_at(Utc::now() - Duration::minutes(age_minutes));
    repository.upsert_record(owner_id, stored).await?;
    Ok(1)
}

fn seed_id(value: &str) -> AppResult<RecordId> {
    RecordId::from_str(value)
        .map_err(|error| AppError::Internal(format!("invalid dev seed record id: {error}")))
}

fn date(year: i32, month: u32, day: u32) -> AppResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        AppError::Internal(format!("invalid dev seed date {year}-{month}-{day}"))
    })
}

#[cfg(test)]
mod tests {
    use scholardesk_application::{RecordListQuery, RecordRepository};
    use scholardesk_core::OwnerId;
    use scholardesk_domain::{LibraryReference, Record, RecordKind};
    use scholardesk_infrastructure::InMemoryRecordRepository;

    use super::run;

    #[tokio::test]
    async fn seed_covers_every_kind_and_decodes() {
        let repository = InMemoryRecordRepository::new();
        let owner_id = OwnerId::new();

        let seeded = run(&repository, owner_id).await;
        assert_eq!(seeded.ok(), Some(7));

        for kind in RecordKind::ALL {
            let rows = repository
                .list_records(owner_id, kind, RecordListQuery::default())
                .await
                .unwrap_or_default();
            assert!(!rows.is_empty(), "no seeded rows for {kind}");
        }

        let references = repository
            .list_records(owner_id, RecordKind::LibraryReference, RecordListQuery::default())
            .await
            .unwrap_or_default();
        let titles: Vec<String> = references
            .iter()
            .filter_map(|row| row.decode::<LibraryReference>().ok())
            .map(|reference| reference.title().to_owned())
            .collect();
        assert_eq!(
            titles,
            vec![
                "Attention is all you need".to_owned(),
                "Longformer: the long-document transformer".to_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn reseeding_is_idempotent() {
        let repository = InMemoryRecordRepository::new();
        let owner_id = OwnerId::new();

        assert!(run(&repository, owner_id).await.is_ok());
        assert!(run(&repository, owner_id).await.is_ok());

        let presentations = repository
            .list_records(owner_id, RecordKind::Presentation, RecordListQuery::default())
            .await
            .unwrap_or_default();
        assert_eq!(presentations.len(), 1);
        assert!(presentations[0].is_favorite());
    }
}
