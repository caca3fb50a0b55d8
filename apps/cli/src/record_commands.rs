use std::sync::Arc;

use scholardesk_application::{
    MutationOutcome, RecordListQuery, RecordListService, RecordRepository,
};
use scholardesk_core::{AppError, AppResult, RecordId};
use scholardesk_domain::{
    LibraryReference, LiteratureReview, Presentation, QuestionBankItem, Record, RecordKind,
    ResearchActivity, TeachingLog,
};
use tracing::info;

use crate::cli_config::CliConfig;
use crate::command::{RecordAction, RecordCommand};

pub async fn run(
    command: RecordCommand,
    config: &CliConfig,
    repository: Arc<dyn RecordRepository>,
) -> AppResult<Vec<String>> {
    let RecordCommand { kind, action } = command;
    match kind {
        RecordKind::ResearchActivity => {
            run_for_kind::<ResearchActivity>(action, config, repository).await
        }
        RecordKind::LibraryReference => {
            run_for_kind::<LibraryReference>(action, config, repository).await
        }
        RecordKind::Presentation => run_for_kind::<Presentation>(action, config, repository).await,
        RecordKind::QuestionBankItem => {
            run_for_kind::<QuestionBankItem>(action, config, repository).await
        }
        RecordKind::LiteratureReview => {
            run_for_kind::<LiteratureReview>(action, config, repository).await
        }
        RecordKind::TeachingLog => run_for_kind::<TeachingLog>(action, config, repository).await,
    }
}

/// Returns the JSON lines to print.
async fn run_for_kind<R: Record>(
    action: RecordAction,
    config: &CliConfig,
    repository: Arc<dyn RecordRepository>,
) -> AppResult<Vec<String>> {
    let service = RecordListService::<R>::new(config.owner_id, repository, config.request_timeout);
    let page = RecordListQuery {
        limit: config.list_limit,
        ..RecordListQuery::default()
    };

    match action {
        RecordAction::List {
            favorites_only,
            search,
        } => {
            load(
                &service,
                RecordListQuery {
                    favorites_only,
                    search,
                    ..page
                },
            )
            .await?;
            service.items().iter().map(to_json_line).collect()
        }
        RecordAction::SetFavorite {
            record_ids,
            is_favorite,
        } => {
            load(&service, page).await?;
            ensure_stored(&service, &record_ids).await?;
            let outcome = service.set_favorite(&record_ids, is_favorite).await;
            settle(&service, outcome, "favorite", &record_ids)
        }
        RecordAction::Delete { record_ids } => {
            load(&service, page).await?;
            ensure_stored(&service, &record_ids).await?;
            let outcome = service.delete(&record_ids).await;
            settle(&service, outcome, "delete", &record_ids)
        }
    }
}

async fn load<R: Record>(service: &RecordListService<R>, query: RecordListQuery) -> AppResult<()> {
    service
        .refresh(query)
        .await
        .map_err(|error| AppError::Internal(format!("{} refresh task failed: {error}", R::KIND)))?;

    match service.last_error() {
        Some(message) => Err(AppError::Internal(message)),
        None => Ok(()),
    }
}

/// Adds targets beyond the loaded page so the mutation can see them.
async fn ensure_stored<R: Record>(
    service: &RecordListService<R>,
    record_ids: &[RecordId],
) -> AppResult<()> {
    let missing = service.include(record_ids).await?;
    if missing.is_empty() {
        return Ok(());
    }

    let missing: Vec<String> = missing.iter().map(ToString::to_string).collect();
    Err(AppError::NotFound(format!(
        "{} record(s) not found: {}",
        R::KIND,
        missing.join(", ")
    )))
}

fn settle<R: Record>(
    service: &RecordListService<R>,
    outcome: MutationOutcome,
    operation: &str,
    record_ids: &[RecordId],
) -> AppResult<Vec<String>> {
    if !outcome.is_committed() {
        return Err(AppError::Conflict(service.last_error().unwrap_or_else(|| {
            format!("{operation} of {} record(s) was rolled back", record_ids.len())
        })));
    }

    info!(
        kind = R::KIND.as_str(),
        operation,
        count = record_ids.len(),
        "records updated"
    );
    service.items().iter().map(to_json_line).collect()
}

fn to_json_line<R: Record>(record: &R) -> AppResult<String> {
    serde_json::to_string(record).map_err(|error| {
        AppError::Internal(format!(
            "failed to serialize {} record '{}': {error}",
            R::KIND,
            record.id()
        ))
    })
}
