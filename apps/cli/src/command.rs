use std::str::FromStr;

use scholardesk_core::{AppError, AppResult, RecordId};
use scholardesk_domain::RecordKind;

pub const USAGE: &str = "usage: scholardesk migrate | list <kind> [--favorites] [--search <text>] \
| favorite <kind> <id>... | unfavorite <kind> <id>... | delete <kind> <id>...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Migrate,
    Records(RecordCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCommand {
    pub kind: RecordKind,
    pub action: RecordAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordAction {
    List {
        favorites_only: bool,
        search: Option<String>,
    },
    SetFavorite {
        record_ids: Vec<RecordId>,
        is_favorite: bool,
    },
    Delete {
        record_ids: Vec<RecordId>,
    },
}

impl Command {
    pub fn parse(args: impl IntoIterator<Item = String>) -> AppResult<Self> {
        let mut args = args.into_iter();
        let Some(name) = args.next() else {
            return Err(AppError::Validation(USAGE.to_owned()));
        };

        let command = match name.as_str() {
            "migrate" => {
                if let Some(extra) = args.next() {
                    return Err(AppError::Validation(format!(
                        "migrate takes no arguments, got '{extra}'"
                    )));
                }
                Self::Migrate
            }
            "list" => {
                let kind = parse_kind(args.next())?;
                let mut favorites_only = false;
                let mut search = None;

                while let Some(flag) = args.next() {
                    match flag.as_str() {
                        "--favorites" => favorites_only = true,
                        "--search" => {
                            let Some(text) = args.next() else {
                                return Err(AppError::Validation(
                                    "--search requires a value".to_owned(),
                                ));
                            };
                            search = Some(text);
                        }
                        other => {
                            return Err(AppError::Validation(format!(
                                "unknown list option '{other}'"
                            )));
                        }
                    }
                }

                Self::Records(RecordCommand {
                    kind,
                    action: RecordAction::List {
                        favorites_only,
                        search,
                    },
                })
            }
            "favorite" | "unfavorite" => Self::Records(RecordCommand {
                kind: parse_kind(args.next())?,
                action: RecordAction::SetFavorite {
                    record_ids: parse_record_ids(args, name.as_str())?,
                    is_favorite: name == "favorite",
                },
            }),
            "delete" => Self::Records(RecordCommand {
                kind: parse_kind(args.next())?,
                action: RecordAction::Delete {
                    record_ids: parse_record_ids(args, name.as_str())?,
                },
            }),
            other => {
                return Err(AppError::Validation(format!(
                    "unknown command '{other}'; {USAGE}"
                )));
            }
        };

        Ok(command)
    }
}

fn parse_kind(value: Option<String>) -> AppResult<RecordKind> {
    let Some(value) = value else {
        return Err(AppError::Validation(format!(
            "a record kind is required; {USAGE}"
        )));
    };

    RecordKind::from_str(value.as_str())
}

fn parse_record_ids(args: impl Iterator<Item = String>, command: &str) -> AppResult<Vec<RecordId>> {
    let record_ids = args
        .map(|value| RecordId::from_str(value.as_str()))
        .collect::<AppResult<Vec<_>>>()?;
    if record_ids.is_empty() {
        return Err(AppError::Validation(format!(
            "{command} requires at least one record id"
        )));
    }

    Ok(record_ids)
}

#[cfg(test)]
mod tests {
    use scholardesk_core::AppError;
    use scholardesk_domain::RecordKind;

    use super::{Command, RecordAction, RecordCommand};

    fn parse(args: &[&str]) -> Result<Command, AppError> {
        Command::parse(args.iter().map(|arg| (*arg).to_owned()))
    }

    #[test]
    fn list_accepts_filters_in_any_order() {
        let command = parse(&["list", "presentation", "--search", "graph", "--favorites"]);

        assert_eq!(
            command.ok(),
            Some(Command::Records(RecordCommand {
                kind: RecordKind::Presentation,
                action: RecordAction::List {
                    favorites_only: true,
                    search: Some("graph".to_owned()),
                },
            }))
        );
    }

    #[test]
    fn favorite_commands_collect_ids() {
        let command = parse(&[
            "unfavorite",
            "teaching_log",
            "6f1c1f1e-8c49-4f0e-9a55-0d3c1b1f0c01",
            "6f1c1f1e-8c49-4f0e-9a55-0d3c1b1f0c02",
        ]);

        let Ok(Command::Records(RecordCommand {
            kind,
            action: RecordAction::SetFavorite {
                record_ids,
                is_favorite,
            },
        })) = command
        else {
            panic!("expected a favorite command");
        };
        assert_eq!(kind, RecordKind::TeachingLog);
        assert_eq!(record_ids.len(), 2);
        assert!(!is_favorite);
    }

    #[test]
    fn invalid_input_is_a_validation_error() {
        for args in [
            &[][..],
            &["archive", "presentation"][..],
            &["list", "grant"][..],
            &["list", "presentation", "--search"][..],
            &["delete", "presentation"][..],
            &["delete", "presentation", "not-a-uuid"][..],
            &["migrate", "now"][..],
        ] {
            assert!(
                matches!(parse(args), Err(AppError::Validation(_))),
                "expected validation error for {args:?}"
            );
        }
    }

    #[test]
    fn migrate_has_no_arguments() {
        assert_eq!(parse(&["migrate"]).ok(), Some(Command::Migrate));
    }
}
