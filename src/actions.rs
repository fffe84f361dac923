//! Delete and bulk-delete handling for the submissions screen.
//!
//! A request moves through: action requested, capability checked, token
//! verified, executed. Any failure before execution rejects the whole request
//! and nothing is deleted. After execution the caller records the outcome's
//! notices for the next render.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::AppError;
use crate::listing::SubmissionStore;
use crate::notice::Notice;
use crate::operator::{Capability, Operator};
use crate::params::RequestParams;
use crate::token::{TokenKeeper, TokenScope};

pub const COLLECTION: &str = "submissions";
pub const TOKEN_PARAM: &str = "_token";
pub const ID_PARAM: &str = "submission";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Delete,
    BulkDelete,
}

impl ActionKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "delete" => Some(Self::Delete),
            "bulk-delete" => Some(Self::BulkDelete),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::BulkDelete => "bulk-delete",
        }
    }

    pub fn scope(self) -> TokenScope {
        TokenScope::new(self.key(), COLLECTION)
    }
}

/// The action a request asks for. The bottom bulk-action selector submits as
/// `action2`; `-1` means "no action chosen".
pub fn requested_action(params: &RequestParams) -> Option<ActionKind> {
    ["action", "action2"]
        .into_iter()
        .filter_map(|key| params.get(key))
        .find_map(ActionKind::parse)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "reason", rename_all = "snake_case")]
pub enum DeleteResult {
    Deleted,
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub id: i64,
    #[serde(flatten)]
    pub result: DeleteResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub action: ActionKind,
    pub results: Vec<ItemOutcome>,
    /// Identifiers dropped before reaching the store because they did not
    /// parse as positive integers.
    pub invalid_ids: Vec<String>,
}

impl ActionOutcome {
    pub fn deleted_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.result == DeleteResult::Deleted)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.results
            .iter()
            .filter(|r| r.result != DeleteResult::Deleted)
    }

    pub fn notices(&self) -> Vec<Notice> {
        match self.action {
            ActionKind::Delete => self.single_notices(),
            ActionKind::BulkDelete => self.bulk_notices(),
        }
    }

    fn single_notices(&self) -> Vec<Notice> {
        if let Some(bad) = self.invalid_ids.first() {
            return vec![Notice::error(format!("Invalid submission ID: {bad}."))];
        }
        match self.results.first() {
            None => vec![Notice::error("No submission ID provided.")],
            Some(item) => vec![match &item.result {
                DeleteResult::Deleted => Notice::success("Submission deleted successfully."),
                DeleteResult::NotFound => {
                    Notice::error(format!("Submission {} was not found.", item.id))
                }
                DeleteResult::Failed(_) => {
                    Notice::error(format!("Failed to delete submission {}.", item.id))
                }
            }],
        }
    }

    fn bulk_notices(&self) -> Vec<Notice> {
        let mut notices = Vec::new();

        if self.results.is_empty() && self.invalid_ids.is_empty() {
            return vec![Notice::error("No submissions selected for deletion.")];
        }

        match self.deleted_count() {
            0 => notices.push(Notice::error("No submissions were deleted.")),
            1 => notices.push(Notice::success("1 submission deleted successfully.")),
            n => notices.push(Notice::success(format!(
                "{n} submissions deleted successfully."
            ))),
        }

        let failed: Vec<String> = self
            .failures()
            .map(|item| match item.result {
                DeleteResult::NotFound => format!("{} (not found)", item.id),
                _ => format!("{} (error)", item.id),
            })
            .collect();
        if !failed.is_empty() {
            notices.push(Notice::error(format!(
                "Could not delete submissions: {}.",
                failed.join(", ")
            )));
        }

        if !self.invalid_ids.is_empty() {
            notices.push(Notice::error(format!(
                "Ignored invalid submission IDs: {}.",
                self.invalid_ids.join(", ")
            )));
        }

        notices
    }
}

/// Runs requested actions against a store.
pub struct ActionProcessor<'a> {
    store: &'a dyn SubmissionStore,
    tokens: &'a TokenKeeper,
}

impl<'a> ActionProcessor<'a> {
    pub fn new(store: &'a dyn SubmissionStore, tokens: &'a TokenKeeper) -> Self {
        Self { store, tokens }
    }

    /// `Ok(None)` when the request carries no action. Capability and token
    /// failures are returned as errors before anything is deleted.
    pub fn process(
        &self,
        operator: &Operator,
        params: &RequestParams,
    ) -> Result<Option<ActionOutcome>, AppError> {
        let Some(action) = requested_action(params) else {
            return Ok(None);
        };

        operator.require(Capability::ManageOptions, "delete submissions")?;
        self.tokens
            .verify(params.get(TOKEN_PARAM), operator.session(), action.scope())?;

        let raw_ids = params.get_all(ID_PARAM);
        let outcome = match action {
            ActionKind::Delete => {
                // A single delete only ever considers the first identifier
                let (ids, invalid_ids) = parse_ids(raw_ids.into_iter().take(1));
                execute(self.store, action, ids, invalid_ids)
            }
            ActionKind::BulkDelete => {
                let (ids, invalid_ids) = parse_ids(raw_ids);
                execute(self.store, action, ids, invalid_ids)
            }
        };

        tracing::info!(
            "{} by '{}': {} deleted, {} not deleted",
            action.key(),
            operator.name,
            outcome.deleted_count(),
            outcome.failures().count()
        );
        Ok(Some(outcome))
    }
}

/// Delete each id independently. A failing id never stops the rest.
pub fn execute(
    store: &dyn SubmissionStore,
    action: ActionKind,
    ids: BTreeSet<i64>,
    invalid_ids: Vec<String>,
) -> ActionOutcome {
    let results = ids
        .into_iter()
        .map(|id| ItemOutcome {
            id,
            result: delete_one(store, id),
        })
        .collect();

    ActionOutcome {
        action,
        results,
        invalid_ids,
    }
}

fn delete_one(store: &dyn SubmissionStore, id: i64) -> DeleteResult {
    match store.delete(id) {
        Ok(true) => {
            tracing::info!("Deleted submission {id}");
            DeleteResult::Deleted
        }
        Ok(false) => {
            tracing::debug!("Submission {id} not found");
            DeleteResult::NotFound
        }
        Err(e) => {
            tracing::error!("Failed to delete submission {id}: {e}");
            DeleteResult::Failed(e.to_string())
        }
    }
}

/// Split raw identifiers into a de-duplicated set of positive ids and the
/// values that were rejected.
pub fn parse_ids<'s>(raw: impl IntoIterator<Item = &'s str>) -> (BTreeSet<i64>, Vec<String>) {
    let mut ids = BTreeSet::new();
    let mut invalid = Vec::new();
    for value in raw {
        match value.trim().parse::<i64>() {
            Ok(id) if id > 0 => {
                ids.insert(id);
            }
            _ if value.trim().is_empty() => {}
            _ => invalid.push(value.to_string()),
        }
    }
    (ids, invalid)
}
