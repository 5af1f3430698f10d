//! Notification — a change record published after every successful mutation.

use serde::Serialize;

use crate::id::EntityKind;
use crate::record::Record;

/// The mutation a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    /// HTTP method of the equivalent API call.
    #[must_use]
    pub fn method(self) -> &'static str {
        match self {
            Self::Create => "POST",
            Self::Update => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// A change event for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: EntityKind,
    pub entity_id: String,
    pub operation: Operation,
    /// Snapshot of the entity after the mutation (before it, for deletes).
    pub payload: serde_json::Value,
    pub description: String,
}

impl Notification {
    /// Build a notification carrying a snapshot of `record`.
    #[must_use]
    pub fn of<R: Record>(operation: Operation, record: &R, description: impl Into<String>) -> Self {
        Self {
            kind: R::KIND,
            entity_id: record.id().to_string(),
            operation,
            payload: serde_json::to_value(record).unwrap_or_else(|err| {
                tracing::warn!(
                    kind = %R::KIND,
                    id = %record.id(),
                    error = %err,
                    "entity snapshot could not be serialised, sending null payload"
                );
                serde_json::Value::Null
            }),
            description: description.into(),
        }
    }

    /// API path of the entity this notification is about.
    #[must_use]
    pub fn url(&self) -> String {
        format!("/api/v1/{}/{}", self.kind.collection(), self.entity_id)
    }
}
