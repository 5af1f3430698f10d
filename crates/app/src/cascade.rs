//! Step tracking for multi-entity writes.
//!
//! The store offers no multi-document transaction, so every mutation that
//! touches more than one entity runs as an ordered sequence:
//!
//! 1. [`Step::Validate`] — lookups and rule checks; any failure aborts and
//!    nothing has been written yet.
//! 2. [`Step::MutatePrimary`] — the write the caller asked for; a failure
//!    aborts the whole operation.
//! 3. [`Step::MutateDependents`] — back-reference maintenance; each write is
//!    best-effort, a failure is logged and the remaining writes still run.
//!    Nothing is rolled back or retried.
//! 4. [`Step::Notify`] — queued notifications are handed to the notifier in
//!    the order they were emitted; failures are logged only.

use std::fmt;

use smarthome_domain::error::SmartHomeError;
use smarthome_domain::id::EntityKind;
use smarthome_domain::notification::Notification;

use crate::ports::Notifier;

/// Phase of a cascade. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Validate,
    MutatePrimary,
    MutateDependents,
    Notify,
    Done,
}

/// A dependent write that failed after the primary write succeeded.
///
/// This is a detected but unresolved inconsistency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentFailure {
    pub kind: EntityKind,
    pub id: String,
    pub reason: String,
}

/// Tracks one running cascade.
#[derive(Debug)]
#[must_use = "a cascade must be finished to publish its notifications"]
pub struct Cascade {
    operation: &'static str,
    target: String,
    step: Step,
    pending: Vec<Notification>,
    failures: Vec<DependentFailure>,
}

impl Cascade {
    /// Start a cascade for `operation` on `target`, in [`Step::Validate`].
    pub fn begin(operation: &'static str, target: impl fmt::Display) -> Self {
        let target = target.to_string();
        tracing::debug!(operation, target = %target, "cascade started");
        Self {
            operation,
            target,
            step: Step::Validate,
            pending: Vec::new(),
            failures: Vec::new(),
        }
    }

    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    /// Move to `next`. Moving backwards is a programming error.
    pub fn advance(&mut self, next: Step) {
        debug_assert!(next >= self.step, "cascade steps only move forward");
        tracing::debug!(
            operation = self.operation,
            target = %self.target,
            from = ?self.step,
            to = ?next,
            "cascade step"
        );
        self.step = next;
    }

    /// Queue a notification for the [`Step::Notify`] phase.
    pub fn emit(&mut self, notification: Notification) {
        self.pending.push(notification);
    }

    /// Record a best-effort dependent write that failed.
    pub fn dependent_failed(
        &mut self,
        kind: EntityKind,
        id: impl fmt::Display,
        error: &SmartHomeError,
    ) {
        let id = id.to_string();
        tracing::warn!(
            operation = self.operation,
            target = %self.target,
            dependent_kind = %kind,
            dependent_id = %id,
            error = %error,
            "cascade dependent update failed, reference left inconsistent"
        );
        self.failures.push(DependentFailure {
            kind,
            id,
            reason: error.to_string(),
        });
    }

    /// Failures recorded so far.
    #[must_use]
    pub fn failures(&self) -> &[DependentFailure] {
        &self.failures
    }

    /// Publish queued notifications and close the cascade.
    ///
    /// Returns the dependent failures that were recorded.
    pub async fn finish<N: Notifier>(mut self, notifier: &N) -> Vec<DependentFailure> {
        self.advance(Step::Notify);
        for notification in std::mem::take(&mut self.pending) {
            let entity_id = notification.entity_id.clone();
            if let Err(err) = notifier.publish(notification).await {
                tracing::warn!(
                    operation = self.operation,
                    entity_id = %entity_id,
                    error = %err,
                    "notification dropped"
                );
            }
        }
        self.advance(Step::Done);
        if !self.failures.is_empty() {
            tracing::warn!(
                operation = self.operation,
                target = %self.target,
                failures = self.failures.len(),
                "cascade finished with inconsistencies"
            );
        }
        self.failures
    }
}
