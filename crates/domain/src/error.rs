//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`SmartHomeError`] via `From`, so callers only have to match on one
//! taxonomy: validation, not-found, conflict and storage.

use crate::id::EntityKind;

/// Top-level error returned by every use-case and port.
#[derive(Debug, thiserror::Error)]
pub enum SmartHomeError {
    /// Malformed or semantically illegal input. Fixable by the caller.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced entity does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A uniqueness constraint was violated at the store boundary.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// Persistence or broker failure. Aborts the operation in progress.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SmartHomeError {
    /// Whether the caller can fix this error by changing the request.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

/// Input rejected by a domain rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("field '{0}' is required")]
    MissingField(&'static str),

    #[error("name must not be empty")]
    EmptyName,

    #[error("manufacturer must not be empty")]
    EmptyManufacturer,

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    /// Every rule the identifier broke, reported together.
    #[error("'{value}' is not a valid {kind} ID: {}", .violations.join(" "))]
    InvalidIdentifier {
        kind: EntityKind,
        value: String,
        violations: Vec<String>,
    },

    #[error("unsupported device type '{0}'")]
    UnsupportedDeviceType(String),

    #[error("unsupported room type '{0}'")]
    UnsupportedRoomType(String),

    #[error("unsupported device status '{0}'")]
    UnsupportedStatus(String),

    #[error("invalid status '{status}' for device type '{device_type}', allowed: {}", .allowed.join(", "))]
    IllegalStatus {
        device_type: String,
        status: String,
        allowed: &'static [&'static str],
    },

    #[error("room '{0}' is referenced more than once")]
    DuplicateRoomReference(String),

    #[error("room '{0}' does not exist")]
    UnknownRoom(String),

    #[error("email '{0}' is already in use")]
    EmailTaken(String),
}

/// Lookup by id found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} with id '{id}' not found")]
pub struct NotFoundError {
    pub entity: EntityKind,
    pub id: String,
}

/// A duplicate id or email slipped past the pre-checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("conflict: {detail}")]
pub struct ConflictError {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_name_allowed_values_when_status_is_illegal() {
        let err = ValidationError::IllegalStatus {
            device_type: "door-sensor".to_string(),
            status: "on".to_string(),
            allowed: &["open", "closed"],
        };
        assert_eq!(
            err.to_string(),
            "invalid status 'on' for device type 'door-sensor', allowed: open, closed"
        );
    }

    #[test]
    fn should_join_all_identifier_violations() {
        let err = ValidationError::InvalidIdentifier {
            kind: EntityKind::Room,
            value: "rm".to_string(),
            violations: vec![
                "ID must be 9 characters long.".to_string(),
                "ID must start with 'room_'.".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "'rm' is not a valid room ID: ID must be 9 characters long. ID must start with 'room_'."
        );
    }

    #[test]
    fn should_display_not_found_with_kind_and_id() {
        let err = NotFoundError {
            entity: EntityKind::Device,
            id: "device_ab12".to_string(),
        };
        assert_eq!(err.to_string(), "device with id 'device_ab12' not found");
    }

    #[test]
    fn should_classify_storage_as_server_error() {
        let err = SmartHomeError::Storage("boom".into());
        assert!(!err.is_client_error());
        let err: SmartHomeError = ValidationError::EmptyName.into();
        assert!(err.is_client_error());
    }
}
