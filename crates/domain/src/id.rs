//! Typed identifiers of the shape `<kind>_<4-char suffix>`.
//!
//! Identifiers are generated best-effort: collisions are not checked here
//! and surface as store-level conflicts instead.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Length of the random part of an identifier.
pub const SUFFIX_LEN: usize = 4;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// One of the three stored entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Device,
    Room,
    User,
}

impl EntityKind {
    /// Lowercase name, also used as identifier prefix.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Room => "room",
            Self::User => "user",
        }
    }

    /// Plural form used for collection paths and broker topics.
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            Self::Device => "devices",
            Self::Room => "rooms",
            Self::User => "users",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produce `<kind>_<suffix>` with a random lowercase alphanumeric suffix.
#[must_use]
pub fn generate(kind: EntityKind) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect();
    format!("{}_{suffix}", kind.as_str())
}

/// Check `value` against the identifier rules for `kind`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidIdentifier`] listing every violated
/// rule, not only the first one.
pub fn validate(value: &str, kind: EntityKind) -> Result<(), ValidationError> {
    let prefix = kind.as_str();
    let expected_len = prefix.len() + SUFFIX_LEN + 1;
    let mut violations = Vec::new();

    if value.is_empty() {
        violations.push("ID is required.".to_string());
    }
    if value.len() != expected_len {
        violations.push(format!("ID must be {expected_len} characters long."));
    }
    if !value.starts_with(prefix) || value.as_bytes().get(prefix.len()) != Some(&b'_') {
        violations.push(format!("ID must start with '{prefix}_'."));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::InvalidIdentifier {
            kind,
            value: value.to_string(),
            violations,
        })
    }
}

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident, $kind:expr) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Entity kind this identifier belongs to.
            pub const KIND: EntityKind = $kind;

            /// Generate a new random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(generate(Self::KIND))
            }

            /// Borrow the textual form.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                validate(s, Self::KIND)?;
                Ok(Self(s.to_string()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                validate(&value, Self::KIND)?;
                Ok(Self(value))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a [`Device`](crate::device::Device).
    DeviceId,
    EntityKind::Device
);

define_id!(
    /// Unique identifier for a [`Room`](crate::room::Room).
    RoomId,
    EntityKind::Room
);

define_id!(
    /// Unique identifier for a [`User`](crate::user::User).
    UserId,
    EntityKind::User
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_generate_prefixed_id_with_four_char_suffix() {
        let id = DeviceId::generate();
        let text = id.as_str();
        assert_eq!(text.len(), "device_".len() + SUFFIX_LEN);
        assert!(text.starts_with("device_"));
        assert!(
            text["device_".len()..]
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        );
    }

    #[test]
    fn should_accept_generated_ids_when_parsed_back() {
        let id = UserId::generate();
        let parsed: UserId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_report_every_violation_at_once() {
        let err = validate("dev", EntityKind::Device).unwrap_err();
        let ValidationError::InvalidIdentifier { violations, .. } = err else {
            panic!("unexpected error variant");
        };
        assert_eq!(
            violations,
            vec![
                "ID must be 11 characters long.".to_string(),
                "ID must start with 'device_'.".to_string(),
            ]
        );
    }

    #[test]
    fn should_require_non_empty_value() {
        let err = validate("", EntityKind::Room).unwrap_err();
        let ValidationError::InvalidIdentifier { violations, .. } = err else {
            panic!("unexpected error variant");
        };
        assert_eq!(violations.len(), 3);
        assert_eq!(violations[0], "ID is required.");
    }

    #[test]
    fn should_reject_id_of_another_kind_with_right_length() {
        // "user_ab12" has the same length as a valid room id.
        assert!(RoomId::from_str("user_ab12").is_err());
        assert!(RoomId::from_str("room_ab12").is_ok());
    }

    #[test]
    fn should_reject_prefix_without_separator() {
        assert!(RoomId::from_str("roomxab12").is_err());
    }

    #[test]
    fn should_validate_when_deserializing() {
        let ok: Result<RoomId, _> = serde_json::from_str("\"room_ab12\"");
        assert!(ok.is_ok());
        let bad: Result<RoomId, _> = serde_json::from_str("\"room_toolong\"");
        assert!(bad.is_err());
    }

    #[test]
    fn should_serialize_as_plain_string() {
        let id: DeviceId = "device_x1y2".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"device_x1y2\"");
    }
}
