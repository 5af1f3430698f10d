//! User — a person with access to a set of rooms.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{SmartHomeError, ValidationError};
use crate::id::{EntityKind, RoomId, UserId};
use crate::record::Record;
use crate::time::{Timestamp, now};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Unique across all users.
    pub email: String,
    pub allowed_rooms: Vec<RoomId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Create a builder for constructing a [`User`].
    #[must_use]
    pub fn builder() -> UserBuilder {
        UserBuilder::default()
    }

    /// Check the invariants that need no lookup: name, email shape and
    /// duplicate room references. Email uniqueness and room existence are
    /// checked against the store by the user service.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] on the first failing rule.
    pub fn validate(&self) -> Result<(), SmartHomeError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        check_email(&self.email)?;
        check_unique_rooms(&self.allowed_rooms)?;
        Ok(())
    }

    /// Drop `room` from the allowed rooms. Returns `false` if it was absent.
    pub fn revoke_room(&mut self, room: &RoomId) -> bool {
        let before = self.allowed_rooms.len();
        self.allowed_rooms.retain(|existing| existing != room);
        self.allowed_rooms.len() != before
    }
}

impl Record for User {
    type Id = UserId;

    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> &UserId {
        &self.id
    }
}

/// Minimal shape check: one `@` with something on both sides.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidEmail`] otherwise.
pub fn check_email(email: &str) -> Result<(), ValidationError> {
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err(ValidationError::InvalidEmail(email.to_string())),
    }
}

/// Reject a room list that names the same room twice.
///
/// # Errors
///
/// Returns [`ValidationError::DuplicateRoomReference`] with the first
/// repeated id.
pub fn check_unique_rooms(rooms: &[RoomId]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(rooms.len());
    for room in rooms {
        if !seen.insert(room) {
            return Err(ValidationError::DuplicateRoomReference(room.to_string()));
        }
    }
    Ok(())
}

/// Step-by-step builder for [`User`].
#[derive(Debug, Default)]
pub struct UserBuilder {
    id: Option<UserId>,
    name: Option<String>,
    email: Option<String>,
    allowed_rooms: Vec<RoomId>,
}

impl UserBuilder {
    #[must_use]
    pub fn id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn allowed_rooms(mut self, rooms: impl IntoIterator<Item = RoomId>) -> Self {
        self.allowed_rooms = rooms.into_iter().collect();
        self
    }

    /// Consume the builder, validate, and return a [`User`].
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] if `email` is missing or any
    /// rule checked by [`User::validate`] fails.
    pub fn build(self) -> Result<User, SmartHomeError> {
        let email = self.email.ok_or(ValidationError::MissingField("email"))?;
        let ts = now();
        let user = User {
            id: self.id.unwrap_or_else(UserId::generate),
            name: self.name.unwrap_or_default(),
            email,
            allowed_rooms: self.allowed_rooms,
            created_at: ts,
            updated_at: ts,
        };
        user.validate()?;
        Ok(user)
    }
}

/// Partial update of a user. `allowed_rooms` replaces the whole list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub allowed_rooms: Option<Vec<RoomId>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str) -> RoomId {
        id.parse().unwrap()
    }

    #[test]
    fn should_build_user_with_allowed_rooms() {
        let user = User::builder()
            .name("Ada")
            .email("ada@example.com")
            .allowed_rooms([room("room_ab12"), room("room_cd34")])
            .build()
            .unwrap();
        assert_eq!(user.allowed_rooms.len(), 2);
        assert!(user.id.as_str().starts_with("user_"));
    }

    #[test]
    fn should_reject_duplicate_room_reference() {
        let result = User::builder()
            .name("B")
            .email("b@x.com")
            .allowed_rooms([room("room_ab12"), room("room_ab12")])
            .build();
        assert!(matches!(
            result,
            Err(SmartHomeError::Validation(ValidationError::DuplicateRoomReference(id)))
                if id == "room_ab12"
        ));
    }

    #[test]
    fn should_reject_missing_email() {
        let result = User::builder().name("C").build();
        assert!(matches!(
            result,
            Err(SmartHomeError::Validation(ValidationError::MissingField(
                "email"
            )))
        ));
    }

    #[test]
    fn should_check_email_shape() {
        assert!(check_email("a@x.com").is_ok());
        assert!(check_email("ax.com").is_err());
        assert!(check_email("@x.com").is_err());
        assert!(check_email("a@").is_err());
        assert!(check_email("a@b@c").is_err());
        assert!(check_email("a b@c.d").is_err());
    }

    #[test]
    fn should_revoke_room_only_when_present() {
        let mut user = User::builder()
            .name("D")
            .email("d@x.com")
            .allowed_rooms([room("room_ab12")])
            .build()
            .unwrap();
        assert!(user.revoke_room(&room("room_ab12")));
        assert!(!user.revoke_room(&room("room_ab12")));
        assert!(user.allowed_rooms.is_empty());
    }

    #[test]
    fn should_serialize_allowed_rooms_in_camel_case() {
        let user = User::builder()
            .name("E")
            .email("e@x.com")
            .build()
            .unwrap();
        let json = serde_json::to_value(user).unwrap();
        assert_eq!(json["allowedRooms"], serde_json::json!([]));
        assert_eq!(json["email"], "e@x.com");
    }
}
