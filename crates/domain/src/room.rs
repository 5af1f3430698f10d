//! Room — a named space holding a set of devices.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SmartHomeError, ValidationError};
use crate::id::{DeviceId, EntityKind, RoomId};
use crate::record::Record;
use crate::time::{Timestamp, now};

/// Supported kinds of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomType {
    LivingRoom,
    DiningRoom,
    Kitchen,
    Bedroom,
    Bathroom,
    Hallway,
    Basement,
    Attic,
    Garage,
    Backyard,
    Frontyard,
}

impl RoomType {
    pub const ALL: [Self; 11] = [
        Self::LivingRoom,
        Self::DiningRoom,
        Self::Kitchen,
        Self::Bedroom,
        Self::Bathroom,
        Self::Hallway,
        Self::Basement,
        Self::Attic,
        Self::Garage,
        Self::Backyard,
        Self::Frontyard,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LivingRoom => "living-room",
            Self::DiningRoom => "dining-room",
            Self::Kitchen => "kitchen",
            Self::Bedroom => "bedroom",
            Self::Bathroom => "bathroom",
            Self::Hallway => "hallway",
            Self::Basement => "basement",
            Self::Attic => "attic",
            Self::Garage => "garage",
            Self::Backyard => "backyard",
            Self::Frontyard => "frontyard",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::UnsupportedRoomType(s.to_string()))
    }
}

/// A room and the back-references to the devices placed in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    /// Set semantics: order is irrelevant, duplicates never stored.
    pub device_list: Vec<DeviceId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Room {
    /// Create a builder for constructing a [`Room`].
    #[must_use]
    pub fn builder() -> RoomBuilder {
        RoomBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] when `name` is blank.
    pub fn validate(&self) -> Result<(), SmartHomeError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn contains_device(&self, id: &DeviceId) -> bool {
        self.device_list.contains(id)
    }

    /// Add `id` to the device list. Returns `false` if it was already there.
    pub fn attach_device(&mut self, id: &DeviceId) -> bool {
        if self.contains_device(id) {
            return false;
        }
        self.device_list.push(id.clone());
        true
    }

    /// Remove `id` from the device list. Returns `false` if it was absent.
    pub fn detach_device(&mut self, id: &DeviceId) -> bool {
        let before = self.device_list.len();
        self.device_list.retain(|existing| existing != id);
        self.device_list.len() != before
    }
}

impl Record for Room {
    type Id = RoomId;

    const KIND: EntityKind = EntityKind::Room;

    fn id(&self) -> &RoomId {
        &self.id
    }
}

/// Step-by-step builder for [`Room`]. New rooms start with no devices.
#[derive(Debug, Default)]
pub struct RoomBuilder {
    id: Option<RoomId>,
    name: Option<String>,
    room_type: Option<RoomType>,
}

impl RoomBuilder {
    #[must_use]
    pub fn id(mut self, id: RoomId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn room_type(mut self, room_type: RoomType) -> Self {
        self.room_type = Some(room_type);
        self
    }

    /// Consume the builder, validate, and return a [`Room`].
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] if `type` is missing or
    /// `name` is blank.
    pub fn build(self) -> Result<Room, SmartHomeError> {
        let room_type = self.room_type.ok_or(ValidationError::MissingField("type"))?;
        let ts = now();
        let room = Room {
            id: self.id.unwrap_or_else(RoomId::generate),
            name: self.name.unwrap_or_default(),
            room_type,
            device_list: Vec::new(),
            created_at: ts,
            updated_at: ts,
        };
        room.validate()?;
        Ok(room)
    }
}

/// Partial update of a room. Renaming or retyping never cascades.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomPatch {
    pub name: Option<String>,
    pub room_type: Option<RoomType>,
}
