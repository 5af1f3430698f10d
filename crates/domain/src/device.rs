//! Device — a controllable or observable thing placed in at most one room.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SmartHomeError, ValidationError};
use crate::id::{DeviceId, EntityKind, RoomId};
use crate::record::Record;
use crate::time::{Timestamp, now};

/// Supported kinds of device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceType {
    Lightswitch,
    Thermostat,
    SmartLock,
    WindowShade,
    WindowSensor,
    DoorSensor,
}

impl DeviceType {
    pub const ALL: [Self; 6] = [
        Self::Lightswitch,
        Self::Thermostat,
        Self::SmartLock,
        Self::WindowShade,
        Self::WindowSensor,
        Self::DoorSensor,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lightswitch => "lightswitch",
            Self::Thermostat => "thermostat",
            Self::SmartLock => "smart-lock",
            Self::WindowShade => "window-shade",
            Self::WindowSensor => "window-sensor",
            Self::DoorSensor => "door-sensor",
        }
    }

    /// Status values a device of this type may hold.
    #[must_use]
    pub fn allowed_statuses(self) -> &'static [DeviceStatus] {
        match self {
            Self::Lightswitch | Self::Thermostat => &[DeviceStatus::On, DeviceStatus::Off],
            Self::SmartLock => &[DeviceStatus::Locked, DeviceStatus::Unlocked],
            Self::WindowShade | Self::WindowSensor | Self::DoorSensor => {
                &[DeviceStatus::Open, DeviceStatus::Closed]
            }
        }
    }

    fn allowed_names(self) -> &'static [&'static str] {
        match self {
            Self::Lightswitch | Self::Thermostat => &["on", "off"],
            Self::SmartLock => &["locked", "unlocked"],
            Self::WindowShade | Self::WindowSensor | Self::DoorSensor => &["open", "closed"],
        }
    }

    /// Status assigned when a device is created without one.
    #[must_use]
    pub fn default_status(self) -> DeviceStatus {
        match self {
            Self::Lightswitch | Self::Thermostat => DeviceStatus::Off,
            Self::SmartLock => DeviceStatus::Locked,
            Self::WindowShade | Self::WindowSensor | Self::DoorSensor => DeviceStatus::Closed,
        }
    }

    /// Enforce the status-legality table for this type.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::IllegalStatus`] naming the type and the
    /// allowed set when `status` is not legal.
    pub fn check_status(self, status: DeviceStatus) -> Result<(), ValidationError> {
        if self.allowed_statuses().contains(&status) {
            return Ok(());
        }
        Err(ValidationError::IllegalStatus {
            device_type: self.as_str().to_string(),
            status: status.as_str().to_string(),
            allowed: self.allowed_names(),
        })
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::UnsupportedDeviceType(s.to_string()))
    }
}

/// Every status value known across device types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    On,
    Off,
    Locked,
    Unlocked,
    Open,
    Closed,
}

impl DeviceStatus {
    pub const ALL: [Self; 6] = [
        Self::On,
        Self::Off,
        Self::Locked,
        Self::Unlocked,
        Self::Open,
        Self::Closed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnsupportedStatus(s.to_string()))
    }
}

/// A device, optionally attached to a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub manufacturer: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub status: DeviceStatus,
    pub room_id: Option<RoomId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] when `name` or `manufacturer`
    /// is blank, or when `status` is illegal for `device_type`.
    pub fn validate(&self) -> Result<(), SmartHomeError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.manufacturer.trim().is_empty() {
            return Err(ValidationError::EmptyManufacturer.into());
        }
        self.device_type.check_status(self.status)?;
        Ok(())
    }
}

impl Record for Device {
    type Id = DeviceId;

    const KIND: EntityKind = EntityKind::Device;

    fn id(&self) -> &DeviceId {
        &self.id
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    manufacturer: Option<String>,
    device_type: Option<DeviceType>,
    status: Option<DeviceStatus>,
    room_id: Option<RoomId>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = Some(device_type);
        self
    }

    #[must_use]
    pub fn status(mut self, status: DeviceStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn room_id(mut self, room_id: RoomId) -> Self {
        self.room_id = Some(room_id);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// A fresh id is generated unless one was given, `status` defaults to
    /// the type's default status and both timestamps are set to now.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] if `type` is missing or any
    /// invariant checked by [`Device::validate`] fails.
    pub fn build(self) -> Result<Device, SmartHomeError> {
        let device_type = self
            .device_type
            .ok_or(ValidationError::MissingField("type"))?;
        let ts = now();
        let device = Device {
            id: self.id.unwrap_or_else(DeviceId::generate),
            name: self.name.unwrap_or_default(),
            manufacturer: self.manufacturer.unwrap_or_default(),
            device_type,
            status: self.status.unwrap_or(device_type.default_status()),
            room_id: self.room_id,
            created_at: ts,
            updated_at: ts,
        };
        device.validate()?;
        Ok(device)
    }
}

/// Partial update of a device. `None` means "not supplied".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub status: Option<DeviceStatus>,
    /// `Some(None)` detaches the device from its room.
    pub room_id: Option<Option<RoomId>>,
}
