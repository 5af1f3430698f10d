//! # smarthome-domain
//!
//! Pure domain model for the smarthome controller.
//!
//! ## Responsibilities
//! - Foundational types: prefixed identifiers, error taxonomy, timestamps
//! - Define **Devices** (typed, with a status constrained by their type)
//! - Define **Rooms** (holding the back-references to their devices)
//! - Define **Users** (holding the rooms they may access)
//! - Define **Notifications** (change records emitted after mutations)
//! - Contain every validation rule that needs no lookup
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod patch;
pub mod record;
pub mod time;

pub mod device;
pub mod notification;
pub mod room;
pub mod user;
