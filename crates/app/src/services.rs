//! Application services — use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.
//! Writes that touch more than one entity go through [`crate::cascade`].

pub mod device_service;
pub mod room_service;
pub mod user_service;
