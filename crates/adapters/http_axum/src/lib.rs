//! # smarthome-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON REST API** under `/api/v1` for devices, rooms and users
//! - Parse path identifiers and request bodies into domain types, rejecting
//!   malformed input with `400` before any service call
//! - Map application results into HTTP responses (`201` on create, `200`
//!   otherwise) and domain errors into status codes
//!
//! ## Dependency rule
//! Depends on `smarthome-app` (for port traits and services) and `smarthome-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
