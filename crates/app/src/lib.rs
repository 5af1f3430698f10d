//! # smarthome-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Repository<R>` — find/create/update/delete for one entity kind
//!   - `UserRepository` — the extra lookups users need (email, allowed room)
//!   - `Notifier` — fire-and-forget change notifications
//! - Define **driving/inbound ports** as use-case structs:
//!   - `DeviceService` — device CRUD, keeps `room.deviceList` in sync
//!   - `RoomService` — room CRUD, detaches devices and users on delete
//!   - `UserService` — user CRUD, enforces unique email and valid room refs
//! - Provide **in-process infrastructure** (broadcast notifier) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `smarthome-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod cascade;
pub mod notifier;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
