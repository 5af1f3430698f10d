//! Shared application state for axum handlers.

use std::sync::Arc;

use smarthome_app::ports::{Notifier, Repository, UserRepository};
use smarthome_app::services::device_service::DeviceService;
use smarthome_app::services::room_service::RoomService;
use smarthome_app::services::user_service::UserService;
use smarthome_domain::device::Device;
use smarthome_domain::room::Room;

/// Device service as wired by [`AppState`].
pub type Devices<D, R, N> = DeviceService<Arc<D>, Arc<R>, Arc<N>>;
/// Room service as wired by [`AppState`].
pub type Rooms<D, R, U, N> = RoomService<Arc<R>, Arc<D>, Arc<U>, Arc<N>>;
/// User service as wired by [`AppState`].
pub type Users<R, U, N> = UserService<Arc<U>, Arc<R>, Arc<N>>;

/// Application state shared across all axum handlers.
///
/// Generic over the three repositories and the notifier to avoid dynamic
/// dispatch. The services share the same repository and notifier instances.
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone` — only the `Arc` wrappers are cloned.
pub struct AppState<D, R, U, N> {
    pub device_service: Arc<Devices<D, R, N>>,
    pub room_service: Arc<Rooms<D, R, U, N>>,
    pub user_service: Arc<Users<R, U, N>>,
}

impl<D, R, U, N> Clone for AppState<D, R, U, N> {
    fn clone(&self) -> Self {
        Self {
            device_service: Arc::clone(&self.device_service),
            room_service: Arc::clone(&self.room_service),
            user_service: Arc::clone(&self.user_service),
        }
    }
}

impl<D, R, U, N> AppState<D, R, U, N>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    /// Wire the services on top of the given adapters.
    pub fn new(devices: D, rooms: R, users: U, notifier: N) -> Self {
        Self::from_arcs(
            Arc::new(devices),
            Arc::new(rooms),
            Arc::new(users),
            Arc::new(notifier),
        )
    }

    /// Like [`AppState::new`] for adapters the caller keeps a handle on,
    /// e.g. a notifier that must be shut down after the server stops.
    pub fn from_arcs(devices: Arc<D>, rooms: Arc<R>, users: Arc<U>, notifier: Arc<N>) -> Self {
        Self {
            device_service: Arc::new(DeviceService::new(
                Arc::clone(&devices),
                Arc::clone(&rooms),
                Arc::clone(&notifier),
            )),
            room_service: Arc::new(RoomService::new(
                Arc::clone(&rooms),
                Arc::clone(&devices),
                Arc::clone(&users),
                Arc::clone(&notifier),
            )),
            user_service: Arc::new(UserService::new(users, rooms, notifier)),
        }
    }
}
