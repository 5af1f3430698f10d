//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use smarthome_app::ports::{Notifier, Repository, UserRepository};
use smarthome_domain::device::Device;
use smarthome_domain::room::Room;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the JSON API under `/api/v1`. Includes a [`TraceLayer`] that logs
/// each HTTP request/response at the `DEBUG` level using the `tracing`
/// ecosystem.
pub fn build<D, R, U, N>(state: AppState<D, R, U, N>) -> Router
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
