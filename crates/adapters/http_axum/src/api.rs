//! JSON REST API handler modules, mounted under `/api/v1`.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod rooms;
#[allow(clippy::missing_errors_doc)]
pub mod users;

use axum::Json;
use axum::Router;
use axum::extract::{FromRequest, Request};
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::{Deserialize, Deserializer, Serialize};

use smarthome_app::ports::{Notifier, Repository, UserRepository};
use smarthome_domain::device::Device;
use smarthome_domain::patch::Patched;
use smarthome_domain::room::Room;

use crate::error::ApiError;
use crate::state::AppState;

/// JSON request body. Unlike [`Json`], every rejection (missing content
/// type, syntax error, wrong field type) answers 400.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Build the `/api/v1` sub-router.
pub fn routes<D, R, U, N>() -> Router<AppState<D, R, U, N>>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/devices",
            get(devices::list::<D, R, U, N>).post(devices::create::<D, R, U, N>),
        )
        .route(
            "/devices/{id}",
            get(devices::get::<D, R, U, N>)
                .patch(devices::patch::<D, R, U, N>)
                .delete(devices::delete::<D, R, U, N>),
        )
        .route(
            "/rooms",
            get(rooms::list::<D, R, U, N>).post(rooms::create::<D, R, U, N>),
        )
        .route(
            "/rooms/{id}",
            get(rooms::get::<D, R, U, N>)
                .patch(rooms::patch::<D, R, U, N>)
                .delete(rooms::delete::<D, R, U, N>),
        )
        .route(
            "/users",
            get(users::list::<D, R, U, N>).post(users::create::<D, R, U, N>),
        )
        .route(
            "/users/{id}",
            get(users::get::<D, R, U, N>)
                .patch(users::patch::<D, R, U, N>)
                .delete(users::delete::<D, R, U, N>),
        )
}

/// Possible responses from a list endpoint.
pub enum ListResponse<T> {
    Ok(Json<Vec<T>>),
}

impl<T: Serialize> IntoResponse for ListResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from a get endpoint.
pub enum GetResponse<T> {
    Ok(Json<T>),
}

impl<T: Serialize> IntoResponse for GetResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from a create endpoint.
pub enum CreateResponse<T> {
    Created(Json<T>),
}

impl<T: Serialize> IntoResponse for CreateResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (axum::http::StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from a patch endpoint. Both carry the current state.
pub enum PatchResponse<T> {
    Updated(Json<T>),
    Unchanged(Json<T>),
}

impl<T> From<Patched<T>> for PatchResponse<T> {
    fn from(value: Patched<T>) -> Self {
        match value {
            Patched::Updated(inner) => Self::Updated(Json(inner)),
            Patched::Unchanged(inner) => Self::Unchanged(Json(inner)),
        }
    }
}

impl<T: Serialize> IntoResponse for PatchResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Updated(json) | Self::Unchanged(json) => json.into_response(),
        }
    }
}

/// Possible responses from a delete endpoint: the removed entity.
pub enum DeleteResponse<T> {
    Deleted(Json<T>),
}

impl<T: Serialize> IntoResponse for DeleteResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Deleted(json) => json.into_response(),
        }
    }
}

/// Keep `null` distinct from an absent field: absent is `None`, `null` is
/// `Some(None)`. Use together with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
