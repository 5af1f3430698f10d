//! JSON REST handlers for users.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use smarthome_app::ports::{Notifier, Repository, UserRepository};
use smarthome_domain::device::Device;
use smarthome_domain::error::ValidationError;
use smarthome_domain::id::{RoomId, UserId};
use smarthome_domain::room::Room;
use smarthome_domain::user::{User, UserPatch};

use super::{
    CreateResponse, DeleteResponse, GetResponse, JsonBody, ListResponse, PatchResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    pub email: Option<String>,
    #[serde(default)]
    pub allowed_rooms: Vec<String>,
}

/// Request body for patching a user. `allowedRooms` replaces the whole list.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub allowed_rooms: Option<Vec<String>>,
}

fn parse_rooms(raw: &[String]) -> Result<Vec<RoomId>, ValidationError> {
    raw.iter().map(|id| id.parse()).collect()
}

/// `GET /api/v1/users`
pub async fn list<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
) -> Result<ListResponse<User>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let users = state.user_service.list_users().await?;
    Ok(ListResponse::Ok(Json(users)))
}

/// `GET /api/v1/users/{id}`
pub async fn get<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
    Path(id): Path<String>,
) -> Result<GetResponse<User>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let user_id: UserId = id.parse()?;
    let user = state.user_service.get_user(&user_id).await?;
    Ok(GetResponse::Ok(Json(user)))
}

/// `POST /api/v1/users`
pub async fn create<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> Result<CreateResponse<User>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let mut builder = User::builder()
        .name(req.name)
        .allowed_rooms(parse_rooms(&req.allowed_rooms)?);
    if let Some(email) = req.email {
        builder = builder.email(email);
    }

    let user = builder.build()?;
    let created = state.user_service.create_user(user).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PATCH /api/v1/users/{id}`
pub async fn patch<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<PatchUserRequest>,
) -> Result<PatchResponse<User>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let user_id: UserId = id.parse()?;
    let patch = UserPatch {
        name: req.name,
        email: req.email,
        allowed_rooms: req.allowed_rooms.as_deref().map(parse_rooms).transpose()?,
    };
    let patched = state.user_service.patch_user(&user_id, patch).await?;
    Ok(patched.into())
}

/// `DELETE /api/v1/users/{id}`
pub async fn delete<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse<User>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let user_id: UserId = id.parse()?;
    let deleted = state.user_service.delete_user(&user_id).await?;
    Ok(DeleteResponse::Deleted(Json(deleted)))
}
