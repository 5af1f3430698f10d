//! JSON REST handlers for rooms.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use smarthome_app::ports::{Notifier, Repository, UserRepository};
use smarthome_domain::device::Device;
use smarthome_domain::id::RoomId;
use smarthome_domain::room::{Room, RoomPatch, RoomType};

use super::{
    CreateResponse, DeleteResponse, GetResponse, JsonBody, ListResponse, PatchResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a room. The device list is not accepted here;
/// devices join a room through their own `roomId`.
#[derive(Deserialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: Option<String>,
}

#[derive(Deserialize)]
pub struct PatchRoomRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub room_type: Option<String>,
}

/// `GET /api/v1/rooms`
pub async fn list<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
) -> Result<ListResponse<Room>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let rooms = state.room_service.list_rooms().await?;
    Ok(ListResponse::Ok(Json(rooms)))
}

/// `GET /api/v1/rooms/{id}`
pub async fn get<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
    Path(id): Path<String>,
) -> Result<GetResponse<Room>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let room_id: RoomId = id.parse()?;
    let room = state.room_service.get_room(&room_id).await?;
    Ok(GetResponse::Ok(Json(room)))
}

/// `POST /api/v1/rooms`
pub async fn create<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
    JsonBody(req): JsonBody<CreateRoomRequest>,
) -> Result<CreateResponse<Room>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let mut builder = Room::builder().name(req.name);
    if let Some(raw) = req.room_type {
        builder = builder.room_type(raw.parse::<RoomType>()?);
    }

    let room = builder.build()?;
    let created = state.room_service.create_room(room).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PATCH /api/v1/rooms/{id}`
pub async fn patch<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<PatchRoomRequest>,
) -> Result<PatchResponse<Room>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let room_id: RoomId = id.parse()?;
    let patch = RoomPatch {
        name: req.name,
        room_type: req
            .room_type
            .map(|raw| raw.parse::<RoomType>())
            .transpose()?,
    };
    let patched = state.room_service.patch_room(&room_id, patch).await?;
    Ok(patched.into())
}

/// `DELETE /api/v1/rooms/{id}`
pub async fn delete<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse<Room>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let room_id: RoomId = id.parse()?;
    let deleted = state.room_service.delete_room(&room_id).await?;
    Ok(DeleteResponse::Deleted(Json(deleted)))
}
