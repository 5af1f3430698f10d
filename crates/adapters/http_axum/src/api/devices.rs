//! JSON REST handlers for devices.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use smarthome_app::ports::{Notifier, Repository, UserRepository};
use smarthome_domain::device::{Device, DevicePatch, DeviceStatus, DeviceType};
use smarthome_domain::id::{DeviceId, RoomId};
use smarthome_domain::room::Room;

use super::{
    CreateResponse, DeleteResponse, GetResponse, JsonBody, ListResponse, PatchResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a device. `type` and `status` are kept as text
/// so an unknown value is reported as a validation error.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeviceRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub status: Option<String>,
    pub room_id: Option<String>,
}

/// Request body for patching a device. `"roomId": null` detaches it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchDeviceRequest {
    pub name: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub room_id: Option<Option<String>>,
}

impl PatchDeviceRequest {
    fn into_patch(self) -> Result<DevicePatch, ApiError> {
        let status = self
            .status
            .map(|raw| raw.parse::<DeviceStatus>())
            .transpose()?;
        let room_id = match self.room_id {
            Some(Some(raw)) => Some(Some(raw.parse::<RoomId>()?)),
            Some(None) => Some(None),
            None => None,
        };
        Ok(DevicePatch {
            name: self.name,
            status,
            room_id,
        })
    }
}

/// `GET /api/v1/devices`
pub async fn list<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
) -> Result<ListResponse<Device>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let devices = state.device_service.list_devices().await?;
    Ok(ListResponse::Ok(Json(devices)))
}

/// `GET /api/v1/devices/{id}`
pub async fn get<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
    Path(id): Path<String>,
) -> Result<GetResponse<Device>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let device_id: DeviceId = id.parse()?;
    let device = state.device_service.get_device(&device_id).await?;
    Ok(GetResponse::Ok(Json(device)))
}

/// `POST /api/v1/devices`
pub async fn create<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
    JsonBody(req): JsonBody<CreateDeviceRequest>,
) -> Result<CreateResponse<Device>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let mut builder = Device::builder()
        .name(req.name)
        .manufacturer(req.manufacturer);
    if let Some(raw) = req.device_type {
        builder = builder.device_type(raw.parse::<DeviceType>()?);
    }
    if let Some(raw) = req.status {
        builder = builder.status(raw.parse::<DeviceStatus>()?);
    }
    if let Some(raw) = req.room_id {
        builder = builder.room_id(raw.parse::<RoomId>()?);
    }

    let device = builder.build()?;
    let created = state.device_service.create_device(device).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PATCH /api/v1/devices/{id}`
pub async fn patch<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<PatchDeviceRequest>,
) -> Result<PatchResponse<Device>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let device_id: DeviceId = id.parse()?;
    let patch = req.into_patch()?;
    let patched = state.device_service.patch_device(&device_id, patch).await?;
    Ok(patched.into())
}

/// `DELETE /api/v1/devices/{id}`
pub async fn delete<D, R, U, N>(
    State(state): State<AppState<D, R, U, N>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse<Device>, ApiError>
where
    D: Repository<Device> + Send + Sync + 'static,
    R: Repository<Room> + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let device_id: DeviceId = id.parse()?;
    let deleted = state.device_service.delete_device(&device_id).await?;
    Ok(DeleteResponse::Deleted(Json(deleted)))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::api::testing;
    use crate::router::build;

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn should_create_device_with_created_status() {
        let app = build(testing::state());

        let response = app
            .oneshot(post(
                "/api/v1/devices",
                r#"{"name":"Lamp","manufacturer":"IKEA","type":"lightswitch"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn should_answer_bad_request_for_unparsable_body() {
        let app = build(testing::state());

        let response = app
            .oneshot(post("/api/v1/devices", r#"{"name":"Lamp","#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_answer_bad_request_for_mistyped_field() {
        let app = build(testing::state());

        let response = app
            .oneshot(post(
                "/api/v1/devices",
                r#"{"name":42,"manufacturer":"IKEA","type":"lightswitch"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_answer_bad_request_without_json_content_type() {
        let app = build(testing::state());
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/devices")
            .body(Body::from(r#"{"name":"Lamp","manufacturer":"IKEA","type":"lightswitch"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_reject_unknown_device_type() {
        let app = build(testing::state());

        let response = app
            .oneshot(post(
                "/api/v1/devices",
                r#"{"name":"Lamp","manufacturer":"IKEA","type":"toaster"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_reject_missing_room_reference() {
        let app = build(testing::state());

        let response = app
            .oneshot(post(
                "/api/v1/devices",
                r#"{"name":"Lamp","manufacturer":"IKEA","type":"lightswitch","roomId":"room_none"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_return_bad_request_when_path_id_malformed() {
        let app = build(testing::state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/devices/room_ab12")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_return_not_found_when_device_missing() {
        let app = build(testing::state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/devices/device_ab12")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
