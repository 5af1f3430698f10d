//! `SQLite` implementation of [`Repository<Device>`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use smarthome_app::ports::Repository;
use smarthome_domain::device::Device;
use smarthome_domain::error::{NotFoundError, SmartHomeError};
use smarthome_domain::id::{DeviceId, EntityKind};

use crate::column;
use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`Device`].
struct Wrapper(Device);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Device> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Device {
            id: column::parsed(row, "id")?,
            name: row.try_get("name")?,
            manufacturer: row.try_get("manufacturer")?,
            device_type: column::parsed(row, "device_type")?,
            status: column::parsed(row, "status")?,
            room_id: column::parsed_opt(row, "room_id")?,
            created_at: column::timestamp(row, "created_at")?,
            updated_at: column::timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO devices (id, name, manufacturer, device_type, status, room_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM devices WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM devices ORDER BY created_at, id";
const UPDATE: &str = "UPDATE devices SET name = ?, manufacturer = ?, device_type = ?, status = ?, room_id = ?, updated_at = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM devices WHERE id = ? RETURNING *";

/// `SQLite`-backed device repository.
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl Repository<Device> for SqliteDeviceRepository {
    fn find_all(&self) -> impl Future<Output = Result<Vec<Device>, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn find_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        let id = id.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn create(&self, device: Device) -> impl Future<Output = Result<Device, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(device.id.as_str())
                .bind(&device.name)
                .bind(&device.manufacturer)
                .bind(device.device_type.as_str())
                .bind(device.status.as_str())
                .bind(device.room_id.as_ref().map(|id| id.as_str()))
                .bind(device.created_at.to_rfc3339())
                .bind(device.updated_at.to_rfc3339())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(device)
        }
    }

    fn update(&self, device: Device) -> impl Future<Output = Result<Device, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(UPDATE)
                .bind(&device.name)
                .bind(&device.manufacturer)
                .bind(device.device_type.as_str())
                .bind(device.status.as_str())
                .bind(device.room_id.as_ref().map(|id| id.as_str()))
                .bind(device.updated_at.to_rfc3339())
                .bind(device.id.as_str())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            if result.rows_affected() == 0 {
                return Err(NotFoundError {
                    entity: EntityKind::Device,
                    id: device.id.to_string(),
                }
                .into());
            }
            Ok(device)
        }
    }

    fn delete_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        let id = id.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(DELETE_BY_ID)
                .bind(id)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }
}
