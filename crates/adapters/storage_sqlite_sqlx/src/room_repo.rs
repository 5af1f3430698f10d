//! `SQLite` implementation of [`Repository<Room>`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use smarthome_app::ports::Repository;
use smarthome_domain::error::{NotFoundError, SmartHomeError};
use smarthome_domain::id::{EntityKind, RoomId};
use smarthome_domain::room::Room;

use crate::column;
use crate::error::StorageError;

struct Wrapper(Room);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Room> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Room {
            id: column::parsed(row, "id")?,
            name: row.try_get("name")?,
            room_type: column::parsed(row, "room_type")?,
            device_list: column::json_list(row, "device_list")?,
            created_at: column::timestamp(row, "created_at")?,
            updated_at: column::timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO rooms (id, name, room_type, device_list, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM rooms WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM rooms ORDER BY created_at, id";
const UPDATE: &str =
    "UPDATE rooms SET name = ?, room_type = ?, device_list = ?, updated_at = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM rooms WHERE id = ? RETURNING *";

/// `SQLite`-backed room repository.
pub struct SqliteRoomRepository {
    pool: SqlitePool,
}

impl SqliteRoomRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl Repository<Room> for SqliteRoomRepository {
    fn find_all(&self) -> impl Future<Output = Result<Vec<Room>, SmartHomeError>> + Send {
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
        id: &RoomId,
    ) -> impl Future<Output = Result<Option<Room>, SmartHomeError>> + Send {
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

    fn create(&self, room: Room) -> impl Future<Output = Result<Room, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let device_list = column::to_json(&room.device_list)?;
            sqlx::query(INSERT)
                .bind(room.id.as_str())
                .bind(&room.name)
                .bind(room.room_type.as_str())
                .bind(device_list)
                .bind(room.created_at.to_rfc3339())
                .bind(room.updated_at.to_rfc3339())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(room)
        }
    }

    fn update(&self, room: Room) -> impl Future<Output = Result<Room, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let device_list = column::to_json(&room.device_list)?;
            let result = sqlx::query(UPDATE)
                .bind(&room.name)
                .bind(room.room_type.as_str())
                .bind(device_list)
                .bind(room.updated_at.to_rfc3339())
                .bind(room.id.as_str())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            if result.rows_affected() == 0 {
                return Err(NotFoundError {
                    entity: EntityKind::Room,
                    id: room.id.to_string(),
                }
                .into());
            }
            Ok(room)
        }
    }

    fn delete_by_id(
        &self,
        id: &RoomId,
    ) -> impl Future<Output = Result<Option<Room>, SmartHomeError>> + Send {
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
