//! `SQLite` implementation of [`UserRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use smarthome_app::ports::{Repository, UserRepository};
use smarthome_domain::error::{NotFoundError, SmartHomeError};
use smarthome_domain::id::{EntityKind, RoomId, UserId};
use smarthome_domain::user::User;

use crate::column;
use crate::error::StorageError;

struct Wrapper(User);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<User> {
        value.map(|w| w.0)
    }

    fn all(rows: Vec<Self>) -> Vec<User> {
        rows.into_iter().map(|w| w.0).collect()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(User {
            id: column::parsed(row, "id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            allowed_rooms: column::json_list(row, "allowed_rooms")?,
            created_at: column::timestamp(row, "created_at")?,
            updated_at: column::timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO users (id, name, email, allowed_rooms, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM users WHERE id = ?";
const SELECT_BY_EMAIL: &str = "SELECT * FROM users WHERE email = ?";
const SELECT_BY_ALLOWED_ROOM: &str = "SELECT * FROM users WHERE EXISTS (SELECT 1 FROM json_each(users.allowed_rooms) WHERE json_each.value = ?) ORDER BY created_at, id";
const SELECT_ALL: &str = "SELECT * FROM users ORDER BY created_at, id";
const UPDATE: &str =
    "UPDATE users SET name = ?, email = ?, allowed_rooms = ?, updated_at = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM users WHERE id = ? RETURNING *";

/// `SQLite`-backed user repository. Email uniqueness is also enforced by a
/// `UNIQUE` constraint, reported as a conflict.
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl Repository<User> for SqliteUserRepository {
    fn find_all(&self) -> impl Future<Output = Result<Vec<User>, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::all(rows))
        }
    }

    fn find_by_id(
        &self,
        id: &UserId,
    ) -> impl Future<Output = Result<Option<User>, SmartHomeError>> + Send {
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

    fn create(&self, user: User) -> impl Future<Output = Result<User, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let allowed_rooms = column::to_json(&user.allowed_rooms)?;
            sqlx::query(INSERT)
                .bind(user.id.as_str())
                .bind(&user.name)
                .bind(&user.email)
                .bind(allowed_rooms)
                .bind(user.created_at.to_rfc3339())
                .bind(user.updated_at.to_rfc3339())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(user)
        }
    }

    fn update(&self, user: User) -> impl Future<Output = Result<User, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let allowed_rooms = column::to_json(&user.allowed_rooms)?;
            let result = sqlx::query(UPDATE)
                .bind(&user.name)
                .bind(&user.email)
                .bind(allowed_rooms)
                .bind(user.updated_at.to_rfc3339())
                .bind(user.id.as_str())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            if result.rows_affected() == 0 {
                return Err(NotFoundError {
                    entity: EntityKind::User,
                    id: user.id.to_string(),
                }
                .into());
            }
            Ok(user)
        }
    }

    fn delete_by_id(
        &self,
        id: &UserId,
    ) -> impl Future<Output = Result<Option<User>, SmartHomeError>> + Send {
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

impl UserRepository for SqliteUserRepository {
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        let email = email.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_EMAIL)
                .bind(email)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn find_by_allowed_room(
        &self,
        room: &RoomId,
    ) -> impl Future<Output = Result<Vec<User>, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        let room = room.to_string();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_ALLOWED_ROOM)
                .bind(room)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::all(rows))
        }
    }
}
