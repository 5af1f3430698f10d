//! Storage port — one repository contract shared by every entity kind.

use std::future::Future;
use std::sync::Arc;

use smarthome_domain::error::SmartHomeError;
use smarthome_domain::id::RoomId;
use smarthome_domain::record::Record;
use smarthome_domain::user::User;

/// Persistence for one entity kind.
///
/// Absence is reported as `Ok(None)`, never as an error. Failures are
/// [`SmartHomeError::Storage`], or [`SmartHomeError::Conflict`] when a
/// uniqueness constraint (id, user email) is violated.
pub trait Repository<R: Record> {
    /// Every stored entity, in no particular order.
    fn find_all(&self) -> impl Future<Output = Result<Vec<R>, SmartHomeError>> + Send;

    /// Look up one entity.
    fn find_by_id(
        &self,
        id: &R::Id,
    ) -> impl Future<Output = Result<Option<R>, SmartHomeError>> + Send;

    /// Persist a new entity.
    fn create(&self, record: R) -> impl Future<Output = Result<R, SmartHomeError>> + Send;

    /// Overwrite an existing entity with an already-mutated snapshot.
    ///
    /// Returns [`SmartHomeError::NotFound`] when the entity vanished since
    /// it was loaded.
    fn update(&self, record: R) -> impl Future<Output = Result<R, SmartHomeError>> + Send;

    /// Remove an entity, returning its last stored state.
    fn delete_by_id(
        &self,
        id: &R::Id,
    ) -> impl Future<Output = Result<Option<R>, SmartHomeError>> + Send;
}

/// Lookups only needed for users.
pub trait UserRepository: Repository<User> {
    /// Find the user owning `email`, if any.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, SmartHomeError>> + Send;

    /// Every user whose `allowed_rooms` contains `room`.
    fn find_by_allowed_room(
        &self,
        room: &RoomId,
    ) -> impl Future<Output = Result<Vec<User>, SmartHomeError>> + Send;
}

impl<R: Record, T: Repository<R> + Send + Sync> Repository<R> for Arc<T> {
    fn find_all(&self) -> impl Future<Output = Result<Vec<R>, SmartHomeError>> + Send {
        (**self).find_all()
    }

    fn find_by_id(
        &self,
        id: &R::Id,
    ) -> impl Future<Output = Result<Option<R>, SmartHomeError>> + Send {
        (**self).find_by_id(id)
    }

    fn create(&self, record: R) -> impl Future<Output = Result<R, SmartHomeError>> + Send {
        (**self).create(record)
    }

    fn update(&self, record: R) -> impl Future<Output = Result<R, SmartHomeError>> + Send {
        (**self).update(record)
    }

    fn delete_by_id(
        &self,
        id: &R::Id,
    ) -> impl Future<Output = Result<Option<R>, SmartHomeError>> + Send {
        (**self).delete_by_id(id)
    }
}

impl<T: UserRepository + Send + Sync> UserRepository for Arc<T> {
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, SmartHomeError>> + Send {
        (**self).find_by_email(email)
    }

    fn find_by_allowed_room(
        &self,
        room: &RoomId,
    ) -> impl Future<Output = Result<Vec<User>, SmartHomeError>> + Send {
        (**self).find_by_allowed_room(room)
    }
}
