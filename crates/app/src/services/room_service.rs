//! Room service — room CRUD and the room-delete cascade.

use smarthome_domain::device::Device;
use smarthome_domain::error::{NotFoundError, SmartHomeError, ValidationError};
use smarthome_domain::id::{EntityKind, RoomId};
use smarthome_domain::notification::{Notification, Operation};
use smarthome_domain::patch::{self, Patched};
use smarthome_domain::room::{Room, RoomPatch};
use smarthome_domain::time::now;

use crate::cascade::{Cascade, Step};
use crate::ports::{Notifier, Repository, UserRepository};

/// Application service for room operations.
pub struct RoomService<R, D, U, N> {
    rooms: R,
    devices: D,
    users: U,
    notifier: N,
}

impl<R, D, U, N> RoomService<R, D, U, N>
where
    R: Repository<Room>,
    D: Repository<Device>,
    U: UserRepository,
    N: Notifier,
{
    pub fn new(rooms: R, devices: D, users: U, notifier: N) -> Self {
        Self {
            rooms,
            devices,
            users,
            notifier,
        }
    }

    /// List all rooms.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_rooms(&self) -> Result<Vec<Room>, SmartHomeError> {
        self.rooms.find_all().await
    }

    /// Look up a room by id.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] when no room with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_room(&self, id: &RoomId) -> Result<Room, SmartHomeError> {
        self.rooms.find_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: EntityKind::Room,
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Create a room. A new room always starts with an empty device list;
    /// devices join a room through their own `roomId`.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] if invariants fail,
    /// [`SmartHomeError::Conflict`] on a duplicate id, or a storage error.
    #[tracing::instrument(skip(self, room), fields(room_id = %room.id))]
    pub async fn create_room(&self, mut room: Room) -> Result<Room, SmartHomeError> {
        room.device_list.clear();
        room.validate()?;

        let created = self.rooms.create(room).await?;
        if let Err(err) = self
            .notifier
            .publish(Notification::of(
                Operation::Create,
                &created,
                format!("room '{}' created", created.name),
            ))
            .await
        {
            tracing::warn!(error = %err, "notification dropped");
        }
        Ok(created)
    }

    /// Apply a partial update to a room's name or type.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] if the room does not exist,
    /// [`SmartHomeError::Validation`] for a blank name, or a storage error.
    #[tracing::instrument(skip(self, patch))]
    pub async fn patch_room(
        &self,
        id: &RoomId,
        patch: RoomPatch,
    ) -> Result<Patched<Room>, SmartHomeError> {
        let mut room = self.get_room(id).await?;
        if patch.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ValidationError::EmptyName.into());
        }

        let mut changed = patch::apply(&mut room.name, patch.name);
        changed |= patch::apply(&mut room.room_type, patch.room_type);
        if !changed {
            return Ok(Patched::Unchanged(room));
        }
        room.updated_at = now();
        let room = self.rooms.update(room).await?;
        if let Err(err) = self
            .notifier
            .publish(Notification::of(
                Operation::Update,
                &room,
                format!("room '{}' updated", room.name),
            ))
            .await
        {
            tracing::warn!(error = %err, "notification dropped");
        }
        Ok(Patched::Updated(room))
    }

    /// Delete a room, then detach its devices and revoke it from every user
    /// that was allowed into it.
    ///
    /// The room is removed first. Each dependent write is attempted even if
    /// an earlier one failed; failures are logged and left unresolved.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] if the room does not exist, or a
    /// storage error from the room delete.
    #[tracing::instrument(skip(self))]
    pub async fn delete_room(&self, id: &RoomId) -> Result<Room, SmartHomeError> {
        let mut cascade = Cascade::begin("delete_room", id);
        self.get_room(id).await?;

        cascade.advance(Step::MutatePrimary);
        let deleted = self.rooms.delete_by_id(id).await?.ok_or_else(|| {
            SmartHomeError::from(NotFoundError {
                entity: EntityKind::Room,
                id: id.to_string(),
            })
        })?;
        cascade.emit(Notification::of(
            Operation::Delete,
            &deleted,
            format!("room '{}' deleted", deleted.name),
        ));

        cascade.advance(Step::MutateDependents);
        for device_id in &deleted.device_list {
            let device = match self.devices.find_by_id(device_id).await {
                Ok(Some(device)) => device,
                Ok(None) => {
                    tracing::debug!(%device_id, "listed device no longer exists");
                    continue;
                }
                Err(err) => {
                    cascade.dependent_failed(EntityKind::Device, device_id, &err);
                    continue;
                }
            };
            if device.room_id.as_ref() != Some(&deleted.id) {
                continue;
            }
            let mut device = device;
            device.room_id = None;
            device.updated_at = now();
            match self.devices.update(device).await {
                Ok(device) => cascade.emit(Notification::of(
                    Operation::Update,
                    &device,
                    format!("device '{}' removed from deleted room", device.id),
                )),
                Err(err) => cascade.dependent_failed(EntityKind::Device, device_id, &err),
            }
        }

        match self.users.find_by_allowed_room(&deleted.id).await {
            Ok(users) => {
                for mut user in users {
                    if !user.revoke_room(&deleted.id) {
                        continue;
                    }
                    let user_id = user.id.clone();
                    user.updated_at = now();
                    match self.users.update(user).await {
                        Ok(user) => cascade.emit(Notification::of(
                            Operation::Update,
                            &user,
                            format!("room '{}' revoked from user", deleted.id),
                        )),
                        Err(err) => cascade.dependent_failed(EntityKind::User, &user_id, &err),
                    }
                }
            }
            Err(err) => cascade.dependent_failed(EntityKind::User, "*", &err),
        }

        cascade.finish(&self.notifier).await;
        Ok(deleted)
    }
}
