//! Device service — device CRUD and the `room.deviceList` back-reference.

use smarthome_domain::device::{Device, DevicePatch};
use smarthome_domain::error::{NotFoundError, SmartHomeError, ValidationError};
use smarthome_domain::id::{DeviceId, EntityKind, RoomId};
use smarthome_domain::notification::{Notification, Operation};
use smarthome_domain::patch::{self, Patched};
use smarthome_domain::room::Room;
use smarthome_domain::time::now;

use crate::cascade::{Cascade, Step};
use crate::ports::{Notifier, Repository};

/// Application service for device operations.
///
/// Every write keeps both sides of the device/room relationship in sync:
/// `device.roomId = R` if and only if `R.deviceList` contains the device.
pub struct DeviceService<D, R, N> {
    devices: D,
    rooms: R,
    notifier: N,
}

impl<D, R, N> DeviceService<D, R, N>
where
    D: Repository<Device>,
    R: Repository<Room>,
    N: Notifier,
{
    /// Create a new service backed by the given repositories and notifier.
    pub fn new(devices: D, rooms: R, notifier: N) -> Self {
        Self {
            devices,
            rooms,
            notifier,
        }
    }

    /// List all devices.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_devices(&self) -> Result<Vec<Device>, SmartHomeError> {
        self.devices.find_all().await
    }

    /// Look up a device by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] when no device with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_device(&self, id: &DeviceId) -> Result<Device, SmartHomeError> {
        self.devices.find_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: EntityKind::Device,
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Create a device and register it in its room, if it has one.
    ///
    /// The room is checked before anything is written, so no device is
    /// ever created pointing at a missing room. If the room update fails
    /// afterwards the device is kept and the inconsistency is logged.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] if invariants fail or the room
    /// does not exist, [`SmartHomeError::Conflict`] on a duplicate id, or a
    /// storage error from the device write.
    #[tracing::instrument(skip(self, device), fields(device_id = %device.id))]
    pub async fn create_device(&self, device: Device) -> Result<Device, SmartHomeError> {
        let mut cascade = Cascade::begin("create_device", &device.id);

        device.validate()?;
        let room = match &device.room_id {
            Some(room_id) => Some(self.require_room(room_id).await?),
            None => None,
        };

        cascade.advance(Step::MutatePrimary);
        let created = self.devices.create(device).await?;
        cascade.emit(Notification::of(
            Operation::Create,
            &created,
            format!("device '{}' created", created.name),
        ));

        cascade.advance(Step::MutateDependents);
        if let Some(mut room) = room
            && room.attach_device(&created.id)
        {
            let description = format!("device '{}' added to room", created.id);
            self.save_room(&mut cascade, room, description).await;
        }

        cascade.finish(&self.notifier).await;
        Ok(created)
    }

    /// Apply a partial update to a device.
    ///
    /// Every supplied field is checked before anything is written; a single
    /// failing rule rejects the whole patch. Fields equal to their current
    /// value are ignored, and a patch that changes nothing is reported as
    /// [`Patched::Unchanged`] without a write or a notification.
    ///
    /// When `room_id` changes, the device is added to the new room's list and
    /// removed from the previous room's list after the device is saved.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] if the device does not exist,
    /// [`SmartHomeError::Validation`] for a blank name, a status illegal for
    /// the device's type or a missing target room, or a storage error from
    /// the device write.
    #[tracing::instrument(skip(self, patch))]
    pub async fn patch_device(
        &self,
        id: &DeviceId,
        patch: DevicePatch,
    ) -> Result<Patched<Device>, SmartHomeError> {
        let mut cascade = Cascade::begin("patch_device", id);
        let mut device = self.get_device(id).await?;

        if patch.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ValidationError::EmptyName.into());
        }
        if let Some(status) = patch.status {
            device.device_type.check_status(status)?;
        }
        let room_change = patch.room_id.filter(|next| *next != device.room_id);
        let next_room = match &room_change {
            Some(Some(room_id)) => Some(self.require_room(room_id).await?),
            _ => None,
        };
        // a dangling previous reference simply has nothing to detach from
        let previous_room = match (&room_change, &device.room_id) {
            (Some(_), Some(previous)) => self.rooms.find_by_id(previous).await?,
            _ => None,
        };

        cascade.advance(Step::MutatePrimary);
        let mut changed = patch::apply(&mut device.name, patch.name);
        changed |= patch::apply(&mut device.status, patch.status);
        changed |= patch::apply(&mut device.room_id, room_change);
        if !changed {
            tracing::debug!("patch left device unchanged");
            cascade.finish(&self.notifier).await;
            return Ok(Patched::Unchanged(device));
        }
        device.updated_at = now();
        let device = self.devices.update(device).await?;
        cascade.emit(Notification::of(
            Operation::Update,
            &device,
            format!("device '{}' updated", device.name),
        ));

        cascade.advance(Step::MutateDependents);
        if let Some(mut room) = next_room
            && room.attach_device(&device.id)
        {
            let description = format!("device '{}' added to room", device.id);
            self.save_room(&mut cascade, room, description).await;
        }
        if let Some(mut room) = previous_room
            && device.room_id.as_ref() != Some(&room.id)
            && room.detach_device(&device.id)
        {
            let description = format!("device '{}' removed from room", device.id);
            self.save_room(&mut cascade, room, description).await;
        }

        cascade.finish(&self.notifier).await;
        Ok(Patched::Updated(device))
    }

    /// Delete a device and remove it from its room's device list.
    ///
    /// Returns the deleted device's last stored state.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] if the device does not exist, or
    /// a storage error from the device delete.
    #[tracing::instrument(skip(self))]
    pub async fn delete_device(&self, id: &DeviceId) -> Result<Device, SmartHomeError> {
        let mut cascade = Cascade::begin("delete_device", id);

        let device = self.get_device(id).await?;
        let room = match &device.room_id {
            Some(room_id) => self.rooms.find_by_id(room_id).await?,
            None => None,
        };

        cascade.advance(Step::MutatePrimary);
        let deleted = self.devices.delete_by_id(id).await?.ok_or_else(|| {
            SmartHomeError::from(NotFoundError {
                entity: EntityKind::Device,
                id: id.to_string(),
            })
        })?;
        cascade.emit(Notification::of(
            Operation::Delete,
            &deleted,
            format!("device '{}' deleted", deleted.name),
        ));

        cascade.advance(Step::MutateDependents);
        if let Some(mut room) = room
            && room.detach_device(&deleted.id)
        {
            let description = format!("device '{}' removed from room", deleted.id);
            self.save_room(&mut cascade, room, description).await;
        }

        cascade.finish(&self.notifier).await;
        Ok(deleted)
    }

    /// Load a room that a write is about to reference.
    async fn require_room(&self, id: &RoomId) -> Result<Room, SmartHomeError> {
        self.rooms
            .find_by_id(id)
            .await?
            .ok_or_else(|| ValidationError::UnknownRoom(id.to_string()).into())
    }

    /// Best-effort write of a room whose device list was just changed.
    async fn save_room(&self, cascade: &mut Cascade, mut room: Room, description: String) {
        let room_id = room.id.clone();
        room.updated_at = now();
        match self.rooms.update(room).await {
            Ok(room) => cascade.emit(Notification::of(Operation::Update, &room, description)),
            Err(err) => cascade.dependent_failed(EntityKind::Room, &room_id, &err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{InMemoryRepo, RecordingNotifier};
    use smarthome_domain::device::{DeviceStatus, DeviceType};
    use smarthome_domain::room::RoomType;

    struct Fixture {
        devices: Arc<InMemoryRepo<Device>>,
        rooms: Arc<InMemoryRepo<Room>>,
        notifier: Arc<RecordingNotifier>,
        service: DeviceService<
            Arc<InMemoryRepo<Device>>,
            Arc<InMemoryRepo<Room>>,
            Arc<RecordingNotifier>,
        >,
    }

    fn fixture() -> Fixture {
        let devices = Arc::new(InMemoryRepo::default());
        let rooms = Arc::new(InMemoryRepo::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = DeviceService::new(
            Arc::clone(&devices),
            Arc::clone(&rooms),
            Arc::clone(&notifier),
        );
        Fixture {
            devices,
            rooms,
            notifier,
            service,
        }
    }

    impl Fixture {
        fn seed_room(&self, name: &str) -> RoomId {
            let room = Room::builder()
                .name(name)
                .room_type(RoomType::LivingRoom)
                .build()
                .unwrap();
            let id = room.id.clone();
            self.rooms.insert(room);
            id
        }

        fn room(&self, id: &RoomId) -> Room {
            self.rooms.get(id).unwrap()
        }

        /// Both directions of the device/room relationship agree.
        fn assert_consistent(&self) {
            let devices = self.devices.all();
            let rooms = self.rooms.all();
            for device in &devices {
                if let Some(room_id) = &device.room_id {
                    let room = rooms.iter().find(|r| &r.id == room_id).unwrap();
                    assert!(room.contains_device(&device.id));
                }
            }
            for room in &rooms {
                for device_id in &room.device_list {
                    let device = devices.iter().find(|d| &d.id == device_id).unwrap();
                    assert_eq!(device.room_id.as_ref(), Some(&room.id));
                }
            }
        }
    }

    fn lightswitch() -> smarthome_domain::device::DeviceBuilder {
        Device::builder()
            .name("Ceiling light")
            .manufacturer("Shelly")
            .device_type(DeviceType::Lightswitch)
    }

    #[tokio::test]
    async fn should_create_device_with_defaults_when_optional_fields_omitted() {
        let f = fixture();
        let created = f.service.create_device(lightswitch().build().unwrap()).await.unwrap();

        let fetched = f.service.get_device(&created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.status, DeviceStatus::Off);
        assert!(fetched.room_id.is_none());
    }

    #[tokio::test]
    async fn should_add_device_to_room_when_created_with_room() {
        let f = fixture();
        let room_id = f.seed_room("Living room");

        let device = lightswitch().room_id(room_id.clone()).build().unwrap();
        let created = f.service.create_device(device).await.unwrap();

        assert_eq!(f.room(&room_id).device_list, vec![created.id.clone()]);
        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].kind, EntityKind::Device);
        assert_eq!(sent[0].operation, Operation::Create);
        assert_eq!(sent[1].kind, EntityKind::Room);
        assert_eq!(sent[1].operation, Operation::Update);
    }

    #[tokio::test]
    async fn should_reject_create_when_room_missing() {
        let f = fixture();
        let missing: RoomId = "room_zzzz".parse().unwrap();

        let device = lightswitch().room_id(missing).build().unwrap();
        let result = f.service.create_device(device).await;

        assert!(matches!(
            result,
            Err(SmartHomeError::Validation(ValidationError::UnknownRoom(_)))
        ));
        assert_eq!(f.devices.count(), 0);
        assert!(f.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn should_keep_device_when_room_update_fails_after_create() {
        let f = fixture();
        let room_id = f.seed_room("Living room");
        f.rooms.fail_updates_of(room_id.clone());

        let device = lightswitch().room_id(room_id.clone()).build().unwrap();
        let created = f.service.create_device(device).await.unwrap();

        assert!(f.devices.get(&created.id).is_some());
        assert!(f.room(&room_id).device_list.is_empty());
        assert_eq!(f.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn should_reject_illegal_status_for_existing_type() {
        let f = fixture();
        let sensor = Device::builder()
            .name("Front door")
            .manufacturer("Aqara")
            .device_type(DeviceType::DoorSensor)
            .build()
            .unwrap();
        let created = f.service.create_device(sensor).await.unwrap();

        let patch = DevicePatch {
            status: Some(DeviceStatus::On),
            ..DevicePatch::default()
        };
        let err = f.service.patch_device(&created.id, patch).await.unwrap_err();

        let message = err.to_string();
        assert!(matches!(
            err,
            SmartHomeError::Validation(ValidationError::IllegalStatus { .. })
        ));
        assert!(message.contains("open") && message.contains("closed"));
    }

    #[tokio::test]
    async fn should_reject_whole_patch_when_one_field_is_invalid() {
        let f = fixture();
        let created = f.service.create_device(lightswitch().build().unwrap()).await.unwrap();

        let patch = DevicePatch {
            name: Some("Renamed".to_string()),
            status: Some(DeviceStatus::Locked),
            room_id: None,
        };
        assert!(f.service.patch_device(&created.id, patch).await.is_err());

        let stored = f.devices.get(&created.id).unwrap();
        assert_eq!(stored.name, "Ceiling light");
    }

    #[tokio::test]
    async fn should_leave_device_untouched_when_patch_is_noop() {
        let f = fixture();
        let created = f.service.create_device(lightswitch().build().unwrap()).await.unwrap();
        f.notifier.clear();

        let patch = DevicePatch {
            name: Some(created.name.clone()),
            status: Some(created.status),
            room_id: Some(None),
        };
        let result = f.service.patch_device(&created.id, patch).await.unwrap();

        assert!(!result.is_updated());
        assert_eq!(result.get().updated_at, created.updated_at);
        assert!(f.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn should_update_status_and_notify() {
        let f = fixture();
        let created = f.service.create_device(lightswitch().build().unwrap()).await.unwrap();
        f.notifier.clear();

        let patch = DevicePatch {
            status: Some(DeviceStatus::On),
            ..DevicePatch::default()
        };
        let result = f.service.patch_device(&created.id, patch).await.unwrap();

        assert!(result.is_updated());
        assert_eq!(f.devices.get(&created.id).unwrap().status, DeviceStatus::On);
        assert_eq!(f.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn should_move_device_between_rooms() {
        let f = fixture();
        let room_a = f.seed_room("A");
        let room_b = f.seed_room("B");
        let device = lightswitch().room_id(room_a.clone()).build().unwrap();
        let created = f.service.create_device(device).await.unwrap();
        f.notifier.clear();

        let patch = DevicePatch {
            room_id: Some(Some(room_b.clone())),
            ..DevicePatch::default()
        };
        let moved = f.service.patch_device(&created.id, patch).await.unwrap().into_inner();

        assert_eq!(moved.room_id, Some(room_b.clone()));
        assert!(!f.room(&room_a).contains_device(&created.id));
        assert!(f.room(&room_b).contains_device(&created.id));
        // device, new room, previous room
        assert_eq!(f.notifier.sent().len(), 3);
        f.assert_consistent();
    }

    #[tokio::test]
    async fn should_detach_device_when_room_patched_to_null() {
        let f = fixture();
        let room_id = f.seed_room("A");
        let device = lightswitch().room_id(room_id.clone()).build().unwrap();
        let created = f.service.create_device(device).await.unwrap();

        let patch = DevicePatch {
            room_id: Some(None),
            ..DevicePatch::default()
        };
        let detached = f.service.patch_device(&created.id, patch).await.unwrap().into_inner();

        assert!(detached.room_id.is_none());
        assert!(f.room(&room_id).device_list.is_empty());
    }

    #[tokio::test]
    async fn should_reject_move_to_missing_room_without_writing() {
        let f = fixture();
        let room_id = f.seed_room("A");
        let device = lightswitch().room_id(room_id.clone()).build().unwrap();
        let created = f.service.create_device(device).await.unwrap();

        let patch = DevicePatch {
            room_id: Some(Some("room_none".parse().unwrap())),
            ..DevicePatch::default()
        };
        let result = f.service.patch_device(&created.id, patch).await;

        assert!(matches!(
            result,
            Err(SmartHomeError::Validation(ValidationError::UnknownRoom(_)))
        ));
        assert_eq!(f.devices.get(&created.id).unwrap().room_id, Some(room_id));
    }

    #[tokio::test]
    async fn should_return_not_found_when_patching_missing_device() {
        let f = fixture();
        let result = f
            .service
            .patch_device(&"device_none".parse().unwrap(), DevicePatch::default())
            .await;
        assert!(matches!(result, Err(SmartHomeError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_remove_device_from_room_when_deleted() {
        let f = fixture();
        let room_id = f.seed_room("A");
        let device = lightswitch().room_id(room_id.clone()).build().unwrap();
        let created = f.service.create_device(device).await.unwrap();
        f.notifier.clear();

        let deleted = f.service.delete_device(&created.id).await.unwrap();

        assert_eq!(deleted.id, created.id);
        assert!(f.devices.get(&created.id).is_none());
        assert!(f.room(&room_id).device_list.is_empty());
        let sent = f.notifier.sent();
        assert_eq!(sent[0].operation, Operation::Delete);
        assert_eq!(sent[1].kind, EntityKind::Room);
    }

    #[tokio::test]
    async fn should_return_not_found_when_deleting_missing_device() {
        let f = fixture();
        let result = f.service.delete_device(&"device_none".parse().unwrap()).await;
        assert!(matches!(result, Err(SmartHomeError::NotFound(_))));
    }
}
