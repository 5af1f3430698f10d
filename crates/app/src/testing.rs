//! In-memory port implementations for unit tests.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use smarthome_domain::error::{ConflictError, NotFoundError, SmartHomeError};
use smarthome_domain::id::RoomId;
use smarthome_domain::notification::Notification;
use smarthome_domain::record::Record;
use smarthome_domain::user::User;

use crate::ports::{Notifier, Repository, UserRepository};

pub struct InMemoryRepo<R: Record> {
    store: Mutex<HashMap<R::Id, R>>,
    failing_updates: Mutex<HashSet<R::Id>>,
}

impl<R: Record> Default for InMemoryRepo<R> {
    fn default() -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
            failing_updates: Mutex::new(HashSet::new()),
        }
    }
}

impl<R: Record> InMemoryRepo<R> {
    /// Seed a record directly, bypassing the service layer.
    pub fn insert(&self, record: R) {
        self.store
            .lock()
            .unwrap()
            .insert(record.id().clone(), record);
    }

    pub fn get(&self, id: &R::Id) -> Option<R> {
        self.store.lock().unwrap().get(id).cloned()
    }

    pub fn all(&self) -> Vec<R> {
        self.store.lock().unwrap().values().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    /// Make every later `update` of `id` fail with a storage error.
    pub fn fail_updates_of(&self, id: R::Id) {
        self.failing_updates.lock().unwrap().insert(id);
    }
}

impl<R: Record> Repository<R> for InMemoryRepo<R> {
    fn find_all(&self) -> impl Future<Output = Result<Vec<R>, SmartHomeError>> + Send {
        let result: Vec<R> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn find_by_id(
        &self,
        id: &R::Id,
    ) -> impl Future<Output = Result<Option<R>, SmartHomeError>> + Send {
        let result = self.get(id);
        async { Ok(result) }
    }

    fn create(&self, record: R) -> impl Future<Output = Result<R, SmartHomeError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = if store.contains_key(record.id()) {
            Err(ConflictError {
                detail: format!("duplicate id {}", record.id()),
            }
            .into())
        } else {
            store.insert(record.id().clone(), record.clone());
            Ok(record)
        };
        async { result }
    }

    fn update(&self, record: R) -> impl Future<Output = Result<R, SmartHomeError>> + Send {
        let failing = self.failing_updates.lock().unwrap().contains(record.id());
        let mut store = self.store.lock().unwrap();
        let result = if failing {
            Err(SmartHomeError::Storage("injected update failure".into()))
        } else if store.contains_key(record.id()) {
            store.insert(record.id().clone(), record.clone());
            Ok(record)
        } else {
            Err(NotFoundError {
                entity: R::KIND,
                id: record.id().to_string(),
            }
            .into())
        };
        async { result }
    }

    fn delete_by_id(
        &self,
        id: &R::Id,
    ) -> impl Future<Output = Result<Option<R>, SmartHomeError>> + Send {
        let result = self.store.lock().unwrap().remove(id);
        async { Ok(result) }
    }
}

impl UserRepository for InMemoryRepo<User> {
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, SmartHomeError>> + Send {
        let result = self
            .store
            .lock()
            .unwrap()
            .values()
            .find(|user| user.email == email)
            .cloned();
        async { Ok(result) }
    }

    fn find_by_allowed_room(
        &self,
        room: &RoomId,
    ) -> impl Future<Output = Result<Vec<User>, SmartHomeError>> + Send {
        let result: Vec<User> = self
            .store
            .lock()
            .unwrap()
            .values()
            .filter(|user| user.allowed_rooms.contains(room))
            .cloned()
            .collect();
        async { Ok(result) }
    }
}

/// Notifier that remembers what it was asked to publish.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    /// A notifier whose every publish fails.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.failing.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn publish(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), SmartHomeError>> + Send {
        let result = if self.failing.load(Ordering::SeqCst) {
            Err(SmartHomeError::Storage("broker unavailable".into()))
        } else {
            self.sent.lock().unwrap().push(notification);
            Ok(())
        };
        async { result }
    }
}
