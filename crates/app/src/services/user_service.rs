//! User service — user CRUD with email uniqueness and room references.

use std::collections::HashSet;

use smarthome_domain::error::{NotFoundError, SmartHomeError, ValidationError};
use smarthome_domain::id::{EntityKind, RoomId, UserId};
use smarthome_domain::notification::{Notification, Operation};
use smarthome_domain::patch::{self, Patched};
use smarthome_domain::room::Room;
use smarthome_domain::time::now;
use smarthome_domain::user::{User, UserPatch, check_email, check_unique_rooms};

use crate::ports::{Notifier, Repository, UserRepository};

/// Application service for user operations.
pub struct UserService<U, R, N> {
    users: U,
    rooms: R,
    notifier: N,
}

impl<U, R, N> UserService<U, R, N>
where
    U: UserRepository,
    R: Repository<Room>,
    N: Notifier,
{
    pub fn new(users: U, rooms: R, notifier: N) -> Self {
        Self {
            users,
            rooms,
            notifier,
        }
    }

    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_users(&self) -> Result<Vec<User>, SmartHomeError> {
        self.users.find_all().await
    }

    /// Look up a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] when no user with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, id: &UserId) -> Result<User, SmartHomeError> {
        self.users.find_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: EntityKind::User,
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Create a user.
    ///
    /// The email must not belong to another user, every allowed room must
    /// exist and no room may be listed twice.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] if any rule fails,
    /// [`SmartHomeError::Conflict`] on a duplicate id, or a storage error.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn create_user(&self, user: User) -> Result<User, SmartHomeError> {
        self.ensure_email_free(&user.email, None).await?;
        user.validate()?;
        self.ensure_rooms_exist(&user.allowed_rooms).await?;

        let created = self.users.create(user).await?;
        self.notify(Notification::of(
            Operation::Create,
            &created,
            format!("user '{}' created", created.name),
        ))
        .await;
        Ok(created)
    }

    /// Apply a partial update to a user. `allowed_rooms` replaces the list.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] if the user does not exist,
    /// [`SmartHomeError::Validation`] if any supplied field breaks a rule,
    /// or a storage error.
    #[tracing::instrument(skip(self, patch))]
    pub async fn patch_user(
        &self,
        id: &UserId,
        patch: UserPatch,
    ) -> Result<Patched<User>, SmartHomeError> {
        let mut user = self.get_user(id).await?;

        if patch.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ValidationError::EmptyName.into());
        }
        if let Some(email) = patch.email.as_deref() {
            check_email(email)?;
            if email != user.email {
                self.ensure_email_free(email, Some(&user.id)).await?;
            }
        }
        if let Some(rooms) = patch.allowed_rooms.as_deref() {
            check_unique_rooms(rooms)?;
            self.ensure_rooms_exist(rooms).await?;
        }

        let mut changed = patch::apply(&mut user.name, patch.name);
        changed |= patch::apply(&mut user.email, patch.email);
        // Allowed rooms are a set; a reordered list is not a change.
        let allowed_rooms = patch
            .allowed_rooms
            .filter(|rooms| !same_rooms(rooms, &user.allowed_rooms));
        changed |= patch::apply(&mut user.allowed_rooms, allowed_rooms);
        if !changed {
            return Ok(Patched::Unchanged(user));
        }
        user.updated_at = now();
        let user = self.users.update(user).await?;
        self.notify(Notification::of(
            Operation::Update,
            &user,
            format!("user '{}' updated", user.name),
        ))
        .await;
        Ok(Patched::Updated(user))
    }

    /// Delete a user. Nothing references users, so there is no cascade.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::NotFound`] if the user does not exist, or a
    /// storage error.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, id: &UserId) -> Result<User, SmartHomeError> {
        let deleted = self.users.delete_by_id(id).await?.ok_or_else(|| {
            SmartHomeError::from(NotFoundError {
                entity: EntityKind::User,
                id: id.to_string(),
            })
        })?;
        self.notify(Notification::of(
            Operation::Delete,
            &deleted,
            format!("user '{}' deleted", deleted.name),
        ))
        .await;
        Ok(deleted)
    }

    async fn ensure_email_free(
        &self,
        email: &str,
        except: Option<&UserId>,
    ) -> Result<(), SmartHomeError> {
        match self.users.find_by_email(email).await? {
            Some(owner) if Some(&owner.id) != except => {
                Err(ValidationError::EmailTaken(email.to_string()).into())
            }
            _ => Ok(()),
        }
    }

    async fn ensure_rooms_exist(&self, rooms: &[RoomId]) -> Result<(), SmartHomeError> {
        for room in rooms {
            if self.rooms.find_by_id(room).await?.is_none() {
                return Err(ValidationError::UnknownRoom(room.to_string()).into());
            }
        }
        Ok(())
    }

    async fn notify(&self, notification: Notification) {
        if let Err(err) = self.notifier.publish(notification).await {
            tracing::warn!(error = %err, "notification dropped");
        }
    }
}

fn same_rooms(left: &[RoomId], right: &[RoomId]) -> bool {
    left.len() == right.len()
        && left.iter().collect::<HashSet<_>>() == right.iter().collect::<HashSet<_>>()
}
