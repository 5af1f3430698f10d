//! Notification port — fire-and-forget change events.

use std::future::Future;

use smarthome_domain::error::SmartHomeError;
use smarthome_domain::notification::Notification;

/// Publishes change notifications to whoever listens.
///
/// Implementations must not wait on the remote side: an error means the
/// notification could not even be handed over, and callers only log it.
pub trait Notifier {
    /// Hand a notification over for delivery.
    fn publish(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), SmartHomeError>> + Send;
}

impl<T: Notifier + Send + Sync> Notifier for std::sync::Arc<T> {
    fn publish(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), SmartHomeError>> + Send {
        (**self).publish(notification)
    }
}
