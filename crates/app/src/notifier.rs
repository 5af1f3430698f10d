//! In-process notifier backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use smarthome_domain::error::SmartHomeError;
use smarthome_domain::notification::Notification;

use crate::ports::Notifier;

/// In-process notifier using a tokio [`broadcast`] channel.
///
/// Used when no broker is configured. Publishing succeeds even when there
/// are no active subscribers (the notification is simply dropped).
pub struct InProcessNotifier {
    sender: broadcast::Sender<Notification>,
}

impl InProcessNotifier {
    /// Create a new notifier with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to notifications published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Notifier for InProcessNotifier {
    fn publish(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), SmartHomeError>> + Send {
        // send fails only when nobody listens, which is fine
        let _ = self.sender.send(notification);
        async { Ok(()) }
    }
}
