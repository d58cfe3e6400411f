use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{session::SessionError, types::Alert};

/// Sending half of the user-visible notification channel.
#[derive(Debug, Clone)]
pub struct Alerts {
    tx: UnboundedSender<Alert>,
}

impl Alerts {
    pub fn channel() -> (Self, UnboundedReceiver<Alert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queues `alert`. Nobody listening is not an error.
    pub fn notify(&self, alert: Alert) {
        let _ = self.tx.send(alert);
    }

    /// Publishes the alert for `error` and hands the error back as `Err`.
    pub fn raise<T>(&self, error: SessionError) -> Result<T, SessionError> {
        if let Some(alert) = error.alert() {
            self.notify(alert);
        }
        Err(error)
    }
}
