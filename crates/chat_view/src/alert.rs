use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Success,
}

/// A user-visible, non-blocking notification.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub severity: Severity,
    pub message: String,
}

/// Sending half of the alert channel. The presentation layer owns the receiver.
#[derive(Debug, Clone)]
pub struct AlertChannel {
    tx: mpsc::UnboundedSender<Alert>,
}

impl AlertChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn raise(&self, severity: Severity, message: impl Into<String>) {
        let alert = Alert {
            severity,
            message: message.into(),
        };
        if self.tx.send(alert).is_err() {
            debug!("Alert dropped: no listener");
        }
    }

    pub fn error(&self, message: impl Into<String>) {
        self.raise(Severity::Error, message);
    }
}
