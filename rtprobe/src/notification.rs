use serde::{Deserialize, Serialize};

use crate::{NotificationId, wire::Command};

/// An event notification pushed by the RT application to the probe's listener.
///
/// Decoded once per inbound payload and handed, by clone, to both expectation
/// queues. For [`Command::InvokeEvent`] notifications the probe keeps the
/// connection open; pass the notification to
/// [`Probe::reply_event`](crate::Probe::reply_event) to answer it.
///
/// Wire shape:
///
/// ```json
/// { "event": "lightChanged", "command": "sendEvent", "port": "trafficLight_control", "data": "RTString\"Green\"" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(skip)]
    id: NotificationId,
    event: String,
    command: Command,
    #[serde(default)]
    port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    port_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<String>,
}

impl Notification {
    /// Decode one inbound payload. A fresh id is assigned to every decode.
    pub(crate) fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn id(&self) -> NotificationId {
        self.id
    }

    /// Name of the event.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Port of the RT application the event was sent from.
    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn port_index(&self) -> Option<u32> {
        self.port_index
    }

    /// Opaque payload in the application's data encoding.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn command(&self) -> Command {
        self.command
    }

    /// True if the application expects a reply to this event.
    pub fn is_invoked(&self) -> bool {
        self.command == Command::InvokeEvent
    }
}
