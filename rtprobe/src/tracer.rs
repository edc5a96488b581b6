use std::{
    net::SocketAddr,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::{Error, Notification, internal::RouteOutcome, wire::ReplyMessage};

/// Logs probe activity to the `tracing` crate while logging is enabled.
///
/// Every probe owns one tracer, switched with
/// [`Probe::enable_logging`](crate::Probe::enable_logging). Log levels:
/// - `trace` - raw bytes received
/// - `debug` - connections, routing, commands
/// - `warn` - undecodable payloads, socket errors
#[derive(Debug, Default)]
pub(crate) struct Tracer {
    enabled: AtomicBool,
}

impl Tracer {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub(crate) fn listening(&self, addr: SocketAddr) {
        if self.is_enabled() {
            tracing::debug!(addr = %addr, "listening for events");
        }
    }

    pub(crate) fn stopped(&self, addr: SocketAddr, released: usize) {
        if self.is_enabled() {
            tracing::debug!(addr = %addr, released, "stopped listening for events");
        }
    }

    pub(crate) fn accept_failed(&self, err: &std::io::Error) {
        if self.is_enabled() {
            tracing::warn!(error = %err, "failed to accept connection");
        }
    }

    pub(crate) fn connection_accepted(&self, peer: SocketAddr) {
        if self.is_enabled() {
            tracing::debug!(peer = %peer, "message received from RT application");
        }
    }

    pub(crate) fn payload_received(&self, peer: SocketAddr, bytes: &[u8]) {
        if self.is_enabled() {
            tracing::trace!(peer = %peer, data = %String::from_utf8_lossy(bytes), "connection data");
        }
    }

    pub(crate) fn decode_failed(&self, peer: SocketAddr, err: &serde_json::Error) {
        if self.is_enabled() {
            tracing::warn!(peer = %peer, error = %err, "payload not parseable as JSON, closing");
        }
    }

    pub(crate) fn connection_closed(&self, peer: SocketAddr) {
        if self.is_enabled() {
            tracing::debug!(peer = %peer, "connection closed");
        }
    }

    pub(crate) fn connection_error(&self, peer: SocketAddr, err: &std::io::Error) {
        if self.is_enabled() {
            tracing::warn!(peer = %peer, error = %err, "connection error");
        }
    }

    pub(crate) fn routed(&self, notification: &Notification, outcome: &RouteOutcome) {
        if !self.is_enabled() {
            return;
        }
        if let Some(Err(mismatch)) = &outcome.awaited {
            tracing::debug!(event = %notification.event(), mismatch = %mismatch, "awaited entry consumed by a different event");
        }
        if let Some(Err(mismatch)) = &outcome.expected {
            tracing::debug!(event = %notification.event(), mismatch = %mismatch, "expected entry rejected");
        }
        tracing::debug!(
            id = %notification.id(),
            event = %notification.event(),
            port = %notification.port(),
            command = %notification.command(),
            awaited = outcome.awaited.is_some(),
            expected = outcome.expected.is_some(),
            "notification routed"
        );
    }

    pub(crate) fn connected(&self, remote: &str) {
        if self.is_enabled() {
            tracing::debug!(remote = %remote, "TCP connection established with the RT application");
        }
    }

    pub(crate) fn connect_failed(&self, remote: &str, err: &std::io::Error) {
        if self.is_enabled() {
            tracing::warn!(remote = %remote, error = %err, "TCP connection failed with the RT application");
        }
    }

    pub(crate) fn command_failed(&self, remote: &str, err: &Error) {
        if self.is_enabled() {
            tracing::warn!(remote = %remote, error = %err, "command failed");
        }
    }

    pub(crate) fn reply_result(&self, result: &[ReplyMessage]) {
        if self.is_enabled() {
            tracing::debug!(result = ?result, "reply");
        }
    }

    pub(crate) fn reply_sent(&self, notification: &Notification, event: &str) {
        if self.is_enabled() {
            tracing::debug!(invoked = %notification.event(), reply = %event, port = %notification.port(), "reply sent");
        }
    }

    pub(crate) fn reply_write_failed(&self, notification: &Notification, err: &std::io::Error) {
        if self.is_enabled() {
            tracing::warn!(invoked = %notification.event(), error = %err, "failed to write reply");
        }
    }
}
