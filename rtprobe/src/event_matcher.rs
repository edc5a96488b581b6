//! Matching of inbound notifications against registered expectations.

use std::fmt;

use crate::Notification;

/// Event name that matches any event.
pub const WILDCARD: &str = "*";

/// Describes the notification an expectation is waiting for.
///
/// A matcher names an event (or [`WILDCARD`]) and optionally the port the
/// event must come from. Without a port filter, events from any port match.
///
/// # Example
///
/// ```rust
/// use rtprobe::EventMatcher;
///
/// // "walk" from the pedLight_server port
/// let walk = EventMatcher::event("walk").on_port("pedLight_server");
///
/// // anything from trafficLight_control
/// let any_light = EventMatcher::any().on_port("trafficLight_control");
///
/// // &str converts to an event name matcher
/// let stop: EventMatcher = "stop".into();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventMatcher {
    event: String,
    port: Option<String>,
}

impl EventMatcher {
    /// Match events by name.
    pub fn event(name: impl Into<String>) -> Self {
        Self {
            event: name.into(),
            port: None,
        }
    }

    /// Match any event.
    pub fn any() -> Self {
        Self::event(WILDCARD)
    }

    /// Only match events sent from `port`.
    pub fn on_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn event_name(&self) -> &str {
        &self.event
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// Returns true if `notification` satisfies this matcher.
    pub fn matches(&self, notification: &Notification) -> bool {
        self.check(notification).is_ok()
    }

    /// Check `notification`, describing the first difference found.
    ///
    /// The event name is checked before the port.
    pub(crate) fn check(&self, notification: &Notification) -> Result<(), String> {
        if self.event != WILDCARD && notification.event() != self.event {
            return Err(format!(
                "Received event \"{}\" but expected \"{}\"",
                notification.event(),
                self.event
            ));
        }
        if let Some(port) = &self.port
            && notification.port() != port
        {
            return Err(format!(
                "Received event \"{}\" on port {} but expected it on port \"{}\"",
                notification.event(),
                notification.port(),
                port
            ));
        }
        Ok(())
    }
}

impl fmt::Display for EventMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.port {
            Some(port) => write!(f, "{}@{}", self.event, port),
            None => f.write_str(&self.event),
        }
    }
}

impl From<&str> for EventMatcher {
    fn from(name: &str) -> Self {
        EventMatcher::event(name)
    }
}

impl From<String> for EventMatcher {
    fn from(name: String) -> Self {
        EventMatcher::event(name)
    }
}
