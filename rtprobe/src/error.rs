use std::{sync::Arc, time::Duration};

/// The single error type for all probe operations.
///
/// Every fallible probe API returns `rtprobe::Result<T>` (alias for
/// `Result<T, rtprobe::Error>`). Errors from lower layers (sockets, JSON)
/// are mapped into variants of this enum so callers only need to handle one
/// error type. The enum is `Clone` so a single failure can settle several
/// waiting futures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Connect, read or write failure on a socket.
    #[error("IO error: {0}")]
    Io(#[source] Arc<std::io::Error>),

    /// A response from the RT application could not be parsed.
    #[error("Failed to decode response: {0}")]
    Decode(#[source] Arc<serde_json::Error>),

    /// The RT application answered with `"status": "error"`.
    #[error("{0}")]
    Remote(String),

    /// An expected event did not match the notification that arrived.
    #[error("{0}")]
    Mismatch(String),

    #[error("Attempted to reply to an event that was not invoked.")]
    NotInvoked,

    /// The invoked event's connection was already replied on or released.
    #[error("No connection retained for invoked event '{0}'")]
    NoRetainedConnection(String),

    #[error("Probe is already listening on {0}")]
    AlreadyListening(std::net::SocketAddr),

    /// The peer closed the connection before sending a parseable response.
    #[error("Connection closed before a response was received")]
    ConnectionClosed,

    #[error("Expected events did not arrive within {0:?}")]
    Timeout(Duration),

    /// The probe owning the expectation queues was dropped.
    #[error("Probe dropped before the event arrived")]
    ProbeDropped,
}

impl Error {
    /// Append a caller supplied label to a mismatch message.
    pub(crate) fn with_label(self, label: Option<&str>) -> Self {
        match (self, label) {
            (Error::Mismatch(msg), Some(label)) => Error::Mismatch(format!("{msg}({label})")),
            (other, _) => other,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Io(a), Self::Io(b)) => Arc::ptr_eq(a, b),
            (Self::Decode(a), Self::Decode(b)) => Arc::ptr_eq(a, b),
            (Self::Remote(a), Self::Remote(b)) => a == b,
            (Self::Mismatch(a), Self::Mismatch(b)) => a == b,
            (Self::NotInvoked, Self::NotInvoked) => true,
            (Self::NoRetainedConnection(a), Self::NoRetainedConnection(b)) => a == b,
            (Self::AlreadyListening(a), Self::AlreadyListening(b)) => a == b,
            (Self::ConnectionClosed, Self::ConnectionClosed) => true,
            (Self::Timeout(a), Self::Timeout(b)) => a == b,
            (Self::ProbeDropped, Self::ProbeDropped) => true,
            _ => false,
        }
    }
}

impl Eq for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(Arc::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_appended_to_mismatch() {
        let err = Error::Mismatch("Received event \"green\" but expected \"red\"".into());
        let err = err.with_label(Some("light order"));
        assert_eq!(
            err.to_string(),
            "Received event \"green\" but expected \"red\"(light order)"
        );
    }

    #[test]
    fn label_leaves_other_errors_alone() {
        assert_eq!(Error::NotInvoked.with_label(Some("x")), Error::NotInvoked);
        assert_eq!(
            Error::Mismatch("m".into()).with_label(None),
            Error::Mismatch("m".into())
        );
    }

    #[test]
    fn remote_error_displays_server_message() {
        assert_eq!(Error::Remote("bad port".into()).to_string(), "bad port");
    }
}
