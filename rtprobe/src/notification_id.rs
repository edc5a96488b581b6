use std::fmt;

use uuid::Uuid;

/// Identifier of one decoded inbound [`Notification`](crate::Notification).
///
/// Two notifications with identical content are still distinct: an
/// application may invoke the same event twice before the test replies, and
/// each invocation holds its own connection. The probe keys retained invoke
/// connections by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub(crate) fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Decoding fills the id in through `Default`, so every decode gets a new one.
impl Default for NotificationId {
    fn default() -> Self {
        Self::fresh()
    }
}
