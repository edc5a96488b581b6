use std::{
    fmt,
    future::{Future, IntoFuture},
    pin::Pin,
    time::Duration,
};

use futures_util::future::try_join_all;
use tokio::sync::oneshot;

use crate::{Error, Notification, Result};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Notifications the caller expects, in order.
///
/// Created by [`Probe::expect_event`](crate::Probe::expect_event). The
/// entries are queued when the expectation is created, not when it is first
/// polled, so the event that triggers them can be sent right after.
///
/// Awaiting yields every matched notification in arrival order, or the first
/// mismatch.
///
/// # Example
///
/// ```ignore
/// let walk = probe.expect_event(EventMatcher::event("walk").on_port("pedLight_server"), 1, None);
/// probe.send_event(OutboundEvent::new("pedestrian", "trafficLight_control")).await?;
/// let received = walk.within(Duration::from_secs(10)).await?;
/// ```
#[must_use = "expectations do nothing unless awaited"]
pub struct Expectation {
    receivers: Vec<oneshot::Receiver<Result<Notification>>>,
    timeout: Option<Duration>,
}

impl Expectation {
    pub(crate) fn new(receivers: Vec<oneshot::Receiver<Result<Notification>>>) -> Self {
        Self {
            receivers,
            timeout: None,
        }
    }

    /// Give up with [`Error::Timeout`] if the notifications have not all
    /// arrived within `timeout`.
    ///
    /// The queued entries are not withdrawn: later notifications still
    /// consume them.
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Number of notifications expected.
    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    async fn run(self) -> Result<Vec<Notification>> {
        let all = try_join_all(
            self.receivers
                .into_iter()
                .map(|rx| async move { rx.await.unwrap_or(Err(Error::ProbeDropped)) }),
        );
        with_deadline(self.timeout, all).await
    }
}

impl IntoFuture for Expectation {
    type Output = Result<Vec<Notification>>;
    type IntoFuture = BoxFuture<Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

impl fmt::Debug for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("count", &self.receivers.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Notifications the caller is waiting for, whatever they turn out to be.
///
/// Created by [`Probe::await_event`](crate::Probe::await_event). Unlike
/// [`Expectation`] a mismatch never fails: each queued entry resolves with
/// the notification that reached it. Use it to wait until the application is
/// in a known state.
#[must_use = "awaited events do nothing unless awaited"]
pub struct AwaitedEvents {
    receivers: Vec<oneshot::Receiver<Notification>>,
    timeout: Option<Duration>,
}

impl AwaitedEvents {
    pub(crate) fn new(receivers: Vec<oneshot::Receiver<Notification>>) -> Self {
        Self {
            receivers,
            timeout: None,
        }
    }

    /// Give up with [`Error::Timeout`] after `timeout`. See [`Expectation::within`].
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    async fn run(self) -> Result<Vec<Notification>> {
        let all = try_join_all(
            self.receivers
                .into_iter()
                .map(|rx| async move { rx.await.map_err(|_| Error::ProbeDropped) }),
        );
        with_deadline(self.timeout, all).await
    }
}

impl IntoFuture for AwaitedEvents {
    type Output = Result<Vec<Notification>>;
    type IntoFuture = BoxFuture<Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

impl fmt::Debug for AwaitedEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwaitedEvents")
            .field("count", &self.receivers.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

async fn with_deadline<T>(
    timeout: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| Error::Timeout(timeout))?,
        None => fut.await,
    }
}
