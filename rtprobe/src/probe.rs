use std::{net::SocketAddr, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    AwaitedEvents, Error, EventMatcher, Expectation, Notification, OutboundEvent, ProbeConfig,
    Result,
    internal::{Engine, Listener, ResponsePolicy},
    wire::{Command, Request, Response},
};

/// Drives and observes one RT application under test.
///
/// A probe does two things:
///
/// - **Listens** for event notifications the application pushes to it and
///   matches them, in arrival order, against expectations registered with
///   [`expect_event`](Self::expect_event) and [`await_event`](Self::await_event).
/// - **Sends** commands into the application: [`send_event`](Self::send_event),
///   [`invoke_event`](Self::invoke_event), [`reply_event`](Self::reply_event)
///   and [`send_json`](Self::send_json), each over a fresh connection.
///
/// Each probe owns its own queues and listener, so several probes can run
/// side by side against different applications.
///
/// # Example
///
/// ```rust,no_run
/// use rtprobe::{EventMatcher, OutboundEvent, Probe};
///
/// #[tokio::main]
/// async fn main() -> rtprobe::Result {
///     let probe = Probe::new("localhost", 9911);
///     probe.start_listen_for_events(2234).await?;
///
///     let walk = probe.expect_event(EventMatcher::event("walk").on_port("pedLight_server"), 1, None);
///     probe.send_event(OutboundEvent::new("pedestrian", "trafficLight_control")).await?;
///     walk.await?;
///
///     probe.stop_listen_for_events().await;
///     Ok(())
/// }
/// ```
///
/// # Ordering
///
/// Both expectation queues are strict FIFO. Every notification is checked
/// against the head of each queue and that head is consumed, matching or
/// not. A notification arriving out of order therefore fails the oldest
/// pending expectation and is not retried against later ones.
///
/// # Time limits
///
/// The probe never times out or retries on its own. Stopping the listener
/// leaves pending expectations pending; bound them with
/// [`Expectation::within`] or the test framework's own timeout.
pub struct Probe {
    engine: Arc<Engine>,
    listener: Mutex<Option<Listener>>,
}

impl Probe {
    /// Create a probe for the RT application at `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_config(ProbeConfig::new(host, port))
    }

    pub fn with_config(config: ProbeConfig) -> Self {
        Self {
            engine: Arc::new(Engine::new(config)),
            listener: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.engine.config
    }

    /// Enable or disable trace output. Disabled by default.
    ///
    /// Output goes to the `tracing` crate; install a subscriber to see it.
    pub fn enable_logging(&self, enabled: bool) {
        self.engine.tracer.set_enabled(enabled);
    }

    // ==================== Listening ====================

    /// Start listening for notifications from the RT application on
    /// `receive_port` of the configured listen address.
    ///
    /// Port `0` binds an ephemeral port. Returns the bound address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyListening`] if the probe is already listening,
    /// or [`Error::Io`] if the port cannot be bound.
    pub async fn start_listen_for_events(&self, receive_port: u16) -> Result<SocketAddr> {
        let mut slot = self.listener.lock().await;
        if let Some(listener) = slot.as_ref() {
            return Err(Error::AlreadyListening(listener.local_addr()));
        }
        let addr = SocketAddr::new(self.engine.config.listen_address(), receive_port);
        let listener = Listener::bind(addr, self.engine.clone()).await?;
        let local_addr = listener.local_addr();
        *slot = Some(listener);
        Ok(local_addr)
    }

    /// Stop listening. Closes the listening socket, every open inbound
    /// connection and every connection still waiting for a reply.
    ///
    /// Pending expectations are left pending. Call this when a test is done
    /// so the port is free for the next one.
    pub async fn stop_listen_for_events(&self) {
        let listener = self.listener.lock().await.take();
        if let Some(listener) = listener {
            listener.stop().await;
        }
    }

    /// Address the probe is listening on, if it is listening.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.lock().await.as_ref().map(Listener::local_addr)
    }

    // ==================== Commands ====================

    /// Send an event to a port of the RT application.
    ///
    /// Resolves with the application's status message.
    ///
    /// # Errors
    ///
    /// [`Error::Remote`] if the application rejects the event, or a transport
    /// error if it cannot be reached.
    pub async fn send_event(&self, event: impl Into<OutboundEvent>) -> Result<Option<String>> {
        let request = Request::new(Command::SendEvent, event.into());
        let response = self
            .engine
            .command(&request.encode()?, ResponsePolicy::SkipInvalid)
            .await?
            .into_result()?;
        Ok(response.msg().map(str::to_string))
    }

    /// Invoke an event on a port of the RT application and wait for its replies.
    ///
    /// Resolves with the full response; [`Response::result`] holds the
    /// reply messages.
    ///
    /// # Errors
    ///
    /// [`Error::Remote`] if the application rejects the event,
    /// [`Error::Decode`] if its response is not valid JSON, or a transport
    /// error.
    pub async fn invoke_event(&self, event: impl Into<OutboundEvent>) -> Result<Response> {
        let request = Request::new(Command::InvokeEvent, event.into());
        self.engine
            .command(&request.encode()?, ResponsePolicy::Strict)
            .await?
            .into_result()
    }

    /// Reply to an event the RT application invoked on the probe.
    ///
    /// The reply is written on the connection the invoked event arrived on and
    /// goes to the port it came from. Resolves with a fixed success indicator;
    /// the application does not acknowledge replies.
    ///
    /// # Errors
    ///
    /// [`Error::NotInvoked`] if `invoked` was sent rather than invoked, or
    /// [`Error::NoRetainedConnection`] if it was already replied to or the
    /// listener has been stopped since it arrived.
    pub async fn reply_event(
        &self,
        invoked: &Notification,
        event: &str,
        data: Option<&str>,
    ) -> Result<&'static str> {
        self.engine
            .correlator
            .reply(invoked, event, data, &self.engine.tracer)
            .await
    }

    /// Send a raw JSON command to the RT application.
    ///
    /// The text is written verbatim. Resolves with the application's status
    /// message; any reply messages are traced.
    pub async fn send_json(&self, json: impl Into<String>) -> Result<Option<String>> {
        let json = json.into();
        let response = self
            .engine
            .command(json.as_bytes(), ResponsePolicy::SkipInvalid)
            .await?
            .into_result()?;
        if response.has_result() {
            self.engine.tracer.reply_result(response.result());
        }
        Ok(response.msg().map(str::to_string))
    }

    // ==================== Expectations ====================

    /// Expect `count` notifications matching `matcher`, queued after every
    /// expectation registered before.
    ///
    /// The returned [`Expectation`] resolves with the matched notifications
    /// in arrival order, or fails with [`Error::Mismatch`] as soon as one of
    /// its entries is reached by a notification that does not match.
    /// `label` is appended to the mismatch message.
    pub fn expect_event(
        &self,
        matcher: impl Into<EventMatcher>,
        count: usize,
        label: Option<&str>,
    ) -> Expectation {
        let receivers = self
            .engine
            .registry
            .lock()
            .register_expected(matcher.into(), count, label);
        Expectation::new(receivers)
    }

    /// Wait for `count` notifications, queued after every awaited entry
    /// registered before.
    ///
    /// Never fails on a mismatch: each entry resolves with whichever
    /// notification reaches it. Use it to wait until the application is in a
    /// given state.
    pub fn await_event(&self, matcher: impl Into<EventMatcher>, count: usize) -> AwaitedEvents {
        let receivers = self
            .engine
            .registry
            .lock()
            .register_awaited(matcher.into(), count);
        AwaitedEvents::new(receivers)
    }
}

impl std::fmt::Debug for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probe")
            .field("config", &self.engine.config)
            .field("registry", &*self.engine.registry.lock())
            .field("held_connections", &self.engine.correlator.len())
            .finish_non_exhaustive()
    }
}
