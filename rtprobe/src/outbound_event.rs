/// An event addressed to a port of the RT application.
///
/// Used by [`Probe::send_event`](crate::Probe::send_event) and
/// [`Probe::invoke_event`](crate::Probe::invoke_event). `data` is passed
/// through untouched in the application's own encoding.
///
/// # Example
///
/// ```rust
/// use rtprobe::OutboundEvent;
///
/// let event = OutboundEvent::new("durationOfInactivity", "trafficLight_control")
///     .with_data("int 5")
///     .with_port_index(1);
/// assert_eq!(event.data(), Some("int 5"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutboundEvent {
    pub(crate) event: String,
    pub(crate) port: String,
    pub(crate) data: Option<String>,
    pub(crate) port_index: Option<u32>,
}

impl OutboundEvent {
    /// An event named `event` for the application port `port`.
    pub fn new(event: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            port: port.into(),
            data: None,
            port_index: None,
        }
    }

    /// Attach a payload in the application's data encoding, e.g. `int 5`.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Target a specific replication index of the port. Index 0 is the default.
    pub fn with_port_index(mut self, index: u32) -> Self {
        self.port_index = Some(index);
        self
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn port_index(&self) -> Option<u32> {
        self.port_index
    }
}

impl<E: Into<String>, P: Into<String>> From<(E, P)> for OutboundEvent {
    fn from((event, port): (E, P)) -> Self {
        OutboundEvent::new(event, port)
    }
}
