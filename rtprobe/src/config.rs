use std::net::{IpAddr, Ipv4Addr};

/// Connection settings for a [`Probe`](crate::Probe).
///
/// Names the RT application the probe sends commands to and controls how
/// the inbound listener is bound. Use the builder methods to customize, or
/// [`ProbeConfig::new`] for the defaults.
///
/// # Examples
///
/// ```rust
/// use rtprobe::ProbeConfig;
///
/// let config = ProbeConfig::new("localhost", 9911)
///     .with_read_buffer_size(16 * 1024)
///     .with_logging(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Host where the RT application runs.
    /// Default: `localhost`
    host: String,

    /// Port where the RT application accepts commands.
    /// Default: 9911
    port: u16,

    /// Address the inbound listener binds to.
    /// Default: `127.0.0.1`
    listen_address: IpAddr,

    /// Size of a single socket read. One read is decoded as one message.
    /// Default: 64 KiB
    read_buffer_size: usize,

    /// Whether trace output starts enabled.
    /// Default: false
    logging: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            host: "localhost".to_string(),
            port: 9911,
            listen_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            read_buffer_size: 64 * 1024,
            logging: false,
        }
    }
}

impl ProbeConfig {
    /// Create a configuration for the RT application at `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::default().with_host(host).with_port(port)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Returns the RT application host.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Returns the RT application command port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Set the address the inbound listener binds to.
    pub fn with_listen_address(mut self, address: IpAddr) -> Self {
        self.listen_address = address;
        self
    }

    pub fn listen_address(&self) -> IpAddr {
        self.listen_address
    }

    /// Set the size of a single socket read.
    ///
    /// Messages longer than this are split across reads and will fail to
    /// decode on the inbound side. Values below 1 are clamped to 1.
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    /// Set whether trace output starts enabled.
    ///
    /// Can be toggled later with [`Probe::enable_logging`](crate::Probe::enable_logging).
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    pub fn logging(&self) -> bool {
        self.logging
    }

    /// Returns `host:port` of the RT application.
    pub(crate) fn remote_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_loopback() {
        let config = ProbeConfig::default();
        assert_eq!(config.listen_address(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.read_buffer_size(), 64 * 1024);
        assert!(!config.logging());
    }

    #[test]
    fn remote_address_joins_host_and_port() {
        let config = ProbeConfig::new("rt-host", 4001);
        assert_eq!(config.remote_address(), "rt-host:4001");
    }

    #[test]
    fn read_buffer_size_is_never_zero() {
        let config = ProbeConfig::default().with_read_buffer_size(0);
        assert_eq!(config.read_buffer_size(), 1);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: ProbeConfig = serde_json::from_str(r#"{"host":"rt","port":1234}"#).unwrap();
        assert_eq!(config, ProbeConfig::new("rt", 1234));
    }
}
