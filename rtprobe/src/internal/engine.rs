use parking_lot::Mutex;

use super::{Registry, ReplyCorrelator, ResponsePolicy, outbound};
use crate::{Notification, ProbeConfig, Result, tracer::Tracer, wire::Response};

/// State shared between a probe and its listener task.
///
/// Routing holds the registry lock for the whole pop-check-settle sequence
/// of both queues, so notifications handled by concurrent connection tasks
/// are consumed in one global order.
#[derive(Debug)]
pub(crate) struct Engine {
    pub(crate) config: ProbeConfig,
    pub(crate) tracer: Tracer,
    pub(crate) registry: Mutex<Registry>,
    pub(crate) correlator: ReplyCorrelator,
}

impl Engine {
    pub(crate) fn new(config: ProbeConfig) -> Self {
        Self {
            tracer: Tracer::new(config.logging()),
            config,
            registry: Mutex::new(Registry::default()),
            correlator: ReplyCorrelator::default(),
        }
    }

    pub(crate) fn route(&self, notification: &Notification) {
        let outcome = self.registry.lock().route(notification);
        self.tracer.routed(notification, &outcome);
    }

    /// Send `payload` to the RT application and return its response.
    pub(crate) async fn command(&self, payload: &[u8], policy: ResponsePolicy) -> Result<Response> {
        outbound::exchange(
            &self.config.remote_address(),
            payload,
            policy,
            self.config.read_buffer_size(),
            &self.tracer,
        )
        .await
    }
}
