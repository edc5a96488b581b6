mod correlator;
mod engine;
mod listener;
mod outbound;
mod registry;
mod settlement;

pub(crate) use correlator::ReplyCorrelator;
pub(crate) use engine::Engine;
pub(crate) use listener::Listener;
pub(crate) use outbound::ResponsePolicy;
pub(crate) use registry::{Registry, RouteOutcome};
pub(crate) use settlement::Settlement;
