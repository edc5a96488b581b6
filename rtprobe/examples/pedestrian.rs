//! Pedestrian crossing example against a running traffic light application.
//!
//! Expects the RT application's command port on `localhost:9911`, pushing its
//! notifications to the probe on port 2234. The test waits for green, presses
//! the pedestrian button and checks the light sequence that follows:
//!
//! ```text
//! green ─pedestrian─► red ─► walk ─► stop ─► red ─► green
//! ```
//!
//! The probe traces its traffic at debug level, which is enabled below.

use std::time::Duration;

use rtprobe::{EventMatcher, OutboundEvent, Probe, ProbeConfig};

const SERVER: &str = "trafficLight_server";
const PED_CONTROL: &str = "trafficLight_pedLightControl";

#[tokio::main]
async fn main() -> rtprobe::Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let probe = Probe::with_config(ProbeConfig::new("localhost", 9911).with_logging(true));
    probe.start_listen_for_events(2234).await?;

    let outcome = crossing(&probe).await;
    probe.stop_listen_for_events().await;

    match &outcome {
        Ok(()) => tracing::info!("pedestrian crossed safely"),
        Err(e) => tracing::error!("crossing failed: {e}"),
    }
    outcome
}

async fn crossing(probe: &Probe) -> rtprobe::Result {
    probe
        .await_event(EventMatcher::event("green").on_port(SERVER), 1)
        .within(Duration::from_secs(10))
        .await?;

    let sequence = [
        ("red", SERVER, "red 1"),
        ("walk", PED_CONTROL, "WALK"),
        ("stop", PED_CONTROL, "STOP"),
        ("red", SERVER, "red 2"),
        ("green", SERVER, "green 1"),
    ]
    .map(|(event, port, label)| {
        probe.expect_event(EventMatcher::event(event).on_port(port), 1, Some(label))
    });

    probe
        .send_event(OutboundEvent::new("pedestrian", "trafficLight_control"))
        .await?;

    for step in sequence {
        step.within(Duration::from_secs(15)).await?;
    }
    Ok(())
}
