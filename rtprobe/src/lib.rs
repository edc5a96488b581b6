//! # rtprobe
//!
//! A test probe for event-driven RT applications that talk JSON over TCP.
//!
//! The probe sits next to a running application and lets a test drive it and
//! observe it. Commands go in over short-lived connections. Event
//! notifications the application pushes out arrive on the probe's listener
//! and are matched, strictly in arrival order, against what the test said it
//! expects.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use rtprobe::{EventMatcher, OutboundEvent, Probe};
//!
//! #[tokio::main]
//! async fn main() -> rtprobe::Result {
//!     let probe = Probe::new("localhost", 9911);
//!     probe.start_listen_for_events(2234).await?;
//!
//!     // Register before sending, so nothing can slip past.
//!     let lights = probe.expect_event(EventMatcher::any().on_port("trafficLight_server"), 3, None);
//!     probe.send_event(OutboundEvent::new("pedestrian", "trafficLight_control")).await?;
//!
//!     for light in lights.within(Duration::from_secs(10)).await? {
//!         println!("{} on {}", light.event(), light.port());
//!     }
//!
//!     probe.stop_listen_for_events().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Probe`] | Listens for notifications and sends commands |
//! | [`EventMatcher`] | Event name (or [`WILDCARD`]) and optional port to match |
//! | [`Expectation`] | Ordered notifications that must match, or fail |
//! | [`AwaitedEvents`] | Ordered notifications to wait for, never fails on mismatch |
//! | [`Notification`] | An event the application sent or invoked on the probe |
//! | [`OutboundEvent`] | An event to send or invoke on the application |
//! | [`ProbeConfig`] | Remote address, listen address and read buffer size |
//!
//! ## Expected vs. awaited
//!
//! Both queues see every notification and each consumes its head entry for
//! it. An expected entry fails when the notification does not match; an
//! awaited entry takes whatever arrives. Use [`Probe::await_event`] to wait
//! for the application to reach a state, and [`Probe::expect_event`] to
//! assert on behaviour.
//!
//! ## Invoked events
//!
//! When the application invokes an event on the probe, the connection stays
//! open until the test answers with [`Probe::reply_event`]:
//!
//! ```rust,ignore
//! let invoked = probe.expect_event("getState", 1, None);
//! let state = invoked.await?.remove(0);
//! probe.reply_event(&state, "state", Some("int 42")).await?;
//! ```

mod config;
mod error;
mod event_matcher;
mod expectation;
mod notification;
mod notification_id;
mod outbound_event;
mod probe;
mod tracer;

mod internal;

pub mod wire;

pub use config::ProbeConfig;
pub use error::Error;
pub use event_matcher::{EventMatcher, WILDCARD};
pub use expectation::{AwaitedEvents, Expectation};
pub use notification::Notification;
pub use notification_id::NotificationId;
pub use outbound_event::OutboundEvent;
pub use probe::Probe;
pub use wire::{Command, ReplyMessage, Response, Status};

/// Convenience alias for `Result<T, rtprobe::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
