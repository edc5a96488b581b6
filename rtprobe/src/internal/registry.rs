use std::{collections::VecDeque, sync::Arc};

use tokio::sync::oneshot;

use super::Settlement;
use crate::{Error, EventMatcher, Notification, Result};

struct Entry<T> {
    matcher: EventMatcher,
    label: Option<Arc<str>>,
    settlement: Settlement<T>,
}

/// What routing one notification did to the head of each queue.
///
/// `None` means the queue was empty. `Some(Err(msg))` means the head entry
/// did not match and was consumed anyway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RouteOutcome {
    pub(crate) awaited: Option<std::result::Result<(), String>>,
    pub(crate) expected: Option<std::result::Result<(), String>>,
}

/// The two expectation queues of a probe.
///
/// *Expected* entries reject on mismatch, *awaited* entries always resolve
/// with whatever notification reaches them. Both are strict FIFO: routing
/// pops the head whether or not it matches, so an out-of-order notification
/// consumes the entry it was checked against.
#[derive(Default)]
pub(crate) struct Registry {
    expected: VecDeque<Entry<Result<Notification>>>,
    awaited: VecDeque<Entry<Notification>>,
}

impl Registry {
    /// Queue `count` expected entries for `matcher`.
    pub(crate) fn register_expected(
        &mut self,
        matcher: EventMatcher,
        count: usize,
        label: Option<&str>,
    ) -> Vec<oneshot::Receiver<Result<Notification>>> {
        let label: Option<Arc<str>> = label.map(Arc::from);
        (0..count)
            .map(|_| {
                let (settlement, rx) = Settlement::new();
                self.expected.push_back(Entry {
                    matcher: matcher.clone(),
                    label: label.clone(),
                    settlement,
                });
                rx
            })
            .collect()
    }

    /// Queue `count` awaited entries for `matcher`.
    pub(crate) fn register_awaited(
        &mut self,
        matcher: EventMatcher,
        count: usize,
    ) -> Vec<oneshot::Receiver<Notification>> {
        (0..count)
            .map(|_| {
                let (settlement, rx) = Settlement::new();
                self.awaited.push_back(Entry {
                    matcher: matcher.clone(),
                    label: None,
                    settlement,
                });
                rx
            })
            .collect()
    }

    /// Check `notification` against the head of each queue and settle it.
    ///
    /// Awaited first, then expected. Each queue loses at most one entry.
    pub(crate) fn route(&mut self, notification: &Notification) -> RouteOutcome {
        let awaited = self.awaited.pop_front().map(|mut entry| {
            let check = entry.matcher.check(notification);
            // A mismatch is only advisory for awaited entries.
            entry.settlement.settle(notification.clone());
            check
        });

        let expected = self.expected.pop_front().map(|mut entry| {
            let check = entry.matcher.check(notification);
            if let Err(msg) = &check {
                let err = Error::Mismatch(msg.clone()).with_label(entry.label.as_deref());
                entry.settlement.settle(Err(err));
            }
            if !entry.settlement.is_settled() {
                entry.settlement.settle(Ok(notification.clone()));
            }
            check
        });

        RouteOutcome { awaited, expected }
    }

    pub(crate) fn expected_len(&self) -> usize {
        self.expected.len()
    }

    pub(crate) fn awaited_len(&self) -> usize {
        self.awaited.len()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("expected", &self.expected_len())
            .field("awaited", &self.awaited_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot::error::TryRecvError;

    fn notification(event: &str, port: &str) -> Notification {
        let payload = serde_json::json!({
            "event": event,
            "command": "sendEvent",
            "port": port,
            "data": format!("data for {event}"),
        });
        Notification::decode(payload.to_string().as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn expected_entries_resolve_in_fifo_order() {
        let mut registry = Registry::default();
        let mut rxs = Vec::new();
        for name in ["A", "B", "C"] {
            rxs.extend(registry.register_expected(EventMatcher::event(name), 1, None));
        }

        for name in ["A", "B", "C"] {
            registry.route(&notification(name, "p"));
        }

        for (rx, name) in rxs.into_iter().zip(["A", "B", "C"]) {
            let n = rx.await.unwrap().unwrap();
            assert_eq!(n.event(), name);
            assert_eq!(n.data(), Some(format!("data for {name}").as_str()));
        }
        assert_eq!(registry.expected_len(), 0);
    }

    #[tokio::test]
    async fn out_of_order_delivery_checks_earliest_entry() {
        let mut registry = Registry::default();
        let a = registry.register_expected("A".into(), 1, None).remove(0);
        let b = registry.register_expected("B".into(), 1, None).remove(0);

        registry.route(&notification("B", "p"));
        registry.route(&notification("A", "p"));

        assert_eq!(
            a.await.unwrap(),
            Err(Error::Mismatch("Received event \"B\" but expected \"A\"".into()))
        );
        assert_eq!(
            b.await.unwrap(),
            Err(Error::Mismatch("Received event \"A\" but expected \"B\"".into()))
        );
    }

    #[tokio::test]
    async fn mismatch_consumes_the_entry() {
        let mut registry = Registry::default();
        let red = registry.register_expected("red".into(), 1, None).remove(0);

        let outcome = registry.route(&notification("green", "p"));
        assert!(matches!(outcome.expected, Some(Err(_))));
        assert!(red.await.unwrap().is_err());

        let outcome = registry.route(&notification("red", "p"));
        assert_eq!(outcome, RouteOutcome::default());
        assert_eq!(registry.expected_len(), 0);
    }

    #[tokio::test]
    async fn label_is_added_to_rejection() {
        let mut registry = Registry::default();
        let rx = registry
            .register_expected(EventMatcher::event("walk").on_port("ped"), 1, Some("walk first"))
            .remove(0);
        registry.route(&notification("walk", "car"));
        assert_eq!(
            rx.await.unwrap(),
            Err(Error::Mismatch(
                "Received event \"walk\" on port car but expected it on port \"ped\"(walk first)"
                    .into()
            ))
        );
    }

    #[tokio::test]
    async fn one_notification_settles_both_queues() {
        let mut registry = Registry::default();
        let awaited = registry.register_awaited("green".into(), 1).remove(0);
        let expected = registry.register_expected("green".into(), 1, None).remove(0);

        let outcome = registry.route(&notification("green", "p"));
        assert_eq!(outcome.awaited, Some(Ok(())));
        assert_eq!(outcome.expected, Some(Ok(())));

        assert_eq!(awaited.await.unwrap().event(), "green");
        assert_eq!(expected.await.unwrap().unwrap().event(), "green");
    }

    #[tokio::test]
    async fn awaited_entry_resolves_on_mismatch() {
        let mut registry = Registry::default();
        let rx = registry.register_awaited("green".into(), 1).remove(0);

        let outcome = registry.route(&notification("red", "p"));
        assert!(matches!(outcome.awaited, Some(Err(_))));
        assert_eq!(rx.await.unwrap().event(), "red");
        assert_eq!(registry.awaited_len(), 0);
    }

    #[test]
    fn burst_registration_queues_independent_entries() {
        let mut registry = Registry::default();
        let mut rxs = registry.register_expected(EventMatcher::any().on_port("X"), 3, None);
        assert_eq!(registry.expected_len(), 3);

        registry.route(&notification("red", "X"));
        assert_eq!(registry.expected_len(), 2);
        assert!(rxs[0].try_recv().is_ok());
        assert_eq!(rxs[1].try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[test]
    fn empty_queues_route_nothing() {
        let mut registry = Registry::default();
        assert_eq!(registry.route(&notification("A", "p")), RouteOutcome::default());
    }
}
