use tokio::sync::oneshot;

/// Settle-once cell for the future handed out to a registrant.
///
/// The first [`settle`](Self::settle) delivers its value; later calls are
/// no-ops and return `false`.
#[derive(Debug)]
pub(crate) struct Settlement<T> {
    sender: Option<oneshot::Sender<T>>,
}

impl<T> Settlement<T> {
    pub(crate) fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (Self { sender: Some(tx) }, rx)
    }

    /// Deliver `value` unless already settled. Returns whether this call took effect.
    ///
    /// A registrant that dropped its future still counts as settled.
    pub(crate) fn settle(&mut self, value: T) -> bool {
        match self.sender.take() {
            Some(tx) => {
                let _ = tx.send(value);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.sender.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_settlement_wins() {
        let (mut settlement, rx) = Settlement::<u32>::new();
        assert!(!settlement.is_settled());
        assert!(settlement.settle(1));
        assert!(!settlement.settle(2));
        assert!(settlement.is_settled());
        assert_eq!(rx.await.unwrap(), 1);
    }

    #[test]
    fn dropped_receiver_still_settles() {
        let (mut settlement, rx) = Settlement::<u32>::new();
        drop(rx);
        assert!(settlement.settle(1));
        assert!(settlement.is_settled());
    }
}
