use std::collections::HashMap;

use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::{io::AsyncWriteExt, net::TcpStream};

use crate::{Error, Notification, NotificationId, Result, tracer::Tracer, wire::Request};

/// Indicator returned by a successful reply.
pub(crate) const REPLY_OK: &str = "OK - successful reply";

/// Connections of invoked events, kept open until the probe replies.
///
/// The listener hands over the connection of every `invokeEvent`
/// notification, keyed by the notification's id. Replying takes the
/// connection out of the table, writes the reply and closes it.
#[derive(Debug, Default)]
pub(crate) struct ReplyCorrelator {
    pending: Mutex<HashMap<NotificationId, TcpStream>>,
}

impl ReplyCorrelator {
    pub(crate) fn retain(&self, id: NotificationId, stream: TcpStream) {
        let mut pending = self.pending.lock();
        // Drop connections the application closed while we held them.
        pending.retain(|_, stream| !is_closed(stream));
        pending.insert(id, stream);
    }

    pub(crate) fn take(&self, id: NotificationId) -> Option<TcpStream> {
        self.pending.lock().remove(&id)
    }

    /// Close every retained connection. Returns how many were released.
    pub(crate) fn release_all(&self) -> usize {
        let mut pending = self.pending.lock();
        let released = pending.len();
        pending.clear();
        released
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Answer the invoked `notification` with the reply `event`.
    ///
    /// The reply goes to the port the notification came from. The write is
    /// not acknowledged; write failures are only traced.
    pub(crate) async fn reply(
        &self,
        notification: &Notification,
        event: &str,
        data: Option<&str>,
        tracer: &Tracer,
    ) -> Result<&'static str> {
        if !notification.is_invoked() {
            return Err(Error::NotInvoked);
        }
        let mut stream = self
            .take(notification.id())
            .ok_or_else(|| Error::NoRetainedConnection(notification.event().to_string()))?;

        let payload = Request::reply(event, notification.port(), data).encode()?;
        let written = async {
            stream.write_all(&payload).await?;
            stream.shutdown().await
        }
        .await;

        match written {
            Ok(()) => tracer.reply_sent(notification, event),
            Err(e) => tracer.reply_write_failed(notification, &e),
        }
        Ok(REPLY_OK)
    }
}

/// True if the peer has closed `stream` or it is in an error state.
///
/// Peeks instead of reading so bytes the application sent after the invoke
/// stay in the socket.
fn is_closed(stream: &TcpStream) -> bool {
    let mut buf = [0u8; 1];
    match stream.peek(&mut buf).now_or_never() {
        None => false,
        Some(Ok(n)) => n == 0,
        Some(Err(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{io::AsyncReadExt, net::TcpListener};

    async fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (client, server)
    }

    fn notification(command: &str) -> Notification {
        let payload = serde_json::json!({
            "event": "getDurationOfInactivity",
            "command": command,
            "port": "trafficLight_control",
        });
        Notification::decode(payload.to_string().as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn reply_is_written_on_retained_connection() {
        let correlator = ReplyCorrelator::default();
        let (mut app_side, probe_side) = connected_pair().await;
        let invoked = notification("invokeEvent");
        correlator.retain(invoked.id(), probe_side);

        let status = correlator
            .reply(&invoked, "durationOfInactivityReply", Some("int 5"), &Tracer::default())
            .await
            .unwrap();
        assert_eq!(status, REPLY_OK);
        assert_eq!(correlator.len(), 0);

        let mut received = String::new();
        app_side.read_to_string(&mut received).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&received).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "event": "durationOfInactivityReply",
                "command": "reply",
                "port": "trafficLight_control",
                "data": "int 5",
            })
        );
    }

    #[tokio::test]
    async fn sent_events_cannot_be_replied_to() {
        let correlator = ReplyCorrelator::default();
        let result = correlator
            .reply(&notification("sendEvent"), "ack", None, &Tracer::default())
            .await;
        assert_eq!(result, Err(Error::NotInvoked));
    }

    #[tokio::test]
    async fn second_reply_has_no_connection() {
        let correlator = ReplyCorrelator::default();
        let (_app_side, probe_side) = connected_pair().await;
        let invoked = notification("invokeEvent");
        correlator.retain(invoked.id(), probe_side);

        let tracer = Tracer::default();
        assert!(correlator.reply(&invoked, "ack", None, &tracer).await.is_ok());
        assert_eq!(
            correlator.reply(&invoked, "ack", None, &tracer).await,
            Err(Error::NoRetainedConnection("getDurationOfInactivity".into()))
        );
    }

    #[tokio::test]
    async fn release_all_closes_connections() {
        let correlator = ReplyCorrelator::default();
        let (mut app_side, probe_side) = connected_pair().await;
        correlator.retain(notification("invokeEvent").id(), probe_side);

        assert_eq!(correlator.release_all(), 1);
        let mut buf = Vec::new();
        assert_eq!(app_side.read_to_end(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn closed_connections_are_dropped_on_retain() {
        let correlator = ReplyCorrelator::default();
        let (app_side, probe_side) = connected_pair().await;
        let first = notification("invokeEvent");
        correlator.retain(first.id(), probe_side);
        drop(app_side);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let (_other_app, other_probe) = connected_pair().await;
        correlator.retain(notification("invokeEvent").id(), other_probe);
        assert_eq!(correlator.len(), 1);
        assert!(correlator.take(first.id()).is_none());
    }

    #[tokio::test]
    async fn liveness_check_leaves_pending_bytes_unread() {
        let correlator = ReplyCorrelator::default();
        let (mut app_side, probe_side) = connected_pair().await;
        let first = notification("invokeEvent");
        correlator.retain(first.id(), probe_side);
        app_side.write_all(b"\n").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let (_other_app, other_probe) = connected_pair().await;
        correlator.retain(notification("invokeEvent").id(), other_probe);
        assert_eq!(correlator.len(), 2);

        let mut held = correlator.take(first.id()).unwrap();
        let mut byte = [0u8; 1];
        assert_eq!(held.read(&mut byte).await.unwrap(), 1);
        assert_eq!(&byte, b"\n");
    }
}
