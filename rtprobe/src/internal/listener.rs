use std::{net::SocketAddr, sync::Arc};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    select,
    task::{JoinHandle, JoinSet},
};
use tokio_util::sync::CancellationToken;

use super::Engine;
use crate::{Notification, Result, wire::Command};

/// Acknowledgement written for `sendEvent` notifications.
const ACK: &[u8] = b"{}";

/// The probe's inbound TCP listener.
///
/// Accepts connections from the RT application until stopped and feeds every
/// decoded notification to the engine. Dropping the listener cancels it
/// without waiting; [`stop`](Self::stop) also waits for the accept loop to
/// release the port.
#[derive(Debug)]
pub(crate) struct Listener {
    local_addr: SocketAddr,
    cancel_token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Listener {
    pub(crate) async fn bind(addr: SocketAddr, engine: Arc<Engine>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        engine.tracer.listening(local_addr);

        let cancel_token = CancellationToken::new();
        let task = tokio::spawn(accept_loop(
            listener,
            local_addr,
            engine,
            cancel_token.clone(),
        ));
        Ok(Self {
            local_addr,
            cancel_token,
            task: Some(task),
        })
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Close the accepting socket and every open inbound connection.
    pub(crate) async fn stop(mut self) {
        self.cancel_token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn accept_loop(
    listener: TcpListener,
    local_addr: SocketAddr,
    engine: Arc<Engine>,
    cancel_token: CancellationToken,
) {
    let mut connections = JoinSet::new();
    loop {
        select! {
            biased;
            _ = cancel_token.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    connections.spawn(handle_connection(stream, peer, engine.clone()));
                }
                Err(e) => engine.tracer.accept_failed(&e),
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    connections.shutdown().await;
    let released = engine.correlator.release_all();
    engine.tracer.stopped(local_addr, released);
}

/// Decode, route and acknowledge the notifications arriving on one connection.
///
/// Each read is decoded as one message. Undecodable bytes close the
/// connection without routing anything. An invoked event's connection is
/// handed to the reply correlator before routing, so whoever the notification
/// wakes can reply to it straight away.
async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, engine: Arc<Engine>) {
    engine.tracer.connection_accepted(peer);
    let mut buf = vec![0u8; engine.config.read_buffer_size()];
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => {
                engine.tracer.connection_closed(peer);
                return;
            }
            Ok(n) => n,
            Err(e) => {
                engine.tracer.connection_error(peer, &e);
                return;
            }
        };
        engine.tracer.payload_received(peer, &buf[..n]);

        let notification = match Notification::decode(&buf[..n]) {
            Ok(notification) => notification,
            Err(e) => {
                engine.tracer.decode_failed(peer, &e);
                let _ = stream.shutdown().await;
                return;
            }
        };

        match notification.command() {
            Command::InvokeEvent => {
                engine.correlator.retain(notification.id(), stream);
                engine.route(&notification);
                return;
            }
            Command::SendEvent => {
                engine.route(&notification);
                let acked = async {
                    stream.write_all(ACK).await?;
                    stream.shutdown().await
                }
                .await;
                if let Err(e) = acked {
                    engine.tracer.connection_error(peer, &e);
                }
                return;
            }
            Command::Reply => engine.route(&notification),
        }
    }
}
