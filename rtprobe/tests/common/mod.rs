#![allow(dead_code)]

use std::{future::Future, net::SocketAddr, sync::Arc};

use futures_util::{FutureExt, future::BoxFuture};
use rtprobe::{Probe, ProbeConfig};
use serde_json::{Value, json};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc,
    task::JoinHandle,
};

type Responder = dyn Fn(Value) -> BoxFuture<'static, String> + Send + Sync;

/// A stand-in for the RT application's command port.
///
/// Accepts one command per connection, records it and answers with whatever
/// the responder produces for it.
pub struct FakeApp {
    pub addr: SocketAddr,
    commands: mpsc::UnboundedReceiver<Value>,
    task: JoinHandle<()>,
}

impl FakeApp {
    pub async fn start(responder: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        Self::start_async(move |command| std::future::ready(responder(&command))).await
    }

    /// Like [`start`](Self::start), but the answer may wait on other traffic,
    /// e.g. an event the app invokes on the probe while the command is open.
    pub async fn start_async<F, Fut>(responder: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, commands) = mpsc::unbounded_channel();
        let responder: Arc<Responder> =
            Arc::new(move |command: Value| -> BoxFuture<'static, String> { responder(command).boxed() });

        let task = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let tx = tx.clone();
                let responder = responder.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = stream.read(&mut buf).await.unwrap_or(0);
                    let Ok(command) = serde_json::from_slice::<Value>(&buf[..n]) else {
                        return;
                    };
                    let _ = tx.send(command.clone());
                    let answer = responder(command).await;
                    let _ = stream.write_all(answer.as_bytes()).await;
                });
            }
        });

        Self {
            addr,
            commands,
            task,
        }
    }

    /// Answers every command with `{"status":"ok","msg":"OK"}`.
    pub async fn accepting() -> Self {
        Self::start(|_| json!({ "status": "ok", "msg": "OK" }).to_string()).await
    }

    pub fn probe(&self) -> Probe {
        Probe::with_config(ProbeConfig::new("127.0.0.1", self.addr.port()))
    }

    /// The next command the app received.
    pub async fn next_command(&mut self) -> Value {
        self.commands.recv().await.unwrap()
    }
}

impl Drop for FakeApp {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Push a `sendEvent` notification to the probe and wait for its acknowledgement.
pub async fn send_notification(probe: SocketAddr, event: &str, port: &str) -> String {
    let payload = json!({ "event": event, "command": "sendEvent", "port": port });
    let mut stream = TcpStream::connect(probe).await.unwrap();
    stream
        .write_all(payload.to_string().as_bytes())
        .await
        .unwrap();
    let mut ack = String::new();
    stream.read_to_string(&mut ack).await.unwrap();
    ack
}

/// Invoke `event` on the probe. The returned stream carries the reply.
pub async fn invoke_notification(probe: SocketAddr, event: &str, port: &str) -> TcpStream {
    let payload = json!({ "event": event, "command": "invokeEvent", "port": port });
    let mut stream = TcpStream::connect(probe).await.unwrap();
    stream
        .write_all(payload.to_string().as_bytes())
        .await
        .unwrap();
    stream
}
