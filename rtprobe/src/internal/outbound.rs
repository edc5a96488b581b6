use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

use crate::{
    Error, Result,
    tracer::Tracer,
    wire::{Response, ResponseFrame, decode_response},
};

/// How bytes that do not parse as a response are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResponsePolicy {
    /// Discard them and keep waiting, e.g. for a stray trailing newline.
    SkipInvalid,
    /// Fail the command with [`Error::Decode`].
    Strict,
}

/// Run one command against the RT application on a fresh connection.
///
/// Connects to `remote`, writes `payload` and waits for the first parseable
/// JSON response. The connection is closed afterwards, whatever the outcome.
pub(crate) async fn exchange(
    remote: &str,
    payload: &[u8],
    policy: ResponsePolicy,
    read_buffer_size: usize,
    tracer: &Tracer,
) -> Result<Response> {
    let mut stream = match TcpStream::connect(remote).await {
        Ok(stream) => stream,
        Err(e) => {
            tracer.connect_failed(remote, &e);
            return Err(e.into());
        }
    };
    tracer.connected(remote);

    let result = async {
        stream.write_all(payload).await?;
        read_response(&mut stream, policy, read_buffer_size).await
    }
    .await;
    let _ = stream.shutdown().await;

    if let Err(e) = &result {
        tracer.command_failed(remote, e);
    }
    result
}

async fn read_response(
    stream: &mut TcpStream,
    policy: ResponsePolicy,
    read_buffer_size: usize,
) -> Result<Response> {
    let mut chunk = vec![0u8; read_buffer_size];
    let mut buf = Vec::new();
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        buf.extend_from_slice(&chunk[..n]);
        match decode_response(&buf) {
            ResponseFrame::Complete(response) => return Ok(response),
            ResponseFrame::Incomplete => {}
            ResponseFrame::Invalid(e) => match policy {
                ResponsePolicy::Strict => return Err(e.into()),
                ResponsePolicy::SkipInvalid => buf.clear(),
            },
        }
    }
}
