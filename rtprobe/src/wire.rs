//! JSON wire format spoken with the RT application.
//!
//! Every exchange is a single JSON object per TCP connection. There is no
//! length prefix: the message boundary is the connection's write/close cycle.

use serde::{Deserialize, Serialize};

use crate::{Error, OutboundEvent, Result};

/// What the receiver of a message is asked to do with the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    /// Fire-and-forget delivery.
    SendEvent,
    /// Delivery that obligates a reply on the same connection.
    InvokeEvent,
    /// Reply to a previously invoked event.
    Reply,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Command::SendEvent => "sendEvent",
            Command::InvokeEvent => "invokeEvent",
            Command::Reply => "reply",
        })
    }
}

/// Message priority understood by the RT application. Only attached to `sendEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    General,
}

/// A command sent from the probe to the RT application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Request {
    event: String,
    command: Command,
    port: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port_index: Option<u32>,
}

impl Request {
    pub(crate) fn new(command: Command, event: OutboundEvent) -> Self {
        let OutboundEvent {
            event,
            port,
            data,
            port_index,
        } = event;
        Self {
            event,
            command,
            port,
            priority: (command == Command::SendEvent).then_some(Priority::General),
            // Empty data and index 0 are the application's defaults and are left out.
            data: data.filter(|d| !d.is_empty()),
            port_index: port_index.filter(|i| *i != 0),
        }
    }

    /// A reply addressed to the port the invoked event came from.
    pub(crate) fn reply(event: &str, port: &str, data: Option<&str>) -> Self {
        Self::new(
            Command::Reply,
            OutboundEvent {
                event: event.to_string(),
                port: port.to_string(),
                data: data.map(str::to_string),
                port_index: None,
            },
        )
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Outcome reported by the RT application for a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Ok,
    Error,
    #[serde(other)]
    Other,
}

/// One reply message collected by the RT application for an invoked event.
///
/// `data` holds the reply's payload in the application's own encoding. Any
/// other fields the application sends are kept in [`extra`](Self::extra).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl ReplyMessage {
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Fields other than `data`, as sent by the application.
    pub fn extra(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.extra
    }
}

/// The RT application's answer to a command, sent on the command's connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Vec<ReplyMessage>>,
}

impl Response {
    pub fn status(&self) -> Status {
        self.status
    }

    /// Human-readable status message, if the application sent one.
    pub fn msg(&self) -> Option<&str> {
        self.msg.as_deref()
    }

    /// Reply messages collected for an invoked event. Empty for other commands.
    pub fn result(&self) -> &[ReplyMessage] {
        self.result.as_deref().unwrap_or_default()
    }

    pub(crate) fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// Turn an `"error"` status into [`Error::Remote`].
    pub(crate) fn into_result(self) -> Result<Self> {
        match self.status {
            Status::Error => Err(Error::Remote(self.msg.unwrap_or_default())),
            _ => Ok(self),
        }
    }
}

/// Result of looking for a response in the bytes read so far.
#[derive(Debug)]
pub(crate) enum ResponseFrame {
    Complete(Response),
    /// More bytes are needed.
    Incomplete,
    Invalid(serde_json::Error),
}

pub(crate) fn decode_response(buf: &[u8]) -> ResponseFrame {
    match serde_json::Deserializer::from_slice(buf)
        .into_iter::<Response>()
        .next()
    {
        None => ResponseFrame::Incomplete,
        Some(Ok(response)) => ResponseFrame::Complete(response),
        Some(Err(e)) if e.is_eof() => ResponseFrame::Incomplete,
        Some(Err(e)) => ResponseFrame::Invalid(e),
    }
}
