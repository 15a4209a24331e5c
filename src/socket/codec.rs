use crate::core::errors::ChiefPayError;
use crate::core::kernel::WsCodec;
use crate::core::types::{Notification, Rate};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

pub const RATES_EVENT: &str = "rates";
pub const NOTIFICATION_EVENT: &str = "notification";

/// Engine.IO handshake parameters sent by the server right after the upgrade
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenPacket {
    #[serde(default)]
    pub sid: String,
    #[serde(rename = "pingInterval", default = "default_ping_interval")]
    pub ping_interval: u64,
    #[serde(rename = "pingTimeout", default = "default_ping_timeout")]
    pub ping_timeout: u64,
    #[serde(rename = "maxPayload", default)]
    pub max_payload: Option<u64>,
}

const fn default_ping_interval() -> u64 {
    25_000
}

const fn default_ping_timeout() -> u64 {
    20_000
}

impl OpenPacket {
    /// How long the connection may stay silent before it is considered dead
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

/// Application events carried on the channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Rates(Vec<Rate>),
    Notification(Notification),
    Other { name: String, payload: Value },
}

impl ChannelEvent {
    fn from_parts(name: String, payload: Value) -> Result<Self, ChiefPayError> {
        match name.as_str() {
            RATES_EVENT => {
                let rates = match payload {
                    // some deployments push the REST envelope unchanged
                    Value::Object(mut envelope) if envelope.contains_key("data") => {
                        envelope.remove("data").unwrap_or(Value::Null)
                    }
                    other => other,
                };
                serde_json::from_value(rates)
                    .map(Self::Rates)
                    .map_err(|e| ChiefPayError::PayloadError(format!("Invalid rates event: {}", e)))
            }
            NOTIFICATION_EVENT => serde_json::from_value(payload)
                .map(Self::Notification)
                .map_err(|e| {
                    ChiefPayError::PayloadError(format!("Invalid notification event: {}", e))
                }),
            _ => Ok(Self::Other { name, payload }),
        }
    }
}

/// Decoded Engine.IO / Socket.IO packets
#[derive(Debug, Clone, PartialEq)]
pub enum SocketIoMessage {
    Open(OpenPacket),
    Close,
    Ping,
    Pong,
    /// Namespace connect acknowledgement
    Connected { sid: Option<String> },
    Disconnected,
    ConnectError(String),
    Event(ChannelEvent),
}

/// Packets the client sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketIoCommand {
    Connect,
    Pong,
    Disconnect,
}

/// Text codec for Socket.IO v5 over Engine.IO v4, default namespace only
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketIoCodec;

impl SocketIoCodec {
    pub const fn new() -> Self {
        Self
    }

    pub fn decode_text(&self, text: &str) -> Result<Option<SocketIoMessage>, ChiefPayError> {
        let mut chars = text.chars();
        let engine_type = chars
            .next()
            .ok_or_else(|| ChiefPayError::PayloadError("Empty Engine.IO frame".to_string()))?;
        let body = chars.as_str();

        match engine_type {
            '0' => serde_json::from_str(body)
                .map(|open| Some(SocketIoMessage::Open(open)))
                .map_err(|e| ChiefPayError::PayloadError(format!("Invalid open packet: {}", e))),
            '1' => Ok(Some(SocketIoMessage::Close)),
            '2' => Ok(Some(SocketIoMessage::Ping)),
            '3' => Ok(Some(SocketIoMessage::Pong)),
            '4' => decode_socket_packet(body),
            // upgrade and noop
            '5' | '6' => Ok(None),
            other => Err(ChiefPayError::PayloadError(format!(
                "Unknown Engine.IO packet type '{}'",
                other
            ))),
        }
    }
}

fn decode_socket_packet(packet: &str) -> Result<Option<SocketIoMessage>, ChiefPayError> {
    let mut chars = packet.chars();
    let packet_type = chars
        .next()
        .ok_or_else(|| ChiefPayError::PayloadError("Empty Socket.IO packet".to_string()))?;
    let mut body = chars.as_str();

    if body.starts_with('/') {
        let (namespace, rest) = body.split_once(',').unwrap_or((body, ""));
        if namespace != "/" {
            debug!(namespace, "Ignoring packet for foreign namespace");
            return Ok(None);
        }
        body = rest;
    }

    match packet_type {
        '0' => {
            let sid = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| v.get("sid").and_then(Value::as_str).map(str::to_string));
            Ok(Some(SocketIoMessage::Connected { sid }))
        }
        '1' => Ok(Some(SocketIoMessage::Disconnected)),
        '2' => {
            let data = body.trim_start_matches(|c: char| c.is_ascii_digit());
            decode_event(data).map(|event| Some(SocketIoMessage::Event(event)))
        }
        // acks for client-emitted events; the client never asks for one
        '3' => Ok(None),
        '4' => {
            let message = match serde_json::from_str::<Value>(body) {
                Ok(Value::Object(obj)) => obj
                    .get("message")
                    .and_then(Value::as_str)
                    .map_or_else(|| Value::Object(obj.clone()).to_string(), str::to_string),
                Ok(Value::String(s)) => s,
                _ => body.to_string(),
            };
            Ok(Some(SocketIoMessage::ConnectError(message)))
        }
        '5' | '6' => Err(ChiefPayError::PayloadError(
            "Binary Socket.IO packets are not supported".to_string(),
        )),
        other => Err(ChiefPayError::PayloadError(format!(
            "Unknown Socket.IO packet type '{}'",
            other
        ))),
    }
}

fn decode_event(data: &str) -> Result<ChannelEvent, ChiefPayError> {
    let items: Vec<Value> = serde_json::from_str(data)
        .map_err(|e| ChiefPayError::PayloadError(format!("Invalid event packet: {}", e)))?;
    let mut items = items.into_iter();

    let name = match items.next() {
        Some(Value::String(name)) => name,
        _ => {
            return Err(ChiefPayError::PayloadError(
                "Event packet has no event name".to_string(),
            ))
        }
    };
    let payload = items.next().unwrap_or(Value::Null);

    ChannelEvent::from_parts(name, payload)
}

impl WsCodec for SocketIoCodec {
    type Message = SocketIoMessage;
    type Command = SocketIoCommand;

    fn encode_command(&self, command: &SocketIoCommand) -> Result<Message, ChiefPayError> {
        let frame = match command {
            SocketIoCommand::Connect => "40",
            SocketIoCommand::Pong => "3",
            SocketIoCommand::Disconnect => "41",
        };
        Ok(Message::Text(frame.to_string()))
    }

    fn decode_message(&self, message: Message) -> Result<Option<SocketIoMessage>, ChiefPayError> {
        match message {
            Message::Text(text) => self.decode_text(&text),
            Message::Binary(_) => Err(ChiefPayError::PayloadError(
                "Binary frames are not supported".to_string(),
            )),
            _ => Ok(None),
        }
    }
}
