use crate::core::errors::ChiefPayError;
use tokio_tungstenite::tungstenite::Message;

/// Codec trait for the framing spoken on top of a WebSocket
///
/// This trait defines the contract for converting between raw WebSocket
/// messages and typed protocol packets. Control frames (ping, pong, close)
/// of the WebSocket itself never reach the codec.
pub trait WsCodec: Send + Sync + 'static {
    /// Packets decoded from the server
    type Message: Send + Sync;

    /// Packets the client sends
    type Command: Send + Sync;

    /// Encode an outbound command into a WebSocket message
    fn encode_command(&self, command: &Self::Command) -> Result<Message, ChiefPayError>;

    /// Decode a raw WebSocket message into a typed packet
    ///
    /// # Returns
    /// - `Ok(Some(message))` - Successfully decoded message
    /// - `Ok(None)` - Message was ignored by the codec
    /// - `Err(error)` - Failed to decode message
    fn decode_message(&self, message: Message) -> Result<Option<Self::Message>, ChiefPayError>;
}
