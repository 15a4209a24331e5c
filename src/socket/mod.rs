pub mod blocking;
pub mod client;
pub mod codec;

pub use blocking::SocketClient;
pub use client::{
    socket_url, AsyncSocketClient, ConnectionState, NotificationCallback, RatesCallback,
};
pub use codec::{ChannelEvent, OpenPacket, SocketIoCodec, SocketIoCommand, SocketIoMessage};
