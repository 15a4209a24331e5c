pub mod builder;
pub mod client;
pub mod core;
pub mod facade;
pub mod socket;

pub use builder::ChiefPayBuilder;
pub use client::{AsyncClient, Client};
pub use crate::core::{
    config::ChiefPayConfig,
    errors::{ChiefPayError, Result},
    types::*,
};
pub use facade::{AsyncChiefPay, ChiefPay};
pub use socket::{AsyncSocketClient, ConnectionState, SocketClient};
