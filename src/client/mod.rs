pub mod async_client;
pub mod blocking;

pub use async_client::AsyncClient;
pub use blocking::Client;
