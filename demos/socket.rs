//! Real-time rates and notifications, blocking and async.
//!
//! Run with `CHIEFPAY_API_KEY=... cargo run --example socket`.

use chiefpay::core::config::DEFAULT_ENV_PREFIX;
use chiefpay::{AsyncSocketClient, ChiefPayConfig, Notification, Rate, SocketClient};
use std::time::Duration;

fn on_notification(notification: &Notification) {
    println!("New notification received: {:?}", notification);
}

fn on_rates(rates: &[Rate]) {
    println!("Rates updated: {:?}", rates);
}

fn run_blocking(config: ChiefPayConfig) -> anyhow::Result<()> {
    let socket = SocketClient::new(config)?;
    socket.set_on_notification(on_notification);
    socket.set_on_rates(on_rates);
    socket.connect()?;
    println!("Blocking event-stream client started. Waiting for events...");

    std::thread::sleep(Duration::from_secs(10));
    println!("Latest rates: {:?}", socket.get_latest_rates());
    socket.disconnect()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ChiefPayConfig::from_env(DEFAULT_ENV_PREFIX)?;
    run_blocking(config.clone())?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let socket = AsyncSocketClient::new(config)?;
        socket.set_on_notification(on_notification);
        socket.set_on_rates(on_rates);
        socket.connect().await?;
        println!("Async event-stream client started. Waiting for events...");

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(60)) => {}
            _ = tokio::signal::ctrl_c() => println!("Async event-stream client stopped."),
        }

        socket.disconnect().await?;
        Ok::<(), anyhow::Error>(())
    })
}
