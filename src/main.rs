use chiefpay::core::config::DEFAULT_ENV_PREFIX;
use chiefpay::{AsyncClient, ChiefPayConfig};
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    // Reads CHIEFPAY_API_KEY and optionally CHIEFPAY_BASE_URL
    #[cfg(feature = "env-file")]
    let config = ChiefPayConfig::from_env_file(DEFAULT_ENV_PREFIX)?;
    #[cfg(not(feature = "env-file"))]
    let config = ChiefPayConfig::from_env(DEFAULT_ENV_PREFIX)?;

    let client = AsyncClient::new(config)?;

    println!("Fetching rates...");
    match client.get_rates().await {
        Ok(rates) => {
            println!("Found {} rates", rates.len());
            for rate in &rates {
                println!("{}: {}", rate.name, rate.rate);
            }
        }
        Err(e) => {
            println!("Error fetching rates: {}", e);
        }
    }

    client.close();
    Ok(())
}
