//! lmsforce server entry point.
//!
//! `lmsforce` serves the HTTP endpoints; `lmsforce uninstall` removes every
//! stored option and exits.

use lmsforce::AppState;
use lmsforce_infrastructure::AppConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let state = AppState::from_config(&config).await?;

    match std::env::args().nth(1).as_deref() {
        Some("uninstall") => {
            state.uninstall().execute().await?;
            tracing::info!("Removed stored settings and tokens");
        }
        Some(other) => {
            return Err(format!("unknown command '{other}'; expected 'uninstall'").into());
        }
        None => {
            let addr = config.bind_addr()?;
            lmsforce::serve(addr, state).await?;
        }
    }

    Ok(())
}
