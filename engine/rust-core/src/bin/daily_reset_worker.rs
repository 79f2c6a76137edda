use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paradox_engine::{config::Config, EngineState};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "paradox_engine=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting paradox engine daily reset worker");

    let config = Config::load()?;
    tracing::info!(
        "Configuration loaded for environment: {:?}, reset at {}",
        std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string()),
        config.reset_time()
    );

    let state = EngineState::new(config).await?;
    let mut worker = state.daily_reset_worker();

    tokio::select! {
        _ = worker.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping daily reset worker");
        }
    }

    Ok(())
}
