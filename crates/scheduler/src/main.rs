use tracing_subscriber::EnvFilter;

use courier_common::config::SchedulerConfig;
use courier_scheduler::{PROBE_TIMEOUT, TRIGGER_PERIOD, probe, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "courier_scheduler=info".into()),
        )
        .init();

    tracing::info!("Notification schedule starting...");

    // Load configuration
    let config = SchedulerConfig::from_env()?;

    // Fail fast: the probe is not retried, and nothing is scheduled until it
    // passes.
    let probe_client = reqwest::Client::builder().timeout(PROBE_TIMEOUT).build()?;
    if !probe(&probe_client, &config.trigger_url).await {
        anyhow::bail!("dispatch endpoint is not available; refusing to start the schedule");
    }

    tracing::info!(
        url = %config.trigger_url,
        period_secs = TRIGGER_PERIOD.as_secs(),
        "Schedule registered"
    );

    // Steady-state invocations carry no timeout; a batch takes as long as it
    // takes.
    let client = reqwest::Client::new();

    tokio::select! {
        _ = run(&client, &config.trigger_url) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    Ok(())
}
