//! Periodic trigger for the notification dispatch endpoint.
//!
//! Starts with a single bounded liveness probe; if the endpoint is not
//! ready the process exits non-zero before any schedule is registered.
//! Once running, one trigger fires per period and per-invocation failures
//! are logged, never fatal.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::MissedTickBehavior;

/// Fixed trigger period.
pub const TRIGGER_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Bounded timeout for the startup liveness probe only; steady-state
/// invocations run for as long as the batch takes.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// One liveness probe against the trigger endpoint. Ready means HTTP 200.
pub async fn probe(client: &Client, trigger_url: &str) -> bool {
    match client.post(trigger_url).send().await {
        Ok(response) if response.status() == StatusCode::OK => {
            tracing::info!("Dispatch endpoint is available");
            true
        }
        Ok(response) => {
            tracing::warn!(
                status = %response.status(),
                "Dispatch endpoint responded but is not ready"
            );
            false
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reach the dispatch endpoint");
            false
        }
    }
}

/// One steady-state trigger invocation.
pub async fn trigger(client: &Client, trigger_url: &str) {
    match client.post(trigger_url).send().await {
        Ok(response) => {
            tracing::info!(status = %response.status(), "Notification dispatch triggered");
        }
        Err(e) => {
            tracing::error!(error = %e, "Trigger invocation failed");
        }
    }
}

/// Run the schedule indefinitely: one trigger per period, awaited to
/// completion, so a slow batch delays the next cycle instead of overlapping
/// it.
pub async fn run(client: &Client, trigger_url: &str) {
    let mut interval = tokio::time::interval(TRIGGER_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately and the probe already invoked the
    // endpoint once, so consume it; the first scheduled run lands one full
    // period from now.
    interval.tick().await;

    loop {
        interval.tick().await;
        trigger(client, trigger_url).await;
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::routing::post;

    use super::*;

    /// Serve a single-route stub on an ephemeral port, answering every POST
    /// with the given status.
    async fn serve(status: StatusCode) -> String {
        let app = Router::new().route("/send_notification", post(move || async move { status }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/send_notification", addr)
    }

    /// An address nothing listens on.
    async fn dead_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/send_notification", addr)
    }

    #[tokio::test]
    async fn test_probe_ready_on_200() {
        let url = serve(StatusCode::OK).await;
        assert!(probe(&Client::new(), &url).await);
    }

    #[tokio::test]
    async fn test_probe_not_ready_on_error_status() {
        let url = serve(StatusCode::INTERNAL_SERVER_ERROR).await;
        assert!(!probe(&Client::new(), &url).await);
    }

    #[tokio::test]
    async fn test_probe_not_ready_on_transport_error() {
        let url = dead_url().await;
        let client = Client::builder().timeout(PROBE_TIMEOUT).build().unwrap();
        assert!(!probe(&client, &url).await);
    }

    #[tokio::test]
    async fn test_trigger_survives_transport_error() {
        // Must log and return, never panic or abort the schedule.
        let url = dead_url().await;
        trigger(&Client::new(), &url).await;
    }
}
