//! Notification dispatch trigger endpoint.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use courier_common::error::AppError;
use courier_common::types::DispatchResult;
use courier_dispatch::store::PgNotificationStore;
use courier_dispatch::workflow::process_pending_notifications;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/send_notification", post(send_notification))
}

/// POST /send_notification — Process every pending notification once.
///
/// Holds one pool connection for the whole batch; it is released when the
/// store drops, on every exit path. Store errors surface as a single 500
/// with `{"error": ...}`; per-row gateway failures are reported inside the
/// result list instead.
async fn send_notification(
    State(state): State<AppState>,
) -> Result<Json<Vec<DispatchResult>>, AppError> {
    let mut store = PgNotificationStore::acquire(&state.pool).await?;
    let results =
        process_pending_notifications(&mut store, state.gateway.as_ref(), state.gateway.as_ref())
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Dispatch run failed"))?;
    Ok(Json(results))
}
