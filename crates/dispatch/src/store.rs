//! Pending records store.

use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};

use courier_common::error::AppError;
use courier_common::types::{DeliveryStatus, PendingNotification};

/// Contract against the pending-records store.
///
/// `mark_sent` commits its own single-row update, so each dispatched row is
/// durable before the workflow touches the next one.
#[allow(async_fn_in_trait)]
pub trait NotificationStore {
    /// Snapshot of all rows still pending, in `sequence_id` order.
    async fn fetch_pending(&mut self) -> Result<Vec<PendingNotification>, AppError>;

    /// Advance one row to sent. At most one transition per row.
    async fn mark_sent(&mut self, sequence_id: i64) -> Result<(), AppError>;
}

/// Postgres-backed store holding one dedicated connection for the whole
/// batch. The connection goes back to the pool when the store is dropped,
/// on every exit path.
pub struct PgNotificationStore {
    conn: PoolConnection<Postgres>,
}

impl PgNotificationStore {
    pub async fn acquire(pool: &PgPool) -> Result<Self, AppError> {
        let conn = pool.acquire().await?;
        Ok(Self { conn })
    }
}

impl NotificationStore for PgNotificationStore {
    async fn fetch_pending(&mut self) -> Result<Vec<PendingNotification>, AppError> {
        let rows = sqlx::query_as::<_, PendingNotification>(
            r#"
            SELECT sequence_id, message_text, phone, status, created_at, sent_at
            FROM pending_notifications
            WHERE status = $1
            ORDER BY sequence_id
            "#,
        )
        .bind(DeliveryStatus::Pending.to_string())
        .fetch_all(self.conn.as_mut())
        .await?;

        Ok(rows)
    }

    async fn mark_sent(&mut self, sequence_id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE pending_notifications
            SET status = $1, sent_at = NOW()
            WHERE sequence_id = $2
            "#,
        )
        .bind(DeliveryStatus::Sent.to_string())
        .bind(sequence_id)
        .execute(self.conn.as_mut())
        .await?;

        Ok(())
    }
}
