use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery status of a pending notification row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Sent => write!(f, "sent"),
        }
    }
}

/// A notification row awaiting dispatch.
///
/// Rows are created by an upstream system; this service only reads them and
/// advances `status` from pending to sent. `message_text` and `phone` are
/// nullable in the store, and rows missing either are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingNotification {
    pub sequence_id: i64,
    pub message_text: Option<String>,
    pub phone: Option<String>,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Per-row outcome of a dispatch run.
///
/// `Sent` means the send was attempted and handed to the transport; the raw
/// gateway response (or the transport error description) rides along in
/// `response`. `Failed` is reserved for recipients the gateway directory
/// could not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DispatchResult {
    Sent { phone: String, response: String },
    Failed { phone: String, reason: String },
}

impl DispatchResult {
    pub fn phone(&self) -> &str {
        match self {
            DispatchResult::Sent { phone, .. } => phone,
            DispatchResult::Failed { phone, .. } => phone,
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchResult::Sent { .. })
    }
}
