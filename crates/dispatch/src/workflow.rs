//! The dispatch workflow: fetch → resolve → send → commit, row by row.

use courier_common::error::AppError;
use courier_common::types::DispatchResult;

use crate::gateway::{MessageSender, RecipientDirectory};
use crate::store::NotificationStore;

/// Process every pending notification once.
///
/// Rows are handled strictly sequentially and in isolation:
/// - rows missing phone or message are skipped untouched (no result entry);
/// - an unresolvable recipient yields a `failed` entry and the row stays
///   pending;
/// - once a recipient resolves, the send is attempted and the row is marked
///   sent immediately, before the next row — a send transport error is still
///   recorded under `sent`, with the error text as the response.
///
/// Only store errors abort the batch; they surface as the single aggregate
/// error and leave the remaining rows pending for the next run.
pub async fn process_pending_notifications<S, D, M>(
    store: &mut S,
    directory: &D,
    sender: &M,
) -> Result<Vec<DispatchResult>, AppError>
where
    S: NotificationStore,
    D: RecipientDirectory,
    M: MessageSender,
{
    let rows = store.fetch_pending().await?;
    tracing::info!(rows = rows.len(), "Fetched pending notifications");

    let mut results = Vec::new();

    for row in rows {
        let (phone, message) = match (&row.phone, &row.message_text) {
            (Some(p), Some(m)) if !p.is_empty() && !m.is_empty() => (p.clone(), m.clone()),
            _ => continue,
        };

        let Some(identifier) = directory.resolve(&phone).await else {
            results.push(DispatchResult::Failed {
                phone,
                reason: "invalid identifier".to_string(),
            });
            continue;
        };

        let response = match sender.send(&identifier, &message).await {
            Ok(body) => body,
            Err(description) => description,
        };
        results.push(DispatchResult::Sent { phone, response });

        // Commit this row before touching the next; a later failure must not
        // undo earlier progress.
        store.mark_sent(row.sequence_id).await?;
    }

    tracing::info!(results = results.len(), "Pending notifications processed");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use courier_common::types::{DeliveryStatus, PendingNotification};

    use super::*;

    struct FakeStore {
        rows: Vec<PendingNotification>,
        fail_fetch: bool,
    }

    impl FakeStore {
        fn new(rows: Vec<PendingNotification>) -> Self {
            Self {
                rows,
                fail_fetch: false,
            }
        }

        fn status_of(&self, sequence_id: i64) -> DeliveryStatus {
            self.rows
                .iter()
                .find(|r| r.sequence_id == sequence_id)
                .unwrap()
                .status
        }
    }

    impl NotificationStore for FakeStore {
        async fn fetch_pending(&mut self) -> Result<Vec<PendingNotification>, AppError> {
            if self.fail_fetch {
                return Err(AppError::Internal("connection refused".to_string()));
            }
            Ok(self
                .rows
                .iter()
                .filter(|r| r.status == DeliveryStatus::Pending)
                .cloned()
                .collect())
        }

        async fn mark_sent(&mut self, sequence_id: i64) -> Result<(), AppError> {
            let row = self
                .rows
                .iter_mut()
                .find(|r| r.sequence_id == sequence_id)
                .ok_or_else(|| AppError::Internal(format!("no row {}", sequence_id)))?;
            row.status = DeliveryStatus::Sent;
            row.sent_at = Some(Utc::now());
            Ok(())
        }
    }

    struct FakeDirectory {
        accounts: HashMap<String, String>,
    }

    impl RecipientDirectory for FakeDirectory {
        async fn resolve(&self, phone: &str) -> Option<String> {
            self.accounts.get(phone).cloned()
        }
    }

    struct FakeSender {
        error: Option<String>,
    }

    impl MessageSender for FakeSender {
        async fn send(&self, _identifier: &str, _message: &str) -> Result<String, String> {
            match &self.error {
                Some(e) => Err(e.clone()),
                None => Ok("{\"accepted\":true}".to_string()),
            }
        }
    }

    fn row(sequence_id: i64, phone: Option<&str>, message: Option<&str>) -> PendingNotification {
        PendingNotification {
            sequence_id,
            message_text: message.map(str::to_string),
            phone: phone.map(str::to_string),
            status: DeliveryStatus::Pending,
            created_at: Utc::now(),
            sent_at: None,
        }
    }

    fn directory_with(phones: &[&str]) -> FakeDirectory {
        FakeDirectory {
            accounts: phones
                .iter()
                .map(|p| (p.to_string(), format!("55{}@wa.gw.msging.net", p)))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_mixed_batch_isolates_failures() {
        // A sends, B has an empty message, C does not resolve.
        let mut store = FakeStore::new(vec![
            row(1, Some("31911110001"), Some("Consulta amanhã às 9h")),
            row(2, Some("31911110002"), Some("")),
            row(3, Some("31911110003"), Some("Exame disponível")),
        ]);
        let directory = directory_with(&["31911110001"]);
        let sender = FakeSender { error: None };

        let results = process_pending_notifications(&mut store, &directory, &sender)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_sent());
        assert_eq!(results[0].phone(), "31911110001");
        assert_eq!(
            results[1],
            DispatchResult::Failed {
                phone: "31911110003".to_string(),
                reason: "invalid identifier".to_string(),
            }
        );

        assert_eq!(store.status_of(1), DeliveryStatus::Sent);
        assert_eq!(store.status_of(2), DeliveryStatus::Pending);
        assert_eq!(store.status_of(3), DeliveryStatus::Pending);
    }

    #[tokio::test]
    async fn test_rows_missing_phone_are_skipped_untouched() {
        let mut store = FakeStore::new(vec![row(1, None, Some("Olá"))]);
        let directory = directory_with(&[]);
        let sender = FakeSender { error: None };

        let results = process_pending_notifications(&mut store, &directory, &sender)
            .await
            .unwrap();

        assert!(results.is_empty());
        assert_eq!(store.status_of(1), DeliveryStatus::Pending);
        assert!(store.rows[0].sent_at.is_none());
    }

    #[tokio::test]
    async fn test_second_run_only_sees_rows_still_pending() {
        let mut store = FakeStore::new(vec![row(
            1,
            Some("31911110001"),
            Some("Consulta amanhã às 9h"),
        )]);
        let directory = directory_with(&["31911110001"]);
        let sender = FakeSender { error: None };

        let first = process_pending_notifications(&mut store, &directory, &sender)
            .await
            .unwrap();
        assert_eq!(first.len(), 1);

        let second = process_pending_notifications(&mut store, &directory, &sender)
            .await
            .unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_send_error_is_recorded_as_sent_with_error_text() {
        let mut store = FakeStore::new(vec![row(
            1,
            Some("31911110001"),
            Some("Consulta amanhã às 9h"),
        )]);
        let directory = directory_with(&["31911110001"]);
        let sender = FakeSender {
            error: Some("error sending request: timed out".to_string()),
        };

        let results = process_pending_notifications(&mut store, &directory, &sender)
            .await
            .unwrap();

        assert_eq!(
            results[0],
            DispatchResult::Sent {
                phone: "31911110001".to_string(),
                response: "error sending request: timed out".to_string(),
            }
        );
        // The attempt was handed to the transport, so the row is consumed.
        assert_eq!(store.status_of(1), DeliveryStatus::Sent);
    }

    #[tokio::test]
    async fn test_store_failure_aborts_with_aggregate_error() {
        let mut store = FakeStore::new(vec![]);
        store.fail_fetch = true;
        let directory = directory_with(&[]);
        let sender = FakeSender { error: None };

        let result = process_pending_notifications(&mut store, &directory, &sender).await;
        assert!(result.is_err());
    }
}
