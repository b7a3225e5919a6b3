//! Live query plumbing: decoding store snapshots into domain types and
//! forwarding them into feature stores for the lifetime of a view.

use monos_backend::{DocId, DocumentStore, QuerySpec, Snapshot, Subscription};
use monos_core::reducer::Reducer;
use monos_runtime::Store;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;

/// Decode one stored document into `T`, injecting the store-assigned id as
/// the document's `id` field.
///
/// # Errors
///
/// Returns the decode failure message when the document does not match `T`.
pub fn decode_document<T: DeserializeOwned>(id: &DocId, mut data: Value) -> Result<T, String> {
    if let Some(fields) = data.as_object_mut() {
        fields.insert("id".to_string(), Value::String(id.to_string()));
    }
    serde_json::from_value(data).map_err(|e| e.to_string())
}

/// Decode a full snapshot into domain records.
///
/// Documents that fail to decode are dropped with a warning rather than
/// poisoning the whole emission; a single malformed document must not blank
/// a live view.
#[must_use]
pub fn decode_snapshot<T: DeserializeOwned>(snapshot: Snapshot) -> Vec<T> {
    snapshot
        .into_iter()
        .filter_map(|doc| match decode_document(&doc.id, doc.data) {
            Ok(record) => Some(record),
            Err(error) => {
                tracing::warn!(id = %doc.id, %error, "dropping malformed document");
                None
            }
        })
        .collect()
}

/// A live query bound to a feature store for the lifetime of a view.
///
/// Opening spawns a task that forwards each snapshot into the store as an
/// action; dropping the `LiveQuery` aborts the task, which drops the
/// subscription and cancels it at the backend. This pairs every open with
/// exactly one cancel.
pub struct LiveQuery {
    task: JoinHandle<()>,
}

impl LiveQuery {
    /// Open `query` on `store_backend` and forward snapshots into `store`
    /// via `to_action`.
    pub fn open<R, F>(
        store_backend: &dyn DocumentStore,
        query: QuerySpec,
        store: Store<R::State, R::Action, R::Environment, R>,
        to_action: F,
    ) -> Self
    where
        R: Reducer + Send + Sync + 'static,
        R::State: Send + Sync + 'static,
        R::Action: Send + Clone + 'static,
        R::Environment: Send + Sync + 'static,
        F: Fn(Snapshot) -> R::Action + Send + 'static,
    {
        let subscription = store_backend.subscribe(query);
        Self::from_subscription(subscription, store, to_action)
    }

    /// Bind an already-open subscription to a store.
    pub fn from_subscription<R, F>(
        mut subscription: Subscription,
        store: Store<R::State, R::Action, R::Environment, R>,
        to_action: F,
    ) -> Self
    where
        R: Reducer + Send + Sync + 'static,
        R::State: Send + Sync + 'static,
        R::Action: Send + Clone + 'static,
        R::Environment: Send + Sync + 'static,
        F: Fn(Snapshot) -> R::Action + Send + 'static,
    {
        let task = tokio::spawn(async move {
            while let Some(snapshot) = subscription.next().await {
                if store.send(to_action(snapshot)).await.is_err() {
                    break;
                }
            }
        });
        Self { task }
    }
}

impl Drop for LiveQuery {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Event;
    use monos_backend::Document;
    use serde_json::json;

    fn event_doc(id: &str, title: &str) -> Document {
        Document {
            id: DocId::new(id),
            data: json!({
                "title": title,
                "category": "sports",
                "description": "",
                "startAt": 1_764_500_000_000_i64,
                "endAt": 1_764_510_800_000_i64,
                "deadlineAt": 1_764_456_800_000_i64,
                "locationName": "代々木公園",
                "locationArea": "東京都",
                "capacity": 12,
                "currentCount": 4,
                "price": 500,
                "deposit": 50,
                "status": "recruiting",
                "tags": ["モルック"],
                "level": "初心者歓迎",
                "hostId": "h1",
                "hostName": "host",
                "createdAt": 1_764_000_000_000_i64,
            }),
        }
    }

    #[test]
    fn decode_injects_store_assigned_id() {
        let doc = event_doc("e1", "molkky");
        let event: Event = decode_document(&doc.id, doc.data).unwrap();
        assert_eq!(event.id.as_str(), "e1");
        assert_eq!(event.title, "molkky");
        assert_eq!(event.current_count, 4);
    }

    #[test]
    fn malformed_documents_are_dropped_not_fatal() {
        let good = event_doc("e1", "molkky");
        let bad = Document {
            id: DocId::new("e2"),
            data: json!({"title": "missing everything"}),
        };
        let events: Vec<Event> = decode_snapshot(vec![good, bad]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id.as_str(), "e1");
    }
}
