//! In-memory document store.
//!
//! Backs tests and the demo with the same contract a hosted document
//! database would satisfy: server-stamped `createdAt`, atomic guarded
//! updates behind a single write lock, and live snapshot subscriptions
//! driven by a version counter.

use crate::store::{
    BackendError, Direction, DocId, Document, DocumentStore, Mutation, QuerySpec, Snapshot,
    Subscription, SubscriptionGuard,
};
use async_trait::async_trait;
use futures::StreamExt;
use monos_core::environment::{Clock, SystemClock};
use serde_json::Value;
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

struct StoredDoc {
    id: DocId,
    /// Insertion sequence, used as the ordering tiebreak when two documents
    /// carry an equal `order_by` value.
    seq: u64,
    data: Value,
}

struct MemoryInner {
    collections: RwLock<HashMap<String, Vec<StoredDoc>>>,
    /// Bumped after every committed write; subscriptions wait on it.
    version: watch::Sender<u64>,
    seq: AtomicU64,
    clock: Arc<dyn Clock>,
    active_subscriptions: Arc<AtomicUsize>,
    offline: AtomicBool,
}

/// In-memory [`DocumentStore`] implementation.
///
/// Cheap to clone; all clones share the same underlying data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store stamping `createdAt` from the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store with an explicit clock, letting tests pin
    /// `createdAt` stamps.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(MemoryInner {
                collections: RwLock::new(HashMap::new()),
                version,
                seq: AtomicU64::new(0),
                clock,
                active_subscriptions: Arc::new(AtomicUsize::new(0)),
                offline: AtomicBool::new(false),
            }),
        }
    }

    /// Simulate losing the backend: while offline every operation returns
    /// [`BackendError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::Release);
    }

    /// Number of subscriptions currently open.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.inner.active_subscriptions.load(Ordering::Acquire)
    }

    fn check_online(&self) -> Result<(), BackendError> {
        if self.inner.offline.load(Ordering::Acquire) {
            return Err(BackendError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }

    fn bump_version(&self) {
        self.inner.version.send_modify(|v| *v += 1);
    }

    async fn evaluate(&self, query: &QuerySpec) -> Snapshot {
        let collections = self.inner.collections.read().await;
        let Some(docs) = collections.get(&query.collection) else {
            return Vec::new();
        };

        let mut matched: Vec<&StoredDoc> = docs
            .iter()
            .filter(|doc| {
                query
                    .filters
                    .iter()
                    .all(|(field, value)| doc.data.get(field) == Some(value))
            })
            .collect();

        matched.sort_by(|a, b| {
            let ord = cmp_field(a.data.get(&query.order_by), b.data.get(&query.order_by))
                .then_with(|| a.seq.cmp(&b.seq));
            match query.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        matched
            .into_iter()
            .map(|doc| Document {
                id: doc.id.clone(),
                data: doc.data.clone(),
            })
            .collect()
    }
}

/// Total order over JSON values for query sorting: absent fields sort first,
/// then nulls, booleans, numbers, strings. Mixed-type collections are not
/// expected in practice; the order just has to be stable.
fn cmp_field(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Less,
        (Some(_), None) => CmpOrdering::Greater,
        (Some(a), Some(b)) => cmp_value(a, b),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn cmp_value(a: &Value, b: &Value) -> CmpOrdering {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b))
            .unwrap_or(CmpOrdering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, mut data: Value) -> Result<DocId, BackendError> {
        self.check_online()?;
        let Some(fields) = data.as_object_mut() else {
            return Err(BackendError::InvalidDocument(
                "document payload must be a JSON object".to_string(),
            ));
        };
        fields.insert(
            "createdAt".to_string(),
            Value::from(self.inner.clock.now().timestamp_millis()),
        );

        let id = DocId::new(Uuid::new_v4().to_string());
        let seq = self.inner.seq.fetch_add(1, Ordering::AcqRel);
        tracing::debug!(collection, id = %id, "inserting document");
        {
            let mut collections = self.inner.collections.write().await;
            collections
                .entry(collection.to_string())
                .or_default()
                .push(StoredDoc {
                    id: id.clone(),
                    seq,
                    data,
                });
        }
        self.bump_version();
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &DocId) -> Result<Option<Value>, BackendError> {
        self.check_online()?;
        let collections = self.inner.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == *id))
            .map(|doc| doc.data.clone()))
    }

    async fn update_if(
        &self,
        collection: &str,
        id: &DocId,
        mutation: Mutation,
    ) -> Result<Value, BackendError> {
        self.check_online()?;
        let updated = {
            let mut collections = self.inner.collections.write().await;
            let doc = collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|doc| doc.id == *id))
                .ok_or_else(|| BackendError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;

            // Mutate a draft so a rejected guard leaves the document intact.
            let mut draft = doc.data.clone();
            mutation(&mut draft).map_err(|reason| BackendError::PreconditionFailed { reason })?;
            doc.data = draft.clone();
            draft
        };
        self.bump_version();
        Ok(updated)
    }

    async fn merge(&self, collection: &str, id: &DocId, fields: Value) -> Result<(), BackendError> {
        self.check_online()?;
        let Value::Object(fields) = fields else {
            return Err(BackendError::InvalidDocument(
                "merge payload must be a JSON object".to_string(),
            ));
        };
        {
            let mut collections = self.inner.collections.write().await;
            let docs = collections.entry(collection.to_string()).or_default();
            if let Some(doc) = docs.iter_mut().find(|doc| doc.id == *id) {
                if let Some(existing) = doc.data.as_object_mut() {
                    for (key, value) in fields {
                        existing.insert(key, value);
                    }
                }
            } else {
                let seq = self.inner.seq.fetch_add(1, Ordering::AcqRel);
                let mut data = serde_json::Map::new();
                data.insert(
                    "createdAt".to_string(),
                    Value::from(self.inner.clock.now().timestamp_millis()),
                );
                for (key, value) in fields {
                    data.insert(key, value);
                }
                docs.push(StoredDoc {
                    id: id.clone(),
                    seq,
                    data: Value::Object(data),
                });
            }
        }
        self.bump_version();
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocId) -> Result<(), BackendError> {
        self.check_online()?;
        {
            let mut collections = self.inner.collections.write().await;
            let docs = collections
                .get_mut(collection)
                .ok_or_else(|| BackendError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            let before = docs.len();
            docs.retain(|doc| doc.id != *id);
            if docs.len() == before {
                return Err(BackendError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
        }
        self.bump_version();
        Ok(())
    }

    fn subscribe(&self, query: QuerySpec) -> Subscription {
        tracing::debug!(collection = %query.collection, "opening subscription");
        let store = self.clone();
        let mut version = self.inner.version.subscribe();
        let guard = SubscriptionGuard::register(Arc::clone(&self.inner.active_subscriptions));

        let stream = async_stream::stream! {
            let mut last: Option<Snapshot> = None;
            loop {
                let snapshot = store.evaluate(&query).await;
                if last.as_ref() != Some(&snapshot) {
                    last = Some(snapshot.clone());
                    yield snapshot;
                }
                if version.changed().await.is_err() {
                    break;
                }
            }
        };

        Subscription::new(stream.boxed(), guard)
    }
}
