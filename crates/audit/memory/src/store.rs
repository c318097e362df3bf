use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use herald_audit::error::LogStoreError;
use herald_audit::record::{IntegrationLog, LogCompletion, LogPage, LogQuery, LogStatus};
use herald_audit::store::IntegrationLogStore;
use herald_core::{LogId, SubscriberId};

/// In-memory integration log store using `DashMap`. Suitable for development
/// and testing.
///
/// Each row carries an insertion sequence number so rows created within the
/// same clock tick still list newest-first deterministically.
pub struct MemoryLogStore {
    logs: DashMap<LogId, (u64, IntegrationLog)>,
    seq: AtomicU64,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self {
            logs: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

impl Default for MemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntegrationLogStore for MemoryLogStore {
    async fn record(&self, entry: IntegrationLog) -> Result<(), LogStoreError> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.logs.insert(entry.id.clone(), (seq, entry));
        Ok(())
    }

    async fn complete(
        &self,
        id: &LogId,
        completion: LogCompletion,
    ) -> Result<IntegrationLog, LogStoreError> {
        let mut row = self
            .logs
            .get_mut(id)
            .ok_or_else(|| LogStoreError::NotFound(id.to_string()))?;
        let (_, entry) = row.value_mut();
        if entry.status != LogStatus::Pending {
            return Err(LogStoreError::AlreadyCompleted(id.to_string()));
        }
        entry.apply(completion);
        Ok(entry.clone())
    }

    async fn get(&self, id: &LogId) -> Result<Option<IntegrationLog>, LogStoreError> {
        Ok(self.logs.get(id).map(|r| r.value().1.clone()))
    }

    async fn query(&self, query: &LogQuery) -> Result<LogPage, LogStoreError> {
        let limit = query.effective_limit();
        let offset = query.effective_offset();

        let mut matching: Vec<(u64, IntegrationLog)> = self
            .logs
            .iter()
            .filter(|entry| query.matches(&entry.value().1))
            .map(|entry| entry.value().clone())
            .collect();

        // Newest first; insertion order breaks timestamp ties.
        matching.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| seq_b.cmp(seq_a))
        });

        let total = matching.len() as u64;
        let logs = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(_, log)| log)
            .collect();

        Ok(LogPage {
            logs,
            total,
            limit,
            offset,
        })
    }

    async fn delete_for_subscriber(&self, subscriber_id: &SubscriberId) -> Result<u64, LogStoreError> {
        let mut removed = 0u64;
        self.logs.retain(|_, (_, entry)| {
            let keep = entry.subscriber_id != *subscriber_id;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use herald_core::IntegrationId;

    use super::*;

    fn pending(subscriber: &str, integration: &str, kind: &str) -> IntegrationLog {
        IntegrationLog::pending(
            SubscriberId::new(subscriber),
            IntegrationId::new(integration),
            kind,
        )
    }

    #[tokio::test]
    async fn record_and_get() {
        let store = MemoryLogStore::new();
        let entry = pending("s1", "i1", "loops");
        let id = entry.id.clone();
        store.record(entry).await.unwrap();

        let fetched = store.get(&id).await.unwrap().unwrap();
        assert_eq!(fetched.status, LogStatus::Pending);
        assert!(store.get(&LogId::new("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn complete_once() {
        let store = MemoryLogStore::new();
        let entry = pending("s1", "i1", "loops");
        let id = entry.id.clone();
        store.record(entry).await.unwrap();

        let done = store
            .complete(&id, LogCompletion::success(serde_json::json!({"ok": true})))
            .await
            .unwrap();
        assert_eq!(done.status, LogStatus::Success);
        assert!(done.completed_at.is_some());

        let err = store
            .complete(&id, LogCompletion::failed("late"))
            .await
            .unwrap_err();
        assert!(matches!(err, LogStoreError::AlreadyCompleted(_)));

        let err = store
            .complete(&LogId::new("nope"), LogCompletion::failed("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, LogStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn query_newest_first_with_pagination() {
        let store = MemoryLogStore::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let entry = pending("s1", &format!("i{i}"), "ntfy");
            ids.push(entry.id.clone());
            store.record(entry).await.unwrap();
        }

        let page = store.query(&LogQuery::default()).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.logs[0].id, ids[4]);
        assert_eq!(page.logs[4].id, ids[0]);

        let page = store
            .query(&LogQuery {
                limit: Some(2),
                offset: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.logs.len(), 2);
        assert_eq!(page.logs[0].id, ids[3]);
        assert_eq!(page.limit, 2);
        assert_eq!(page.offset, 1);
    }

    #[tokio::test]
    async fn query_filters_by_status_and_subscriber() {
        let store = MemoryLogStore::new();
        let a = pending("s1", "i1", "loops");
        let b = pending("s2", "i1", "loops");
        let a_id = a.id.clone();
        store.record(a).await.unwrap();
        store.record(b).await.unwrap();
        store
            .complete(&a_id, LogCompletion::failed("boom"))
            .await
            .unwrap();

        let failed = store
            .query(&LogQuery {
                status: Some(LogStatus::Failed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(failed.total, 1);
        assert_eq!(failed.logs[0].error_message, "boom");

        let s2 = store
            .query(&LogQuery {
                subscriber_id: Some(SubscriberId::new("s2")),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(s2.total, 1);
        assert_eq!(s2.logs[0].status, LogStatus::Pending);
    }

    #[tokio::test]
    async fn stale_pending_rows_are_queryable() {
        let store = MemoryLogStore::new();
        let mut stale = pending("s1", "i1", "smtp");
        stale.created_at = Utc::now() - Duration::minutes(30);
        store.record(stale).await.unwrap();
        store.record(pending("s2", "i1", "smtp")).await.unwrap();

        let page = store
            .query(&LogQuery {
                status: Some(LogStatus::Pending),
                created_before: Some(Utc::now() - Duration::minutes(10)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.logs[0].subscriber_id, SubscriberId::new("s1"));
    }

    #[tokio::test]
    async fn delete_for_subscriber() {
        let store = MemoryLogStore::new();
        store.record(pending("s1", "i1", "loops")).await.unwrap();
        store.record(pending("s1", "i2", "ntfy")).await.unwrap();
        store.record(pending("s2", "i1", "loops")).await.unwrap();

        let removed = store
            .delete_for_subscriber(&SubscriberId::new("s1"))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn delete_counts_only_its_own_rows_under_concurrent_records() {
        let store = std::sync::Arc::new(MemoryLogStore::new());
        for i in 0..50 {
            store
                .record(pending("s1", &format!("i{i}"), "loops"))
                .await
                .unwrap();
        }

        let writer = {
            let store = std::sync::Arc::clone(&store);
            tokio::spawn(async move {
                for i in 0..500 {
                    store
                        .record(pending("s2", &format!("i{i}"), "ntfy"))
                        .await
                        .unwrap();
                }
            })
        };

        let removed = store
            .delete_for_subscriber(&SubscriberId::new("s1"))
            .await
            .unwrap();
        writer.await.unwrap();

        assert_eq!(removed, 50);
        assert_eq!(store.len(), 500);
    }
}
