//! # Target Inventory Port
//!
//! [`TargetClient`] is everything the reconciler needs from the system of record: create an
//! object and receive its identity, or update an existing one. Payloads are JSON documents of
//! the object being written.
//!
//! [`MemoryTarget`] keeps everything in memory. It backs the CLI's dry-run mode and the test
//! suites, which is why it counts calls and can be told to refuse payloads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use ssot_common::model::{ObjectId, ObjectKind};
use ssot_common::{Result, SsotError};

#[async_trait]
pub trait TargetClient: Send + Sync {
    /// Creates an object and returns the identity the target assigned to it.
    async fn create(&self, kind: ObjectKind, payload: Value) -> Result<ObjectId>;

    async fn update(&self, kind: ObjectKind, id: ObjectId, payload: Value) -> Result<()>;
}

type RejectFn = Box<dyn Fn(&Value) -> bool + Send + Sync>;

struct RejectRule {
    kind: ObjectKind,
    matches: RejectFn,
    reason: String,
}

/// In-memory system of record.
pub struct MemoryTarget {
    next_id: AtomicU64,
    objects: DashMap<(ObjectKind, ObjectId), Value>,
    creates: DashMap<ObjectKind, usize>,
    updates: DashMap<ObjectKind, usize>,
    rejects: Vec<RejectRule>,
    latency: Option<Duration>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            objects: DashMap::new(),
            creates: DashMap::new(),
            updates: DashMap::new(),
            rejects: Vec::new(),
            latency: None,
        }
    }

    /// Refuses creates and updates of `kind` whose payload satisfies `matches`.
    pub fn rejecting<F>(mut self, kind: ObjectKind, reason: &str, matches: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.rejects.push(RejectRule {
            kind,
            matches: Box::new(matches),
            reason: reason.to_string(),
        });
        self
    }

    /// Delays every call, widening the window in which concurrent callers overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn creates(&self, kind: ObjectKind) -> usize {
        self.creates.get(&kind).map(|c| *c).unwrap_or(0)
    }

    pub fn updates(&self, kind: ObjectKind) -> usize {
        self.updates.get(&kind).map(|c| *c).unwrap_or(0)
    }

    pub fn total_creates(&self) -> usize {
        self.creates.iter().map(|c| *c.value()).sum()
    }

    pub fn total_updates(&self) -> usize {
        self.updates.iter().map(|c| *c.value()).sum()
    }

    pub fn get(&self, kind: ObjectKind, id: ObjectId) -> Option<Value> {
        self.objects.get(&(kind, id)).map(|v| v.value().clone())
    }

    /// Every stored object of `kind`, ordered by identity.
    pub fn objects(&self, kind: ObjectKind) -> Vec<Value> {
        let mut found: Vec<(ObjectId, Value)> = self
            .objects
            .iter()
            .filter(|entry| entry.key().0 == kind)
            .map(|entry| (entry.key().1, entry.value().clone()))
            .collect();
        found.sort_by_key(|(id, _)| *id);
        found.into_iter().map(|(_, v)| v).collect()
    }

    async fn admit(&self, kind: ObjectKind, payload: &Value) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self
            .rejects
            .iter()
            .find(|rule| rule.kind == kind && (rule.matches)(payload))
        {
            Some(rule) => Err(SsotError::rejected(kind, payload, rule.reason.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MemoryTarget {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TargetClient for MemoryTarget {
    async fn create(&self, kind: ObjectKind, mut payload: Value) -> Result<ObjectId> {
        self.admit(kind, &payload).await?;

        let id = ObjectId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Value::Object(map) = &mut payload {
            map.insert("id".into(), Value::from(id.0));
        }
        self.objects.insert((kind, id), payload);
        *self.creates.entry(kind).or_insert(0) += 1;
        Ok(id)
    }

    async fn update(&self, kind: ObjectKind, id: ObjectId, payload: Value) -> Result<()> {
        self.admit(kind, &payload).await?;

        if !self.objects.contains_key(&(kind, id)) {
            return Err(SsotError::rejected(kind, id, "no such object"));
        }
        self.objects.insert((kind, id), payload);
        *self.updates.entry(kind).or_insert(0) += 1;
        Ok(())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn identities_are_unique_and_counted() {
        let target = MemoryTarget::new();
        let a = target.create(ObjectKind::Site, json!({"name": "a"})).await.unwrap();
        let b = target.create(ObjectKind::Site, json!({"name": "b"})).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(target.creates(ObjectKind::Site), 2);
        assert_eq!(target.get(ObjectKind::Site, a).unwrap()["id"], json!(a.0));
    }

    #[tokio::test]
    async fn reject_rule_applies_to_its_kind_only() {
        let target = MemoryTarget::new().rejecting(ObjectKind::Device, "name taken", |p| {
            p["name"] == "esx01"
        });

        let err = target
            .create(ObjectKind::Device, json!({"name": "esx01"}))
            .await
            .unwrap_err();
        assert!(matches!(err, SsotError::Rejected { kind: ObjectKind::Device, .. }));
        assert!(target.create(ObjectKind::Site, json!({"name": "esx01"})).await.is_ok());
        assert_eq!(target.creates(ObjectKind::Device), 0);
    }

    #[tokio::test]
    async fn update_of_unknown_object_is_rejected() {
        let target = MemoryTarget::new();
        let result = target.update(ObjectKind::Tag, ObjectId(99), json!({})).await;
        assert!(result.is_err());
        assert_eq!(target.total_updates(), 0);
    }
}
