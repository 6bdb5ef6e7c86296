use std::collections::BTreeMap;

use dashmap::DashMap;
use ssot_common::model::ObjectKind;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KindStats {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl KindStats {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged
    }
}

/// What the upserts of a run did, per kind.
#[derive(Default)]
pub struct UpsertStats {
    kinds: DashMap<ObjectKind, KindStats>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Outcome {
    Created,
    Updated,
    Unchanged,
}

impl UpsertStats {
    pub(crate) fn record(&self, kind: ObjectKind, outcome: Outcome) {
        let mut stats = self.kinds.entry(kind).or_default();
        match outcome {
            Outcome::Created => stats.created += 1,
            Outcome::Updated => stats.updated += 1,
            Outcome::Unchanged => stats.unchanged += 1,
        }
    }

    pub fn get(&self, kind: ObjectKind) -> KindStats {
        self.kinds.get(&kind).map(|s| *s).unwrap_or_default()
    }

    pub fn snapshot(&self) -> BTreeMap<ObjectKind, KindStats> {
        self.kinds.iter().map(|e| (*e.key(), *e.value())).collect()
    }

    pub fn total_created(&self) -> usize {
        self.kinds.iter().map(|e| e.value().created).sum()
    }

    pub fn total_updated(&self) -> usize {
        self.kinds.iter().map(|e| e.value().updated).sum()
    }
}
