//! Topic bundles: an authored default pool plus the handlers that render
//! each archetype in it.
//!
//! Handlers are plain function pointers with the signature
//!
//! ```ignore
//! fn handler(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError>
//! ```
//!
//! They must draw all randomness from `rng` so that a seeded run is
//! reproducible.

use std::collections::{BTreeMap, BTreeSet};

use crate::engine::{
    error::GenError,
    models::{DifficultyLevel, ExerciseKind, Item, Purpose},
    pool::PoolItem,
    rng::SeededRng,
};

pub type Handler = fn(&mut SeededRng, DifficultyLevel, &str) -> Result<Item, GenError>;

#[derive(Debug, Clone)]
pub struct TopicBundle {
    slug: String,
    pool: Vec<PoolItem>,
    handlers: BTreeMap<String, Handler>,
    default_purpose: Purpose,
}

impl TopicBundle {
    pub fn new(slug: impl Into<String>) -> Self {
        TopicBundle {
            slug: slug.into(),
            pool: Vec::new(),
            handlers: BTreeMap::new(),
            default_purpose: Purpose::Quiz,
        }
    }

    /// Purpose assumed for pool items that don't declare one.
    pub fn default_purpose(mut self, purpose: Purpose) -> Self {
        self.default_purpose = purpose;
        self
    }

    /// Add an archetype to the default pool together with its handler.
    pub fn archetype(self, key: &str, weight: f64, kind: ExerciseKind, handler: Handler) -> Self {
        self.archetype_item(PoolItem::new(key, weight).with_kind(kind), handler)
    }

    /// Like [`TopicBundle::archetype`] with a fully specified pool item.
    /// Re-adding a key replaces the earlier entry.
    pub fn archetype_item(mut self, item: PoolItem, handler: Handler) -> Self {
        self.handlers.insert(item.key.clone(), handler);
        match self.pool.iter_mut().find(|existing| existing.key == item.key) {
            Some(existing) => *existing = item,
            None => self.pool.push(item),
        }
        self
    }

    /// Register a handler that is dispatchable (via metadata pools or the
    /// safe mixed pool) but absent from the default pool.
    pub fn handler(mut self, key: &str, handler: Handler) -> Self {
        self.handlers.insert(key.to_string(), handler);
        self
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn pool(&self) -> &[PoolItem] {
        &self.pool
    }

    pub fn purpose(&self) -> Purpose {
        self.default_purpose
    }

    pub fn handler_for(&self, key: &str) -> Option<Handler> {
        self.handlers.get(key).copied()
    }

    /// Every key with a registered handler, in sorted order.
    pub fn valid_keys(&self) -> BTreeSet<String> {
        self.handlers.keys().cloned().collect()
    }

    /// Check the load-time invariants: a non-empty slug without dots, at
    /// least one handler, positive finite weights, unique pool keys, and a
    /// handler for every pool key.
    pub fn validate(&self) -> Result<(), GenError> {
        let fail = |reason: String| GenError::InvalidBundle { topic: self.slug.clone(), reason };

        if self.slug.trim().is_empty() || self.slug.contains('.') {
            return Err(fail("slug must be a non-empty base name".into()));
        }
        if self.handlers.is_empty() {
            return Err(fail("no handlers registered".into()));
        }
        let mut seen = BTreeSet::new();
        for item in &self.pool {
            if !seen.insert(item.key.as_str()) {
                return Err(fail(format!("duplicate pool key '{}'", item.key)));
            }
            if !(item.weight.is_finite() && item.weight > 0.0) {
                return Err(fail(format!("pool key '{}' has weight {}", item.key, item.weight)));
            }
            if !self.handlers.contains_key(&item.key) {
                return Err(fail(format!("pool key '{}' has no handler", item.key)));
            }
        }
        Ok(())
    }

    /// Replace the default pool wholesale. Used by content that computes its
    /// pool separately from handler registration.
    pub fn with_pool(mut self, pool: Vec<PoolItem>) -> Self {
        self.pool = pool;
        self
    }
}
