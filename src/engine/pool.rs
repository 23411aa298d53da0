//! Pool items and the pure functions that parse, filter and exclude them.
//!
//! Loosely-typed pool JSON (from topic metadata) is parsed once here into
//! [`PoolItem`]s; nothing past this module sees raw JSON.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::models::{ExerciseKind, Purpose};

/// One weighted archetype in a topic pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolItem {
    pub key: String,
    #[serde(rename = "w", alias = "weight", default = "unit_weight")]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ExerciseKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<Purpose>,
}

impl PoolItem {
    pub fn new(key: impl Into<String>, weight: f64) -> Self {
        PoolItem { key: key.into(), weight, kind: None, purpose: None }
    }

    pub fn with_kind(mut self, kind: ExerciseKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_purpose(mut self, purpose: Purpose) -> Self {
        self.purpose = Some(purpose);
        self
    }

    /// Purpose with the topic default filled in.
    pub fn effective_purpose(&self, default: Purpose) -> Purpose {
        self.purpose.unwrap_or(default)
    }
}

fn unit_weight() -> f64 {
    1.0
}

fn valid_weight(w: f64) -> bool {
    w.is_finite() && w > 0.0
}

fn parse_weight(obj: &Map<String, Value>) -> Option<f64> {
    match obj.get("w").or_else(|| obj.get("weight")) {
        None | Some(Value::Null) => Some(1.0),
        Some(Value::Number(n))   => n.as_f64(),
        Some(Value::String(s))   => s.trim().parse::<f64>().ok(),
        Some(_)                  => None,
    }
}

fn parse_entry(entry: &Value) -> Option<PoolItem> {
    let obj = match entry {
        Value::String(key) if !key.trim().is_empty() => {
            return Some(PoolItem::new(key.trim(), 1.0));
        }
        Value::Object(obj) => obj,
        _ => {
            tracing::warn!(%entry, "dropping pool entry that is neither a key nor an object");
            return None;
        }
    };

    let key = match obj.get("key").and_then(Value::as_str).map(str::trim) {
        Some(key) if !key.is_empty() => key,
        _ => {
            tracing::warn!(%entry, "dropping pool entry without a key");
            return None;
        }
    };

    let weight = match parse_weight(obj) {
        Some(w) if valid_weight(w) => w,
        _ => {
            tracing::warn!(key, "dropping pool entry with a non-positive or non-numeric weight");
            return None;
        }
    };

    let kind = match obj.get("kind").and_then(Value::as_str) {
        None => None,
        Some(raw) => match ExerciseKind::parse(raw) {
            Some(kind) => Some(kind),
            None => {
                tracing::warn!(key, kind = raw, "dropping pool entry with an unknown kind");
                return None;
            }
        },
    };

    let purpose = obj.get("purpose").and_then(Value::as_str).and_then(Purpose::parse);

    Some(PoolItem { key: key.to_string(), weight, kind, purpose })
}

/// Parse a pool override from topic metadata.
///
/// Accepts an array of bare keys or `{key, w|weight, kind?, purpose?}`
/// objects. Malformed entries are dropped, a missing weight counts as 1, and
/// only the first occurrence of a key is kept. Anything that is not an array
/// yields an empty pool.
pub fn parse_pool(value: &Value) -> Vec<PoolItem> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Null => return Vec::new(),
        other => {
            tracing::warn!(%other, "pool override is not an array; ignoring it");
            return Vec::new();
        }
    };

    let mut seen = BTreeSet::new();
    entries
        .iter()
        .filter_map(parse_entry)
        .filter(|item| seen.insert(item.key.clone()))
        .collect()
}

/// Keep only items whose key can be dispatched.
pub fn restrict_to_keys(pool: &[PoolItem], valid_keys: &BTreeSet<String>) -> Vec<PoolItem> {
    pool.iter()
        .filter(|item| valid_keys.contains(&item.key) && valid_weight(item.weight))
        .cloned()
        .collect()
}

/// Uniform weight-1 pool over every valid key.
pub fn safe_mixed_pool(valid_keys: &BTreeSet<String>) -> Vec<PoolItem> {
    valid_keys.iter().map(|key| PoolItem::new(key.clone(), 1.0)).collect()
}

/// Drop items constrained to a different kind. Kind-less items always pass.
pub fn filter_by_kind(pool: &[PoolItem], prefer_kind: Option<ExerciseKind>) -> Vec<PoolItem> {
    match prefer_kind {
        None => pool.to_vec(),
        Some(wanted) => pool
            .iter()
            .filter(|item| item.kind.map_or(true, |kind| kind == wanted))
            .cloned()
            .collect(),
    }
}

pub fn filter_by_purpose(
    pool: &[PoolItem],
    prefer_purpose: Option<Purpose>,
    default_purpose: Purpose,
) -> Vec<PoolItem> {
    match prefer_purpose {
        None => pool.to_vec(),
        Some(wanted) => pool
            .iter()
            .filter(|item| item.effective_purpose(default_purpose) == wanted)
            .cloned()
            .collect(),
    }
}

/// Kind filter, then purpose filter.
pub fn apply_filters(
    pool: &[PoolItem],
    prefer_kind: Option<ExerciseKind>,
    prefer_purpose: Option<Purpose>,
    default_purpose: Purpose,
) -> Vec<PoolItem> {
    filter_by_purpose(&filter_by_kind(pool, prefer_kind), prefer_purpose, default_purpose)
}

/// Outcome of [`exclude_soft`].
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    pub pool: Vec<PoolItem>,
    /// `true` when every item was excluded and the input pool was kept.
    pub reverted: bool,
}

/// Remove already-seen keys, unless that would leave nothing to draw from.
pub fn exclude_soft(pool: &[PoolItem], excluded: &BTreeSet<String>) -> Exclusion {
    if excluded.is_empty() {
        return Exclusion { pool: pool.to_vec(), reverted: false };
    }
    let remaining: Vec<PoolItem> = pool
        .iter()
        .filter(|item| !excluded.contains(&item.key))
        .cloned()
        .collect();
    if remaining.is_empty() {
        Exclusion { pool: pool.to_vec(), reverted: true }
    } else {
        Exclusion { pool: remaining, reverted: false }
    }
}
