//! Request-scoped generation context.
//!
//! The calling layer builds one [`TopicContext`] per request. Topic metadata
//! arrives as loose JSON from persistence and is parsed once into
//! [`TopicMeta`] by [`TopicMeta::from_value`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::{
    models::{ExerciseKind, Purpose},
    pool::{parse_pool, PoolItem},
    rng::SeededRng,
};

/// Typed view of the per-topic metadata blob.
///
/// Deserializing goes through [`TopicMeta::from_value`], so serde and direct
/// parsing accept the same documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct TopicMeta {
    /// Authoritative pool override. Empty means "not set".
    pub pool: Vec<PoolItem>,
    pub excluded_keys: Vec<String>,
    pub seen_keys: Vec<String>,
    pub force_key: Option<String>,
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn field<'a>(value: &'a Value, camel: &str, snake: &str) -> Option<&'a Value> {
    value.get(camel).or_else(|| value.get(snake))
}

impl TopicMeta {
    /// Parse the metadata blob, accepting camelCase or snake_case keys.
    /// Unknown fields are ignored and malformed ones read as empty.
    pub fn from_value(value: &Value) -> TopicMeta {
        if !value.is_object() {
            return TopicMeta::default();
        }
        TopicMeta {
            pool: value.get("pool").map(parse_pool).unwrap_or_default(),
            excluded_keys: string_list(field(value, "excludedKeys", "excluded_keys")),
            seen_keys: string_list(field(value, "seenKeys", "seen_keys")),
            force_key: field(value, "forceKey", "force_key")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

impl From<Value> for TopicMeta {
    fn from(value: Value) -> Self {
        TopicMeta::from_value(&value)
    }
}

/// One previously served item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub archetype: Option<String>,
    pub key: Option<String>,
}

impl HistoryEntry {
    pub fn archetype(archetype: impl Into<String>) -> Self {
        HistoryEntry { archetype: Some(archetype.into()), key: None }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TopicContext {
    /// Dotted `prefix.base` curriculum slug.
    pub topic_slug: String,
    /// `None` means mixed.
    pub variant: Option<String>,
    pub meta: TopicMeta,
    pub prefer_kind: Option<ExerciseKind>,
    pub prefer_purpose: Option<Purpose>,
    pub excluded_keys: Vec<String>,
    pub seen_keys: Vec<String>,
    pub used_keys: Vec<String>,
    pub history: Vec<HistoryEntry>,
    pub salt: Option<String>,
    pub exercise_key: Option<String>,
    /// Caller-supplied stream, used instead of a freshly seeded one.
    pub rng: Option<SeededRng>,
}

impl TopicContext {
    /// Context for `topic_slug` with everything else unset.
    pub fn new(topic_slug: impl Into<String>) -> Self {
        TopicContext { topic_slug: topic_slug.into(), ..TopicContext::default() }
    }

    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn with_meta(mut self, meta: TopicMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn prefer_kind(mut self, kind: ExerciseKind) -> Self {
        self.prefer_kind = Some(kind);
        self
    }

    pub fn prefer_purpose(mut self, purpose: Purpose) -> Self {
        self.prefer_purpose = Some(purpose);
        self
    }

    pub fn exclude<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn force_key(mut self, key: impl Into<String>) -> Self {
        self.exercise_key = Some(key.into());
        self
    }

    pub fn with_rng(mut self, rng: SeededRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Salt with surrounding whitespace removed; `None` if blank.
    pub fn effective_salt(&self) -> Option<&str> {
        self.salt.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Explicit archetype request: `exercise_key` first, then `meta.force_key`.
    pub fn forced_key(&self) -> Option<&str> {
        self.exercise_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or(self.meta.force_key.as_deref())
    }

    /// Every key the learner has already seen, from all sources.
    pub fn excluded_set(&self) -> BTreeSet<String> {
        let lists = [
            &self.excluded_keys,
            &self.seen_keys,
            &self.used_keys,
            &self.meta.excluded_keys,
            &self.meta.seen_keys,
        ];
        let from_lists = lists.into_iter().flatten().cloned();
        let from_history = self
            .history
            .iter()
            .filter_map(|entry| entry.archetype.clone().or_else(|| entry.key.clone()));

        from_lists
            .chain(from_history)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meta_parses_camel_and_snake_case() {
        let meta = TopicMeta::from_value(&json!({
            "pool": [{ "key": "print_basic", "w": 1 }],
            "excludedKeys": ["a"],
            "seen_keys": ["b", "  ", 7],
            "forceKey": " print_sep ",
            "title": "ignored",
        }));
        assert_eq!(meta.pool.len(), 1);
        assert_eq!(meta.excluded_keys, vec!["a"]);
        assert_eq!(meta.seen_keys, vec!["b"]);
        assert_eq!(meta.force_key.as_deref(), Some("print_sep"));
    }

    #[test]
    fn serde_and_from_value_agree() {
        let doc = json!({
            "pool": ["print_basic", { "key": "print_sep", "weight": 2 }],
            "seenKeys": ["print_basic"],
            "forceKey": "print_sep",
        });
        let via_serde: TopicMeta = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(via_serde, TopicMeta::from_value(&doc));
        assert_eq!(via_serde.pool[0].weight, 1.0);
        assert_eq!(via_serde.pool[1].weight, 2.0);
        assert_eq!(via_serde.seen_keys, vec!["print_basic"]);

        let mut meta = TopicMeta::default();
        meta.pool.push(
            PoolItem::new("print_project", 1.5)
                .with_kind(ExerciseKind::CodeInput)
                .with_purpose(Purpose::Project),
        );
        meta.excluded_keys.push("print_sep".into());
        let back: TopicMeta = serde_json::from_value(serde_json::to_value(&meta).unwrap()).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn meta_from_non_object_is_empty() {
        assert_eq!(TopicMeta::from_value(&json!("pool")), TopicMeta::default());
        assert_eq!(TopicMeta::from_value(&Value::Null), TopicMeta::default());
    }

    #[test]
    fn excluded_set_gathers_every_source() {
        let mut ctx = TopicContext::new("py0.print").exclude(["a"]);
        ctx.seen_keys.push("b".into());
        ctx.used_keys.push("c".into());
        ctx.meta.excluded_keys.push("d".into());
        ctx.meta.seen_keys.push("e".into());
        ctx.history.push(HistoryEntry::archetype("f"));
        ctx.history.push(HistoryEntry { archetype: None, key: Some("g".into()) });
        ctx.history.push(HistoryEntry::default());

        let got: Vec<String> = ctx.excluded_set().into_iter().collect();
        assert_eq!(got, vec!["a", "b", "c", "d", "e", "f", "g"]);
    }

    #[test]
    fn forced_key_prefers_exercise_key() {
        let mut ctx = TopicContext::new("py0.print");
        ctx.meta.force_key = Some("from_meta".into());
        assert_eq!(ctx.forced_key(), Some("from_meta"));

        let ctx = ctx.force_key("explicit");
        assert_eq!(ctx.forced_key(), Some("explicit"));

        let ctx = ctx.force_key("   ");
        assert_eq!(ctx.forced_key(), Some("from_meta"));
    }

    #[test]
    fn blank_salt_counts_as_missing() {
        assert_eq!(TopicContext::new("dot").with_salt("  ").effective_salt(), None);
        assert_eq!(TopicContext::new("dot").with_salt(" u1 ").effective_salt(), Some("u1"));
    }
}
