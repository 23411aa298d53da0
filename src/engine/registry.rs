//! Generator registry: top-level key → per-request generator factory.
//!
//! Two calling conventions are adapted to the same contract:
//!
//! - **Context-first factories** take the [`TopicContext`] up front and
//!   return a bound generator closing over it (routers and modules are
//!   registered this way).
//! - **Legacy flat functions** take `(rng, difficulty, id, opts)` directly;
//!   [`legacy_factory`] forwards the context as [`LegacyOptions`] and fills
//!   in a default archetype label when the function returns none.
//!
//! The registry is built once with [`RegistryBuilder`] and is immutable
//! afterwards; share it behind an `Arc`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::{
    config::EngineConfig,
    context::TopicContext,
    error::GenError,
    models::{DifficultyLevel, ExerciseKind, GenOut, Item, Purpose},
    module_gen::ModuleGenerator,
    rng::SeededRng,
    slug::{parse_topic_slug, SlugRouter},
};

/// Top-level registry key. Distinct from topic slugs: many slugs can map to
/// one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GenKey(String);

impl GenKey {
    pub fn new(key: impl Into<String>) -> Self {
        GenKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for GenKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GenKey {
    fn from(key: &str) -> Self {
        GenKey::new(key)
    }
}

/// A generator bound to one request's context.
pub type BoundGenerator =
    Box<dyn FnMut(&mut SeededRng, DifficultyLevel, &str) -> Result<GenOut, GenError>>;

/// Builds a [`BoundGenerator`] for a context.
pub type Factory = Arc<dyn Fn(&TopicContext) -> BoundGenerator + Send + Sync>;

// ---------------------------------------------------------------------------
// Legacy flat generators
// ---------------------------------------------------------------------------

/// Context fields forwarded to a legacy flat generator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyOptions {
    pub topic_slug: String,
    pub variant: Option<String>,
    pub prefer_kind: Option<ExerciseKind>,
    pub prefer_purpose: Option<Purpose>,
    pub excluded_keys: BTreeSet<String>,
    pub forced_key: Option<String>,
}

impl LegacyOptions {
    pub fn from_context(ctx: &TopicContext) -> Self {
        LegacyOptions {
            topic_slug: ctx.topic_slug.clone(),
            variant: ctx.variant.clone(),
            prefer_kind: ctx.prefer_kind,
            prefer_purpose: ctx.prefer_purpose,
            excluded_keys: ctx.excluded_set(),
            forced_key: ctx.forced_key().map(str::to_string),
        }
    }
}

/// What a legacy generator returns; the archetype and purpose are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyOutput {
    pub archetype: Option<String>,
    pub item: Item,
    pub purpose: Option<Purpose>,
}

pub type LegacyGenerator =
    fn(&mut SeededRng, DifficultyLevel, &str, &LegacyOptions) -> Result<LegacyOutput, GenError>;

/// Wrap a legacy flat generator as a factory.
pub fn legacy_factory(generator: LegacyGenerator, default_archetype: impl Into<String>) -> Factory {
    let default_archetype = default_archetype.into();
    Arc::new(move |ctx: &TopicContext| -> BoundGenerator {
        let opts = LegacyOptions::from_context(ctx);
        let default_archetype = default_archetype.clone();
        Box::new(move |rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str| -> Result<GenOut, GenError> {
            let out = generator(rng, difficulty, id, &opts)?;
            let archetype = out
                .archetype
                .filter(|label| !label.trim().is_empty())
                .unwrap_or_else(|| default_archetype.clone());
            Ok(GenOut::new(archetype, out.item, out.purpose.unwrap_or_default()))
        })
    })
}

// ---------------------------------------------------------------------------
// Context-first factories
// ---------------------------------------------------------------------------

pub fn router_factory(router: Arc<SlugRouter>) -> Factory {
    Arc::new(move |ctx: &TopicContext| -> BoundGenerator {
        let router = Arc::clone(&router);
        let ctx = ctx.clone();
        Box::new(move |rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str| {
            router.route(&ctx.topic_slug).generate(&ctx, rng, difficulty, id)
        })
    })
}

pub fn module_factory(module: Arc<ModuleGenerator>) -> Factory {
    Arc::new(move |ctx: &TopicContext| -> BoundGenerator {
        let module = Arc::clone(&module);
        let ctx = ctx.clone();
        Box::new(move |rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str| {
            module.generate(&ctx, rng, difficulty, id)
        })
    })
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct GeneratorRegistry {
    factories: BTreeMap<GenKey, Factory>,
    aliases: BTreeMap<String, GenKey>,
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("keys", &self.factories.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .finish()
    }
}

impl GeneratorRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new(&EngineConfig::default())
    }

    pub fn get(&self, gen_key: &str) -> Option<&Factory> {
        self.factories.get(gen_key.trim())
    }

    pub fn contains(&self, gen_key: &str) -> bool {
        self.get(gen_key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &GenKey> {
        self.factories.keys()
    }

    /// Registry key that owns a topic slug, looked up by prefix and then by
    /// base name.
    pub fn gen_key_for(&self, topic_slug: &str) -> Option<&GenKey> {
        let slug = parse_topic_slug(topic_slug);
        slug.prefix
            .and_then(|prefix| self.aliases.get(prefix))
            .or_else(|| self.aliases.get(slug.base))
    }
}

pub struct RegistryBuilder {
    legacy_archetype_label: String,
    factories: BTreeMap<GenKey, Factory>,
    aliases: BTreeMap<String, GenKey>,
}

impl RegistryBuilder {
    pub fn new(config: &EngineConfig) -> Self {
        RegistryBuilder {
            legacy_archetype_label: config.legacy_archetype_label.clone(),
            factories: BTreeMap::new(),
            aliases: BTreeMap::new(),
        }
    }

    /// Register a context-first factory. A repeated key replaces the earlier one.
    pub fn register(mut self, gen_key: impl Into<GenKey>, factory: Factory) -> Self {
        let gen_key = gen_key.into();
        if self.factories.contains_key(&gen_key) {
            tracing::warn!(%gen_key, "generator registered twice, last one wins");
        }
        self.factories.insert(gen_key, factory);
        self
    }

    pub fn context_first<F>(self, gen_key: impl Into<GenKey>, factory: F) -> Self
    where
        F: Fn(&TopicContext) -> BoundGenerator + Send + Sync + 'static,
    {
        self.register(gen_key, Arc::new(factory))
    }

    pub fn legacy(self, gen_key: impl Into<GenKey>, generator: LegacyGenerator) -> Self {
        let label = self.legacy_archetype_label.clone();
        self.register(gen_key, legacy_factory(generator, label))
    }

    pub fn router(self, gen_key: impl Into<GenKey>, router: SlugRouter) -> Self {
        self.register(gen_key, router_factory(Arc::new(router)))
    }

    pub fn module(self, gen_key: impl Into<GenKey>, module: ModuleGenerator) -> Self {
        self.register(gen_key, module_factory(Arc::new(module)))
    }

    /// Map a slug prefix or base name to a registry key.
    pub fn alias(mut self, slug_part: &str, gen_key: impl Into<GenKey>) -> Self {
        self.aliases.insert(slug_part.to_string(), gen_key.into());
        self
    }

    /// Freeze the registry. Fails if an alias points at an unregistered key.
    pub fn build(self) -> Result<GeneratorRegistry, GenError> {
        if let Some((part, key)) = self.aliases.iter().find(|(_, key)| !self.factories.contains_key(*key)) {
            return Err(GenError::InvalidConfig(format!(
                "alias '{part}' points at unregistered generator '{key}'"
            )));
        }
        Ok(GeneratorRegistry { factories: self.factories, aliases: self.aliases })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bundle::TopicBundle;
    use pretty_assertions::assert_eq;

    fn flat(
        rng: &mut SeededRng,
        _d: DifficultyLevel,
        id: &str,
        opts: &LegacyOptions,
    ) -> Result<LegacyOutput, GenError> {
        let n = rng.int(1, 5);
        Ok(LegacyOutput {
            archetype: opts.variant.clone(),
            item: Item::numeric(id, format!("{n} + {n}?"), None, (n * 2) as f64, 0.0),
            purpose: None,
        })
    }

    fn handler(rng: &mut SeededRng, _d: DifficultyLevel, id: &str) -> Result<Item, GenError> {
        let n = rng.int(1, 5);
        Ok(Item::numeric(id, format!("{n} + {n}?"), None, (n * 2) as f64, 0.0))
    }

    fn registry() -> GeneratorRegistry {
        let module = ModuleGenerator::new("sums", [
            TopicBundle::new("doubles").archetype("double", 1.0, ExerciseKind::Numeric, handler),
        ])
        .unwrap();
        GeneratorRegistry::builder()
            .legacy("flat", flat)
            .module("ctx", module)
            .alias("ar0", "flat")
            .alias("doubles", "ctx")
            .build()
            .unwrap()
    }

    #[test]
    fn legacy_generator_gets_default_archetype() {
        let registry = registry();
        let factory = registry.get("flat").unwrap();
        let mut rng = SeededRng::new("legacy");

        let mut bound = factory(&TopicContext::new("ar0.doubles"));
        let out = bound(&mut rng, DifficultyLevel::Beginner, "id-1").unwrap();
        assert_eq!(out.archetype, "default");

        let mut bound = factory(&TopicContext::new("ar0.doubles").with_variant("doubling"));
        let out = bound(&mut rng, DifficultyLevel::Beginner, "id-2").unwrap();
        assert_eq!(out.archetype, "doubling");
    }

    #[test]
    fn both_conventions_produce_the_same_shape() {
        let registry = registry();
        // Forcing the key keeps the module from drawing before the handler runs,
        // so both generators see the same stream.
        let ctx = TopicContext::new("doubles").with_variant("double").force_key("double");

        let mut legacy = registry.get("flat").unwrap()(&ctx);
        let mut context_first = registry.get("ctx").unwrap()(&ctx);

        let a = legacy(&mut SeededRng::new("same"), DifficultyLevel::Beginner, "id").unwrap();
        let b = context_first(&mut SeededRng::new("same"), DifficultyLevel::Beginner, "id").unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            serde_json::to_value(&b).unwrap()
        );
    }

    #[test]
    fn aliases_map_slugs_to_keys() {
        let registry = registry();
        assert_eq!(registry.gen_key_for("ar0.anything").map(GenKey::as_str), Some("flat"));
        assert_eq!(registry.gen_key_for("doubles").map(GenKey::as_str), Some("ctx"));
        assert_eq!(registry.gen_key_for("xx.doubles").map(GenKey::as_str), Some("ctx"));
        assert_eq!(registry.gen_key_for("nothing"), None);
    }

    #[test]
    fn dangling_alias_fails_build() {
        let err = GeneratorRegistry::builder().alias("py0", "python").build().unwrap_err();
        assert_eq!(err.code(), "InvalidConfig");
    }

    #[test]
    fn lookup_trims_key() {
        let registry = registry();
        assert!(registry.contains(" flat "));
        assert!(!registry.contains("missing"));
        let keys: Vec<&str> = registry.keys().map(GenKey::as_str).collect();
        assert_eq!(keys, vec!["ctx", "flat"]);
    }
}
