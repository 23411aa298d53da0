use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::Serialize;

use crate::engine::{
    config::EngineConfig,
    context::TopicContext,
    error::GenError,
    models::{DifficultyLevel, GenOut},
    registry::GeneratorRegistry,
    rng::{hash_seed, SeededRng},
    topics::default_registry_with,
};

/// One generated item plus the identifiers needed to replay it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generated {
    pub id: String,
    /// Seed string of the stream the item was drawn from.
    pub seed: String,
    #[serde(flatten)]
    pub out: GenOut,
}

/// `(id, seed)` for a salted request: both are pure functions of
/// `genKey|topicSlug|variant|salt`.
fn stable_identity(gen_key: &str, slug: &str, variant: &str, salt: &str) -> (String, String) {
    let material = format!("{gen_key}|{slug}|{variant}|{salt}");
    let hi = hash_seed(&material);
    let lo = hash_seed(&format!("{material}#id"));
    (format!("{gen_key}-{hi:08x}{lo:08x}"), material)
}

/// `(id, seed)` for an unsalted request: time plus a random suffix.
fn fresh_identity(gen_key: &str, slug: &str, variant: &str) -> (String, String) {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: u32 = rand::thread_rng().gen();
    let nonce = format!("{millis:x}-{suffix:08x}");
    (format!("{gen_key}-{nonce}"), format!("{gen_key}|{slug}|{variant}|{nonce}"))
}

/// Post-call contract check.
fn validate_output(gen_key: &str, ctx: &TopicContext, out: &GenOut) -> Result<(), GenError> {
    let invalid = |reason: String| GenError::InvalidOutput {
        gen_key: gen_key.to_string(),
        slug: ctx.topic_slug.clone(),
        reason,
    };
    if out.archetype.trim().is_empty() {
        return Err(invalid("archetype is empty".into()));
    }
    if out.exercise().kind() != out.expected().kind() {
        return Err(invalid(format!(
            "exercise kind '{}' does not match expected kind '{}'",
            out.exercise().kind(),
            out.expected().kind()
        )));
    }
    if out.exercise().prompt.trim().is_empty() {
        return Err(invalid("exercise prompt is empty".into()));
    }
    Ok(())
}

fn run(
    registry: &GeneratorRegistry,
    config: &EngineConfig,
    gen_key: &str,
    ctx: &TopicContext,
    difficulty: DifficultyLevel,
) -> Result<Generated, GenError> {
    let gen_key = gen_key.trim();
    if gen_key.is_empty() {
        return Err(GenError::InvalidRequest("generator key is empty".into()));
    }
    let slug = ctx.topic_slug.trim();
    if slug.is_empty() {
        return Err(GenError::InvalidRequest("topic slug is empty".into()));
    }

    let factory = registry
        .get(gen_key)
        .ok_or_else(|| GenError::UnknownGenerator { gen_key: gen_key.to_string() })?;

    let variant = ctx.variant.as_deref().unwrap_or(&config.mixed_variant_label);
    let (id, seed) = match ctx.effective_salt() {
        Some(salt) => stable_identity(gen_key, slug, variant, salt),
        None => fresh_identity(gen_key, slug, variant),
    };

    let mut rng = match &ctx.rng {
        Some(injected) => injected.clone(),
        None => SeededRng::new(seed),
    };
    tracing::debug!(gen_key, slug, %id, seed = rng.seed(), "generating");

    let mut generate = factory(ctx);
    let out = generate(&mut rng, difficulty, &id)?;
    validate_output(gen_key, ctx, &out)?;

    tracing::debug!(gen_key, %id, archetype = %out.archetype, kind = %out.kind(), "generated");
    Ok(Generated { id, seed: rng.seed().to_string(), out })
}

/// Generate one item through `registry` with the default configuration.
pub fn generate_exercise(
    registry: &GeneratorRegistry,
    gen_key: &str,
    ctx: &TopicContext,
    difficulty: DifficultyLevel,
) -> Result<Generated, GenError> {
    run(registry, &EngineConfig::default(), gen_key, ctx, difficulty)
}

/// Entry point owning a registry and configuration.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: Arc<GeneratorRegistry>,
    config: EngineConfig,
}

impl Orchestrator {
    pub fn new(registry: Arc<GeneratorRegistry>) -> Self {
        Orchestrator { registry, config: EngineConfig::default() }
    }

    /// Use `config` for difficulty and seeds. `registry` keeps the legacy
    /// label it was built with; see [`Orchestrator::from_config`].
    pub fn with_config(registry: Arc<GeneratorRegistry>, config: EngineConfig) -> Result<Self, GenError> {
        config.validate()?;
        Ok(Orchestrator { registry, config })
    }

    /// Orchestrator over the bundled content, with the registry built from
    /// the same `config`.
    pub fn from_config(config: EngineConfig) -> Result<Self, GenError> {
        config.validate()?;
        let registry = default_registry_with(&config)?;
        Ok(Orchestrator { registry: Arc::new(registry), config })
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate at the configured default difficulty.
    pub fn generate(&self, gen_key: &str, ctx: &TopicContext) -> Result<Generated, GenError> {
        self.generate_at(gen_key, ctx, self.config.default_difficulty)
    }

    pub fn generate_at(
        &self,
        gen_key: &str,
        ctx: &TopicContext,
        difficulty: DifficultyLevel,
    ) -> Result<Generated, GenError> {
        run(&self.registry, &self.config, gen_key, ctx, difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        bundle::TopicBundle,
        models::{ExerciseKind, Item},
        module_gen::ModuleGenerator,
        registry::{BoundGenerator, GeneratorRegistry},
    };

    fn pick_number(rng: &mut SeededRng, _d: DifficultyLevel, id: &str) -> Result<Item, GenError> {
        let n = rng.int(1, 1_000_000);
        Ok(Item::numeric(id, format!("Type {n}"), None, n as f64, 0.0))
    }

    fn registry() -> GeneratorRegistry {
        let module = ModuleGenerator::new("m", [
            TopicBundle::new("numbers")
                .archetype("a", 1.0, ExerciseKind::Numeric, pick_number)
                .archetype("b", 1.0, ExerciseKind::Numeric, pick_number),
        ])
        .unwrap();
        GeneratorRegistry::builder()
            .module("nums", module)
            .context_first("blank", |_ctx: &TopicContext| -> BoundGenerator {
                Box::new(|_rng: &mut SeededRng, _d: DifficultyLevel, id: &str| -> Result<GenOut, GenError> {
                    Ok(GenOut::new("", Item::numeric(id, "x", None, 1.0, 0.0), Default::default()))
                })
            })
            .build()
            .unwrap()
    }

    #[test]
    fn salted_requests_are_reproducible() {
        let registry = registry();
        let ctx = TopicContext::new("m0.numbers").with_salt("user1|2024-01-01");
        let a = generate_exercise(&registry, "nums", &ctx, DifficultyLevel::Beginner).unwrap();
        let b = generate_exercise(&registry, "nums", &ctx, DifficultyLevel::Beginner).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.seed, "nums|m0.numbers|mixed|user1|2024-01-01");
        assert!(a.id.starts_with("nums-"));
        assert_eq!(a.id.len(), "nums-".len() + 16);
    }

    #[test]
    fn variant_and_salt_change_the_identity() {
        let registry = registry();
        let base = TopicContext::new("numbers").with_salt("s1");
        let a = generate_exercise(&registry, "nums", &base, DifficultyLevel::Beginner).unwrap();
        let b = generate_exercise(&registry, "nums", &base.clone().with_variant("v"), DifficultyLevel::Beginner)
            .unwrap();
        let c = generate_exercise(&registry, "nums", &base.clone().with_salt("s2"), DifficultyLevel::Beginner)
            .unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn unsalted_requests_are_fresh() {
        let registry = registry();
        let ctx = TopicContext::new("numbers").with_salt("   ");
        let ids: std::collections::BTreeSet<String> = (0..20)
            .map(|_| generate_exercise(&registry, "nums", &ctx, DifficultyLevel::Beginner).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn injected_rng_is_preferred() {
        let registry = registry();
        let parent = SeededRng::new("composite");
        let ctx = TopicContext::new("numbers").with_salt("s").with_rng(parent.fork("step-1"));
        let a = generate_exercise(&registry, "nums", &ctx, DifficultyLevel::Beginner).unwrap();
        let b = generate_exercise(&registry, "nums", &ctx, DifficultyLevel::Beginner).unwrap();
        assert_eq!(a.seed, "composite::step-1");
        assert_eq!(a.out, b.out);
    }

    #[test]
    fn request_validation() {
        let registry = registry();
        let ctx = TopicContext::new("numbers");
        let err = generate_exercise(&registry, " ", &ctx, DifficultyLevel::Beginner).unwrap_err();
        assert_eq!(err.code(), "InvalidRequest");
        let err = generate_exercise(&registry, "nums", &TopicContext::new(""), DifficultyLevel::Beginner)
            .unwrap_err();
        assert_eq!(err.code(), "InvalidRequest");
        let err = generate_exercise(&registry, "nope", &ctx, DifficultyLevel::Beginner).unwrap_err();
        assert_eq!(err, GenError::UnknownGenerator { gen_key: "nope".into() });
    }

    #[test]
    fn malformed_output_is_rejected() {
        let registry = registry();
        let ctx = TopicContext::new("anything").with_salt("s");
        let err = generate_exercise(&registry, "blank", &ctx, DifficultyLevel::Beginner).unwrap_err();
        assert_eq!(err.code(), "InvalidOutput");
        assert_eq!(err.details()["details"]["genKey"], "blank");
    }

    #[test]
    fn orchestrator_uses_config() {
        let config = EngineConfig { mixed_variant_label: "any".into(), ..EngineConfig::default() };
        let orchestrator = Orchestrator::with_config(Arc::new(registry()), config).unwrap();
        let ctx = TopicContext::new("numbers").with_salt("s");
        let out = orchestrator.generate("nums", &ctx).unwrap();
        assert_eq!(out.seed, "nums|numbers|any|s");

        let bad = EngineConfig { legacy_archetype_label: String::new(), ..EngineConfig::default() };
        assert!(Orchestrator::with_config(Arc::new(registry()), bad).is_err());
    }
}
