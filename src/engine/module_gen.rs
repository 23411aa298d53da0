//! Module generator: the pool resolution pipeline.
//!
//! A module merges several [`TopicBundle`]s and, for one request, runs:
//!
//! 1. **Tier resolution**: metadata pool, then the topic's authored pool,
//!    then a uniform pool over every dispatchable key. Each tier is first
//!    restricted to keys that have a handler; the first non-empty tier wins.
//! 2. **Filters**: kind, then purpose. If the metadata tier filters down to
//!    nothing while both the metadata and authored pools are non-empty, the
//!    filters are retried once against the authored pool.
//! 3. **Soft uniqueness**: previously seen keys are removed unless that
//!    empties the pool, in which case repeats are allowed.
//! 4. **Selection**: a forced key wins if it survived the filters,
//!    otherwise a weighted draw.
//! 5. **Dispatch**: the chosen handler runs and its item is tagged with the
//!    archetype key and purpose.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::{
    bundle::TopicBundle,
    context::TopicContext,
    error::GenError,
    models::{DifficultyLevel, GenOut, Purpose},
    pool::{apply_filters, exclude_soft, restrict_to_keys, safe_mixed_pool, PoolItem},
    rng::SeededRng,
    slug::parse_topic_slug,
};

/// Which tier supplied the pool a request was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolTier {
    Meta,
    Fallback,
    SafeMixed,
}

/// Result of pool resolution for one request, before any draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPool {
    /// Base name of the topic that was resolved.
    pub topic: String,
    pub tier: PoolTier,
    pub default_purpose: Purpose,
    /// After kind and purpose filters, before exclusion.
    pub filtered: Vec<PoolItem>,
    /// What the weighted draw runs over.
    pub candidates: Vec<PoolItem>,
    pub exclusion_reverted: bool,
}

/// First non-empty candidate, in priority order.
fn first_non_empty<const N: usize>(
    tiers: [(PoolTier, Vec<PoolItem>); N],
) -> Option<(PoolTier, Vec<PoolItem>)> {
    tiers.into_iter().find(|(_, pool)| !pool.is_empty())
}

#[derive(Debug, Clone)]
pub struct ModuleGenerator {
    name: String,
    topics: BTreeMap<String, TopicBundle>,
}

impl ModuleGenerator {
    /// Merge `bundles` into one module. Every bundle is validated, and two
    /// bundles may not share a slug.
    pub fn new(
        name: impl Into<String>,
        bundles: impl IntoIterator<Item = TopicBundle>,
    ) -> Result<Self, GenError> {
        let name = name.into();
        let mut topics = BTreeMap::new();
        for bundle in bundles {
            bundle.validate()?;
            let slug = bundle.slug().to_string();
            if topics.insert(slug.clone(), bundle).is_some() {
                return Err(GenError::InvalidBundle {
                    topic: slug,
                    reason: format!("registered twice in module '{name}'"),
                });
            }
        }
        Ok(ModuleGenerator { name, topics })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topic(&self, base: &str) -> Option<&TopicBundle> {
        self.topics.get(base)
    }

    pub fn has_topic(&self, base: &str) -> bool {
        self.topics.contains_key(base)
    }

    pub fn topic_names(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    fn lookup(&self, raw_slug: &str) -> Result<&TopicBundle, GenError> {
        let slug = parse_topic_slug(raw_slug);
        self.topics.get(slug.base).ok_or_else(|| GenError::UnknownTopic {
            slug: raw_slug.to_string(),
            reason: format!("module '{}' has no topic '{}'", self.name, slug.base),
        })
    }

    /// Run tier resolution, filters and soft uniqueness for `ctx`.
    pub fn resolve_pool(&self, ctx: &TopicContext) -> Result<ResolvedPool, GenError> {
        let topic = self.lookup(&ctx.topic_slug)?;
        let valid_keys = topic.valid_keys();
        let default_purpose = topic.purpose();

        let meta_pool = restrict_to_keys(&ctx.meta.pool, &valid_keys);
        let fallback_pool = restrict_to_keys(topic.pool(), &valid_keys);

        let (mut tier, base_pool) = first_non_empty([
            (PoolTier::Meta, meta_pool.clone()),
            (PoolTier::Fallback, fallback_pool.clone()),
            (PoolTier::SafeMixed, safe_mixed_pool(&valid_keys)),
        ])
        .ok_or_else(|| GenError::EmptyPool { slug: ctx.topic_slug.clone() })?;

        let filter = |pool: &[PoolItem]| {
            apply_filters(pool, ctx.prefer_kind, ctx.prefer_purpose, default_purpose)
        };

        let mut filtered = filter(&base_pool);
        if filtered.is_empty() && !meta_pool.is_empty() && !fallback_pool.is_empty() {
            tracing::debug!(
                slug = %ctx.topic_slug,
                "metadata pool filtered to nothing, retrying against authored pool"
            );
            filtered = filter(&fallback_pool);
            tier = PoolTier::Fallback;
        }
        if filtered.is_empty() {
            return Err(GenError::NoQuestionsAvailable {
                slug: ctx.topic_slug.clone(),
                prefer_kind: ctx.prefer_kind.map(|k| k.to_string()),
                prefer_purpose: ctx.prefer_purpose.map(|p| p.to_string()),
            });
        }

        let exclusion = exclude_soft(&filtered, &ctx.excluded_set());
        if exclusion.reverted {
            tracing::debug!(slug = %ctx.topic_slug, "every candidate already seen, allowing repeats");
        }
        tracing::debug!(
            slug = %ctx.topic_slug,
            ?tier,
            candidates = exclusion.pool.len(),
            "pool resolved"
        );

        Ok(ResolvedPool {
            topic: topic.slug().to_string(),
            tier,
            default_purpose,
            filtered,
            candidates: exclusion.pool,
            exclusion_reverted: exclusion.reverted,
        })
    }

    /// Pick the archetype for a resolved pool.
    ///
    /// A forced key is honoured only if it is in the filtered pool, so a
    /// project-only key cannot be forced into a quiz run. It bypasses soft
    /// exclusion and does not consume randomness.
    pub fn choose<'p>(
        &self,
        resolved: &'p ResolvedPool,
        forced: Option<&str>,
        rng: &mut SeededRng,
    ) -> Result<&'p PoolItem, GenError> {
        if let Some(key) = forced {
            match resolved.filtered.iter().find(|item| item.key == key) {
                Some(item) => {
                    tracing::debug!(key, "using forced archetype");
                    return Ok(item);
                }
                None => tracing::debug!(key, "forced archetype not in filtered pool, ignoring"),
            }
        }
        rng.weighted_by(&resolved.candidates, |item| item.weight)
    }

    /// Resolve, select and dispatch one item.
    pub fn generate(
        &self,
        ctx: &TopicContext,
        rng: &mut SeededRng,
        difficulty: DifficultyLevel,
        id: &str,
    ) -> Result<GenOut, GenError> {
        let resolved = self.resolve_pool(ctx)?;
        let chosen = self.choose(&resolved, ctx.forced_key(), rng)?;

        let topic = self.lookup(&ctx.topic_slug)?;
        let handler = topic.handler_for(&chosen.key).ok_or_else(|| GenError::MissingHandler {
            topic: topic.slug().to_string(),
            key: chosen.key.clone(),
        })?;

        let item = handler(rng, difficulty, id)?;
        Ok(GenOut::new(
            chosen.key.clone(),
            item,
            chosen.effective_purpose(resolved.default_purpose),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        context::HistoryEntry,
        models::{ExerciseKind, Item},
    };
    use pretty_assertions::assert_eq;

    fn choice(_rng: &mut SeededRng, _d: DifficultyLevel, id: &str) -> Result<Item, GenError> {
        Ok(Item::single_choice(id, "Pick", Vec::new(), "a"))
    }

    fn number(rng: &mut SeededRng, _d: DifficultyLevel, id: &str) -> Result<Item, GenError> {
        Ok(Item::numeric(id, "Count", None, rng.int(1, 9) as f64, 0.0))
    }

    fn code(_rng: &mut SeededRng, _d: DifficultyLevel, id: &str) -> Result<Item, GenError> {
        Ok(Item::code_input(id, "Write it", "python", "", "hi\n"))
    }

    /// Three quiz archetypes in the default pool, one project archetype,
    /// and one handler that only the metadata pool can reach.
    fn module() -> ModuleGenerator {
        let bundle = TopicBundle::new("print")
            .archetype("basic", 3.0, ExerciseKind::SingleChoice, choice)
            .archetype("count", 1.0, ExerciseKind::Numeric, number)
            .archetype("loose", 1.0, ExerciseKind::SingleChoice, choice)
            .archetype_item(
                PoolItem::new("project", 1.0)
                    .with_kind(ExerciseKind::CodeInput)
                    .with_purpose(Purpose::Project),
                code,
            )
            .handler("extra", number);
        let empty_pool = TopicBundle::new("bare").handler("only", number);
        ModuleGenerator::new("py0", [bundle, empty_pool]).unwrap()
    }

    fn keys(pool: &[PoolItem]) -> Vec<&str> {
        pool.iter().map(|i| i.key.as_str()).collect()
    }

    #[test]
    fn unknown_base_is_an_error() {
        let err = module().resolve_pool(&TopicContext::new("py0.loops")).unwrap_err();
        assert_eq!(err.code(), "UnknownTopic");
    }

    #[test]
    fn duplicate_topic_slugs_are_rejected() {
        let a = TopicBundle::new("print").handler("x", number);
        let b = TopicBundle::new("print").handler("y", number);
        assert_eq!(ModuleGenerator::new("m", [a, b]).unwrap_err().code(), "InvalidBundle");
    }

    #[test]
    fn metadata_pool_wins_when_it_has_valid_keys() {
        let mut ctx = TopicContext::new("py0.print");
        ctx.meta.pool = vec![PoolItem::new("extra", 1.0), PoolItem::new("nope", 4.0)];
        let resolved = module().resolve_pool(&ctx).unwrap();
        assert_eq!(resolved.tier, PoolTier::Meta);
        assert_eq!(keys(&resolved.candidates), vec!["extra"]);
    }

    #[test]
    fn metadata_pool_of_unknown_keys_falls_back_to_authored_pool() {
        let mut ctx = TopicContext::new("py0.print");
        ctx.meta.pool = vec![PoolItem::new("nope", 1.0)];
        let resolved = module().resolve_pool(&ctx).unwrap();
        assert_eq!(resolved.tier, PoolTier::Fallback);
        assert_eq!(keys(&resolved.candidates), vec!["basic", "count", "loose", "project"]);
    }

    #[test]
    fn topic_without_pool_uses_safe_mixed_pool() {
        let resolved = module().resolve_pool(&TopicContext::new("bare")).unwrap();
        assert_eq!(resolved.tier, PoolTier::SafeMixed);
        assert_eq!(keys(&resolved.candidates), vec!["only"]);
    }

    #[test]
    fn kind_and_purpose_filters_apply_in_order() {
        let ctx = TopicContext::new("print")
            .prefer_kind(ExerciseKind::SingleChoice)
            .prefer_purpose(Purpose::Quiz);
        let resolved = module().resolve_pool(&ctx).unwrap();
        assert_eq!(keys(&resolved.candidates), vec!["basic", "loose"]);

        let ctx = TopicContext::new("print").prefer_purpose(Purpose::Project);
        let resolved = module().resolve_pool(&ctx).unwrap();
        assert_eq!(keys(&resolved.candidates), vec!["project"]);
    }

    #[test]
    fn filtered_metadata_pool_retries_against_authored_pool() {
        // Metadata pool only has a numeric archetype; asking for single
        // choice empties it, and both pools are non-empty, so the authored
        // pool is filtered instead.
        let mut ctx = TopicContext::new("py0.print").prefer_kind(ExerciseKind::SingleChoice);
        ctx.meta.pool = vec![PoolItem::new("count", 1.0).with_kind(ExerciseKind::Numeric)];
        let resolved = module().resolve_pool(&ctx).unwrap();
        assert_eq!(resolved.tier, PoolTier::Fallback);
        assert_eq!(keys(&resolved.filtered), vec!["basic", "loose"]);
    }

    #[test]
    fn no_retry_when_authored_pool_is_empty() {
        // "bare" has no authored pool, so a metadata pool that filters to
        // nothing is a hard NoQuestionsAvailable, not a safe-pool retry.
        let mut ctx = TopicContext::new("bare").prefer_purpose(Purpose::Project);
        ctx.meta.pool = vec![PoolItem::new("only", 1.0)];
        let err = module().resolve_pool(&ctx).unwrap_err();
        assert_eq!(err.code(), "NoQuestionsAvailable");
    }

    #[test]
    fn nothing_matching_kind_is_no_questions_available() {
        let ctx = TopicContext::new("print").prefer_kind(ExerciseKind::VoiceInput);
        let resolved = module().resolve_pool(&ctx);
        // Every authored item carries a kind, so nothing passes.
        assert_eq!(resolved.unwrap_err().code(), "NoQuestionsAvailable");
    }

    #[test]
    fn exclusion_is_soft() {
        let ctx = TopicContext::new("print")
            .prefer_kind(ExerciseKind::SingleChoice)
            .exclude(["basic"]);
        let resolved = module().resolve_pool(&ctx).unwrap();
        assert_eq!(keys(&resolved.candidates), vec!["loose"]);
        assert!(!resolved.exclusion_reverted);

        let mut ctx = ctx;
        ctx.history.push(HistoryEntry::archetype("loose"));
        let resolved = module().resolve_pool(&ctx).unwrap();
        assert_eq!(keys(&resolved.candidates), vec!["basic", "loose"]);
        assert!(resolved.exclusion_reverted);
    }

    #[test]
    fn forced_key_must_survive_filters() {
        let m = module();
        let mut rng = SeededRng::new("force");

        let ctx = TopicContext::new("print").force_key("count");
        let out = m.generate(&ctx, &mut rng, DifficultyLevel::Beginner, "id-1").unwrap();
        assert_eq!(out.archetype, "count");

        // "project" is filtered out of a quiz run, so forcing it is ignored.
        let ctx = TopicContext::new("print")
            .prefer_purpose(Purpose::Quiz)
            .force_key("project");
        for _ in 0..50 {
            let out = m.generate(&ctx, &mut rng, DifficultyLevel::Beginner, "id-2").unwrap();
            assert_ne!(out.archetype, "project");
        }
    }

    #[test]
    fn output_is_tagged_with_key_and_purpose() {
        let m = module();
        let mut rng = SeededRng::new("tag");
        let ctx = TopicContext::new("print").prefer_purpose(Purpose::Project);
        let out = m.generate(&ctx, &mut rng, DifficultyLevel::Advanced, "id-3").unwrap();
        assert_eq!(out.archetype, "project");
        assert_eq!(out.purpose(), Purpose::Project);
        assert_eq!(out.exercise().id, "id-3");
        assert_eq!(out.exercise().kind(), out.expected().kind());
    }
}
