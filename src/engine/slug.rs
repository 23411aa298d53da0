//! Topic slug parsing and per-subject routing.
//!
//! Slugs look like `"py0.print"`: an optional module prefix and a topic base
//! name. A [`SlugRouter`] maps a slug to the module that owns it, trying the
//! explicit prefix table first and then each module's topic set. Slugs that
//! match neither are routed to a generator that always fails.

use std::collections::BTreeMap;

use crate::engine::{
    context::TopicContext,
    error::GenError,
    models::{DifficultyLevel, GenOut},
    module_gen::ModuleGenerator,
    rng::SeededRng,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicSlug<'a> {
    pub prefix: Option<&'a str>,
    pub base: &'a str,
}

/// Split a dotted slug. The last segment is the base; the first one is the
/// prefix when there is more than one. Blank segments are ignored.
pub fn parse_topic_slug(raw: &str) -> TopicSlug<'_> {
    let segments: Vec<&str> = raw.split('.').map(str::trim).filter(|s| !s.is_empty()).collect();
    match *segments.as_slice() {
        []                  => TopicSlug { prefix: None, base: "" },
        [base]              => TopicSlug { prefix: None, base },
        [first, .., last]   => TopicSlug { prefix: Some(first), base: last },
    }
}

/// Outcome of routing one slug.
#[derive(Debug, Clone, Copy)]
pub enum Route<'a> {
    Module(&'a ModuleGenerator),
    /// No module owns the slug; generating always fails.
    Unrouted { subject: &'a str },
}

impl Route<'_> {
    pub fn module(&self) -> Option<&ModuleGenerator> {
        match self {
            Route::Module(module) => Some(*module),
            Route::Unrouted { .. } => None,
        }
    }

    pub fn generate(
        &self,
        ctx: &TopicContext,
        rng: &mut SeededRng,
        difficulty: DifficultyLevel,
        id: &str,
    ) -> Result<GenOut, GenError> {
        match self {
            Route::Module(module) => module.generate(ctx, rng, difficulty, id),
            Route::Unrouted { subject } => Err(GenError::UnknownTopic {
                slug: ctx.topic_slug.clone(),
                reason: format!("no module of '{subject}' is registered for this topic"),
            }),
        }
    }
}

/// Routing table for one subject.
#[derive(Debug, Clone)]
pub struct SlugRouter {
    subject: String,
    modules: Vec<ModuleGenerator>,
    prefixes: BTreeMap<String, usize>,
}

impl SlugRouter {
    pub fn new(subject: impl Into<String>) -> Self {
        SlugRouter { subject: subject.into(), modules: Vec::new(), prefixes: BTreeMap::new() }
    }

    /// Mount `module` under the given prefixes. Modules also take part in
    /// base-name fallback, in mount order.
    pub fn mount(mut self, prefixes: &[&str], module: ModuleGenerator) -> Self {
        let index = self.modules.len();
        self.modules.push(module);
        for prefix in prefixes {
            if self.prefixes.insert(prefix.to_string(), index).is_some() {
                tracing::warn!(subject = %self.subject, prefix, "prefix mounted twice, last one wins");
            }
        }
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn route(&self, raw_slug: &str) -> Route<'_> {
        let slug = parse_topic_slug(raw_slug);

        if let Some(&index) = slug.prefix.and_then(|prefix| self.prefixes.get(prefix)) {
            return Route::Module(&self.modules[index]);
        }
        if let Some(module) = self.modules.iter().find(|m| m.has_topic(slug.base)) {
            return Route::Module(module);
        }

        tracing::warn!(subject = %self.subject, slug = raw_slug, "topic slug is not routed");
        Route::Unrouted { subject: &self.subject }
    }
}
