//! # practice_gen
//!
//! A deterministic, seedable generator of practice items for learning apps.
//!
//! Each request names a generator key and a topic slug (`"py0.print"`,
//! `"ht0.hc_greetings"`). The engine picks an archetype from a weighted pool
//! and renders it into an exercise the learner sees plus the expected answer
//! the grader checks.
//!
//! ## How it works
//!
//! 1. Build a [`TopicContext`] for the slug, optionally with a salt, a
//!    metadata pool, kind/purpose preferences and recently seen keys.
//! 2. Call [`generate_exercise`] (or [`Orchestrator::generate`]). With a salt
//!    the id and seed are pure functions of `genKey|slug|variant|salt`, so
//!    the same request always yields the same item.
//! 3. The registry finds the factory for the key; routers map the slug to a
//!    module, which resolves the pool (metadata, authored, then a uniform
//!    mixed pool), filters it, softly excludes seen keys and draws.
//! 4. The returned [`Generated`] carries the id, seed, archetype, purpose and
//!    an [`Item`] whose exercise and expected halves always share a kind.
//!
//! ## Quick start
//!
//! ```rust
//! use practice_gen::{default_registry, generate_exercise, DifficultyLevel, TopicContext};
//!
//! let registry = default_registry().unwrap();
//! let ctx = TopicContext::new("py0.print").with_salt("user1|2024-01-01");
//! let item = generate_exercise(&registry, "python", &ctx, DifficultyLevel::Beginner).unwrap();
//!
//! println!("{} ({}): {}", item.id, item.out.archetype, item.out.exercise().prompt);
//! ```

pub mod engine;

pub use engine::{
    default_registry, generate_exercise, parse_topic_slug, DifficultyLevel, EngineConfig,
    Exercise, ExerciseKind, Expected, GenError, GenKey, GenOut, Generated, GeneratorRegistry,
    Item, ModuleGenerator, Orchestrator, PoolItem, Purpose, SeededRng, SlugRouter, TopicBundle,
    TopicContext, TopicMeta,
};
