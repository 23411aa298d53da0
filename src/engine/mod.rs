//! Generation engine: seeded randomness, pool resolution, routing and dispatch.
//!
//! ## Module overview
//!
//! | Module       | Purpose |
//! |--------------|---------|
//! | `rng`        | Seed hashing and the seeded stream every draw goes through |
//! | `models`     | Exercise kinds, exercise/expected halves, `Item`, `GenOut` |
//! | `pool`       | Weighted pool items, metadata pool parsing, filters, soft exclusion |
//! | `context`    | Per-request `TopicContext` and topic metadata |
//! | `slug`       | Topic slug parsing and per-subject `SlugRouter` |
//! | `bundle`     | `TopicBundle`: authored pool plus handlers for one topic |
//! | `module_gen` | `ModuleGenerator`: tier resolution, filters, selection, dispatch |
//! | `registry`   | `GeneratorRegistry`: legacy and context-first generators behind one key |
//! | `generator`  | `generate_exercise` / `Orchestrator`: ids, seeds, output validation |
//! | `helpers`    | Choice options, word banks and number formatting for handlers |
//! | `wire`       | Client, grader and error JSON payloads |
//! | `config`     | `EngineConfig` |
//! | `error`      | `GenError` |
//! | `topics`     | Authored subjects and `default_registry()` |

pub mod bundle;
pub mod config;
pub mod context;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod models;
pub mod module_gen;
pub mod pool;
pub mod registry;
pub mod rng;
pub mod slug;
pub mod topics;
pub mod wire;

pub use bundle::{Handler, TopicBundle};
pub use config::EngineConfig;
pub use context::{HistoryEntry, TopicContext, TopicMeta};
pub use error::GenError;
pub use generator::{generate_exercise, Generated, Orchestrator};
pub use models::{
    ChoiceOption, DifficultyLevel, Exercise, ExerciseBody, ExerciseKind, Expected, GenOut, Item,
    Purpose,
};
pub use module_gen::{ModuleGenerator, PoolTier, ResolvedPool};
pub use pool::{parse_pool, PoolItem};
pub use registry::{GenKey, GeneratorRegistry, LegacyOptions, LegacyOutput, RegistryBuilder};
pub use rng::{hash_seed, SeededRng, Weighted};
pub use slug::{parse_topic_slug, Route, SlugRouter, TopicSlug};
pub use topics::default_registry;
