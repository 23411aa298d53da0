//! Authored content and the default registry that serves it.
//!
//! | key              | convention    | slug prefixes | topics                          |
//! |------------------|---------------|---------------|---------------------------------|
//! | `python`         | router        | `py0`, `py1`  | print, variables, for_loops     |
//! | `linear_algebra` | router        | `la0`         | dot, vectors, matrix            |
//! | `haitian_creole` | router        | `ht0`         | hc_greetings                    |
//! | `arithmetic`     | legacy flat   | `ar0`         | arithmetic                      |

pub mod arithmetic;
pub mod haitian_creole;
pub mod linear_algebra;
pub mod python;

use crate::engine::{
    config::EngineConfig,
    error::GenError,
    registry::{GeneratorRegistry, RegistryBuilder},
    slug::SlugRouter,
};

pub const PYTHON: &str = "python";
pub const LINEAR_ALGEBRA: &str = "linear_algebra";
pub const HAITIAN_CREOLE: &str = "haitian_creole";
pub const ARITHMETIC: &str = "arithmetic";

/// Registry with every authored subject, using the default configuration.
pub fn default_registry() -> Result<GeneratorRegistry, GenError> {
    default_registry_with(&EngineConfig::default())
}

pub fn default_registry_with(config: &EngineConfig) -> Result<GeneratorRegistry, GenError> {
    let python = SlugRouter::new(PYTHON)
        .mount(&["py0"], python::basics_module()?)
        .mount(&["py1"], python::loops_module()?);
    let linear_algebra = SlugRouter::new(LINEAR_ALGEBRA).mount(&["la0"], linear_algebra::module()?);
    let haitian_creole = SlugRouter::new(HAITIAN_CREOLE).mount(&["ht0"], haitian_creole::module()?);

    RegistryBuilder::new(config)
        .router(PYTHON, python)
        .router(LINEAR_ALGEBRA, linear_algebra)
        .router(HAITIAN_CREOLE, haitian_creole)
        .legacy(ARITHMETIC, arithmetic::generate)
        .alias("py0", PYTHON)
        .alias("py1", PYTHON)
        .alias("la0", LINEAR_ALGEBRA)
        .alias("dot", LINEAR_ALGEBRA)
        .alias("vectors", LINEAR_ALGEBRA)
        .alias("matrix", LINEAR_ALGEBRA)
        .alias("ht0", HAITIAN_CREOLE)
        .alias("hc_greetings", HAITIAN_CREOLE)
        .alias("ar0", ARITHMETIC)
        .build()
}
