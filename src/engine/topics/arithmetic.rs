//! Mental arithmetic, written against the legacy flat-function convention.
//!
//! The variant selects the operation (`add`, `sub`, `mul`). Without one the
//! operation is drawn at random and no archetype is reported, so the
//! registry's default label is used.

use crate::engine::{
    error::GenError,
    helpers::by_difficulty,
    models::{DifficultyLevel, ExerciseKind, Item},
    registry::{LegacyOptions, LegacyOutput},
    rng::SeededRng,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
}

impl Op {
    const ALL: [Op; 3] = [Op::Add, Op::Sub, Op::Mul];

    fn parse(variant: &str) -> Option<Op> {
        match variant.trim() {
            "add" => Some(Op::Add),
            "sub" => Some(Op::Sub),
            "mul" => Some(Op::Mul),
            _     => None,
        }
    }

    fn archetype(self) -> &'static str {
        match self {
            Op::Add => "arith_add",
            Op::Sub => "arith_sub",
            Op::Mul => "arith_mul",
        }
    }

    fn symbol(self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '−',
            Op::Mul => '×',
        }
    }
}

pub fn generate(
    rng: &mut SeededRng,
    difficulty: DifficultyLevel,
    id: &str,
    opts: &LegacyOptions,
) -> Result<LegacyOutput, GenError> {
    if let Some(kind) = opts.prefer_kind.filter(|k| *k != ExerciseKind::Numeric) {
        return Err(GenError::NoQuestionsAvailable {
            slug: opts.topic_slug.clone(),
            prefer_kind: Some(kind.to_string()),
            prefer_purpose: opts.prefer_purpose.map(|p| p.to_string()),
        });
    }

    let requested = opts.variant.as_deref().and_then(Op::parse);
    let op = match requested {
        Some(op) => op,
        None => *rng.pick(&Op::ALL)?,
    };

    let max = match op {
        Op::Mul => by_difficulty(difficulty, 5, 9, 12),
        _       => by_difficulty(difficulty, 10, 50, 500),
    };
    let a = rng.int(1, max);
    let b = rng.int(1, max);
    // Keep subtraction non-negative.
    let (a, b) = if op == Op::Sub && b > a { (b, a) } else { (a, b) };
    let value = match op {
        Op::Add => a + b,
        Op::Sub => a - b,
        Op::Mul => a * b,
    };

    Ok(LegacyOutput {
        archetype: requested.map(|op| op.archetype().to_string()),
        item: Item::numeric(id, format!("{a} {} {b} = ?", op.symbol()), None, value as f64, 0.0),
        purpose: None,
    })
}
