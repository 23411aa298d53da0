//! Linear algebra subject (`la0`): dot products, vectors, 2x2 and 3x3 matrices.
//!
//! Vectors and matrices are drawn on an integer grid. Draws that would make
//! an exercise degenerate (zero vectors, singular matrices) are rejected with
//! [`SeededRng::sample_until`], which falls back to a fixed well-formed value
//! rather than looping.

use crate::engine::{
    bundle::TopicBundle,
    error::GenError,
    helpers::{by_difficulty, fmt_num, matrix_str, vec_str},
    models::{DifficultyLevel, ExerciseKind, Item},
    module_gen::ModuleGenerator,
    rng::SeededRng,
};

const DRAG_TOLERANCE: f64 = 0.25;
const DOT_TOLERANCE: f64 = 0.5;

pub fn module() -> Result<ModuleGenerator, GenError> {
    ModuleGenerator::new("linear_algebra_0", [dot_topic(), vectors_topic(), matrix_topic()])
}

fn dot_topic() -> TopicBundle {
    TopicBundle::new("dot")
        .archetype("dot_compute", 2.0, ExerciseKind::Numeric, dot_compute)
        .archetype("dot_drag", 1.0, ExerciseKind::VectorDragDot, dot_drag)
}

fn vectors_topic() -> TopicBundle {
    TopicBundle::new("vectors")
        .archetype("vec_add", 2.0, ExerciseKind::VectorDragTarget, vec_add)
        .archetype("vec_scale", 1.0, ExerciseKind::VectorDragTarget, vec_scale)
}

fn matrix_topic() -> TopicBundle {
    TopicBundle::new("matrix")
        .archetype("matrix_add", 2.0, ExerciseKind::MatrixInput, matrix_add)
        .archetype("matrix_det", 2.0, ExerciseKind::Numeric, matrix_det)
        .archetype("matrix_inverse", 1.0, ExerciseKind::MatrixInput, matrix_inverse)
        // Only served when a metadata pool asks for it.
        .handler("matrix_transpose", matrix_transpose)
}

// ---------------------------------------------------------------------------
// Grid draws
// ---------------------------------------------------------------------------

fn grid_bound(difficulty: DifficultyLevel) -> i64 {
    by_difficulty(difficulty, 3, 5, 9)
}

/// Normalise `-0.0` so answers serialise as `0`.
fn clean(x: f64) -> f64 {
    x + 0.0
}

fn draw_vector(rng: &mut SeededRng, dims: usize, bound: i64) -> Vec<f64> {
    (0..dims).map(|_| rng.int(-bound, bound) as f64).collect()
}

fn nonzero_vector(rng: &mut SeededRng, dims: usize, bound: i64) -> Vec<f64> {
    rng.sample_until(
        |r| draw_vector(r, dims, bound),
        |v| v.iter().any(|x| *x != 0.0),
        || vec![1.0; dims],
    )
}

fn draw_matrix(rng: &mut SeededRng, n: usize, bound: i64) -> Vec<Vec<f64>> {
    (0..n).map(|_| draw_vector(rng, n, bound)).collect()
}

fn dot(u: &[f64], v: &[f64]) -> f64 {
    u.iter().zip(v).map(|(a, b)| a * b).sum()
}

fn det(m: &[Vec<f64>]) -> f64 {
    match m.len() {
        2 => m[0][0] * m[1][1] - m[0][1] * m[1][0],
        3 => {
            m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
                - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
                + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
        }
        _ => 0.0,
    }
}

fn identity_scaled(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { (i + 2) as f64 } else { 0.0 }).collect())
        .collect()
}

// ---------------------------------------------------------------------------
// dot
// ---------------------------------------------------------------------------

fn dot_compute(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let dims = by_difficulty(difficulty, 2, 2, 3);
    let bound = grid_bound(difficulty);
    let u = nonzero_vector(rng, dims, bound);
    let v = nonzero_vector(rng, dims, bound);

    Ok(Item::numeric(
        id,
        format!("Compute u · v for u = {} and v = {}.", vec_str(&u), vec_str(&v)),
        None,
        clean(dot(&u, &v)),
        0.0,
    ))
}

fn dot_drag(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let bound = grid_bound(difficulty);
    let fixed = nonzero_vector(rng, 2, bound);
    let hidden = nonzero_vector(rng, 2, bound);
    let target = clean(dot(&fixed, &hidden));

    Ok(Item::vector_drag_dot(
        id,
        format!(
            "Drag v so that u · v = {} where u = {}.",
            fmt_num(target),
            vec_str(&fixed)
        ),
        fixed,
        bound as f64,
        target,
        DOT_TOLERANCE,
    ))
}

// ---------------------------------------------------------------------------
// vectors
// ---------------------------------------------------------------------------

fn vec_add(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let bound = grid_bound(difficulty);
    let u = nonzero_vector(rng, 2, bound);
    let v = nonzero_vector(rng, 2, bound);
    let target: Vec<f64> = u.iter().zip(&v).map(|(a, b)| clean(a + b)).collect();

    Ok(Item::vector_drag_target(
        id,
        format!("Drag the arrow to u + v for u = {} and v = {}.", vec_str(&u), vec_str(&v)),
        vec![0.0, 0.0],
        (2 * bound) as f64,
        target,
        DRAG_TOLERANCE,
    ))
}

fn vec_scale(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let bound = grid_bound(difficulty);
    let u = nonzero_vector(rng, 2, bound);
    let k = *rng.pick(&[-2.0, -1.0, 2.0, 3.0])?;
    let target: Vec<f64> = u.iter().map(|x| clean(k * x)).collect();

    Ok(Item::vector_drag_target(
        id,
        format!("Drag the arrow to {}·u for u = {}.", fmt_num(k), vec_str(&u)),
        vec![0.0, 0.0],
        (3 * bound) as f64,
        target,
        DRAG_TOLERANCE,
    ))
}

// ---------------------------------------------------------------------------
// matrix
// ---------------------------------------------------------------------------

fn matrix_add(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let n = by_difficulty(difficulty, 2, 2, 3);
    let bound = grid_bound(difficulty);
    let a = draw_matrix(rng, n, bound);
    let b = draw_matrix(rng, n, bound);
    let sum: Vec<Vec<f64>> = a
        .iter()
        .zip(&b)
        .map(|(ra, rb)| ra.iter().zip(rb).map(|(x, y)| clean(x + y)).collect())
        .collect();

    Ok(Item::matrix_input(
        id,
        format!("Compute A + B for A = {} and B = {}.", matrix_str(&a), matrix_str(&b)),
        sum,
        0.0,
    ))
}

fn matrix_det(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let n = by_difficulty(difficulty, 2, 2, 3);
    let bound = by_difficulty(difficulty, 3, 5, 4);
    let m = rng.sample_until(
        |r| draw_matrix(r, n, bound),
        |m| det(m) != 0.0,
        || identity_scaled(n),
    );

    Ok(Item::numeric(
        id,
        format!("Compute det(A) for A = {}.", matrix_str(&m)),
        None,
        clean(det(&m)),
        0.0,
    ))
}

/// 2x2 with determinant ±1, so the inverse stays on the integer grid.
fn matrix_inverse(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let bound = by_difficulty(difficulty, 2, 3, 4);
    let m = rng.sample_until(
        |r| draw_matrix(r, 2, bound),
        |m| det(m).abs() == 1.0,
        || vec![vec![2.0, 1.0], vec![1.0, 1.0]],
    );
    let d = det(&m);
    let inverse = vec![
        vec![clean(m[1][1] / d), clean(-m[0][1] / d)],
        vec![clean(-m[1][0] / d), clean(m[0][0] / d)],
    ];

    Ok(Item::matrix_input(
        id,
        format!("Find A⁻¹ for A = {}.", matrix_str(&m)),
        inverse,
        1e-9,
    ))
}

fn matrix_transpose(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let n = by_difficulty(difficulty, 2, 3, 3);
    let m = draw_matrix(rng, n, grid_bound(difficulty));
    let transposed: Vec<Vec<f64>> = (0..n).map(|j| (0..n).map(|i| m[i][j]).collect()).collect();

    Ok(Item::matrix_input(id, format!("Write Aᵀ for A = {}.", matrix_str(&m)), transposed, 0.0))
}
