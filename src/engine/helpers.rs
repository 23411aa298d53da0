//! Shared builder functions for authored handlers.
//!
//! Every handler assembles the same pieces: shuffled choice options with a
//! tracked correct id, word banks, and human-readable numbers, vectors and
//! matrices. These helpers keep that out of the topic files so they focus
//! on content.
//!
//! ## RNG ordering
//!
//! Each helper consumes randomness in a fixed order (one shuffle per call).
//! Reordering helper calls inside a handler changes its seeded output.

use crate::engine::{
    models::{ChoiceOption, DifficultyLevel},
    rng::SeededRng,
};

const OPTION_IDS: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

fn option_id(index: usize) -> String {
    OPTION_IDS
        .get(index)
        .map_or_else(|| format!("o{index}"), |id| id.to_string())
}

/// Pick the value for the current difficulty.
pub fn by_difficulty<T>(difficulty: DifficultyLevel, beginner: T, intermediate: T, advanced: T) -> T {
    match difficulty {
        DifficultyLevel::Beginner     => beginner,
        DifficultyLevel::Intermediate => intermediate,
        DifficultyLevel::Advanced     => advanced,
    }
}

/// Shuffle `correct` in among `distractors` and label them `a`, `b`, ...
///
/// Distractors equal to the correct text (or to each other) are dropped.
/// Returns the options and the id of the correct one.
pub fn choice_options(
    rng: &mut SeededRng,
    correct: &str,
    distractors: &[String],
) -> (Vec<ChoiceOption>, String) {
    let mut texts = vec![correct.to_string()];
    for d in distractors {
        if !texts.contains(d) {
            texts.push(d.clone());
        }
    }
    rng.shuffle_in_place(&mut texts);

    let options: Vec<ChoiceOption> = texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| ChoiceOption { id: option_id(i), text })
        .collect();
    let correct_id = options
        .iter()
        .find(|o| o.text == correct)
        .map(|o| o.id.clone())
        .unwrap_or_default();
    (options, correct_id)
}

/// Like [`choice_options`] with several correct answers. Correct ids come
/// back in display order.
pub fn multi_choice_options(
    rng: &mut SeededRng,
    correct: &[String],
    wrong: &[String],
) -> (Vec<ChoiceOption>, Vec<String>) {
    let mut texts: Vec<(String, bool)> = Vec::new();
    for (text, is_correct) in correct.iter().map(|t| (t, true)).chain(wrong.iter().map(|t| (t, false))) {
        if !texts.iter().any(|(existing, _)| existing == text) {
            texts.push((text.clone(), is_correct));
        }
    }
    rng.shuffle_in_place(&mut texts);

    let mut options = Vec::with_capacity(texts.len());
    let mut correct_ids = Vec::new();
    for (i, (text, is_correct)) in texts.into_iter().enumerate() {
        let id = option_id(i);
        if is_correct {
            correct_ids.push(id.clone());
        }
        options.push(ChoiceOption { id, text });
    }
    (options, correct_ids)
}

/// Answer tokens plus distractors, shuffled.
pub fn word_bank(rng: &mut SeededRng, answer: &[String], distractors: &[String]) -> Vec<String> {
    let bank: Vec<String> = answer.iter().chain(distractors).cloned().collect();
    rng.shuffle(&bank)
}

/// Whitespace-split tokens.
pub fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Integers print without a decimal point; other values with at most two
/// decimals.
pub fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{v:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Format a vector as `(1, -2)`.
pub fn vec_str(v: &[f64]) -> String {
    format!("({})", v.iter().map(|x| fmt_num(*x)).collect::<Vec<_>>().join(", "))
}

/// Format a matrix as `[[1, 2], [3, 4]]`.
pub fn matrix_str(m: &[Vec<f64>]) -> String {
    let rows: Vec<String> = m
        .iter()
        .map(|row| format!("[{}]", row.iter().map(|x| fmt_num(*x)).collect::<Vec<_>>().join(", ")))
        .collect();
    format!("[{}]", rows.join(", "))
}
