//! Python subject: printing and variables (`py0`), loops (`py1`).
//!
//! ## Archetypes
//!
//! - **print_basic**: predict the output of `print` on numbers or strings.
//! - **print_sep**: choose the `sep=` argument that produces a given line.
//! - **print_project**: write a short program; graded on its stdout.
//! - **var_trace**: trace a variable through three assignments.
//! - **var_swap**: put the lines of a swap-through-temp in order.
//! - **var_types**: pick every literal that is an `int`.
//! - **loop_count**: count the iterations of a `range` loop.
//! - **loop_output**: predict the output of a small `for` loop.

use crate::engine::{
    bundle::TopicBundle,
    error::GenError,
    helpers::{by_difficulty, choice_options, multi_choice_options},
    models::{DifficultyLevel, ExerciseKind, Item, Purpose},
    module_gen::ModuleGenerator,
    pool::PoolItem,
    rng::SeededRng,
};

const WORDS: [&str; 6] = ["spam", "eggs", "ham", "hello", "world", "py"];
const SEPARATORS: [&str; 5] = ["-", "+", "*", "/", ":"];
const NAMES: [&str; 5] = ["Ada", "Guido", "Grace", "Linus", "Alan"];

/// `py0`: printing and variables.
pub fn basics_module() -> Result<ModuleGenerator, GenError> {
    ModuleGenerator::new("python_basics", [print_topic(), variables_topic()])
}

/// `py1`: loops.
pub fn loops_module() -> Result<ModuleGenerator, GenError> {
    ModuleGenerator::new("python_loops", [loops_topic()])
}

fn print_topic() -> TopicBundle {
    TopicBundle::new("print")
        .archetype("print_basic", 3.0, ExerciseKind::SingleChoice, print_basic)
        .archetype("print_sep", 2.0, ExerciseKind::FillBlankChoice, print_sep)
        .archetype_item(
            PoolItem::new("print_project", 1.0)
                .with_kind(ExerciseKind::CodeInput)
                .with_purpose(Purpose::Project),
            print_project,
        )
}

fn variables_topic() -> TopicBundle {
    TopicBundle::new("variables")
        .archetype("var_trace", 2.0, ExerciseKind::TextInput, var_trace)
        .archetype("var_swap", 1.0, ExerciseKind::DragReorder, var_swap)
        .archetype("var_types", 1.0, ExerciseKind::MultiChoice, var_types)
}

fn loops_topic() -> TopicBundle {
    TopicBundle::new("for_loops")
        .archetype("loop_count", 2.0, ExerciseKind::Numeric, loop_count)
        .archetype("loop_output", 2.0, ExerciseKind::SingleChoice, loop_output)
}

// ---------------------------------------------------------------------------
// print
// ---------------------------------------------------------------------------

fn print_basic(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let max = by_difficulty(difficulty, 9, 20, 99);
    let a = rng.int(1, max);
    let b = rng.int(1, max);

    // Adding numbers versus concatenating their string forms.
    let (code, correct, distractors) = if rng.chance(0.5) {
        (
            format!("print({a} + {b})"),
            (a + b).to_string(),
            vec![format!("{a}{b}"), format!("{a} + {b}"), (a * b).to_string()],
        )
    } else {
        (
            format!("print(\"{a}\" + \"{b}\")"),
            format!("{a}{b}"),
            vec![(a + b).to_string(), format!("{a} {b}"), format!("\"{a}{b}\"")],
        )
    };

    let (options, correct_id) = choice_options(rng, &correct, &distractors);
    Ok(Item::single_choice(id, format!("What does `{code}` print?"), options, correct_id))
}

fn print_sep(rng: &mut SeededRng, _difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let first = *rng.pick(&WORDS)?;
    let second = *rng.pick(&WORDS)?;
    let sep = *rng.pick(&SEPARATORS)?;

    let choices: Vec<String> = rng.shuffle(&SEPARATORS).iter().map(|s| format!("\"{s}\"")).collect();
    Ok(Item::fill_blank_choice(
        id,
        format!("Fill the blank so the line prints `{first}{sep}{second}`."),
        format!("print(\"{first}\", \"{second}\", sep=___)"),
        choices,
        format!("\"{sep}\""),
    ))
}

fn print_project(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let name = *rng.pick(&NAMES)?;
    let times = rng.int(2, by_difficulty(difficulty, 3, 5, 8));
    let stdout: String = (0..times).map(|_| format!("Hello, {name}!\n")).collect();

    Ok(Item::code_input(
        id,
        format!("Write a program that prints `Hello, {name}!` {times} times, one per line."),
        "python",
        "# your code here\n",
        stdout,
    ))
}

// ---------------------------------------------------------------------------
// variables
// ---------------------------------------------------------------------------

fn var_trace(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let max = by_difficulty(difficulty, 5, 10, 20);
    let start = rng.int(1, max);
    let add = rng.int(1, max);
    let mul = rng.int(2, by_difficulty(difficulty, 2, 3, 5));
    let value = (start + add) * mul;

    let code = format!("x = {start}\nx = x + {add}\nx = x * {mul}");
    Ok(Item::text_input(
        id,
        format!("What is the value of `x` after this runs?\n\n```python\n{code}\n```"),
        Some("e.g. 42".into()),
        vec![value.to_string()],
        true,
    ))
}

fn var_swap(rng: &mut SeededRng, _difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let a = rng.int(1, 9);
    let b = rng.sample_until(|r| r.int(1, 9), |b| *b != a, || if a == 9 { 1 } else { a + 1 });

    let order: Vec<String> = [
        format!("a = {a}"),
        format!("b = {b}"),
        "tmp = a".to_string(),
        "a = b".to_string(),
        "b = tmp".to_string(),
    ]
    .into();
    let shown = rng.sample_until(
        |r| r.shuffle(&order),
        |shown| *shown != order,
        || order.iter().rev().cloned().collect(),
    );

    Ok(Item::drag_reorder(
        id,
        format!("Order the lines so that `a` ends up as {b} and `b` as {a}."),
        shown,
        order,
    ))
}

fn var_types(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let max = by_difficulty(difficulty, 9, 99, 999);
    let n = rng.int(1, max);
    let m = rng.int(1, max);

    let ints = vec![n.to_string(), format!("-{m}")];
    let others = vec![
        format!("{n}.0"),
        format!("\"{m}\""),
        "None".to_string(),
        format!("[{n}]"),
    ];
    let (options, correct) = multi_choice_options(rng, &ints, &others);
    Ok(Item::multi_choice(id, "Which of these literals are of type `int`?", options, correct))
}

// ---------------------------------------------------------------------------
// for_loops
// ---------------------------------------------------------------------------

fn range_len(start: i64, stop: i64, step: i64) -> i64 {
    if step <= 0 || stop <= start {
        return 0;
    }
    (stop - start + step - 1) / step
}

fn loop_count(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let (start, stop, step) = match difficulty {
        DifficultyLevel::Beginner     => (0, rng.int(3, 10), 1),
        DifficultyLevel::Intermediate => (rng.int(0, 5), rng.int(8, 20), 1),
        DifficultyLevel::Advanced     => (rng.int(0, 5), rng.int(12, 40), rng.int(2, 5)),
    };
    let range = match (start, step) {
        (0, 1) => format!("range({stop})"),
        (_, 1) => format!("range({start}, {stop})"),
        _      => format!("range({start}, {stop}, {step})"),
    };

    Ok(Item::numeric(
        id,
        format!("How many lines does this print?\n\n```python\nfor i in {range}:\n    print(i)\n```"),
        None,
        range_len(start, stop, step) as f64,
        0.0,
    ))
}

fn spaced(values: impl Iterator<Item = i64>) -> String {
    values.map(|i| i.to_string()).collect::<Vec<_>>().join(" ")
}

fn loop_output(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let n = rng.int(3, by_difficulty(difficulty, 4, 5, 6));
    let correct = spaced(0..n);
    let distractors = vec![spaced(1..=n), spaced(0..=n), spaced(1..n)];
    let (options, correct_id) = choice_options(rng, &correct, &distractors);

    Ok(Item::single_choice(
        id,
        format!("What does this print?\n\n```python\nfor i in range({n}):\n    print(i, end=\" \")\n```"),
        options,
        correct_id,
    ))
}
