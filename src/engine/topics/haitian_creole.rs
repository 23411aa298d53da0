//! Haitian Creole subject (`ht0`): greetings.
//!
//! Phrases are stored as `(creole, english)` pairs. Sentence-building
//! archetypes pad the word bank with words from unrelated phrases so that
//! no distractor can complete the answer.

use std::collections::BTreeSet;

use crate::engine::{
    bundle::TopicBundle,
    error::GenError,
    helpers::{by_difficulty, multi_choice_options, word_bank, words},
    models::{DifficultyLevel, ExerciseKind, Item},
    module_gen::ModuleGenerator,
    rng::SeededRng,
};

const LOCALE: &str = "ht-HT";

const GREETINGS: [(&str, &str); 6] = [
    ("Bonjou", "Good morning"),
    ("Bonswa", "Good evening"),
    ("Kijan ou ye?", "How are you?"),
    ("Mwen byen, mèsi", "I am fine, thank you"),
    ("Orevwa", "Goodbye"),
    ("N a wè pita", "See you later"),
];

const SENTENCES: [(&str, &str); 4] = [
    ("Bonjou, kijan ou ye?", "Good morning, how are you?"),
    ("Mwen byen, mèsi", "I am fine, thank you"),
    ("N a wè pita", "See you later"),
    ("Kijan ou rele?", "What is your name?"),
];

const OTHER_PHRASES: [(&str, &str); 4] = [
    ("Mwen grangou", "I am hungry"),
    ("Kote lekòl la?", "Where is the school?"),
    ("Li fè cho", "It is hot"),
    ("Mwen renmen diri", "I like rice"),
];

pub fn module() -> Result<ModuleGenerator, GenError> {
    ModuleGenerator::new("haitian_creole_0", [greetings_topic()])
}

fn greetings_topic() -> TopicBundle {
    TopicBundle::new("hc_greetings")
        .archetype("greet_arrange", 2.0, ExerciseKind::WordBankArrange, greet_arrange)
        .archetype("greet_listen", 2.0, ExerciseKind::ListenBuild, greet_listen)
        .archetype("greet_speak", 1.0, ExerciseKind::VoiceInput, greet_speak)
        .archetype("greet_pick", 1.0, ExerciseKind::MultiChoice, greet_pick)
        .archetype("greet_translate", 2.0, ExerciseKind::TextInput, greet_translate)
}

/// Lowercase, punctuation stripped. Used for lenient matching.
fn normalise(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn bare_word(word: &str) -> &str {
    word.trim_end_matches(&['?', ','][..])
}

/// Words from unrelated phrases, never one that appears in `answer`.
fn distractor_words(rng: &mut SeededRng, answer: &[String], count: usize) -> Vec<String> {
    let unique: BTreeSet<String> = OTHER_PHRASES
        .iter()
        .flat_map(|(creole, _)| words(creole))
        .map(|w| bare_word(&w).to_string())
        .filter(|w| !answer.iter().any(|a| bare_word(a).eq_ignore_ascii_case(w)))
        .collect();
    let mut pool: Vec<String> = unique.into_iter().collect();
    rng.shuffle_in_place(&mut pool);
    pool.truncate(count);
    pool
}

fn greet_arrange(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let (creole, english) = *rng.pick(&SENTENCES)?;
    let answer = words(creole);
    let extra = distractor_words(rng, &answer, by_difficulty(difficulty, 1, 2, 3));
    let bank = word_bank(rng, &answer, &extra);

    Ok(Item::word_bank_arrange(
        id,
        format!("Arrange the words to say \"{english}\"."),
        bank,
        answer,
    ))
}

fn greet_listen(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let (creole, _) = *rng.pick(&SENTENCES)?;
    let answer = words(creole);
    let extra = distractor_words(rng, &answer, by_difficulty(difficulty, 1, 2, 3));
    let bank = word_bank(rng, &answer, &extra);

    Ok(Item::listen_build(id, "Listen and build what you hear.", LOCALE, creole, bank, answer))
}

fn greet_speak(rng: &mut SeededRng, _difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let (creole, english) = *rng.pick(&GREETINGS)?;
    let mut accepted = vec![creole.to_string()];
    let lenient = normalise(creole);
    if lenient != creole {
        accepted.push(lenient);
    }

    Ok(Item::voice_input(
        id,
        format!("Say \"{english}\" in Haitian Creole."),
        LOCALE,
        creole,
        accepted,
    ))
}

fn greet_pick(rng: &mut SeededRng, difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let greeting_count = by_difficulty(difficulty, 2, 2, 3);
    let greetings: Vec<String> = rng
        .shuffle(&GREETINGS)
        .into_iter()
        .take(greeting_count)
        .map(|(creole, _)| creole.to_string())
        .collect();
    let others: Vec<String> = rng
        .shuffle(&OTHER_PHRASES)
        .into_iter()
        .take(2)
        .map(|(creole, _)| creole.to_string())
        .collect();

    let (options, correct) = multi_choice_options(rng, &greetings, &others);
    Ok(Item::multi_choice(id, "Which of these are greetings?", options, correct))
}

fn greet_translate(rng: &mut SeededRng, _difficulty: DifficultyLevel, id: &str) -> Result<Item, GenError> {
    let (creole, english) = *rng.pick(&GREETINGS)?;
    let mut accepted = vec![english.to_string()];
    let lenient = normalise(english);
    if !accepted.iter().any(|a| a.eq_ignore_ascii_case(&lenient)) {
        accepted.push(lenient);
    }

    Ok(Item::text_input(
        id,
        format!("Translate \"{creole}\" into English."),
        Some("Type your answer".into()),
        accepted,
        false,
    ))
}
