//! Walk through every authored subject.
//!
//! Run with: `cargo run --example demo`
//! Set `RUST_LOG=practice_gen=debug` to watch pool resolution.
//!
//! 1. **One item per topic**, salted, so the output is reproducible.
//! 2. **A session** on the greetings topic that feeds each archetype back as
//!    excluded, showing soft uniqueness.
//! 3. **A project request** using a purpose preference.

use std::sync::Arc;

use practice_gen::{
    default_registry, engine::wire, DifficultyLevel, Generated, Orchestrator, Purpose,
    TopicContext,
};
use tracing_subscriber::EnvFilter;

const TOPICS: [&str; 8] = [
    "py0.print",
    "py0.variables",
    "py1.for_loops",
    "la0.dot",
    "la0.vectors",
    "la0.matrix",
    "ht0.hc_greetings",
    "ar0.arithmetic",
];

fn print_item(item: &Generated) {
    println!("------------------------------------------------------------");
    println!("  {}  [{} / {} / {}]", item.id, item.out.archetype, item.out.kind(), item.out.purpose());
    println!("------------------------------------------------------------");
    println!("{}", item.out.exercise().prompt);
    println!();
    println!("  exercise: {}", wire::client_payload(item)["exercise"]);
    println!("  expected: {}", wire::grader_payload(item)["expected"]);
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let orchestrator = Orchestrator::new(Arc::new(default_registry()?));

    println!("=== One item per topic ===\n");
    for slug in TOPICS {
        let key = orchestrator
            .registry()
            .gen_key_for(slug)
            .ok_or_else(|| format!("no generator for {slug}"))?
            .to_string();
        let ctx = TopicContext::new(slug).with_salt("demo|2024-01-01");
        let item = orchestrator.generate_at(&key, &ctx, DifficultyLevel::Intermediate)?;
        print_item(&item);
    }

    println!("=== Greetings session ===\n");
    let mut seen: Vec<String> = Vec::new();
    for step in 0..7 {
        let ctx = TopicContext::new("ht0.hc_greetings")
            .with_salt(format!("demo-session|{step}"))
            .exclude(seen.clone());
        let item = orchestrator.generate("haitian_creole", &ctx)?;
        println!("  step {step}: {}", item.out.archetype);
        seen.push(item.out.archetype);
    }
    println!();

    println!("=== Project ===\n");
    let ctx = TopicContext::new("py0.print")
        .with_salt("demo-project")
        .prefer_purpose(Purpose::Project);
    print_item(&orchestrator.generate("python", &ctx)?);

    match orchestrator.generate("python", &TopicContext::new("py0.variables").prefer_purpose(Purpose::Project)) {
        Ok(item) => print_item(&item),
        Err(err) => println!("  error: {}", wire::error_payload(&err)),
    }

    Ok(())
}
