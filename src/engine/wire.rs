//! JSON payloads for the API layer.
//!
//! The learner-facing payload carries the exercise only; the answer key goes
//! to the grader separately so it never reaches the client.

use serde_json::{json, Value};

use crate::engine::{error::GenError, generator::Generated};

/// Payload sent to the learner's client.
pub fn client_payload(generated: &Generated) -> Value {
    json!({
        "id": generated.id,
        "archetype": generated.out.archetype,
        "kind": generated.out.kind(),
        "purpose": generated.out.purpose(),
        "exercise": generated.out.exercise(),
    })
}

/// Payload kept server-side for grading the learner's submission.
pub fn grader_payload(generated: &Generated) -> Value {
    json!({
        "id": generated.id,
        "archetype": generated.out.archetype,
        "seed": generated.seed,
        "expected": generated.out.expected(),
    })
}

/// Error body for a failed generation.
pub fn error_payload(err: &GenError) -> Value {
    let mut body = err.details();
    body["message"] = Value::String(err.to_string());
    body
}
