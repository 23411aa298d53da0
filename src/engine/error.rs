use serde_json::{json, Value};
use thiserror::Error;

/// Errors raised by the generation engine.
///
/// These are authoring or routing faults, never transient: nothing in the
/// engine retries on them. The API layer maps [`GenError::code`] to a
/// user-facing response and logs [`GenError::details`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenError {
    /// The slug does not map to any registered module or topic.
    #[error("unknown topic '{slug}': {reason}")]
    UnknownTopic { slug: String, reason: String },

    /// A pool exists but nothing in it satisfies the requested kind/purpose.
    #[error("no questions available for '{slug}' (kind: {prefer_kind:?}, purpose: {prefer_purpose:?})")]
    NoQuestionsAvailable {
        slug: String,
        prefer_kind: Option<String>,
        prefer_purpose: Option<String>,
    },

    /// Every pool tier was empty (the topic has no dispatchable keys).
    #[error("empty pool for '{slug}'")]
    EmptyPool { slug: String },

    /// A pool key has no registered handler.
    #[error("missing handler '{key}' in topic '{topic}'")]
    MissingHandler { topic: String, key: String },

    /// `pick` was called on an empty slice.
    #[error("cannot pick from an empty input")]
    EmptyInput,

    /// `weighted` found no positive, finite weight to draw from.
    #[error("no positive weight among {len} weighted items")]
    NoPositiveWeight { len: usize },

    /// No factory is registered under the requested top-level key.
    #[error("no generator registered for key '{gen_key}'")]
    UnknownGenerator { gen_key: String },

    /// The request itself is malformed (empty key or slug).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The generator returned something that breaks the output contract.
    #[error("generator '{gen_key}' produced invalid output for '{slug}': {reason}")]
    InvalidOutput {
        gen_key: String,
        slug: String,
        reason: String,
    },

    /// An authored bundle violates the pool/handler invariant.
    #[error("invalid bundle '{topic}': {reason}")]
    InvalidBundle { topic: String, reason: String },

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
}

impl GenError {
    /// Stable tag for the error class.
    pub fn code(&self) -> &'static str {
        match self {
            GenError::UnknownTopic { .. }         => "UnknownTopic",
            GenError::NoQuestionsAvailable { .. } => "NoQuestionsAvailable",
            GenError::EmptyPool { .. }            => "EmptyPool",
            GenError::MissingHandler { .. }       => "MissingHandler",
            GenError::EmptyInput                  => "EmptyInput",
            GenError::NoPositiveWeight { .. }     => "NoPositiveWeight",
            GenError::UnknownGenerator { .. }     => "UnknownGenerator",
            GenError::InvalidRequest(_)           => "InvalidRequest",
            GenError::InvalidOutput { .. }        => "InvalidOutput",
            GenError::InvalidBundle { .. }        => "InvalidBundle",
            GenError::InvalidConfig(_)            => "InvalidConfig",
        }
    }

    /// Structured details for logs and API error bodies.
    pub fn details(&self) -> Value {
        let details = match self {
            GenError::UnknownTopic { slug, reason } => json!({ "slug": slug, "reason": reason }),
            GenError::NoQuestionsAvailable { slug, prefer_kind, prefer_purpose } => json!({
                "slug": slug,
                "preferKind": prefer_kind,
                "preferPurpose": prefer_purpose,
            }),
            GenError::EmptyPool { slug } => json!({ "slug": slug }),
            GenError::MissingHandler { topic, key } => json!({ "topic": topic, "key": key }),
            GenError::EmptyInput => json!({}),
            GenError::NoPositiveWeight { len } => json!({ "len": len }),
            GenError::UnknownGenerator { gen_key } => json!({ "genKey": gen_key }),
            GenError::InvalidRequest(msg) | GenError::InvalidConfig(msg) => json!({ "message": msg }),
            GenError::InvalidOutput { gen_key, slug, reason } => json!({
                "genKey": gen_key,
                "slug": slug,
                "reason": reason,
            }),
            GenError::InvalidBundle { topic, reason } => json!({ "topic": topic, "reason": reason }),
        };
        json!({ "code": self.code(), "details": details })
    }
}
