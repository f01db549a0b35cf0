//! Rich diagnostic error types for the forward-tms engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so callers know exactly what went wrong.
//! Expected outcomes (a missing retraction target, a rule-shaped query) are
//! ordinary variants; a broken provenance graph is `KbError::Integrity`.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the forward-tms crate.
#[derive(Debug, Error, Diagnostic)]
pub enum TmsError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Kb(#[from] KbError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Knowledge base errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum KbError {
    #[error("{item} was not found in the knowledge base")]
    #[diagnostic(
        code(ftms::kb::not_found),
        help(
            "Only items stored in the knowledge base can be retracted. \
             Check the statement spelling, or list the stored items with `ftms show`."
        )
    )]
    NotFound { item: String },

    #[error("invalid ask: {query}")]
    #[diagnostic(
        code(ftms::kb::invalid_query),
        help("Queries must be fact-shaped, e.g. `fact: (color ?X red)`. Rules cannot be asked.")
    )]
    InvalidQuery { query: String },

    #[error("not a fact or a rule: {kind}")]
    #[diagnostic(
        code(ftms::kb::unsupported_kind),
        help("Items start with `fact:` or `rule:`.")
    )]
    UnsupportedKind { kind: String },

    #[error("rule has no antecedents: -> {rhs}")]
    #[diagnostic(
        code(ftms::kb::empty_rule),
        help("A rule needs at least one antecedent statement on its left-hand side.")
    )]
    EmptyRule { rhs: String },

    #[error("provenance graph corrupted: {message}")]
    #[diagnostic(
        code(ftms::kb::integrity),
        help(
            "An internal invariant of the knowledge base no longer holds. \
             This is a bug in forward-tms; please report it with the corpus that triggered it."
        )
    )]
    Integrity { message: String },

    #[error("forward chaining stopped after {limit} derivations without reaching a fixpoint")]
    #[diagnostic(
        code(ftms::kb::fixpoint_limit),
        help(
            "The rule set keeps producing new items. Raise `max_derivations` in the \
             engine config, or look for rules whose consequents feed their own antecedents."
        )
    )]
    FixpointLimit { limit: usize },

    #[error("id allocator exhausted")]
    #[diagnostic(
        code(ftms::kb::ids_exhausted),
        help("The arena id space is exhausted (2^64 - 1 items). Rebuild the knowledge base.")
    )]
    IdsExhausted,
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("line {line}: {message}")]
    #[diagnostic(
        code(ftms::parse::syntax),
        help(
            "Statements look like `(pred a ?X)`. Facts are written `fact: (pred a)`, \
             rules `rule: ((p ?X) (r ?X)) -> (s ?X)`."
        )
    )]
    Syntax { line: usize, message: String },

    #[error("line {line}: {source}")]
    #[diagnostic(code(ftms::parse::item))]
    Item {
        line: usize,
        #[source]
        #[diagnostic_source]
        source: KbError,
    },

    #[error("failed to read corpus: {path}")]
    #[diagnostic(code(ftms::parse::io), help("Ensure the file exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read engine config: {path}")]
    #[diagnostic(
        code(ftms::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse engine config {path}: {message}")]
    #[diagnostic(
        code(ftms::config::parse),
        help("Check the TOML syntax. Known keys: max_derivations, verify_integrity, log_filter.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write engine config: {path}")]
    #[diagnostic(
        code(ftms::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(ftms::config::invalid), help("Check the EngineConfig fields. {message}"))]
    Invalid { message: String },
}

/// Result alias for knowledge base operations.
pub type KbResult<T> = std::result::Result<T, KbError>;

/// Convenience alias for functions returning forward-tms results.
pub type TmsResult<T> = std::result::Result<T, TmsError>;
