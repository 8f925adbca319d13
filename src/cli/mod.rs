//! CLI support for the `rel` binary.
//!
//! Every command is exposed as a plain function so other tools can embed
//! them without going through argument parsing.

mod docs;
mod eval;
mod validate;

pub use docs::{DocCategory, format_fields, get_doc_category, get_docs_overview, get_syntax_reference};
pub use eval::{EvalOptions, EvalOutcome, ScoreOptions, execute_eval, execute_score};
pub use validate::{TokenView, execute_tokens, execute_validate};

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::{ConfigError, Diagnostic, EngineConfig, RuleEngine};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Invalid expression: {0}")]
    Invalid(Diagnostic),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No transaction provided. Use --tx or pipe JSON to stdin.")]
    NoInput,

    #[error("Unknown documentation category: {0}. Run 'rel docs' to list categories.")]
    UnknownCategory(String),
}

/// Builds the engine from an optional TOML config, falling back to the
/// standard catalog and default limits.
pub fn load_engine(config: Option<&Path>) -> Result<RuleEngine, CliError> {
    let config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    Ok(config.build_engine()?)
}
