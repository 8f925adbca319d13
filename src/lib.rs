//! Rule Expression Language (REL) engine for fraud-detection rules.
//!
//! Operators write conditions such as `amount > 10000 AND user.age < 21` as
//! data. The engine tokenizes, parses, validates and evaluates them against a
//! transaction and its owning user:
//!
//! ```
//! use fraud_rel::{EvalContext, RuleEngine};
//! use serde_json::json;
//!
//! let engine = RuleEngine::default();
//!
//! let checked = engine.validate("amount  > 10000 and user.age < 21");
//! assert!(checked.is_valid);
//! assert_eq!(
//!     checked.normalized_expression.as_deref(),
//!     Some("amount > 10000 AND user.age < 21")
//! );
//!
//! let expr = fraud_rel::parse("amount > 10000 AND user.age < 21").unwrap();
//! let ctx = EvalContext::from_json(json!({"amount": 15000}), json!({"age": 19}));
//! assert!(engine.evaluate(&expr, &ctx));
//! ```
pub mod ast;
pub mod catalog;
pub mod config;
pub mod context;
pub mod diagnostic;
pub mod engine;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod scoring;
pub mod validator;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{CompareOp, Expr, Literal, Operand, Token, TokenKind};
pub use catalog::{CatalogError, FieldCatalog, FieldDef, FieldKind, Namespace};
pub use config::{ConfigError, EngineConfig};
pub use context::{EvalContext, TransactionRecord, UserRecord};
pub use diagnostic::{Diagnostic, DiagnosticCode};
pub use engine::RuleEngine;
pub use evaluator::{EvalError, Evaluator};
pub use lexer::{Lexer, tokenize};
pub use parser::{ParseError, Parser, parse};
pub use scoring::{
    CompiledRule, Decision, Rule, RuleBook, RuleResult, RuleSource, TransactionStatus,
};
pub use validator::{ValidationLimits, ValidationResult, Validator, normalize};
pub use value::Value;
