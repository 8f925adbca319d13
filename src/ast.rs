//! # Rule Expression Language - Abstract Syntax Tree
//!
//! This module defines the tokens and the Abstract Syntax Tree (AST) for the
//! Rule Expression Language (REL), the small boolean language operators use to
//! describe fraud conditions over a transaction and its owner.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Positioned lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes, comparison operands and literals
//! - **[operators]** - Comparison operators
//!
//! ## Quick Start
//!
//! ```text
//! amount > 10000 AND user.age < 21
//! ```
//!
//! ## Precedence
//!
//! From loosest to tightest: `OR`, `AND`, `NOT`, then comparisons, which are
//! atomic. Parentheses override everything.
//!
//! ```text
//! a > 1 OR b > 2 AND c > 3        // a > 1 OR (b > 2 AND c > 3)
//! NOT amount > 100 AND x = 'y'    // (NOT amount > 100) AND x = 'y'
//! ```
//!
//! ## Positions
//!
//! Every token and node records the zero-based character offset of the text
//! that defined it. Offsets count Unicode scalar values, so an excerpt taken
//! at a position is always valid text.
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{Expr, Literal, Operand};
pub use operators::CompareOp;
pub use tokens::{Token, TokenKind};
