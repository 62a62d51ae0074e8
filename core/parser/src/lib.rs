//! FILENAME: core/parser/src/lib.rs
//! PURPOSE: Library root for the column formula parser.
//! CONTEXT: This module exposes the lexer, parser, and AST components
//! needed to convert column formula templates into evaluatable expression trees.
//!
//! PIPELINE: Formula Template --> Lexer --> Tokens --> Parser --> AST --> Evaluator
//!
//! SUPPORTED FEATURES:
//! - Placeholders: {{ sum }}, {{ 2.avg }}, {{ rows }}, {{ cell.4.2.val }}
//! - Arithmetic: +, -, *, /, %, ^ (power)
//! - Comparison: =, ==, <>, !=, <, >, <=, >=
//! - String concatenation: & (and + when an operand is text)
//! - String literals in single or double quotes
//! - Function calls: ROUND({{ avg }}, 2), IF({{ rows }} > 0, "yes", "no")
//! - Parentheses for grouping
//! - Unary negation: -5

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;


// Re-export commonly used types for convenience
pub use ast::{BinaryOperator, Expression, Placeholder, Statistic, UnaryOperator, Value};
pub use lexer::Lexer;
pub use parser::{parse, parse_placeholder, ParseError, ParseResult, Parser};
pub use token::Token;
