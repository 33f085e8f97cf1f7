//! Error types of the front end and the evaluator.

use std::io;
use thiserror::Error;

/// Malformed input. The first one found aborts the whole `parse` call.
///
/// `position` is the index of the offending token in the token stream, and
/// `found` its text (or "end of input").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown statement at token {position} ({found})")]
    UnknownStatement { position: usize, found: String },

    #[error("invalid statement, expecting semicolon at token {position} ({found})")]
    MissingSemicolon { position: usize, found: String },

    #[error("variable name expected at token {position} ({found})")]
    MissingVariableName { position: usize, found: String },

    #[error("invalid initialization of variable '{name}', expecting an expression at token {position} ({found})")]
    MissingInitializer { name: String, position: usize, found: String },

    #[error("invalid assignment to '{name}', expecting an expression at token {position} ({found})")]
    MissingAssignedValue { name: String, position: usize, found: String },

    #[error("invalid expression after '{operator}', expecting the right part at token {position} ({found})")]
    MissingRightOperand { operator: String, position: usize, found: String },

    #[error("expecting an additive expression inside parenthesis at token {position} ({found})")]
    EmptyParens { position: usize, found: String },

    #[error("expecting right parenthesis at token {position} ({found})")]
    MissingClosingParen { position: usize, found: String },

    #[error("parentheses nested deeper than {limit} levels at token {position} ({found})")]
    NestingTooDeep { limit: usize, position: usize, found: String },

    #[error("expecting an expression at token {position} ({found})")]
    MissingExpression { position: usize, found: String },

    #[error("unexpected token after expression at token {position} ({found})")]
    TrailingTokens { position: usize, found: String },
}

/// A statement could not be evaluated. Aborts the current `evaluate` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("variable {0} has not been set any value")]
    UninitializedVariable(String),

    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {lhs} {operator} {rhs}")]
    Overflow { lhs: i64, operator: &'static str, rhs: i64 },

    #[error("integer literal out of range: {0}")]
    InvalidLiteral(String),
}

/// Anything that can go wrong while running a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error("error: {0}")]
    Eval(#[from] EvalError),

    #[error("failed to read '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}
