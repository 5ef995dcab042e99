//! minilisp - a small interpreter for a prefix S-expression language
//!
//! The language has integers, strings, lists, user-defined functions,
//! conditionals, variable binding and printing:
//!
//! ```lisp
//! ; comments run to the end of the line
//! (setq x 5)                   ; bind x in the current environment
//! (defun add (a b) (+ a b))    ; define a function
//! (print (add x 2))            ; prints 7
//! (if (> x 3) "big" "small")   ; zero is the only false value
//! (head (list 1 2 3))          ; list primitives
//! ```
//!
//! ## Pipeline
//!
//! Source text goes through [`lexer::tokenize`], then [`parser::parse`], then
//! [`evaluator::evaluate`] against an [`environment::Environment`]. The
//! [`interpreter::Interpreter`] facade wires the three together and keeps one
//! global environment alive across calls, which is what the REPL uses.
//!
//! ## Semantics worth knowing
//!
//! - Function bodies see the environment of their *caller*, not the one they
//!   were defined in (dynamic scoping for free variables).
//! - Arithmetic is checked `i64` arithmetic; division truncates toward zero.
//! - Comparisons yield `1` or `0`; values of different kinds never compare.
//!
//! ## Modules
//!
//! - `lexer`: source text to tokens
//! - `ast`: syntax tree types
//! - `parser`: tokens to syntax tree
//! - `value`: runtime values and their operations
//! - `environment`: chained name bindings
//! - `builtins`: registry of named list primitives
//! - `evaluator`: tree-walking evaluation
//! - `interpreter`, `config`: the facade used by front ends

use thiserror::Error;

use crate::builtins::Arity;
use crate::lexer::LexError;

/// Maximum parsing depth to prevent stack overflow on deeply nested input
pub const MAX_PARSE_DEPTH: usize = 256;

/// Maximum evaluation depth to prevent stack overflow in recursive evaluation
/// A user function call costs about two levels, so this allows recursion around
/// sixty calls deep. Evaluation this deep fits in a 2 MB thread stack; raise it
/// only on threads with a larger stack
pub const MAX_EVAL_DEPTH: usize = 128;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrorKind {
    /// A token that cannot start or continue the current form
    UnexpectedToken,
    /// Input ended before the program or form was complete
    UnexpectedEof,
    /// The same name appears twice in a parameter list
    DuplicateParameter,
    /// Expression nesting exceeded the maximum parse depth
    TooDeeplyNested,
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("line {line}:{column}: expected {expected}, found {}", .found.as_deref().unwrap_or("end of input"))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Description of what the parser was looking for
    pub expected: String,
    /// The offending token's lexeme, `None` at end of input
    pub found: Option<String>,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        expected: impl Into<String>,
        found: Option<String>,
        line: usize,
        column: usize,
    ) -> Self {
        ParseError {
            kind,
            expected: expected.into(),
            found,
            line,
            column,
        }
    }
}

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("LexError: {0}")]
    Lex(#[from] LexError),
    #[error("ParseError: {0}")]
    Parse(#[from] ParseError),
    #[error("SymbolNotFound: symbol \"{0}\" not found")]
    SymbolNotFound(String),
    #[error("IncorrectNumOfArgs: \"{callee}\" was given {got} arguments, when it takes {expected}")]
    IncorrectNumOfArgs {
        callee: String,
        expected: Arity,
        got: usize,
    },
    #[error("TypeMismatch: {0}")]
    TypeMismatch(String),
    #[error("EvaluationError: {0}")]
    EvalError(String),
}

impl Error {
    /// Create an IncorrectNumOfArgs error for a call to `callee`
    pub fn arity_error(callee: impl Into<String>, expected: Arity, got: usize) -> Self {
        Error::IncorrectNumOfArgs {
            callee: callee.into(),
            expected,
            got,
        }
    }
}

pub mod ast;
pub mod builtins;
pub mod config;
pub mod environment;
pub mod evaluator;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod value;

pub use config::Config;
pub use environment::Environment;
pub use evaluator::{Evaluator, evaluate};
pub use interpreter::Interpreter;
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::parse;
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let cases = vec![
            (
                Error::SymbolNotFound("x".into()),
                "SymbolNotFound: symbol \"x\" not found",
            ),
            (
                Error::arity_error("add", Arity::Exact(2), 1),
                "IncorrectNumOfArgs: \"add\" was given 1 arguments, when it takes exactly 2",
            ),
            (
                Error::Parse(ParseError::new(
                    ParseErrorKind::UnexpectedEof,
                    "')'",
                    None,
                    1,
                    7,
                )),
                "ParseError: line 1:7: expected ')', found end of input",
            ),
            (
                Error::Parse(ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    "expression",
                    Some(")".into()),
                    2,
                    1,
                )),
                "ParseError: line 2:1: expected expression, found )",
            ),
            (
                Error::TypeMismatch("expected list, got number".into()),
                "TypeMismatch: expected list, got number",
            ),
        ];

        for (i, (error, expected)) in cases.iter().enumerate() {
            assert_eq!(error.to_string(), *expected, "case #{}", i + 1);
        }
    }
}
