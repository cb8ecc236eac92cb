// ABOUTME: Error types for the lexer, parser, and runtime, plus the
// control-flow outcome enum threaded through the evaluator

use crate::token::Token;
use crate::value::Value;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Exception kind strings (part of the user-observable contract)
// ============================================================================

pub const ZERO_DIVISION_ERROR: &str = "ZeroDivisionError";
pub const TYPE_ERROR: &str = "TypeError";
pub const VALUE_ERROR: &str = "ValueError";
pub const KEY_ERROR: &str = "KeyError";
pub const INDEX_ERROR: &str = "IndexError";
pub const ATTRIBUTE_ERROR: &str = "AttributeError";
pub const NAME_ERROR: &str = "NameError";
pub const RECURSION_ERROR: &str = "RecursionError";
pub const SYNTAX_ERROR: &str = "SyntaxError";
pub const STOP_EXECUTION: &str = "StopExecution";

/// Builtin exception classes registered in the global environment. The
/// `Exception` base catches everything and is the superclass users subclass.
pub const BUILTIN_EXCEPTIONS: &[&str] = &[
    "Exception",
    ZERO_DIVISION_ERROR,
    TYPE_ERROR,
    VALUE_ERROR,
    KEY_ERROR,
    INDEX_ERROR,
    ATTRIBUTE_ERROR,
    NAME_ERROR,
    RECURSION_ERROR,
    STOP_EXECUTION,
];

// ============================================================================
// Lexical errors
// ============================================================================

/// Tokenization failure. Not recovered from; halts the pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("[line {line}, col {column}] LexerError: {message}")]
pub struct LexError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl LexError {
    pub fn new(message: impl Into<String>, line: u32, column: u32) -> Self {
        LexError {
            message: message.into(),
            line,
            column,
        }
    }
}

// ============================================================================
// Syntax errors
// ============================================================================

/// A parse error the parser recovered from. The parser collects these and
/// the embedding layer forwards each to the error callback.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("[line {line}, col {column}] SyntaxError: {message} near '{lexeme}'")]
pub struct SyntaxError {
    pub message: String,
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
}

impl SyntaxError {
    pub fn at(token: &Token, message: impl Into<String>) -> Self {
        SyntaxError {
            message: message.into(),
            lexeme: token.lexeme.clone(),
            line: token.line,
            column: token.column,
        }
    }
}

// ============================================================================
// Runtime errors
// ============================================================================

/// Source position carried by a runtime error, filled in by the evaluator
/// at the innermost node that has a reference token.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub lexeme: String,
}

/// A runtime error: a first-class exception value plus, once known, the
/// source position it surfaced at. Builtins and native methods construct
/// these without a position; the evaluator attaches one as the error
/// crosses the first AST node that carries a token.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub exception: Value,
    pub position: Option<Position>,
}

impl RuntimeError {
    /// Build an error carrying a fresh builtin exception value.
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        RuntimeError {
            exception: Value::exception(kind, message),
            position: None,
        }
    }

    /// Wrap an already-constructed exception value (e.g. a raised instance).
    pub fn from_value(exception: Value) -> Self {
        RuntimeError {
            exception,
            position: None,
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(TYPE_ERROR, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(VALUE_ERROR, message)
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Self::new(INDEX_ERROR, message)
    }

    pub fn key_error(message: impl Into<String>) -> Self {
        Self::new(KEY_ERROR, message)
    }

    /// Attach a position if none has been recorded yet.
    pub fn with_token(mut self, token: &Token) -> Self {
        if self.position.is_none() {
            self.position = Some(Position {
                line: token.line,
                column: token.column,
                lexeme: token.lexeme.clone(),
            });
        }
        self
    }

    /// The `Kind: message` line without position decoration.
    pub fn describe(&self) -> String {
        self.exception.exception_summary()
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(pos) => write!(
                f,
                "[line {}, col {}] {} near '{}'",
                pos.line,
                pos.column,
                self.describe(),
                pos.lexeme
            ),
            None => write!(f, "{}", self.describe()),
        }
    }
}

// ============================================================================
// Control-flow outcomes
// ============================================================================

/// Non-local exits threaded through `Result` instead of host exceptions.
/// Loops consume `Break`/`Continue`, calls consume `Return`, and try
/// statements consume `Raise`. A host stop request is raised as a
/// `StopExecution` exception and travels the `Raise` path.
#[derive(Debug, Clone)]
pub enum Unwind {
    Raise(RuntimeError),
    Return(Value),
    Break(Position),
    Continue(Position),
}

impl From<RuntimeError> for Unwind {
    fn from(err: RuntimeError) -> Self {
        Unwind::Raise(err)
    }
}

impl Unwind {
    /// Converts an outcome that escaped every legal boundary into the
    /// runtime error the user sees ("'break' outside loop" and friends).
    pub fn into_escape_error(self) -> RuntimeError {
        match self {
            Unwind::Raise(err) => err,
            Unwind::Return(_) => RuntimeError::new(SYNTAX_ERROR, "'return' outside function"),
            Unwind::Break(pos) => {
                let mut err = RuntimeError::new(SYNTAX_ERROR, "'break' outside loop");
                err.position = Some(pos);
                err
            }
            Unwind::Continue(pos) => {
                let mut err = RuntimeError::new(SYNTAX_ERROR, "'continue' not properly in loop");
                err.position = Some(pos);
                err
            }
        }
    }
}

// ============================================================================
// Embedding-layer outcome
// ============================================================================

/// What `Interpreter::evaluate` reports when a run fails. Carries enough
/// structure for a driver to pick an exit code without string matching.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("{0}")]
    Lex(#[from] LexError),

    /// One or more syntax errors were reported through the error callback;
    /// evaluation of the statement list was not attempted.
    #[error("{} syntax error{} reported", .0.len(), if .0.len() == 1 { "" } else { "s" })]
    Syntax(Vec<SyntaxError>),

    #[error("{0}")]
    Runtime(RuntimeError),
}

/// Host-registered functions report failures as plain messages; the
/// evaluator wraps them as catchable exception values.
pub type HostResult = Result<Value, String>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn test_lex_error_format() {
        let err = LexError::new("unterminated string literal", 4, 12);
        assert_eq!(
            format!("{}", err),
            "[line 4, col 12] LexerError: unterminated string literal"
        );
    }

    #[test]
    fn test_syntax_error_format() {
        let token = Token::new(TokenKind::RightParen, ")", 2, 9);
        let err = SyntaxError::at(&token, "expected expression");
        assert_eq!(
            format!("{}", err),
            "[line 2, col 9] SyntaxError: expected expression near ')'"
        );
    }

    #[test]
    fn test_runtime_error_position_attaches_once() {
        let first = Token::new(TokenKind::Slash, "/", 1, 5);
        let second = Token::new(TokenKind::Plus, "+", 9, 1);
        let err = RuntimeError::new(ZERO_DIVISION_ERROR, "division by zero")
            .with_token(&first)
            .with_token(&second);
        assert_eq!(
            format!("{}", err),
            "[line 1, col 5] ZeroDivisionError: division by zero near '/'"
        );
    }

    #[test]
    fn test_escape_errors() {
        let pos = Position {
            line: 3,
            column: 1,
            lexeme: "break".to_string(),
        };
        let err = Unwind::Break(pos).into_escape_error();
        assert_eq!(err.describe(), "SyntaxError: 'break' outside loop");
    }
}
