//! Parse error types
//!
//! Covers both token-level errors and the initializer-specific error
//! conditions. All of them are fatal to the translation unit; there is
//! no recovery.

use crate::lexer::Token;
use occ_common::{CompilerError, SourceLocation};

/// Errors produced by the parser and initializer lowering
#[derive(Debug, Clone)]
pub enum ParseError {
    UnexpectedToken {
        expected: String,
        found: Token,
    },
    UnexpectedEndOfFile {
        expected: String,
        location: SourceLocation,
    },
    InvalidExpression {
        message: String,
        location: SourceLocation,
    },
    NotConstant {
        location: SourceLocation,
    },
    UndefinedIdentifier {
        name: String,
        location: SourceLocation,
    },
    /// Initializer expression has type void
    VoidInitializer {
        location: SourceLocation,
    },
    /// Static-storage initializer is not computable at load time
    NonLoadtimeConstant {
        location: SourceLocation,
    },
    /// Designator names a nonexistent member
    UnknownMember {
        type_name: String,
        member: String,
        location: SourceLocation,
    },
    /// Array designator index is not an integer constant
    NonIntegerArrayIndex {
        location: SourceLocation,
    },
    /// Incomplete array where a sized object is required
    FlexibleArrayInit {
        location: SourceLocation,
    },
    /// Zero-initialization requested on an unsupported type
    UnsupportedZeroInit {
        type_name: String,
    },
}

impl From<ParseError> for CompilerError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnexpectedToken { expected, found } => CompilerError::parse_error(
                format!("Expected {}, found {}", expected, found.token_type),
                found.span.start,
            ),
            ParseError::UnexpectedEndOfFile { expected, location } => CompilerError::parse_error(
                format!("Unexpected end of file, expected {}", expected),
                location,
            ),
            ParseError::InvalidExpression { message, location } => {
                CompilerError::parse_error(message, location)
            }
            ParseError::NotConstant { location } => CompilerError::parse_error(
                "Expression is not an integer constant".to_string(),
                location,
            ),
            ParseError::UndefinedIdentifier { name, location } => {
                CompilerError::semantic_error(format!("Undefined identifier '{}'", name), location)
            }
            ParseError::VoidInitializer { location } => CompilerError::semantic_error(
                "Cannot initialize with void value".to_string(),
                location,
            ),
            ParseError::NonLoadtimeConstant { location } => CompilerError::semantic_error(
                "Initializer must be computable at load time".to_string(),
                location,
            ),
            ParseError::UnknownMember {
                type_name,
                member,
                location,
            } => CompilerError::semantic_error(
                format!("{} has no member named '{}'", type_name, member),
                location,
            ),
            ParseError::NonIntegerArrayIndex { location } => CompilerError::semantic_error(
                "Array designator must have integer value".to_string(),
                location,
            ),
            ParseError::FlexibleArrayInit { location } => CompilerError::semantic_error(
                "Invalid initialization of flexible array member".to_string(),
                location,
            ),
            ParseError::UnsupportedZeroInit { type_name } => CompilerError::InternalError {
                message: format!("Cannot zero-initialize object of type '{}'", type_name),
            },
        }
    }
}
