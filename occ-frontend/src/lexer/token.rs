//! Token definitions for the C lexer
//!
//! This module defines token types and the Token struct.

use occ_common::{SourceLocation, SourceSpan};
use serde::{Deserialize, Serialize};
use std::fmt;

/// C token types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenType {
    // Literals
    IntLiteral(i64),
    CharLiteral(u8),
    StringLiteral(String),

    // Identifiers and keywords
    Identifier(String),

    // Keywords
    Char, Const, Double, Enum, Extern, Float, Int, Long,
    Short, Signed, Static, Struct, Union, Unsigned, Void, Volatile,

    // Operators
    Plus,           // +
    Minus,          // -
    Star,           // *
    Slash,          // /
    Percent,        // %
    Ampersand,      // &
    Equal,          // =

    // Delimiters
    LeftParen,      // (
    RightParen,     // )
    LeftBrace,      // {
    RightBrace,     // }
    LeftBracket,    // [
    RightBracket,   // ]
    Semicolon,      // ;
    Comma,          // ,
    Dot,            // .

    // Special
    EndOfFile,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::IntLiteral(n) => write!(f, "{n}"),
            TokenType::CharLiteral(c) => write!(f, "'{}'", *c as char),
            TokenType::StringLiteral(s) => write!(f, "\"{s}\""),
            TokenType::Identifier(s) => write!(f, "{s}"),

            TokenType::Char => write!(f, "char"),
            TokenType::Const => write!(f, "const"),
            TokenType::Double => write!(f, "double"),
            TokenType::Enum => write!(f, "enum"),
            TokenType::Extern => write!(f, "extern"),
            TokenType::Float => write!(f, "float"),
            TokenType::Int => write!(f, "int"),
            TokenType::Long => write!(f, "long"),
            TokenType::Short => write!(f, "short"),
            TokenType::Signed => write!(f, "signed"),
            TokenType::Static => write!(f, "static"),
            TokenType::Struct => write!(f, "struct"),
            TokenType::Union => write!(f, "union"),
            TokenType::Unsigned => write!(f, "unsigned"),
            TokenType::Void => write!(f, "void"),
            TokenType::Volatile => write!(f, "volatile"),

            TokenType::Plus => write!(f, "+"),
            TokenType::Minus => write!(f, "-"),
            TokenType::Star => write!(f, "*"),
            TokenType::Slash => write!(f, "/"),
            TokenType::Percent => write!(f, "%"),
            TokenType::Ampersand => write!(f, "&"),
            TokenType::Equal => write!(f, "="),

            TokenType::LeftParen => write!(f, "("),
            TokenType::RightParen => write!(f, ")"),
            TokenType::LeftBrace => write!(f, "{{"),
            TokenType::RightBrace => write!(f, "}}"),
            TokenType::LeftBracket => write!(f, "["),
            TokenType::RightBracket => write!(f, "]"),
            TokenType::Semicolon => write!(f, ";"),
            TokenType::Comma => write!(f, ","),
            TokenType::Dot => write!(f, "."),

            TokenType::EndOfFile => write!(f, "EOF"),
        }
    }
}

/// A token with location information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: TokenType,
    pub span: SourceSpan,
}

impl Token {
    pub fn new(token_type: TokenType, span: SourceSpan) -> Self {
        Self { token_type, span }
    }

    pub fn eof(location: SourceLocation) -> Self {
        Self {
            token_type: TokenType::EndOfFile,
            span: SourceSpan::new(location.clone(), location),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.token_type, self.span.start)
    }
}
