//! Recursive descent parser
//!
//! The parser owns the token cursor, the symbol table, and a pool of
//! scratch IR blocks reused while buffering initializer assignments.
//! Expression parsing covers the subset initializer bodies need; the
//! initializer module does the heavy lifting.

pub mod errors;
pub mod expressions;
pub mod initializer;

use crate::ir::{Block, Definition, Var};
use crate::lexer::{Lexer, Token, TokenType};
use crate::symbols::{Symbol, SymbolKind, SymbolTable};
use crate::types::Type;
use log::trace;
use occ_common::{CompilerError, SourceLocation};
use std::collections::VecDeque;

pub use errors::ParseError;

/// C parser over a token stream
#[derive(Debug)]
pub struct Parser {
    tokens: VecDeque<Token>,
    pub symbols: SymbolTable,
    init_blocks: Vec<Block>,
}

impl Parser {
    /// Create a new parser
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into(),
            symbols: SymbolTable::new(),
            init_blocks: Vec::new(),
        }
    }

    /// Tokenize a source fragment and create a parser over it
    pub fn from_source(source: &str) -> Result<Self, CompilerError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self::new(tokens))
    }

    /// Peek at current token without consuming
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.front()
    }

    /// Peek at the current token's type
    pub(crate) fn peek_type(&self) -> Option<&TokenType> {
        self.peek().map(|t| &t.token_type)
    }

    /// Non-consuming lookahead; `peek_nth_type(0)` is the current token
    pub(crate) fn peek_nth_type(&self, n: usize) -> Option<&TokenType> {
        self.tokens.get(n).map(|t| &t.token_type)
    }

    /// Get current token and advance
    pub(crate) fn advance(&mut self) -> Option<Token> {
        self.tokens.pop_front()
    }

    /// Check if current token matches expected type
    pub(crate) fn check(&self, token_type: &TokenType) -> bool {
        if let Some(token) = self.peek() {
            std::mem::discriminant(&token.token_type) == std::mem::discriminant(token_type)
        } else {
            matches!(token_type, TokenType::EndOfFile)
        }
    }

    /// Consume token if it matches expected type
    pub(crate) fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect and consume a specific token type
    pub(crate) fn expect(&mut self, token_type: TokenType, context: &str) -> Result<Token, ParseError> {
        if let Some(token) = self.advance() {
            if std::mem::discriminant(&token.token_type) == std::mem::discriminant(&token_type) {
                Ok(token)
            } else {
                Err(ParseError::UnexpectedToken {
                    expected: format!("{} in {}", token_type, context),
                    found: token,
                })
            }
        } else {
            Err(ParseError::UnexpectedEndOfFile {
                expected: format!("{} in {}", token_type, context),
                location: SourceLocation::new_simple(0, 0),
            })
        }
    }

    /// Expect and consume an identifier, returning its text
    pub(crate) fn expect_identifier(
        &mut self,
        context: &str,
    ) -> Result<(String, SourceLocation), ParseError> {
        match self.advance() {
            Some(Token {
                token_type: TokenType::Identifier(name),
                span,
            }) => Ok((name, span.start)),
            Some(token) => Err(ParseError::UnexpectedToken {
                expected: format!("identifier in {}", context),
                found: token,
            }),
            None => Err(ParseError::UnexpectedEndOfFile {
                expected: format!("identifier in {}", context),
                location: SourceLocation::new_simple(0, 0),
            }),
        }
    }

    /// Get current location for error reporting
    pub(crate) fn current_location(&self) -> SourceLocation {
        if let Some(token) = self.peek() {
            token.span.start.clone()
        } else {
            SourceLocation::new_simple(0, 0)
        }
    }

    /// Create a fresh temporary variable owned by the definition
    pub(crate) fn create_temp(&mut self, def: &mut Definition, ty: Type) -> Var {
        let name = format!(".t{}", def.temps.new_temp());
        let id = self
            .symbols
            .add(Symbol::new(&name, ty.clone()).with_kind(SymbolKind::Temporary));
        def.locals.push(id);
        Var::direct(id, ty)
    }

    /// Take an empty scratch block from the pool, or allocate one
    pub(crate) fn acquire_block(&mut self) -> Block {
        match self.init_blocks.pop() {
            Some(block) => {
                trace!("reusing scratch block, {} left in pool", self.init_blocks.len());
                block
            }
            None => Block::new(),
        }
    }

    /// Return a scratch block to the pool
    pub(crate) fn release_block(&mut self, mut block: Block) {
        debug_assert!(block.label.is_none());
        block.code.clear();
        self.init_blocks.push(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_operations() {
        let mut parser = Parser::from_source("{1, 2}").unwrap();

        assert!(parser.check(&TokenType::LeftBrace));
        assert_eq!(parser.peek_nth_type(1), Some(&TokenType::IntLiteral(1)));

        assert!(parser.match_token(&TokenType::LeftBrace));
        assert!(!parser.match_token(&TokenType::LeftBrace));
        assert!(parser.check(&TokenType::IntLiteral(0))); // discriminant match

        parser.advance();
        assert!(parser.expect(TokenType::Comma, "test").is_ok());
        assert!(parser.expect(TokenType::RightBrace, "test").is_err());
    }

    #[test]
    fn test_block_pool_reuse() {
        let mut parser = Parser::from_source("").unwrap();

        let block = parser.acquire_block();
        parser.release_block(block);
        assert_eq!(parser.init_blocks.len(), 1);

        let block = parser.acquire_block();
        assert!(block.code.is_empty());
        assert_eq!(parser.init_blocks.len(), 0);
        parser.release_block(block);
    }
}
