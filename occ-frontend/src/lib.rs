//! Onyx C Compiler - Frontend
//!
//! This crate provides the front-end components of the Onyx C compiler:
//! - Lexer: tokenizes C source
//! - Parser: recursive descent over tokens, including the aggregate
//!   initializer lowering that turns `= {...}` into ordered IR
//!   assignments with zero-filled padding
//! - Types: C type system with byte layout and bit-fields
//! - Symbols: symbol table with linkage and string-literal interning
//! - IR: assignment statements, blocks and evaluation helpers

pub mod ir;
pub mod lexer;
pub mod parser;
pub mod symbols;
pub mod types;

pub use ir::{eval_assign, Block, Definition, ExprKind, Expression, Statement, Var, VarKind};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::{ParseError, Parser};
pub use symbols::{Linkage, Symbol, SymbolKind, SymbolTable};
pub use types::{struct_type, union_type, Member, MemberDecl, Type};

pub use occ_common::CompilerError;
