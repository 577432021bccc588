//! Onyx C Compiler - Common Types and Utilities
//!
//! This crate contains shared types, error definitions, and utilities
//! used across all components of the Onyx C compiler.

pub mod error;
pub mod ids;
pub mod source_loc;

pub use error::{CompilerError, Diagnostic, ErrorReporter, Severity};
pub use ids::{LabelId, SymbolId, TempGenerator, TempId};
pub use source_loc::{SourceLocation, SourceSpan, SourceTracker};
