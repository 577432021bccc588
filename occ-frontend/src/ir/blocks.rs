//! IR blocks

use crate::ir::Statement;
use serde::{Deserialize, Serialize};

/// A straight-line sequence of statements
///
/// Initializer lowering buffers assignments in scratch blocks before
/// concatenating them onto the caller's block in layout order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub label: Option<String>,
    pub code: Vec<Statement>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move all statements of `other` onto the end of this block
    pub fn concat(&mut self, other: &mut Block) {
        self.code.append(&mut other.code);
    }
}
