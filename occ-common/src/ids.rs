//! Identifier types shared between compiler phases

use serde::{Deserialize, Serialize};

/// Symbol identifier, an index into the symbol table
pub type SymbolId = u32;

/// Label identifier for basic blocks
pub type LabelId = u32;

/// Temporary variable identifier for IR
pub type TempId = u32;

/// Temporary variable generator for IR
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TempGenerator {
    next_id: TempId,
}

impl TempGenerator {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Generate a new temporary variable ID
    pub fn new_temp(&mut self) -> TempId {
        let temp = self.next_id;
        self.next_id += 1;
        temp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_generator() {
        let mut gen = TempGenerator::new();

        assert_eq!(gen.new_temp(), 0);
        assert_eq!(gen.new_temp(), 1);
        assert_eq!(gen.new_temp(), 2);
    }
}
