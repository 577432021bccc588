//! Symbol table
//!
//! Symbols carry the linkage that drives the load-time constant rule for
//! static-storage initializers, and a kind distinguishing string-literal
//! symbols from ordinary definitions. String literals are interned so
//! repeated use of the same text shares one symbol.

use crate::types::Type;
use occ_common::SymbolId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Linkage of a symbol
///
/// Anything other than `None` means the object lives in static storage
/// and its initializer must be computable at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Linkage {
    None,
    Internal,
    External,
}

/// Kind of symbol table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Definition,
    Declaration,
    Literal,
    Temporary,
}

/// Symbol table entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub linkage: Linkage,
    pub kind: SymbolKind,
    /// Backing text for string-literal symbols
    pub string_value: Option<String>,
}

impl Symbol {
    pub fn new(name: &str, ty: Type) -> Self {
        Self {
            name: name.to_string(),
            ty,
            linkage: Linkage::None,
            kind: SymbolKind::Definition,
            string_value: None,
        }
    }

    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    pub fn with_kind(mut self, kind: SymbolKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Arena-style symbol table
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_name: HashMap<String, SymbolId>,
    literals: HashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol, making it visible to name lookup
    pub fn add(&mut self, symbol: Symbol) -> SymbolId {
        let id = self.symbols.len() as SymbolId;
        if !symbol.name.is_empty() {
            self.by_name.insert(symbol.name.clone(), id);
        }
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id as usize]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id as usize]
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    /// Intern a string literal, returning a symbol of array-of-char type
    /// covering the text plus its terminating NUL
    pub fn string_literal(&mut self, value: &str) -> SymbolId {
        if let Some(&id) = self.literals.get(value) {
            return id;
        }

        let name = format!(".LC{}", self.literals.len());
        let ty = Type::array_of(Type::Char, value.len() as u64 + 1);
        let mut symbol = Symbol::new(&name, ty)
            .with_linkage(Linkage::Internal)
            .with_kind(SymbolKind::Literal);
        symbol.string_value = Some(value.to_string());

        let id = self.symbols.len() as SymbolId;
        self.symbols.push(symbol);
        self.literals.insert(value.to_string(), id);
        id
    }

    /// Complete an incomplete array type once the initializer has
    /// determined the element count
    pub fn set_array_length(&mut self, id: SymbolId, len: u64) {
        let symbol = self.get_mut(id);
        debug_assert!(symbol.ty.is_array());
        if let Type::Array { length, .. } = &mut symbol.ty {
            debug_assert!(length.is_none());
            *length = Some(len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut table = SymbolTable::new();
        let id = table.add(Symbol::new("x", Type::Int));

        assert_eq!(table.lookup("x"), Some(id));
        assert_eq!(table.get(id).name, "x");
        assert_eq!(table.get(id).linkage, Linkage::None);
        assert!(table.lookup("y").is_none());
    }

    #[test]
    fn test_string_literal_interning() {
        let mut table = SymbolTable::new();
        let a = table.string_literal("Hi");
        let b = table.string_literal("Hi");
        let c = table.string_literal("Hello");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.get(a).kind, SymbolKind::Literal);
        assert_eq!(table.get(a).ty, Type::array_of(Type::Char, 3));
        assert_eq!(table.get(a).string_value.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_set_array_length() {
        let mut table = SymbolTable::new();
        let id = table.add(Symbol::new("a", Type::incomplete_array_of(Type::Int)));

        assert_eq!(table.get(id).ty.size_of(), 0);
        table.set_array_length(id, 5);
        assert_eq!(table.get(id).ty, Type::array_of(Type::Int, 5));
        assert_eq!(table.get(id).ty.size_of(), 20);
    }
}
