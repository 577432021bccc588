//! IR value representations
//!
//! A `Var` is one leg of an assignment: either an immediate constant, a
//! direct reference into a symbol's storage, or the address of a symbol.
//! Direct references carry a byte offset and, for bit-field access, the
//! bit window within the referenced unit.

use crate::types::Type;
use occ_common::SymbolId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immediate constant value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Imm {
    Int(i64),
    Double(f64),
}

impl fmt::Display for Imm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Imm::Int(n) => write!(f, "{n}"),
            Imm::Double(d) => write!(f, "{d}"),
        }
    }
}

/// What a `Var` refers to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VarKind {
    /// Immediate constant
    Immediate(Imm),
    /// Lvalue in a symbol's storage
    Direct(SymbolId),
    /// Address of a symbol
    Address(SymbolId),
}

/// Variable reference with type, offset and optional bit window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Var {
    pub kind: VarKind,
    pub ty: Type,
    pub offset: u64,
    pub field_offset: u32,
    pub field_width: u32,
}

impl Var {
    /// Direct reference to the start of a symbol's storage
    pub fn direct(symbol: SymbolId, ty: Type) -> Self {
        Self {
            kind: VarKind::Direct(symbol),
            ty,
            offset: 0,
            field_offset: 0,
            field_width: 0,
        }
    }

    /// Integer immediate of the given type
    pub fn int_immediate(value: i64, ty: Type) -> Self {
        Self {
            kind: VarKind::Immediate(Imm::Int(value)),
            ty,
            offset: 0,
            field_offset: 0,
            field_width: 0,
        }
    }

    /// Immediate zero, retyped to the target it will be assigned to
    pub fn immediate_zero(ty: Type) -> Self {
        Self::int_immediate(0, ty)
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self.kind, VarKind::Immediate(_))
    }

    pub fn is_direct(&self) -> bool {
        matches!(self.kind, VarKind::Direct(_))
    }

    /// Referenced symbol, if any
    pub fn symbol(&self) -> Option<SymbolId> {
        match self.kind {
            VarKind::Direct(id) | VarKind::Address(id) => Some(id),
            VarKind::Immediate(_) => None,
        }
    }

    /// Integer value of an immediate, if that is what this is
    pub fn int_value(&self) -> Option<i64> {
        match self.kind {
            VarKind::Immediate(Imm::Int(n)) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            VarKind::Immediate(imm) => write!(f, "{imm}"),
            VarKind::Direct(id) => {
                write!(f, "%{id}")?;
                if self.offset > 0 {
                    write!(f, "+{}", self.offset)?;
                }
                if self.field_width > 0 {
                    write!(f, ":{}:{}", self.field_offset, self.field_width)?;
                }
                Ok(())
            }
            VarKind::Address(id) => write!(f, "&%{id}"),
        }
    }
}
