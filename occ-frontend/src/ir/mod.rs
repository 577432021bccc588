//! IR data model for initializer lowering
//!
//! Assignments against an object are buffered as IR statements before the
//! post-processing pass reorders them into layout order. The model is a
//! front-end IR: targets are lvalue references into a symbol's storage,
//! expressions are identities, calls, or simple binary operations.

pub mod blocks;
pub mod eval;
pub mod instructions;
pub mod values;

pub use blocks::Block;
pub use eval::{eval_assign, Definition};
pub use instructions::{BinaryOp, ExprKind, Expression, Statement};
pub use values::{Imm, Var, VarKind};
