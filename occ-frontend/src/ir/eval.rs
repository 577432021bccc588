//! Assignment evaluation
//!
//! The front-end records assignments without lowering them further;
//! immediate operands are converted to the target type in place so that
//! the buffered statement is self-contained when it is later reordered.

use crate::ir::{Block, ExprKind, Expression, Imm, Statement, Var, VarKind};
use crate::types::Type;
use log::trace;
use occ_common::{SymbolId, TempGenerator};

/// Per-object lowering context
///
/// Tracks the temporaries created while lowering one definition, so a
/// later pass can allocate storage for them.
#[derive(Debug, Default)]
pub struct Definition {
    pub temps: TempGenerator,
    pub locals: Vec<SymbolId>,
}

impl Definition {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Convert an integer immediate to the value domain of a target type
fn convert_int(value: i64, ty: &Type) -> i64 {
    if matches!(ty, Type::Bool) {
        return (value != 0) as i64;
    }
    match ty.size_of() {
        1 => {
            if ty.is_signed() {
                value as i8 as i64
            } else {
                value as u8 as i64
            }
        }
        2 => {
            if ty.is_signed() {
                value as i16 as i64
            } else {
                value as u16 as i64
            }
        }
        4 => {
            if ty.is_signed() {
                value as i32 as i64
            } else {
                value as u32 as i64
            }
        }
        _ => value,
    }
}

/// Retype an immediate operand to match the assignment target
fn convert_immediate(value: &mut Expression, target: &Type) {
    if let ExprKind::Identity(var) = &mut value.kind {
        if let VarKind::Immediate(imm) = &mut var.kind {
            match imm {
                Imm::Int(n) if target.is_float() => {
                    *imm = Imm::Double(*n as f64);
                }
                Imm::Int(n) if target.is_integer() => {
                    *n = convert_int(*n, target);
                }
                _ => {}
            }
            var.ty = target.clone();
            value.ty = target.clone();
        }
    }
}

/// Emit an assignment statement onto the block
///
/// Returns the possibly-adjusted target: assigning an array value (a
/// string literal) to an array object narrows the target type to the
/// value's type, so the store covers exactly the literal's bytes and the
/// post-processor can pad the rest.
pub fn eval_assign(block: &mut Block, mut target: Var, mut value: Expression) -> Var {
    if target.ty.is_array() && value.ty.is_array() {
        target.ty = value.ty.clone();
    } else {
        convert_immediate(&mut value, &target.ty);
    }

    trace!("assign {} = {}", target, value);
    block.code.push(Statement::Assign {
        target: target.clone(),
        value,
    });
    target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_immediate_is_retyped() {
        let mut block = Block::new();
        let target = Var::direct(0, Type::Char);
        let value = Expression::identity(Var::int_immediate(300, Type::Int));

        eval_assign(&mut block, target, value);

        assert_eq!(block.code.len(), 1);
        let value = block.code[0].value();
        assert_eq!(value.ty, Type::Char);
        let var = value.as_identity().unwrap();
        assert_eq!(var.int_value(), Some(44)); // 300 wraps to signed char
    }

    #[test]
    fn test_assign_array_value_narrows_target() {
        let mut block = Block::new();
        let mut target = Var::direct(0, Type::array_of(Type::Char, 5));
        target.offset = 0;
        let literal = Var::direct(1, Type::array_of(Type::Char, 3));
        let value = Expression::identity(literal);

        let adjusted = eval_assign(&mut block, target, value);

        assert_eq!(adjusted.ty, Type::array_of(Type::Char, 3));
        assert_eq!(block.code[0].target().ty, Type::array_of(Type::Char, 3));
    }

    #[test]
    fn test_assign_int_to_double_converts() {
        let mut block = Block::new();
        let target = Var::direct(0, Type::Double);
        let value = Expression::identity(Var::int_immediate(2, Type::Int));

        eval_assign(&mut block, target, value);

        let var = block.code[0].value().as_identity().unwrap();
        assert_eq!(var.kind, VarKind::Immediate(Imm::Double(2.0)));
    }
}
