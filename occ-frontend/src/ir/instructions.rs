//! IR expressions and statements

use crate::ir::Var;
use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators that can appear in an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Mod => write!(f, "%"),
        }
    }
}

/// Expression kind
///
/// An identity is a bare value with no operation applied. Operands of
/// binary expressions are already-materialized values, so expressions
/// never nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Identity(Var),
    Call { function: Var, args: Vec<Expression> },
    Binary { op: BinaryOp, lhs: Var, rhs: Var },
}

/// Typed expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExprKind,
    pub ty: Type,
}

impl Expression {
    /// Wrap a value as an expression with no operation
    pub fn identity(var: Var) -> Self {
        let ty = var.ty.clone();
        Self {
            kind: ExprKind::Identity(var),
            ty,
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self.kind, ExprKind::Identity(_))
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, ExprKind::Call { .. })
    }

    /// The bare value, when this expression is an identity
    pub fn as_identity(&self) -> Option<&Var> {
        match &self.kind {
            ExprKind::Identity(var) => Some(var),
            _ => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Identity(var) => write!(f, "{var}"),
            ExprKind::Call { function, args } => {
                write!(f, "call {function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            ExprKind::Binary { op, lhs, rhs } => write!(f, "{lhs} {op} {rhs}"),
        }
    }
}

/// IR statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Store the value of an expression into a target lvalue
    Assign { target: Var, value: Expression },
}

impl Statement {
    /// Assignment target
    pub fn target(&self) -> &Var {
        match self {
            Statement::Assign { target, .. } => target,
        }
    }

    /// Assigned value
    pub fn value(&self) -> &Expression {
        match self {
            Statement::Assign { value, .. } => value,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Assign { target, value } => write!(f, "{target} = {value}"),
        }
    }
}
