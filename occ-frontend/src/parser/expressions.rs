//! Expression parsing
//!
//! Covers the subset initializer bodies need: literals, identifiers,
//! address-of, sign operators, function calls and additive/multiplicative
//! arithmetic. Constant operands fold; anything else is materialized
//! into a temporary so expressions never nest.

use crate::ir::{eval_assign, BinaryOp, Block, Definition, ExprKind, Expression, Var, VarKind};
use crate::lexer::TokenType;
use crate::parser::errors::ParseError;
use crate::parser::Parser;
use crate::types::Type;
use occ_common::CompilerError;

/// Result type of arithmetic on two operands, after integer promotion
fn usual_arithmetic(lhs: &Type, rhs: &Type) -> Type {
    let ty = if rhs.size_of() > lhs.size_of() {
        rhs.clone()
    } else {
        lhs.clone()
    };
    if ty.is_integer() && ty.size_of() < 4 {
        Type::Int
    } else {
        ty
    }
}

impl Parser {
    /// Parse one assignment-expression
    pub fn assignment_expression(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
    ) -> Result<Expression, CompilerError> {
        self.additive_expression(def, block)
    }

    /// Parse an integer constant expression, returning its value
    pub fn constant_expression(&mut self) -> Result<Var, CompilerError> {
        let location = self.current_location();
        let mut def = Definition::new();
        let mut block = Block::new();
        let expr = self.assignment_expression(&mut def, &mut block)?;

        if !block.code.is_empty() {
            return Err(ParseError::NotConstant { location }.into());
        }
        match expr.kind {
            ExprKind::Identity(var) if var.is_immediate() => Ok(var),
            _ => Err(ParseError::NotConstant { location }.into()),
        }
    }

    fn additive_expression(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
    ) -> Result<Expression, CompilerError> {
        let mut lhs = self.multiplicative_expression(def, block)?;
        loop {
            let op = match self.peek_type() {
                Some(TokenType::Plus) => BinaryOp::Add,
                Some(TokenType::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.multiplicative_expression(def, block)?;
            lhs = self.apply_binary(def, block, op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn multiplicative_expression(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
    ) -> Result<Expression, CompilerError> {
        let mut lhs = self.unary_expression(def, block)?;
        loop {
            let op = match self.peek_type() {
                Some(TokenType::Star) => BinaryOp::Mul,
                Some(TokenType::Slash) => BinaryOp::Div,
                Some(TokenType::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.unary_expression(def, block)?;
            lhs = self.apply_binary(def, block, op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn apply_binary(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
        op: BinaryOp,
        lhs: Expression,
        rhs: Expression,
    ) -> Result<Expression, CompilerError> {
        let ty = usual_arithmetic(&lhs.ty, &rhs.ty);

        let fold = match (
            lhs.as_identity().and_then(Var::int_value),
            rhs.as_identity().and_then(Var::int_value),
        ) {
            (Some(l), Some(r)) => Some((l, r)),
            _ => None,
        };
        if let Some((l, r)) = fold {
            let value = match op {
                BinaryOp::Add => l.wrapping_add(r),
                BinaryOp::Sub => l.wrapping_sub(r),
                BinaryOp::Mul => l.wrapping_mul(r),
                BinaryOp::Div | BinaryOp::Mod if r == 0 => {
                    return Err(ParseError::InvalidExpression {
                        message: "Division by zero in constant expression".to_string(),
                        location: self.current_location(),
                    }
                    .into())
                }
                BinaryOp::Div => l.wrapping_div(r),
                BinaryOp::Mod => l.wrapping_rem(r),
            };
            return Ok(Expression::identity(Var::int_immediate(value, ty)));
        }

        let lhs = self.eval_to_var(def, block, lhs);
        let rhs = self.eval_to_var(def, block, rhs);
        Ok(Expression {
            kind: ExprKind::Binary { op, lhs, rhs },
            ty,
        })
    }

    /// Materialize an expression as a plain value, spilling through a
    /// temporary when it carries an operation
    fn eval_to_var(&mut self, def: &mut Definition, block: &mut Block, expr: Expression) -> Var {
        match expr.kind {
            ExprKind::Identity(var) => var,
            _ => {
                let tmp = self.create_temp(def, expr.ty.clone());
                eval_assign(block, tmp, expr)
            }
        }
    }

    fn unary_expression(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
    ) -> Result<Expression, CompilerError> {
        match self.peek_type() {
            Some(TokenType::Plus) => {
                self.advance();
                self.unary_expression(def, block)
            }
            Some(TokenType::Minus) => {
                self.advance();
                let operand = self.unary_expression(def, block)?;
                let zero = Expression::identity(Var::int_immediate(0, Type::Int));
                self.apply_binary(def, block, BinaryOp::Sub, zero, operand)
            }
            Some(TokenType::Ampersand) => {
                let location = self.current_location();
                self.advance();
                let operand = self.unary_expression(def, block)?;
                match operand.kind {
                    ExprKind::Identity(var) => match var.kind {
                        VarKind::Direct(id) => {
                            let ty = Type::pointer_to(var.ty.clone());
                            Ok(Expression::identity(Var {
                                kind: VarKind::Address(id),
                                ty,
                                offset: var.offset,
                                field_offset: 0,
                                field_width: 0,
                            }))
                        }
                        _ => Err(ParseError::InvalidExpression {
                            message: "Cannot take address of non-lvalue".to_string(),
                            location,
                        }
                        .into()),
                    },
                    _ => Err(ParseError::InvalidExpression {
                        message: "Cannot take address of non-lvalue".to_string(),
                        location,
                    }
                    .into()),
                }
            }
            _ => self.postfix_expression(def, block),
        }
    }

    fn postfix_expression(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
    ) -> Result<Expression, CompilerError> {
        let primary = self.primary_expression(def, block)?;

        if self.check(&TokenType::LeftParen) {
            if let ExprKind::Identity(function) = &primary.kind {
                if function.ty.is_function() {
                    let function = function.clone();
                    return self.call_expression(def, block, function);
                }
            }
        }

        Ok(primary)
    }

    fn call_expression(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
        function: Var,
    ) -> Result<Expression, CompilerError> {
        self.expect(TokenType::LeftParen, "function call")?;

        let mut args = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                args.push(self.assignment_expression(def, block)?);
                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenType::RightParen, "function call")?;

        let ty = match &function.ty {
            Type::Function { return_type, .. } => (**return_type).clone(),
            _ => Type::Int,
        };

        Ok(Expression {
            kind: ExprKind::Call { function, args },
            ty,
        })
    }

    fn primary_expression(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
    ) -> Result<Expression, CompilerError> {
        let location = self.current_location();
        match self.advance() {
            Some(token) => match token.token_type {
                TokenType::IntLiteral(value) => {
                    let ty = if i64::from(value as i32) == value {
                        Type::Int
                    } else {
                        Type::Long
                    };
                    Ok(Expression::identity(Var::int_immediate(value, ty)))
                }
                TokenType::CharLiteral(value) => Ok(Expression::identity(Var::int_immediate(
                    value as i64,
                    Type::Int,
                ))),
                TokenType::StringLiteral(text) => {
                    let id = self.symbols.string_literal(&text);
                    let ty = self.symbols.get(id).ty.clone();
                    Ok(Expression::identity(Var::direct(id, ty)))
                }
                TokenType::Identifier(name) => match self.symbols.lookup(&name) {
                    Some(id) => {
                        let ty = self.symbols.get(id).ty.clone();
                        Ok(Expression::identity(Var::direct(id, ty)))
                    }
                    None => Err(ParseError::UndefinedIdentifier { name, location }.into()),
                },
                TokenType::LeftParen => {
                    let expr = self.assignment_expression(def, block)?;
                    self.expect(TokenType::RightParen, "expression")?;
                    Ok(expr)
                }
                _ => Err(ParseError::UnexpectedToken {
                    expected: "expression".to_string(),
                    found: token,
                }
                .into()),
            },
            None => Err(ParseError::UnexpectedEndOfFile {
                expected: "expression".to_string(),
                location,
            }
            .into()),
        }
    }
}
