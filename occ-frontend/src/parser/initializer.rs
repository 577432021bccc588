//! Aggregate initializer lowering
//!
//! Reads the initializer following `=` in a declaration and lowers it to
//! a list of assignment statements against the initialized object.
//!
//! Assignments are buffered in a scratch block separate from the caller's
//! block while the brace structure is walked, because designators can
//! write elements in any order and unions discard earlier writes. Once
//! the whole initializer is read, post-processing sorts the buffer into
//! layout order, drops shadowed duplicates, and interpolates zero writes
//! for every byte the source did not mention.

use crate::ir::{
    eval_assign, Block, Definition, ExprKind, Expression, Statement, Var, VarKind,
};
use crate::lexer::TokenType;
use crate::parser::errors::ParseError;
use crate::parser::Parser;
use crate::symbols::{Linkage, SymbolKind, SymbolTable};
use crate::types::{Member, Type};
use log::debug;
use occ_common::{CompilerError, SymbolId};

/// Position of the object being initialized relative to brace nesting
///
/// Drives whether a bare `,` advances to the next sibling or returns
/// control to the enclosing level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectState {
    /// Inside an explicit brace level whose elements are iterated
    Current,
    /// Entered through a designator from an outer level; only another
    /// designator continues at this level
    Designator,
    /// Nested object without braces of its own
    Member,
}

/// One parsed-but-unapplied initializer expression
///
/// The walker reads one element ahead before knowing whether it assigns
/// the current aggregate as a whole (`struct A b = a`), a string to a
/// char array, or the aggregate's first leaf.
type Pending = Option<Expression>;

fn direct_symbol(target: &Var) -> Result<SymbolId, CompilerError> {
    target.symbol().ok_or_else(|| CompilerError::InternalError {
        message: "initializer target is not an lvalue".to_string(),
    })
}

/// Project a member access out of an aggregate reference
fn access_member(target: &Var, member: &Member, offset: u64) -> Var {
    let mut var = target.clone();
    var.ty = member.member_type.clone();
    var.field_offset = member.field_offset;
    var.field_width = member.field_width;
    var.offset = offset + member.offset;
    var
}

/// Load-time computable: an immediate, the address of a symbol with
/// linkage, or a direct reference to an array or function with linkage
fn is_loadtime_constant(expr: &Expression, symbols: &SymbolTable) -> bool {
    match &expr.kind {
        ExprKind::Identity(var) => match var.kind {
            VarKind::Immediate(_) => true,
            VarKind::Direct(id) => {
                (var.ty.is_array() || var.ty.is_function())
                    && symbols.get(id).linkage != Linkage::None
            }
            VarKind::Address(id) => symbols.get(id).linkage != Linkage::None,
        },
        _ => false,
    }
}

/// Move the pending expression into an assignment on the values block
fn assign_initializer_element(
    values: &mut Block,
    pending: &mut Pending,
    target: Var,
) -> Result<(), CompilerError> {
    debug_assert!(target.is_direct());
    let value = pending.take().ok_or_else(|| CompilerError::InternalError {
        message: "no pending initializer value".to_string(),
    })?;
    eval_assign(values, target, value);
    Ok(())
}

impl Parser {
    /// Lower the initializer for `sym`, appending assignments in layout
    /// order onto the caller's block
    ///
    /// The cursor must be positioned on the first token after `=`. Scalar
    /// objects take a single expression; everything else goes through a
    /// values buffer and the padding post-processor.
    pub fn initializer(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
        sym: SymbolId,
    ) -> Result<(), CompilerError> {
        let target = Var::direct(sym, self.symbols.get(sym).ty.clone());

        if self.check(&TokenType::LeftBrace) || target.ty.is_array() {
            let mut values = self.acquire_block();
            let mut pending = None;
            match self.initialize_object(def, block, &mut values, &mut pending, target.clone()) {
                Ok(()) => {
                    debug_assert!(pending.is_none());
                    // The symbol type may have been completed while reading
                    // a flexible array initializer
                    let mut target = target;
                    target.ty = self.symbols.get(sym).ty.clone();
                    let mut ordered = self.postprocess_object_initialization(values, target)?;
                    block.concat(&mut ordered);
                    self.release_block(ordered);
                    Ok(())
                }
                Err(err) => {
                    self.release_block(values);
                    Err(err)
                }
            }
        } else {
            let expr = self.read_initializer_element(def, block, sym)?;
            eval_assign(block, target, expr);
            Ok(())
        }
    }

    /// Top of an object: either a braced list or a bare element
    fn initialize_object(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
        values: &mut Block,
        pending: &mut Pending,
        target: Var,
    ) -> Result<(), CompilerError> {
        debug_assert!(target.is_direct());
        debug_assert!(pending.is_none());

        if self.check(&TokenType::LeftBrace) {
            self.advance();
            if target.ty.is_struct_or_union() {
                self.initialize_struct_or_union(
                    def,
                    block,
                    values,
                    pending,
                    target,
                    ObjectState::Current,
                )?;
            } else if target.ty.is_array() {
                self.initialize_array(def, block, values, pending, target, ObjectState::Current)?;
            } else {
                self.initialize_object(def, block, values, pending, target)?;
            }
            if self.check(&TokenType::Comma) {
                self.advance();
            }
            self.expect(TokenType::RightBrace, "initializer")?;
        } else if target.ty.is_array() {
            // Arrays may be initialized by a string literal without braces
            self.initialize_array(def, block, values, pending, target, ObjectState::Member)?;
        } else {
            let sym = direct_symbol(&target)?;
            *pending = Some(self.read_initializer_element(def, block, sym)?);
            assign_initializer_element(values, pending, target)?;
        }

        Ok(())
    }

    /// Nested sub-object during aggregate traversal
    ///
    /// Like `initialize_object`, except scalar leaves may be wrapped in a
    /// single pair of braces.
    fn initialize_member(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
        values: &mut Block,
        pending: &mut Pending,
        target: Var,
    ) -> Result<(), CompilerError> {
        debug_assert!(target.is_direct());

        if target.ty.is_struct_or_union() {
            if pending.is_none() && self.check(&TokenType::LeftBrace) {
                self.advance();
                self.initialize_struct_or_union(
                    def,
                    block,
                    values,
                    pending,
                    target,
                    ObjectState::Current,
                )?;
                if self.check(&TokenType::Comma) {
                    self.advance();
                }
                self.expect(TokenType::RightBrace, "initializer")?;
            } else {
                self.initialize_struct_or_union(
                    def,
                    block,
                    values,
                    pending,
                    target,
                    ObjectState::Designator,
                )?;
            }
        } else if target.ty.is_array() {
            if target.ty.size_of() == 0 {
                return Err(ParseError::FlexibleArrayInit {
                    location: self.current_location(),
                }
                .into());
            }
            if pending.is_none() && self.check(&TokenType::LeftBrace) {
                self.advance();
                self.initialize_array(def, block, values, pending, target, ObjectState::Current)?;
                if self.check(&TokenType::Comma) {
                    self.advance();
                }
                self.expect(TokenType::RightBrace, "initializer")?;
            } else {
                self.initialize_array(def, block, values, pending, target, ObjectState::Designator)?;
            }
        } else {
            if pending.is_none() {
                let sym = direct_symbol(&target)?;
                if self.check(&TokenType::LeftBrace) {
                    self.advance();
                    *pending = Some(self.read_initializer_element(def, block, sym)?);
                    self.expect(TokenType::RightBrace, "initializer")?;
                } else {
                    *pending = Some(self.read_initializer_element(def, block, sym)?);
                }
            }
            assign_initializer_element(values, pending, target)?;
        }

        Ok(())
    }

    /// Struct or union, catching assignment of a whole aggregate value
    ///
    /// An element that is not a designator or brace is read first; if its
    /// type matches the target, a single whole-object assignment covers
    /// everything:
    ///
    ///     struct A { char c; } foo = { 'a' };
    ///     struct { struct A a; } bar = { foo };
    fn initialize_struct_or_union(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
        values: &mut Block,
        pending: &mut Pending,
        target: Var,
        state: ObjectState,
    ) -> Result<(), CompilerError> {
        debug_assert!(target.ty.is_struct_or_union());
        debug_assert!(target.ty.nmembers() > 0);

        if pending.is_none() {
            match self.peek_type() {
                Some(TokenType::Dot | TokenType::LeftBrace | TokenType::LeftBracket) => {}
                _ => {
                    let sym = direct_symbol(&target)?;
                    *pending = Some(self.read_initializer_element(def, block, sym)?);
                }
            }
        }

        let whole_object = pending
            .as_ref()
            .is_some_and(|expr| target.ty.compatible_unqualified(&expr.ty));
        if whole_object {
            assign_initializer_element(values, pending, target)?;
            Ok(())
        } else if target.ty.is_union() {
            self.initialize_union(def, block, values, pending, target, state)
        } else {
            self.initialize_struct(def, block, values, pending, target, state)
        }
    }

    /// Walk struct members in declaration order, honoring designators
    ///
    /// Members flattened from anonymous unions share storage; only the
    /// first sibling at each `(offset, field_offset)` is initialized when
    /// walking without designators.
    fn initialize_struct(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
        values: &mut Block,
        pending: &mut Pending,
        target: Var,
        state: ObjectState,
    ) -> Result<(), CompilerError> {
        let filled = target.offset;
        let struct_type = target.ty.clone();
        debug_assert!(struct_type.is_struct());

        let m = struct_type.nmembers();
        debug_assert!(m > 0);
        let mut i = 0;
        let mut prev: Option<(u64, u32)> = None;

        loop {
            if pending.is_none() && self.check(&TokenType::Dot) {
                self.advance();
                let (name, location) = self.expect_identifier("designator")?;
                let member = match struct_type.find_member(&name) {
                    Some((index, member)) => {
                        i = index;
                        member.clone()
                    }
                    None => {
                        return Err(ParseError::UnknownMember {
                            type_name: struct_type.to_string(),
                            member: name,
                            location,
                        }
                        .into())
                    }
                };
                let member_target = access_member(&target, &member, filled);
                if self.check(&TokenType::Equal) {
                    self.advance();
                }
                self.initialize_member(def, block, values, pending, member_target)?;
                prev = Some((member.offset, member.field_offset));
                i += 1;
            } else {
                let mut next = None;
                while let Some(candidate) = struct_type.get_member(i) {
                    i += 1;
                    let shares_storage = matches!(
                        prev,
                        Some((offset, field_offset))
                            if candidate.offset == offset
                                && candidate.field_offset == field_offset
                    );
                    if !shares_storage {
                        next = Some(candidate.clone());
                        break;
                    }
                }
                let member = match next {
                    Some(member) => member,
                    None => break,
                };
                prev = Some((member.offset, member.field_offset));
                let member_target = access_member(&target, &member, filled);
                self.initialize_member(def, block, values, pending, member_target)?;
                if i >= m {
                    break;
                }
            }

            if !self.next_element(state) {
                break;
            }
        }

        Ok(())
    }

    /// Initialize the first union member, or the last designated one
    ///
    /// Each element is evaluated into its own scratch block that is
    /// emptied between iterations, so with several designators only the
    /// writes of the last one survive:
    ///
    ///     union {
    ///         struct { int x, y; } p;
    ///         int q;
    ///     } foo = {{1, 2}, .q = 3};
    ///
    /// Here foo.p.y must end up 0 even though the assignment to .q does
    /// not overwrite it.
    fn initialize_union(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
        values: &mut Block,
        pending: &mut Pending,
        target: Var,
        state: ObjectState,
    ) -> Result<(), CompilerError> {
        debug_assert!(target.ty.is_union());
        debug_assert!(target.ty.nmembers() > 0);

        let mut init = self.acquire_block();
        let result =
            self.initialize_union_members(def, block, &mut init, pending, &target, state);
        if result.is_ok() {
            values.concat(&mut init);
        }
        self.release_block(init);
        result
    }

    fn initialize_union_members(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
        init: &mut Block,
        pending: &mut Pending,
        target: &Var,
        state: ObjectState,
    ) -> Result<(), CompilerError> {
        let filled = target.offset;
        let union_type = target.ty.clone();
        let mut done = false;

        loop {
            let member_target;
            if self.check(&TokenType::Dot) {
                self.advance();
                let (name, location) = self.expect_identifier("designator")?;
                let member = match union_type.find_member(&name) {
                    Some((_, member)) => member.clone(),
                    None => {
                        return Err(ParseError::UnknownMember {
                            type_name: union_type.to_string(),
                            member: name,
                            location,
                        }
                        .into())
                    }
                };
                member_target = access_member(target, &member, filled);
                if self.check(&TokenType::Equal) {
                    self.advance();
                }
            } else if !done {
                let member = match union_type.get_member(0) {
                    Some(member) => member.clone(),
                    None => {
                        return Err(CompilerError::InternalError {
                            message: "union has no members".to_string(),
                        })
                    }
                };
                member_target = access_member(target, &member, filled);
            } else {
                break;
            }

            init.code.clear();
            self.initialize_member(def, block, init, pending, member_target)?;
            done = true;

            if !self.next_element(state) {
                break;
            }
        }

        Ok(())
    }

    /// Array initialization: brace-enclosed elements or a string literal
    ///
    ///     int a[] = {1, 2, 3};
    ///     char b[] = "Hello world";
    ///     int c[2][3] = {1, 2, 3, {4, 5, 6}};
    ///
    /// A string shorter than the declared array leaves the tail for the
    /// post-processor to zero:
    ///
    ///     char foo[5] = "Hi";
    ///
    /// lowers to an assignment of the three literal bytes, with foo[3]
    /// and foo[4] zeroed by trailing padding.
    fn initialize_array(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
        values: &mut Block,
        pending: &mut Pending,
        mut target: Var,
        state: ObjectState,
    ) -> Result<(), CompilerError> {
        debug_assert!(target.ty.is_array());
        debug_assert!(target.is_direct());

        let array_type = target.ty.clone();
        let elem = match array_type.element_type() {
            Some(elem) => elem.clone(),
            None => {
                return Err(CompilerError::InternalError {
                    message: "array type without element".to_string(),
                })
            }
        };
        let width = elem.size_of();
        let count = array_type.array_len().unwrap_or(0);
        let initial = target.offset;
        let sym = direct_symbol(&target)?;
        let mut i: u64 = 0;
        let mut c: u64 = 0;

        // Read one expression ahead to tell a string constant from an
        // expression like "Hello"[2] that initializes a single element.
        if pending.is_none() {
            match self.peek_type() {
                Some(TokenType::Dot | TokenType::LeftBrace | TokenType::LeftBracket) => {}
                _ => *pending = Some(self.read_initializer_element(def, block, sym)?),
            }
        }

        let string_value = pending.as_ref().is_some_and(|expr| {
            elem.is_char()
                && expr.ty.is_array()
                && match &expr.kind {
                    ExprKind::Identity(var) => match var.kind {
                        VarKind::Direct(id) => self.symbols.get(id).kind == SymbolKind::Literal,
                        _ => false,
                    },
                    _ => false,
                }
        });

        if string_value {
            let value = pending.take().ok_or_else(|| CompilerError::InternalError {
                message: "no pending initializer value".to_string(),
            })?;
            let adjusted = eval_assign(values, target, value);
            c = adjusted.ty.array_len().unwrap_or(0);
        } else {
            target.ty = elem;
            loop {
                if self.try_parse_index(&mut i)? && self.check(&TokenType::Equal) {
                    self.advance();
                }
                target.offset = initial + i * width;
                self.initialize_member(def, block, values, pending, target.clone())?;
                i += 1;
                if i > c {
                    c = i;
                }

                let (has_next, is_designator) = self.has_next_array_element(state);
                if !has_next {
                    break;
                }
                if !is_designator && count > 0 && c >= count {
                    break;
                }
                self.expect(TokenType::Comma, "array initializer")?;
            }
        }

        if array_type.size_of() == 0 {
            debug_assert!(self.symbols.get(sym).ty.is_array());
            debug_assert_eq!(self.symbols.get(sym).ty.size_of(), 0);
            self.symbols.set_array_length(sym, c);
            debug!(
                "completed array '{}' to {} elements",
                self.symbols.get(sym).name,
                c
            );
        }

        Ok(())
    }

    /// Parse `[ constant-expression ]`, storing the index on success
    fn try_parse_index(&mut self, index: &mut u64) -> Result<bool, CompilerError> {
        if !self.check(&TokenType::LeftBracket) {
            return Ok(false);
        }
        let location = self.current_location();
        self.advance();
        let num = self.constant_expression()?;
        if !num.ty.is_integer() {
            return Err(ParseError::NonIntegerArrayIndex { location }.into());
        }
        match num.int_value() {
            Some(value) if value >= 0 => *index = value as u64,
            _ => return Err(ParseError::NonIntegerArrayIndex { location }.into()),
        }
        self.expect(TokenType::RightBracket, "array designator")?;
        Ok(true)
    }

    /// Consume `,` and continue iff another element follows at this level
    ///
    /// A `.` designator after the comma belongs to the current level only
    /// in `Current` state; otherwise the outer level reinterprets it.
    fn next_element(&mut self, state: ObjectState) -> bool {
        if !self.check(&TokenType::Comma) {
            return false;
        }
        match self.peek_nth_type(1) {
            Some(TokenType::RightBrace) => false,
            Some(TokenType::Dot) if state != ObjectState::Current => false,
            Some(_) => {
                self.advance();
                true
            }
            None => false,
        }
    }

    /// Like `next_element` for arrays, detecting `[` designators; does
    /// not consume the comma
    fn has_next_array_element(&mut self, state: ObjectState) -> (bool, bool) {
        if !self.check(&TokenType::Comma) {
            return (false, false);
        }
        match self.peek_nth_type(1) {
            Some(TokenType::RightBrace) | Some(TokenType::Dot) => (false, false),
            Some(TokenType::LeftBracket) => {
                if state == ObjectState::Current {
                    (true, true)
                } else {
                    (false, false)
                }
            }
            Some(_) => (true, false),
            None => (false, false),
        }
    }

    /// Read one assignment expression as an initializer element
    ///
    /// Elements of static-storage objects must be load-time computable.
    /// For automatic storage, call results are spilled to a temporary, so
    /// reordering the buffered assignments cannot change the order of
    /// observable side effects.
    fn read_initializer_element(
        &mut self,
        def: &mut Definition,
        block: &mut Block,
        sym: SymbolId,
    ) -> Result<Expression, CompilerError> {
        let location = self.current_location();
        let ops = block.code.len();
        let expr = self.assignment_expression(def, block)?;

        if expr.ty.is_void() {
            return Err(ParseError::VoidInitializer { location }.into());
        }

        if self.symbols.get(sym).linkage != Linkage::None {
            if block.code.len() > ops || !is_loadtime_constant(&expr, &self.symbols) {
                return Err(ParseError::NonLoadtimeConstant { location }.into());
            }
        } else if expr.is_call() {
            let tmp = self.create_temp(def, expr.ty.clone());
            let tmp = eval_assign(block, tmp, expr);
            return Ok(Expression::identity(tmp));
        }

        Ok(expr)
    }

    /// Replace the unordered values buffer with a sorted, padded list
    fn postprocess_object_initialization(
        &mut self,
        mut values: Block,
        target: Var,
    ) -> Result<Block, CompilerError> {
        debug_assert_eq!(target.offset, 0);

        sort_and_trim(&mut values.code);
        let total_size = target.ty.size_of();
        let code = std::mem::take(&mut values.code);
        self.release_block(values);

        let mut block = self.acquire_block();
        match fill_initializer_padding(&mut block, code, target, total_size) {
            Ok(()) => {
                #[cfg(debug_assertions)]
                validate_initializer_block(&block);
                debug!("lowered initializer: {} assignments", block.code.len());
                Ok(block)
            }
            Err(err) => {
                self.release_block(block);
                Err(err)
            }
        }
    }
}

/// Reorder initializer assignments to increasing offsets, dropping
/// duplicate assignments to the same element (the later one wins, as a
/// designator re-initializing an element overwrites it)
fn sort_and_trim(code: &mut Vec<Statement>) {
    let mut i = 1;
    while i < code.len() {
        let mut j = i - 1;
        loop {
            if code[j].target().offset > code[j + 1].target().offset {
                code.swap(j, j + 1);
                if j == 0 {
                    break;
                }
                j -= 1;
            } else {
                break;
            }
        }

        let (a, b) = (code[j].target(), code[j + 1].target());
        if a.offset == b.offset && a.field_offset == b.field_offset {
            debug_assert_eq!(a.field_width, b.field_width);
            code.remove(j);
        } else {
            i += 1;
        }
    }
}

/// Emit entries in order, interpolating zero writes for padding gaps
///
/// The cursor tracks the first location not yet initialized. A run of
/// bit-fields accumulates the unit size as the largest leaf type seen;
/// crossing the end of the unit advances the byte cursor.
fn fill_initializer_padding(
    block: &mut Block,
    code: Vec<Statement>,
    mut target: Var,
    total_size: u64,
) -> Result<(), CompilerError> {
    let mut bitfield_size: u64 = 0;

    for (i, st) in code.into_iter().enumerate() {
        let field = st.target().clone();
        if i == 0 {
            target.ty = field.ty.clone();
        }

        debug_assert!(!st.value().is_call());
        debug_assert!(target.offset <= field.offset);

        initialize_padding(block, target.clone(), &field)?;
        block.code.push(st);

        target.ty = field.ty.clone();
        target.offset = field.offset;
        if field.field_width > 0 {
            if field.ty.size_of() > bitfield_size {
                bitfield_size = field.ty.size_of();
            }
            target.field_offset = field.field_offset + field.field_width;
            target.field_width = 0;
            if u64::from(target.field_offset) == bitfield_size * 8 {
                target.field_offset = 0;
                target.offset += bitfield_size;
            }
        } else {
            target.field_offset = 0;
            target.field_width = 0;
            target.offset += field.ty.size_of();
            bitfield_size = 0;
        }
    }

    initialize_trailing_padding(block, target, total_size, bitfield_size)
}

/// Zero the gap between the cursor and the next field assignment
///
/// A partially filled bit-field unit is closed first by zeroing its
/// remaining bits; byte padding follows. Within one unit, the gap
/// between two bit-fields becomes a zero write of the missing width.
fn initialize_padding(block: &mut Block, mut target: Var, field: &Var) -> Result<(), CompilerError> {
    if target.offset < field.offset {
        if target.field_offset > 0 {
            let bits = (target.ty.size_of() * 8) as u32;
            target.field_width = bits - target.field_offset;
            zero_initialize(block, target.clone())?;
            target.offset += target.ty.size_of();
            target.field_offset = 0;
            target.field_width = 0;
        }

        let padding = field.offset - target.offset;
        zero_initialize_bytes(block, target, padding)?;
    } else if target.field_offset < field.field_offset {
        target.field_width = field.field_offset - target.field_offset;
        zero_initialize(block, target)?;
    }

    Ok(())
}

/// Zero everything from the cursor to the end of the object
///
/// Closes the last bit-field unit if one is open, then pads bytes.
fn initialize_trailing_padding(
    block: &mut Block,
    mut target: Var,
    size: u64,
    bitfield_size: u64,
) -> Result<(), CompilerError> {
    debug_assert!(size >= target.offset);

    if target.field_offset > 0 {
        target.ty = match bitfield_size {
            1 => Type::Char,
            2 => Type::Short,
            4 => Type::Int,
            _ => {
                debug_assert_eq!(bitfield_size, 8);
                Type::Long
            }
        };
        target.field_width = (bitfield_size * 8) as u32 - target.field_offset;
        debug_assert!(target.field_width > 0);
        zero_initialize(block, target.clone())?;
        target.offset += target.ty.size_of();
        target.field_offset = 0;
        target.field_width = 0;
    }

    debug_assert!(size >= target.offset);
    if size > target.offset {
        let bytes = size - target.offset;
        zero_initialize_bytes(block, target, bytes)?;
    }

    Ok(())
}

/// Write zero into the whole of `target` using simple assignments
///
/// Aggregates are re-typed as arrays of the widest dividing integer and
/// zeroed per element; scalar leaves take an immediate zero. Bit-field
/// windows on the target are preserved.
fn zero_initialize(values: &mut Block, mut target: Var) -> Result<(), CompilerError> {
    debug_assert!(target.is_direct());
    let size = target.ty.size_of();

    match &target.ty {
        Type::Struct { .. } | Type::Union { .. } => {
            debug_assert!(size > 0);
            target.ty = if size % 8 != 0 {
                Type::array_of(Type::Char, size)
            } else {
                Type::array_of(Type::Long, size / 8)
            };
            zero_initialize(values, target)
        }
        Type::Array { .. } => {
            let elem = match target.ty.element_type() {
                Some(elem) => elem.clone(),
                None => {
                    return Err(CompilerError::InternalError {
                        message: "array type without element".to_string(),
                    })
                }
            };
            let elem_size = elem.size_of();
            if elem_size == 0 {
                return Err(ParseError::UnsupportedZeroInit {
                    type_name: target.ty.to_string(),
                }
                .into());
            }
            let base = target.offset;
            let count = size / elem_size;
            target.ty = elem;
            for i in 0..count {
                target.offset = base + i * elem_size;
                zero_initialize(values, target.clone())?;
            }
            Ok(())
        }
        ty if ty.is_scalar() => {
            let zero = Expression::identity(Var::immediate_zero(target.ty.clone()));
            eval_assign(values, target, zero);
            Ok(())
        }
        ty => Err(ParseError::UnsupportedZeroInit {
            type_name: ty.to_string(),
        }
        .into()),
    }
}

/// Zero a byte range with the widest writes that divide it
///
/// The remainder modulo 8 is emitted first (split into single bytes when
/// it is not a power-of-two write size), then 8-byte strides.
fn zero_initialize_bytes(
    values: &mut Block,
    mut target: Var,
    mut bytes: u64,
) -> Result<(), CompilerError> {
    target.field_offset = 0;
    target.field_width = 0;

    while bytes > 0 {
        let mut size = bytes % 8;
        if size == 0 {
            size = 8;
        }
        debug_assert!(size <= bytes);

        target.ty = match size {
            2 => Type::Short,
            4 => Type::Int,
            8 => Type::Long,
            _ => {
                size = 1;
                Type::Char
            }
        };

        zero_initialize(values, target.clone())?;
        target.offset += size;
        bytes -= size;
    }

    Ok(())
}

/// Every offset is covered exactly once, in order, with bit-field runs
/// chaining contiguously
#[cfg(debug_assertions)]
fn validate_initializer_block(block: &Block) {
    let mut prev: Option<Var> = None;

    for st in &block.code {
        let field = st.target();
        match &prev {
            None => {
                assert_eq!(field.offset, 0);
                assert_eq!(field.field_offset, 0);
            }
            Some(prev) => {
                assert!(prev.offset <= field.offset);
                if prev.offset < field.offset {
                    assert_eq!(field.offset - prev.offset, prev.ty.size_of());
                } else {
                    assert_eq!(prev.field_offset + prev.field_width, field.field_offset);
                }
            }
        }
        prev = Some(field.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{struct_type, MemberDecl};
    use occ_common::SourceLocation;

    fn assign(offset: u64, field_offset: u32, field_width: u32, value: i64) -> Statement {
        let mut target = Var::direct(0, Type::Int);
        target.offset = offset;
        target.field_offset = field_offset;
        target.field_width = field_width;
        Statement::Assign {
            target,
            value: Expression::identity(Var::int_immediate(value, Type::Int)),
        }
    }

    fn offsets(code: &[Statement]) -> Vec<u64> {
        code.iter().map(|st| st.target().offset).collect()
    }

    #[test]
    fn test_sort_orders_by_offset() {
        let mut code = vec![assign(8, 0, 0, 3), assign(0, 0, 0, 1), assign(4, 0, 0, 2)];
        sort_and_trim(&mut code);

        assert_eq!(offsets(&code), vec![0, 4, 8]);
    }

    #[test]
    fn test_sort_is_stable_for_bitfield_runs() {
        let mut code = vec![
            assign(4, 0, 0, 3),
            assign(0, 0, 3, 1),
            assign(0, 3, 5, 2),
        ];
        sort_and_trim(&mut code);

        assert_eq!(offsets(&code), vec![0, 0, 4]);
        assert_eq!(code[0].target().field_offset, 0);
        assert_eq!(code[1].target().field_offset, 3);
    }

    #[test]
    fn test_trim_drops_shadowed_duplicate() {
        let mut code = vec![assign(0, 0, 0, 1), assign(4, 0, 0, 2), assign(0, 0, 0, 9)];
        sort_and_trim(&mut code);

        assert_eq!(code.len(), 2);
        let survivor = code[0].value().as_identity().and_then(|v| v.int_value());
        assert_eq!(survivor, Some(9));
    }

    #[test]
    fn test_zero_bytes_emits_remainder_then_strides() {
        let mut block = Block::new();
        let target = Var::direct(0, Type::Char);
        zero_initialize_bytes(&mut block, target, 11).unwrap();

        let shapes: Vec<(u64, Type)> = block
            .code
            .iter()
            .map(|st| (st.target().offset, st.target().ty.clone()))
            .collect();
        assert_eq!(
            shapes,
            vec![(0, Type::Char), (1, Type::Short), (3, Type::Long)]
        );
    }

    #[test]
    fn test_zero_bytes_power_of_two_sizes() {
        let mut block = Block::new();
        zero_initialize_bytes(&mut block, Var::direct(0, Type::Char), 12).unwrap();

        let shapes: Vec<Type> = block.code.iter().map(|st| st.target().ty.clone()).collect();
        assert_eq!(shapes, vec![Type::Int, Type::Long]);
    }

    #[test]
    fn test_zero_struct_as_long_array() {
        let ty = struct_type(
            None,
            vec![
                MemberDecl::named("a", Type::Long),
                MemberDecl::named("b", Type::Long),
            ],
            SourceLocation::dummy(),
        )
        .unwrap();

        let mut block = Block::new();
        zero_initialize(&mut block, Var::direct(0, ty)).unwrap();

        assert_eq!(block.code.len(), 2);
        assert_eq!(block.code[0].target().ty, Type::Long);
        assert_eq!(offsets(&block.code), vec![0, 8]);
    }

    #[test]
    fn test_zero_struct_of_odd_size_as_char_array() {
        let ty = struct_type(
            None,
            vec![
                MemberDecl::named("a", Type::Char),
                MemberDecl::named("b", Type::Char),
                MemberDecl::named("c", Type::Char),
            ],
            SourceLocation::dummy(),
        )
        .unwrap();

        let mut block = Block::new();
        zero_initialize(&mut block, Var::direct(0, ty)).unwrap();

        assert_eq!(block.code.len(), 3);
        assert!(block.code.iter().all(|st| st.target().ty == Type::Char));
    }

    #[test]
    fn test_zero_preserves_bitfield_window() {
        let mut block = Block::new();
        let mut target = Var::direct(0, Type::Int);
        target.field_offset = 3;
        target.field_width = 5;
        zero_initialize(&mut block, target).unwrap();

        let written = block.code[0].target();
        assert_eq!((written.field_offset, written.field_width), (3, 5));
    }

    #[test]
    fn test_zero_function_type_rejected() {
        let ty = Type::Function {
            return_type: Box::new(Type::Int),
            parameters: vec![],
        };
        let mut block = Block::new();
        assert!(zero_initialize(&mut block, Var::direct(0, ty)).is_err());
    }
}
