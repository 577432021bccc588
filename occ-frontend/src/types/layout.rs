//! Struct and union layout calculation
//!
//! Computes member offsets, bit-field packing and total sizes. Bit-field
//! runs pack into a storage unit whose size is the largest declared type
//! in the run; anonymous struct/union members are flattened into the
//! parent member list so that siblings can share storage offsets.

use crate::types::{Member, Type};
use occ_common::{CompilerError, SourceLocation};

/// A declared member, before layout
#[derive(Debug, Clone)]
pub struct MemberDecl {
    pub name: String,
    pub member_type: Type,
    pub field_width: Option<u32>,
}

impl MemberDecl {
    pub fn named(name: &str, member_type: Type) -> Self {
        Self {
            name: name.to_string(),
            member_type,
            field_width: None,
        }
    }

    pub fn bit_field(name: &str, member_type: Type, width: u32) -> Self {
        Self {
            name: name.to_string(),
            member_type,
            field_width: Some(width),
        }
    }

    /// Anonymous struct/union member; its members are spliced into the parent
    pub fn anonymous(member_type: Type) -> Self {
        Self {
            name: String::new(),
            member_type,
            field_width: None,
        }
    }

    fn is_anonymous_aggregate(&self) -> bool {
        self.name.is_empty() && self.field_width.is_none() && self.member_type.is_struct_or_union()
    }
}

/// An open run of adjacent bit-fields
struct BitRun {
    start: u64,
    bits: u32,
    unit: u64,
}

fn round_up(value: u64, align: u64) -> u64 {
    debug_assert!(align > 0);
    value.div_ceil(align) * align
}

fn close_run(run: &mut Option<BitRun>, offset: &mut u64) {
    if let Some(r) = run.take() {
        *offset = r.start + r.unit;
    }
}

/// Calculate the layout of a struct type
pub fn struct_type(
    tag: Option<&str>,
    decls: Vec<MemberDecl>,
    location: SourceLocation,
) -> Result<Type, CompilerError> {
    let mut members = Vec::new();
    let mut offset: u64 = 0;
    let mut align: u64 = 1;
    let mut run: Option<BitRun> = None;

    for decl in decls {
        if decl.is_anonymous_aggregate() {
            close_run(&mut run, &mut offset);
            let sub_align = decl.member_type.alignment();
            offset = round_up(offset, sub_align);
            align = align.max(sub_align);
            for m in decl.member_type.members() {
                members.push(Member {
                    name: m.name.clone(),
                    member_type: m.member_type.clone(),
                    offset: offset + m.offset,
                    field_offset: m.field_offset,
                    field_width: m.field_width,
                });
            }
            offset += decl.member_type.size_of();
        } else if let Some(width) = decl.field_width {
            if !decl.member_type.is_integer() {
                return Err(CompilerError::semantic_error(
                    format!("Bit-field '{}' has non-integer type", decl.name),
                    location,
                ));
            }
            let unit = decl.member_type.size_of();
            let unit_bits = (unit * 8) as u32;
            if width > unit_bits {
                return Err(CompilerError::semantic_error(
                    format!("Width of bit-field '{}' exceeds its type", decl.name),
                    location,
                ));
            }
            if width == 0 {
                // Unnamed zero-width field forces the next member into a
                // new storage unit
                close_run(&mut run, &mut offset);
                continue;
            }
            align = align.max(decl.member_type.alignment());
            let needs_new_run = match &mut run {
                Some(r) => {
                    r.unit = r.unit.max(unit);
                    r.bits + width > (r.unit * 8) as u32
                }
                None => true,
            };
            if needs_new_run {
                close_run(&mut run, &mut offset);
                offset = round_up(offset, decl.member_type.alignment());
                run = Some(BitRun {
                    start: offset,
                    bits: 0,
                    unit,
                });
            }
            let r = run.as_mut().ok_or_else(|| CompilerError::InternalError {
                message: "bit-field run not open".to_string(),
            })?;
            members.push(Member {
                name: decl.name,
                member_type: decl.member_type,
                offset: r.start,
                field_offset: r.bits,
                field_width: width,
            });
            r.bits += width;
        } else {
            close_run(&mut run, &mut offset);
            let size = decl.member_type.size_of();
            if size == 0 {
                return Err(CompilerError::semantic_error(
                    format!("Member '{}' has incomplete type", decl.name),
                    location,
                ));
            }
            let member_align = decl.member_type.alignment();
            offset = round_up(offset, member_align);
            align = align.max(member_align);
            members.push(Member {
                name: decl.name,
                member_type: decl.member_type,
                offset,
                field_offset: 0,
                field_width: 0,
            });
            offset += size;
        }
    }

    close_run(&mut run, &mut offset);
    let size = round_up(offset, align);

    Ok(Type::Struct {
        tag: tag.map(|t| t.to_string()),
        members,
        size,
        align,
    })
}

/// Calculate the layout of a union type
pub fn union_type(
    tag: Option<&str>,
    decls: Vec<MemberDecl>,
    location: SourceLocation,
) -> Result<Type, CompilerError> {
    let mut members = Vec::new();
    let mut size: u64 = 0;
    let mut align: u64 = 1;

    for decl in decls {
        if decl.is_anonymous_aggregate() {
            align = align.max(decl.member_type.alignment());
            size = size.max(decl.member_type.size_of());
            for m in decl.member_type.members() {
                members.push(m.clone());
            }
        } else if let Some(width) = decl.field_width {
            if !decl.member_type.is_integer() {
                return Err(CompilerError::semantic_error(
                    format!("Bit-field '{}' has non-integer type", decl.name),
                    location,
                ));
            }
            let unit = decl.member_type.size_of();
            if width > (unit * 8) as u32 {
                return Err(CompilerError::semantic_error(
                    format!("Width of bit-field '{}' exceeds its type", decl.name),
                    location,
                ));
            }
            align = align.max(decl.member_type.alignment());
            size = size.max(unit);
            members.push(Member {
                name: decl.name,
                member_type: decl.member_type,
                offset: 0,
                field_offset: 0,
                field_width: width,
            });
        } else {
            let member_size = decl.member_type.size_of();
            if member_size == 0 {
                return Err(CompilerError::semantic_error(
                    format!("Member '{}' has incomplete type", decl.name),
                    location,
                ));
            }
            align = align.max(decl.member_type.alignment());
            size = size.max(member_size);
            members.push(Member {
                name: decl.name,
                member_type: decl.member_type,
                offset: 0,
                field_offset: 0,
                field_width: 0,
            });
        }
    }

    let size = round_up(size, align);

    Ok(Type::Union {
        tag: tag.map(|t| t.to_string()),
        members,
        size,
        align,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::dummy()
    }

    #[test]
    fn test_simple_struct_layout() {
        let ty = struct_type(
            None,
            vec![
                MemberDecl::named("x", Type::Int),
                MemberDecl::named("y", Type::Int),
                MemberDecl::named("z", Type::Long),
            ],
            loc(),
        )
        .expect("Should calculate layout");

        assert_eq!(ty.size_of(), 16); // 4 + 4 + 8
        assert_eq!(ty.alignment(), 8);

        let members = ty.members();
        assert_eq!(members[0].offset, 0);
        assert_eq!(members[1].offset, 4);
        assert_eq!(members[2].offset, 8);
    }

    #[test]
    fn test_struct_padding_between_members() {
        let ty = struct_type(
            None,
            vec![
                MemberDecl::named("c", Type::Char),
                MemberDecl::named("n", Type::Int),
            ],
            loc(),
        )
        .expect("Should calculate layout");

        assert_eq!(ty.size_of(), 8); // char, 3 pad, int
        let members = ty.members();
        assert_eq!(members[0].offset, 0);
        assert_eq!(members[1].offset, 4);
    }

    #[test]
    fn test_trailing_padding() {
        let ty = struct_type(
            None,
            vec![
                MemberDecl::named("n", Type::Long),
                MemberDecl::named("c", Type::Char),
            ],
            loc(),
        )
        .expect("Should calculate layout");

        assert_eq!(ty.size_of(), 16); // 8 + 1 + 7 pad
    }

    #[test]
    fn test_bit_field_run() {
        let ty = struct_type(
            None,
            vec![
                MemberDecl::bit_field("a", Type::Int, 3),
                MemberDecl::bit_field("b", Type::Int, 5),
                MemberDecl::named("c", Type::Int),
            ],
            loc(),
        )
        .expect("Should calculate layout");

        assert_eq!(ty.size_of(), 8);
        let members = ty.members();
        assert_eq!((members[0].offset, members[0].field_offset), (0, 0));
        assert_eq!(members[0].field_width, 3);
        assert_eq!((members[1].offset, members[1].field_offset), (0, 3));
        assert_eq!(members[1].field_width, 5);
        assert_eq!((members[2].offset, members[2].field_offset), (4, 0));
        assert_eq!(members[2].field_width, 0);
    }

    #[test]
    fn test_bit_field_overflow_starts_new_unit() {
        let ty = struct_type(
            None,
            vec![
                MemberDecl::bit_field("a", Type::Int, 30),
                MemberDecl::bit_field("b", Type::Int, 5),
            ],
            loc(),
        )
        .expect("Should calculate layout");

        assert_eq!(ty.size_of(), 8);
        let members = ty.members();
        assert_eq!(members[0].offset, 0);
        assert_eq!(members[1].offset, 4);
        assert_eq!(members[1].field_offset, 0);
    }

    #[test]
    fn test_zero_width_field_closes_unit() {
        let ty = struct_type(
            None,
            vec![
                MemberDecl::bit_field("a", Type::Int, 3),
                MemberDecl::bit_field("", Type::Int, 0),
                MemberDecl::bit_field("b", Type::Int, 5),
            ],
            loc(),
        )
        .expect("Should calculate layout");

        let members = ty.members();
        assert_eq!(members[0].offset, 0);
        assert_eq!(members[1].offset, 4);
        assert_eq!(members[1].field_offset, 0);
    }

    #[test]
    fn test_anonymous_union_members_share_offset() {
        let inner = union_type(
            None,
            vec![
                MemberDecl::named("i", Type::Int),
                MemberDecl::named("f", Type::Float),
            ],
            loc(),
        )
        .unwrap();

        let ty = struct_type(
            None,
            vec![
                MemberDecl::named("tag", Type::Int),
                MemberDecl::anonymous(inner),
            ],
            loc(),
        )
        .expect("Should calculate layout");

        assert_eq!(ty.size_of(), 8);
        let members = ty.members();
        assert_eq!(members.len(), 3);
        assert_eq!(members[1].name, "i");
        assert_eq!(members[1].offset, 4);
        assert_eq!(members[2].name, "f");
        assert_eq!(members[2].offset, 4);
    }

    #[test]
    fn test_union_layout() {
        let ty = union_type(
            None,
            vec![
                MemberDecl::named("c", Type::Char),
                MemberDecl::named("n", Type::Long),
            ],
            loc(),
        )
        .expect("Should calculate layout");

        assert_eq!(ty.size_of(), 8);
        assert_eq!(ty.members()[0].offset, 0);
        assert_eq!(ty.members()[1].offset, 0);
    }

    #[test]
    fn test_incomplete_member_rejected() {
        let result = struct_type(
            None,
            vec![MemberDecl::named("bad", Type::Void)],
            loc(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_find_member() {
        let ty = struct_type(
            None,
            vec![
                MemberDecl::named("x", Type::Int),
                MemberDecl::named("y", Type::Int),
            ],
            loc(),
        )
        .unwrap();

        let (index, member) = ty.find_member("y").expect("Should find member y");
        assert_eq!(index, 1);
        assert_eq!(member.offset, 4);
        assert!(ty.find_member("z").is_none());
    }
}
