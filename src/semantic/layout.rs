//! Aggregate layout: `layout_union_members` and `layout_struct_members`,
//! including bit-field packing and `#pragma pack` alignment capping.

use crate::ast::{MemberDecl, TypeName};
use crate::symtable::AggregateMember;
use crate::types::Type;

pub(super) fn ast_type_to_type(tn: &TypeName) -> Type {
    if tn.pointer_depth > 0 {
        let mut inner = tn.clone();
        inner.pointer_depth -= 1;
        let mut elem = ast_type_to_type(&inner);
        elem.is_const = tn.is_const;
        elem.is_volatile = tn.is_volatile;
        return Type::pointer_to(elem);
    }
    match tn.array_len {
        Some(n) => {
            let mut inner = tn.clone();
            inner.array_len = None;
            Type::array_of(ast_type_to_type(&inner), Some(n))
        }
        None => {
            let mut t = Type::new(tn.kind);
            t.tag = tn.tag.clone();
            t.is_const = tn.is_const;
            t.is_volatile = tn.is_volatile;
            t
        }
    }
}

fn member_elem_size(tn: &TypeName, ptr_size: u32) -> u32 {
    if tn.pointer_depth > 0 {
        return ptr_size;
    }
    match tn.array_len {
        Some(0) => 0,
        Some(n) => tn.kind.size_of() * n as u32,
        None => tn.kind.size_of(),
    }
}

fn member_alignment(tn: &TypeName, ptr_size: u32, pack_alignment: Option<u32>) -> u32 {
    let natural = if tn.pointer_depth > 0 { ptr_size } else { tn.kind.alignment() };
    match pack_alignment {
        Some(cap) => natural.min(cap),
        None => natural,
    }
}

/// All members at offset 0; total size is the largest member.
pub fn layout_union_members(members: &[MemberDecl], ptr_size: u32) -> (Vec<AggregateMember>, u64) {
    let mut out = Vec::new();
    let mut max_size = 0u32;
    for m in members {
        let elem_size = member_elem_size(&m.type_name, ptr_size);
        max_size = max_size.max(elem_size);
        out.push(AggregateMember {
            name: m.name.clone(),
            ty: ast_type_to_type(&m.type_name),
            elem_size,
            offset: 0,
            bit_width: None,
            bit_offset: None,
            is_flexible: false,
        });
    }
    (out, max_size as u64)
}

/// Walks members in declaration order, packing bit-fields and aligning
/// ordinary members to `min(elem_size, pack_alignment)`.
pub fn layout_struct_members(members: &[MemberDecl], pack_alignment: Option<u32>, ptr_size: u32) -> (Vec<AggregateMember>, u64) {
    let mut out = Vec::new();
    let mut byte_offset: u32 = 0;
    let mut bit_cursor: u32 = 0;
    let mut bitfield_unit_size: u32 = 0;
    let mut in_bitfield_run = false;

    let flush_bitfield_run = |byte_offset: &mut u32, bit_cursor: &mut u32, in_run: &mut bool, unit_size: u32| {
        if *in_run {
            let bits_used = *bit_cursor;
            let bytes_used = bits_used.div_ceil(8).max(1).min(unit_size.max(1));
            *byte_offset += bytes_used;
            *bit_cursor = 0;
            *in_run = false;
        }
    };

    for m in members {
        if let Some(width_expr) = &m.bit_width {
            let width = crate::consteval::eval_const_ast(width_expr).unwrap_or(0).max(0) as u32;
            let unit_size = member_elem_size(&m.type_name, ptr_size).max(1);
            if width == 0 {
                flush_bitfield_run(&mut byte_offset, &mut bit_cursor, &mut in_bitfield_run, bitfield_unit_size);
                continue;
            }
            if !in_bitfield_run || bit_cursor + width > unit_size * 8 {
                flush_bitfield_run(&mut byte_offset, &mut bit_cursor, &mut in_bitfield_run, bitfield_unit_size);
                in_bitfield_run = true;
                bitfield_unit_size = unit_size;
            }
            out.push(AggregateMember {
                name: m.name.clone(),
                ty: ast_type_to_type(&m.type_name),
                elem_size: unit_size,
                offset: byte_offset,
                bit_width: Some(width),
                bit_offset: Some(bit_cursor),
                is_flexible: false,
            });
            bit_cursor += width;
        } else {
            flush_bitfield_run(&mut byte_offset, &mut bit_cursor, &mut in_bitfield_run, bitfield_unit_size);
            let is_flexible = m.type_name.array_len == Some(0);
            let elem_size = member_elem_size(&m.type_name, ptr_size);
            let align = member_alignment(&m.type_name, ptr_size, pack_alignment).max(1);
            byte_offset = byte_offset.div_ceil(align) * align;
            out.push(AggregateMember {
                name: m.name.clone(),
                ty: ast_type_to_type(&m.type_name),
                elem_size,
                offset: byte_offset,
                bit_width: None,
                bit_offset: None,
                is_flexible,
            });
            if !is_flexible {
                byte_offset += elem_size;
            }
        }
    }
    flush_bitfield_run(&mut byte_offset, &mut bit_cursor, &mut in_bitfield_run, bitfield_unit_size);

    let total = if let Some(cap) = pack_alignment {
        (byte_offset as u64).div_ceil(cap as u64) * cap as u64
    } else {
        byte_offset as u64
    };
    (out, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeName;
    use crate::types::TypeKind;

    fn member(name: &str, kind: TypeKind) -> MemberDecl {
        MemberDecl {
            name: name.to_string(),
            type_name: TypeName::simple(kind),
            bit_width: None,
        }
    }

    #[test]
    fn union_members_all_share_offset_zero() {
        let members = vec![member("a", TypeKind::Char), member("b", TypeKind::Long)];
        let (laid, size) = layout_union_members(&members, 8);
        assert!(laid.iter().all(|m| m.offset == 0));
        assert_eq!(size, 8);
    }

    #[test]
    fn struct_members_align_to_natural_boundaries() {
        let members = vec![member("a", TypeKind::Char), member("b", TypeKind::Int)];
        let (laid, size) = layout_struct_members(&members, None, 8);
        assert_eq!(laid[0].offset, 0);
        assert_eq!(laid[1].offset, 4);
        assert_eq!(size, 8);
    }

    #[test]
    fn pack_one_removes_padding() {
        let members = vec![member("a", TypeKind::Char), member("b", TypeKind::Int)];
        let (laid, size) = layout_struct_members(&members, Some(1), 8);
        assert_eq!(laid[1].offset, 1);
        assert_eq!(size, 5);
    }

    #[test]
    fn flexible_array_member_does_not_advance_offset() {
        let mut arr = member("tail", TypeKind::Int);
        arr.type_name.array_len = Some(0);
        let members = vec![member("len", TypeKind::Int), arr];
        let (laid, size) = layout_struct_members(&members, None, 8);
        assert!(laid[1].is_flexible);
        assert_eq!(laid[1].offset, 4);
        assert_eq!(size, 4);
    }
}
