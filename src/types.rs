//! Type system for the C subset: the `Type` tree, integer/float closed
//! categories, and the conversion rules used by the semantic analyzer.

use std::fmt;

/// A type kind, covering every C99+GNU scalar and aggregate category named
/// in the data model plus `UNKNOWN` for error recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LLong,
    ULLong,
    Bool,
    Float,
    Double,
    LDouble,
    FloatComplex,
    DoubleComplex,
    LDoubleComplex,
    Ptr,
    Array,
    Struct,
    Union,
    Enum,
    Unknown,
}

impl TypeKind {
    /// Closed integer category: every type counted as "int-like" for the
    /// purposes of binary-op and assignment conformance.
    pub fn is_intlike(self) -> bool {
        matches!(
            self,
            TypeKind::Char
                | TypeKind::UChar
                | TypeKind::Short
                | TypeKind::UShort
                | TypeKind::Int
                | TypeKind::UInt
                | TypeKind::Long
                | TypeKind::ULong
                | TypeKind::LLong
                | TypeKind::ULLong
                | TypeKind::Bool
                | TypeKind::Enum
        )
    }

    pub fn is_floatlike(self) -> bool {
        matches!(self, TypeKind::Float | TypeKind::Double | TypeKind::LDouble)
    }

    pub fn is_complex(self) -> bool {
        matches!(
            self,
            TypeKind::FloatComplex | TypeKind::DoubleComplex | TypeKind::LDoubleComplex
        )
    }

    pub fn is_pointerlike(self) -> bool {
        matches!(self, TypeKind::Ptr | TypeKind::Array)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            TypeKind::UChar | TypeKind::UShort | TypeKind::UInt | TypeKind::ULong | TypeKind::ULLong
        )
    }

    /// True for `LONG`/`ULONG`/`LLONG`/`ULLONG`: operands of this rank force
    /// 64-bit widening of the other side in a binary op.
    pub fn is_wide_int(self) -> bool {
        matches!(self, TypeKind::Long | TypeKind::ULong | TypeKind::LLong | TypeKind::ULLong)
    }

    /// Size in bytes on the x86-64 target (the only target `vc`'s semantic
    /// layer is asked to reason about; see `SemanticConfig::x86_64`).
    pub fn size_of(self) -> u32 {
        match self {
            TypeKind::Void => 0,
            TypeKind::Char | TypeKind::UChar | TypeKind::Bool => 1,
            TypeKind::Short | TypeKind::UShort => 2,
            TypeKind::Int | TypeKind::UInt | TypeKind::FloatComplex => 4,
            TypeKind::Float => 4,
            TypeKind::Long
            | TypeKind::ULong
            | TypeKind::LLong
            | TypeKind::ULLong
            | TypeKind::Double
            | TypeKind::DoubleComplex
            | TypeKind::Ptr => 8,
            TypeKind::LDouble | TypeKind::LDoubleComplex => 16,
            TypeKind::Array | TypeKind::Struct | TypeKind::Union | TypeKind::Enum | TypeKind::Unknown => 0,
        }
    }

    pub fn alignment(self) -> u32 {
        match self {
            TypeKind::LDouble | TypeKind::LDoubleComplex => 16,
            _ => self.size_of().max(1),
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeKind::Void => "void",
            TypeKind::Char => "char",
            TypeKind::UChar => "unsigned char",
            TypeKind::Short => "short",
            TypeKind::UShort => "unsigned short",
            TypeKind::Int => "int",
            TypeKind::UInt => "unsigned int",
            TypeKind::Long => "long",
            TypeKind::ULong => "unsigned long",
            TypeKind::LLong => "long long",
            TypeKind::ULLong => "unsigned long long",
            TypeKind::Bool => "_Bool",
            TypeKind::Float => "float",
            TypeKind::Double => "double",
            TypeKind::LDouble => "long double",
            TypeKind::FloatComplex => "float _Complex",
            TypeKind::DoubleComplex => "double _Complex",
            TypeKind::LDoubleComplex => "long double _Complex",
            TypeKind::Ptr => "pointer",
            TypeKind::Array => "array",
            TypeKind::Struct => "struct",
            TypeKind::Union => "union",
            TypeKind::Enum => "enum",
            TypeKind::Unknown => "<unknown>",
        };
        write!(f, "{s}")
    }
}

/// A full type: a `TypeKind` plus the structure needed for pointers,
/// arrays, and tagged aggregates. Child types are owned directly (native
/// Rust ownership, not arena indices) since C types form a DAG of bounded
/// depth that borrows cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    /// For `PTR`/`ARRAY`: the pointee/element type.
    pub elem: Option<Box<Type>>,
    /// For `ARRAY`: constant element count, if known (`None` for an
    /// incomplete/flexible array).
    pub array_len: Option<u64>,
    /// For `STRUCT`/`UNION`/`ENUM`: the tag name, if any (anonymous
    /// aggregates carry `None`).
    pub tag: Option<String>,
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_restrict: bool,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Type {
            kind,
            elem: None,
            array_len: None,
            tag: None,
            is_const: false,
            is_volatile: false,
            is_restrict: false,
        }
    }

    pub fn pointer_to(elem: Type) -> Self {
        Type {
            kind: TypeKind::Ptr,
            elem: Some(Box::new(elem)),
            ..Type::new(TypeKind::Ptr)
        }
    }

    pub fn array_of(elem: Type, len: Option<u64>) -> Self {
        Type {
            kind: TypeKind::Array,
            elem: Some(Box::new(elem)),
            array_len: len,
            ..Type::new(TypeKind::Array)
        }
    }

    pub fn tagged(kind: TypeKind, tag: impl Into<String>) -> Self {
        Type {
            tag: Some(tag.into()),
            ..Type::new(kind)
        }
    }

    pub fn is_intlike(&self) -> bool {
        self.kind.is_intlike()
    }

    pub fn is_floatlike(&self) -> bool {
        self.kind.is_floatlike()
    }

    /// Size in bytes, recursing through arrays (`elem_size * array_len`).
    /// Struct/union sizes are not computable from the type alone (they
    /// depend on the symbol table's layout pass) and return 0 here; callers
    /// needing aggregate size use `Symbol::total_size` instead.
    pub fn size_of(&self) -> u64 {
        match self.kind {
            TypeKind::Array => {
                let elem_size = self.elem.as_ref().map(|e| e.size_of()).unwrap_or(0);
                elem_size * self.array_len.unwrap_or(0)
            }
            _ => self.kind.size_of() as u64,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TypeKind::Ptr => write!(f, "{}*", self.elem.as_deref().cloned().unwrap_or(Type::new(TypeKind::Void))),
            TypeKind::Array => write!(
                f,
                "{}[{}]",
                self.elem.as_deref().cloned().unwrap_or(Type::new(TypeKind::Void)),
                self.array_len.map(|n| n.to_string()).unwrap_or_default()
            ),
            TypeKind::Struct | TypeKind::Union | TypeKind::Enum => {
                write!(f, "{} {}", self.kind, self.tag.as_deref().unwrap_or("<anon>"))
            }
            _ => write!(f, "{}", self.kind),
        }
    }
}

/// Result of checking whether two types may participate in a binary
/// operator or assignment, per §4.4 "Types and conversions".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conformance {
    /// Both sides int-like; use integer ops, widened to 64-bit if either
    /// side is `LONG`/`ULONG`/`LLONG`/`ULLONG`.
    IntInt { widen64: bool },
    /// Both sides float-like; width selects `F*` vs `LF*` ops.
    FloatFloat { wide: bool },
    /// Both sides complex with matching width.
    ComplexComplex,
    /// Pointer (or array-decayed-to-pointer) plus int-like, valid for `+`/`-`.
    PtrInt,
    /// Two pointers, valid only for `-` or comparison.
    PtrPtr,
    /// No valid conformance.
    None,
}

pub fn conforms(lhs: TypeKind, rhs: TypeKind) -> Conformance {
    if lhs.is_intlike() && rhs.is_intlike() {
        return Conformance::IntInt {
            widen64: lhs.is_wide_int() || rhs.is_wide_int(),
        };
    }
    if lhs.is_floatlike() && rhs.is_floatlike() {
        return Conformance::FloatFloat {
            wide: lhs == TypeKind::Double || rhs == TypeKind::Double || lhs == TypeKind::LDouble || rhs == TypeKind::LDouble,
        };
    }
    if lhs.is_complex() && rhs.is_complex() && lhs == rhs {
        return Conformance::ComplexComplex;
    }
    if lhs.is_pointerlike() && rhs.is_intlike() {
        return Conformance::PtrInt;
    }
    if rhs.is_pointerlike() && lhs.is_intlike() {
        return Conformance::PtrInt;
    }
    if lhs.is_pointerlike() && rhs.is_pointerlike() {
        return Conformance::PtrPtr;
    }
    Conformance::None
}

/// Cast validity: any int-like/pointer pair, any int/float/float pair, or
/// matching complex widths. Anything else fails.
pub fn cast_allowed(from: TypeKind, to: TypeKind) -> bool {
    if (from.is_intlike() || from.is_pointerlike()) && (to.is_intlike() || to.is_pointerlike()) {
        return true;
    }
    if (from.is_intlike() || from.is_floatlike()) && (to.is_intlike() || to.is_floatlike()) {
        return true;
    }
    if from.is_complex() && to.is_complex() {
        return from == to;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intlike_categories() {
        assert!(TypeKind::Int.is_intlike());
        assert!(TypeKind::Enum.is_intlike());
        assert!(!TypeKind::Float.is_intlike());
    }

    #[test]
    fn widen64_triggers_on_long() {
        assert_eq!(conforms(TypeKind::Int, TypeKind::Long), Conformance::IntInt { widen64: true });
        assert_eq!(conforms(TypeKind::Int, TypeKind::Int), Conformance::IntInt { widen64: false });
    }

    #[test]
    fn pointer_plus_int_conforms() {
        assert_eq!(conforms(TypeKind::Ptr, TypeKind::Int), Conformance::PtrInt);
    }

    #[test]
    fn cast_between_int_and_pointer_allowed() {
        assert!(cast_allowed(TypeKind::Int, TypeKind::Ptr));
        assert!(!cast_allowed(TypeKind::Struct, TypeKind::Int));
    }

    #[test]
    fn array_size_recurses_through_element() {
        let arr = Type::array_of(Type::new(TypeKind::Int), Some(10));
        assert_eq!(arr.size_of(), 40);
    }
}
