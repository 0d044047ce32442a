//! AST node types: expressions, statements, functions, and initializers.
//!
//! Every node owns its children directly (`Box<Expr>`, `Vec<Stmt>`, ...)
//! rather than indexing into an arena; C's expression/statement trees are
//! small and of bounded depth, so Rust's native ownership model is a
//! straightforward fit without the indirection an arena would add.

use crate::error::SourceLoc;
use crate::types::TypeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Deref,
    Addr,
    Neg,
    Plus,
    BitNot,
    LogNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LogAnd,
    LogOr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

/// A parsed type-name: base kind, tag (for struct/union/enum), pointer
/// depth, and (for `sizeof(T[n])`) a constant array length. Used for cast
/// targets, `sizeof`/`_Alignof` type-forms, `offsetof`'s first argument,
/// and compound-literal element types.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeName {
    pub kind: TypeKind,
    pub tag: Option<String>,
    pub pointer_depth: u32,
    pub array_len: Option<u64>,
    pub is_const: bool,
    pub is_volatile: bool,
}

impl TypeName {
    pub fn simple(kind: TypeKind) -> Self {
        TypeName {
            kind,
            tag: None,
            pointer_depth: 0,
            array_len: None,
            is_const: false,
            is_volatile: false,
        }
    }

    pub fn pointer_to(mut self) -> Self {
        self.pointer_depth += 1;
        self
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }
}

/// Number literal suffix flags, per the data model: "unsigned/long-count
/// suffix" on the lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NumberSuffix {
    pub is_unsigned: bool,
    pub long_count: u8,
    pub is_float: bool,
    pub is_imaginary: bool,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: SourceLoc,
}

impl Expr {
    pub fn new(kind: ExprKind, loc: SourceLoc) -> Self {
        Expr { kind, loc }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Number { lexeme: String, suffix: NumberSuffix },
    CharLit(String),
    StringLit(String),
    Ident(String),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Name-based assignment: `x = ...`.
    AssignName {
        op: AssignOp,
        name: String,
        value: Box<Expr>,
    },
    /// Index-based assignment: `a[i] = ...`.
    AssignIndex {
        op: AssignOp,
        base: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
    },
    /// Member-based assignment: `s.m = ...` or `p->m = ...` (`via_ptr`).
    AssignMember {
        op: AssignOp,
        base: Box<Expr>,
        member: String,
        via_ptr: bool,
        value: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Member {
        base: Box<Expr>,
        member: String,
        via_ptr: bool,
    },
    Cast {
        target: TypeName,
        expr: Box<Expr>,
    },
    SizeofType(TypeName),
    SizeofExpr(Box<Expr>),
    AlignofType(TypeName),
    Offsetof {
        type_name: TypeName,
        member_path: Vec<String>,
    },
    CompoundLiteral {
        type_name: TypeName,
        init: Box<Initializer>,
    },
    Comma {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone)]
pub enum Initializer {
    Expr(Expr),
    List(Vec<Initializer>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageClass {
    pub is_static: bool,
    pub is_extern: bool,
    pub is_register: bool,
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_restrict: bool,
    pub is_typedef: bool,
    pub is_inline: bool,
    pub is_noreturn: bool,
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub type_name: TypeName,
    pub storage: StorageClass,
    pub init: Option<Initializer>,
    /// Present when the array bound is a non-constant expression (VLA).
    pub vla_size: Option<Box<Expr>>,
    pub align: Option<Box<Expr>>,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub value: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum ForInit {
    Decl(VarDecl),
    Expr(Expr),
    None,
}

#[derive(Debug, Clone)]
pub struct MemberDecl {
    pub name: String,
    pub type_name: TypeName,
    pub bit_width: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct AggregateDecl {
    pub tag: Option<String>,
    pub members: Vec<MemberDecl>,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub tag: Option<String>,
    pub constants: Vec<(String, Option<Expr>)>,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone)]
pub struct TypedefDecl {
    pub name: String,
    pub alias: TypeName,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone)]
pub struct StaticAssert {
    pub cond: Expr,
    pub message: String,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: SourceLoc,
}

impl Stmt {
    pub fn new(kind: StmtKind, loc: SourceLoc) -> Self {
        Stmt { kind, loc }
    }
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    ExprStmt(Expr),
    Return(Option<Expr>),
    VarDecl(VarDecl),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: ForInit,
        cond: Option<Expr>,
        post: Option<Expr>,
        body: Box<Stmt>,
    },
    Switch {
        expr: Expr,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Stmt>>,
    },
    Label {
        name: String,
        stmt: Box<Stmt>,
    },
    Goto(String),
    Break,
    Continue,
    Block(Vec<Stmt>),
    EnumDecl(EnumDecl),
    StructDecl(AggregateDecl),
    UnionDecl(AggregateDecl),
    TypedefDecl(TypedefDecl),
    StaticAssert(StaticAssert),
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub type_name: TypeName,
    pub is_restrict: bool,
}

/// `(name, return_type, return_tag, param_names[], param_types[],
/// param_sizes[], param_tags[], param_is_restrict[], param_count,
/// is_variadic, body_stmts[], body_count, is_inline, is_noreturn)`.
///
/// A prototype (no body) and a definition share this type; `body` is
/// empty for a prototype.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub return_type: TypeName,
    pub params: Vec<Param>,
    pub is_variadic: bool,
    pub body: Vec<Stmt>,
    pub is_definition: bool,
    pub is_inline: bool,
    pub is_noreturn: bool,
    pub is_static: bool,
    pub loc: SourceLoc,
}

impl Function {
    pub fn matches_signature(&self, other: &Function) -> bool {
        self.return_type == other.return_type
            && self.is_variadic == other.is_variadic
            && self.params.len() == other.params.len()
            && self.params.iter().zip(&other.params).all(|(a, b)| a.type_name == b.type_name)
    }
}

/// A single top-level item produced by `parser_parse_toplevel`.
#[derive(Debug, Clone)]
pub enum TopLevel {
    Function(Function),
    GlobalVar(VarDecl),
    TypeDecl(Stmt),
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub items: Vec<TopLevel>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.items.iter().find_map(|item| match item {
            TopLevel::Function(f) if f.name == name => Some(f),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_signature_match_ignores_param_names() {
        let f1 = Function {
            name: "f".into(),
            return_type: TypeName::simple(TypeKind::Int),
            params: vec![Param {
                name: "a".into(),
                type_name: TypeName::simple(TypeKind::Int),
                is_restrict: false,
            }],
            is_variadic: false,
            body: vec![],
            is_definition: false,
            is_inline: false,
            is_noreturn: false,
            is_static: false,
            loc: SourceLoc::default(),
        };
        let mut f2 = f1.clone();
        f2.params[0].name = "b".into();
        assert!(f1.matches_signature(&f2));
    }

    #[test]
    fn program_finds_function_by_name() {
        let mut p = Program::new();
        p.items.push(TopLevel::Function(Function {
            name: "main".into(),
            return_type: TypeName::simple(TypeKind::Int),
            params: vec![],
            is_variadic: false,
            body: vec![],
            is_definition: true,
            is_inline: false,
            is_noreturn: false,
            is_static: false,
            loc: SourceLoc::default(),
        }));
        assert!(p.find_function("main").is_some());
        assert!(p.find_function("missing").is_none());
    }
}
