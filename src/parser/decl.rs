//! Declarations: top-level specifiers, function prototypes/definitions,
//! global and local variable declarations, typedefs, structs/unions/enums.

use std::collections::HashSet;

use crate::ast::{
    AggregateDecl, EnumDecl, Function, MemberDecl, Param, StaticAssert, Stmt, StmtKind, StorageClass, TopLevel,
    TypeName, TypedefDecl, VarDecl,
};
use crate::error::CompileError;
use crate::token::TokKind;
use crate::types::TypeKind;

use super::Parser;

thread_local! {
    /// Typedef names seen so far, used to disambiguate a bare identifier as
    /// a type specifier vs. an expression. Thread-local because `Parser`
    /// does not otherwise carry mutable cross-call state besides `pos`; a
    /// single parse run is single-threaded.
    static TYPEDEFS: std::cell::RefCell<HashSet<String>> = std::cell::RefCell::new(HashSet::new());
}

fn register_typedef(name: &str) {
    TYPEDEFS.with(|t| t.borrow_mut().insert(name.to_string()));
}

fn is_typedef_name(name: &str) -> bool {
    TYPEDEFS.with(|t| t.borrow().contains(name))
}

impl<'a> Parser<'a> {
    pub(super) fn at_type_start(&self) -> bool {
        match self.peek_kind() {
            TokKind::KwVoid
            | TokKind::KwChar
            | TokKind::KwShort
            | TokKind::KwInt
            | TokKind::KwLong
            | TokKind::KwFloat
            | TokKind::KwDouble
            | TokKind::KwSigned
            | TokKind::KwUnsigned
            | TokKind::KwBool
            | TokKind::KwComplex
            | TokKind::KwStruct
            | TokKind::KwUnion
            | TokKind::KwEnum
            | TokKind::KwConst
            | TokKind::KwVolatile
            | TokKind::KwRestrict
            | TokKind::KwStatic
            | TokKind::KwExtern
            | TokKind::KwRegister
            | TokKind::KwInline
            | TokKind::KwNoreturn
            | TokKind::KwTypeof => true,
            TokKind::Ident => is_typedef_name(&self.cur().lexeme),
            _ => false,
        }
    }

    fn parse_storage_and_qualifiers(&mut self, storage: &mut StorageClass) {
        loop {
            match self.peek_kind() {
                TokKind::KwStatic => {
                    storage.is_static = true;
                    self.advance();
                }
                TokKind::KwExtern => {
                    storage.is_extern = true;
                    self.advance();
                }
                TokKind::KwRegister => {
                    storage.is_register = true;
                    self.advance();
                }
                TokKind::KwConst => {
                    storage.is_const = true;
                    self.advance();
                }
                TokKind::KwVolatile => {
                    storage.is_volatile = true;
                    self.advance();
                }
                TokKind::KwRestrict => {
                    storage.is_restrict = true;
                    self.advance();
                }
                TokKind::KwInline => {
                    storage.is_inline = true;
                    self.advance();
                }
                TokKind::KwNoreturn => {
                    storage.is_noreturn = true;
                    self.advance();
                }
                TokKind::KwAttribute => {
                    self.parse_gnu_attribute(storage);
                }
                _ => break,
            }
        }
    }

    /// `__attribute__((noreturn))` and friends; every recognized attribute
    /// name is folded into `storage`, unrecognized ones are consumed and
    /// discarded.
    fn parse_gnu_attribute(&mut self, storage: &mut StorageClass) {
        self.advance(); // __attribute__
        if self.accept(TokKind::LParen).is_none() {
            return;
        }
        let _ = self.accept(TokKind::LParen);
        let mut depth = 1;
        while depth > 0 && !self.at_eof() {
            match self.peek_kind() {
                TokKind::LParen => depth += 1,
                TokKind::RParen => depth -= 1,
                TokKind::Ident if self.cur().lexeme == "noreturn" => storage.is_noreturn = true,
                _ => {}
            }
            self.advance();
        }
    }

    /// Base type specifier: builtin keyword combination, `struct`/`union`
    /// TAG (with optional inline body), `enum` TAG (with optional inline
    /// body), or a previously registered typedef name.
    fn parse_type_specifier(&mut self) -> Result<TypeName, CompileError> {
        match self.peek_kind() {
            TokKind::KwStruct | TokKind::KwUnion => self.parse_aggregate_specifier(),
            TokKind::KwEnum => self.parse_enum_specifier(),
            TokKind::KwTypeof => {
                self.advance();
                self.expect(TokKind::LParen)?;
                // `typeof(expr)` is accepted but not resolved structurally;
                // the semantic layer re-derives the real type from the
                // wrapped expression.
                let mut depth = 1;
                while depth > 0 && !self.at_eof() {
                    match self.peek_kind() {
                        TokKind::LParen => depth += 1,
                        TokKind::RParen => depth -= 1,
                        _ => {}
                    }
                    self.advance();
                }
                Ok(TypeName::simple(TypeKind::Int))
            }
            TokKind::Ident => {
                // A typedef name: the real underlying type is resolved later
                // by the semantic analyzer via a symbol-table lookup on `tag`.
                let name = self.advance().lexeme;
                Ok(TypeName::simple(TypeKind::Unknown).with_tag_for_typedef(name))
            }
            _ => self.parse_builtin_specifier(),
        }
    }

    fn parse_builtin_specifier(&mut self) -> Result<TypeName, CompileError> {
        let mut is_unsigned = false;
        let mut is_signed = false;
        let mut long_count = 0u8;
        let mut base: Option<TypeKind> = None;
        loop {
            match self.peek_kind() {
                TokKind::KwVoid => {
                    base = Some(TypeKind::Void);
                    self.advance();
                }
                TokKind::KwChar => {
                    base = Some(TypeKind::Char);
                    self.advance();
                }
                TokKind::KwShort => {
                    base = Some(TypeKind::Short);
                    self.advance();
                }
                TokKind::KwInt => {
                    base = base.or(Some(TypeKind::Int));
                    self.advance();
                }
                TokKind::KwLong => {
                    long_count += 1;
                    self.advance();
                }
                TokKind::KwFloat => {
                    base = Some(TypeKind::Float);
                    self.advance();
                }
                TokKind::KwDouble => {
                    base = Some(TypeKind::Double);
                    self.advance();
                }
                TokKind::KwBool => {
                    base = Some(TypeKind::Bool);
                    self.advance();
                }
                TokKind::KwComplex => {
                    self.advance();
                }
                TokKind::KwSigned => {
                    is_signed = true;
                    self.advance();
                }
                TokKind::KwUnsigned => {
                    is_unsigned = true;
                    self.advance();
                }
                _ => break,
            }
        }
        let mut kind = match base.unwrap_or(TypeKind::Int) {
            TypeKind::Double if long_count > 0 => TypeKind::LDouble,
            TypeKind::Float | TypeKind::Double | TypeKind::Void | TypeKind::Bool => base.unwrap(),
            TypeKind::Char if is_unsigned => TypeKind::UChar,
            TypeKind::Short if is_unsigned => TypeKind::UShort,
            TypeKind::Int if long_count >= 2 => {
                if is_unsigned {
                    TypeKind::ULLong
                } else {
                    TypeKind::LLong
                }
            }
            TypeKind::Int if long_count == 1 => {
                if is_unsigned {
                    TypeKind::ULong
                } else {
                    TypeKind::Long
                }
            }
            TypeKind::Int if is_unsigned => TypeKind::UInt,
            other => other,
        };
        let _ = is_signed;
        if kind == TypeKind::Int && long_count >= 2 {
            kind = if is_unsigned { TypeKind::ULLong } else { TypeKind::LLong };
        }
        Ok(TypeName::simple(kind))
    }

    fn parse_aggregate_specifier(&mut self) -> Result<TypeName, CompileError> {
        let is_union = self.check(TokKind::KwUnion);
        self.advance(); // struct | union
        let tag = self.accept(TokKind::Ident).map(|t| t.lexeme);
        if self.check(TokKind::LBrace) {
            let loc = self.loc();
            let decl = self.parse_aggregate_body(tag.clone(), is_union)?;
            let stmt_kind = if is_union { StmtKind::UnionDecl(decl) } else { StmtKind::StructDecl(decl) };
            self.pending_types.push(Stmt::new(stmt_kind, loc));
        }
        let kind = if is_union { TypeKind::Union } else { TypeKind::Struct };
        let mut tn = TypeName::simple(kind);
        tn.tag = tag;
        Ok(tn)
    }

    fn parse_aggregate_body(&mut self, tag: Option<String>, is_union: bool) -> Result<AggregateDecl, CompileError> {
        let loc = self.loc();
        self.expect(TokKind::LBrace)?;
        let mut members = Vec::new();
        while !self.check(TokKind::RBrace) && !self.at_eof() {
            let member_type = self.parse_type_specifier()?;
            loop {
                let mut ty = member_type.clone();
                while self.accept(TokKind::Star).is_some() {
                    ty = ty.pointer_to();
                }
                let name = self.expect(TokKind::Ident)?.lexeme;
                while self.accept(TokKind::LBracket).is_some() {
                    // A bare `[]` marks a trailing flexible array member;
                    // the sentinel length `0` distinguishes it from a
                    // non-array scalar (`array_len == None`) in the layout pass.
                    ty.array_len = Some(if self.check(TokKind::RBracket) { 0 } else { self.parse_conditional_const()? });
                    self.expect(TokKind::RBracket)?;
                }
                let bit_width = if self.accept(TokKind::Colon).is_some() {
                    Some(self.parse_conditional()?)
                } else {
                    None
                };
                members.push(MemberDecl {
                    name,
                    type_name: ty,
                    bit_width,
                });
                if self.accept(TokKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokKind::Semi)?;
        }
        self.expect(TokKind::RBrace)?;
        let _ = is_union;
        Ok(AggregateDecl { tag, members, loc })
    }

    fn parse_enum_specifier(&mut self) -> Result<TypeName, CompileError> {
        self.advance(); // enum
        let tag = self.accept(TokKind::Ident).map(|t| t.lexeme);
        if self.check(TokKind::LBrace) {
            let loc = self.loc();
            let decl = self.parse_enum_body(tag.clone())?;
            self.pending_types.push(Stmt::new(StmtKind::EnumDecl(decl), loc));
        }
        let mut tn = TypeName::simple(TypeKind::Enum);
        tn.tag = tag;
        Ok(tn)
    }

    fn parse_enum_body(&mut self, tag: Option<String>) -> Result<EnumDecl, CompileError> {
        let loc = self.loc();
        self.expect(TokKind::LBrace)?;
        let mut constants = Vec::new();
        while !self.check(TokKind::RBrace) && !self.at_eof() {
            let name = self.expect(TokKind::Ident)?.lexeme;
            let value = if self.accept(TokKind::Assign).is_some() {
                Some(self.parse_conditional()?)
            } else {
                None
            };
            constants.push((name, value));
            if self.accept(TokKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokKind::RBrace)?;
        Ok(EnumDecl { tag, constants, loc })
    }

    /// `sizeof`/`_Alignof`/cast/compound-literal type-name form: base
    /// specifier followed by any number of `*`.
    pub(super) fn parse_type_name(&mut self) -> Result<TypeName, CompileError> {
        let mut storage = StorageClass::default();
        self.parse_storage_and_qualifiers(&mut storage);
        let mut ty = self.parse_type_specifier()?;
        self.parse_storage_and_qualifiers(&mut storage);
        while self.accept(TokKind::Star).is_some() {
            ty = ty.pointer_to();
            self.parse_storage_and_qualifiers(&mut storage);
        }
        ty.is_const = storage.is_const;
        ty.is_volatile = storage.is_volatile;
        if self.accept(TokKind::LBracket).is_some() {
            let len = if self.check(TokKind::RBracket) {
                None
            } else {
                Some(self.parse_conditional_const()?)
            };
            self.expect(TokKind::RBracket)?;
            ty.array_len = len;
        }
        Ok(ty)
    }

    fn parse_conditional_const(&mut self) -> Result<u64, CompileError> {
        let expr = self.parse_conditional()?;
        match crate::consteval::eval_const_ast(&expr) {
            Some(v) if v >= 0 => Ok(v as u64),
            _ => Ok(0),
        }
    }

    fn parse_params(&mut self) -> Result<(Vec<Param>, bool), CompileError> {
        self.expect(TokKind::LParen)?;
        let mut params = Vec::new();
        let mut is_variadic = false;
        if self.check(TokKind::KwVoid) && self.peek_at(1) == TokKind::RParen {
            self.advance();
            self.advance();
            return Ok((params, false));
        }
        while !self.check(TokKind::RParen) && !self.at_eof() {
            if self.accept(TokKind::Ellipsis).is_some() {
                is_variadic = true;
                break;
            }
            let mut storage = StorageClass::default();
            self.parse_storage_and_qualifiers(&mut storage);
            let mut ty = self.parse_type_specifier()?;
            self.parse_storage_and_qualifiers(&mut storage);
            while self.accept(TokKind::Star).is_some() {
                ty = ty.pointer_to();
            }
            let name = self.accept(TokKind::Ident).map(|t| t.lexeme).unwrap_or_default();
            while self.accept(TokKind::LBracket).is_some() {
                ty = ty.pointer_to();
                if !self.check(TokKind::RBracket) {
                    self.parse_conditional()?;
                }
                self.expect(TokKind::RBracket)?;
            }
            params.push(Param {
                name,
                type_name: ty,
                is_restrict: storage.is_restrict,
            });
            if self.accept(TokKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokKind::RParen)?;
        Ok((params, is_variadic))
    }

    /// `parser_parse_toplevel`: optional specifiers, a type specifier, and
    /// an identifier; a following `(` is a function prototype/definition,
    /// otherwise a global variable declaration.
    pub(super) fn parse_toplevel(&mut self) -> Result<Option<TopLevel>, CompileError> {
        if self.check(TokKind::KwTypedef) {
            return Ok(Some(self.parse_typedef()?));
        }
        if self.check(TokKind::KwStaticAssert) {
            return Ok(Some(TopLevel::TypeDecl(self.parse_static_assert()?)));
        }
        let start_loc = self.loc();
        let mut storage = StorageClass::default();
        self.parse_storage_and_qualifiers(&mut storage);

        if matches!(self.peek_kind(), TokKind::KwStruct | TokKind::KwUnion | TokKind::KwEnum) && self.peek_at(1) != TokKind::Star
        {
            let is_enum = self.check(TokKind::KwEnum);
            let is_union = self.check(TokKind::KwUnion);
            let base = self.parse_type_specifier()?;
            if self.accept(TokKind::Semi).is_some() {
                let stmt_kind = if is_enum {
                    StmtKind::EnumDecl(EnumDecl {
                        tag: base.tag,
                        constants: vec![],
                        loc: start_loc,
                    })
                } else if is_union {
                    StmtKind::UnionDecl(AggregateDecl {
                        tag: base.tag,
                        members: vec![],
                        loc: start_loc,
                    })
                } else {
                    StmtKind::StructDecl(AggregateDecl {
                        tag: base.tag,
                        members: vec![],
                        loc: start_loc,
                    })
                };
                return Ok(Some(TopLevel::TypeDecl(Stmt::new(stmt_kind, start_loc))));
            }
            return self.finish_toplevel_declarator(base, storage, start_loc);
        }

        let base = self.parse_type_specifier()?;
        self.parse_storage_and_qualifiers(&mut storage);
        self.finish_toplevel_declarator(base, storage, start_loc)
    }

    fn finish_toplevel_declarator(
        &mut self,
        base: TypeName,
        storage: StorageClass,
        loc: crate::error::SourceLoc,
    ) -> Result<Option<TopLevel>, CompileError> {
        let mut ty = base;
        while self.accept(TokKind::Star).is_some() {
            ty = ty.pointer_to();
        }
        let name = self.expect(TokKind::Ident)?.lexeme;

        if self.check(TokKind::LParen) {
            let (params, is_variadic) = self.parse_params()?;
            if self.accept(TokKind::Semi).is_some() {
                return Ok(Some(TopLevel::Function(Function {
                    name,
                    return_type: ty,
                    params,
                    is_variadic,
                    body: vec![],
                    is_definition: false,
                    is_inline: storage.is_inline,
                    is_noreturn: storage.is_noreturn,
                    is_static: storage.is_static,
                    loc,
                })));
            }
            let body = self.parse_block_stmts()?;
            return Ok(Some(TopLevel::Function(Function {
                name,
                return_type: ty,
                params,
                is_variadic,
                body,
                is_definition: true,
                is_inline: storage.is_inline,
                is_noreturn: storage.is_noreturn,
                is_static: storage.is_static,
                loc,
            })));
        }

        while self.accept(TokKind::LBracket).is_some() {
            let len = if self.check(TokKind::RBracket) {
                None
            } else {
                Some(self.parse_conditional_const()?)
            };
            self.expect(TokKind::RBracket)?;
            ty.array_len = len;
        }

        let init = if self.accept(TokKind::Assign).is_some() {
            Some(self.parse_initializer()?)
        } else {
            None
        };
        self.expect(TokKind::Semi)?;
        Ok(Some(TopLevel::GlobalVar(VarDecl {
            name,
            type_name: ty,
            storage,
            init,
            vla_size: None,
            align: None,
            loc,
        })))
    }

    fn parse_typedef(&mut self) -> Result<TopLevel, CompileError> {
        let loc = self.loc();
        self.advance(); // typedef
        let mut ty = self.parse_type_specifier()?;
        while self.accept(TokKind::Star).is_some() {
            ty = ty.pointer_to();
        }
        let name = self.expect(TokKind::Ident)?.lexeme;
        self.expect(TokKind::Semi)?;
        register_typedef(&name);
        Ok(TopLevel::TypeDecl(Stmt::new(
            StmtKind::TypedefDecl(TypedefDecl { name, alias: ty, loc }),
            loc,
        )))
    }

    pub(super) fn parse_static_assert(&mut self) -> Result<Stmt, CompileError> {
        let loc = self.loc();
        self.advance(); // _Static_assert
        self.expect(TokKind::LParen)?;
        let cond = self.parse_conditional()?;
        self.expect(TokKind::Comma)?;
        let message = self.expect(TokKind::StringLit)?.lexeme;
        self.expect(TokKind::RParen)?;
        self.expect(TokKind::Semi)?;
        Ok(Stmt::new(StmtKind::StaticAssert(StaticAssert { cond, message, loc }), loc))
    }

    /// Local variable declaration, used by statement parsing: specifiers,
    /// type, declarator, optional array/init, trailing `;` left to caller.
    pub(super) fn parse_var_decl(&mut self) -> Result<VarDecl, CompileError> {
        let loc = self.loc();
        let mut storage = StorageClass::default();
        self.parse_storage_and_qualifiers(&mut storage);
        let mut ty = self.parse_type_specifier()?;
        self.parse_storage_and_qualifiers(&mut storage);
        while self.accept(TokKind::Star).is_some() {
            ty = ty.pointer_to();
        }
        let name = self.expect(TokKind::Ident)?.lexeme;
        let mut vla_size = None;
        while self.accept(TokKind::LBracket).is_some() {
            if self.check(TokKind::RBracket) {
                ty.array_len = None;
            } else {
                let idx_loc = self.loc();
                let dim = self.parse_assign()?;
                match crate::consteval::eval_const_ast(&dim) {
                    Some(v) if v >= 0 => ty.array_len = Some(v as u64),
                    _ => vla_size = Some(Box::new(dim)),
                }
                let _ = idx_loc;
            }
            self.expect(TokKind::RBracket)?;
        }
        let init = if self.accept(TokKind::Assign).is_some() {
            Some(self.parse_initializer()?)
        } else {
            None
        };
        Ok(VarDecl {
            name,
            type_name: ty,
            storage,
            init,
            vla_size,
            align: None,
            loc,
        })
    }
}

impl TypeName {
    fn with_tag_for_typedef(mut self, name: String) -> Self {
        self.tag = Some(name);
        self
    }
}
