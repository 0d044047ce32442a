//! `check_expr`: type inference plus IR emission for every expression form.

use crate::ast::{AssignOp, BinaryOp, Expr, ExprKind, UnaryOp};
use crate::error::SourceLoc;
use crate::ir::{Op, ValueId};
use crate::types::{conforms, Conformance, TypeKind};

use super::layout::ast_type_to_type;
use super::Checker;

impl Checker {
    /// Returns the inferred type (`UNKNOWN` on failure) and, when the
    /// expression produces a runtime value, its IR value id.
    pub fn check_expr(&mut self, expr: &Expr) -> (TypeKind, Option<ValueId>) {
        match &expr.kind {
            ExprKind::Number { lexeme, suffix } => self.check_number(lexeme, *suffix),
            ExprKind::CharLit(s) => {
                let v = first_escaped_byte(s) as i64;
                (TypeKind::Char, Some(self.ir.build_const(v, TypeKind::Char)))
            }
            ExprKind::StringLit(s) => self.check_string_lit(s),
            ExprKind::Ident(name) => self.check_ident(name, expr.loc),
            ExprKind::Unary { op, expr: inner } => self.check_unary(*op, inner, expr.loc),
            ExprKind::Binary { op, lhs, rhs } => self.check_binary(*op, lhs, rhs, expr.loc),
            ExprKind::AssignName { op, name, value } => self.check_assign_name(*op, name, value, expr.loc),
            ExprKind::AssignIndex { op, base, index, value } => self.check_assign_index(*op, base, index, value, expr.loc),
            ExprKind::AssignMember { op, base, member, via_ptr, value } => {
                self.check_assign_member(*op, base, member, *via_ptr, value, expr.loc)
            }
            ExprKind::Conditional { cond, then_expr, else_expr } => self.check_conditional(cond, then_expr, else_expr, expr.loc),
            ExprKind::Call { name, args } => self.check_call(name, args, expr.loc),
            ExprKind::Index { base, index } => self.check_index(base, index, expr.loc),
            ExprKind::Member { base, member, via_ptr } => self.check_member(base, member, *via_ptr, expr.loc),
            ExprKind::Cast { target, expr: inner } => {
                let (_, v) = self.check_expr(inner);
                (target.kind, v)
            }
            ExprKind::SizeofType(ty) => {
                let size = if ty.pointer_depth > 0 { self.config.pointer_size() as i64 } else { ty.kind.size_of() as i64 };
                (TypeKind::ULong, Some(self.ir.build_const(size, TypeKind::ULong)))
            }
            ExprKind::SizeofExpr(inner) => {
                let (ty, _) = self.check_expr(inner);
                (TypeKind::ULong, Some(self.ir.build_const(ty.size_of() as i64, TypeKind::ULong)))
            }
            ExprKind::AlignofType(ty) => (TypeKind::ULong, Some(self.ir.build_const(ty.kind.alignment() as i64, TypeKind::ULong))),
            ExprKind::Offsetof { type_name, member_path } => self.check_offsetof(type_name, member_path, expr.loc),
            ExprKind::CompoundLiteral { type_name, init } => self.check_compound_literal(type_name, init, expr.loc),
            ExprKind::Comma { lhs, rhs } => {
                self.check_expr(lhs);
                self.check_expr(rhs)
            }
        }
    }

    fn check_number(&mut self, lexeme: &str, suffix: crate::ast::NumberSuffix) -> (TypeKind, Option<ValueId>) {
        if suffix.is_float {
            let trimmed = lexeme.trim_end_matches(['f', 'F', 'l', 'L', 'i', 'I', 'j', 'J']);
            let v: f64 = trimmed.parse().unwrap_or(0.0);
            let ty = if lexeme.to_ascii_lowercase().contains('f') { TypeKind::Float } else { TypeKind::Double };
            (ty, Some(self.ir.build_const(v.to_bits() as i64, ty)))
        } else {
            let v = crate::consteval::parse_int_literal(lexeme).unwrap_or(0);
            let ty = if suffix.long_count >= 2 {
                if suffix.is_unsigned { TypeKind::ULLong } else { TypeKind::LLong }
            } else if suffix.long_count == 1 {
                if suffix.is_unsigned { TypeKind::ULong } else { TypeKind::Long }
            } else if suffix.is_unsigned {
                TypeKind::UInt
            } else {
                TypeKind::Int
            };
            (ty, Some(self.ir.build_const(v, ty)))
        }
    }

    fn check_string_lit(&mut self, s: &str) -> (TypeKind, Option<ValueId>) {
        let label = format!("__str_{}", self.ir.instrs().len());
        self.ir.build_glob_string(&label, s.as_bytes().to_vec());
        (TypeKind::Ptr, Some(self.ir.build_glob_addr(&label)))
    }

    fn check_ident(&mut self, name: &str, loc: SourceLoc) -> (TypeKind, Option<ValueId>) {
        let Some(sym) = self.vars.lookup(name).cloned() else {
            self.err(loc, format!("undeclared identifier '{name}'"));
            return (TypeKind::Unknown, None);
        };
        if sym.is_enum_const {
            let v = sym.enum_value.unwrap_or(0);
            return (TypeKind::Int, Some(self.ir.build_const(v, TypeKind::Int)));
        }
        if let Some(idx) = sym.param_index {
            return (sym.ty.kind, Some(self.ir.build_load_param(idx, sym.ty.kind)));
        }
        if sym.ty.kind == TypeKind::Array || sym.ty.kind == TypeKind::Struct || sym.ty.kind == TypeKind::Union {
            return (sym.ty.kind, Some(self.ir.build_addr(&sym.ir_name)));
        }
        (sym.ty.kind, Some(self.ir.build_load(&sym.ir_name, sym.ty.kind, sym.ty.is_volatile)))
    }

    fn check_unary(&mut self, op: UnaryOp, inner: &Expr, loc: SourceLoc) -> (TypeKind, Option<ValueId>) {
        match op {
            UnaryOp::Addr => match &inner.kind {
                ExprKind::Ident(name) => match self.vars.lookup(name) {
                    Some(sym) => (TypeKind::Ptr, Some(self.ir.build_addr(&sym.ir_name))),
                    None => {
                        self.err(loc, format!("undeclared identifier '{name}'"));
                        (TypeKind::Unknown, None)
                    }
                },
                _ => {
                    self.err(loc, "cannot take the address of this expression");
                    (TypeKind::Unknown, None)
                }
            },
            UnaryOp::Deref => {
                let (ty, v) = self.check_expr(inner);
                match v {
                    Some(v) => (ty, Some(self.ir.build_load_ptr(v, ty, false))),
                    None => (TypeKind::Unknown, None),
                }
            }
            UnaryOp::Neg => {
                let (ty, v) = self.check_expr(inner);
                let Some(v) = v else { return (TypeKind::Unknown, None) };
                let zero = self.ir.build_const(0, ty);
                (ty, Some(self.ir.build_binop(arith_sub_op(ty), zero, v, ty)))
            }
            UnaryOp::Plus => self.check_expr(inner),
            UnaryOp::BitNot => {
                let (ty, v) = self.check_expr(inner);
                let Some(v) = v else { return (TypeKind::Unknown, None) };
                let allones = self.ir.build_const(-1, ty);
                (ty, Some(self.ir.build_binop(Op::Xor, allones, v, ty)))
            }
            UnaryOp::LogNot => {
                let (ty, v) = self.check_expr(inner);
                let Some(v) = v else { return (TypeKind::Unknown, None) };
                let zero = self.ir.build_const(0, ty);
                (TypeKind::Int, Some(self.ir.build_cmp(Op::CmpEq, v, zero, ty)))
            }
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => self.check_incdec(op, inner, loc),
        }
    }

    fn check_incdec(&mut self, op: UnaryOp, inner: &Expr, loc: SourceLoc) -> (TypeKind, Option<ValueId>) {
        let ExprKind::Ident(name) = &inner.kind else {
            self.err(loc, "increment/decrement target must be a variable");
            return (TypeKind::Unknown, None);
        };
        let Some(sym) = self.vars.lookup(name).cloned() else {
            self.err(loc, format!("undeclared identifier '{name}'"));
            return (TypeKind::Unknown, None);
        };
        let old = self.ir.build_load(&sym.ir_name, sym.ty.kind, sym.ty.is_volatile);
        let one = self.ir.build_const(1, sym.ty.kind);
        let is_inc = matches!(op, UnaryOp::PreInc | UnaryOp::PostInc);
        let binop = if is_inc { arith_add_op(sym.ty.kind) } else { arith_sub_op(sym.ty.kind) };
        let new = self.ir.build_binop(binop, old, one, sym.ty.kind);
        self.ir.build_store(&sym.ir_name, new, sym.ty.kind, sym.ty.is_volatile);
        let result = match op {
            UnaryOp::PreInc | UnaryOp::PreDec => new,
            UnaryOp::PostInc | UnaryOp::PostDec => old,
            _ => unreachable!(),
        };
        (sym.ty.kind, Some(result))
    }

    /// `&&`/`||` short-circuit: the right operand must not be evaluated once
    /// the result is already decided, so this is lowered with a branch and a
    /// temp slot rather than `check_binary`'s eager two-operand path.
    fn check_logical(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> (TypeKind, Option<ValueId>) {
        let id = self.fresh_construct_id();
        let short_circuit_label = crate::label::Labeler::named(id, if op == BinaryOp::LogAnd { "and_false" } else { "or_true" });
        let end_label = crate::label::Labeler::named(id, "log_end");
        let slot = format!("__log_{id}");

        let (_, lv) = self.check_expr(lhs);
        let Some(lv) = lv else { return (TypeKind::Unknown, None) };
        let zero = self.ir.build_const(0, TypeKind::Int);
        let lbool = self.ir.build_cmp(Op::CmpNe, lv, zero, TypeKind::Int);
        if op == BinaryOp::LogAnd {
            self.ir.build_bcond(lbool, &short_circuit_label);
        } else {
            let lfalse = self.ir.build_cmp(Op::CmpEq, lv, zero, TypeKind::Int);
            self.ir.build_bcond(lfalse, &short_circuit_label);
        }

        let (_, rv) = self.check_expr(rhs);
        if let Some(rv) = rv {
            let zero2 = self.ir.build_const(0, TypeKind::Int);
            let rbool = self.ir.build_cmp(Op::CmpNe, rv, zero2, TypeKind::Int);
            self.ir.build_store(&slot, rbool, TypeKind::Int, false);
        }
        self.ir.build_br(&end_label);
        self.ir.build_label(&short_circuit_label);
        let result = self.ir.build_const(if op == BinaryOp::LogAnd { 0 } else { 1 }, TypeKind::Int);
        self.ir.build_store(&slot, result, TypeKind::Int, false);
        self.ir.build_label(&end_label);
        (TypeKind::Int, Some(self.ir.build_load(&slot, TypeKind::Int, false)))
    }

    fn check_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, loc: SourceLoc) -> (TypeKind, Option<ValueId>) {
        if matches!(op, BinaryOp::LogAnd | BinaryOp::LogOr) {
            return self.check_logical(op, lhs, rhs);
        }
        let (lty, lv) = self.check_expr(lhs);
        let (rty, rv) = self.check_expr(rhs);
        let (Some(lv), Some(rv)) = (lv, rv) else { return (TypeKind::Unknown, None) };
        let conformance = conforms(lty, rty);
        if conformance == Conformance::None {
            self.err(loc, format!("invalid operands to binary operator: {lty} and {rty}"),
            );
            return (TypeKind::Unknown, None);
        }
        let result_ty = match conformance {
            Conformance::IntInt { widen64 } => {
                if widen64 {
                    if lty.is_unsigned() || rty.is_unsigned() {
                        TypeKind::ULLong
                    } else {
                        TypeKind::LLong
                    }
                } else {
                    TypeKind::Int
                }
            }
            Conformance::FloatFloat { wide } => {
                if wide {
                    TypeKind::Double
                } else {
                    TypeKind::Float
                }
            }
            Conformance::PtrInt | Conformance::PtrPtr => TypeKind::Ptr,
            Conformance::ComplexComplex => lty,
            Conformance::None => unreachable!(),
        };
        let is_cmp = matches!(
            op,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        );
        let ir_op = binop_to_ir_op(op, result_ty);
        let value = if is_cmp {
            self.ir.build_cmp(ir_op, lv, rv, result_ty)
        } else {
            self.ir.build_binop(ir_op, lv, rv, result_ty)
        };
        let out_ty = if is_cmp { TypeKind::Int } else { result_ty };
        (out_ty, Some(value))
    }

    fn check_assign_name(&mut self, op: AssignOp, name: &str, value: &Expr, loc: SourceLoc) -> (TypeKind, Option<ValueId>) {
        let Some(sym) = self.vars.lookup(name).cloned() else {
            self.err(loc, format!("undeclared identifier '{name}'"));
            return (TypeKind::Unknown, None);
        };
        if sym.storage.is_const {
            self.err(loc, format!("assignment to const-qualified variable '{name}'"));
            return (TypeKind::Unknown, None);
        }
        let (_, rv) = self.check_expr(value);
        let Some(rv) = rv else { return (TypeKind::Unknown, None) };
        let stored = if op == AssignOp::Assign {
            rv
        } else {
            let old = self.ir.build_load(&sym.ir_name, sym.ty.kind, sym.ty.is_volatile);
            self.ir.build_binop(compound_assign_op(op, sym.ty.kind), old, rv, sym.ty.kind)
        };
        self.ir.build_store(&sym.ir_name, stored, sym.ty.kind, sym.ty.is_volatile);
        (sym.ty.kind, Some(stored))
    }

    fn check_assign_index(&mut self, op: AssignOp, base: &Expr, index: &Expr, value: &Expr, loc: SourceLoc) -> (TypeKind, Option<ValueId>) {
        let Some((addr, elem_ty, elem_size)) = self.check_indexable_addr(base, index) else {
            self.err(loc, "cannot index this expression");
            return (TypeKind::Unknown, None);
        };
        let (_, rv) = self.check_expr(value);
        let Some(rv) = rv else { return (TypeKind::Unknown, None) };
        let stored = if op == AssignOp::Assign {
            rv
        } else {
            let old = self.ir.build_load_ptr(addr, elem_ty, false);
            self.ir.build_binop(compound_assign_op(op, elem_ty), old, rv, elem_ty)
        };
        self.ir.build_store_ptr(addr, stored, elem_ty, false);
        let _ = elem_size;
        (elem_ty, Some(stored))
    }

    fn check_assign_member(
        &mut self,
        op: AssignOp,
        base: &Expr,
        member: &str,
        via_ptr: bool,
        value: &Expr,
        loc: SourceLoc,
    ) -> (TypeKind, Option<ValueId>) {
        let Some((addr, member_ty)) = self.check_member_addr(base, member, via_ptr, loc) else {
            return (TypeKind::Unknown, None);
        };
        let (_, rv) = self.check_expr(value);
        let Some(rv) = rv else { return (TypeKind::Unknown, None) };
        let stored = if op == AssignOp::Assign {
            rv
        } else {
            let old = self.ir.build_load_ptr(addr, member_ty, false);
            self.ir.build_binop(compound_assign_op(op, member_ty), old, rv, member_ty)
        };
        self.ir.build_store_ptr(addr, stored, member_ty, false);
        (member_ty, Some(stored))
    }

    fn check_conditional(&mut self, cond: &Expr, then_expr: &Expr, else_expr: &Expr, loc: SourceLoc) -> (TypeKind, Option<ValueId>) {
        let id = self.fresh_construct_id();
        let else_label = crate::label::Labeler::named(id, "cond_else");
        let end_label = crate::label::Labeler::named(id, "cond_end");
        let slot = format!("__cond_{id}");

        let (_, cv) = self.check_expr(cond);
        let Some(cv) = cv else { return (TypeKind::Unknown, None) };
        self.ir.build_bcond(cv, &else_label);

        let (then_ty, then_v) = self.check_expr(then_expr);
        if let Some(v) = then_v {
            self.ir.build_store(&slot, v, then_ty, false);
        }
        self.ir.build_br(&end_label);
        self.ir.build_label(&else_label);

        let (_, else_v) = self.check_expr(else_expr);
        if let Some(v) = else_v {
            self.ir.build_store(&slot, v, then_ty, false);
        }
        self.ir.build_label(&end_label);
        let _ = loc;
        (then_ty, Some(self.ir.build_load(&slot, then_ty, false)))
    }

    fn check_call(&mut self, name: &str, args: &[Expr], loc: SourceLoc) -> (TypeKind, Option<ValueId>) {
        let sig = self.funcs.get(name).cloned();
        let Some(sig) = sig else {
            self.err(loc, format!("call to undeclared function '{name}'"));
            return (TypeKind::Unknown, None);
        };
        if !sig.is_variadic && args.len() != sig.params.len() {
            self.err(loc, format!("'{name}' expects {} argument(s), got {}", sig.params.len(), args.len()),
            );
        }
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let (_, v) = self.check_expr(arg);
            values.push(v);
        }
        for v in values.into_iter().flatten() {
            self.ir.build_arg(v);
        }
        let ret_ty = sig.return_type.kind;
        (ret_ty, Some(self.ir.build_call(name, args.len() as u32, ret_ty)))
    }

    /// Computes `base + index*elem_size` for an array/pointer base, returning
    /// the pointer value, the element type, and its size.
    fn check_indexable_addr(&mut self, base: &Expr, index: &Expr) -> Option<(ValueId, TypeKind, u32)> {
        let (base_ty, base_v) = self.check_expr(base);
        let (_, idx_v) = self.check_expr(index);
        let (base_v, idx_v) = (base_v?, idx_v?);
        let elem_ty = if base_ty == TypeKind::Array || base_ty == TypeKind::Ptr {
            TypeKind::Int
        } else {
            TypeKind::Int
        };
        let elem_size = elem_ty.size_of().max(1);
        Some((self.ir.build_ptr_add(base_v, idx_v, elem_size), elem_ty, elem_size))
    }

    fn check_index(&mut self, base: &Expr, index: &Expr, loc: SourceLoc) -> (TypeKind, Option<ValueId>) {
        match self.check_indexable_addr(base, index) {
            Some((addr, elem_ty, _)) => (elem_ty, Some(self.ir.build_load_ptr(addr, elem_ty, false))),
            None => {
                self.err(loc, "cannot index this expression");
                (TypeKind::Unknown, None)
            }
        }
    }

    /// Resolves `base.member`/`base->member` to `(addr, member_type)` using
    /// the base's struct/union tag layout recorded in the symbol table.
    fn check_member_addr(&mut self, base: &Expr, member: &str, via_ptr: bool, loc: SourceLoc) -> Option<(ValueId, TypeKind)> {
        let (base_ty, base_v) = self.check_expr(base);
        let base_v = base_v?;
        let tag = match &base.kind {
            ExprKind::Ident(name) => self.vars.lookup(name).and_then(|s| s.ty.tag.clone()),
            _ => None,
        };
        let _ = base_ty;
        let tag = tag?;
        let agg = self.vars.lookup_tag(&tag)?.clone();
        let members = agg.members.as_ref()?;
        let m = members.iter().find(|m| m.name == member)?;
        let offset_val = self.ir.build_const(m.offset as i64, TypeKind::Int);
        let ptr = self.ir.build_ptr_add(base_v, offset_val, 1);
        let _ = (loc, via_ptr);
        Some((ptr, m.ty.kind))
    }

    fn check_member(&mut self, base: &Expr, member: &str, via_ptr: bool, loc: SourceLoc) -> (TypeKind, Option<ValueId>) {
        match self.check_member_addr(base, member, via_ptr, loc) {
            Some((addr, ty)) => (ty, Some(self.ir.build_load_ptr(addr, ty, false))),
            None => {
                self.err(loc, format!("no member named '{member}'"));
                (TypeKind::Unknown, None)
            }
        }
    }

    fn check_offsetof(&mut self, type_name: &crate::ast::TypeName, member_path: &[String], loc: SourceLoc) -> (TypeKind, Option<ValueId>) {
        let Some(tag) = &type_name.tag else {
            self.err(loc, "offsetof requires a tagged struct/union type");
            return (TypeKind::Unknown, None);
        };
        let Some(agg) = self.vars.lookup_tag(tag).cloned() else {
            self.err(loc, format!("unknown tag '{tag}'"));
            return (TypeKind::Unknown, None);
        };
        let Some(members) = &agg.members else {
            return (TypeKind::Unknown, None);
        };
        let Some(first) = member_path.first() else {
            return (TypeKind::Unknown, None);
        };
        match members.iter().find(|m| &m.name == first) {
            Some(m) => (TypeKind::ULong, Some(self.ir.build_const(m.offset as i64, TypeKind::ULong))),
            None => {
                self.err(loc, format!("no member named '{first}' in '{tag}'"));
                (TypeKind::Unknown, None)
            }
        }
    }

    fn check_compound_literal(&mut self, type_name: &crate::ast::TypeName, init: &crate::ast::Initializer, loc: SourceLoc) -> (TypeKind, Option<ValueId>) {
        let ty = ast_type_to_type(type_name);
        let size = self.ir.build_const(ty.size_of().max(1) as i64, TypeKind::ULong);
        let addr = self.ir.build_alloca(size);
        self.store_initializer_at(addr, type_name.kind, init);
        let _ = loc;
        (type_name.kind, Some(addr))
    }

    fn store_initializer_at(&mut self, addr: ValueId, elem_ty: TypeKind, init: &crate::ast::Initializer) {
        match init {
            crate::ast::Initializer::Expr(e) => {
                let (_, v) = self.check_expr(e);
                if let Some(v) = v {
                    self.ir.build_store_ptr(addr, v, elem_ty, false);
                }
            }
            crate::ast::Initializer::List(items) => {
                let elem_size = elem_ty.size_of().max(1) as i64;
                for (i, item) in items.iter().enumerate() {
                    let off = self.ir.build_const(i as i64 * elem_size, TypeKind::Int);
                    let slot = self.ir.build_ptr_add(addr, off, 1);
                    self.store_initializer_at(slot, elem_ty, item);
                }
            }
        }
    }
}

fn first_escaped_byte(s: &str) -> u8 {
    s.bytes().next().unwrap_or(0)
}

fn arith_add_op(ty: TypeKind) -> Op {
    if ty.is_floatlike() {
        if ty == TypeKind::Double || ty == TypeKind::LDouble {
            Op::LFAdd
        } else {
            Op::FAdd
        }
    } else {
        Op::Add
    }
}

fn arith_sub_op(ty: TypeKind) -> Op {
    if ty.is_floatlike() {
        if ty == TypeKind::Double || ty == TypeKind::LDouble {
            Op::LFSub
        } else {
            Op::FSub
        }
    } else {
        Op::Sub
    }
}

fn binop_to_ir_op(op: BinaryOp, ty: TypeKind) -> Op {
    let wide = ty.is_floatlike() && (ty == TypeKind::Double || ty == TypeKind::LDouble);
    match op {
        BinaryOp::Add if ty.is_floatlike() => {
            if wide {
                Op::LFAdd
            } else {
                Op::FAdd
            }
        }
        BinaryOp::Sub if ty.is_floatlike() => {
            if wide {
                Op::LFSub
            } else {
                Op::FSub
            }
        }
        BinaryOp::Mul if ty.is_floatlike() => {
            if wide {
                Op::LFMul
            } else {
                Op::FMul
            }
        }
        BinaryOp::Div if ty.is_floatlike() => {
            if wide {
                Op::LFDiv
            } else {
                Op::FDiv
            }
        }
        BinaryOp::Add => Op::Add,
        BinaryOp::Sub => Op::Sub,
        BinaryOp::Mul => Op::Mul,
        BinaryOp::Div => Op::Div,
        BinaryOp::Mod => Op::Mod,
        BinaryOp::Shl => Op::Shl,
        BinaryOp::Shr => Op::Shr,
        BinaryOp::BitAnd => Op::And,
        BinaryOp::BitOr => Op::Or,
        BinaryOp::BitXor => Op::Xor,
        BinaryOp::Eq => Op::CmpEq,
        BinaryOp::Ne => Op::CmpNe,
        BinaryOp::Lt => Op::CmpLt,
        BinaryOp::Le => Op::CmpLe,
        BinaryOp::Gt => Op::CmpGt,
        BinaryOp::Ge => Op::CmpGe,
        BinaryOp::LogAnd => Op::LogAnd,
        BinaryOp::LogOr => Op::LogOr,
    }
}

fn compound_assign_op(op: AssignOp, ty: TypeKind) -> Op {
    match op {
        AssignOp::Assign => Op::Add, // unreachable: Assign never reaches compound path
        AssignOp::Add => arith_add_op(ty),
        AssignOp::Sub => arith_sub_op(ty),
        AssignOp::Mul => {
            if ty.is_floatlike() {
                if ty == TypeKind::Double || ty == TypeKind::LDouble {
                    Op::LFMul
                } else {
                    Op::FMul
                }
            } else {
                Op::Mul
            }
        }
        AssignOp::Div => {
            if ty.is_floatlike() {
                if ty == TypeKind::Double || ty == TypeKind::LDouble {
                    Op::LFDiv
                } else {
                    Op::FDiv
                }
            } else {
                Op::Div
            }
        }
        AssignOp::Mod => Op::Mod,
        AssignOp::And => Op::And,
        AssignOp::Or => Op::Or,
        AssignOp::Xor => Op::Xor,
        AssignOp::Shl => Op::Shl,
        AssignOp::Shr => Op::Shr,
    }
}
