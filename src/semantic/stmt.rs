//! `check_stmt`: statement checking and IR emission for control flow,
//! local declarations, and the inline-tag forms (struct/union/enum/typedef)
//! a block may introduce.

use crate::ast::{ForInit, Stmt, StmtKind};
use crate::symtable::Symbol;
use crate::types::{Type, TypeKind};

use super::layout::{ast_type_to_type, layout_struct_members, layout_union_members};
use super::Checker;

impl Checker {
    pub fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::ExprStmt(e) => {
                self.check_expr(e);
            }
            StmtKind::Return(value) => self.check_return(value.as_ref()),
            StmtKind::VarDecl(decl) => self.check_local_var_decl(decl),
            StmtKind::If { cond, then_branch, else_branch } => self.check_if(cond, then_branch, else_branch.as_deref()),
            StmtKind::While { cond, body } => self.check_while(cond, body),
            StmtKind::DoWhile { body, cond } => self.check_do_while(body, cond),
            StmtKind::For { init, cond, post, body } => self.check_for(init, cond.as_ref(), post.as_ref(), body),
            StmtKind::Switch { expr, cases, default } => self.check_switch(expr, cases, default.as_deref()),
            StmtKind::Label { name, stmt: inner } => {
                self.ir.build_label(name);
                self.mark_label_defined(name);
                self.enter_construct();
                self.check_stmt(inner);
            }
            StmtKind::Goto(label) => {
                self.ir.build_br(label);
                self.record_goto(label, stmt.loc);
                self.mark_unreachable();
            }
            StmtKind::Break => {
                if let Some(label) = self.break_label.last().cloned() {
                    self.ir.build_br(&label);
                } else {
                    self.err(stmt.loc, "break statement not within a loop or switch");
                }
                self.mark_unreachable();
            }
            StmtKind::Continue => {
                if let Some(label) = self.continue_label.last().cloned() {
                    self.ir.build_br(&label);
                } else {
                    self.err(stmt.loc, "continue statement not within a loop");
                }
                self.mark_unreachable();
            }
            StmtKind::Block(stmts) => {
                self.vars.push_scope();
                for s in stmts {
                    self.check_stmt(s);
                }
                self.vars.pop_scope();
            }
            StmtKind::EnumDecl(decl) => self.check_enum_decl(decl),
            StmtKind::StructDecl(decl) => self.check_aggregate_decl(decl, TypeKind::Struct),
            StmtKind::UnionDecl(decl) => self.check_aggregate_decl(decl, TypeKind::Union),
            StmtKind::TypedefDecl(decl) => {
                let ty = ast_type_to_type(&decl.alias);
                let mut sym = Symbol::simple(decl.name.clone(), ty, decl.loc);
                sym.is_typedef = true;
                self.vars.insert_local(sym);
            }
            StmtKind::StaticAssert(assertion) => {
                match crate::consteval::eval_const_ast(&assertion.cond) {
                    Some(0) => self.err(assertion.loc, format!("static assertion failed: {}", assertion.message)),
                    Some(_) => {}
                    None => self.err(assertion.loc, "static assertion requires a constant expression"),
                }
            }
        }
    }

    fn check_return(&mut self, value: Option<&crate::ast::Expr>) {
        match value {
            Some(e) => {
                let (_, v) = self.check_expr(e);
                self.ir.build_return(v);
            }
            None => self.ir.build_return(None),
        }
        self.mark_unreachable();
    }

    fn check_local_var_decl(&mut self, decl: &crate::ast::VarDecl) {
        let mut ty = ast_type_to_type(&decl.type_name);
        ty.is_const = decl.storage.is_const || decl.type_name.is_const;
        ty.is_volatile = decl.storage.is_volatile || decl.type_name.is_volatile;

        let ir_name = if decl.storage.is_static {
            crate::symtable::mangle_static_local(&decl.name)
        } else {
            decl.name.clone()
        };

        if let Some(vla_expr) = &decl.vla_size {
            let (_, size_v) = self.check_expr(vla_expr);
            if let Some(size_v) = size_v {
                let elem_size = ty.elem.as_ref().map(|e| e.size_of()).unwrap_or(1).max(1) as i64;
                let bytes = self.ir.build_const(elem_size, TypeKind::ULong);
                let total = self.ir.build_binop(crate::ir::Op::Mul, size_v, bytes, TypeKind::ULong);
                let addr = self.ir.build_alloca(total);
                let mut sym = Symbol::simple(decl.name.clone(), ty, decl.loc);
                sym.ir_name = ir_name;
                sym.vla_addr = Some(addr as u64);
                self.vars.insert_local(sym);
            }
            return;
        }

        let size = ty.size_of().max(ty.kind.size_of() as u64);
        if decl.storage.is_static {
            self.ir.build_glob_var(&ir_name, ty.kind, None);
        } else {
            self.frame_bytes += size as i64;
        }

        let mut sym = Symbol::simple(decl.name.clone(), ty.clone(), decl.loc);
        sym.ir_name = ir_name.clone();
        sym.storage = decl.storage;
        sym.total_size = Some(size);
        self.vars.insert_local(sym);

        if let Some(init) = &decl.init {
            self.store_var_initializer(&ir_name, &ty, init);
        }
    }

    fn store_var_initializer(&mut self, ir_name: &str, ty: &Type, init: &crate::ast::Initializer) {
        match init {
            crate::ast::Initializer::Expr(e) => {
                let (_, v) = self.check_expr(e);
                if let Some(v) = v {
                    self.ir.build_store(ir_name, v, ty.kind, ty.is_volatile);
                }
            }
            crate::ast::Initializer::List(items) => {
                let addr = self.ir.build_addr(ir_name);
                let elem_ty = ty.elem.as_deref().cloned().unwrap_or_else(|| ty.clone());
                let elem_size = elem_ty.size_of().max(1) as i64;
                for (i, item) in items.iter().enumerate() {
                    let off = self.ir.build_const(i as i64 * elem_size, TypeKind::Int);
                    let slot = self.ir.build_ptr_add(addr, off, 1);
                    self.store_initializer_into(slot, &elem_ty, item);
                }
            }
        }
    }

    fn store_initializer_into(&mut self, addr: crate::ir::ValueId, elem_ty: &Type, init: &crate::ast::Initializer) {
        match init {
            crate::ast::Initializer::Expr(e) => {
                let (_, v) = self.check_expr(e);
                if let Some(v) = v {
                    self.ir.build_store_ptr(addr, v, elem_ty.kind, false);
                }
            }
            crate::ast::Initializer::List(items) => {
                let inner_ty = elem_ty.elem.as_deref().cloned().unwrap_or_else(|| elem_ty.clone());
                let inner_size = inner_ty.size_of().max(1) as i64;
                for (i, item) in items.iter().enumerate() {
                    let off = self.ir.build_const(i as i64 * inner_size, TypeKind::Int);
                    let slot = self.ir.build_ptr_add(addr, off, 1);
                    self.store_initializer_into(slot, &inner_ty, item);
                }
            }
        }
    }

    fn check_if(&mut self, cond: &crate::ast::Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) {
        let id = self.fresh_construct_id();
        let else_label = crate::label::Labeler::named(id, "if_else");
        let end_label = crate::label::Labeler::named(id, "if_end");

        let (_, cv) = self.check_expr(cond);
        let Some(cv) = cv else { return };
        self.ir.build_bcond(cv, &else_label);

        self.enter_construct();
        self.check_stmt(then_branch);
        let then_fell_through = !self.unreachable;
        if else_branch.is_some() {
            self.ir.build_br(&end_label);
        }
        self.ir.build_label(&else_label);

        self.enter_construct();
        if let Some(else_branch) = else_branch {
            self.check_stmt(else_branch);
        }
        let else_fell_through = !self.unreachable;
        self.ir.build_label(&end_label);
        if then_fell_through || else_fell_through || else_branch.is_none() {
            self.enter_construct();
        }
    }

    fn check_while(&mut self, cond: &crate::ast::Expr, body: &Stmt) {
        let id = self.fresh_construct_id();
        let start_label = crate::label::Labeler::named(id, "while_start");
        let end_label = crate::label::Labeler::named(id, "while_end");

        self.ir.build_label(&start_label);
        let (_, cv) = self.check_expr(cond);
        let Some(cv) = cv else { return };
        self.ir.build_bcond(cv, &end_label);

        self.break_label.push(end_label.clone());
        self.continue_label.push(start_label.clone());
        self.enter_construct();
        self.check_stmt(body);
        self.break_label.pop();
        self.continue_label.pop();

        self.ir.build_br(&start_label);
        self.ir.build_label(&end_label);
        self.enter_construct();
    }

    fn check_do_while(&mut self, body: &Stmt, cond: &crate::ast::Expr) {
        let id = self.fresh_construct_id();
        let start_label = crate::label::Labeler::named(id, "do_start");
        let cont_label = crate::label::Labeler::named(id, "do_cont");
        let end_label = crate::label::Labeler::named(id, "do_end");

        self.ir.build_label(&start_label);
        self.break_label.push(end_label.clone());
        self.continue_label.push(cont_label.clone());
        self.enter_construct();
        self.check_stmt(body);
        self.break_label.pop();
        self.continue_label.pop();

        self.ir.build_label(&cont_label);
        let (_, cv) = self.check_expr(cond);
        if let Some(cv) = cv {
            self.ir.build_bcond(cv, &end_label);
            self.ir.build_br(&start_label);
        }
        self.ir.build_label(&end_label);
        self.enter_construct();
    }

    /// Produces the exact instruction order required of a `for` loop: the
    /// start label, the condition's branch-to-end, the body, the `continue`
    /// label immediately before the post-expression, then the branch back to
    /// the start, then the end label.
    fn check_for(&mut self, init: &ForInit, cond: Option<&crate::ast::Expr>, post: Option<&crate::ast::Expr>, body: &Stmt) {
        self.vars.push_scope();
        match init {
            ForInit::Decl(decl) => self.check_local_var_decl(decl),
            ForInit::Expr(e) => {
                self.check_expr(e);
            }
            ForInit::None => {}
        }

        let id = self.fresh_construct_id();
        let start_label = crate::label::Labeler::named(id, "start");
        let cont_label = crate::label::Labeler::named(id, "cont");
        let end_label = crate::label::Labeler::named(id, "end");

        self.ir.build_label(&start_label);
        if let Some(cond) = cond {
            let (_, cv) = self.check_expr(cond);
            if let Some(cv) = cv {
                self.ir.build_bcond(cv, &end_label);
            }
        }

        self.break_label.push(end_label.clone());
        self.continue_label.push(cont_label.clone());
        self.enter_construct();
        self.check_stmt(body);
        self.break_label.pop();
        self.continue_label.pop();

        self.ir.build_label(&cont_label);
        if let Some(post) = post {
            self.check_expr(post);
        }
        self.ir.build_br(&start_label);
        self.ir.build_label(&end_label);
        self.enter_construct();
        self.vars.pop_scope();
    }

    /// Dispatch is a linear chain of equality tests (no jump table, since
    /// that's a code-generator concern): each case either falls through to
    /// its body label or skips to the next test; case bodies themselves
    /// fall through to the next one unless the body ends in `break`/`return`.
    fn check_switch(&mut self, expr: &crate::ast::Expr, cases: &[crate::ast::SwitchCase], default: Option<&[Stmt]>) {
        let id = self.fresh_construct_id();
        let end_label = crate::label::Labeler::named(id, "switch_end");
        let default_label = crate::label::Labeler::named(id, "switch_default");

        let (_, sv) = self.check_expr(expr);
        let Some(sv) = sv else { return };

        let case_labels: Vec<String> = (0..cases.len()).map(|i| crate::label::Labeler::named(id, &format!("case{i}"))).collect();

        for (i, case) in cases.iter().enumerate() {
            let (_, case_v) = self.check_expr(&case.value);
            if let Some(case_v) = case_v {
                let miss_label = crate::label::Labeler::named(id, &format!("case{i}_miss"));
                let eq = self.ir.build_cmp(crate::ir::Op::CmpEq, sv, case_v, TypeKind::Int);
                self.ir.build_bcond(eq, &miss_label);
                self.ir.build_br(&case_labels[i]);
                self.ir.build_label(&miss_label);
            }
        }
        if default.is_some() {
            self.ir.build_br(&default_label);
        } else {
            self.ir.build_br(&end_label);
        }

        self.break_label.push(end_label.clone());
        for (i, case) in cases.iter().enumerate() {
            self.ir.build_label(&case_labels[i]);
            self.enter_construct();
            for s in &case.body {
                self.check_stmt(s);
            }
        }
        if let Some(default) = default {
            self.ir.build_label(&default_label);
            self.enter_construct();
            for s in default {
                self.check_stmt(s);
            }
        }
        self.break_label.pop();
        self.ir.build_label(&end_label);
        self.enter_construct();
    }

    fn check_enum_decl(&mut self, decl: &crate::ast::EnumDecl) {
        let mut next = 0i64;
        for (name, value_expr) in &decl.constants {
            if let Some(e) = value_expr {
                next = crate::consteval::eval_const_ast(e).unwrap_or(next);
            }
            let mut sym = Symbol::simple(name.clone(), Type::new(TypeKind::Int), decl.loc);
            sym.is_enum_const = true;
            sym.enum_value = Some(next);
            self.vars.insert_local(sym);
            next += 1;
        }
        if let Some(tag) = &decl.tag {
            let sym = Symbol::simple(tag.clone(), Type::new(TypeKind::Enum), decl.loc);
            self.vars.insert_tag(sym);
        }
    }

    fn check_aggregate_decl(&mut self, decl: &crate::ast::AggregateDecl, kind: TypeKind) {
        let ptr_size = self.config.pointer_size();
        let (members, total_size) = if kind == TypeKind::Union {
            layout_union_members(&decl.members, ptr_size)
        } else {
            layout_struct_members(&decl.members, self.config.pack_alignment(), ptr_size)
        };
        let Some(tag) = &decl.tag else { return };
        let mut sym = Symbol::simple(tag.clone(), Type::tagged(kind, tag.clone()), decl.loc);
        sym.members = Some(members);
        sym.total_size = Some(total_size);
        self.vars.insert_tag(sym);
    }
}
