//! `check_func`, `check_global_var`, `check_type_decl`: the three dispatch
//! targets `check_program` drives for every top-level item.

use crate::ast::{Function, Stmt, VarDecl};
use crate::symtable::Symbol;

use super::layout::ast_type_to_type;
use super::Checker;

impl Checker {
    pub fn check_func(&mut self, f: &Function) -> bool {
        let errors_before = self.diags.errors().len();

        if let Some(existing) = self.funcs.get(&f.name) {
            if !existing.matches_signature(f) {
                self.err(f.loc, format!("conflicting types for '{}'", f.name));
            }
        }
        self.funcs.insert(f.name.clone(), f.clone());

        if !f.is_definition {
            return self.diags.errors().len() == errors_before;
        }

        if f.is_inline && !self.inline_emitted.insert(f.name.clone()) {
            return self.diags.errors().len() == errors_before;
        }

        self.diags.enter_function(f.name.clone());
        self.cur_func_name = f.name.clone();
        self.cur_func_ret = f.return_type.kind;
        self.frame_bytes = 0;
        self.enter_construct();

        self.vars.push_scope();
        for (i, param) in f.params.iter().enumerate() {
            let ty = ast_type_to_type(&param.type_name);
            let mut sym = Symbol::simple(param.name.clone(), ty, f.loc);
            sym.param_index = Some(i as u32);
            self.vars.insert_local(sym);
        }

        let begin_ptr = self.ir.build_func_begin(&f.name);
        for stmt in &f.body {
            self.check_stmt(stmt);
        }
        self.resolve_gotos();
        self.ir.patch_frame_size(begin_ptr, self.frame_bytes);
        self.ir.build_func_end(&f.name);

        self.vars.pop_scope();
        self.diags.leave_function();

        self.diags.errors().len() == errors_before
    }

    pub fn check_global_var(&mut self, decl: &VarDecl) -> bool {
        let errors_before = self.diags.errors().len();

        let mut ty = ast_type_to_type(&decl.type_name);
        ty.is_const = decl.storage.is_const || decl.type_name.is_const;
        ty.is_volatile = decl.storage.is_volatile || decl.type_name.is_volatile;

        match &decl.init {
            Some(crate::ast::Initializer::Expr(e)) => match crate::consteval::eval_const_ast(e) {
                Some(v) => self.ir.build_glob_var(&decl.name, ty.kind, Some(v)),
                None => self.err(decl.loc, format!("initializer for '{}' is not a compile-time constant", decl.name)),
            },
            Some(crate::ast::Initializer::List(items)) => {
                let elem_ty = ty.elem.as_deref().map(|e| e.kind).unwrap_or(ty.kind);
                let values: Vec<i64> = items
                    .iter()
                    .map(|it| match it {
                        crate::ast::Initializer::Expr(e) => crate::consteval::eval_const_ast(e).unwrap_or(0),
                        crate::ast::Initializer::List(_) => 0,
                    })
                    .collect();
                self.ir.build_glob_array(&decl.name, elem_ty, values);
            }
            None => self.ir.build_glob_var(&decl.name, ty.kind, None),
        }

        let mut sym = Symbol::simple(decl.name.clone(), ty, decl.loc);
        sym.storage = decl.storage;
        self.vars.insert_global(sym);

        self.diags.errors().len() == errors_before
    }

    pub fn check_type_decl(&mut self, stmt: &Stmt) -> bool {
        let errors_before = self.diags.errors().len();
        self.check_stmt(stmt);
        self.diags.errors().len() == errors_before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceLoc;
    use crate::types::TypeKind;

    fn int_param(name: &str) -> crate::ast::Param {
        crate::ast::Param {
            name: name.to_string(),
            type_name: crate::ast::TypeName::simple(TypeKind::Int),
            is_restrict: false,
        }
    }

    fn simple_fn(name: &str, body: Vec<Stmt>) -> Function {
        Function {
            name: name.to_string(),
            return_type: crate::ast::TypeName::simple(TypeKind::Int),
            params: vec![int_param("a")],
            is_variadic: false,
            body,
            is_definition: true,
            is_inline: false,
            is_noreturn: false,
            is_static: false,
            loc: SourceLoc::default(),
        }
    }

    #[test]
    fn s1_simple_function_emits_expected_ir_shape() {
        use crate::ast::{BinaryOp, Expr, ExprKind, NumberSuffix};
        let ret_expr = Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(Expr::new(ExprKind::Ident("a".into()), SourceLoc::default())),
                rhs: Box::new(Expr::new(
                    ExprKind::Number { lexeme: "1".into(), suffix: NumberSuffix::default() },
                    SourceLoc::default(),
                )),
            },
            SourceLoc::default(),
        );
        let body = vec![Stmt::new(crate::ast::StmtKind::Return(Some(ret_expr)), SourceLoc::default())];
        let f = simple_fn("f", body);

        let mut checker = Checker::new();
        assert!(checker.check_func(&f));
        let ops: Vec<_> = checker.ir.instrs().iter().map(|i| i.op).collect();
        assert_eq!(
            ops,
            vec![
                crate::ir::Op::FuncBegin,
                crate::ir::Op::LoadParam,
                crate::ir::Op::Const,
                crate::ir::Op::Add,
                crate::ir::Op::Return,
                crate::ir::Op::FuncEnd,
            ]
        );
    }

    #[test]
    fn prototype_does_not_emit_a_body() {
        let mut f = simple_fn("g", vec![]);
        f.is_definition = false;
        let mut checker = Checker::new();
        assert!(checker.check_func(&f));
        assert!(checker.ir.instrs().is_empty());
        assert!(checker.funcs.contains_key("g"));
    }

    #[test]
    fn inline_function_body_emitted_only_once() {
        let mut f = simple_fn(
            "h",
            vec![Stmt::new(crate::ast::StmtKind::Return(None), SourceLoc::default())],
        );
        f.is_inline = true;
        let mut checker = Checker::new();
        assert!(checker.check_func(&f));
        let first_len = checker.ir.instrs().len();
        assert!(checker.check_func(&f));
        assert_eq!(checker.ir.instrs().len(), first_len);
    }

    #[test]
    fn conflicting_redeclaration_is_an_error() {
        let f1 = simple_fn("k", vec![]);
        let mut f2 = f1.clone();
        f2.params.clear();
        let mut checker = Checker::new();
        assert!(checker.check_func(&f1));
        assert!(!checker.check_func(&f2));
    }

    #[test]
    fn global_var_with_constant_initializer() {
        use crate::ast::{Initializer, NumberSuffix};
        let decl = VarDecl {
            name: "counter".into(),
            type_name: crate::ast::TypeName::simple(TypeKind::Int),
            storage: crate::ast::StorageClass::default(),
            init: Some(Initializer::Expr(crate::ast::Expr::new(
                crate::ast::ExprKind::Number { lexeme: "7".into(), suffix: NumberSuffix::default() },
                SourceLoc::default(),
            ))),
            vla_size: None,
            align: None,
            loc: SourceLoc::default(),
        };
        let mut checker = Checker::new();
        assert!(checker.check_global_var(&decl));
        assert!(checker.vars.lookup("counter").is_some());
    }
}
