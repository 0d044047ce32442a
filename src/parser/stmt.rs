//! Statements: blocks, if/while/do-while/for/switch, goto/labels,
//! break/continue, `_Static_assert`, and local declarations.

use crate::ast::{ForInit, Stmt, StmtKind, SwitchCase};
use crate::error::CompileError;
use crate::token::TokKind;

use super::Parser;

impl<'a> Parser<'a> {
    pub(super) fn parse_block_stmts(&mut self) -> Result<Vec<Stmt>, CompileError> {
        self.expect(TokKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokKind::RBrace) && !self.at_eof() {
            let stmt = self.parse_stmt()?;
            stmts.extend(self.drain_pending_types());
            stmts.push(stmt);
        }
        self.expect(TokKind::RBrace)?;
        Ok(stmts)
    }

    pub(super) fn parse_stmt(&mut self) -> Result<Stmt, CompileError> {
        let loc = self.loc();
        match self.peek_kind() {
            TokKind::LBrace => Ok(Stmt::new(StmtKind::Block(self.parse_block_stmts()?), loc)),
            TokKind::KwIf => self.parse_if(),
            TokKind::KwWhile => self.parse_while(),
            TokKind::KwDo => self.parse_do_while(),
            TokKind::KwFor => self.parse_for(),
            TokKind::KwSwitch => self.parse_switch(),
            TokKind::KwReturn => {
                self.advance();
                let value = if self.check(TokKind::Semi) { None } else { Some(self.parse_expr()?) };
                self.expect(TokKind::Semi)?;
                Ok(Stmt::new(StmtKind::Return(value), loc))
            }
            TokKind::KwBreak => {
                self.advance();
                self.expect(TokKind::Semi)?;
                Ok(Stmt::new(StmtKind::Break, loc))
            }
            TokKind::KwContinue => {
                self.advance();
                self.expect(TokKind::Semi)?;
                Ok(Stmt::new(StmtKind::Continue, loc))
            }
            TokKind::KwGoto => {
                self.advance();
                let name = self.expect(TokKind::Ident)?.lexeme;
                self.expect(TokKind::Semi)?;
                Ok(Stmt::new(StmtKind::Goto(name), loc))
            }
            TokKind::KwStaticAssert => self.parse_static_assert(),
            TokKind::KwTypedef => self.parse_local_typedef(),
            TokKind::Semi => {
                self.advance();
                Ok(Stmt::new(StmtKind::Block(vec![]), loc))
            }
            TokKind::Ident if self.peek_at(1) == TokKind::Colon => {
                let name = self.advance().lexeme;
                self.advance(); // ':'
                let inner = Box::new(self.parse_stmt()?);
                Ok(Stmt::new(StmtKind::Label { name, stmt: inner }, loc))
            }
            _ if self.at_type_start() => {
                let decl = self.parse_var_decl()?;
                self.expect(TokKind::Semi)?;
                Ok(Stmt::new(StmtKind::VarDecl(decl), loc))
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokKind::Semi)?;
                Ok(Stmt::new(StmtKind::ExprStmt(expr), loc))
            }
        }
    }

    fn parse_local_typedef(&mut self) -> Result<Stmt, CompileError> {
        match self.parse_toplevel()? {
            Some(crate::ast::TopLevel::TypeDecl(stmt)) => Ok(stmt),
            _ => Err(self.error_here("expected typedef declaration")),
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, CompileError> {
        let loc = self.loc();
        self.advance(); // if
        self.expect(TokKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokKind::RParen)?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.accept(TokKind::KwElse).is_some() {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            loc,
        ))
    }

    fn parse_while(&mut self) -> Result<Stmt, CompileError> {
        let loc = self.loc();
        self.advance(); // while
        self.expect(TokKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokKind::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::new(StmtKind::While { cond, body }, loc))
    }

    fn parse_do_while(&mut self) -> Result<Stmt, CompileError> {
        let loc = self.loc();
        self.advance(); // do
        let body = Box::new(self.parse_stmt()?);
        self.expect(TokKind::KwWhile)?;
        self.expect(TokKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokKind::RParen)?;
        self.expect(TokKind::Semi)?;
        Ok(Stmt::new(StmtKind::DoWhile { body, cond }, loc))
    }

    fn parse_for(&mut self) -> Result<Stmt, CompileError> {
        let loc = self.loc();
        self.advance(); // for
        self.expect(TokKind::LParen)?;
        let init = if self.check(TokKind::Semi) {
            self.advance();
            ForInit::None
        } else if self.at_type_start() {
            let decl = self.parse_var_decl()?;
            self.expect(TokKind::Semi)?;
            ForInit::Decl(decl)
        } else {
            let e = self.parse_expr()?;
            self.expect(TokKind::Semi)?;
            ForInit::Expr(e)
        };
        let cond = if self.check(TokKind::Semi) { None } else { Some(self.parse_expr()?) };
        self.expect(TokKind::Semi)?;
        let post = if self.check(TokKind::RParen) { None } else { Some(self.parse_expr()?) };
        self.expect(TokKind::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::new(StmtKind::For { init, cond, post, body }, loc))
    }

    fn parse_switch(&mut self) -> Result<Stmt, CompileError> {
        let loc = self.loc();
        self.advance(); // switch
        self.expect(TokKind::LParen)?;
        let expr = self.parse_expr()?;
        self.expect(TokKind::RParen)?;
        self.expect(TokKind::LBrace)?;
        let mut cases = Vec::new();
        let mut default: Option<Vec<Stmt>> = None;
        while !self.check(TokKind::RBrace) && !self.at_eof() {
            if self.accept(TokKind::KwCase).is_some() {
                let value = self.parse_conditional()?;
                self.expect(TokKind::Colon)?;
                let body = self.parse_case_body()?;
                cases.push(SwitchCase { value, body });
            } else if self.accept(TokKind::KwDefault).is_some() {
                self.expect(TokKind::Colon)?;
                if default.is_some() {
                    return Err(self.error_here("duplicate 'default' label in switch"));
                }
                default = Some(self.parse_case_body()?);
            } else {
                return Err(self.error_set(&[TokKind::KwCase, TokKind::KwDefault]));
            }
        }
        self.expect(TokKind::RBrace)?;
        Ok(Stmt::new(StmtKind::Switch { expr, cases, default }, loc))
    }

    fn parse_case_body(&mut self) -> Result<Vec<Stmt>, CompileError> {
        let mut body = Vec::new();
        while !matches!(self.peek_kind(), TokKind::KwCase | TokKind::KwDefault | TokKind::RBrace) && !self.at_eof() {
            body.push(self.parse_stmt()?);
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{StmtKind, TopLevel};
    use crate::lexer::lexer_tokenize;
    use crate::parser::parser_parse_toplevel;

    fn body_of(src: &str) -> Vec<crate::ast::Stmt> {
        let toks = lexer_tokenize(src, "t.c");
        let prog = parser_parse_toplevel(&toks).unwrap();
        match prog.items.into_iter().next().unwrap() {
            TopLevel::Function(f) => f.body,
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn s2_for_loop_parses_all_clauses() {
        let body = body_of("void g(){ for(int i=0;i<3;i++){} }");
        match &body[0].kind {
            StmtKind::For { init, cond, post, .. } => {
                assert!(matches!(init, crate::ast::ForInit::Decl(_)));
                assert!(cond.is_some());
                assert!(post.is_some());
            }
            _ => panic!("expected for"),
        }
    }

    #[test]
    fn if_else_chains() {
        let body = body_of("void g(){ if (1) {} else if (2) {} else {} }");
        assert!(matches!(body[0].kind, StmtKind::If { .. }));
    }

    #[test]
    fn switch_rejects_duplicate_default() {
        let toks = lexer_tokenize("void g(){ switch(1){ default: break; default: break; } }", "t.c");
        assert!(parser_parse_toplevel(&toks).is_err());
    }

    #[test]
    fn labeled_statement_and_goto() {
        let body = body_of("void g(){ goto done; done: ; }");
        assert!(matches!(body[0].kind, StmtKind::Goto(_)));
        assert!(matches!(body[1].kind, StmtKind::Label { .. }));
    }
}
