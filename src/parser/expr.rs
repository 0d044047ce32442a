//! Expressions: full C operator precedence, assignment, conditional, cast,
//! postfix (call/index/member/`++`/`--`), primary (literal/identifier/
//! parenthesized/compound literal), `sizeof`/`_Alignof`/`offsetof`.

use crate::ast::{AssignOp, BinaryOp, Expr, ExprKind, Initializer, NumberSuffix, UnaryOp};
use crate::error::CompileError;
use crate::token::TokKind;

use super::Parser;

impl<'a> Parser<'a> {
    pub(super) fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        let mut e = self.parse_assign()?;
        while self.accept(TokKind::Comma).is_some() {
            let loc = e.loc;
            let rhs = self.parse_assign()?;
            e = Expr::new(ExprKind::Comma { lhs: Box::new(e), rhs: Box::new(rhs) }, loc);
        }
        Ok(e)
    }

    pub(super) fn parse_assign(&mut self) -> Result<Expr, CompileError> {
        let loc = self.loc();
        let lhs = self.parse_conditional()?;
        let op = match self.peek_kind() {
            TokKind::Assign => Some(AssignOp::Assign),
            TokKind::PlusAssign => Some(AssignOp::Add),
            TokKind::MinusAssign => Some(AssignOp::Sub),
            TokKind::StarAssign => Some(AssignOp::Mul),
            TokKind::SlashAssign => Some(AssignOp::Div),
            TokKind::PercentAssign => Some(AssignOp::Mod),
            TokKind::AmpAssign => Some(AssignOp::And),
            TokKind::PipeAssign => Some(AssignOp::Or),
            TokKind::CaretAssign => Some(AssignOp::Xor),
            TokKind::ShlAssign => Some(AssignOp::Shl),
            TokKind::ShrAssign => Some(AssignOp::Shr),
            _ => None,
        };
        let Some(op) = op else { return Ok(lhs) };
        self.advance();
        let value = Box::new(self.parse_assign()?);
        let kind = match lhs.kind {
            ExprKind::Ident(name) => ExprKind::AssignName { op, name, value },
            ExprKind::Index { base, index } => ExprKind::AssignIndex { op, base, index, value },
            ExprKind::Member { base, member, via_ptr } => ExprKind::AssignMember {
                op,
                base,
                member,
                via_ptr,
                value,
            },
            _ => return Err(self.error_here("left-hand side of assignment is not assignable")),
        };
        Ok(Expr::new(kind, loc))
    }

    pub(super) fn parse_conditional(&mut self) -> Result<Expr, CompileError> {
        let loc = self.loc();
        let cond = self.parse_logor()?;
        if self.accept(TokKind::Question).is_some() {
            let then_expr = Box::new(self.parse_expr()?);
            self.expect(TokKind::Colon)?;
            let else_expr = Box::new(self.parse_conditional()?);
            return Ok(Expr::new(
                ExprKind::Conditional {
                    cond: Box::new(cond),
                    then_expr,
                    else_expr,
                },
                loc,
            ));
        }
        Ok(cond)
    }

    fn parse_binop_level(&mut self, next: fn(&mut Self) -> Result<Expr, CompileError>, ops: &[(TokKind, BinaryOp)]) -> Result<Expr, CompileError> {
        let mut lhs = next(self)?;
        loop {
            let matched = ops.iter().find(|(k, _)| self.check(*k));
            let Some((_, op)) = matched else { break };
            let op = *op;
            let loc = lhs.loc;
            self.advance();
            let rhs = next(self)?;
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                loc,
            );
        }
        Ok(lhs)
    }

    fn parse_logor(&mut self) -> Result<Expr, CompileError> {
        self.parse_binop_level(Self::parse_logand, &[(TokKind::PipePipe, BinaryOp::LogOr)])
    }

    fn parse_logand(&mut self) -> Result<Expr, CompileError> {
        self.parse_binop_level(Self::parse_bitor, &[(TokKind::AmpAmp, BinaryOp::LogAnd)])
    }

    fn parse_bitor(&mut self) -> Result<Expr, CompileError> {
        self.parse_binop_level(Self::parse_bitxor, &[(TokKind::Pipe, BinaryOp::BitOr)])
    }

    fn parse_bitxor(&mut self) -> Result<Expr, CompileError> {
        self.parse_binop_level(Self::parse_bitand, &[(TokKind::Caret, BinaryOp::BitXor)])
    }

    fn parse_bitand(&mut self) -> Result<Expr, CompileError> {
        self.parse_binop_level(Self::parse_equality, &[(TokKind::Amp, BinaryOp::BitAnd)])
    }

    fn parse_equality(&mut self) -> Result<Expr, CompileError> {
        self.parse_binop_level(Self::parse_relational, &[(TokKind::Eq, BinaryOp::Eq), (TokKind::Ne, BinaryOp::Ne)])
    }

    fn parse_relational(&mut self) -> Result<Expr, CompileError> {
        self.parse_binop_level(
            Self::parse_shift,
            &[
                (TokKind::Lt, BinaryOp::Lt),
                (TokKind::Le, BinaryOp::Le),
                (TokKind::Gt, BinaryOp::Gt),
                (TokKind::Ge, BinaryOp::Ge),
            ],
        )
    }

    fn parse_shift(&mut self) -> Result<Expr, CompileError> {
        self.parse_binop_level(Self::parse_additive, &[(TokKind::Shl, BinaryOp::Shl), (TokKind::Shr, BinaryOp::Shr)])
    }

    fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        self.parse_binop_level(Self::parse_multiplicative, &[(TokKind::Plus, BinaryOp::Add), (TokKind::Minus, BinaryOp::Sub)])
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CompileError> {
        self.parse_binop_level(
            Self::parse_cast,
            &[
                (TokKind::Star, BinaryOp::Mul),
                (TokKind::Slash, BinaryOp::Div),
                (TokKind::Percent, BinaryOp::Mod),
            ],
        )
    }

    /// `(type-name) unary-expr`, disambiguated from a parenthesized
    /// expression by checking whether a type specifier follows `(`.
    fn parse_cast(&mut self) -> Result<Expr, CompileError> {
        if self.check(TokKind::LParen) {
            let save = self.pos;
            self.advance();
            if self.at_type_start() {
                let loc = self.cur_loc_at(save);
                let target = self.parse_type_name()?;
                if self.accept(TokKind::RParen).is_some() {
                    if self.check(TokKind::LBrace) {
                        let init = self.parse_initializer()?;
                        return Ok(Expr::new(
                            ExprKind::CompoundLiteral {
                                type_name: target,
                                init: Box::new(init),
                            },
                            loc,
                        ));
                    }
                    let expr = Box::new(self.parse_cast()?);
                    return Ok(Expr::new(ExprKind::Cast { target, expr }, loc));
                }
            }
            self.pos = save;
        }
        self.parse_unary()
    }

    fn cur_loc_at(&self, pos: usize) -> crate::error::SourceLoc {
        self.tokens.get(pos).map(|t| t.loc).unwrap_or_else(|| self.loc())
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        let loc = self.loc();
        let op = match self.peek_kind() {
            TokKind::Star => Some(UnaryOp::Deref),
            TokKind::Amp => Some(UnaryOp::Addr),
            TokKind::Minus => Some(UnaryOp::Neg),
            TokKind::Plus => Some(UnaryOp::Plus),
            TokKind::Tilde => Some(UnaryOp::BitNot),
            TokKind::Bang => Some(UnaryOp::LogNot),
            TokKind::PlusPlus => Some(UnaryOp::PreInc),
            TokKind::MinusMinus => Some(UnaryOp::PreDec),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let expr = Box::new(self.parse_cast()?);
            return Ok(Expr::new(ExprKind::Unary { op, expr }, loc));
        }
        if self.check(TokKind::KwSizeof) {
            self.advance();
            if self.check(TokKind::LParen) {
                let save = self.pos;
                self.advance();
                if self.at_type_start() {
                    let ty = self.parse_type_name()?;
                    self.expect(TokKind::RParen)?;
                    return Ok(Expr::new(ExprKind::SizeofType(ty), loc));
                }
                self.pos = save;
            }
            let expr = Box::new(self.parse_unary()?);
            return Ok(Expr::new(ExprKind::SizeofExpr(expr), loc));
        }
        if self.check(TokKind::KwAlignof) {
            self.advance();
            self.expect(TokKind::LParen)?;
            let ty = self.parse_type_name()?;
            self.expect(TokKind::RParen)?;
            return Ok(Expr::new(ExprKind::AlignofType(ty), loc));
        }
        if self.check(TokKind::KwOffsetof) {
            self.advance();
            self.expect(TokKind::LParen)?;
            let type_name = self.parse_type_name()?;
            self.expect(TokKind::Comma)?;
            let mut member_path = vec![self.expect(TokKind::Ident)?.lexeme];
            while self.accept(TokKind::Dot).is_some() {
                member_path.push(self.expect(TokKind::Ident)?.lexeme);
            }
            self.expect(TokKind::RParen)?;
            return Ok(Expr::new(ExprKind::Offsetof { type_name, member_path }, loc));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompileError> {
        let mut e = self.parse_primary()?;
        loop {
            let loc = e.loc;
            if self.accept(TokKind::LBracket).is_some() {
                let index = Box::new(self.parse_expr()?);
                self.expect(TokKind::RBracket)?;
                e = Expr::new(ExprKind::Index { base: Box::new(e), index }, loc);
            } else if self.accept(TokKind::Dot).is_some() {
                let member = self.expect(TokKind::Ident)?.lexeme;
                e = Expr::new(
                    ExprKind::Member {
                        base: Box::new(e),
                        member,
                        via_ptr: false,
                    },
                    loc,
                );
            } else if self.accept(TokKind::Arrow).is_some() {
                let member = self.expect(TokKind::Ident)?.lexeme;
                e = Expr::new(
                    ExprKind::Member {
                        base: Box::new(e),
                        member,
                        via_ptr: true,
                    },
                    loc,
                );
            } else if self.accept(TokKind::PlusPlus).is_some() {
                e = Expr::new(ExprKind::Unary { op: UnaryOp::PostInc, expr: Box::new(e) }, loc);
            } else if self.accept(TokKind::MinusMinus).is_some() {
                e = Expr::new(ExprKind::Unary { op: UnaryOp::PostDec, expr: Box::new(e) }, loc);
            } else {
                break;
            }
        }
        Ok(e)
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let loc = self.loc();
        match self.peek_kind() {
            TokKind::IntNumber | TokKind::FloatNumber | TokKind::ImagNumber => {
                let tok = self.advance();
                let suffix = parse_number_suffix(&tok.lexeme, tok.kind);
                Ok(Expr::new(ExprKind::Number { lexeme: tok.lexeme, suffix }, loc))
            }
            TokKind::CharLit | TokKind::WideCharLit => {
                let tok = self.advance();
                Ok(Expr::new(ExprKind::CharLit(tok.lexeme), loc))
            }
            TokKind::StringLit | TokKind::WideStringLit => {
                let tok = self.advance();
                Ok(Expr::new(ExprKind::StringLit(tok.lexeme), loc))
            }
            TokKind::Ident => {
                let name = self.advance().lexeme;
                if self.check(TokKind::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    while !self.check(TokKind::RParen) && !self.at_eof() {
                        args.push(self.parse_assign()?);
                        if self.accept(TokKind::Comma).is_none() {
                            break;
                        }
                    }
                    self.expect(TokKind::RParen)?;
                    return Ok(Expr::new(ExprKind::Call { name, args }, loc));
                }
                Ok(Expr::new(ExprKind::Ident(name), loc))
            }
            TokKind::LParen => {
                self.advance();
                let e = self.parse_expr()?;
                self.expect(TokKind::RParen)?;
                Ok(e)
            }
            _ => Err(self.error_set(&[TokKind::Ident, TokKind::IntNumber, TokKind::LParen])),
        }
    }

    pub(super) fn parse_initializer(&mut self) -> Result<Initializer, CompileError> {
        if self.accept(TokKind::LBrace).is_some() {
            let mut items = Vec::new();
            while !self.check(TokKind::RBrace) && !self.at_eof() {
                items.push(self.parse_initializer()?);
                if self.accept(TokKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokKind::RBrace)?;
            return Ok(Initializer::List(items));
        }
        Ok(Initializer::Expr(self.parse_assign()?))
    }
}

fn parse_number_suffix(lexeme: &str, kind: TokKind) -> NumberSuffix {
    let lower = lexeme.to_ascii_lowercase();
    NumberSuffix {
        is_unsigned: lower.contains('u'),
        long_count: lower.matches('l').count() as u8,
        is_float: matches!(kind, TokKind::FloatNumber | TokKind::ImagNumber),
        is_imaginary: kind == TokKind::ImagNumber,
    }
}
