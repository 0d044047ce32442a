//! Pure evaluator for integer constant expressions, with overflow
//! detection. Used by the preprocessor (`#if`/`#elif` subexpressions, over
//! raw tokens) and by the semantic analyzer (array sizes, `case` labels,
//! `_Static_assert`, enum values, bit-field widths, `_Alignas`, over a
//! parsed `Expr` tree).
//!
//! The reference sources disagreed on whether `eval_const_expr` takes two
//! or three arguments; we take the richer shape (expression plus a symbol
//! lookup for enum constants and `sizeof`), per the recommendation to
//! prefer richer, type-tagged signatures.

use crate::token::{TokKind, Token};

/// Checked arithmetic matching `__builtin_add_overflow` semantics: any
/// overflow in `+`, `-`, `*`, or `INT_MIN / -1` is a hard error, never a
/// silent wrap.
pub fn checked_add(a: i64, b: i64) -> Result<i64, String> {
    a.checked_add(b).ok_or_else(|| format!("overflow in constant expression: {a} + {b}"))
}

pub fn checked_sub(a: i64, b: i64) -> Result<i64, String> {
    a.checked_sub(b).ok_or_else(|| format!("overflow in constant expression: {a} - {b}"))
}

pub fn checked_mul(a: i64, b: i64) -> Result<i64, String> {
    a.checked_mul(b).ok_or_else(|| format!("overflow in constant expression: {a} * {b}"))
}

pub fn checked_div(a: i64, b: i64) -> Result<i64, String> {
    if b == 0 {
        return Err("division by zero in constant expression".to_string());
    }
    a.checked_div(b).ok_or_else(|| format!("overflow in constant expression: {a} / {b}"))
}

pub fn checked_mod(a: i64, b: i64) -> Result<i64, String> {
    if b == 0 {
        return Err("modulo by zero in constant expression".to_string());
    }
    a.checked_rem(b).ok_or_else(|| format!("overflow in constant expression: {a} % {b}"))
}

pub(crate) fn parse_int_literal(lexeme: &str) -> Result<i64, String> {
    let trimmed = lexeme.trim_end_matches(['u', 'U', 'l', 'L']);
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).map_err(|e| format!("malformed hex literal '{lexeme}': {e}"))?
    } else if trimmed.len() > 1 && trimmed.starts_with('0') && trimmed.chars().all(|c| c.is_digit(8)) {
        i64::from_str_radix(trimmed, 8).map_err(|e| format!("malformed octal literal '{lexeme}': {e}"))?
    } else {
        trimmed.parse::<i64>().map_err(|e| format!("malformed integer literal '{lexeme}': {e}"))?
    };
    Ok(value)
}

/// Recursive-descent evaluator over a raw token slice, used for `#if`
/// subexpressions after `defined(...)` has already been resolved and the
/// line has been macro-expanded. Unexpanded/undefined identifiers evaluate
/// to `0`, matching the C standard's treatment of residual identifiers in
/// a controlling expression.
pub struct TokenEval<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenEval<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        TokenEval { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.peek().kind == TokKind::Eof
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn check(&self, kind: TokKind) -> bool {
        !self.at_end() && self.peek().kind == kind
    }

    pub fn eval(&mut self) -> Result<i64, String> {
        let v = self.ternary()?;
        if !self.at_end() {
            return Err(format!("trailing tokens in constant expression near {}", self.peek()));
        }
        Ok(v)
    }

    fn ternary(&mut self) -> Result<i64, String> {
        let cond = self.logor()?;
        if self.check(TokKind::Question) {
            self.advance();
            let t = self.ternary()?;
            if !self.check(TokKind::Colon) {
                return Err("expected ':' in conditional expression".to_string());
            }
            self.advance();
            let f = self.ternary()?;
            Ok(if cond != 0 { t } else { f })
        } else {
            Ok(cond)
        }
    }

    fn logor(&mut self) -> Result<i64, String> {
        let mut v = self.logand()?;
        while self.check(TokKind::PipePipe) {
            self.advance();
            let r = self.logand()?;
            v = ((v != 0) || (r != 0)) as i64;
        }
        Ok(v)
    }

    fn logand(&mut self) -> Result<i64, String> {
        let mut v = self.bitor()?;
        while self.check(TokKind::AmpAmp) {
            self.advance();
            let r = self.bitor()?;
            v = ((v != 0) && (r != 0)) as i64;
        }
        Ok(v)
    }

    fn bitor(&mut self) -> Result<i64, String> {
        let mut v = self.bitxor()?;
        while self.check(TokKind::Pipe) {
            self.advance();
            v |= self.bitxor()?;
        }
        Ok(v)
    }

    fn bitxor(&mut self) -> Result<i64, String> {
        let mut v = self.bitand()?;
        while self.check(TokKind::Caret) {
            self.advance();
            v ^= self.bitand()?;
        }
        Ok(v)
    }

    fn bitand(&mut self) -> Result<i64, String> {
        let mut v = self.equality()?;
        while self.check(TokKind::Amp) {
            self.advance();
            v &= self.equality()?;
        }
        Ok(v)
    }

    fn equality(&mut self) -> Result<i64, String> {
        let mut v = self.relational()?;
        loop {
            if self.check(TokKind::Eq) {
                self.advance();
                v = (v == self.relational()?) as i64;
            } else if self.check(TokKind::Ne) {
                self.advance();
                v = (v != self.relational()?) as i64;
            } else {
                break;
            }
        }
        Ok(v)
    }

    fn relational(&mut self) -> Result<i64, String> {
        let mut v = self.shift()?;
        loop {
            if self.check(TokKind::Lt) {
                self.advance();
                v = (v < self.shift()?) as i64;
            } else if self.check(TokKind::Le) {
                self.advance();
                v = (v <= self.shift()?) as i64;
            } else if self.check(TokKind::Gt) {
                self.advance();
                v = (v > self.shift()?) as i64;
            } else if self.check(TokKind::Ge) {
                self.advance();
                v = (v >= self.shift()?) as i64;
            } else {
                break;
            }
        }
        Ok(v)
    }

    fn shift(&mut self) -> Result<i64, String> {
        let mut v = self.additive()?;
        loop {
            if self.check(TokKind::Shl) {
                self.advance();
                v <<= self.additive()?;
            } else if self.check(TokKind::Shr) {
                self.advance();
                v >>= self.additive()?;
            } else {
                break;
            }
        }
        Ok(v)
    }

    fn additive(&mut self) -> Result<i64, String> {
        let mut v = self.multiplicative()?;
        loop {
            if self.check(TokKind::Plus) {
                self.advance();
                v = checked_add(v, self.multiplicative()?)?;
            } else if self.check(TokKind::Minus) {
                self.advance();
                v = checked_sub(v, self.multiplicative()?)?;
            } else {
                break;
            }
        }
        Ok(v)
    }

    fn multiplicative(&mut self) -> Result<i64, String> {
        let mut v = self.unary()?;
        loop {
            if self.check(TokKind::Star) {
                self.advance();
                v = checked_mul(v, self.unary()?)?;
            } else if self.check(TokKind::Slash) {
                self.advance();
                v = checked_div(v, self.unary()?)?;
            } else if self.check(TokKind::Percent) {
                self.advance();
                v = checked_mod(v, self.unary()?)?;
            } else {
                break;
            }
        }
        Ok(v)
    }

    fn unary(&mut self) -> Result<i64, String> {
        if self.check(TokKind::Minus) {
            self.advance();
            let v = self.unary()?;
            return if v == i64::MIN {
                Err("overflow negating INT_MIN in constant expression".to_string())
            } else {
                Ok(-v)
            };
        }
        if self.check(TokKind::Plus) {
            self.advance();
            return self.unary();
        }
        if self.check(TokKind::Bang) {
            self.advance();
            return Ok((self.unary()? == 0) as i64);
        }
        if self.check(TokKind::Tilde) {
            self.advance();
            return Ok(!self.unary()?);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<i64, String> {
        if self.at_end() {
            return Err("unexpected end of constant expression".to_string());
        }
        let tok = self.peek().clone();
        match tok.kind {
            TokKind::IntNumber => {
                self.advance();
                parse_int_literal(&tok.lexeme)
            }
            TokKind::LParen => {
                self.advance();
                let v = self.ternary()?;
                if !self.check(TokKind::RParen) {
                    return Err("expected ')' in constant expression".to_string());
                }
                self.advance();
                Ok(v)
            }
            TokKind::Ident => {
                // Residual identifier: undefined macro in #if context evaluates to 0.
                self.advance();
                Ok(0)
            }
            _ => Err(format!("unexpected token {tok} in constant expression")),
        }
    }
}

pub fn eval_tokens(tokens: &[Token]) -> Result<i64, String> {
    TokenEval::new(tokens).eval()
}

/// Best-effort constant folding over a parsed `Expr`, used by the parser to
/// distinguish a fixed-size array declarator from a VLA before the symbol
/// table exists. Returns `None` for anything needing a symbol lookup
/// (identifier, call, member, `sizeof` of a named aggregate) rather than
/// erroring — the semantic analyzer's own `consteval` pass, which does have
/// symbol access, is the authoritative evaluator for these forms.
pub fn eval_const_ast(expr: &crate::ast::Expr) -> Option<i64> {
    use crate::ast::{BinaryOp, ExprKind, UnaryOp};
    match &expr.kind {
        ExprKind::Number { lexeme, .. } => parse_int_literal(lexeme).ok(),
        ExprKind::Unary { op, expr } => {
            let v = eval_const_ast(expr)?;
            match op {
                UnaryOp::Neg => v.checked_neg(),
                UnaryOp::Plus => Some(v),
                UnaryOp::BitNot => Some(!v),
                UnaryOp::LogNot => Some((v == 0) as i64),
                _ => None,
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let a = eval_const_ast(lhs)?;
            let b = eval_const_ast(rhs)?;
            match op {
                BinaryOp::Add => checked_add(a, b).ok(),
                BinaryOp::Sub => checked_sub(a, b).ok(),
                BinaryOp::Mul => checked_mul(a, b).ok(),
                BinaryOp::Div => checked_div(a, b).ok(),
                BinaryOp::Mod => checked_mod(a, b).ok(),
                BinaryOp::Shl => Some(a << b),
                BinaryOp::Shr => Some(a >> b),
                BinaryOp::BitAnd => Some(a & b),
                BinaryOp::BitOr => Some(a | b),
                BinaryOp::BitXor => Some(a ^ b),
                BinaryOp::Eq => Some((a == b) as i64),
                BinaryOp::Ne => Some((a != b) as i64),
                BinaryOp::Lt => Some((a < b) as i64),
                BinaryOp::Le => Some((a <= b) as i64),
                BinaryOp::Gt => Some((a > b) as i64),
                BinaryOp::Ge => Some((a >= b) as i64),
                BinaryOp::LogAnd => Some(((a != 0) && (b != 0)) as i64),
                BinaryOp::LogOr => Some(((a != 0) || (b != 0)) as i64),
            }
        }
        ExprKind::Conditional { cond, then_expr, else_expr } => {
            if eval_const_ast(cond)? != 0 {
                eval_const_ast(then_expr)
            } else {
                eval_const_ast(else_expr)
            }
        }
        ExprKind::Cast { expr, .. } => eval_const_ast(expr),
        ExprKind::SizeofType(ty) => Some(ty.kind.size_of() as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lexer_tokenize;

    fn eval(src: &str) -> Result<i64, String> {
        eval_tokens(&lexer_tokenize(src, "t.c"))
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), 7);
        assert_eq!(eval("(1 + 2) * 3").unwrap(), 9);
    }

    #[test]
    fn ternary_and_logical() {
        assert_eq!(eval("1 ? 2 : 3").unwrap(), 2);
        assert_eq!(eval("0 || 1 && 1").unwrap(), 1);
    }

    #[test]
    fn overflow_is_an_error_not_a_wrap() {
        assert!(eval("9223372036854775807 + 1").is_err());
    }

    #[test]
    fn div_by_zero_is_an_error() {
        assert!(eval("1 / 0").is_err());
    }

    #[test]
    fn undefined_identifier_is_zero() {
        assert_eq!(eval("FOO + 1").unwrap(), 1);
    }

    #[test]
    fn shift_and_bitwise() {
        assert_eq!(eval("1 << 4 | 1").unwrap(), 17);
    }
}
