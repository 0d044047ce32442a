//! Lexer: preprocessed text -> token vector.
//!
//! A hand-rolled char-by-char scanner, in the spirit of the parser's own
//! `tokenize()`: a `Vec<char>` cursor tracking line/column, with dedicated
//! sub-scanners for identifiers, numbers, and string/char literals.

use crate::error::SourceLoc;
use crate::token::{keyword_kind, TokKind, Token};

pub struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
    file: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &str, file: &'a str) -> Self {
        Lexer {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            file,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn loc(&self) -> SourceLoc {
        SourceLoc::new(self.line, self.col)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c == ' ' || c == '\t' || c == '\r' || c == '\n' => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek() {
                            None => break,
                            Some('*') if self.peek_at(1) == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            _ => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// `# N "file"` line-marker directives left by the preprocessor; these
    /// reset the lexer's notion of current file/line so later tokens carry
    /// the original source coordinates rather than the concatenated-text
    /// coordinates.
    fn try_line_marker(&mut self) -> bool {
        if self.peek() != Some('#') {
            return false;
        }
        if self.col != 1 {
            return false;
        }
        let save = (self.pos, self.line, self.col);
        self.advance();
        while self.peek() == Some(' ') {
            self.advance();
        }
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if digits.is_empty() {
            (self.pos, self.line, self.col) = save;
            return false;
        }
        let new_line: u32 = digits.parse().unwrap_or(1);
        while self.peek() == Some(' ') {
            self.advance();
        }
        if self.peek() == Some('"') {
            self.advance();
            while let Some(c) = self.peek() {
                if c == '"' {
                    self.advance();
                    break;
                }
                self.advance();
            }
        }
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        self.line = new_line;
        true
    }

    fn scan_ident(&mut self) -> Token {
        let loc = self.loc();
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = keyword_kind(&s).unwrap_or(TokKind::Ident);
        Token::new(kind, s, self.file, loc)
    }

    fn scan_number(&mut self) -> Token {
        let loc = self.loc();
        let mut s = String::new();
        let mut is_float = false;

        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            s.push(self.advance().unwrap());
            s.push(self.advance().unwrap());
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    s.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        } else {
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    s.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit() || c == 'e' || c == 'E') || self.peek() == Some('.') && s.is_empty() {
                is_float = true;
                s.push(self.advance().unwrap());
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        s.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            if matches!(self.peek(), Some('e') | Some('E')) {
                is_float = true;
                s.push(self.advance().unwrap());
                if matches!(self.peek(), Some('+') | Some('-')) {
                    s.push(self.advance().unwrap());
                }
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        s.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        let mut is_imag = false;
        loop {
            match self.peek() {
                Some(c @ ('u' | 'U')) if !is_float => {
                    s.push(c);
                    self.advance();
                }
                Some(c @ ('l' | 'L')) => {
                    s.push(c);
                    self.advance();
                }
                Some(c @ ('f' | 'F')) if is_float => {
                    s.push(c);
                    self.advance();
                }
                Some(c @ ('i' | 'I' | 'j' | 'J')) => {
                    s.push(c);
                    self.advance();
                    is_imag = true;
                }
                _ => break,
            }
        }

        let kind = if is_imag {
            TokKind::ImagNumber
        } else if is_float {
            TokKind::FloatNumber
        } else {
            TokKind::IntNumber
        };
        Token::new(kind, s, self.file, loc)
    }

    fn scan_escape(&mut self, out: &mut String) -> bool {
        // called with cursor positioned right after the backslash
        match self.peek() {
            Some('n') => {
                out.push_str("\\n");
                self.advance();
            }
            Some('t') => {
                out.push_str("\\t");
                self.advance();
            }
            Some('r') => {
                out.push_str("\\r");
                self.advance();
            }
            Some('0') if !self.peek_at(1).is_some_and(|c| c.is_digit(8)) => {
                out.push_str("\\0");
                self.advance();
            }
            Some('\\') => {
                out.push_str("\\\\");
                self.advance();
            }
            Some('"') => {
                out.push_str("\\\"");
                self.advance();
            }
            Some('\'') => {
                out.push_str("\\'");
                self.advance();
            }
            Some('x') => {
                out.push_str("\\x");
                self.advance();
                let mut n = 0;
                while n < 2 {
                    if let Some(c) = self.peek() {
                        if c.is_ascii_hexdigit() {
                            out.push(c);
                            self.advance();
                            n += 1;
                            continue;
                        }
                    }
                    break;
                }
            }
            Some(c) if c.is_digit(8) => {
                out.push('\\');
                let mut n = 0;
                while n < 3 {
                    if let Some(c) = self.peek() {
                        if c.is_digit(8) {
                            out.push(c);
                            self.advance();
                            n += 1;
                            continue;
                        }
                    }
                    break;
                }
            }
            _ => return false,
        }
        true
    }

    fn scan_string(&mut self, wide: bool) -> Token {
        let loc = self.loc();
        let mut s = String::new();
        self.advance(); // opening quote
        let mut closed = false;
        while let Some(c) = self.peek() {
            if c == '"' {
                self.advance();
                closed = true;
                break;
            }
            if c == '\n' {
                break;
            }
            if c == '\\' {
                self.advance();
                if !self.scan_escape(&mut s) {
                    // unknown escape: keep the literal char
                    if let Some(c2) = self.peek() {
                        s.push(c2);
                        self.advance();
                    }
                }
                continue;
            }
            s.push(c);
            self.advance();
        }
        let kind = if wide { TokKind::WideStringLit } else { TokKind::StringLit };
        if !closed {
            return Token::new(TokKind::Unknown, format!("<<<UNTERMINATED_STRING>>>{s}"), self.file, loc);
        }
        Token::new(kind, s, self.file, loc)
    }

    fn scan_char(&mut self, wide: bool) -> Token {
        let loc = self.loc();
        let mut s = String::new();
        self.advance(); // opening quote
        let mut closed = false;
        while let Some(c) = self.peek() {
            if c == '\'' {
                self.advance();
                closed = true;
                break;
            }
            if c == '\n' {
                break;
            }
            if c == '\\' {
                self.advance();
                if !self.scan_escape(&mut s) {
                    if let Some(c2) = self.peek() {
                        s.push(c2);
                        self.advance();
                    }
                }
                continue;
            }
            s.push(c);
            self.advance();
        }
        let kind = if wide { TokKind::WideCharLit } else { TokKind::CharLit };
        if !closed {
            return Token::new(TokKind::Unknown, format!("<<<UNTERMINATED_CHAR>>>{s}"), self.file, loc);
        }
        Token::new(kind, s, self.file, loc)
    }

    /// Two/three-char punctuation, longest match first.
    fn scan_punct(&mut self) -> Token {
        let loc = self.loc();
        let three: Option<(&str, TokKind)> = match (self.peek(), self.peek_at(1), self.peek_at(2)) {
            (Some('.'), Some('.'), Some('.')) => Some(("...", TokKind::Ellipsis)),
            (Some('<'), Some('<'), Some('=')) => Some(("<<=", TokKind::ShlAssign)),
            (Some('>'), Some('>'), Some('=')) => Some((">>=", TokKind::ShrAssign)),
            _ => None,
        };
        if let Some((text, kind)) = three {
            for _ in 0..3 {
                self.advance();
            }
            return Token::new(kind, text, self.file, loc);
        }

        let two: Option<(&str, TokKind)> = match (self.peek(), self.peek_at(1)) {
            (Some('+'), Some('+')) => Some(("++", TokKind::PlusPlus)),
            (Some('-'), Some('-')) => Some(("--", TokKind::MinusMinus)),
            (Some('-'), Some('>')) => Some(("->", TokKind::Arrow)),
            (Some('<'), Some('<')) => Some(("<<", TokKind::Shl)),
            (Some('>'), Some('>')) => Some((">>", TokKind::Shr)),
            (Some('&'), Some('&')) => Some(("&&", TokKind::AmpAmp)),
            (Some('|'), Some('|')) => Some(("||", TokKind::PipePipe)),
            (Some('='), Some('=')) => Some(("==", TokKind::Eq)),
            (Some('!'), Some('=')) => Some(("!=", TokKind::Ne)),
            (Some('<'), Some('=')) => Some(("<=", TokKind::Le)),
            (Some('>'), Some('=')) => Some((">=", TokKind::Ge)),
            (Some('+'), Some('=')) => Some(("+=", TokKind::PlusAssign)),
            (Some('-'), Some('=')) => Some(("-=", TokKind::MinusAssign)),
            (Some('*'), Some('=')) => Some(("*=", TokKind::StarAssign)),
            (Some('/'), Some('=')) => Some(("/=", TokKind::SlashAssign)),
            (Some('%'), Some('=')) => Some(("%=", TokKind::PercentAssign)),
            (Some('&'), Some('=')) => Some(("&=", TokKind::AmpAssign)),
            (Some('|'), Some('=')) => Some(("|=", TokKind::PipeAssign)),
            (Some('^'), Some('=')) => Some(("^=", TokKind::CaretAssign)),
            _ => None,
        };
        if let Some((text, kind)) = two {
            self.advance();
            self.advance();
            return Token::new(kind, text, self.file, loc);
        }

        let c = self.advance().unwrap();
        let kind = match c {
            '(' => TokKind::LParen,
            ')' => TokKind::RParen,
            '{' => TokKind::LBrace,
            '}' => TokKind::RBrace,
            '[' => TokKind::LBracket,
            ']' => TokKind::RBracket,
            ';' => TokKind::Semi,
            ',' => TokKind::Comma,
            ':' => TokKind::Colon,
            '.' => TokKind::Dot,
            '?' => TokKind::Question,
            '=' => TokKind::Assign,
            '+' => TokKind::Plus,
            '-' => TokKind::Minus,
            '*' => TokKind::Star,
            '/' => TokKind::Slash,
            '%' => TokKind::Percent,
            '&' => TokKind::Amp,
            '|' => TokKind::Pipe,
            '^' => TokKind::Caret,
            '~' => TokKind::Tilde,
            '!' => TokKind::Bang,
            '<' => TokKind::Lt,
            '>' => TokKind::Gt,
            _ => TokKind::Unknown,
        };
        Token::new(kind, c.to_string(), self.file, loc)
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut out = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            if self.try_line_marker() {
                continue;
            }
            self.skip_whitespace_and_comments();
            match self.peek() {
                None => {
                    out.push(Token::new(TokKind::Eof, "", self.file, self.loc()));
                    break;
                }
                Some('L') if matches!(self.peek_at(1), Some('"')) => {
                    self.advance();
                    out.push(self.scan_string(true));
                }
                Some('L') if matches!(self.peek_at(1), Some('\'')) => {
                    self.advance();
                    out.push(self.scan_char(true));
                }
                Some(c) if c.is_alphabetic() || c == '_' => {
                    out.push(self.scan_ident());
                }
                Some(c) if c.is_ascii_digit() => {
                    out.push(self.scan_number());
                }
                Some('.') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                    out.push(self.scan_number());
                }
                Some('"') => {
                    out.push(self.scan_string(false));
                }
                Some('\'') => {
                    out.push(self.scan_char(false));
                }
                Some(_) => {
                    out.push(self.scan_punct());
                }
            }
        }
        out
    }
}

/// Convenience wrapper matching the public entry point's shape:
/// `lexer_tokenize(src) -> tokens`.
pub fn lexer_tokenize(src: &str, file: &str) -> Vec<Token> {
    Lexer::new(src, file).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokKind> {
        lexer_tokenize(src, "t.c").into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_function_tokens() {
        let ks = kinds("int f(int a){ return a+1; }");
        assert_eq!(
            ks,
            vec![
                TokKind::KwInt,
                TokKind::Ident,
                TokKind::LParen,
                TokKind::KwInt,
                TokKind::Ident,
                TokKind::RParen,
                TokKind::LBrace,
                TokKind::KwReturn,
                TokKind::Ident,
                TokKind::Plus,
                TokKind::IntNumber,
                TokKind::Semi,
                TokKind::RBrace,
                TokKind::Eof,
            ]
        );
    }

    #[test]
    fn float_before_int_on_decimal_point() {
        let toks = lexer_tokenize("5.0", "t.c");
        assert_eq!(toks[0].kind, TokKind::FloatNumber);
        assert_eq!(toks[0].lexeme, "5.0");
    }

    #[test]
    fn hex_and_suffixes() {
        let toks = lexer_tokenize("0x1Ful 10LL", "t.c");
        assert_eq!(toks[0].lexeme, "0x1Ful");
        assert_eq!(toks[1].lexeme, "10LL");
    }

    #[test]
    fn imaginary_suffix() {
        let toks = lexer_tokenize("3.0i", "t.c");
        assert_eq!(toks[0].kind, TokKind::ImagNumber);
    }

    #[test]
    fn string_escape_sequences() {
        let toks = lexer_tokenize(r#""a\nb\"c""#, "t.c");
        assert_eq!(toks[0].kind, TokKind::StringLit);
        assert_eq!(toks[0].lexeme, "a\\nb\\\"c");
    }

    #[test]
    fn unterminated_string_is_unknown() {
        let toks = lexer_tokenize("\"abc", "t.c");
        assert_eq!(toks[0].kind, TokKind::Unknown);
    }

    #[test]
    fn compound_assignment_operators() {
        let ks = kinds(">>= <<= += ...");
        assert_eq!(
            ks,
            vec![TokKind::ShrAssign, TokKind::ShlAssign, TokKind::PlusAssign, TokKind::Ellipsis, TokKind::Eof]
        );
    }

    #[test]
    fn wide_string_literal() {
        let toks = lexer_tokenize(r#"L"wide""#, "t.c");
        assert_eq!(toks[0].kind, TokKind::WideStringLit);
    }

    #[test]
    fn line_marker_updates_line_number() {
        let toks = lexer_tokenize("# 42 \"foo.h\"\nx", "t.c");
        assert_eq!(toks[0].loc.line, 42);
    }
}
