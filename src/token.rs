//! Token kinds and the `Token` record produced by the lexer.

use crate::error::SourceLoc;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokKind {
    // Literals
    IntNumber,
    FloatNumber,
    ImagNumber,
    CharLit,
    WideCharLit,
    StringLit,
    WideStringLit,
    Ident,

    // Keywords
    KwAuto,
    KwBreak,
    KwCase,
    KwChar,
    KwConst,
    KwContinue,
    KwDefault,
    KwDo,
    KwDouble,
    KwElse,
    KwEnum,
    KwExtern,
    KwFloat,
    KwFor,
    KwGoto,
    KwIf,
    KwInline,
    KwInt,
    KwLong,
    KwRegister,
    KwRestrict,
    KwReturn,
    KwShort,
    KwSigned,
    KwSizeof,
    KwStatic,
    KwStruct,
    KwSwitch,
    KwTypedef,
    KwUnion,
    KwUnsigned,
    KwVoid,
    KwVolatile,
    KwWhile,
    KwBool,
    KwComplex,
    KwNoreturn,
    KwAlignas,
    KwAlignof,
    KwStaticAssert,
    KwAttribute,
    KwOffsetof,
    KwTypeof,

    // Punctuation / operators
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Colon,
    Dot,
    Ellipsis,
    Question,
    Arrow,

    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    ShlAssign,
    ShrAssign,

    Plus,
    PlusPlus,
    Minus,
    MinusMinus,
    Star,
    Slash,
    Percent,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    Tilde,
    Bang,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Shl,
    Shr,

    Eof,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokKind,
    pub lexeme: String,
    pub loc: SourceLoc,
    pub file: String,
}

impl Token {
    pub fn new(kind: TokKind, lexeme: impl Into<String>, file: impl Into<String>, loc: SourceLoc) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            file: file.into(),
            loc,
        }
    }

    pub fn is(&self, kind: TokKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.lexeme)
    }
}

/// Keyword lookup table, including the GNU/C11 extensions named in scope
/// (`_Bool`, `_Complex`, `_Noreturn`, `_Alignas`, `_Alignof`,
/// `_Static_assert`, `__attribute__`, and `typeof`).
pub fn keyword_kind(ident: &str) -> Option<TokKind> {
    Some(match ident {
        "auto" => TokKind::KwAuto,
        "break" => TokKind::KwBreak,
        "case" => TokKind::KwCase,
        "char" => TokKind::KwChar,
        "const" => TokKind::KwConst,
        "continue" => TokKind::KwContinue,
        "default" => TokKind::KwDefault,
        "do" => TokKind::KwDo,
        "double" => TokKind::KwDouble,
        "else" => TokKind::KwElse,
        "enum" => TokKind::KwEnum,
        "extern" => TokKind::KwExtern,
        "float" => TokKind::KwFloat,
        "for" => TokKind::KwFor,
        "goto" => TokKind::KwGoto,
        "if" => TokKind::KwIf,
        "inline" => TokKind::KwInline,
        "int" => TokKind::KwInt,
        "long" => TokKind::KwLong,
        "register" => TokKind::KwRegister,
        "restrict" => TokKind::KwRestrict,
        "return" => TokKind::KwReturn,
        "short" => TokKind::KwShort,
        "signed" => TokKind::KwSigned,
        "sizeof" => TokKind::KwSizeof,
        "static" => TokKind::KwStatic,
        "struct" => TokKind::KwStruct,
        "switch" => TokKind::KwSwitch,
        "typedef" => TokKind::KwTypedef,
        "union" => TokKind::KwUnion,
        "unsigned" => TokKind::KwUnsigned,
        "void" => TokKind::KwVoid,
        "volatile" => TokKind::KwVolatile,
        "while" => TokKind::KwWhile,
        "_Bool" => TokKind::KwBool,
        "_Complex" => TokKind::KwComplex,
        "_Noreturn" => TokKind::KwNoreturn,
        "_Alignas" => TokKind::KwAlignas,
        "_Alignof" => TokKind::KwAlignof,
        "_Static_assert" => TokKind::KwStaticAssert,
        "__attribute__" => TokKind::KwAttribute,
        "offsetof" => TokKind::KwOffsetof,
        "typeof" | "__typeof__" => TokKind::KwTypeof,
        _ => return None,
    })
}

/// Human-readable name for a token kind, used in "expected X" diagnostics.
pub fn kind_name(kind: TokKind) -> &'static str {
    match kind {
        TokKind::Ident => "identifier",
        TokKind::IntNumber => "integer literal",
        TokKind::FloatNumber => "floating literal",
        TokKind::ImagNumber => "imaginary literal",
        TokKind::CharLit | TokKind::WideCharLit => "character literal",
        TokKind::StringLit | TokKind::WideStringLit => "string literal",
        TokKind::LParen => "'('",
        TokKind::RParen => "')'",
        TokKind::LBrace => "'{'",
        TokKind::RBrace => "'}'",
        TokKind::LBracket => "'['",
        TokKind::RBracket => "']'",
        TokKind::Semi => "';'",
        TokKind::Comma => "','",
        TokKind::Colon => "':'",
        TokKind::Eof => "end of file",
        _ => "token",
    }
}
