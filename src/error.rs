//! Error and diagnostic types shared across the compiler core.

use std::fmt;

/// A source location used in diagnostics and carried on tokens, AST nodes,
/// and IR instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SourceLoc {
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    pub fn new(line: u32, column: u32) -> Self {
        SourceLoc { line, column }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The broad category of an error, matching the taxonomy in the error
/// handling design: lexical, preprocessor, syntactic, semantic, overflow,
/// internal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Preprocessor,
    Syntactic,
    Semantic,
    Overflow,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Lexical => "lexical",
            ErrorKind::Preprocessor => "preprocessor",
            ErrorKind::Syntactic => "syntactic",
            ErrorKind::Semantic => "semantic",
            ErrorKind::Overflow => "overflow",
            ErrorKind::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// A single compiler error: kind, message, location, and the file and
/// (where applicable) enclosing function it occurred in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub file: String,
    pub function: Option<String>,
    pub loc: SourceLoc,
}

impl CompileError {
    pub fn new(kind: ErrorKind, file: impl Into<String>, loc: SourceLoc, message: impl Into<String>) -> Self {
        CompileError {
            kind,
            message: message.into(),
            file: file.into(),
            function: None,
            loc,
        }
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {} error: {}", self.file, self.loc, self.kind, self.message)?;
        if let Some(func) = &self.function {
            write!(f, " (in {func})")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

pub type CResult<T> = Result<T, CompileError>;
