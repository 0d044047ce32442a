//! Diagnostics session.
//!
//! The reference implementation kept the "current error" as module-level
//! globals (file/function/line/column) set by whichever checker hit the
//! failure first. We thread a `&mut Diagnostics` through the checkers
//! instead: it is a small compilation-session object that owns the
//! collected errors and warnings and records "first error wins" the same
//! way the original error context did.

use crate::error::{CompileError, ErrorKind, SourceLoc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub file: String,
    pub loc: SourceLoc,
}

/// Owns the errors and warnings produced by one compilation invocation.
///
/// A second invocation should use a fresh `Diagnostics`; nothing here is
/// reused across translation units.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<CompileError>,
    warnings: Vec<Warning>,
    current_function: Option<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn enter_function(&mut self, name: impl Into<String>) {
        self.current_function = Some(name.into());
    }

    pub fn leave_function(&mut self) {
        self.current_function = None;
    }

    /// Record an error. Only the first error in a statement should actually
    /// be recorded by a caller; callers that detect an already-failed
    /// sub-production should bail without calling this again.
    pub fn error(&mut self, kind: ErrorKind, file: impl Into<String>, loc: SourceLoc, message: impl Into<String>) {
        let mut err = CompileError::new(kind, file, loc, message);
        if let Some(func) = &self.current_function {
            err = err.with_function(func.clone());
        }
        tracing::debug!(kind = ?err.kind, file = %err.file, loc = %err.loc, function = ?err.function, "{}", err.message);
        self.errors.push(err);
    }

    pub fn warn(&mut self, file: impl Into<String>, loc: SourceLoc, message: impl Into<String>) {
        let file = file.into();
        let message = message.into();
        tracing::warn!(%file, %loc, "{}", message);
        self.warnings.push(Warning { message, file, loc });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn first_error(&self) -> Option<&CompileError> {
        self.errors.first()
    }

    /// Format every collected error/warning, one per line, for display.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for e in &self.errors {
            out.push_str(&e.to_string());
            out.push('\n');
        }
        for w in &self.warnings {
            out.push_str(&format!("{}:{}: warning: {}\n", w.file, w.loc, w.message));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_wins() {
        let mut d = Diagnostics::new();
        d.error(ErrorKind::Semantic, "a.c", SourceLoc::new(1, 1), "first");
        d.error(ErrorKind::Semantic, "a.c", SourceLoc::new(2, 1), "second");
        assert_eq!(d.first_error().unwrap().message, "first");
        assert!(d.has_errors());
    }

    #[test]
    fn function_context_attached() {
        let mut d = Diagnostics::new();
        d.enter_function("main");
        d.error(ErrorKind::Semantic, "a.c", SourceLoc::new(1, 1), "oops");
        assert_eq!(d.errors()[0].function.as_deref(), Some("main"));
        d.leave_function();
    }
}
