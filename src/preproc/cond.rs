//! Conditional inclusion (`#if`/`#ifdef`/`#ifndef`/`#elif`/`#else`/`#endif`).

use super::macros::{expand_tokens, pp_tokenize, MacroTable};
use crate::consteval::eval_tokens;
use crate::lexer::lexer_tokenize;
use std::collections::HashSet;

/// One open `#if` nesting level. `parent_active` is true iff every
/// enclosing branch is currently taking; `taking` is true iff this
/// specific branch is active; `taken` is true iff some branch at this
/// level has already been selected (so a later `#elif`/`#else` is skipped).
#[derive(Debug, Clone, Copy)]
pub struct CondState {
    pub parent_active: bool,
    pub taking: bool,
    pub taken: bool,
}

#[derive(Debug, Default)]
pub struct CondStack {
    stack: Vec<CondState>,
}

impl CondStack {
    pub fn new() -> Self {
        CondStack::default()
    }

    /// True when a text line at the current nesting should be emitted.
    pub fn is_active(&self) -> bool {
        self.stack.last().map(|c| c.parent_active && c.taking).unwrap_or(true)
    }

    fn enclosing_active(&self) -> bool {
        self.stack.last().map(|c| c.parent_active && c.taking).unwrap_or(true)
    }

    pub fn push_if(&mut self, cond: bool) {
        let parent_active = self.enclosing_active();
        let taking = parent_active && cond;
        self.stack.push(CondState {
            parent_active,
            taking,
            taken: taking,
        });
    }

    pub fn push_frame_inactive(&mut self) {
        // Used when an enclosing branch is already inactive: the new
        // level inherits inactivity regardless of its own condition.
        self.stack.push(CondState {
            parent_active: false,
            taking: false,
            taken: false,
        });
    }

    pub fn elif(&mut self, cond: bool) -> Result<(), String> {
        let top = self.stack.last_mut().ok_or("#elif without #if")?;
        if top.parent_active && !top.taken {
            top.taking = cond;
            top.taken = cond;
        } else {
            top.taking = false;
        }
        Ok(())
    }

    pub fn else_branch(&mut self) -> Result<(), String> {
        let top = self.stack.last_mut().ok_or("#else without #if")?;
        if top.parent_active && !top.taken {
            top.taking = true;
            top.taken = true;
        } else {
            top.taking = false;
        }
        Ok(())
    }

    pub fn endif(&mut self) -> Result<(), String> {
        self.stack.pop().ok_or("#endif without #if")?;
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_balanced(&self) -> bool {
        self.stack.is_empty()
    }
}

/// Evaluate a `#if`/`#elif` controlling expression: resolve `defined(X)` /
/// `defined X` without macro-expanding `X`, macro-expand the remainder,
/// then evaluate as an integer constant expression.
pub fn eval_directive_expr(rest: &str, macros: &MacroTable) -> Result<bool, String> {
    let raw = pp_tokenize(rest);
    let mut resolved = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == "defined" {
            let (name, consumed) = if raw.get(i + 1).map(String::as_str) == Some("(") {
                let name = raw.get(i + 2).cloned().ok_or("malformed defined(...) in #if")?;
                if raw.get(i + 3).map(String::as_str) != Some(")") {
                    return Err("malformed defined(...) in #if".to_string());
                }
                (name, 4)
            } else {
                let name = raw.get(i + 1).cloned().ok_or("malformed defined X in #if")?;
                (name, 2)
            };
            resolved.push(if macros.is_defined(&name) { "1" } else { "0" }.to_string());
            i += consumed;
            continue;
        }
        resolved.push(raw[i].clone());
        i += 1;
    }

    let mut painted = HashSet::new();
    let expanded = expand_tokens(&resolved, macros, &mut painted)?;
    let text = expanded.join(" ");
    let toks = lexer_tokenize(&text, "<if>");
    let value = eval_tokens(&toks)?;
    Ok(value != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_if_tracks_parent_activity() {
        let mut c = CondStack::new();
        c.push_if(true);
        assert!(c.is_active());
        c.push_if(false);
        assert!(!c.is_active());
        c.endif().unwrap();
        assert!(c.is_active());
        c.endif().unwrap();
        assert!(c.is_balanced());
    }

    #[test]
    fn elif_only_fires_if_nothing_taken_yet() {
        let mut c = CondStack::new();
        c.push_if(false);
        c.elif(true).unwrap();
        assert!(c.is_active());
        c.elif(true).unwrap();
        assert!(!c.is_active());
    }

    #[test]
    fn unbalanced_endif_errors() {
        let mut c = CondStack::new();
        assert!(c.endif().is_err());
    }

    #[test]
    fn defined_form_both_shapes() {
        let mut m = MacroTable::new();
        m.define(super::super::macros::Macro {
            name: "FOO".to_string(),
            params: vec![],
            is_function_like: false,
            is_variadic: false,
            replacement: vec![],
            is_builtin: false,
        });
        assert!(eval_directive_expr("defined(FOO)", &m).unwrap());
        assert!(eval_directive_expr("defined FOO", &m).unwrap());
        assert!(!eval_directive_expr("defined(BAR)", &m).unwrap());
    }
}
