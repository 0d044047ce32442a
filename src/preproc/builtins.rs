//! Built-in macros: `__FILE__`, `__LINE__`, `__COUNTER__`, `__BASE_FILE__`,
//! `__INCLUDE_LEVEL__`, `__func__`.

use super::PreprocContext;

pub const BUILTIN_NAMES: &[&str] = &[
    "__FILE__",
    "__LINE__",
    "__COUNTER__",
    "__BASE_FILE__",
    "__INCLUDE_LEVEL__",
    "__func__",
];

/// Expand a single built-in macro name to its replacement text, given the
/// current preprocessor context. `__COUNTER__` mutates `ctx.counter`.
pub fn expand_builtin(name: &str, ctx: &mut PreprocContext) -> Option<String> {
    match name {
        "__FILE__" => Some(format!("\"{}\"", ctx.current_file)),
        "__LINE__" => Some((ctx.current_line as i64 + ctx.line_delta).to_string()),
        "__COUNTER__" => {
            let v = ctx.counter;
            ctx.counter += 1;
            Some(v.to_string())
        }
        "__BASE_FILE__" => Some(format!("\"{}\"", ctx.base_file)),
        "__INCLUDE_LEVEL__" => Some(ctx.include_level.to_string()),
        "__func__" => Some(format!("\"{}\"", ctx.current_function.as_deref().unwrap_or(""))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_increments_each_call() {
        let mut ctx = PreprocContext::new("a.c");
        assert_eq!(expand_builtin("__COUNTER__", &mut ctx), Some("0".to_string()));
        assert_eq!(expand_builtin("__COUNTER__", &mut ctx), Some("1".to_string()));
    }

    #[test]
    fn line_reflects_line_delta_from_hash_line() {
        let mut ctx = PreprocContext::new("a.c");
        ctx.current_line = 10;
        ctx.line_delta = 90;
        assert_eq!(expand_builtin("__LINE__", &mut ctx), Some("100".to_string()));
    }

    #[test]
    fn file_is_quoted() {
        let mut ctx = PreprocContext::new("a.c");
        assert_eq!(expand_builtin("__FILE__", &mut ctx), Some("\"a.c\"".to_string()));
    }
}
