//! Preprocessor: directive evaluation, macro expansion, conditional
//! inclusion, `#include`/`#include_next` resolution, `#pragma once`/`pack`,
//! and the built-in macros.

pub mod builtins;
pub mod cond;
pub mod include;
pub mod macros;

use crate::error::{CompileError, ErrorKind, SourceLoc};
use cond::CondStack;
use include::{path_is_within_root, IncludeForm, IncludeFrame, SearchDirs};
use macros::{expand_tokens, pp_tokenize, Macro, MacroTable};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

const DEFAULT_MAX_INCLUDE_DEPTH: usize = 20;

/// `(pragma_once_files, deps, pack_stack, pack_alignment, in_comment,
/// current_file, line_delta, builtin file/line/column/func/base_file/
/// include_level/counter, max_include_depth, system_header)`.
#[derive(Debug)]
pub struct PreprocContext {
    pub pragma_once_files: HashSet<PathBuf>,
    pub deps: Vec<PathBuf>,
    pub pack_stack: Vec<u32>,
    pub in_comment: bool,
    pub current_file: String,
    pub current_line: u32,
    pub line_delta: i64,
    pub base_file: String,
    pub include_level: usize,
    pub counter: u64,
    pub current_function: Option<String>,
    pub max_include_depth: usize,
    pub system_header: bool,
    pub warnings: Vec<String>,
}

impl PreprocContext {
    pub fn new(source_file: impl Into<String>) -> Self {
        let file = source_file.into();
        PreprocContext {
            pragma_once_files: HashSet::new(),
            deps: Vec::new(),
            pack_stack: Vec::new(),
            in_comment: false,
            current_file: file.clone(),
            current_line: 0,
            line_delta: 0,
            base_file: file,
            include_level: 0,
            counter: 0,
            current_function: None,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            system_header: false,
            warnings: Vec::new(),
        }
    }

    pub fn pack_alignment(&self) -> Option<u32> {
        self.pack_stack.last().copied()
    }
}

pub struct PreprocOptions {
    pub incdirs: Vec<PathBuf>,
    pub isystem_dirs: Vec<PathBuf>,
    pub defines: Vec<(String, String)>,
    pub undefines: Vec<String>,
    pub sysroot: Option<PathBuf>,
}

impl Default for PreprocOptions {
    fn default() -> Self {
        PreprocOptions {
            incdirs: Vec::new(),
            isystem_dirs: Vec::new(),
            defines: Vec::new(),
            undefines: Vec::new(),
            sysroot: None,
        }
    }
}

fn err(file: &str, line: u32, message: impl Into<String>) -> CompileError {
    CompileError::new(ErrorKind::Preprocessor, file, SourceLoc::new(line, 1), message)
}

fn register_builtins(macros: &mut MacroTable) {
    for name in builtins::BUILTIN_NAMES {
        macros.define(Macro {
            name: name.to_string(),
            params: Vec::new(),
            is_function_like: false,
            is_variadic: false,
            replacement: Vec::new(),
            is_builtin: true,
        });
    }
}

/// Split a `#define` directive's remainder (text after `define` and
/// whitespace) into `(name, params, is_variadic, replacement_tokens)`.
fn parse_define(rest: &str) -> Result<(String, Vec<String>, bool, Vec<String>), String> {
    let rest = rest.trim_start();
    let name_end = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if name_end == 0 {
        return Err("expected macro name after #define".to_string());
    }
    let name = rest[..name_end].to_string();
    let after_name = &rest[name_end..];

    if let Some(paren_rest) = after_name.strip_prefix('(') {
        let close = paren_rest.find(')').ok_or("unterminated macro parameter list")?;
        let param_list = &paren_rest[..close];
        let mut params = Vec::new();
        let mut variadic = false;
        for p in param_list.split(',') {
            let p = p.trim();
            if p.is_empty() {
                continue;
            }
            if p == "..." {
                variadic = true;
                params.push("__VA_ARGS__".to_string());
            } else if let Some(named) = p.strip_suffix("...") {
                variadic = true;
                params.push(named.trim().to_string());
            } else {
                params.push(p.to_string());
            }
        }
        let replacement = pp_tokenize(paren_rest[close + 1..].trim_start());
        Ok((name, params, variadic, replacement))
    } else {
        let replacement = pp_tokenize(after_name.trim_start());
        Ok((name, Vec::new(), false, replacement))
    }
}

/// `preproc_run(ctx, path, incdirs, isystem_dirs, defines, undefines,
/// sysroot) -> preprocessed text or failure`.
pub fn preproc_run(path: &Path, opts: &PreprocOptions) -> Result<(String, PreprocContext), CompileError> {
    let mut ctx = PreprocContext::new(path.display().to_string());
    let mut macros = MacroTable::new();
    register_builtins(&mut macros);
    for (name, value) in &opts.defines {
        macros.define(Macro {
            name: name.clone(),
            params: Vec::new(),
            is_function_like: false,
            is_variadic: false,
            replacement: pp_tokenize(value),
            is_builtin: false,
        });
    }
    for name in &opts.undefines {
        macros.undef(name);
    }

    let mut conds = CondStack::new();
    let mut out = String::new();
    let mut stack: Vec<IncludeFrame> = Vec::new();
    process_file(path, &mut macros, &mut conds, &mut out, opts, &mut stack, &mut ctx)?;

    if !conds.is_balanced() {
        return Err(err(&ctx.current_file, ctx.current_line, "unbalanced #if/#endif"));
    }
    Ok((out, ctx))
}

fn expand_builtins_in_line(tokens: Vec<String>, ctx: &mut PreprocContext) -> Vec<String> {
    tokens
        .into_iter()
        .map(|t| builtins::expand_builtin(&t, ctx).unwrap_or(t))
        .collect()
}

fn process_file(
    path: &Path,
    macros: &mut MacroTable,
    conds: &mut CondStack,
    out: &mut String,
    opts: &PreprocOptions,
    stack: &mut Vec<IncludeFrame>,
    ctx: &mut PreprocContext,
) -> Result<(), CompileError> {
    if stack.len() > ctx.max_include_depth {
        return Err(err(&path.display().to_string(), 0, "#include depth exceeded max_include_depth"));
    }

    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if ctx.pragma_once_files.contains(&canonical) {
        return Ok(());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| err(&path.display().to_string(), 0, format!("cannot read include file: {e}")))?;
    ctx.deps.push(canonical.clone());

    let saved_file = ctx.current_file.clone();
    let saved_line = ctx.current_line;
    let saved_delta = ctx.line_delta;
    ctx.current_file = path.display().to_string();
    ctx.current_line = 0;
    ctx.line_delta = 0;

    // Join backslash-newline continuations and multi-line /* */ comments
    // into logical lines before directive dispatch.
    let physical: Vec<&str> = contents.lines().collect();
    let mut logical_lines: Vec<(String, u32)> = Vec::new();
    let mut pending = String::new();
    let mut pending_start_line = 1u32;
    let mut i = 0usize;
    while i < physical.len() {
        let line_no = (i + 1) as u32;
        let mut line = physical[i].to_string();
        while line.ends_with('\\') {
            line.pop();
            i += 1;
            if i >= physical.len() {
                break;
            }
            line.push_str(physical[i]);
        }
        if pending.is_empty() {
            pending_start_line = line_no;
        } else {
            pending.push(' ');
        }
        pending.push_str(&line);

        if ctx.in_comment || pending.contains("/*") {
            if let Some(consumed) = consume_block_comment(&mut pending, ctx) {
                logical_lines.push((consumed, pending_start_line));
                pending = String::new();
            } else {
                i += 1;
                continue;
            }
        } else {
            logical_lines.push((std::mem::take(&mut pending), pending_start_line));
        }
        i += 1;
    }
    if !pending.is_empty() {
        logical_lines.push((pending, pending_start_line));
    }

    let mut frame_dir_index: Option<usize> = stack.last().map(|f| f.dir_index);
    for (line, line_no) in logical_lines {
        ctx.current_line = line_no;
        process_line(&line, macros, conds, out, opts, stack, ctx, path, &mut frame_dir_index)?;
    }

    ctx.current_file = saved_file;
    ctx.current_line = saved_line;
    ctx.line_delta = saved_delta;
    Ok(())
}

/// Strip a (possibly multi-logical-line) `/* ... */` comment from `pending`.
/// Returns `Some(text-with-comment-removed)` once the comment closes, or
/// `None` while still inside it (the caller should keep accumulating lines).
fn consume_block_comment(pending: &mut String, ctx: &mut PreprocContext) -> Option<String> {
    let mut result = String::new();
    let chars: Vec<char> = pending.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if ctx.in_comment {
            if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                ctx.in_comment = false;
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }
        if chars[i] == '/' && chars.get(i + 1) == Some(&'*') {
            ctx.in_comment = true;
            i += 2;
            continue;
        }
        result.push(chars[i]);
        i += 1;
    }
    if ctx.in_comment {
        None
    } else {
        Some(result)
    }
}

#[allow(clippy::too_many_arguments)]
fn process_line(
    line: &str,
    macros: &mut MacroTable,
    conds: &mut CondStack,
    out: &mut String,
    opts: &PreprocOptions,
    stack: &mut Vec<IncludeFrame>,
    ctx: &mut PreprocContext,
    current_path: &Path,
    frame_dir_index: &mut Option<usize>,
) -> Result<(), CompileError> {
    let trimmed = line.trim_start();
    if let Some(directive) = trimmed.strip_prefix('#') {
        let directive = directive.trim_start();
        let (name, rest) = directive.split_once(char::is_whitespace).unwrap_or((directive, ""));
        let name = name.trim();
        let rest = rest.trim();

        let active = conds.is_active();
        match name {
            "ifdef" if active => {
                conds.push_if(macros.is_defined(rest));
                return Ok(());
            }
            "ifdef" => {
                conds.push_frame_inactive();
                return Ok(());
            }
            "ifndef" if active => {
                conds.push_if(!macros.is_defined(rest));
                return Ok(());
            }
            "ifndef" => {
                conds.push_frame_inactive();
                return Ok(());
            }
            "if" if active => {
                let cond = cond::eval_directive_expr(rest, macros).map_err(|e| err(&ctx.current_file, ctx.current_line, e))?;
                conds.push_if(cond);
                return Ok(());
            }
            "if" => {
                conds.push_frame_inactive();
                return Ok(());
            }
            "elif" if active || conds.depth() > 0 => {
                if conds.depth() == 0 {
                    return Err(err(&ctx.current_file, ctx.current_line, "#elif without #if"));
                }
                let cond = cond::eval_directive_expr(rest, macros).map_err(|e| err(&ctx.current_file, ctx.current_line, e))?;
                conds.elif(cond).map_err(|e| err(&ctx.current_file, ctx.current_line, e))?;
                return Ok(());
            }
            "else" => {
                conds.else_branch().map_err(|e| err(&ctx.current_file, ctx.current_line, e))?;
                return Ok(());
            }
            "endif" => {
                conds.endif().map_err(|e| err(&ctx.current_file, ctx.current_line, e))?;
                return Ok(());
            }
            _ if !conds.is_active() => {
                // Inactive branch: only conditional directives are honored above.
                return Ok(());
            }
            "include" | "include_next" => {
                return handle_include(name == "include_next", rest, macros, conds, out, opts, stack, ctx, current_path, frame_dir_index);
            }
            "define" => {
                let (mname, params, variadic, replacement) =
                    parse_define(rest).map_err(|e| err(&ctx.current_file, ctx.current_line, e))?;
                macros.define(Macro {
                    name: mname,
                    is_function_like: rest.trim_start().starts_with(|c: char| c.is_alphanumeric() || c == '_')
                        && rest.chars().nth(rest.find(|c: char| !(c.is_alphanumeric() || c == '_')).unwrap_or(0)) == Some('('),
                    is_variadic: variadic,
                    params,
                    replacement,
                    is_builtin: false,
                });
                return Ok(());
            }
            "undef" => {
                macros.undef(rest.trim());
                return Ok(());
            }
            "pragma" => {
                handle_pragma(rest, ctx, current_path);
                return Ok(());
            }
            "line" => {
                handle_line_directive(rest, ctx);
                return Ok(());
            }
            "error" => {
                return Err(err(&ctx.current_file, ctx.current_line, format!("#error {rest}")));
            }
            "warning" => {
                ctx.warnings.push(format!("{}:{}: warning: {}", ctx.current_file, ctx.current_line, rest));
                return Ok(());
            }
            _ => {
                return Err(err(&ctx.current_file, ctx.current_line, format!("unknown preprocessor directive '#{name}'")));
            }
        }
    }

    if !conds.is_active() {
        return Ok(());
    }
    if line.trim().is_empty() {
        out.push('\n');
        return Ok(());
    }

    let raw = pp_tokenize(line);
    let mut painted = HashSet::new();
    let expanded = expand_tokens(&raw, macros, &mut painted).map_err(|e| err(&ctx.current_file, ctx.current_line, e))?;
    let substituted = expand_builtins_in_line(expanded, ctx);
    out.push_str(&substituted.join(" "));
    out.push('\n');
    Ok(())
}

fn handle_pragma(rest: &str, ctx: &mut PreprocContext, current_path: &Path) {
    let rest = rest.trim();
    if rest == "once" {
        let canonical = current_path.canonicalize().unwrap_or_else(|_| current_path.to_path_buf());
        ctx.pragma_once_files.insert(canonical);
        return;
    }
    if let Some(arg) = rest.strip_prefix("pack") {
        let arg = arg.trim();
        if let Some(inner) = arg.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            let inner = inner.trim();
            if inner.is_empty() {
                ctx.pack_stack.pop();
            } else if let Ok(n) = inner.parse::<u32>() {
                ctx.pack_stack.push(n);
            }
        }
    }
}

fn handle_line_directive(rest: &str, ctx: &mut PreprocContext) {
    let mut parts = rest.splitn(2, char::is_whitespace);
    let Some(num) = parts.next().and_then(|s| s.parse::<i64>().ok()) else {
        return;
    };
    let next_physical_line = ctx.current_line as i64 + 1;
    ctx.line_delta = num - next_physical_line;
    if let Some(file_part) = parts.next() {
        let file_part = file_part.trim();
        if let Some(name) = file_part.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            ctx.current_file = name.to_string();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_include(
    is_next: bool,
    rest: &str,
    macros: &mut MacroTable,
    conds: &mut CondStack,
    out: &mut String,
    opts: &PreprocOptions,
    stack: &mut Vec<IncludeFrame>,
    ctx: &mut PreprocContext,
    current_path: &Path,
    frame_dir_index: &mut Option<usize>,
) -> Result<(), CompileError> {
    let rest = rest.trim();
    let (form, name) = if let Some(inner) = rest.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        (IncludeForm::Quoted, inner.to_string())
    } else if let Some(inner) = rest.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        (IncludeForm::Angled, inner.to_string())
    } else {
        // Macro-expanded include: expand tokens, then re-split on quotes/angles.
        let raw = pp_tokenize(rest);
        let mut painted = HashSet::new();
        let expanded = expand_tokens(&raw, macros, &mut painted).map_err(|e| err(&ctx.current_file, ctx.current_line, e))?;
        let text = expanded.join("");
        if let Some(inner) = text.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            (IncludeForm::Quoted, inner.to_string())
        } else if let Some(inner) = text.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            (IncludeForm::Angled, inner.to_string())
        } else {
            return Err(err(&ctx.current_file, ctx.current_line, format!("malformed #include directive: {rest}")));
        }
    };

    let including_dir = current_path.parent();
    let dirs = SearchDirs {
        including_file_dir: including_dir,
        incdirs: &opts.incdirs,
        isystem_dirs: &opts.isystem_dirs,
        stdlib_dirs: &[],
    };

    let resolved = if is_next {
        let after = frame_dir_index.ok_or_else(|| err(&ctx.current_file, ctx.current_line, "#include_next outside any include"))?;
        dirs.resolve_next(&name, after)
    } else {
        dirs.resolve(&name, form)
    };
    let Some(resolved) = resolved else {
        return Err(err(&ctx.current_file, ctx.current_line, format!("cannot find include file '{name}'")));
    };

    if let Some(root) = &opts.sysroot {
        let within = path_is_within_root(&resolved.path, root).unwrap_or(false);
        if !within {
            return Err(err(&ctx.current_file, ctx.current_line, format!("include '{name}' escapes sysroot")));
        }
    }

    stack.push(IncludeFrame {
        path: resolved.path.clone(),
        dir_index: resolved.dir_index,
    });
    ctx.include_level += 1;
    let saved_current_line = ctx.current_line;
    let result = {
        let path = resolved.path.clone();
        process_file(&path, macros, conds, out, opts, stack, ctx)
    };
    ctx.current_line = saved_current_line;
    ctx.include_level -= 1;
    stack.pop();
    result?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn run(dir: &Path, entry: &str, opts: &PreprocOptions) -> Result<String, CompileError> {
        preproc_run(&dir.join(entry), opts).map(|(text, _)| text)
    }

    #[test]
    fn object_like_macro_expands_in_text() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.c"), "#define N 42\nint x = N;\n").unwrap();
        let text = run(dir.path(), "a.c", &PreprocOptions::default()).unwrap();
        assert!(text.contains("42"));
    }

    #[test]
    fn pragma_once_prevents_double_inclusion() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("h.h"), "#pragma once\nint shared;\n").unwrap();
        fs::write(
            dir.path().join("a.c"),
            "#include \"h.h\"\n#include \"h.h\"\nint main(void){return 0;}\n",
        )
        .unwrap();
        let text = run(dir.path(), "a.c", &PreprocOptions::default()).unwrap();
        assert_eq!(text.matches("shared").count(), 1);
    }

    #[test]
    fn conditional_inclusion_skips_false_branch() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.c"), "#if 0\nint dead;\n#else\nint alive;\n#endif\n").unwrap();
        let text = run(dir.path(), "a.c", &PreprocOptions::default()).unwrap();
        assert!(text.contains("alive"));
        assert!(!text.contains("dead"));
    }

    #[test]
    fn ifdef_and_undef() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.c"),
            "#define FEATURE\n#ifdef FEATURE\nint on;\n#endif\n#undef FEATURE\n#ifdef FEATURE\nint off;\n#endif\n",
        )
        .unwrap();
        let text = run(dir.path(), "a.c", &PreprocOptions::default()).unwrap();
        assert!(text.contains("on"));
        assert!(!text.contains("off"));
    }

    #[test]
    fn include_next_across_two_search_dirs() {
        let root = tempdir().unwrap();
        let dir1 = root.path().join("dir1");
        let dir2 = root.path().join("dir2");
        fs::create_dir_all(&dir1).unwrap();
        fs::create_dir_all(&dir2).unwrap();
        fs::write(dir1.join("foo.h"), "#include_next <foo.h>\nint from_dir1;\n").unwrap();
        fs::write(dir2.join("foo.h"), "int from_dir2;\n").unwrap();
        fs::write(root.path().join("a.c"), "#include <foo.h>\n").unwrap();

        let opts = PreprocOptions {
            incdirs: vec![dir1.clone(), dir2.clone()],
            ..PreprocOptions::default()
        };
        let (text, ctx) = preproc_run(&root.path().join("a.c"), &opts).unwrap();
        assert!(text.contains("from_dir1"));
        assert!(text.contains("from_dir2"));
        assert!(ctx.deps.iter().any(|p| p.ends_with("dir1/foo.h")));
        assert!(ctx.deps.iter().any(|p| p.ends_with("dir2/foo.h")));
    }

    #[test]
    fn missing_include_is_a_failure() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.c"), "#include \"nope.h\"\n").unwrap();
        assert!(run(dir.path(), "a.c", &PreprocOptions::default()).is_err());
    }

    #[test]
    fn include_depth_exceeded_is_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.c"), "#include \"a.c\"\n").unwrap();
        let mut opts = PreprocOptions::default();
        opts.incdirs.push(dir.path().to_path_buf());
        assert!(run(dir.path(), "a.c", &opts).is_err());
    }

    #[test]
    fn builtin_counter_and_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.c"), "int a = __COUNTER__;\nint b = __COUNTER__;\n").unwrap();
        let text = run(dir.path(), "a.c", &PreprocOptions::default()).unwrap();
        assert!(text.contains("int a = 0"));
        assert!(text.contains("int b = 1"));
    }

    #[test]
    fn pack_pragma_tracked_on_stack() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.c"), "#pragma pack(1)\nstruct s{char a; int b;};\n#pragma pack()\n").unwrap();
        let (_, ctx) = preproc_run(&dir.path().join("a.c"), &PreprocOptions::default()).unwrap();
        assert!(ctx.pack_stack.is_empty());
    }
}
