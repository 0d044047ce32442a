//! Macro model and expansion: object-like and function-like macros,
//! variadic `__VA_ARGS__`, stringization, token pasting, and the
//! self-recursion "painting" guard.

use std::collections::{HashMap, HashSet};

/// A macro record: `(name, params, value, is_variadic, is_builtin)`.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub params: Vec<String>,
    pub is_function_like: bool,
    pub is_variadic: bool,
    pub replacement: Vec<String>,
    pub is_builtin: bool,
}

#[derive(Debug, Default, Clone)]
pub struct MacroTable {
    macros: HashMap<String, Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        MacroTable::default()
    }

    pub fn define(&mut self, m: Macro) {
        self.macros.insert(m.name.clone(), m);
    }

    pub fn undef(&mut self, name: &str) {
        self.macros.remove(name);
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }
}

/// Splits a line of (already continuation-joined) text into preprocessing
/// tokens: identifiers, pp-numbers, string/char literals (kept whole, with
/// escape-awareness so that embedded `,`/`(`/`)` never split a token), the
/// two-character paste operator `##`, and single-character punctuation.
pub fn pp_tokenize(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;
    let mut out = Vec::new();
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '_' || c.is_alphabetic() {
            let start = i;
            while i < chars.len() && (chars[i] == '_' || chars[i].is_alphanumeric()) {
                i += 1;
            }
            out.push(chars[start..i].iter().collect());
            continue;
        }
        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) {
            let start = i;
            i += 1;
            while i < chars.len() {
                let d = chars[i];
                if (d == '+' || d == '-') && i > start && matches!(chars[i - 1], 'e' | 'E' | 'p' | 'P') {
                    i += 1;
                    continue;
                }
                if d.is_ascii_alphanumeric() || d == '.' || d == '_' {
                    i += 1;
                    continue;
                }
                break;
            }
            out.push(chars[start..i].iter().collect());
            continue;
        }
        if c == '"' || c == '\'' {
            let quote = c;
            let start = i;
            i += 1;
            while i < chars.len() {
                if chars[i] == '\\' && i + 1 < chars.len() {
                    i += 2;
                    continue;
                }
                if chars[i] == quote {
                    i += 1;
                    break;
                }
                i += 1;
            }
            out.push(chars[start..i].iter().collect());
            continue;
        }
        if c == '#' && chars.get(i + 1) == Some(&'#') {
            out.push("##".to_string());
            i += 2;
            continue;
        }
        out.push(c.to_string());
        i += 1;
    }
    out
}

fn is_ident_token(t: &str) -> bool {
    t.chars().next().is_some_and(|c| c == '_' || c.is_alphabetic())
}

/// Stringize an argument's raw token sequence into the spelling of a C
/// string literal: join with single spaces, escape `\` and `"`.
fn stringize(arg_tokens: &[String]) -> String {
    let joined = arg_tokens.join(" ");
    let mut escaped = String::with_capacity(joined.len() + 2);
    escaped.push('"');
    for c in joined.chars() {
        if c == '\\' || c == '"' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('"');
    escaped
}

/// Splits the tokens inside a function-like invocation's parentheses into
/// top-level arguments; commas nested inside parens are not split (the
/// string/char literal boundary was already resolved by `pp_tokenize`).
fn split_args(tokens: &[String]) -> Vec<Vec<String>> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0i32;
    for t in tokens {
        match t.as_str() {
            "(" => {
                depth += 1;
                current.push(t.clone());
            }
            ")" => {
                depth -= 1;
                current.push(t.clone());
            }
            "," if depth == 0 => {
                args.push(std::mem::take(&mut current));
            }
            _ => current.push(t.clone()),
        }
    }
    args.push(current);
    args
}

/// Expand a token sequence against the macro table. `painted` holds the
/// names currently "in progress" on the expansion stack; a painted macro
/// name is emitted verbatim rather than re-expanded.
pub fn expand_tokens(tokens: &[String], table: &MacroTable, painted: &mut HashSet<String>) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let tok = &tokens[i];
        if !is_ident_token(tok) || painted.contains(tok) {
            out.push(tok.clone());
            i += 1;
            continue;
        }
        let Some(mac) = table.get(tok) else {
            out.push(tok.clone());
            i += 1;
            continue;
        };
        if mac.is_builtin {
            // Built-in macros are expanded by the caller before reaching
            // here (they need preprocessor-context state); pass through.
            out.push(tok.clone());
            i += 1;
            continue;
        }
        if !mac.is_function_like {
            let name = mac.name.clone();
            let replacement = mac.replacement.clone();
            painted.insert(name.clone());
            let expanded = expand_tokens(&replacement, table, painted)?;
            painted.remove(&name);
            out.extend(expanded);
            i += 1;
            continue;
        }

        // Function-like: require a following '(' or the identifier passes
        // through unexpanded (C leaves bare function-like macro names alone).
        let mut j = i + 1;
        while j < tokens.len() && tokens[j].trim().is_empty() {
            j += 1;
        }
        if j >= tokens.len() || tokens[j] != "(" {
            out.push(tok.clone());
            i += 1;
            continue;
        }
        let open = j;
        let mut depth = 0i32;
        let mut k = open;
        loop {
            if k >= tokens.len() {
                return Err(format!("unterminated invocation of function-like macro '{}'", mac.name));
            }
            match tokens[k].as_str() {
                "(" => depth += 1,
                ")" => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            k += 1;
        }
        let inner = &tokens[open + 1..k];
        let mut raw_args = split_args(inner);
        if raw_args.len() == 1 && raw_args[0].is_empty() && mac.params.is_empty() {
            raw_args.clear();
        }

        let named_count = if mac.is_variadic { mac.params.len() - 1 } else { mac.params.len() };
        if raw_args.len() < named_count {
            return Err(format!(
                "macro '{}' requires {} argument(s), got {}",
                mac.name,
                named_count,
                raw_args.len()
            ));
        }

        let mut arg_map: HashMap<String, Vec<String>> = HashMap::new();
        for (idx, pname) in mac.params.iter().enumerate() {
            if mac.is_variadic && idx == mac.params.len() - 1 {
                let mut va: Vec<String> = Vec::new();
                for (n, extra) in raw_args.iter().enumerate().skip(named_count) {
                    if n > named_count {
                        va.push(",".to_string());
                    }
                    va.extend(extra.clone());
                }
                arg_map.insert(pname.clone(), va);
            } else {
                arg_map.insert(pname.clone(), raw_args.get(idx).cloned().unwrap_or_default());
            }
        }

        let mut expanded_args: HashMap<String, Vec<String>> = HashMap::new();
        for (name, raw) in &arg_map {
            expanded_args.insert(name.clone(), expand_tokens(raw, table, painted)?);
        }

        let replacement = &mac.replacement;
        let mut substituted: Vec<String> = Vec::new();
        let mut r = 0;
        while r < replacement.len() {
            let rt = &replacement[r];
            if rt == "#" && r + 1 < replacement.len() && arg_map.contains_key(&replacement[r + 1]) {
                let param = &replacement[r + 1];
                substituted.push(stringize(&arg_map[param]));
                r += 2;
                continue;
            }
            if r + 1 < replacement.len() && replacement[r + 1] == "##" {
                let mut left = if let Some(raw) = arg_map.get(rt) {
                    raw.join("")
                } else {
                    rt.clone()
                };
                r += 2;
                while r < replacement.len() {
                    let right_name = &replacement[r];
                    let right_text = if let Some(raw) = arg_map.get(right_name) {
                        raw.join("")
                    } else {
                        right_name.clone()
                    };
                    left = format!("{left}{right_text}");
                    if r + 1 < replacement.len() && replacement[r + 1] == "##" {
                        r += 2;
                        continue;
                    }
                    break;
                }
                substituted.push(left);
                r += 1;
                continue;
            }
            if let Some(expanded) = expanded_args.get(rt) {
                substituted.extend(expanded.clone());
            } else {
                substituted.push(rt.clone());
            }
            r += 1;
        }

        let name = mac.name.clone();
        painted.insert(name.clone());
        let rescanned = expand_tokens(&substituted, table, painted)?;
        painted.remove(&name);
        out.extend(rescanned);
        i = k + 1;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(defs: &[(&str, &[&str], bool, bool, &[&str])]) -> MacroTable {
        let mut t = MacroTable::new();
        for (name, params, func, variadic, repl) in defs {
            t.define(Macro {
                name: name.to_string(),
                params: params.iter().map(|s| s.to_string()).collect(),
                is_function_like: *func,
                is_variadic: *variadic,
                replacement: repl.iter().map(|s| s.to_string()).collect(),
                is_builtin: false,
            });
        }
        t
    }

    #[test]
    fn object_like_macro_expands() {
        let t = table_with(&[("FOO", &[], false, false, &["1", "+", "2"])]);
        let mut painted = HashSet::new();
        let out = expand_tokens(&["FOO".to_string()], &t, &mut painted).unwrap();
        assert_eq!(out, vec!["1", "+", "2"]);
    }

    #[test]
    fn self_recursion_is_painted() {
        let t = table_with(&[("RECUR", &["x"], true, false, &["RECUR", "(", "x", ")"])]);
        let toks = pp_tokenize(r#"RECUR("a,b")"#);
        let mut painted = HashSet::new();
        let out = expand_tokens(&toks, &t, &mut painted).unwrap();
        assert_eq!(out.join(""), r#"RECUR("a,b")"#);
    }

    #[test]
    fn stringize_escapes_quotes() {
        let t = table_with(&[("STR", &["x"], true, false, &["#", "x"])]);
        let toks = pp_tokenize(r#"STR(a"b)"#);
        let mut painted = HashSet::new();
        let out = expand_tokens(&toks, &t, &mut painted).unwrap();
        assert_eq!(out.join(""), r#""a\"b""#);
    }

    #[test]
    fn token_paste_concatenates() {
        let t = table_with(&[("CAT", &["a", "b"], true, false, &["a", "##", "b"])]);
        let toks = pp_tokenize("CAT(foo,bar)");
        let mut painted = HashSet::new();
        let out = expand_tokens(&toks, &t, &mut painted).unwrap();
        assert_eq!(out, vec!["foobar"]);
    }

    #[test]
    fn variadic_macro_collects_va_args() {
        let t = table_with(&[("LOG", &["fmt", "__VA_ARGS__"], true, true, &["fmt", ",", "__VA_ARGS__"])]);
        let toks = pp_tokenize(r#"LOG("x",1,2)"#);
        let mut painted = HashSet::new();
        let out = expand_tokens(&toks, &t, &mut painted).unwrap();
        assert_eq!(out.join(""), r#""x",1,2"#);
    }

    #[test]
    fn paren_nesting_does_not_split_args() {
        let t = table_with(&[("ID", &["x"], true, false, &["x"])]);
        let toks = pp_tokenize("ID((1,2))");
        let mut painted = HashSet::new();
        let out = expand_tokens(&toks, &t, &mut painted).unwrap();
        assert_eq!(out.join(""), "(1,2)");
    }
}
