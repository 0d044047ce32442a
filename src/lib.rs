//! `vc`: the compiler core for a C99+GNU-extensions subset — preprocessor,
//! lexer, parser, and semantic analyzer/IR builder. The CLI, code generator,
//! register allocator, and runtime libc are out of scope; this crate hands
//! off a filled [`ir::IrBuilder`] for those out-of-tree collaborators to
//! consume.

pub mod ast;
pub mod config;
pub mod consteval;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod label;
pub mod lexer;
pub mod parser;
pub mod preproc;
pub mod semantic;
pub mod symtable;
pub mod token;
pub mod types;

use std::path::Path;

pub use ast::Program;
pub use diagnostics::Diagnostics;
pub use error::{CompileError, ErrorKind};
pub use ir::IrBuilder;
pub use preproc::{PreprocContext, PreprocOptions};
pub use semantic::Checker;

/// Runs the full core pipeline (`preproc_run` → `lexer_tokenize` →
/// `parser_parse_toplevel` → `Checker::check_program`) over one source file
/// and returns the checker holding the filled `IrBuilder`, the parsed
/// program, and the preprocessor's include/dependency record.
#[tracing::instrument(skip(opts, config), fields(path = %path.display()))]
pub fn compile_translation_unit(path: &Path, opts: &PreprocOptions, config: config::SemanticConfig) -> Result<TranslationUnit, CompileError> {
    let (src, ctx) = preproc::preproc_run(path, opts)?;
    let file = path.display().to_string();
    let tokens = lexer::lexer_tokenize(&src, &file);
    tracing::debug!(token_count = tokens.len(), "tokenized translation unit");
    let program = parser::parser_parse_toplevel(&tokens)?;

    let mut checker = Checker::new();
    checker.config = config;
    checker.cur_file = file;
    checker.check_program(&program);
    if checker.diags.has_errors() {
        tracing::warn!(error_count = checker.diags.errors().len(), "translation unit failed semantic checking");
    }

    Ok(TranslationUnit { program, checker, preproc_ctx: ctx })
}

/// The result of running the pipeline over one translation unit: the parsed
/// program, the checker (symbol table, diagnostics, and filled IR builder),
/// and the preprocessor's include stack / dependency list.
pub struct TranslationUnit {
    pub program: Program,
    pub checker: Checker,
    pub preproc_ctx: PreprocContext,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn compiles_s1_simple_function_end_to_end() {
        let mut file = tempfile::Builder::new().suffix(".c").tempfile().unwrap();
        writeln!(file, "int f(int a) {{ return a + 1; }}").unwrap();

        let opts = PreprocOptions::default();
        let tu = compile_translation_unit(file.path(), &opts, config::SemanticConfig::new()).unwrap();

        assert!(!tu.checker.diags.has_errors());
        let ops: Vec<_> = tu.checker.ir.instrs().iter().map(|i| i.op).collect();
        assert_eq!(
            ops,
            vec![ir::Op::FuncBegin, ir::Op::LoadParam, ir::Op::Const, ir::Op::Add, ir::Op::Return, ir::Op::FuncEnd]
        );
    }
}
