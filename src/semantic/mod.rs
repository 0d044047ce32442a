//! Semantic analyzer + IR builder: the central `Checker` that walks the
//! AST, maintains the symbol table and label map, and drives an
//! [`IrBuilder`](crate::ir::IrBuilder).
//!
//! One `Checker` is built per translation unit (mirroring the "process-wide
//! bookkeeping... re-initialized on a second invocation" note): construct a
//! fresh one, call [`Checker::check_global`] / [`Checker::check_func`] for
//! each top-level item in order, then hand the filled `IrBuilder` to the
//! (out-of-scope) back end.

mod expr;
mod func;
mod layout;
mod stmt;

use std::collections::{HashMap, HashSet};

use crate::ast::Program;
use crate::config::SemanticConfig;
use crate::diagnostics::Diagnostics;
use crate::error::SourceLoc;
use crate::ir::IrBuilder;
use crate::label::Labeler;
use crate::symtable::SymTable;
use crate::types::TypeKind;

pub use layout::{layout_struct_members, layout_union_members};

/// A `goto` target whose definition hasn't been seen yet. Checked for
/// resolution at function end.
#[derive(Debug, Clone)]
struct PendingGoto {
    label: String,
    loc: SourceLoc,
}

pub struct Checker {
    pub vars: SymTable,
    pub funcs: HashMap<String, crate::ast::Function>,
    pub diags: Diagnostics,
    pub ir: IrBuilder,
    pub config: SemanticConfig,
    pub cur_file: String,
    labeler: Labeler,
    /// Inline function bodies already emitted once, per invariant in
    /// `check_func`.
    inline_emitted: HashSet<String>,
    defined_labels: HashSet<String>,
    pending_gotos: Vec<PendingGoto>,
    break_label: Vec<String>,
    continue_label: Vec<String>,
    cur_func_ret: TypeKind,
    cur_func_name: String,
    frame_bytes: i64,
    /// Set once a `return`/unconditional-`goto`-to-end/no-return-call makes
    /// the rest of the current statement list unreachable, cleared at the
    /// next label.
    unreachable: bool,
}

impl Checker {
    pub fn new() -> Self {
        Checker {
            vars: SymTable::new(),
            funcs: HashMap::new(),
            diags: Diagnostics::new(),
            ir: IrBuilder::new(),
            config: SemanticConfig::new(),
            cur_file: String::new(),
            labeler: Labeler::new(),
            inline_emitted: HashSet::new(),
            defined_labels: HashSet::new(),
            pending_gotos: Vec::new(),
            break_label: Vec::new(),
            continue_label: Vec::new(),
            cur_func_ret: TypeKind::Int,
            cur_func_name: String::new(),
            frame_bytes: 0,
            unreachable: false,
        }
    }

    fn fresh_label(&mut self, suffix: &str) -> String {
        let id = self.labeler.new_construct();
        Labeler::named(id, suffix)
    }

    fn fresh_construct_id(&mut self) -> usize {
        self.labeler.new_construct()
    }

    fn mark_unreachable(&mut self) {
        self.unreachable = true;
    }

    /// Records a semantic error at `loc` in the file currently being checked.
    pub(super) fn err(&mut self, loc: SourceLoc, message: impl Into<String>) {
        self.diags.error(crate::error::ErrorKind::Semantic, self.cur_file.clone(), loc, message);
    }

    fn enter_construct(&mut self) {
        self.unreachable = false;
    }

    pub(super) fn mark_label_defined(&mut self, name: &str) {
        self.defined_labels.insert(name.to_string());
    }

    pub(super) fn record_goto(&mut self, label: &str, loc: SourceLoc) {
        self.pending_gotos.push(PendingGoto { label: label.to_string(), loc });
    }

    /// Checked once the whole function body has been walked: every `goto`
    /// must name a label actually defined somewhere in the function.
    fn resolve_gotos(&mut self) {
        let pending = std::mem::take(&mut self.pending_gotos);
        for goto in pending {
            if !self.defined_labels.contains(&goto.label) {
                self.err(goto.loc, format!("'goto' to undefined label '{}'", goto.label));
            }
        }
        self.defined_labels.clear();
    }

    /// Checks every item in a parsed program in order, threading a single
    /// `Checker` (and therefore a single `IrBuilder`) across all of them.
    pub fn check_program(&mut self, program: &Program) -> bool {
        let mut ok = true;
        for item in &program.items {
            let item_ok = match item {
                crate::ast::TopLevel::Function(f) => self.check_func(f),
                crate::ast::TopLevel::GlobalVar(v) => self.check_global_var(v),
                crate::ast::TopLevel::TypeDecl(s) => self.check_type_decl(s),
            };
            ok &= item_ok;
        }
        ok
    }
}

impl Default for Checker {
    fn default() -> Self {
        Checker::new()
    }
}
