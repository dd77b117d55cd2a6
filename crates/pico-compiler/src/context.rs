//! Per-compilation state threaded through every pass.

use crate::error::{CompileError, SemanticError, SemanticErrorKind};
use crate::infer::Instantiations;
use crate::symbols::{Scope, SymbolTable};
use pico_parser::{Ast, NodeId, Span, SymbolId};
use rustc_hash::FxHashMap;

/// Monotonic name counters for synthetic labels and uniquified locals.
#[derive(Debug, Default, Clone)]
pub struct Counters {
    labels: u32,
    temps: u32,
    globals: u32,
}

impl Counters {
    /// A fresh branch-target label. `@` cannot occur in source identifiers.
    pub fn fresh_label(&mut self) -> String {
        let label = format!("L@{}", self.labels);
        self.labels += 1;
        label
    }

    /// A fresh emitted name for a local binding of `base`.
    pub fn fresh_local(&mut self, base: &str) -> String {
        let name = format!("{}@{}", base, self.temps);
        self.temps += 1;
        name
    }

    /// A fresh label for a global variable. Labels are unique ignoring
    /// case and `SFP` is reserved, so source names are never used as is.
    pub fn fresh_global(&mut self, base: &str) -> String {
        let name = format!("{}@g{}", base, self.globals);
        self.globals += 1;
        name
    }

    /// Restart local and global numbering for a new inference round.
    pub fn reset_temps(&mut self) {
        self.temps = 0;
        self.globals = 0;
    }
}

/// Everything one compilation owns.
pub struct CompilerContext {
    pub file_name: String,
    pub ast: Ast,
    pub symbols: SymbolTable,
    /// Scopes keyed by the node that introduces them
    pub scopes: FxHashMap<NodeId, Scope>,
    pub instances: Instantiations,
    pub counters: Counters,
}

impl CompilerContext {
    pub fn new(file_name: impl Into<String>, ast: Ast) -> Self {
        Self {
            file_name: file_name.into(),
            ast,
            symbols: SymbolTable::new(),
            scopes: FxHashMap::default(),
            instances: Instantiations::default(),
            counters: Counters::default(),
        }
    }

    pub fn root(&self) -> Result<NodeId, CompileError> {
        self.ast
            .root()
            .ok_or_else(|| CompileError::internal("syntax tree has no compilation unit"))
    }

    /// Nearest node at or above `id` that carries a scope.
    pub fn scope_owner(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ast.ancestors(id))
            .find(|node| self.scopes.contains_key(node))
    }

    /// Resolve `name` by walking the scope chain outward from `id`.
    pub fn lookup(&self, id: NodeId, name: &str) -> Option<SymbolId> {
        std::iter::once(id)
            .chain(self.ast.ancestors(id))
            .filter_map(|node| self.scopes.get(&node))
            .find_map(|scope| scope.lookup(name))
    }

    pub fn semantic_error(&self, kind: SemanticErrorKind, span: Span) -> CompileError {
        CompileError::Semantic {
            file: self.file_name.clone(),
            error: SemanticError { kind, span },
        }
    }
}
