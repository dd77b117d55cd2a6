//! Symbols and scopes
//!
//! Symbols live in a flat table indexed by [`SymbolId`]. Scopes are attached
//! only to the nodes that introduce bindings: the compilation unit and each
//! function instantiation. Inner blocks share their function's scope.

use pico_parser::{NodeId, PrimitiveType, SymbolId};
use rustc_hash::FxHashMap;

/// Where a symbol's value lives at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// Not assigned yet, or not a value (functions)
    None,
    /// Offset from the frame pointer
    Stack(i32),
    /// Linker-visible global cell
    Global(String),
}

/// A named entity bound in some scope.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub source_name: String,
    /// Name used in assembly output: the source name for functions, a
    /// numbered `@g` label for globals, a uniquified name for locals.
    pub emitted_name: String,
    /// Value type for variables, body type for instantiated functions
    pub ty: Option<PrimitiveType>,
    pub storage: Storage,
    /// Definition node, for functions
    pub function: Option<NodeId>,
    /// Set once a call site resolves to this symbol
    pub used: bool,
    /// Set once code or data for this symbol has been written out
    pub emitted: bool,
}

impl Symbol {
    pub fn variable(source_name: &str, emitted_name: String, ty: PrimitiveType, storage: Storage) -> Self {
        Self {
            source_name: source_name.to_string(),
            emitted_name,
            ty: Some(ty),
            storage,
            function: None,
            used: false,
            emitted: false,
        }
    }

    pub fn function(name: &str, definition: NodeId) -> Self {
        Self {
            source_name: name.to_string(),
            emitted_name: name.to_string(),
            ty: None,
            storage: Storage::None,
            function: Some(definition),
            used: false,
            emitted: false,
        }
    }

    pub fn is_function(&self) -> bool {
        self.function.is_some()
    }
}

/// Flat table owning every symbol of a compilation.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    /// Iterate in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, sym)| (SymbolId(i as u32), sym))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
    }
}

/// Name bindings introduced by one node.
#[derive(Debug, Clone)]
pub struct Scope {
    symbols: FxHashMap<String, SymbolId>,
    /// Global scopes hand out labels instead of stack slots
    global: bool,
    next_param: i32,
    next_local: i32,
}

impl Scope {
    pub fn global() -> Self {
        Self {
            symbols: FxHashMap::default(),
            global: true,
            next_param: 4,
            next_local: -4,
        }
    }

    pub fn function() -> Self {
        Self {
            global: false,
            ..Self::global()
        }
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn bind(&mut self, name: &str, id: SymbolId) {
        self.symbols.insert(name.to_string(), id);
    }

    /// Next parameter slot, counting up from `+4`.
    pub fn allocate_param(&mut self) -> i32 {
        let offset = self.next_param;
        self.next_param += 4;
        offset
    }

    /// Next local slot, counting down from `-4`.
    pub fn allocate_local(&mut self) -> i32 {
        let offset = self.next_local;
        self.next_local -= 4;
        offset
    }

    /// Lowest stack offset handed out to a local, or 0 if none.
    pub fn frame_extent(&self) -> i32 {
        self.next_local + 4
    }

    /// Number of 4-byte local slots.
    pub fn local_count(&self) -> usize {
        (-self.frame_extent() / 4) as usize
    }

    /// Number of 4-byte parameter slots.
    pub fn param_count(&self) -> usize {
        ((self.next_param - 4) / 4) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_offsets() {
        let mut scope = Scope::function();
        assert_eq!(scope.allocate_param(), 4);
        assert_eq!(scope.allocate_param(), 8);
        assert_eq!(scope.allocate_local(), -4);
        assert_eq!(scope.allocate_local(), -8);
        assert_eq!(scope.frame_extent(), -8);
        assert_eq!(scope.local_count(), 2);
        assert_eq!(scope.param_count(), 2);
    }

    #[test]
    fn test_empty_frame() {
        let scope = Scope::function();
        assert_eq!(scope.frame_extent(), 0);
        assert_eq!(scope.local_count(), 0);
    }

    #[test]
    fn test_table_ids_follow_creation_order() {
        let mut table = SymbolTable::new();
        let a = table.add(Symbol::variable(
            "a",
            "a".into(),
            PrimitiveType::Int,
            Storage::Global("a".into()),
        ));
        let b = table.add(Symbol::variable(
            "b",
            "b@1".into(),
            PrimitiveType::Float,
            Storage::Stack(-4),
        ));
        let names: Vec<_> = table.iter().map(|(_, s)| s.emitted_name.clone()).collect();
        assert_eq!(names, vec!["a", "b@1"]);
        assert_ne!(a, b);
        assert_eq!(table.get(b).ty, Some(PrimitiveType::Float));
    }
}
