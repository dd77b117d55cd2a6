//! Abstract Syntax Tree for picolang.
//!
//! Nodes live in an arena ([`Ast`]) and refer to each other through
//! [`NodeId`] indices. Besides its kind-specific children every node carries
//! three annotations filled in by later passes: the resolved primitive type,
//! the resolved symbol, and the enclosing node. The enclosing link is a plain
//! index into the same arena; it is never followed when copying subtrees.

mod node;
pub mod visitor;

pub use node::*;
pub use visitor::{walk_children, Rewriter};

use crate::token::Span;

/// Index of a node in an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a symbol in the compiler's symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// Arena holding every node of one compilation unit.
///
/// Nodes are never removed. A pass that replaces a node allocates the
/// replacement and stores its id in the parent; the old node stays behind
/// unreachable.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh node with empty annotations.
    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            resolved_type: None,
            resolved_symbol: None,
            enclosing: None,
        });
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    #[inline]
    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    /// The compilation-unit node, once the parser has produced one.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// Number of allocated nodes, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node's enclosing node, if the parent-link pass has run.
    #[inline]
    pub fn enclosing(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].enclosing
    }

    /// Iterate over the enclosing chain of `id`, nearest first, excluding `id`.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            ast: self,
            next: self.enclosing(id),
        }
    }

    /// Set the enclosing link of every node under `root`.
    ///
    /// `parent` becomes the enclosing node of `root` itself.
    pub fn link_parents(&mut self, root: NodeId, parent: Option<NodeId>) {
        let mut stack = vec![(root, parent)];
        while let Some((id, parent)) = stack.pop() {
            let node = &mut self.nodes[id.index()];
            node.enclosing = parent;
            stack.extend(node.kind.children().into_iter().map(|child| (child, Some(id))));
        }
    }

    /// Deep-copy the subtree rooted at `id`.
    ///
    /// The copy gets fresh ids and empty annotations, including the enclosing
    /// links; callers relink it with [`Ast::link_parents`].
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let mut kind = self.nodes[id.index()].kind.clone();
        kind.map_children(|child| self.clone_subtree(child));
        let span = self.nodes[id.index()].span;
        self.alloc(kind, span)
    }
}

/// Iterator over a node's enclosing chain.
pub struct Ancestors<'a> {
    ast: &'a Ast,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.ast.enclosing(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Ast, NodeId, NodeId, NodeId) {
        let mut ast = Ast::new();
        let span = Span::default();
        let one = ast.alloc(NodeKind::Literal(Literal::Int(1)), span);
        let x = ast.alloc(NodeKind::Identifier("x".into()), span);
        let add = ast.alloc(
            NodeKind::Binary {
                op: BinaryOp::Add,
                left: x,
                right: one,
            },
            span,
        );
        let unit = ast.alloc(NodeKind::CompilationUnit(vec![add]), span);
        ast.set_root(unit);
        (ast, unit, add, x)
    }

    #[test]
    fn test_link_parents() {
        let (mut ast, unit, add, x) = sample();
        ast.link_parents(unit, None);
        assert_eq!(ast.enclosing(unit), None);
        assert_eq!(ast.enclosing(add), Some(unit));
        assert_eq!(ast.enclosing(x), Some(add));
        assert_eq!(ast.ancestors(x).collect::<Vec<_>>(), vec![add, unit]);
    }

    #[test]
    fn test_clone_subtree_is_independent() {
        let (mut ast, unit, add, _) = sample();
        ast.link_parents(unit, None);
        ast.node_mut(add).resolved_type = Some(PrimitiveType::Int);

        let copy = ast.clone_subtree(add);
        assert_ne!(copy, add);
        assert_eq!(ast.node(copy).resolved_type, None);
        assert_eq!(ast.enclosing(copy), None);

        let NodeKind::Binary { left, .. } = *ast.kind(copy) else {
            panic!("expected binary node");
        };
        assert_eq!(ast.kind(left), &NodeKind::Identifier("x".into()));

        // Mutating the copy leaves the original alone
        ast.node_mut(left).kind = NodeKind::Identifier("y".into());
        let NodeKind::Binary { left: orig_left, .. } = *ast.kind(add) else {
            panic!("expected binary node");
        };
        assert_eq!(ast.kind(orig_left), &NodeKind::Identifier("x".into()));
    }
}
