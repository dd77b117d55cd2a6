//! Tree rewriting over the node arena.
//!
//! A [`Rewriter`] is called on a node and returns the id that should take its
//! place in the parent, which may be the same id or a freshly allocated
//! replacement. [`walk_children`] is the default traversal: it rewrites every
//! child and stores the results back into the node.

use super::{Ast, NodeId};

/// A pass that may replace the nodes it visits.
pub trait Rewriter {
    /// Rewrite the node and return its replacement.
    ///
    /// The default implementation only recurses.
    fn rewrite(&mut self, ast: &mut Ast, id: NodeId) -> NodeId {
        walk_children(self, ast, id);
        id
    }
}

/// Rewrite each child of `id` in evaluation order and store the replacements.
pub fn walk_children<R: Rewriter + ?Sized>(rewriter: &mut R, ast: &mut Ast, id: NodeId) {
    let children = ast.kind(id).children();
    if children.is_empty() {
        return;
    }

    let replaced: Vec<NodeId> = children
        .into_iter()
        .map(|child| rewriter.rewrite(ast, child))
        .collect();

    let mut replacements = replaced.into_iter();
    ast.node_mut(id)
        .kind
        .map_children(|old| replacements.next().unwrap_or(old));
}
