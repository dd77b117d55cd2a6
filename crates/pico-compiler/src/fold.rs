//! Constant folding over the syntax tree.
//!
//! Collapses operators whose operands are all literals, picks the live
//! branch of an `if` with a literal condition, and unwraps a `return` in
//! tail position of a function body. Integer arithmetic wraps at 32 bits;
//! float arithmetic is done in `f32`, matching the target machine.

use pico_parser::ast::{walk_children, BinaryOp, Literal, Rewriter, UnaryOp};
use pico_parser::{Ast, NodeId, NodeKind};
use tracing::debug;

/// Constant-folding pass.
#[derive(Debug, Default)]
pub struct ConstantFolder {
    /// Number of nodes replaced
    pub folded: usize,
}

/// What the folder needs to know about a node before recursing into it.
enum Shape {
    Binary(BinaryOp),
    Unary(UnaryOp),
    If,
    FunctionDef,
    Other,
}

impl ConstantFolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the whole tree under the root.
    pub fn run(&mut self, ast: &mut Ast) {
        if let Some(root) = ast.root() {
            let root = self.rewrite(ast, root);
            ast.set_root(root);
        }
        debug!(folded = self.folded, "constant folding done");
    }

    fn replace(&mut self, ast: &mut Ast, id: NodeId, kind: NodeKind) -> NodeId {
        self.folded += 1;
        let span = ast.span(id);
        ast.alloc(kind, span)
    }

    fn fold_binary(&mut self, ast: &mut Ast, id: NodeId, op: BinaryOp) -> NodeId {
        let NodeKind::Binary { left, right, .. } = *ast.kind(id) else {
            return id;
        };
        let (&NodeKind::Literal(l), &NodeKind::Literal(r)) = (ast.kind(left), ast.kind(right)) else {
            return id;
        };
        match fold_binary_literals(op, l, r) {
            Some(value) => self.replace(ast, id, NodeKind::Literal(value)),
            None => id,
        }
    }

    fn fold_unary(&mut self, ast: &mut Ast, id: NodeId, op: UnaryOp) -> NodeId {
        let NodeKind::Unary { operand, .. } = *ast.kind(id) else {
            return id;
        };
        match *ast.kind(operand) {
            NodeKind::Literal(value) => {
                let folded = fold_unary_literal(op, value);
                self.replace(ast, id, NodeKind::Literal(folded))
            }
            _ => id,
        }
    }

    fn fold_if(&mut self, ast: &mut Ast, id: NodeId) -> NodeId {
        let NodeKind::If {
            condition,
            then_branch,
            else_branch,
        } = *ast.kind(id)
        else {
            return id;
        };
        let NodeKind::Literal(value) = *ast.kind(condition) else {
            return id;
        };

        self.folded += 1;
        if value.is_truthy() {
            then_branch
        } else {
            match else_branch {
                Some(else_branch) => else_branch,
                None => {
                    let span = ast.span(id);
                    ast.alloc(NodeKind::Nop, span)
                }
            }
        }
    }

    /// Replace a `return` in tail position of `id` by its value.
    fn unwrap_tail_return(&mut self, ast: &mut Ast, id: NodeId) -> NodeId {
        match ast.kind(id) {
            NodeKind::Return { value } => {
                self.folded += 1;
                *value
            }
            NodeKind::StatementList(items) => {
                if let Some(&last) = items.last() {
                    let replacement = self.unwrap_tail_return(ast, last);
                    if let NodeKind::StatementList(items) = &mut ast.node_mut(id).kind {
                        if let Some(slot) = items.last_mut() {
                            *slot = replacement;
                        }
                    }
                }
                id
            }
            NodeKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                let (then_branch, else_branch) = (*then_branch, *else_branch);
                let new_then = self.unwrap_tail_return(ast, then_branch);
                let new_else = else_branch.map(|e| self.unwrap_tail_return(ast, e));
                if let NodeKind::If {
                    then_branch,
                    else_branch,
                    ..
                } = &mut ast.node_mut(id).kind
                {
                    *then_branch = new_then;
                    *else_branch = new_else;
                }
                id
            }
            _ => id,
        }
    }
}

impl Rewriter for ConstantFolder {
    fn rewrite(&mut self, ast: &mut Ast, id: NodeId) -> NodeId {
        let shape = match ast.kind(id) {
            NodeKind::Binary { op, .. } if *op != BinaryOp::Assign => Shape::Binary(*op),
            NodeKind::Unary { op, .. } => Shape::Unary(*op),
            NodeKind::If { .. } => Shape::If,
            NodeKind::FunctionDef { .. } => Shape::FunctionDef,
            _ => Shape::Other,
        };

        walk_children(self, ast, id);

        match shape {
            Shape::Binary(op) => self.fold_binary(ast, id, op),
            Shape::Unary(op) => self.fold_unary(ast, id, op),
            Shape::If => self.fold_if(ast, id),
            Shape::FunctionDef => {
                if let NodeKind::FunctionDef { body, .. } = *ast.kind(id) {
                    let body = self.unwrap_tail_return(ast, body);
                    if let NodeKind::FunctionDef { body: slot, .. } = &mut ast.node_mut(id).kind {
                        *slot = body;
                    }
                }
                id
            }
            Shape::Other => id,
        }
    }
}

/// Evaluate `l op r` at compile time.
///
/// Integer operands give an integer, anything involving a float gives a
/// float, comparisons give integer 0 or 1. Returns `None` for assignment and
/// for integer division by zero, which is left for run time.
pub fn fold_binary_literals(op: BinaryOp, l: Literal, r: Literal) -> Option<Literal> {
    if op.is_comparison() {
        let holds = match (l, r) {
            (Literal::Int(a), Literal::Int(b)) => compare(op, a, b),
            _ => compare(op, l.as_f32(), r.as_f32()),
        };
        return Some(Literal::Int(holds as i32));
    }

    match (l, r) {
        (Literal::Int(a), Literal::Int(b)) => match op {
            BinaryOp::Add => Some(Literal::Int(a.wrapping_add(b))),
            BinaryOp::Subtract => Some(Literal::Int(a.wrapping_sub(b))),
            BinaryOp::Multiply => Some(Literal::Int(a.wrapping_mul(b))),
            BinaryOp::Divide if b != 0 => Some(Literal::Int(a.wrapping_div(b))),
            _ => None,
        },
        _ => {
            let (a, b) = (l.as_f32(), r.as_f32());
            match op {
                BinaryOp::Add => Some(Literal::Float(a + b)),
                BinaryOp::Subtract => Some(Literal::Float(a - b)),
                BinaryOp::Multiply => Some(Literal::Float(a * b)),
                BinaryOp::Divide => Some(Literal::Float(a / b)),
                _ => None,
            }
        }
    }
}

fn compare<T: PartialOrd>(op: BinaryOp, a: T, b: T) -> bool {
    match op {
        BinaryOp::Equal => a == b,
        BinaryOp::NotEqual => a != b,
        BinaryOp::Less => a < b,
        BinaryOp::LessEqual => a <= b,
        BinaryOp::Greater => a > b,
        BinaryOp::GreaterEqual => a >= b,
        _ => false,
    }
}

/// Evaluate a unary operator on a literal.
pub fn fold_unary_literal(op: UnaryOp, value: Literal) -> Literal {
    match (op, value) {
        (UnaryOp::Plus, v) => v,
        (UnaryOp::Minus, Literal::Int(n)) => Literal::Int(n.wrapping_neg()),
        (UnaryOp::Minus, Literal::Float(n)) => Literal::Float(-n),
        (UnaryOp::Not, v) => Literal::Int(!v.is_truthy() as i32),
    }
}
