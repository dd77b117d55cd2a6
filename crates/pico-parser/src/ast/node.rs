//! Node kinds and operator definitions.

use super::{NodeId, SymbolId};
use crate::token::Span;
use std::fmt;

/// The primitive value types of picolang. Both are 32 bits wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Int,
    Float,
}

impl PrimitiveType {
    /// Tag used when decorating instantiated function names.
    pub fn tag(self) -> &'static str {
        match self {
            PrimitiveType::Int => "i32",
            PrimitiveType::Float => "f32",
        }
    }

    /// Result type of an arithmetic operation: identical types stay, a mix
    /// promotes to float.
    pub fn promote(self, other: PrimitiveType) -> PrimitiveType {
        if self == other {
            self
        } else {
            PrimitiveType::Float
        }
    }

    pub fn is_float(self) -> bool {
        self == PrimitiveType::Float
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Int => write!(f, "int"),
            PrimitiveType::Float => write!(f, "float"),
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i32),
    Float(f32),
}

impl Literal {
    pub fn ty(self) -> PrimitiveType {
        match self {
            Literal::Int(_) => PrimitiveType::Int,
            Literal::Float(_) => PrimitiveType::Float,
        }
    }

    /// Whether the literal counts as true in a condition.
    pub fn is_truthy(self) -> bool {
        match self {
            Literal::Int(n) => n != 0,
            Literal::Float(n) => n != 0.0,
        }
    }

    pub fn as_f32(self) -> f32 {
        match self {
            Literal::Int(n) => n as f32,
            Literal::Float(n) => n,
        }
    }
}

/// Binary operators, including assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Assign => "=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        }
    }
}

/// Prefix unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    /// Logical not, yields 1 for zero and 0 otherwise
    Not,
}

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Literal(Literal),
    Identifier(String),
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Call {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    Break,
    Continue,
    Return {
        value: NodeId,
    },
    FunctionDef {
        prototype: NodeId,
        body: NodeId,
    },
    Prototype {
        name: String,
        params: Vec<String>,
    },
    StatementList(Vec<NodeId>),
    InlineAsm(String),
    CompilationUnit(Vec<NodeId>),
    /// Placeholder left behind when folding removes a node entirely
    Nop,
}

impl NodeKind {
    /// Direct children in evaluation order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Literal(_)
            | NodeKind::Identifier(_)
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Prototype { .. }
            | NodeKind::InlineAsm(_)
            | NodeKind::Nop => Vec::new(),
            NodeKind::Binary { left, right, .. } => vec![*left, *right],
            NodeKind::Unary { operand, .. } => vec![*operand],
            NodeKind::Call { callee, args } => {
                let mut children = Vec::with_capacity(args.len() + 1);
                children.push(*callee);
                children.extend(args.iter().copied());
                children
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut children = vec![*condition, *then_branch];
                children.extend(*else_branch);
                children
            }
            NodeKind::While { condition, body } => vec![*condition, *body],
            NodeKind::Return { value } => vec![*value],
            NodeKind::FunctionDef { prototype, body } => vec![*prototype, *body],
            NodeKind::StatementList(items) | NodeKind::CompilationUnit(items) => items.clone(),
        }
    }

    /// Replace every child id with `f(child)`, in evaluation order.
    pub fn map_children(&mut self, mut f: impl FnMut(NodeId) -> NodeId) {
        match self {
            NodeKind::Literal(_)
            | NodeKind::Identifier(_)
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Prototype { .. }
            | NodeKind::InlineAsm(_)
            | NodeKind::Nop => {}
            NodeKind::Binary { left, right, .. } => {
                *left = f(*left);
                *right = f(*right);
            }
            NodeKind::Unary { operand, .. } => *operand = f(*operand),
            NodeKind::Call { callee, args } => {
                *callee = f(*callee);
                for arg in args.iter_mut() {
                    *arg = f(*arg);
                }
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                *condition = f(*condition);
                *then_branch = f(*then_branch);
                if let Some(else_branch) = else_branch {
                    *else_branch = f(*else_branch);
                }
            }
            NodeKind::While { condition, body } => {
                *condition = f(*condition);
                *body = f(*body);
            }
            NodeKind::Return { value } => *value = f(*value),
            NodeKind::FunctionDef { prototype, body } => {
                *prototype = f(*prototype);
                *body = f(*body);
            }
            NodeKind::StatementList(items) | NodeKind::CompilationUnit(items) => {
                for item in items.iter_mut() {
                    *item = f(*item);
                }
            }
        }
    }

    /// Whether evaluating this node leaves a value on the stack.
    ///
    /// Jumps and inline assembly do not.
    pub fn produces_value(&self) -> bool {
        !matches!(
            self,
            NodeKind::Break
                | NodeKind::Continue
                | NodeKind::Return { .. }
                | NodeKind::InlineAsm(_)
                | NodeKind::FunctionDef { .. }
                | NodeKind::Prototype { .. }
        )
    }

    /// Short human-readable name of the node kind.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Literal(_) => "literal",
            NodeKind::Identifier(_) => "identifier",
            NodeKind::Binary { .. } => "binary expression",
            NodeKind::Unary { .. } => "unary expression",
            NodeKind::Call { .. } => "call",
            NodeKind::If { .. } => "if",
            NodeKind::While { .. } => "while",
            NodeKind::Break => "break",
            NodeKind::Continue => "continue",
            NodeKind::Return { .. } => "return",
            NodeKind::FunctionDef { .. } => "function definition",
            NodeKind::Prototype { .. } => "prototype",
            NodeKind::StatementList(_) => "statement list",
            NodeKind::InlineAsm(_) => "inline assembly",
            NodeKind::CompilationUnit(_) => "compilation unit",
            NodeKind::Nop => "no-op",
        }
    }
}

/// A node with its annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    /// Set by type inference on every expression node
    pub resolved_type: Option<PrimitiveType>,
    /// Set by type inference on identifier and call nodes
    pub resolved_symbol: Option<SymbolId>,
    /// Set by the parent-link pass
    pub enclosing: Option<NodeId>,
}
