use std::fmt;
use std::fmt::{Display, Formatter};

/// Index of a node inside its `Ast`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AdditiveOp {
    Plus,
    Minus,
}

impl AdditiveOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AdditiveOp::Plus => "+",
            AdditiveOp::Minus => "-",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MultiplicativeOp {
    Star,
    Slash,
}

impl MultiplicativeOp {
    pub fn symbol(self) -> &'static str {
        match self {
            MultiplicativeOp::Star => "*",
            MultiplicativeOp::Slash => "/",
        }
    }
}

/// What a node is, together with exactly the data that kind of node needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Program(Vec<NodeId>),
    IntDeclaration { name: String, init: Option<NodeId> },
    AssignmentStmt { name: String, value: NodeId },
    Additive { op: AdditiveOp, lhs: NodeId, rhs: NodeId },
    Multiplicative { op: MultiplicativeOp, lhs: NodeId, rhs: NodeId },
    Identifier(String),
    IntLiteral(String),
}

/// Flat classification of nodes, for diagnostics.
///
/// An expression statement is represented by its expression node alone, so
/// `ExpressionStmt` is only ever reported by `Ast::statement_type`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeType {
    Program,
    IntDeclaration,
    ExpressionStmt,
    AssignmentStmt,
    Additive,
    Multiplicative,
    Identifier,
    IntLiteral,
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    // identity only; ownership runs from parent to children.
    parent: Option<NodeId>,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::Program(_) => NodeType::Program,
            NodeKind::IntDeclaration { .. } => NodeType::IntDeclaration,
            NodeKind::AssignmentStmt { .. } => NodeType::AssignmentStmt,
            NodeKind::Additive { .. } => NodeType::Additive,
            NodeKind::Multiplicative { .. } => NodeType::Multiplicative,
            NodeKind::Identifier(_) => NodeType::Identifier,
            NodeKind::IntLiteral(_) => NodeType::IntLiteral,
        }
    }

    /// Operator symbol, variable name or literal text, depending on the kind.
    pub fn text(&self) -> &str {
        match &self.kind {
            NodeKind::Program(_) => "program",
            NodeKind::IntDeclaration { name, .. } => name,
            NodeKind::AssignmentStmt { name, .. } => name,
            NodeKind::Additive { op, .. } => op.symbol(),
            NodeKind::Multiplicative { op, .. } => op.symbol(),
            NodeKind::Identifier(name) => name,
            NodeKind::IntLiteral(text) => text,
        }
    }

    /// Children in evaluation order.
    pub fn children(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::Program(statements) => statements.clone(),
            NodeKind::IntDeclaration { init, .. } => init.iter().copied().collect(),
            NodeKind::AssignmentStmt { value, .. } => vec![*value],
            NodeKind::Additive { lhs, rhs, .. } => vec![*lhs, *rhs],
            NodeKind::Multiplicative { lhs, rhs, .. } => vec![*lhs, *rhs],
            NodeKind::Identifier(_) | NodeKind::IntLiteral(_) => Vec::new(),
        }
    }
}

/// One line of a tree dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpLine {
    pub depth: usize,
    pub node_type: NodeType,
    pub text: String,
}

/// A syntax tree, stored as an arena of nodes.
///
/// Nodes are pushed children first; pushing a node adopts its children.
/// The root is the last node pushed, which the parser guarantees is the
/// `Program` node.
///
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Ast {
        Ast { nodes: Vec::new() }
    }

    // Children must already be in this arena.
    pub(crate) fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let node = Node { kind, parent: None };
        for child in node.children() {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes.push(node);
        id
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // Drops every node pushed after the arena had `len` nodes. Used when the
    // parser backtracks over a partially built expression.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
        for node in &mut self.nodes {
            if node.parent.map_or(false, |p| p.0 >= len) {
                node.parent = None;
            }
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId(self.nodes.len() - 1))
        }
    }

    /// Panics if `id` was handed out by a different `Ast`.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn text(&self, id: NodeId) -> &str {
        self.node(id).text()
    }

    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.node(id).node_type()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).children()
    }

    /// Top-level statements of the program, in source order.
    pub fn statements(&self) -> Vec<NodeId> {
        match self.root().map(|root| self.kind(root)) {
            Some(NodeKind::Program(statements)) => statements.clone(),
            _ => Vec::new(),
        }
    }

    /// Like `node_type`, but expressions count as expression statements.
    pub fn statement_type(&self, id: NodeId) -> NodeType {
        match self.node_type(id) {
            NodeType::Additive
            | NodeType::Multiplicative
            | NodeType::Identifier
            | NodeType::IntLiteral => NodeType::ExpressionStmt,
            other => other,
        }
    }

    /// Flattens the tree into `(depth, type, text)` lines, depth first,
    /// starting at the root with depth 0.
    pub fn dump(&self) -> Vec<DumpLine> {
        let mut lines = Vec::with_capacity(self.nodes.len());
        let mut pending: Vec<(NodeId, usize)> = self.root().map(|root| (root, 0)).into_iter().collect();
        while let Some((id, depth)) = pending.pop() {
            let node = self.node(id);
            lines.push(DumpLine {
                depth,
                node_type: node.node_type(),
                text: node.text().to_string(),
            });
            // reversed, so the first child is popped first.
            pending.extend(node.children().into_iter().rev().map(|child| (child, depth + 1)));
        }
        lines
    }
}

impl Display for Ast {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for line in self.dump() {
            for _ in 0..line.depth {
                write!(f, "\t")?;
            }
            writeln!(f, "{} {}", line.node_type, line.text)?;
        }
        Ok(())
    }
}
