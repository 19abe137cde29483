//! Hash-consed formula storage addressed by integer ids.
//!
//! Interning a tree maps every structurally distinct subformula to one
//! [`NodeId`]. Children are stored as ids, so lookups hash a single node
//! rather than a whole subtree.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::{AtomSymbol, Formula, NaryOp, Operands, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    True,
    False,
    Atom(AtomSymbol),
    Last,
    End,
    Init,
    Unary(UnaryOp, NodeId),
    Nary(NaryOp, Vec<NodeId>),
}

impl Node {
    pub fn children(&self) -> &[NodeId] {
        match self {
            Node::Unary(_, child) => std::slice::from_ref(child),
            Node::Nary(_, children) => children,
            _ => &[],
        }
    }

    /// Atomic symbols, constants and markers.
    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }
}

#[derive(Debug, Default)]
pub struct FormulaArena {
    nodes: Vec<Node>,
    interned: HashMap<Node, NodeId>,
}

impl FormulaArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// # Panics
    ///
    /// If `id` was issued by a different arena and is out of range.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Return the id of an existing structurally equal node, or add it.
    pub(crate) fn intern(&mut self, node: Node) -> NodeId {
        if let Some(&id) = self.interned.get(&node) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node.clone());
        self.interned.insert(node, id);
        id
    }

    /// Intern a whole tree, children first.
    ///
    /// Shared `Arc` children are visited once; structurally equal but
    /// separately allocated subtrees still end up on the same id.
    pub fn insert(&mut self, root: &Formula) -> NodeId {
        let mut ids: HashMap<*const Formula, NodeId> = HashMap::new();
        let mut stack: Vec<(&Formula, bool)> = vec![(root, false)];
        while let Some((formula, expanded)) = stack.pop() {
            let key = formula as *const Formula;
            if ids.contains_key(&key) {
                continue;
            }
            let children = formula.children();
            if !expanded && !children.is_empty() {
                stack.push((formula, true));
                for child in children.iter().rev() {
                    stack.push((child.as_ref(), false));
                }
                continue;
            }
            let child_ids: Vec<NodeId> = children.iter().map(|c| ids[&Arc::as_ptr(c)]).collect();
            let node = match formula {
                Formula::True => Node::True,
                Formula::False => Node::False,
                Formula::Atom(symbol) => Node::Atom(symbol.clone()),
                Formula::Last => Node::Last,
                Formula::End => Node::End,
                Formula::Init => Node::Init,
                Formula::Unary(op, _) => Node::Unary(*op, child_ids[0]),
                Formula::Nary(op, _) => Node::Nary(*op, child_ids),
            };
            let id = self.intern(node);
            ids.insert(key, id);
        }
        ids[&(root as *const Formula)]
    }

    /// Rebuild the formula rooted at `root`, sharing one `Arc` per id.
    pub fn to_formula(&self, root: NodeId) -> Arc<Formula> {
        self.rebuild_reachable(root)
            .remove(&root)
            .unwrap_or_else(|| Arc::new(Formula::True))
    }

    /// One shared formula for every id reachable from `root`.
    pub(crate) fn rebuild_reachable(&self, root: NodeId) -> HashMap<NodeId, Arc<Formula>> {
        let mut built: HashMap<NodeId, Arc<Formula>> = HashMap::new();
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if built.contains_key(&id) {
                continue;
            }
            let node = self.node(id);
            if !expanded && !node.is_leaf() {
                stack.push((id, true));
                for child in node.children().iter().rev() {
                    stack.push((*child, false));
                }
                continue;
            }
            let formula = match node {
                Node::True => Formula::True,
                Node::False => Formula::False,
                Node::Atom(symbol) => Formula::Atom(symbol.clone()),
                Node::Last => Formula::Last,
                Node::End => Formula::End,
                Node::Init => Formula::Init,
                Node::Unary(op, child) => Formula::Unary(*op, built[child].clone()),
                Node::Nary(op, children) => {
                    let operands = children.iter().map(|c| built[c].clone()).collect();
                    Formula::Nary(*op, Operands::from_vec(operands))
                }
            };
            built.insert(id, Arc::new(formula));
        }
        built
    }
}
