//! Items related to expressions.

use super::memory::Memory;
use super::op::{Symbol, Terminal};
use crate::error::{Error, Result};
use fnv::FnvHashMap;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Incoming, Outgoing};
use std::fmt;
use std::mem;
use std::ops::Index;

/// The directed graph type used to store an expression.
///
/// Every node holds a `Symbol`. Edges point from a child to its parent, so the operands of a
/// node are found on its `Incoming` edges and its parent on its single `Outgoing` edge. Each
/// edge is weighted with the operand `Slot` the child fills.
///
/// A stable graph is used so that node indices held by callers survive the removal of
/// unrelated subtrees.
pub type DiGraph = StableDiGraph<Symbol, Slot, u32>;

/// The node index type used within the expr DiGraph type.
pub type NodeIndex = petgraph::stable_graph::NodeIndex<u32>;

/// The operand position a child occupies beneath its parent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Left,
    Right,
}

/// The parent and slot a subtree hangs from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Socket {
    pub parent: NodeIndex,
    pub slot: Slot,
}

/// An expression tree interpreted as a function of two inputs `a` and `b`.
///
/// The tree exclusively owns its nodes. `Clone` copies the whole graph, so a cloned tree can
/// be edited without affecting the original. The tree also carries the memory register used
/// by `read` and `write` nodes.
#[derive(Clone, Debug, Default)]
pub struct Tree {
    graph: DiGraph,
    root: Option<NodeIndex>,
    memory: Memory,
}

impl Slot {
    /// The slots filled by a node of the given arity, in evaluation order.
    pub fn for_arity(arity: usize) -> &'static [Slot] {
        match arity {
            0 => &[],
            1 => &[Slot::Left],
            _ => &[Slot::Left, Slot::Right],
        }
    }
}

impl Tree {
    /// An empty tree with a default memory register.
    pub fn new() -> Self {
        Self::default()
    }

    /// A single-node tree.
    pub fn with_root<S: Into<Symbol>>(symbol: S) -> Self {
        let mut tree = Tree::new();
        tree.set_root(symbol.into());
        tree
    }

    /// Replace the tree's memory register.
    pub fn with_memory(mut self, memory: Memory) -> Self {
        self.memory = memory;
        self
    }

    /// Parse a whitespace separated postfix expression, e.g. `"a 4 + abs"`.
    ///
    /// Constants must be finite. Evaluation, printing and comparison recurse once per level,
    /// so the expression should stay within the depths the generator produces rather than
    /// nest thousands of operators.
    pub fn from_postfix(postfix: &str) -> Result<Self> {
        let mut stack: Vec<Tree> = Vec::new();
        for token in postfix.split_whitespace() {
            let symbol: Symbol = token.parse()?;
            let arity = symbol.arity();
            if stack.len() < arity {
                return Err(Error::MalformedTree(format!(
                    "`{}` expects {} operand(s) but only {} available",
                    token,
                    arity,
                    stack.len()
                )));
            }
            let operands = stack.split_off(stack.len() - arity);
            let mut tree = Tree::new();
            let root = tree.set_root(symbol);
            for (&slot, operand) in Slot::for_arity(arity).iter().zip(operands) {
                tree.attach(Socket { parent: root, slot }, operand);
            }
            stack.push(tree);
        }
        match stack.len() {
            1 => Ok(stack.remove(0)),
            0 => Err(Error::MalformedTree("empty expression".to_string())),
            n => Err(Error::MalformedTree(format!(
                "{} operands left without an operator",
                n
            ))),
        }
    }

    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Release every node. The memory register is kept.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.root = None;
    }

    /// Make `symbol` the single-node root, releasing any previous content.
    pub fn set_root(&mut self, symbol: Symbol) -> NodeIndex {
        self.clear();
        let root = self.graph.add_node(symbol);
        self.root = Some(root);
        root
    }

    /// The number of nodes.
    pub fn size(&self) -> usize {
        self.root.map_or(0, |root| self.subtree_size(root))
    }

    /// The number of nodes in the subtree rooted at `nx`.
    pub fn subtree_size(&self, nx: NodeIndex) -> usize {
        1 + self
            .graph
            .edges_directed(nx, Incoming)
            .map(|e| self.subtree_size(e.source()))
            .sum::<usize>()
    }

    /// The greatest distance from the root to any node. Empty and single-node trees have
    /// depth 0.
    pub fn depth(&self) -> usize {
        // Preorder visits every parent before its children.
        let mut depths =
            FnvHashMap::with_capacity_and_hasher(self.graph.node_count(), Default::default());
        let mut deepest = 0;
        for nx in self.positions() {
            let d = self.parent(nx).map_or(0, |p| depths[&p] + 1);
            deepest = deepest.max(d);
            depths.insert(nx, d);
        }
        deepest
    }

    /// The distance from `nx` to the root, found by walking parent links.
    pub fn node_depth(&self, nx: NodeIndex) -> usize {
        let mut depth = 0;
        let mut curr = nx;
        while let Some(parent) = self.parent(curr) {
            depth += 1;
            curr = parent;
        }
        depth
    }

    pub fn parent(&self, nx: NodeIndex) -> Option<NodeIndex> {
        self.socket(nx).map(|s| s.parent)
    }

    /// Where `nx` is attached. `None` for the root.
    pub fn socket(&self, nx: NodeIndex) -> Option<Socket> {
        self.graph
            .edges_directed(nx, Outgoing)
            .next()
            .map(|e| Socket {
                parent: e.target(),
                slot: *e.weight(),
            })
    }

    pub fn child(&self, nx: NodeIndex, slot: Slot) -> Option<NodeIndex> {
        child_of(&self.graph, nx, slot)
    }

    pub fn is_leaf(&self, nx: NodeIndex) -> bool {
        self.graph.edges_directed(nx, Incoming).next().is_none()
    }

    /// Every node in preorder, left operands before right.
    pub fn positions(&self) -> Vec<NodeIndex> {
        let mut positions = Vec::with_capacity(self.graph.node_count());
        let mut stack: Vec<NodeIndex> = self.root.into_iter().collect();
        while let Some(nx) = stack.pop() {
            positions.push(nx);
            for &slot in [Slot::Right, Slot::Left].iter() {
                if let Some(c) = self.child(nx, slot) {
                    stack.push(c);
                }
            }
        }
        positions
    }

    /// Every node except the root.
    pub fn non_root_nodes(&self) -> Vec<NodeIndex> {
        let mut nodes = Vec::with_capacity(self.graph.node_count());
        let mut stack: Vec<NodeIndex> = self.root.into_iter().collect();
        while let Some(nx) = stack.pop() {
            if Some(nx) != self.root {
                nodes.push(nx);
            }
            for &slot in [Slot::Left, Slot::Right].iter() {
                if let Some(c) = self.child(nx, slot) {
                    stack.push(c);
                }
            }
        }
        nodes
    }

    /// Every node without operands, leftmost first.
    pub fn leaves(&self) -> Vec<NodeIndex> {
        self.positions().into_iter().filter(|&nx| self.is_leaf(nx)).collect()
    }

    /// Create a new node holding `symbol` at `slot` beneath `parent`.
    ///
    /// Any subtree already occupying the slot is released first.
    pub fn add_child(&mut self, parent: NodeIndex, slot: Slot, symbol: Symbol) -> NodeIndex {
        if let Some(old) = self.child(parent, slot) {
            self.remove_subtree(old);
        }
        let nx = self.graph.add_node(symbol);
        self.graph.add_edge(nx, parent, slot);
        nx
    }

    /// Attach a deep copy of the subtree of `source` rooted at `source_node` at `slot` beneath
    /// `parent`.
    pub fn add_child_copy(
        &mut self,
        parent: NodeIndex,
        slot: Slot,
        source: &Tree,
        source_node: NodeIndex,
    ) -> NodeIndex {
        if let Some(old) = self.child(parent, slot) {
            self.remove_subtree(old);
        }
        let nx = graft(&mut self.graph, &source.graph, source_node);
        self.graph.add_edge(nx, parent, slot);
        nx
    }

    /// Cut the subtree rooted at `nx` out of this tree and return it as a tree of its own,
    /// along with the socket it was attached to.
    ///
    /// Returns `None` when `nx` is the root or is not part of this tree.
    pub fn detach(&mut self, nx: NodeIndex) -> Option<(Tree, Socket)> {
        let socket = self.socket(nx)?;
        let mut subtree = Tree::new();
        subtree.root = Some(graft(&mut subtree.graph, &self.graph, nx));
        self.remove_subtree(nx);
        Some((subtree, socket))
    }

    /// Move the nodes of `subtree` into this tree at `socket`, releasing whatever occupied the
    /// socket before. Returns the index of the attached root.
    ///
    /// Returns `None` without change if `subtree` is empty or the socket's parent is not part
    /// of this tree.
    pub fn attach(&mut self, socket: Socket, subtree: Tree) -> Option<NodeIndex> {
        let subtree_root = subtree.root?;
        if !self.graph.contains_node(socket.parent) {
            return None;
        }
        if let Some(old) = self.child(socket.parent, socket.slot) {
            self.remove_subtree(old);
        }
        let nx = graft(&mut self.graph, &subtree.graph, subtree_root);
        self.graph.add_edge(nx, socket.parent, socket.slot);
        Some(nx)
    }

    /// Release the subtree rooted at `nx`, returning the socket it occupied.
    ///
    /// Removing the root empties the tree.
    pub fn remove_subtree(&mut self, nx: NodeIndex) -> Option<Socket> {
        let socket = self.socket(nx);
        let mut stack = vec![nx];
        while let Some(a) = stack.pop() {
            stack.extend(self.graph.edges_directed(a, Incoming).map(|e| e.source()));
            self.graph.remove_node(a);
        }
        if self.root == Some(nx) {
            self.root = None;
        }
        socket
    }

    /// Change the symbol at `nx` in place. The caller is responsible for the node's operands
    /// matching the new symbol's arity.
    pub(crate) fn set_symbol(&mut self, nx: NodeIndex, symbol: Symbol) {
        if let Some(w) = self.graph.node_weight_mut(nx) {
            *w = symbol;
        }
    }

    /// Release every operand of `nx`.
    pub(crate) fn remove_children(&mut self, nx: NodeIndex) {
        let children: Vec<_> = self
            .graph
            .edges_directed(nx, Incoming)
            .map(|e| e.source())
            .collect();
        for c in children {
            self.remove_subtree(c);
        }
    }

    /// Evaluate the tree for the inputs `a` and `b`. `write` nodes update the tree's memory
    /// register as a side effect. An empty tree evaluates to 0.
    pub fn evaluate(&mut self, a: f64, b: f64) -> f64 {
        let Tree {
            ref graph,
            ref mut memory,
            root,
        } = *self;
        match root {
            Some(root) => eval_node(graph, memory, root, a, b),
            None => 0.0,
        }
    }

    fn fmt_node(&self, f: &mut fmt::Formatter, nx: NodeIndex) -> fmt::Result {
        let symbol = self.graph[nx];
        match symbol.arity() {
            0 => write!(f, "{}", symbol),
            1 => {
                write!(f, "{}(", symbol)?;
                if let Some(l) = self.child(nx, Slot::Left) {
                    self.fmt_node(f, l)?;
                }
                write!(f, ")")
            }
            _ => {
                write!(f, "(")?;
                if let Some(l) = self.child(nx, Slot::Left) {
                    self.fmt_node(f, l)?;
                }
                write!(f, " {} ", symbol)?;
                if let Some(r) = self.child(nx, Slot::Right) {
                    self.fmt_node(f, r)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn child_of(graph: &DiGraph, nx: NodeIndex, slot: Slot) -> Option<NodeIndex> {
    graph
        .edges_directed(nx, Incoming)
        .find(|e| *e.weight() == slot)
        .map(|e| e.source())
}

fn eval_node(graph: &DiGraph, memory: &mut Memory, nx: NodeIndex, a: f64, b: f64) -> f64 {
    match graph[nx] {
        Symbol::Terminal(Terminal::A) => a,
        Symbol::Terminal(Terminal::B) => b,
        Symbol::Terminal(Terminal::Const(c)) => c,
        Symbol::Operator(op) => {
            let mut operands = [0.0; 2];
            for (operand, &slot) in operands.iter_mut().zip(Slot::for_arity(op.arity())) {
                if let Some(c) = child_of(graph, nx, slot) {
                    *operand = eval_node(graph, memory, c, a, b);
                }
            }
            op.apply(operands[0], operands[1], memory)
        }
    }
}

/// Copy the subtree of `src` rooted at `src_root` into `dst`, returning the new root's index.
///
/// The new root is left without a parent.
fn graft(dst: &mut DiGraph, src: &DiGraph, src_root: NodeIndex) -> NodeIndex {
    let dst_root = dst.add_node(src[src_root]);
    let mut curr = vec![(src_root, dst_root)];
    let mut next = vec![];
    while !curr.is_empty() {
        for (a_src, a_dst) in curr.drain(..) {
            for e in src.edges_directed(a_src, Incoming) {
                let b_dst = dst.add_node(src[e.source()]);
                dst.add_edge(b_dst, a_dst, *e.weight());
                next.push((e.source(), b_dst));
            }
        }
        mem::swap(&mut curr, &mut next);
    }
    dst_root
}

fn same_subtree(a: &Tree, an: NodeIndex, b: &Tree, bn: NodeIndex) -> bool {
    a[an] == b[bn]
        && [Slot::Left, Slot::Right].iter().all(|&slot| {
            match (a.child(an, slot), b.child(bn, slot)) {
                (None, None) => true,
                (Some(x), Some(y)) => same_subtree(a, x, b, y),
                _ => false,
            }
        })
}

impl Index<NodeIndex> for Tree {
    type Output = Symbol;
    fn index(&self, nx: NodeIndex) -> &Symbol {
        &self.graph[nx]
    }
}

/// Trees are equal when they have the same shape, the same symbols and the same memory
/// contents. Node indices are not compared.
impl PartialEq for Tree {
    fn eq(&self, other: &Tree) -> bool {
        let same_shape = match (self.root, other.root) {
            (None, None) => true,
            (Some(a), Some(b)) => same_subtree(self, a, other, b),
            _ => false,
        };
        same_shape && self.memory == other.memory
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.root {
            Some(root) => self.fmt_node(f, root),
            None => Ok(()),
        }
    }
}
