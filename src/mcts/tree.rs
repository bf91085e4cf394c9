//! Arena-backed search tree.
//!
//! Nodes live in one `Vec` and refer to each other by [`NodeId`]. Each
//! node keeps its parent id, so backpropagation walks up without
//! reference counting, and a subtree can be promoted to a fresh tree
//! once its root action has been committed.

use std::collections::HashSet;

use crate::state::{Action, State};

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One search-tree node.
#[derive(Debug, Clone)]
pub struct Node {
    state: State,
    parent: Option<NodeId>,
    children: Vec<(Action, NodeId)>,
    visits: u32,
    reward: f64,
}

impl Node {
    fn new(state: State, parent: Option<NodeId>) -> Self {
        Self {
            state,
            parent,
            children: Vec::new(),
            visits: 0,
            reward: 0.0,
        }
    }

    /// The state reached at this node.
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Expanded children in expansion order.
    pub fn children(&self) -> &[(Action, NodeId)] {
        &self.children
    }

    /// Visit count `N`.
    pub fn visits(&self) -> u32 {
        self.visits
    }

    /// Accumulated reward `Q`.
    pub fn reward(&self) -> f64 {
        self.reward
    }

    /// Actions already expanded from this node.
    pub fn tried_actions(&self) -> HashSet<Action> {
        self.children.iter().map(|(a, _)| *a).collect()
    }
}

/// A search tree rooted at the state the next decision is made from.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Creates a tree holding only a root for `state`.
    pub fn new(state: State) -> Self {
        Self {
            nodes: vec![Node::new(state, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The child reached from `id` by `action`, if expanded.
    pub fn child(&self, id: NodeId, action: &Action) -> Option<NodeId> {
        self.node(id)
            .children
            .iter()
            .find(|(a, _)| a == action)
            .map(|&(_, child)| child)
    }

    /// Adds a child of `parent` reached by `action`.
    pub fn add_child(&mut self, parent: NodeId, action: Action, state: State) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(state, Some(parent)));
        self.nodes[parent.0].children.push((action, id));
        id
    }

    /// Adds one visit and `reward` to `leaf` and each of its ancestors.
    pub fn backpropagate(&mut self, leaf: NodeId, reward: f64) {
        let mut current = Some(leaf);
        while let Some(id) = current {
            let node = &mut self.nodes[id.0];
            node.visits += 1;
            node.reward += reward;
            current = node.parent;
        }
    }

    /// Turns the subtree under `id` into a tree of its own.
    ///
    /// Statistics are kept; the new root has no parent. Everything
    /// outside the subtree is dropped.
    pub fn promote(self, id: NodeId) -> Tree {
        // breadth-first order, old id -> new id
        let mut order = vec![id.0];
        let mut remap: Vec<Option<usize>> = vec![None; self.nodes.len()];
        remap[id.0] = Some(0);
        let mut next = 0;
        while next < order.len() {
            for &(_, child) in &self.nodes[order[next]].children {
                remap[child.0] = Some(order.len());
                order.push(child.0);
            }
            next += 1;
        }

        let mut slots: Vec<Option<Node>> = self.nodes.into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(order.len());
        for old in order {
            let Some(mut node) = slots[old].take() else {
                continue;
            };
            node.parent = node.parent.and_then(|p| remap[p.0]).map(NodeId);
            if old == id.0 {
                node.parent = None;
            }
            for (_, child) in node.children.iter_mut() {
                if let Some(new) = remap[child.0] {
                    *child = NodeId(new);
                }
            }
            nodes.push(node);
        }
        Tree { nodes }
    }
}
