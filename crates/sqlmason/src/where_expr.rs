//! The `where` clause tree.
//!
//! Conditions accumulate into an arena of nodes linked by index: each node
//! carries its own left-folded condition chain, an attachment token (`and` /
//! `or`) and a list of child groups. Sub-groups map to child nodes, so
//! parenthesization falls out of the tree shape at render time and no node
//! ever owns its parent.
//!
//! Rendering walks children first, then the node's own chain:
//!
//! - a child holding a single condition is spliced in flat; a child holding
//!   more than one is wrapped in parentheses;
//! - the node's own chain joins with the node's attachment token, and is
//!   itself parenthesized when the node has both children and a parent and
//!   carries more than one condition.
//!
//! Rendering is pure, so repeated calls yield identical text.

use crate::expr::{Condition, Expression, Logic};

type NodeId = usize;

#[derive(Debug, Clone, Default)]
struct Node {
    chain: Option<Condition>,
    count: usize,
    logic: Logic,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Handle for an open sub-group, consumed by [`WhereExpr::close_group`].
#[derive(Debug, Clone, Copy)]
pub struct GroupToken {
    group: NodeId,
    parent: NodeId,
}

/// An incrementally built `where` clause.
#[derive(Debug, Clone)]
pub struct WhereExpr {
    nodes: Vec<Node>,
    root: NodeId,
    active: NodeId,
}

impl Default for WhereExpr {
    fn default() -> Self {
        Self::new()
    }
}

impl WhereExpr {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            root: 0,
            active: 0,
        }
    }

    /// Whether no condition has been added anywhere in the tree.
    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(|n| n.chain.is_none())
    }

    /// Number of conditions folded into the active node's own chain.
    pub fn active_count(&self) -> usize {
        self.nodes[self.active].count
    }

    /// Add a condition to the active node.
    ///
    /// An existing chain becomes the left side of a new fold; a first
    /// condition is adopted as the chain directly, and when the node already
    /// holds child groups the call's `logic` becomes the node's attachment
    /// token (it controls how this chain joins the groups already rendered).
    pub fn add_condition(&mut self, cond: Condition, logic: Logic) {
        let node = &mut self.nodes[self.active];
        match node.chain.take() {
            Some(existing) => {
                node.chain = Some(Condition::fold(existing, cond, logic));
            }
            None => {
                node.chain = Some(cond);
                if !node.children.is_empty() {
                    node.logic = logic;
                }
            }
        }
        node.count += 1;
    }

    /// Add a bare expression, wrapped as a one-sided condition.
    pub fn add_expression(&mut self, expr: Expression, logic: Logic) {
        self.add_condition(Condition::from_expression(expr), logic);
    }

    /// Open a sub-group and make it the active node.
    ///
    /// If the active node already carries a chain it is first pushed down
    /// into a wrapper child, so text added before the group keeps rendering
    /// before it.
    pub fn open_group(&mut self) -> GroupToken {
        if self.nodes[self.active].chain.is_some() {
            self.wrap_active();
        }
        let parent = self.active;
        let group = self.alloc(Node {
            parent: Some(parent),
            ..Node::default()
        });
        self.nodes[parent].children.push(group);
        self.active = group;
        GroupToken { group, parent }
    }

    /// Close a sub-group: fix how the group's subtree attaches to its
    /// siblings and re-activate the node the group was opened under.
    ///
    /// `logic` overwrites any attachment token the group picked up while it
    /// was being filled; the caller of the group decides how the whole group
    /// joins the surrounding chain.
    pub fn close_group(&mut self, token: GroupToken, logic: Logic) {
        let mut top = token.group;
        while let Some(p) = self.nodes[top].parent {
            if p == token.parent {
                break;
            }
            top = p;
        }
        self.nodes[top].logic = logic;
        self.active = token.parent;
    }

    /// Render the whole tree. Pure; returns the same text on every call.
    pub fn render(&self) -> String {
        self.render_node(self.root)
    }

    fn render_node(&self, id: NodeId) -> String {
        let node = &self.nodes[id];
        let mut out = String::new();

        for &child in &node.children {
            let rendered = self.render_node(child);
            let rendered = rendered.trim();
            if rendered.is_empty() {
                continue;
            }
            let piece = if self.nodes[child].count > 1 {
                format!("({})", strip_leading_logic(rendered))
            } else {
                rendered.to_string()
            };
            if out.is_empty() {
                out = piece;
            } else {
                out = format!("{out} {} {piece}", self.nodes[child].logic);
            }
        }

        if let Some(chain) = &node.chain {
            let chain_text = chain.to_string();
            if !chain_text.is_empty() {
                let wrap_chain =
                    node.count > 1 && !node.children.is_empty() && node.parent.is_some();
                let piece = if wrap_chain {
                    format!("({chain_text})")
                } else {
                    chain_text
                };
                if out.is_empty() {
                    out = piece;
                } else {
                    out = format!("{out} {} {piece}", node.logic);
                }
            }
        }

        out
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn wrap_active(&mut self) {
        let old = self.active;
        let old_parent = self.nodes[old].parent;
        let wrapper = self.alloc(Node {
            parent: old_parent,
            children: vec![old],
            ..Node::default()
        });
        self.nodes[old].parent = Some(wrapper);
        match old_parent {
            Some(p) => {
                if let Some(slot) = self.nodes[p].children.iter_mut().find(|c| **c == old) {
                    *slot = wrapper;
                }
            }
            None => self.root = wrapper,
        }
        self.active = wrapper;
    }
}

fn strip_leading_logic(s: &str) -> &str {
    s.strip_prefix("and ")
        .or_else(|| s.strip_prefix("or "))
        .unwrap_or(s)
}
