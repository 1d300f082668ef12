use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::label::Label;

/// Label of the synthetic root. The root is never rendered.
pub const ROOT_LABEL: &str = "Terraform plan";

/// What a node was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Synthetic root owning the whole tree.
    Root,
    /// Plain line inside the plan.
    Content,
    /// Line opening a nested block.
    Opener,
    /// Confirmation question appended after parsing stopped.
    Prompt,
}

/// Data payload for plan tree nodes.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub label: Label,
    pub kind: NodeKind,
}

impl NodeData {
    /// Only openers and the prompt node can receive focus.
    pub fn is_selectable(&self) -> bool {
        matches!(self.kind, NodeKind::Opener | NodeKind::Prompt)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Non-owning link used for upward navigation. `None` only for the root.
    pub parent: Option<Index>,
    /// Children in input order.
    pub children: Vec<Index>,
}

/// Arena-based plan tree.
///
/// Ownership flows from the root through `children`; `parent` links are plain
/// indices, so ascending is O(1) without a second owning edge.
#[derive(Debug)]
pub struct PlanTree {
    arena: Arena<TreeNode>,
    root: Index,
}

impl Default for PlanTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode {
            data: NodeData {
                label: Label::plain(ROOT_LABEL),
                kind: NodeKind::Root,
            },
            parent: None,
            children: Vec::new(),
        });
        Self { arena, root }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    /// Appends a node as the last child of `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn append(&mut self, parent: Index, data: NodeData) -> Index {
        let node_idx = self.arena.insert(TreeNode {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent) = self.arena.get_mut(parent) {
            parent.children.push(node_idx);
        }
        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    pub fn children(&self, idx: Index) -> &[Index] {
        self.get_node(idx)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, idx: Index) -> Option<Index> {
        self.get_node(idx).and_then(|node| node.parent)
    }

    pub fn is_selectable(&self, idx: Index) -> bool {
        self.get_node(idx).is_some_and(|node| node.data.is_selectable())
    }

    pub fn is_expanded(&self, idx: Index) -> bool {
        self.get_node(idx).is_some_and(|node| node.data.label.is_expanded())
    }

    /// Flips the expansion state of an opener. No-op for other nodes.
    pub fn toggle(&mut self, idx: Index) {
        if let Some(node) = self.get_node_mut(idx) {
            node.data.label.toggle();
        }
    }

    pub fn set_expanded(&mut self, idx: Index, expanded: bool) {
        if let Some(node) = self.get_node_mut(idx) {
            node.data.label.set_expanded(expanded);
        }
    }

    /// Number of nodes, excluding the root.
    pub fn len(&self) -> usize {
        self.arena.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pre-order traversal of every node below the root, ignoring expansion.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, false)
    }

    /// Nodes as currently displayed: pre-order below the root, descending
    /// only into expanded nodes.
    pub fn visible(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, true)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root) - 1
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        1 + self
            .children(node_idx)
            .iter()
            .map(|&child| self.calculate_depth(child))
            .max()
            .unwrap_or(0)
    }
}

pub struct TreeIterator<'a> {
    tree: &'a PlanTree,
    stack: Vec<Index>,
    visible_only: bool,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a PlanTree, visible_only: bool) -> Self {
        let stack = tree.children(tree.root()).iter().rev().copied().collect();
        Self {
            tree,
            stack,
            visible_only,
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.stack.pop()?;
        let node = self.tree.get_node(current_idx)?;
        if !self.visible_only || node.data.label.is_expanded() {
            // Push children in reverse order for left-to-right traversal
            for &child in node.children.iter().rev() {
                self.stack.push(child);
            }
        }
        Some((current_idx, node))
    }
}
