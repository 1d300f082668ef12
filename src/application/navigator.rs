//! Focus handling and expand/collapse navigation over a [`PlanTree`].
//!
//! Only selectable nodes (block openers and the prompt node) ever hold focus.

use generational_arena::Index;
use tracing::trace;

use crate::domain::{NodeKind, PlanTree};

/// What an activation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Focused block was expanded or collapsed.
    Toggled,
    /// Focused node is the prompt; the confirmation dialog should open.
    Prompt,
    /// Nothing focused.
    None,
}

#[derive(Debug, Clone, Default)]
pub struct Navigator {
    focus: Option<Index>,
}

impl Navigator {
    /// Focus the first top-level node that has children, if any.
    pub fn new(tree: &PlanTree) -> Self {
        let focus = tree
            .children(tree.root())
            .iter()
            .copied()
            .find(|&child| !tree.children(child).is_empty());
        Self { focus }
    }

    pub fn focus(&self) -> Option<Index> {
        self.focus
    }

    /// Move focus to `idx` if it is selectable. Returns whether focus moved.
    pub fn focus_on(&mut self, tree: &PlanTree, idx: Index) -> bool {
        if tree.is_selectable(idx) {
            self.focus = Some(idx);
            true
        } else {
            false
        }
    }

    /// Expanded: move to the next selectable visible node.
    /// Collapsed: expand in place.
    pub fn expand_or_descend(&mut self, tree: &mut PlanTree) {
        let Some(node) = self.focus else {
            return;
        };
        if tree.is_expanded(node) {
            self.move_by(tree, 1);
        } else {
            tree.set_expanded(node, true);
        }
    }

    /// Expanded: collapse in place.
    /// Otherwise: move to the parent, unless the parent is the root.
    pub fn collapse_or_ascend(&mut self, tree: &mut PlanTree) {
        let Some(node) = self.focus else {
            return;
        };
        if tree.is_expanded(node) {
            tree.set_expanded(node, false);
        } else if let Some(parent) = tree.parent(node) {
            if parent != tree.root() {
                self.focus = Some(parent);
            }
        }
    }

    /// Toggle the focused block, or report that the prompt was activated.
    pub fn activate(&mut self, tree: &mut PlanTree) -> Activation {
        let Some(node) = self.focus else {
            return Activation::None;
        };
        match tree.get_node(node).map(|n| n.data.kind) {
            Some(NodeKind::Prompt) => Activation::Prompt,
            Some(_) => {
                tree.toggle(node);
                Activation::Toggled
            }
            None => Activation::None,
        }
    }

    /// Move focus by `delta` selectable visible nodes, clamped at both ends.
    /// Without focus, the first selectable node is focused.
    pub fn move_by(&mut self, tree: &PlanTree, delta: isize) {
        let selectable = selectable_visible(tree);
        if selectable.is_empty() {
            return;
        }
        let target = match self.focus.and_then(|f| selectable.iter().position(|&i| i == f)) {
            Some(pos) => {
                let last = selectable.len() as isize - 1;
                (pos as isize + delta).clamp(0, last) as usize
            }
            None => 0,
        };
        trace!(target, total = selectable.len(), "move focus");
        self.focus = Some(selectable[target]);
    }

    pub fn move_first(&mut self, tree: &PlanTree) {
        self.focus = selectable_visible(tree).first().copied().or(self.focus);
    }

    pub fn move_last(&mut self, tree: &PlanTree) {
        self.focus = selectable_visible(tree).last().copied().or(self.focus);
    }
}

fn selectable_visible(tree: &PlanTree) -> Vec<Index> {
    tree.visible()
        .filter(|(_, node)| node.data.is_selectable())
        .map(|(idx, _)| idx)
        .collect()
}
