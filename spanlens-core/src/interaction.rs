//! Expand/select state for one trace view.
//!
//! Keyed by span id rather than by node, so it carries over unchanged when
//! the forest is rebuilt after a refresh. Ids that are not in the current
//! forest are kept: they may show up again after the next fetch.

use std::collections::HashSet;

use crate::hierarchy::{ancestor_ids, find_node, walk_preorder, HierarchyNode};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionState {
    expanded: HashSet<String>,
    selected: Option<String>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_expand(&mut self, span_id: &str) {
        if !self.expanded.remove(span_id) {
            self.expanded.insert(span_id.to_string());
        }
    }

    pub fn expand(&mut self, span_id: &str) {
        self.expanded.insert(span_id.to_string());
    }

    pub fn collapse(&mut self, span_id: &str) {
        self.expanded.remove(span_id);
    }

    pub fn is_expanded(&self, span_id: &str) -> bool {
        self.expanded.contains(span_id)
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    /// Replaces any previous selection, whether or not `span_id` exists.
    pub fn select(&mut self, span_id: &str) {
        self.selected = Some(span_id.to_string());
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_selected(&self, span_id: &str) -> bool {
        self.selected.as_deref() == Some(span_id)
    }

    /// The selected node, if it is present in this forest.
    pub fn selected_node<'a>(&self, forest: &'a [HierarchyNode]) -> Option<&'a HierarchyNode> {
        find_node(forest, self.selected.as_deref()?)
    }

    pub fn expand_all(&mut self, forest: &[HierarchyNode]) {
        walk_preorder(forest, &mut |node, _depth| {
            if node.has_children() {
                self.expanded.insert(node.span.span_id.clone());
            }
        });
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Expand every ancestor of `span_id` so its row becomes visible.
    pub fn reveal(&mut self, forest: &[HierarchyNode], span_id: &str) {
        self.expanded.extend(ancestor_ids(forest, span_id));
    }
}
