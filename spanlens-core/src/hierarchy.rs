//! Hierarchy Builder
//!
//! Turns the flat span list into a forest using an index pass followed by
//! an attach pass. The input is never mutated; every call allocates a fresh
//! tree, so a previous forest can be compared against the new one safely.
//!
//! Malformed input degrades instead of failing:
//! - an unresolved `parentSpanId` makes the span a root,
//! - a colliding `spanId` is last-write-wins in the index,
//! - a parent cycle is cut at its earliest member, which becomes a root.
//!
//! As a result every input span appears exactly once in the output.

use std::collections::HashMap;

use crate::types::Span;

/// One span with its children in input order.
///
/// Trees can be arbitrarily deep, so `Clone`, `PartialEq` and `Drop` are
/// written with explicit stacks instead of the derived recursion.
#[derive(Debug)]
pub struct HierarchyNode {
    pub span: Span,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn span_id(&self) -> &str {
        &self.span.span_id
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

impl Clone for HierarchyNode {
    fn clone(&self) -> Self {
        let mut copies = rebuild(std::slice::from_ref(self), |_| {});
        // `rebuild` returns exactly one node per input root.
        match copies.pop() {
            Some(copy) => copy,
            None => HierarchyNode {
                span: self.span.clone(),
                children: Vec::new(),
            },
        }
    }
}

impl PartialEq for HierarchyNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pairs = vec![(self, other)];
        while let Some((left, right)) = pairs.pop() {
            if left.span != right.span || left.children.len() != right.children.len() {
                return false;
            }
            pairs.extend(left.children.iter().zip(right.children.iter()));
        }
        true
    }
}

impl Drop for HierarchyNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Build the forest for `spans`. Roots and children keep input order.
pub fn build_hierarchy(spans: &[Span]) -> Vec<HierarchyNode> {
    if spans.is_empty() {
        return Vec::new();
    }

    // Index pass
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(spans.len());
    for (idx, span) in spans.iter().enumerate() {
        if index.insert(span.span_id.as_str(), idx).is_some() {
            tracing::debug!(span_id = %span.span_id, "duplicate span id, keeping latest");
        }
    }

    let mut parent_of: Vec<Option<usize>> = spans
        .iter()
        .map(|span| {
            let parent_id = span.parent_id()?;
            let resolved = index.get(parent_id).copied();
            if resolved.is_none() {
                tracing::debug!(
                    span_id = %span.span_id,
                    parent_span_id = parent_id,
                    "unresolved parent, treating span as root"
                );
            }
            resolved
        })
        .collect();

    break_cycles(spans, &mut parent_of);

    // Attach pass
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); spans.len()];
    let mut roots = Vec::new();
    for (idx, parent) in parent_of.iter().enumerate() {
        match parent {
            Some(parent_idx) => children_of[*parent_idx].push(idx),
            None => roots.push(idx),
        }
    }

    materialize(&roots, spans, &children_of)
}

/// Promote the earliest member of every parent cycle to a root.
fn break_cycles(spans: &[Span], parent_of: &mut [Option<usize>]) {
    const UNVISITED: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNVISITED; parent_of.len()];
    let mut path: Vec<usize> = Vec::new();

    for start in 0..parent_of.len() {
        if state[start] != UNVISITED {
            continue;
        }

        let mut current = Some(start);
        while let Some(idx) = current {
            match state[idx] {
                UNVISITED => {
                    state[idx] = ON_PATH;
                    path.push(idx);
                    current = parent_of[idx];
                }
                ON_PATH => {
                    let cycle_start = path.iter().position(|&p| p == idx).unwrap_or(0);
                    let cycle = &path[cycle_start..];
                    if let Some(&cut) = cycle.iter().min() {
                        tracing::warn!(
                            span_id = %spans[cut].span_id,
                            cycle_len = cycle.len(),
                            "parent cycle detected, promoting span to root"
                        );
                        parent_of[cut] = None;
                    }
                    current = None;
                }
                _ => current = None,
            }
        }

        for idx in path.drain(..) {
            state[idx] = DONE;
        }
    }
}

/// Children are built before their parent, so no call ever recurses.
fn materialize(roots: &[usize], spans: &[Span], children_of: &[Vec<usize>]) -> Vec<HierarchyNode> {
    let mut built: Vec<Option<HierarchyNode>> = (0..spans.len()).map(|_| None).collect();
    let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|&idx| (idx, false)).collect();

    while let Some((idx, children_built)) = stack.pop() {
        if children_built {
            let children = children_of[idx]
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[idx] = Some(HierarchyNode {
                span: spans[idx].clone(),
                children,
            });
        } else {
            stack.push((idx, true));
            stack.extend(children_of[idx].iter().map(|&child| (child, false)));
        }
    }

    roots.iter().filter_map(|&idx| built[idx].take()).collect()
}

/// Copy a forest bottom-up. `arrange` sees each sibling list once its
/// members are complete, and the root list last.
fn rebuild<F>(forest: &[HierarchyNode], arrange: F) -> Vec<HierarchyNode>
where
    F: Fn(&mut Vec<HierarchyNode>),
{
    enum Step<'a> {
        Enter(&'a HierarchyNode),
        Exit(&'a HierarchyNode),
    }

    let mut steps: Vec<Step<'_>> = forest.iter().rev().map(Step::Enter).collect();
    let mut done: Vec<HierarchyNode> = Vec::new();

    while let Some(step) = steps.pop() {
        match step {
            Step::Enter(node) => {
                steps.push(Step::Exit(node));
                steps.extend(node.children.iter().rev().map(Step::Enter));
            }
            Step::Exit(node) => {
                let mut children = done.split_off(done.len() - node.children.len());
                arrange(&mut children);
                done.push(HierarchyNode {
                    span: node.span.clone(),
                    children,
                });
            }
        }
    }

    arrange(&mut done);
    done
}

// ── Traversal helpers ───────────────────────────────────────────────────────

/// Depth-first, parents before children, yielding each node with its depth.
pub struct Preorder<'a> {
    stack: Vec<(&'a HierarchyNode, usize)>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = (&'a HierarchyNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        Some((node, depth))
    }
}

pub fn preorder(forest: &[HierarchyNode]) -> Preorder<'_> {
    Preorder {
        stack: forest.iter().rev().map(|node| (node, 0)).collect(),
    }
}

pub fn node_count(forest: &[HierarchyNode]) -> usize {
    preorder(forest).count()
}

pub fn max_depth(forest: &[HierarchyNode]) -> usize {
    preorder(forest)
        .map(|(_, depth)| depth + 1)
        .max()
        .unwrap_or(0)
}

/// Visit every node depth-first, parents before children, with its depth.
pub fn walk_preorder<'a, F>(forest: &'a [HierarchyNode], visit: &mut F)
where
    F: FnMut(&'a HierarchyNode, usize),
{
    for (node, depth) in preorder(forest) {
        visit(node, depth);
    }
}

pub fn find_node<'a>(forest: &'a [HierarchyNode], span_id: &str) -> Option<&'a HierarchyNode> {
    preorder(forest)
        .map(|(node, _)| node)
        .find(|node| node.span.span_id == span_id)
}

/// Ids from the root down to the parent of `span_id`. Empty when the span
/// is a root or is not in the forest.
pub fn ancestor_ids(forest: &[HierarchyNode], span_id: &str) -> Vec<String> {
    let mut trail: Vec<String> = Vec::new();
    for (node, depth) in preorder(forest) {
        trail.truncate(depth);
        if node.span.span_id == span_id {
            return trail;
        }
        trail.push(node.span.span_id.clone());
    }
    Vec::new()
}

/// Copy of the forest with roots and siblings ordered by start time.
pub fn sort_by_start_time(forest: &[HierarchyNode]) -> Vec<HierarchyNode> {
    rebuild(forest, |siblings| {
        siblings.sort_by_key(|node| node.span.start_time)
    })
}
