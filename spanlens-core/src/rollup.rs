//! Per-span cost and token roll-ups over the forest.

use std::collections::HashMap;

use crate::hierarchy::HierarchyNode;
use crate::types::SpanStatus;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanRollup {
    pub self_cost: f64,
    pub subtree_cost: f64,
    pub self_tokens: i64,
    pub subtree_tokens: i64,
    /// AI calls in the subtree, this span included
    pub ai_call_count: usize,
    pub descendant_count: usize,
    pub failed_descendants: usize,
}

/// Roll-ups keyed by span id. With duplicate ids the last node finished wins.
pub fn compute_rollups(forest: &[HierarchyNode]) -> HashMap<String, SpanRollup> {
    enum Step<'a> {
        Enter(&'a HierarchyNode),
        Exit(&'a HierarchyNode),
    }

    let mut rollups = HashMap::new();
    let mut steps: Vec<Step<'_>> = forest.iter().rev().map(Step::Enter).collect();
    // Finished subtrees waiting for their parent
    let mut done: Vec<SpanRollup> = Vec::new();

    while let Some(step) = steps.pop() {
        match step {
            Step::Enter(node) => {
                steps.push(Step::Exit(node));
                steps.extend(node.children.iter().rev().map(Step::Enter));
            }
            Step::Exit(node) => {
                let children = done.split_off(done.len() - node.children.len());
                let rollup = rollup_node(node, &children);
                rollups.insert(node.span.span_id.clone(), rollup.clone());
                done.push(rollup);
            }
        }
    }
    rollups
}

fn rollup_node(node: &HierarchyNode, children: &[SpanRollup]) -> SpanRollup {
    let self_cost = node.span.cost().unwrap_or(0.0);
    let self_tokens = node.span.tokens().unwrap_or(0);

    let mut rollup = SpanRollup {
        self_cost,
        subtree_cost: self_cost,
        self_tokens,
        subtree_tokens: self_tokens,
        ai_call_count: usize::from(node.span.ai_call.is_some()),
        descendant_count: 0,
        failed_descendants: 0,
    };

    for (child, child_rollup) in node.children.iter().zip(children) {
        rollup.subtree_cost += child_rollup.subtree_cost;
        rollup.subtree_tokens = rollup.subtree_tokens.saturating_add(child_rollup.subtree_tokens);
        rollup.ai_call_count += child_rollup.ai_call_count;
        rollup.descendant_count += 1 + child_rollup.descendant_count;
        rollup.failed_descendants += child_rollup.failed_descendants
            + usize::from(child.span.status == SpanStatus::Failed);
    }
    rollup
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::build_hierarchy;
    use crate::types::{AiCall, Span, SpanError, SpanOperation};
    use chrono::{TimeZone, Utc};

    fn call(id: &str, parent: Option<&str>, cost: f64, tokens: i64) -> Span {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let span = Span::new(id, id, SpanOperation::AiCall, start)
            .completed(10)
            .with_ai_call(AiCall {
                provider: "openai".to_string(),
                model: "gpt-4o-mini".to_string(),
                prompt_tokens: tokens / 2,
                completion_tokens: tokens - tokens / 2,
                total_tokens: tokens,
                cost,
                prompt: None,
                completion: None,
            });
        match parent {
            Some(parent) => span.with_parent(parent),
            None => span,
        }
    }

    #[test]
    fn test_subtree_totals() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let root = Span::new("root", "agent", SpanOperation::Processing, start).completed(100);
        let failed = Span::new("db", "lookup", SpanOperation::Database, start)
            .with_parent("root")
            .failed(
                3,
                SpanError {
                    message: "timeout".to_string(),
                    code: None,
                    recoverable: false,
                },
            );

        let forest = build_hierarchy(&[
            root,
            call("plan", Some("root"), 0.5, 100),
            call("act", Some("plan"), 0.25, 40),
            failed,
        ]);
        let rollups = compute_rollups(&forest);

        let root = &rollups["root"];
        assert_eq!(root.self_cost, 0.0);
        assert_eq!(root.subtree_cost, 0.75);
        assert_eq!(root.subtree_tokens, 140);
        assert_eq!(root.ai_call_count, 2);
        assert_eq!(root.descendant_count, 3);
        assert_eq!(root.failed_descendants, 1);

        let plan = &rollups["plan"];
        assert_eq!(plan.self_tokens, 100);
        assert_eq!(plan.subtree_tokens, 140);
        assert_eq!(plan.descendant_count, 1);
    }

    #[test]
    fn test_empty_forest_has_no_rollups() {
        assert!(compute_rollups(&[]).is_empty());
    }
}
