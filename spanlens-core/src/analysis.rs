//! Critical path and bottleneck analysis
//!
//! The critical path is the root-to-descendant chain with the largest summed
//! duration. Only measured spans take part: a running span (and everything
//! below it) is left out of path selection because its real cost is not
//! known yet. Ties go to the earlier child, and across the forest to the
//! earlier root, so the result is reproducible.
//!
//! Bottlenecks are every measured span ranked by duration, each expressed
//! as a share of the critical-path total. Spans off the critical path are
//! listed too.

use std::collections::HashSet;

use crate::hierarchy::{walk_preorder, HierarchyNode};
use crate::types::{Bottleneck, TraceAnalysis};

/// Best chain found below (and including) one node
struct Chain<'a> {
    total_ms: i64,
    /// Leaf first; reversed once at the end
    ids_reversed: Vec<&'a str>,
}

/// First strictly longest chain, so earlier candidates win ties.
fn pick_longest<'a, I>(candidates: I) -> Option<Chain<'a>>
where
    I: IntoIterator<Item = Option<Chain<'a>>>,
{
    let mut best: Option<Chain<'a>> = None;
    for candidate in candidates.into_iter().flatten() {
        let better = match &best {
            Some(current) => candidate.total_ms > current.total_ms,
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}

/// Best chain under each root, in root order. Post-order with an explicit
/// stack; a running node yields `None` without visiting its subtree.
fn root_chains(forest: &[HierarchyNode]) -> Vec<Option<Chain<'_>>> {
    enum Step<'a> {
        Enter(&'a HierarchyNode),
        Exit(&'a HierarchyNode, i64),
    }

    let mut steps: Vec<Step<'_>> = forest.iter().rev().map(Step::Enter).collect();
    let mut done: Vec<Option<Chain<'_>>> = Vec::new();

    while let Some(step) = steps.pop() {
        match step {
            Step::Enter(node) => match node.span.measured_duration_ms() {
                Some(own_ms) => {
                    steps.push(Step::Exit(node, own_ms));
                    steps.extend(node.children.iter().rev().map(Step::Enter));
                }
                None => done.push(None),
            },
            Step::Exit(node, own_ms) => {
                let children = done.split_off(done.len() - node.children.len());
                let mut chain = pick_longest(children).unwrap_or(Chain {
                    total_ms: 0,
                    ids_reversed: Vec::new(),
                });
                chain.total_ms = chain.total_ms.saturating_add(own_ms);
                chain.ids_reversed.push(node.span.span_id.as_str());
                done.push(Some(chain));
            }
        }
    }
    done
}

/// Critical path ids (root first) and their summed duration.
pub fn critical_path(forest: &[HierarchyNode]) -> (Vec<String>, i64) {
    match pick_longest(root_chains(forest)) {
        Some(chain) => (
            chain
                .ids_reversed
                .into_iter()
                .rev()
                .map(ToString::to_string)
                .collect(),
            chain.total_ms,
        ),
        None => (Vec::new(), 0),
    }
}

/// Every measured span, longest first, as a share of `critical_total_ms`.
pub fn rank_bottlenecks(forest: &[HierarchyNode], critical_total_ms: i64) -> Vec<Bottleneck> {
    let mut measured: Vec<(&str, i64)> = Vec::new();
    walk_preorder(forest, &mut |node, _depth| {
        if let Some(duration_ms) = node.span.measured_duration_ms() {
            measured.push((node.span.span_id.as_str(), duration_ms));
        }
    });

    // Stable sort keeps pre-order for equal durations.
    measured.sort_by(|a, b| b.1.cmp(&a.1));

    measured
        .into_iter()
        .map(|(span_id, duration_ms)| Bottleneck {
            span_id: span_id.to_string(),
            duration_ms,
            percentage_of_total: percentage(duration_ms, critical_total_ms),
        })
        .collect()
}

fn percentage(duration_ms: i64, total_ms: i64) -> f64 {
    if total_ms <= 0 {
        return 0.0;
    }
    duration_ms as f64 / total_ms as f64 * 100.0
}

pub fn analyze(forest: &[HierarchyNode]) -> TraceAnalysis {
    let (path, total_ms) = critical_path(forest);
    let bottlenecks = rank_bottlenecks(forest, total_ms);
    TraceAnalysis {
        critical_path: path,
        critical_path_duration_ms: total_ms,
        bottlenecks,
    }
}

/// Same as [`analyze`] with the bottleneck list cut to `max_bottlenecks`.
pub fn analyze_with_limit(forest: &[HierarchyNode], max_bottlenecks: usize) -> TraceAnalysis {
    let mut analysis = analyze(forest);
    analysis.bottlenecks.truncate(max_bottlenecks);
    analysis
}

/// One decimal, for display only.
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

impl TraceAnalysis {
    pub fn is_on_critical_path(&self, span_id: &str) -> bool {
        self.critical_path.iter().any(|id| id == span_id)
    }

    pub fn critical_path_set(&self) -> HashSet<&str> {
        self.critical_path.iter().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.critical_path.is_empty() && self.bottlenecks.is_empty()
    }
}

// ── Source selection ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisSource {
    Server,
    Client,
}

impl AnalysisSource {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisSource::Server => "server",
            AnalysisSource::Client => "live",
        }
    }
}

/// Server analysis tagged with the store revision it was fetched for
#[derive(Debug, Clone, PartialEq)]
pub struct ServerAnalysis {
    pub revision: u64,
    pub analysis: TraceAnalysis,
}

/// Prefer the server analysis while it still matches the current store
/// revision; otherwise fall back to the locally computed one.
pub fn select_analysis<'a>(
    server: Option<&'a ServerAnalysis>,
    client: &'a TraceAnalysis,
    current_revision: u64,
) -> (&'a TraceAnalysis, AnalysisSource) {
    match server {
        Some(server) if server.revision == current_revision => {
            (&server.analysis, AnalysisSource::Server)
        }
        _ => (client, AnalysisSource::Client),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::build_hierarchy;
    use crate::types::{Span, SpanOperation};
    use chrono::{TimeZone, Utc};

    fn measured(id: &str, parent: Option<&str>, duration_ms: i64) -> Span {
        let span = running(id, parent);
        span.completed(duration_ms)
    }

    fn running(id: &str, parent: Option<&str>) -> Span {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let span = Span::new(id, id, SpanOperation::AiCall, start);
        match parent {
            Some(parent) => span.with_parent(parent),
            None => span,
        }
    }

    #[test]
    fn test_reference_example() {
        let forest = build_hierarchy(&[
            measured("A", None, 100),
            measured("B", Some("A"), 300),
            measured("C", Some("A"), 50),
        ]);
        let analysis = analyze(&forest);

        assert_eq!(analysis.critical_path, vec!["A", "B"]);
        assert_eq!(analysis.critical_path_duration_ms, 400);

        let ranked: Vec<(&str, i64)> = analysis
            .bottlenecks
            .iter()
            .map(|b| (b.span_id.as_str(), b.duration_ms))
            .collect();
        assert_eq!(ranked, vec![("B", 300), ("A", 100), ("C", 50)]);
        assert_eq!(analysis.bottlenecks[0].percentage_of_total, 75.0);
        assert_eq!(analysis.bottlenecks[1].percentage_of_total, 25.0);
        assert_eq!(analysis.bottlenecks[2].percentage_of_total, 12.5);
        assert_eq!(format_percentage(analysis.bottlenecks[2].percentage_of_total), "12.5%");
    }

    #[test]
    fn test_tie_prefers_earlier_child() {
        let forest = build_hierarchy(&[
            measured("root", None, 10),
            measured("first", Some("root"), 40),
            measured("second", Some("root"), 20),
            measured("second-leaf", Some("second"), 20),
        ]);
        for _ in 0..5 {
            assert_eq!(analyze(&forest).critical_path, vec!["root", "first"]);
        }
    }

    #[test]
    fn test_tie_prefers_earlier_root() {
        let forest = build_hierarchy(&[measured("r1", None, 70), measured("r2", None, 70)]);
        assert_eq!(critical_path(&forest), (vec!["r1".to_string()], 70));
    }

    #[test]
    fn test_running_span_never_wins_over_measured_zero() {
        let forest = build_hierarchy(&[
            measured("root", None, 5),
            running("pending", Some("root")),
            measured("instant", Some("root"), 0),
        ]);
        let analysis = analyze(&forest);
        assert_eq!(analysis.critical_path, vec!["root", "instant"]);
        assert!(analysis.bottlenecks.iter().all(|b| b.span_id != "pending"));
    }

    #[test]
    fn test_running_subtree_is_excluded() {
        let forest = build_hierarchy(&[
            measured("root", None, 5),
            running("pending", Some("root")),
            measured("done-below-pending", Some("pending"), 900),
            measured("short", Some("root"), 10),
        ]);
        let analysis = analyze(&forest);
        assert_eq!(analysis.critical_path, vec!["root", "short"]);
        assert_eq!(analysis.critical_path_duration_ms, 15);
        // Still ranked, even above 100% of the path.
        assert_eq!(analysis.bottlenecks[0].span_id, "done-below-pending");
        assert_eq!(analysis.bottlenecks[0].percentage_of_total, 6000.0);
    }

    #[test]
    fn test_provisional_duration_on_running_span_is_ignored() {
        let mut pending = running("root", None);
        pending.duration_ms = Some(1_000);
        let analysis = analyze(&build_hierarchy(&[pending]));
        assert!(analysis.critical_path.is_empty());
        assert!(analysis.bottlenecks.is_empty());
    }

    #[test]
    fn test_empty_forest() {
        let analysis = analyze(&[]);
        assert!(analysis.is_empty());
        assert_eq!(analysis.critical_path_duration_ms, 0);
    }

    #[test]
    fn test_zero_total_gives_zero_percentages() {
        let analysis = analyze(&build_hierarchy(&[measured("a", None, 0)]));
        assert_eq!(analysis.bottlenecks[0].percentage_of_total, 0.0);
    }

    #[test]
    fn test_limit_truncates_bottlenecks_only() {
        let forest = build_hierarchy(&[
            measured("a", None, 1),
            measured("b", Some("a"), 2),
            measured("c", Some("b"), 3),
        ]);
        let analysis = analyze_with_limit(&forest, 2);
        assert_eq!(analysis.critical_path.len(), 3);
        assert_eq!(analysis.bottlenecks.len(), 2);
        assert!(analysis.is_on_critical_path("c"));
        assert!(analysis.critical_path_set().contains("a"));
    }

    #[test]
    fn test_select_analysis_prefers_current_server_result() {
        let client = analyze(&build_hierarchy(&[measured("a", None, 1)]));
        let server = ServerAnalysis {
            revision: 3,
            analysis: TraceAnalysis {
                critical_path: vec!["server".to_string()],
                critical_path_duration_ms: 9,
                bottlenecks: Vec::new(),
            },
        };

        let (chosen, source) = select_analysis(Some(&server), &client, 3);
        assert_eq!(source, AnalysisSource::Server);
        assert_eq!(chosen.critical_path, vec!["server"]);

        let (chosen, source) = select_analysis(Some(&server), &client, 4);
        assert_eq!(source, AnalysisSource::Client);
        assert_eq!(chosen.critical_path, vec!["a"]);

        let (_, source) = select_analysis(None, &client, 0);
        assert_eq!(source, AnalysisSource::Client);
    }
}
