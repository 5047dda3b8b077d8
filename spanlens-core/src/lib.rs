//! Span hierarchy and critical-path engine
//!
//! Shared by:
//! - the Dioxus dashboard (WASM)
//! - the `spanlens-inspect` terminal tool (native)
//!
//! Data flows one way: [`SpanStore`] → [`build_hierarchy`] → ([`analyze`],
//! [`build_tree_rows`]). [`InteractionState`] is keyed by span id and merged
//! into the rows at render time. Nothing here does I/O.

pub mod analysis;
pub mod hierarchy;
pub mod interaction;
pub mod refresh;
pub mod rollup;
pub mod store;
pub mod types;
pub mod view;

pub use analysis::{
    analyze, analyze_with_limit, format_percentage, select_analysis, AnalysisSource,
    ServerAnalysis,
};
pub use hierarchy::{build_hierarchy, find_node, node_count, HierarchyNode};
pub use interaction::InteractionState;
pub use refresh::{Completion, RefreshDecision, RefreshGate, RefreshTicket};
pub use rollup::{compute_rollups, SpanRollup};
pub use store::{MergeReport, SpanStore, SpanUpdate, StoreError, TraceHeader};
pub use types::*;
pub use view::{build_tree_rows, TraceLoadState, TreeRow};

// ============================================================================
// Tests
// ============================================================================
