use std::path::PathBuf;

use clap::{Parser, Subcommand};
use spanlens_core::ExportFormat;

#[derive(Debug, Parser)]
#[command(name = "spanlens-inspect")]
#[command(version, about = "Inspect trace span trees, critical paths and bottlenecks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Trace service base URL
    #[arg(long, global = true, env = "SPANLENS_API_BASE")]
    pub api_base: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the span tree with critical-path markers
    Show {
        trace_id: String,

        /// Read the trace from a JSON file instead of the service
        #[arg(long)]
        file: Option<PathBuf>,

        /// Expand every span that has children
        #[arg(long)]
        expand_all: bool,

        /// Select a span; its ancestors are expanded and its details printed
        #[arg(long)]
        select: Option<String>,

        /// Order siblings by start time instead of arrival order
        #[arg(long)]
        sort_by_start: bool,
    },

    /// Print the critical path and bottleneck ranking
    Analyze {
        trace_id: String,

        #[arg(long)]
        file: Option<PathBuf>,

        /// Use `GET /traces/:id/analysis` instead of computing locally
        #[arg(long, conflicts_with = "file")]
        server: bool,
    },

    /// Download the raw export
    Export {
        trace_id: String,

        #[arg(long, default_value = "json", value_parser = parse_export_format)]
        format: ExportFormat,

        /// Output path; defaults to trace-<id>.<ext>
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Follow a running trace until it finishes
    Watch { trace_id: String },
}

fn parse_export_format(value: &str) -> Result<ExportFormat, String> {
    value.parse::<ExportFormat>().map_err(|e| e.to_string())
}
