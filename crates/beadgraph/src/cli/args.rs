//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::Parser;
use std::path::PathBuf;

use super::types::GroupByArg;
use super::validators::{validate_label, validate_limit};

/// Arguments for the `triage` command
#[derive(Parser, Debug, Clone, Default)]
pub struct TriageArgs {
    /// Group recommendations by execution track or by label
    #[arg(short, long, value_enum)]
    pub group_by: Option<GroupByArg>,

    /// Maximum number of recommendations (default: from configuration)
    #[arg(short = 'n', long, value_parser = validate_limit)]
    pub limit: Option<usize>,
}

/// Arguments for the `next` command
#[derive(Parser, Debug, Clone, Default)]
pub struct NextArgs {}

/// Arguments for the `insights` command
#[derive(Parser, Debug, Clone)]
pub struct InsightsArgs {
    /// Entries per insight list
    #[arg(short = 'n', long, default_value = "10", value_parser = validate_limit)]
    pub limit: usize,
}

/// Arguments for the `plan` command
#[derive(Parser, Debug, Clone, Default)]
pub struct PlanArgs {}

/// Arguments for the `priority` command
#[derive(Parser, Debug, Clone)]
pub struct PriorityArgs {
    /// Number of issues to rank
    #[arg(short = 'n', long, default_value = "20", value_parser = validate_limit)]
    pub limit: usize,
}

/// Arguments for the `suggest` command
#[derive(Parser, Debug, Clone, Default)]
pub struct SuggestArgs {
    /// Maximum entries per list (default: from configuration)
    #[arg(short = 'n', long, value_parser = validate_limit)]
    pub limit: Option<usize>,
}

/// Arguments for the `label-health` command
#[derive(Parser, Debug, Clone, Default)]
pub struct LabelHealthArgs {
    /// Only list labels below the warning cutoff
    #[arg(long)]
    pub attention_only: bool,
}

/// Arguments for the `label-flow` command
#[derive(Parser, Debug, Clone, Default)]
pub struct LabelFlowArgs {}

/// Arguments for the `label-attention` command
#[derive(Parser, Debug, Clone)]
pub struct LabelAttentionArgs {
    /// Number of labels to show
    #[arg(short = 'n', long, default_value = "10", value_parser = validate_limit)]
    pub limit: usize,
}

/// Arguments for the `label` command
#[derive(Parser, Debug, Clone)]
pub struct LabelArgs {
    /// Label to scope the analysis to
    #[arg(value_parser = validate_label)]
    pub name: String,

    /// Number of central issues to show
    #[arg(short = 'n', long, default_value = "10", value_parser = validate_limit)]
    pub limit: usize,
}

/// Arguments for the `snapshot` command
#[derive(Parser, Debug, Clone)]
pub struct SnapshotArgs {
    /// Where to write the snapshot JSON
    #[arg(short, long)]
    pub output: PathBuf,

    /// Revision tag to record (e.g., a commit hash)
    #[arg(short, long)]
    pub revision: Option<String>,
}

/// Arguments for the `diff` command
#[derive(Parser, Debug, Clone)]
pub struct DiffArgs {
    /// Earlier snapshot file
    #[arg(long)]
    pub from: PathBuf,

    /// Later snapshot file (default: the current issues)
    #[arg(long)]
    pub to: Option<PathBuf>,
}

/// Arguments for the `stats` command
#[derive(Parser, Debug, Clone, Default)]
pub struct StatsArgs {}
