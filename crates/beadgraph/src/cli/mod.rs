//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for beadgraph using clap's
//! derive API. Each command has its own argument struct with validation and
//! helpful error messages.
//!
//! # Commands
//!
//! - `triage`: Ranked recommendations, quick wins, blockers, project health
//! - `next`: The single best issue to start on
//! - `priority`: Issues ranked by impact score
//! - `suggest`: Priority changes and missing dependencies worth a look
//! - `insights`: Bottlenecks, keystones, hubs, stale work, cycles
//! - `plan`: Parallel execution tracks
//! - `label-health`, `label-flow`, `label-attention`: Per-label analytics
//! - `label`: Analysis scoped to one label
//! - `snapshot`, `diff`: Capture state and compare over time
//! - `stats`: Counts, graph shape, velocity, load warnings
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `--beads-dir`, `--file`, `--config`: Override discovery
//!
//! # Example
//!
//! ```bash
//! beadgraph triage --group-by track
//! beadgraph --json next
//! beadgraph snapshot --output before.json --revision abc123
//! beadgraph diff --from before.json
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use args::{
    DiffArgs, InsightsArgs, LabelArgs, LabelAttentionArgs, LabelFlowArgs, LabelHealthArgs,
    NextArgs, PlanArgs, PriorityArgs, SnapshotArgs, StatsArgs, SuggestArgs, TriageArgs,
};
pub use types::GroupByArg;
pub use validators::{MAX_LABEL_LENGTH, MAX_LIMIT, validate_label, validate_limit};

/// Beadgraph - graph analytics and triage for beads issue trackers
///
/// Reads the issues in `.beads/` and analyses how they block one another:
/// what is ready, what is holding work up, and which areas need attention.
#[derive(Parser, Debug)]
#[command(name = "beadgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Beads directory to read (default: search upward for `.beads/`)
    #[arg(long, global = true, value_name = "DIR")]
    pub beads_dir: Option<PathBuf>,

    /// Issue file to read, bypassing discovery
    #[arg(long, global = true, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Analysis configuration file (default: `beadgraph.yaml` in the beads directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the full triage report
    ///
    /// Ranks open issues by impact and lists quick wins, blockers worth
    /// clearing, and overall project health.
    Triage(TriageArgs),

    /// Show the single best issue to work on next
    Next(NextArgs),

    /// Rank open issues by impact score
    Priority(PriorityArgs),

    /// Suggest priority changes and missing dependencies
    ///
    /// Flags issues whose impact no longer matches their priority, with what
    /// closing them would free up, and pairs of issues that look related
    /// but have no dependency recorded.
    Suggest(SuggestArgs),

    /// Show graph insights
    ///
    /// Lists bottlenecks, keystones, influencers, hubs, authorities,
    /// stale issues, and dependency cycles.
    Insights(InsightsArgs),

    /// Show the execution plan
    ///
    /// Groups open work into tracks that can proceed in parallel, in the
    /// order their blockers allow.
    Plan(PlanArgs),

    /// Show health scores for every label
    #[command(name = "label-health")]
    LabelHealth(LabelHealthArgs),

    /// Show blocking dependencies between labels
    #[command(name = "label-flow")]
    LabelFlow(LabelFlowArgs),

    /// Rank labels by how much attention they need
    #[command(name = "label-attention")]
    LabelAttention(LabelAttentionArgs),

    /// Analyse the dependency graph of a single label
    Label(LabelArgs),

    /// Save a snapshot of the current state
    Snapshot(SnapshotArgs),

    /// Compare a saved snapshot with another one or with the current state
    Diff(DiffArgs),

    /// Show project statistics
    Stats(StatsArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    #[must_use]
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Where to load issues from, per the global flags.
    ///
    /// # Errors
    ///
    /// Fails if the current directory cannot be determined.
    pub fn source(&self) -> Result<crate::app::Source> {
        Ok(crate::app::Source {
            working_dir: std::env::current_dir()?,
            beads_dir: self.beads_dir.clone(),
            file: self.file.clone(),
            config: self.config.clone(),
        })
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the command itself fails.
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let Some(command) = &self.command else {
            println!("Beadgraph dependency analytics for beads");
            println!("Use --help for more information");
            return Ok(());
        };

        let app = App::load(&self.source()?).await?;
        for warning in app.warnings() {
            tracing::warn!(kind = warning.kind(), "{}", warning.description());
        }

        match command {
            Commands::Triage(args) => execute::execute_triage(&app, args, output_mode),
            Commands::Next(args) => execute::execute_next(&app, args, output_mode),
            Commands::Priority(args) => execute::execute_priority(&app, args, output_mode),
            Commands::Suggest(args) => execute::execute_suggest(&app, args, output_mode),
            Commands::Insights(args) => execute::execute_insights(&app, args, output_mode),
            Commands::Plan(args) => execute::execute_plan(&app, args, output_mode),
            Commands::LabelHealth(args) => execute::execute_label_health(&app, args, output_mode),
            Commands::LabelFlow(args) => execute::execute_label_flow(&app, args, output_mode),
            Commands::LabelAttention(args) => {
                execute::execute_label_attention(&app, args, output_mode)
            }
            Commands::Label(args) => execute::execute_label(&app, args, output_mode),
            Commands::Snapshot(args) => execute::execute_snapshot(&app, args, output_mode).await,
            Commands::Diff(args) => execute::execute_diff(&app, args, output_mode).await,
            Commands::Stats(args) => execute::execute_stats(&app, args, output_mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== CLI Parsing Tests ==========

    #[test]
    fn test_parse_no_command() {
        let cli = Cli::try_parse_from(["beadgraph"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_global_json_flag() {
        let cli = Cli::try_parse_from(["beadgraph", "--json", "triage"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Some(Commands::Triage(_))));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "beadgraph",
            "plan",
            "--json",
            "--beads-dir",
            "/tmp/x/.beads",
            "--config",
            "cfg.yaml",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.beads_dir, Some(PathBuf::from("/tmp/x/.beads")));
        assert_eq!(cli.config, Some(PathBuf::from("cfg.yaml")));
        assert!(cli.file.is_none());
    }

    #[test]
    fn test_parse_triage_group_by() {
        let cli = Cli::try_parse_from(["beadgraph", "triage", "--group-by", "label"]).unwrap();
        match cli.command {
            Some(Commands::Triage(args)) => {
                assert_eq!(args.group_by, Some(GroupByArg::Label));
                assert!(args.limit.is_none());
            }
            _ => panic!("Expected Triage command"),
        }
    }

    #[test]
    fn test_parse_triage_invalid_group_by() {
        let result = Cli::try_parse_from(["beadgraph", "triage", "--group-by", "epic"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_insights_default_limit() {
        let cli = Cli::try_parse_from(["beadgraph", "insights"]).unwrap();
        match cli.command {
            Some(Commands::Insights(args)) => assert_eq!(args.limit, 10),
            _ => panic!("Expected Insights command"),
        }
    }

    #[test]
    fn test_parse_priority_limit() {
        let cli = Cli::try_parse_from(["beadgraph", "priority", "-n", "5"]).unwrap();
        match cli.command {
            Some(Commands::Priority(args)) => assert_eq!(args.limit, 5),
            _ => panic!("Expected Priority command"),
        }
    }

    #[test]
    fn test_parse_suggest() {
        let cli = Cli::try_parse_from(["beadgraph", "suggest"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Suggest(SuggestArgs { limit: None }))
        ));

        let cli = Cli::try_parse_from(["beadgraph", "--json", "suggest", "-n", "4"]).unwrap();
        match cli.command {
            Some(Commands::Suggest(args)) => assert_eq!(args.limit, Some(4)),
            _ => panic!("Expected Suggest command"),
        }
    }

    #[test]
    fn test_parse_zero_limit_rejected() {
        assert!(Cli::try_parse_from(["beadgraph", "priority", "--limit", "0"]).is_err());
    }

    #[test]
    fn test_parse_label_commands() {
        let cli = Cli::try_parse_from(["beadgraph", "label-health", "--attention-only"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::LabelHealth(LabelHealthArgs {
                attention_only: true
            }))
        ));

        let cli = Cli::try_parse_from(["beadgraph", "label-flow"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::LabelFlow(_))));

        let cli = Cli::try_parse_from(["beadgraph", "label-attention", "-n", "3"]).unwrap();
        match cli.command {
            Some(Commands::LabelAttention(args)) => assert_eq!(args.limit, 3),
            _ => panic!("Expected LabelAttention command"),
        }
    }

    #[test]
    fn test_parse_label_name() {
        let cli = Cli::try_parse_from(["beadgraph", "label", " backend "]).unwrap();
        match cli.command {
            Some(Commands::Label(args)) => {
                assert_eq!(args.name, "backend");
                assert_eq!(args.limit, 10);
            }
            _ => panic!("Expected Label command"),
        }
    }

    #[test]
    fn test_parse_label_requires_name() {
        assert!(Cli::try_parse_from(["beadgraph", "label"]).is_err());
        assert!(Cli::try_parse_from(["beadgraph", "label", "two words"]).is_err());
    }

    #[test]
    fn test_parse_snapshot() {
        let cli = Cli::try_parse_from([
            "beadgraph",
            "snapshot",
            "--output",
            "snap.json",
            "--revision",
            "abc123",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Snapshot(args)) => {
                assert_eq!(args.output, PathBuf::from("snap.json"));
                assert_eq!(args.revision.as_deref(), Some("abc123"));
            }
            _ => panic!("Expected Snapshot command"),
        }
    }

    #[test]
    fn test_parse_snapshot_requires_output() {
        assert!(Cli::try_parse_from(["beadgraph", "snapshot"]).is_err());
    }

    #[test]
    fn test_parse_diff() {
        let cli = Cli::try_parse_from(["beadgraph", "diff", "--from", "a.json"]).unwrap();
        match cli.command {
            Some(Commands::Diff(args)) => {
                assert_eq!(args.from, PathBuf::from("a.json"));
                assert!(args.to.is_none());
            }
            _ => panic!("Expected Diff command"),
        }
    }

    #[test]
    fn test_parse_simple_commands() {
        let next = Cli::try_parse_from(["beadgraph", "next"]).unwrap();
        assert!(matches!(next.command, Some(Commands::Next(_))));

        let plan = Cli::try_parse_from(["beadgraph", "plan"]).unwrap();
        assert!(matches!(plan.command, Some(Commands::Plan(_))));

        let stats = Cli::try_parse_from(["beadgraph", "stats"]).unwrap();
        assert!(matches!(stats.command, Some(Commands::Stats(_))));
    }

    #[test]
    fn test_source_carries_overrides() {
        let cli = Cli::try_parse_from(["beadgraph", "--file", "x.jsonl", "stats"]).unwrap();
        let source = cli.source().unwrap();
        assert_eq!(source.file, Some(PathBuf::from("x.jsonl")));
        assert!(source.beads_dir.is_none());
    }
}
