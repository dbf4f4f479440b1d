//! Command execution logic.
//!
//! Each `execute_*` function runs one command against a loaded [`App`] and
//! prints the result in the requested [`OutputMode`].

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::args::{
    DiffArgs, InsightsArgs, LabelArgs, LabelAttentionArgs, LabelFlowArgs, LabelHealthArgs,
    NextArgs, PlanArgs, PriorityArgs, SnapshotArgs, StatsArgs, SuggestArgs, TriageArgs,
};
use crate::app::App;
use crate::error::Error;
use crate::insights::Insights;
use crate::labels::{
    ScopedAnalysis, compute_all_label_health, compute_cross_label_flow, compute_label_attention,
    extract_labels,
};
use crate::output::{self, OutputMode, StatsReport};
use crate::snapshot::{Snapshot, compare_snapshots};
use crate::triage::{
    SuggestionReport, TriageOptions, TriageResult, compute_suggestions, compute_triage,
};

/// Runs triage with the configured weights, optionally capping the list.
fn run_triage(
    app: &App,
    group_by: Option<crate::triage::GroupBy>,
    limit: Option<usize>,
    now: DateTime<Utc>,
) -> TriageResult {
    let stats = app.analyze();
    stats.wait_for_phase2();

    let mut triage_config = app.config().triage.clone();
    if let Some(n) = limit {
        triage_config.top_n = n;
    }

    // Label grouping ranks groups by label health, which needs centrality.
    let label_scores = matches!(group_by, Some(crate::triage::GroupBy::Label)).then(|| {
        compute_all_label_health(app.issues(), Some(&*stats), &app.config().label_health, now)
            .health_scores()
    });

    let options = TriageOptions {
        group_by,
        wait_for_phase2: true,
    };
    compute_triage(
        app.issues(),
        &stats,
        &triage_config,
        label_scores.as_ref(),
        &options,
        now,
    )
}

/// Execute the triage command
pub fn execute_triage(app: &App, args: &TriageArgs, output_mode: OutputMode) -> Result<()> {
    let result = run_triage(app, args.group_by.map(Into::into), args.limit, Utc::now());
    tracing::debug!(
        recommendations = result.recommendations.len(),
        compute_ms = result.meta.compute_time_ms,
        "Triage complete"
    );
    output::print_triage(&result, output_mode)?;
    Ok(())
}

/// Execute the next command
pub fn execute_next(app: &App, _args: &NextArgs, output_mode: OutputMode) -> Result<()> {
    let result = run_triage(app, None, Some(1), Utc::now());
    output::print_next(result.top(), output_mode)?;
    Ok(())
}

/// Execute the priority command
pub fn execute_priority(app: &App, args: &PriorityArgs, output_mode: OutputMode) -> Result<()> {
    let result = run_triage(app, None, Some(args.limit), Utc::now());
    output::print_priority(&result.recommendations, output_mode)?;
    Ok(())
}

/// Runs both suggestion passes, optionally capping each list.
fn run_suggest(app: &App, limit: Option<usize>, now: DateTime<Utc>) -> SuggestionReport {
    let stats = app.analyze();
    let config = app.config();
    let mut suggestions = config.suggestions.clone();
    if let Some(n) = limit {
        suggestions.dependencies.max_suggestions = n;
    }
    let mut report = compute_suggestions(app.issues(), &stats, &config.triage, &suggestions, now);
    if let Some(n) = limit {
        report.priority.truncate(n);
    }
    report
}

/// Execute the suggest command
pub fn execute_suggest(app: &App, args: &SuggestArgs, output_mode: OutputMode) -> Result<()> {
    let report = run_suggest(app, args.limit, Utc::now());
    tracing::debug!(
        priority = report.priority.len(),
        dependencies = report.dependencies.len(),
        "Suggestions complete"
    );
    output::print_suggestions(&report, output_mode)?;
    Ok(())
}

/// Execute the insights command
pub fn execute_insights(app: &App, args: &InsightsArgs, output_mode: OutputMode) -> Result<()> {
    let stats = app.analyze();
    stats.wait_for_phase2();
    let insights = Insights::generate(
        app.issues(),
        &stats,
        args.limit,
        app.config().triage.stale_days,
        Utc::now(),
    );
    output::print_insights(&insights, output_mode)?;
    Ok(())
}

/// Execute the plan command
pub fn execute_plan(app: &App, _args: &PlanArgs, output_mode: OutputMode) -> Result<()> {
    // The plan is Phase-1 only; no need to wait for centrality.
    let stats = app.analyze();
    output::print_plan(stats.execution_plan(), output_mode)?;
    Ok(())
}

/// Execute the label-health command
pub fn execute_label_health(
    app: &App,
    args: &LabelHealthArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let stats = app.analyze();
    stats.wait_for_phase2();
    let mut result = compute_all_label_health(
        app.issues(),
        Some(&*stats),
        &app.config().label_health,
        Utc::now(),
    );
    if args.attention_only {
        let needed = result.attention_needed.clone();
        result.labels.retain(|h| needed.contains(&h.label));
        result.summaries.retain(|s| s.needs_attention);
    }
    output::print_label_health(&result, output_mode)?;
    Ok(())
}

/// Execute the label-flow command
pub fn execute_label_flow(app: &App, _args: &LabelFlowArgs, output_mode: OutputMode) -> Result<()> {
    let flow = compute_cross_label_flow(app.issues());
    output::print_label_flow(&flow, output_mode)?;
    Ok(())
}

/// Execute the label-attention command
pub fn execute_label_attention(
    app: &App,
    args: &LabelAttentionArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let config = app.config();
    let result = compute_label_attention(
        app.issues(),
        &config.attention,
        config.label_health.stale_days,
        Utc::now(),
    );
    output::print_label_attention(&result, args.limit, output_mode)?;
    Ok(())
}

/// Execute the label command
pub fn execute_label(app: &App, args: &LabelArgs, output_mode: OutputMode) -> Result<()> {
    let known = extract_labels(app.issues());
    if !known.stats.contains_key(&args.name) {
        return Err(Error::LabelNotFound(args.name.clone()).into());
    }
    let analysis = ScopedAnalysis::compute(app.issues(), &args.name, &app.config().centrality);
    output::print_scoped(&analysis, args.limit, output_mode)?;
    Ok(())
}

fn current_snapshot(app: &App, now: DateTime<Utc>) -> Snapshot {
    let stats = app.analyze();
    stats.wait_for_phase2();
    Snapshot::from_stats(app.issues(), &stats, now)
}

/// Execute the snapshot command
pub async fn execute_snapshot(
    app: &App,
    args: &SnapshotArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let mut snapshot = current_snapshot(app, Utc::now());
    if let Some(revision) = &args.revision {
        snapshot = snapshot.with_revision(revision.clone());
    }
    snapshot.save(&args.output).await?;

    output::print_message(
        &format!(
            "Saved snapshot of {} issues to {}",
            snapshot.issues.len(),
            args.output.display()
        ),
        output_mode,
    )?;
    Ok(())
}

/// Execute the diff command
pub async fn execute_diff(app: &App, args: &DiffArgs, output_mode: OutputMode) -> Result<()> {
    let from = Snapshot::load(&args.from).await?;
    let to = match &args.to {
        Some(path) => Snapshot::load(path).await?,
        None => current_snapshot(app, Utc::now()),
    };
    let diff = compare_snapshots(&from, &to);
    output::print_diff(&diff, output_mode)?;
    Ok(())
}

/// Execute the stats command
pub fn execute_stats(app: &App, _args: &StatsArgs, output_mode: OutputMode) -> Result<()> {
    let result = run_triage(app, None, None, Utc::now());
    let report = StatsReport {
        source: app.issue_file().display().to_string(),
        skipped_lines: app.warnings().iter().map(|w| w.description()).collect(),
        health: &result.project_health,
    };
    output::print_stats(&report, output_mode)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::test_support::{blocked_by, chain, issue, with_labels, with_priority};

    fn app() -> App {
        let mut issues = chain(&["a", "b", "c"]);
        issues.push(with_labels(issue("d"), &["docs"]));
        App::from_issues(issues, AnalysisConfig::default())
    }

    #[test]
    fn triage_limit_overrides_config() {
        let result = run_triage(&app(), None, Some(2), Utc::now());
        assert_eq!(result.recommendations.len(), 2);
    }

    #[test]
    fn label_grouping_is_populated() {
        let result = run_triage(&app(), Some(crate::triage::GroupBy::Label), None, Utc::now());
        let groups = result.by_label.unwrap();
        assert!(groups.iter().any(|g| g.key == "docs"));
        assert!(result.by_track.is_none());
    }

    #[test]
    fn suggest_limit_caps_both_lists() {
        let mut issues = vec![with_priority(issue("hub"), 4)];
        for n in 0..4 {
            let mut dependent = blocked_by(issue(&format!("d{n}")), &["hub"]);
            dependent.title = "Render pipeline shader cache".to_string();
            issues.push(dependent);
        }
        let app = App::from_issues(issues, AnalysisConfig::default());

        let full = run_suggest(&app, None, Utc::now());
        assert!(full.dependencies.len() > 1);
        let capped = run_suggest(&app, Some(1), Utc::now());
        assert_eq!(capped.dependencies.len(), 1);
        assert!(capped.priority.len() <= 1);
    }

    #[test]
    fn unknown_label_is_an_error() {
        let args = LabelArgs {
            name: "nope".to_string(),
            limit: 5,
        };
        let err = execute_label(&app(), &args, OutputMode::Json).unwrap_err();
        assert_eq!(err.to_string(), "Label not found: nope");
    }
}
