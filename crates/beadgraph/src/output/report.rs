//! Text renderers for command results.
//!
//! Each `write_*` function renders one result type to any [`Write`] sink so
//! the same code serves stdout and in-memory buffers in tests.

use std::io::{self, Write};

use super::color::{
    bold, colored_status_icon, colorize_health, colorize_id, colorize_label, colorize_priority,
    colorize_status, dimmed, error, score_bar, success, warning,
};
use super::tree::{TreeNode, write_tree};
use super::{OutputConfig, StatsReport, wrap_text};
use crate::analysis::ExecutionPlan;
use crate::domain::{HealthLevel, IssueId};
use crate::insights::{InsightItem, Insights};
use crate::labels::{
    AttentionResult, CrossLabelFlow, LabelAnalysisResult, ScopedAnalysis, Trend,
};
use crate::snapshot::{HealthTrend, IssueRef, SnapshotDiff};
use crate::triage::{
    Direction, ProjectHealth, Recommendation, RecommendationGroup, SuggestionReport, TriageResult,
};

const BAR_WIDTH: usize = 20;

fn join_ids(ids: &[IssueId], config: &OutputConfig) -> String {
    ids.iter()
        .map(|id| colorize_id(id.as_str(), config))
        .collect::<Vec<_>>()
        .join(", ")
}

fn heading<W: Write>(w: &mut W, title: &str, config: &OutputConfig) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "{}", bold(title, config))
}

fn write_wrapped<W: Write>(
    w: &mut W,
    indent: &str,
    text: &str,
    config: &OutputConfig,
) -> io::Result<()> {
    let width = config.content_width().saturating_sub(indent.len());
    for line in wrap_text(text, width) {
        writeln!(w, "{indent}{line}")?;
    }
    Ok(())
}

// ============================================================================
// Triage
// ============================================================================

fn write_recommendation<W: Write>(
    w: &mut W,
    rank: usize,
    rec: &Recommendation,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{rank:>2}. {} {} [{}] {} {}",
        colored_status_icon(rec.status, config),
        colorize_id(rec.id.as_str(), config),
        colorize_priority(rec.priority, config),
        rec.title,
        dimmed(&format!("({:.3})", rec.score), config),
    )?;
    write_wrapped(w, "      ", &rec.primary_reason, config)?;
    if !rec.unblocks.is_empty() {
        writeln!(
            w,
            "      {} {}",
            dimmed("Unblocks:", config),
            join_ids(&rec.unblocks, config)
        )?;
    }
    if !rec.blocked_by.is_empty() {
        writeln!(
            w,
            "      {} {}",
            dimmed("Waiting on:", config),
            join_ids(&rec.blocked_by, config)
        )?;
    }
    Ok(())
}

fn write_groups<W: Write>(
    w: &mut W,
    title: &str,
    groups: &[RecommendationGroup],
    config: &OutputConfig,
) -> io::Result<()> {
    heading(w, title, config)?;
    for group in groups {
        let top = group
            .top_pick
            .as_ref()
            .map_or_else(String::new, |id| format!(" top: {}", colorize_id(id.as_str(), config)));
        writeln!(
            w,
            "  {} {} {}{top}",
            bold(&group.key, config),
            dimmed(&format!("({} items, unblocks {})", group.recommendations.len(), group.total_unblocks), config),
            group.reason,
        )?;
    }
    Ok(())
}

/// Renders the full triage report.
///
/// # Errors
///
/// Fails if the sink cannot be written.
pub fn write_triage<W: Write>(
    w: &mut W,
    result: &TriageResult,
    config: &OutputConfig,
) -> io::Result<()> {
    let quick = &result.quick_ref;
    writeln!(
        w,
        "{} {} open, {} actionable, {} blocked, {} in progress",
        bold("Triage:", config),
        quick.open_count,
        success(&quick.actionable_count.to_string(), config),
        error(&quick.blocked_count.to_string(), config),
        warning(&quick.in_progress_count.to_string(), config),
    )?;

    if result.recommendations.is_empty() {
        writeln!(w)?;
        return writeln!(w, "Nothing to work on: no open issues.");
    }

    heading(w, "Recommendations", config)?;
    for (i, rec) in result.recommendations.iter().enumerate() {
        write_recommendation(w, i + 1, rec, config)?;
    }

    if !result.quick_wins.is_empty() {
        heading(w, "Quick wins", config)?;
        for win in &result.quick_wins {
            writeln!(
                w,
                "  {} {} {}",
                colorize_id(win.id.as_str(), config),
                win.title,
                dimmed(&format!("- {}", win.reason), config)
            )?;
        }
    }

    if !result.blockers_to_clear.is_empty() {
        heading(w, "Blockers to clear", config)?;
        for blocker in &result.blockers_to_clear {
            let state = if blocker.actionable {
                success("ready", config)
            } else {
                error("blocked", config)
            };
            let node = TreeNode::with_children(
                format!(
                    "  {} {} [{state}] unblocks {}",
                    colorize_id(blocker.id.as_str(), config),
                    blocker.title,
                    blocker.unblocks_count
                ),
                blocker
                    .unblocks
                    .iter()
                    .map(|id| TreeNode::leaf(colorize_id(id.as_str(), config)))
                    .collect(),
            );
            write_tree(w, &node, config)?;
        }
    }

    if let Some(groups) = &result.by_track {
        write_groups(w, "By track", groups, config)?;
    }
    if let Some(groups) = &result.by_label {
        write_groups(w, "By label", groups, config)?;
    }

    heading(w, "Commands", config)?;
    writeln!(w, "  {} {}", dimmed("claim:", config), result.commands.claim_top)?;
    writeln!(w, "  {} {}", dimmed("show: ", config), result.commands.show_top)?;
    Ok(())
}

/// Renders the single best recommendation.
///
/// # Errors
///
/// Fails if the sink cannot be written.
pub fn write_next<W: Write>(
    w: &mut W,
    top: Option<&Recommendation>,
    config: &OutputConfig,
) -> io::Result<()> {
    let Some(rec) = top else {
        return writeln!(w, "No actionable issues.");
    };
    writeln!(
        w,
        "{} {} [{}] {}",
        bold("Next:", config),
        colorize_id(rec.id.as_str(), config),
        colorize_priority(rec.priority, config),
        rec.title
    )?;
    writeln!(w, "  {} {}", dimmed("status:", config), colorize_status(rec.status, config))?;
    for reason in &rec.reasons {
        write_wrapped(w, "  - ", reason, config)?;
    }
    writeln!(w, "  {} {}", dimmed("claim:", config), rec.claim_command)?;
    writeln!(w, "  {} {}", dimmed("show: ", config), rec.show_command)
}

/// Renders a ranked recommendation list with score bars.
///
/// # Errors
///
/// Fails if the sink cannot be written.
pub fn write_priority<W: Write>(
    w: &mut W,
    recommendations: &[Recommendation],
    config: &OutputConfig,
) -> io::Result<()> {
    if recommendations.is_empty() {
        return writeln!(w, "No open issues.");
    }
    let max = recommendations
        .iter()
        .map(|r| r.score)
        .fold(0.0_f64, f64::max);
    for (i, rec) in recommendations.iter().enumerate() {
        let fraction = if max > 0.0 { rec.score / max } else { 0.0 };
        writeln!(
            w,
            "{:>2}. {} {:.3} {} {}",
            i + 1,
            score_bar(fraction, BAR_WIDTH, config),
            rec.score,
            colorize_id(rec.id.as_str(), config),
            rec.title
        )?;
    }
    Ok(())
}

// ============================================================================
// Suggestions
// ============================================================================

/// Renders priority changes with their what-if summary, then likely
/// missing dependencies.
///
/// # Errors
///
/// Fails if the sink cannot be written.
pub fn write_suggestions<W: Write>(
    w: &mut W,
    report: &SuggestionReport,
    config: &OutputConfig,
) -> io::Result<()> {
    heading(w, "Priority changes", config)?;
    if report.priority.is_empty() {
        writeln!(w, "  {}", dimmed("Priorities match impact.", config))?;
    }
    for rec in &report.priority {
        let arrow = match rec.direction {
            Direction::Increase => success("raise", config),
            Direction::Decrease => warning("lower", config),
        };
        writeln!(
            w,
            "  {} {} {} -> {} ({:.0}% sure) {}",
            colorize_id(rec.id.as_str(), config),
            arrow,
            colorize_priority(rec.current_priority, config),
            colorize_priority(rec.suggested_priority, config),
            rec.confidence * 100.0,
            rec.title
        )?;
        for reason in &rec.reasoning {
            write_wrapped(w, "    - ", reason, config)?;
        }
        if let Some(delta) = &rec.what_if {
            write_wrapped(w, "    ", &delta.explanation, config)?;
        }
    }

    heading(w, "Possible missing dependencies", config)?;
    if report.dependencies.is_empty() {
        writeln!(w, "  {}", dimmed("None found.", config))?;
    }
    for dep in &report.dependencies {
        writeln!(
            w,
            "  {} may depend on {} ({:.0}% sure, {})",
            colorize_id(dep.from.as_str(), config),
            colorize_id(dep.to.as_str(), config),
            dep.confidence * 100.0,
            dep.reason
        )?;
        writeln!(
            w,
            "    {} {}",
            dimmed("shared:", config),
            dep.shared_keywords.join(", ")
        )?;
        writeln!(w, "    {} {}", dimmed("add:", config), dep.action)?;
    }
    Ok(())
}

// ============================================================================
// Insights and plan
// ============================================================================

fn write_insight_list<W: Write>(
    w: &mut W,
    title: &str,
    items: &[InsightItem],
    config: &OutputConfig,
) -> io::Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    heading(w, title, config)?;
    for item in items {
        writeln!(
            w,
            "  {:<16} {:.4}",
            colorize_id(item.id.as_str(), config),
            item.value
        )?;
    }
    Ok(())
}

/// Renders the insight lists.
///
/// # Errors
///
/// Fails if the sink cannot be written.
pub fn write_insights<W: Write>(
    w: &mut W,
    insights: &Insights,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} density {:.4}",
        bold("Graph insights:", config),
        insights.cluster_density
    )?;
    if !insights.phase2_ready {
        writeln!(
            w,
            "{}",
            warning("Centrality metrics are still being computed.", config)
        )?;
    }
    write_insight_list(w, "Bottlenecks (betweenness)", &insights.bottlenecks, config)?;
    write_insight_list(w, "Keystones (critical path depth)", &insights.keystones, config)?;
    write_insight_list(w, "Influencers (eigenvector)", &insights.influencers, config)?;
    write_insight_list(w, "Hubs", &insights.hubs, config)?;
    write_insight_list(w, "Authorities", &insights.authorities, config)?;
    write_insight_list(w, "Central (PageRank)", &insights.central, config)?;
    write_insight_list(w, "Stale (days since update)", &insights.stale, config)?;

    if !insights.cycles.is_empty() {
        heading(w, &error("Cycles", config), config)?;
        let arrow = if config.use_ascii { " -> " } else { " → " };
        for cycle in &insights.cycles {
            let path: Vec<String> = cycle
                .iter()
                .map(|id| colorize_id(id.as_str(), config))
                .collect();
            writeln!(w, "  {}", path.join(arrow))?;
        }
    }
    Ok(())
}

/// Renders the execution plan as one tree per track.
///
/// # Errors
///
/// Fails if the sink cannot be written.
pub fn write_plan<W: Write>(
    w: &mut W,
    plan: &ExecutionPlan,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {} tracks, {} actionable",
        bold("Execution plan:", config),
        plan.tracks.len(),
        plan.total_actionable
    )?;
    writeln!(w, "{}", plan.summary.impact_reason)?;

    for track in &plan.tracks {
        writeln!(w)?;
        let items = track
            .items
            .iter()
            .map(|item| {
                let label = format!(
                    "{} {} {} {}",
                    colored_status_icon(item.status, config),
                    colorize_id(item.id.as_str(), config),
                    colorize_priority(item.priority, config),
                    item.title
                );
                let children = if item.unblocks.is_empty() {
                    Vec::new()
                } else {
                    vec![TreeNode::leaf(format!(
                        "{} {}",
                        dimmed("unblocks", config),
                        join_ids(&item.unblocks, config)
                    ))]
                };
                TreeNode::with_children(label, children)
            })
            .collect();
        let root = TreeNode::with_children(
            format!("{} {}", bold(&track.track_id, config), dimmed(&track.reason, config)),
            items,
        );
        write_tree(w, &root, config)?;
    }

    if !plan.unscheduled.is_empty() {
        heading(w, &error("Unscheduled (blocked by a cycle)", config), config)?;
        writeln!(w, "  {}", join_ids(&plan.unscheduled, config))?;
    }
    Ok(())
}

// ============================================================================
// Labels
// ============================================================================

fn trend_str(trend: Trend) -> &'static str {
    match trend {
        Trend::Improving => "improving",
        Trend::Stable => "stable",
        Trend::Declining => "declining",
    }
}

/// Renders the per-label health table, worst first.
///
/// # Errors
///
/// Fails if the sink cannot be written.
pub fn write_label_health<W: Write>(
    w: &mut W,
    result: &LabelAnalysisResult,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {} labels: {} healthy, {} warning, {} critical",
        bold("Label health:", config),
        result.total_labels,
        colorize_health(&result.healthy_count.to_string(), HealthLevel::Healthy, config),
        colorize_health(&result.warning_count.to_string(), HealthLevel::Warning, config),
        colorize_health(&result.critical_count.to_string(), HealthLevel::Critical, config),
    )?;
    if result.labels.is_empty() {
        return writeln!(w, "No labels found.");
    }
    writeln!(w)?;
    for health in &result.labels {
        let level = format!("{:>5.1} {:<8}", health.health, health.health_level.to_string());
        writeln!(
            w,
            "  {} {} {:<20} {}",
            score_bar(health.health / 100.0, BAR_WIDTH, config),
            colorize_health(&level, health.health_level, config),
            colorize_label(&health.label, config),
            dimmed(
                &format!(
                    "{} open, {} blocked, velocity {}, {} stale",
                    health.open_count,
                    health.blocked_count,
                    trend_str(health.velocity.trend),
                    health.freshness.stale_count
                ),
                config
            ),
        )?;
    }
    if !result.attention_needed.is_empty() {
        writeln!(w)?;
        writeln!(
            w,
            "{} {}",
            warning("Needs attention:", config),
            result.attention_needed.join(", ")
        )?;
    }
    Ok(())
}

/// Renders cross-label blocking dependencies.
///
/// # Errors
///
/// Fails if the sink cannot be written.
pub fn write_label_flow<W: Write>(
    w: &mut W,
    flow: &CrossLabelFlow,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {} cross-label dependencies across {} labels",
        bold("Label flow:", config),
        flow.total_cross_label_deps,
        flow.labels.len()
    )?;
    if flow.dependencies.is_empty() {
        return Ok(());
    }
    let arrow = if config.use_ascii { "->" } else { "→" };
    writeln!(w)?;
    for dep in &flow.dependencies {
        writeln!(
            w,
            "  {} {arrow} {} {}",
            colorize_label(&dep.from_label, config),
            colorize_label(&dep.to_label, config),
            dimmed(&format!("({})", dep.issue_count), config)
        )?;
    }
    if !flow.bottleneck_labels.is_empty() {
        writeln!(w)?;
        writeln!(
            w,
            "{} {}",
            warning("Bottleneck labels:", config),
            flow.bottleneck_labels.join(", ")
        )?;
    }
    Ok(())
}

/// Renders the top `limit` labels by attention score.
///
/// # Errors
///
/// Fails if the sink cannot be written.
pub fn write_label_attention<W: Write>(
    w: &mut W,
    result: &AttentionResult,
    limit: usize,
    config: &OutputConfig,
) -> io::Result<()> {
    if result.labels.is_empty() {
        return writeln!(w, "No labels with open work.");
    }
    writeln!(w, "{}", bold("Labels needing attention:", config))?;
    for entry in result.top(limit) {
        writeln!(
            w,
            "{:>3}. {} {:<20} {:.2}",
            entry.rank,
            score_bar(entry.normalized_score, BAR_WIDTH, config),
            colorize_label(&entry.label, config),
            entry.attention_score
        )?;
        for reason in &entry.reasons {
            write_wrapped(w, "       - ", reason, config)?;
        }
    }
    Ok(())
}

/// Renders the analysis scoped to one label.
///
/// # Errors
///
/// Fails if the sink cannot be written.
pub fn write_scoped<W: Write>(
    w: &mut W,
    analysis: &ScopedAnalysis,
    limit: usize,
    config: &OutputConfig,
) -> io::Result<()> {
    let sub = &analysis.subgraph;
    writeln!(
        w,
        "{} {} core issues, {} dependencies, {} edges",
        bold(&format!("Label {}:", colorize_label(&sub.label, config)), config),
        sub.core_count,
        sub.dependency_issues.len(),
        sub.edge_count
    )?;
    writeln!(w, "Longest chain depth: {}", analysis.max_depth)?;
    if analysis.has_cycle {
        writeln!(w, "{}", error("Contains a blocking cycle.", config))?;
    }
    let top = analysis.pagerank.top_core_issues(limit);
    if top.is_empty() {
        return Ok(());
    }
    heading(w, "Most central core issues", config)?;
    for ranked in top {
        writeln!(
            w,
            "{:>3}. {} {:<16} {:.4}",
            ranked.rank,
            score_bar(ranked.normalized, BAR_WIDTH, config),
            colorize_id(ranked.id.as_str(), config),
            ranked.score
        )?;
    }
    Ok(())
}

// ============================================================================
// Diff and stats
// ============================================================================

fn write_refs<W: Write>(
    w: &mut W,
    title: &str,
    refs: &[IssueRef],
    config: &OutputConfig,
) -> io::Result<()> {
    if refs.is_empty() {
        return Ok(());
    }
    heading(w, title, config)?;
    for r in refs {
        writeln!(
            w,
            "  {} {} [{}] {}",
            colored_status_icon(r.status, config),
            colorize_id(r.id.as_str(), config),
            colorize_priority(r.priority, config),
            r.title
        )?;
    }
    Ok(())
}

/// Renders the changes between two snapshots.
///
/// # Errors
///
/// Fails if the sink cannot be written.
pub fn write_diff<W: Write>(w: &mut W, diff: &SnapshotDiff, config: &OutputConfig) -> io::Result<()> {
    let trend = diff.summary.health_trend;
    let trend_text = match trend {
        HealthTrend::Improving => success(trend.as_str(), config),
        HealthTrend::Stable => trend.as_str().to_string(),
        HealthTrend::Degrading => error(trend.as_str(), config),
    };
    writeln!(
        w,
        "{} {} to {} ({trend_text})",
        bold("Changes", config),
        diff.from_taken_at.format("%Y-%m-%d %H:%M"),
        diff.to_taken_at.format("%Y-%m-%d %H:%M"),
    )?;
    if diff.is_empty() {
        return writeln!(w, "No changes.");
    }

    write_refs(w, "New", &diff.new_issues, config)?;
    write_refs(w, "Closed", &diff.closed_issues, config)?;
    write_refs(w, "Reopened", &diff.reopened_issues, config)?;
    write_refs(w, "Removed", &diff.removed_issues, config)?;

    if !diff.modified_issues.is_empty() {
        heading(w, "Modified", config)?;
        for m in &diff.modified_issues {
            writeln!(w, "  {} {}", colorize_id(m.issue_id.as_str(), config), m.title)?;
            for change in &m.changes {
                writeln!(
                    w,
                    "      {} {} -> {}",
                    dimmed(&format!("{}:", change.field), config),
                    change.old_value,
                    change.new_value
                )?;
            }
        }
    }

    let arrow = if config.use_ascii { " -> " } else { " → " };
    for (title, cycles) in [
        ("New cycles", &diff.new_cycles),
        ("Resolved cycles", &diff.resolved_cycles),
    ] {
        if cycles.is_empty() {
            continue;
        }
        heading(w, title, config)?;
        for cycle in cycles {
            let ids: Vec<&str> = cycle.iter().map(IssueId::as_str).collect();
            writeln!(w, "  {}", ids.join(arrow))?;
        }
    }

    let d = &diff.metric_deltas;
    heading(w, "Deltas", config)?;
    writeln!(
        w,
        "  open {:+}, closed {:+}, blocked {:+}, actionable {:+}, cycles {:+}",
        d.open_issues, d.closed_issues, d.blocked_issues, d.actionable_issues, d.cycle_count
    )
}

fn write_health_block<W: Write>(
    w: &mut W,
    health: &ProjectHealth,
    config: &OutputConfig,
) -> io::Result<()> {
    let counts = &health.counts;
    writeln!(
        w,
        "Issues: {} total, {} open, {} closed, {} actionable, {} blocked",
        counts.total, counts.open, counts.closed, counts.actionable, counts.blocked
    )?;
    for (status, count) in &counts.by_status {
        writeln!(w, "  {:<12} {count}", dimmed(status, config))?;
    }
    for (priority, count) in &counts.by_priority {
        writeln!(w, "  {:<12} {count}", colorize_priority(*priority, config))?;
    }

    let graph = &health.graph;
    writeln!(
        w,
        "Graph: {} nodes, {} edges, density {:.4}",
        graph.node_count, graph.edge_count, graph.density
    )?;
    if graph.has_cycles {
        writeln!(w, "  {}", error(&format!("{} cycle(s)", graph.cycle_count), config))?;
    }

    let v = &health.velocity;
    writeln!(
        w,
        "Velocity: {} closed in 7 days, {} in 30 days, {:.1} days to close{}",
        v.closed_last_7_days,
        v.closed_last_30_days,
        v.avg_days_to_close,
        if v.estimated { " (estimated)" } else { "" }
    )
}

/// Renders project statistics.
///
/// # Errors
///
/// Fails if the sink cannot be written.
pub fn write_stats<W: Write>(
    w: &mut W,
    stats: &StatsReport<'_>,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(w, "{} {}", bold("Source:", config), stats.source)?;
    write_health_block(w, stats.health, config)?;
    if !stats.skipped_lines.is_empty() {
        writeln!(
            w,
            "{}",
            warning(&format!("Skipped {} line(s):", stats.skipped_lines.len()), config)
        )?;
        for line in &stats.skipped_lines {
            writeln!(w, "  {line}")?;
        }
    }
    Ok(())
}
