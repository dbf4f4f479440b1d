//! Tunable analysis parameters.
//!
//! Every coefficient the engine uses lives here so that triage weighting,
//! staleness thresholds and health cutoffs can be adjusted per project from
//! `.beads/beadgraph.yaml` without recompiling. Defaults are sensible
//! starting points, not load-bearing constants.
//!
//! ```yaml
//! centrality:
//!   damping: 0.9
//! triage:
//!   stale_days: 21
//! label_health:
//!   cutoffs:
//!     healthy: 75
//! ```
//!
//! Any omitted field keeps its default.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Name of the optional config file inside `.beads/`.
pub const CONFIG_FILE_NAME: &str = "beadgraph.yaml";

/// Root configuration for all analysis components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Iterative centrality settings (PageRank, eigenvector, HITS).
    pub centrality: CentralityConfig,
    /// Triage scoring settings.
    pub triage: TriageConfig,
    /// Label health settings.
    pub label_health: LabelHealthConfig,
    /// Label attention weights.
    pub attention: AttentionWeights,
    /// Priority and dependency suggestion settings.
    pub suggestions: SuggestionConfig,
}

/// Convergence settings shared by the iterative algorithms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralityConfig {
    /// PageRank damping factor `d`.
    pub damping: f64,
    /// L1 (PageRank) or L2 (eigenvector, HITS) change below which iteration stops.
    pub tolerance: f64,
    /// Hard iteration cap.
    pub max_iterations: usize,
    /// Maximum number of cycles reported.
    pub cycle_limit: usize,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iterations: 50,
            cycle_limit: 100,
        }
    }
}

/// Weights of the impact-score components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactWeights {
    /// Normalized PageRank.
    pub pagerank: f64,
    /// Normalized betweenness.
    pub betweenness: f64,
    /// In-degree relative to the most-depended-upon issue.
    pub blocker_ratio: f64,
    /// Days since update relative to the staleness horizon.
    pub staleness: f64,
    /// Priority boost (P0 highest).
    pub priority: f64,
    /// Depth and effort based time-to-impact.
    pub time_to_impact: f64,
    /// Urgency labels and age decay.
    pub urgency: f64,
}

impl Default for ImpactWeights {
    fn default() -> Self {
        Self {
            pagerank: 0.22,
            betweenness: 0.20,
            blocker_ratio: 0.13,
            staleness: 0.05,
            priority: 0.10,
            time_to_impact: 0.10,
            urgency: 0.10,
        }
    }
}

impl ImpactWeights {
    fn values(&self) -> [f64; 7] {
        [
            self.pagerank,
            self.betweenness,
            self.blocker_ratio,
            self.staleness,
            self.priority,
            self.time_to_impact,
            self.urgency,
        ]
    }
}

/// Triage composition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Impact component weights.
    pub weights: ImpactWeights,
    /// Share of the triage score taken from the impact score.
    pub base_weight: f64,
    /// Maximum boost for issues that unblock others.
    pub unblock_weight: f64,
    /// Maximum boost for quick wins.
    pub quick_win_weight: f64,
    /// Lower bound on the unblock normalizer, so one dependent is not "everything".
    pub unblock_floor: usize,
    /// Deepest blocker chain still eligible for the quick-win boost.
    pub quick_win_max_depth: usize,
    /// Quick-win boost above which an issue is labelled a quick win.
    pub quick_win_threshold: f64,
    /// Issues must unblock strictly more than this to be listed as blockers.
    pub blocker_threshold: usize,
    /// Days without update after which an issue is stale.
    pub stale_days: i64,
    /// Days at which the staleness component saturates.
    pub staleness_horizon_days: i64,
    /// Length of the recommendation list.
    pub top_n: usize,
    /// Length of the quick-win list.
    pub quick_wins_n: usize,
    /// Length of the blockers-to-clear list.
    pub blockers_n: usize,
    /// Length of the top-picks list.
    pub top_picks_n: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            weights: ImpactWeights::default(),
            base_weight: 0.70,
            unblock_weight: 0.15,
            quick_win_weight: 0.15,
            unblock_floor: 5,
            quick_win_max_depth: 2,
            quick_win_threshold: 0.05,
            blocker_threshold: 0,
            stale_days: 14,
            staleness_horizon_days: 30,
            top_n: 10,
            quick_wins_n: 5,
            blockers_n: 5,
            top_picks_n: 3,
        }
    }
}

/// Weights of the label-health sub-scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthWeights {
    /// Velocity sub-score weight.
    pub velocity: f64,
    /// Freshness sub-score weight.
    pub freshness: f64,
    /// Flow sub-score weight.
    pub flow: f64,
    /// Criticality sub-score weight (only used when Phase-2 is available).
    pub criticality: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            velocity: 0.25,
            freshness: 0.25,
            flow: 0.25,
            criticality: 0.25,
        }
    }
}

/// Score-to-level cutoffs for health classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCutoffs {
    /// Scores at or above this are healthy.
    pub healthy: f64,
    /// Scores at or above this (and below `healthy`) are warnings.
    pub warning: f64,
}

impl Default for HealthCutoffs {
    fn default() -> Self {
        Self {
            healthy: 70.0,
            warning: 40.0,
        }
    }
}

/// Label health settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelHealthConfig {
    /// Days without update after which an open issue counts as stale.
    pub stale_days: i64,
    /// Closures per 30 days that earn a full velocity score.
    pub velocity_target: f64,
    /// Sub-score weights.
    pub weights: HealthWeights,
    /// Level cutoffs.
    pub cutoffs: HealthCutoffs,
}

impl Default for LabelHealthConfig {
    fn default() -> Self {
        Self {
            stale_days: 14,
            velocity_target: 10.0,
            weights: HealthWeights::default(),
            cutoffs: HealthCutoffs::default(),
        }
    }
}

/// Weights of the label attention blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionWeights {
    /// Mean staleness of open issues.
    pub staleness: f64,
    /// Issues outside the label blocked by it.
    pub block_impact: f64,
    /// Lack of recent closures.
    pub velocity: f64,
    /// Urgent work that is stale or blocked.
    pub priority_mismatch: f64,
}

impl Default for AttentionWeights {
    fn default() -> Self {
        Self {
            staleness: 0.35,
            block_impact: 0.30,
            velocity: 0.20,
            priority_mismatch: 0.15,
        }
    }
}

/// When a priority change is worth suggesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    /// Normalized PageRank above which centrality counts as a signal.
    pub high_pagerank: f64,
    /// Normalized betweenness above which an issue counts as a bottleneck.
    pub high_betweenness: f64,
    /// Days without update that count as a staleness signal.
    pub staleness_days: i64,
    /// Suggestions below this confidence are dropped.
    pub min_confidence: f64,
    /// Score gap to the current priority that raises confidence.
    pub significant_delta: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            high_pagerank: 0.3,
            high_betweenness: 0.5,
            staleness_days: 14,
            min_confidence: 0.3,
            significant_delta: 0.15,
        }
    }
}

/// Missing-dependency detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencySuggestionConfig {
    /// Shared keywords a pair needs before it is considered at all.
    pub min_keyword_overlap: usize,
    /// Confidence added for a title word or ID mention in the other issue.
    pub exact_match_bonus: f64,
    /// Confidence added per shared label.
    pub label_overlap_bonus: f64,
    /// Suggestions below this confidence are dropped.
    pub min_confidence: f64,
    /// Length of the suggestion list.
    pub max_suggestions: usize,
    /// Skip pairs already linked in either direction.
    pub ignore_existing_deps: bool,
}

impl Default for DependencySuggestionConfig {
    fn default() -> Self {
        Self {
            min_keyword_overlap: 2,
            exact_match_bonus: 0.15,
            label_overlap_bonus: 0.1,
            min_confidence: 0.5,
            max_suggestions: 20,
            ignore_existing_deps: true,
        }
    }
}

/// Settings for the `suggest` report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Priority recommendation thresholds.
    pub priority: RecommendationThresholds,
    /// Missing-dependency detection.
    pub dependencies: DependencySuggestionConfig,
}

impl AnalysisConfig {
    /// Parses configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for malformed YAML or values that fail
    /// [`validate`](Self::validate).
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file deserializes to `null`, which means "all defaults".
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or does not parse.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        Self::from_yaml(&content)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Fails only if an existing file cannot be read or parsed.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if fs::try_exists(path).await? {
            tracing::debug!(path = %path.display(), "Loading analysis config");
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Rejects values that would make the algorithms misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let c = &self.centrality;
        if !(c.damping > 0.0 && c.damping < 1.0) {
            return Err(Error::Config(format!(
                "centrality.damping must be in (0, 1), got {}",
                c.damping
            )));
        }
        if !(c.tolerance.is_finite() && c.tolerance > 0.0) {
            return Err(Error::Config(
                "centrality.tolerance must be positive".to_string(),
            ));
        }
        if c.max_iterations == 0 {
            return Err(Error::Config(
                "centrality.max_iterations must be at least 1".to_string(),
            ));
        }

        let t = &self.triage;
        let triage_weights = t.weights.values().into_iter().chain([
            t.base_weight,
            t.unblock_weight,
            t.quick_win_weight,
            t.quick_win_threshold,
        ]);
        let h = &self.label_health.weights;
        let a = &self.attention;
        let p = &self.suggestions.priority;
        let d = &self.suggestions.dependencies;
        let all = triage_weights.chain([
            p.high_pagerank,
            p.high_betweenness,
            p.min_confidence,
            p.significant_delta,
            d.exact_match_bonus,
            d.label_overlap_bonus,
            d.min_confidence,
            h.velocity,
            h.freshness,
            h.flow,
            h.criticality,
            a.staleness,
            a.block_impact,
            a.velocity,
            a.priority_mismatch,
        ]);
        if all.into_iter().any(|w| !w.is_finite() || w < 0.0) {
            return Err(Error::Config(
                "weights must be finite and non-negative".to_string(),
            ));
        }

        let cutoffs = &self.label_health.cutoffs;
        if cutoffs.warning > cutoffs.healthy {
            return Err(Error::Config(format!(
                "label_health.cutoffs.warning ({}) exceeds healthy ({})",
                cutoffs.warning, cutoffs.healthy
            )));
        }
        if self.label_health.velocity_target <= 0.0 {
            return Err(Error::Config(
                "label_health.velocity_target must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = AnalysisConfig::from_yaml(
            "centrality:\n  damping: 0.9\nlabel_health:\n  cutoffs:\n    healthy: 75\n",
        )
        .unwrap();

        assert!((config.centrality.damping - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.centrality.max_iterations, 50);
        assert!((config.label_health.cutoffs.healthy - 75.0).abs() < f64::EPSILON);
        assert!((config.label_health.cutoffs.warning - 40.0).abs() < f64::EPSILON);
        assert_eq!(config.triage, TriageConfig::default());
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(
            AnalysisConfig::from_yaml("  \n").unwrap(),
            AnalysisConfig::default()
        );
    }

    #[rstest]
    #[case::damping_one("centrality:\n  damping: 1.0\n", "damping")]
    #[case::zero_iterations("centrality:\n  max_iterations: 0\n", "max_iterations")]
    #[case::negative_weight("triage:\n  weights:\n    pagerank: -0.1\n", "non-negative")]
    #[case::negative_bonus(
        "suggestions:\n  dependencies:\n    label_overlap_bonus: -1\n",
        "non-negative"
    )]
    #[case::inverted_cutoffs("label_health:\n  cutoffs:\n    warning: 80\n", "exceeds healthy")]
    #[case::not_yaml("centrality: [", "")]
    fn invalid_configs_are_rejected(#[case] yaml: &str, #[case] message: &str) {
        let err = AnalysisConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(message));
    }

    #[test]
    fn suggestion_thresholds_are_configurable() {
        let config = AnalysisConfig::from_yaml(
            "suggestions:\n  priority:\n    min_confidence: 0.6\n  dependencies:\n    max_suggestions: 5\n",
        )
        .unwrap();
        assert!((config.suggestions.priority.min_confidence - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.suggestions.priority.staleness_days, 14);
        assert_eq!(config.suggestions.dependencies.max_suggestions, 5);
        assert!(config.suggestions.dependencies.ignore_existing_deps);
    }

    #[tokio::test]
    async fn load_or_default_without_file() {
        let dir = TempDir::new().unwrap();
        let config = AnalysisConfig::load_or_default(&dir.path().join(CONFIG_FILE_NAME))
            .await
            .unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[tokio::test]
    async fn load_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "triage:\n  stale_days: 21\n").unwrap();

        let config = AnalysisConfig::load_or_default(&path).await.unwrap();
        assert_eq!(config.triage.stale_days, 21);
    }
}
