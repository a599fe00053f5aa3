//! Statistical Tester - paired t-tests between factors and one-way ANOVA
//! with post-hoc comparison between respondent groups.
//!
//! Unmet prerequisites never fail the run: a paired cell becomes
//! not-applicable, an ANOVA is recorded as skipped, and a missing post-hoc
//! capability leaves the omnibus result with an empty post-hoc field.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::StatisticsConfig;
use crate::domain::ahp::PriorityVector;
use crate::domain::foundation::StatisticsError;

// =============================================================================
// Paired t-test
// =============================================================================

/// Result of a paired t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairedTTest {
    pub t_statistic: f64,
    pub df: f64,
    pub p_value: f64,
}

/// Two-sided paired t-test of `x` against `y`.
///
/// # Edge Cases
/// - fewer than 2 pairs: `InsufficientData`
/// - identical differences: mean 0 gives t = 0, p = 1; otherwise t = ±∞, p = 0
pub fn paired_t_test(x: &[f64], y: &[f64]) -> Result<PairedTTest, StatisticsError> {
    if x.len() != y.len() {
        return Err(StatisticsError::InvalidParameter(format!(
            "paired samples differ in length ({} vs {})",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 2 {
        return Err(StatisticsError::InsufficientData {
            required: 2,
            actual: n,
        });
    }

    let diffs: Vec<f64> = x.iter().zip(y).map(|(a, b)| a - b).collect();
    let nf = n as f64;
    let mean = diffs.iter().sum::<f64>() / nf;
    let variance = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (nf - 1.0);
    let df = nf - 1.0;

    if variance == 0.0 {
        let (t_statistic, p_value) = if mean == 0.0 {
            (0.0, 1.0)
        } else {
            (mean.signum() * f64::INFINITY, 0.0)
        };
        return Ok(PairedTTest {
            t_statistic,
            df,
            p_value,
        });
    }

    let t_statistic = mean / (variance / nf).sqrt();
    let p_value = two_sided_t_p(t_statistic, df)?;
    Ok(PairedTTest {
        t_statistic,
        df,
        p_value,
    })
}

fn two_sided_t_p(t: f64, df: f64) -> Result<f64, StatisticsError> {
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| StatisticsError::InvalidParameter(e.to_string()))?;
    Ok((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

/// One cell of the factor-by-factor paired significance matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PairedCell {
    /// A factor against itself; reported as p = 1.
    Diagonal,
    /// Too few respondents for a paired test.
    NotApplicable,
    Tested { t_statistic: f64, p_value: f64 },
}

impl PairedCell {
    /// The p-value, if one is defined.
    pub fn p_value(&self) -> Option<f64> {
        match self {
            PairedCell::Diagonal => Some(1.0),
            PairedCell::NotApplicable => None,
            PairedCell::Tested { p_value, .. } => Some(*p_value),
        }
    }
}

/// Paired t-test p-values between every ordered pair of factors of a sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairedSignificance {
    pub factors: Vec<String>,
    pub cells: Vec<Vec<PairedCell>>,
}

impl PairedSignificance {
    /// Tests each factor's weights against each other factor's across `samples`.
    pub fn compute(factors: &[String], samples: &[&PriorityVector]) -> Self {
        let n = factors.len();
        let column = |k: usize| -> Vec<f64> { samples.iter().map(|w| w[k]).collect() };

        let cells = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| {
                        if i == j {
                            return PairedCell::Diagonal;
                        }
                        match paired_t_test(&column(i), &column(j)) {
                            Ok(test) => PairedCell::Tested {
                                t_statistic: test.t_statistic,
                                p_value: test.p_value,
                            },
                            Err(_) => PairedCell::NotApplicable,
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            factors: factors.to_vec(),
            cells,
        }
    }

    /// The cell for factors `i` and `j`.
    pub fn cell(&self, i: usize, j: usize) -> Option<&PairedCell> {
        self.cells.get(i).and_then(|row| row.get(j))
    }
}

// =============================================================================
// One-way ANOVA
// =============================================================================

/// One group's observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSample {
    pub group: String,
    pub values: Vec<f64>,
}

impl GroupSample {
    pub fn new(group: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            group: group.into(),
            values,
        }
    }

    fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }
}

/// Omnibus one-way ANOVA result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnovaResult {
    pub f_statistic: f64,
    pub p_value: f64,
    pub df_between: f64,
    pub df_within: f64,
    /// Pooled within-group variance (mean square error).
    pub mean_square_within: f64,
}

/// One-way ANOVA across `groups`.
///
/// # Errors
/// - fewer than 2 non-empty groups
/// - no within-group degrees of freedom (every group has one observation)
/// - every observation identical (F undefined)
pub fn one_way_anova(groups: &[GroupSample]) -> Result<AnovaResult, StatisticsError> {
    let groups: Vec<&GroupSample> = groups.iter().filter(|g| !g.values.is_empty()).collect();
    let k = groups.len();
    if k < 2 {
        return Err(StatisticsError::InsufficientData {
            required: 2,
            actual: k,
        });
    }

    let total: usize = groups.iter().map(|g| g.values.len()).sum();
    if total <= k {
        return Err(StatisticsError::InsufficientData {
            required: k + 1,
            actual: total,
        });
    }

    let grand_mean =
        groups.iter().flat_map(|g| g.values.iter()).sum::<f64>() / total as f64;
    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in &groups {
        let mean = group.mean();
        ss_between += group.values.len() as f64 * (mean - grand_mean).powi(2);
        ss_within += group.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    }

    let df_between = (k - 1) as f64;
    let df_within = (total - k) as f64;
    let ms_between = ss_between / df_between;
    let ms_within = ss_within / df_within;

    let (f_statistic, p_value) = if ms_within == 0.0 {
        if ms_between == 0.0 {
            return Err(StatisticsError::InvalidParameter(
                "all observations are identical".to_string(),
            ));
        }
        (f64::INFINITY, 0.0)
    } else {
        let f = ms_between / ms_within;
        let dist = FisherSnedecor::new(df_between, df_within)
            .map_err(|e| StatisticsError::InvalidParameter(e.to_string()))?;
        (f, (1.0 - dist.cdf(f)).clamp(0.0, 1.0))
    };

    Ok(AnovaResult {
        f_statistic,
        p_value,
        df_between,
        df_within,
        mean_square_within: ms_within,
    })
}

// =============================================================================
// Post-hoc comparison
// =============================================================================

/// A pairwise group comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPair {
    pub first: String,
    pub second: String,
    /// `mean(first) - mean(second)`
    pub mean_difference: f64,
    pub adjusted_p: f64,
    pub significant: bool,
}

/// Localizes which groups differ after a significant omnibus test.
pub trait PostHocTest: Send + Sync {
    /// Short method name for reports.
    fn name(&self) -> &'static str;

    /// Compares every pair of groups, in the order the groups are given.
    fn compare(
        &self,
        groups: &[GroupSample],
        anova: &AnovaResult,
        alpha: f64,
    ) -> Result<Vec<GroupPair>, StatisticsError>;
}

/// Pairwise t-tests on the pooled within-group variance, Bonferroni-adjusted.
///
/// Stands in for Tukey HSD, which needs the studentized range distribution.
/// Both control the family-wise error rate. Bonferroni is the more
/// conservative of the two, so borderline pairs may not be reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct BonferroniPostHoc;

impl PostHocTest for BonferroniPostHoc {
    fn name(&self) -> &'static str {
        "bonferroni"
    }

    fn compare(
        &self,
        groups: &[GroupSample],
        anova: &AnovaResult,
        alpha: f64,
    ) -> Result<Vec<GroupPair>, StatisticsError> {
        let groups: Vec<&GroupSample> = groups.iter().filter(|g| !g.values.is_empty()).collect();
        let k = groups.len();
        let comparisons = (k * k.saturating_sub(1) / 2) as f64;
        let mut pairs = Vec::new();

        for i in 0..k {
            for j in (i + 1)..k {
                let (a, b) = (groups[i], groups[j]);
                let mean_difference = a.mean() - b.mean();
                let se = (anova.mean_square_within
                    * (1.0 / a.values.len() as f64 + 1.0 / b.values.len() as f64))
                    .sqrt();

                let raw_p = if se == 0.0 {
                    if mean_difference == 0.0 {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    two_sided_t_p(mean_difference / se, anova.df_within)?
                };
                let adjusted_p = (raw_p * comparisons).min(1.0);

                pairs.push(GroupPair {
                    first: a.group.clone(),
                    second: b.group.clone(),
                    mean_difference,
                    adjusted_p,
                    significant: adjusted_p < alpha,
                });
            }
        }
        Ok(pairs)
    }
}

/// What happened to the post-hoc step of one factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostHocOutcome {
    /// The omnibus test was not significant.
    NotRequired,
    /// No post-hoc capability was configured.
    Unavailable,
    /// Significantly different pairs (possibly none).
    Completed {
        /// [`PostHocTest::name`] of the test that ran. The shipped
        /// `"bonferroni"` test is more conservative than Tukey HSD, so it can
        /// report fewer pairs than a Tukey-based analysis of the same data.
        method: String,
        pairs: Vec<GroupPair>,
    },
    Failed {
        reason: String,
    },
}

impl PostHocOutcome {
    /// Significantly different pairs; empty unless completed.
    pub fn pairs(&self) -> &[GroupPair] {
        match self {
            PostHocOutcome::Completed { pairs, .. } => pairs,
            _ => &[],
        }
    }
}

// =============================================================================
// Significance table
// =============================================================================

/// Omnibus and post-hoc result for one leaf factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorSignificance {
    pub top_factor: String,
    pub factor: String,
    pub f_statistic: f64,
    pub p_value: f64,
    pub significant: bool,
    pub post_hoc: PostHocOutcome,
}

/// Why a factor's ANOVA did not run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer than two non-empty groups.
    InsufficientGroups { groups: usize },
    /// Not enough observations for within-group variance.
    NoReplication { observations: usize, groups: usize },
    /// F is undefined for these data.
    Undefined { reason: String },
}

/// A factor whose ANOVA was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedTest {
    pub top_factor: String,
    pub factor: String,
    pub reason: SkipReason,
}

/// Per-factor significance results plus the factors that could not be tested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignificanceTable {
    pub results: Vec<FactorSignificance>,
    pub skipped: Vec<SkippedTest>,
}

impl SignificanceTable {
    /// Result for (`top_factor`, `factor`), if tested.
    pub fn result_for(&self, top_factor: &str, factor: &str) -> Option<&FactorSignificance> {
        self.results
            .iter()
            .find(|r| r.top_factor == top_factor && r.factor == factor)
    }
}

/// One respondent's global weight for one leaf factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RespondentGlobalWeight {
    pub respondent_id: String,
    pub group: String,
    pub top_factor: String,
    pub factor: String,
    pub global_weight: f64,
}

/// Runs ANOVA and post-hoc tests across respondent groups.
pub struct SignificanceTester {
    alpha: f64,
    post_hoc: Option<Box<dyn PostHocTest>>,
}

impl SignificanceTester {
    /// Creates a tester; `None` models an unavailable post-hoc capability.
    pub fn new(alpha: f64, post_hoc: Option<Box<dyn PostHocTest>>) -> Self {
        Self { alpha, post_hoc }
    }

    pub fn from_config(config: &StatisticsConfig) -> Self {
        let post_hoc: Option<Box<dyn PostHocTest>> = if config.enable_post_hoc {
            Some(Box::new(BonferroniPostHoc))
        } else {
            None
        };
        Self::new(config.significance_level, post_hoc)
    }

    /// Tests one leaf factor across groups.
    pub fn test_factor(
        &self,
        top_factor: &str,
        factor: &str,
        groups: &[GroupSample],
    ) -> Result<FactorSignificance, SkippedTest> {
        let skipped = |reason| SkippedTest {
            top_factor: top_factor.to_string(),
            factor: factor.to_string(),
            reason,
        };

        let non_empty = groups.iter().filter(|g| !g.values.is_empty()).count();
        if non_empty < 2 {
            return Err(skipped(SkipReason::InsufficientGroups { groups: non_empty }));
        }
        let observations: usize = groups.iter().map(|g| g.values.len()).sum();
        if observations <= non_empty {
            return Err(skipped(SkipReason::NoReplication {
                observations,
                groups: non_empty,
            }));
        }

        let anova = one_way_anova(groups).map_err(|e| {
            skipped(SkipReason::Undefined {
                reason: e.to_string(),
            })
        })?;
        let significant = anova.p_value < self.alpha;

        let post_hoc = match (&self.post_hoc, significant) {
            (_, false) => PostHocOutcome::NotRequired,
            (None, true) => PostHocOutcome::Unavailable,
            (Some(test), true) => match test.compare(groups, &anova, self.alpha) {
                Ok(pairs) => PostHocOutcome::Completed {
                    method: test.name().to_string(),
                    pairs: pairs.into_iter().filter(|p| p.significant).collect(),
                },
                Err(e) => PostHocOutcome::Failed {
                    reason: e.to_string(),
                },
            },
        };

        Ok(FactorSignificance {
            top_factor: top_factor.to_string(),
            factor: factor.to_string(),
            f_statistic: anova.f_statistic,
            p_value: anova.p_value,
            significant,
            post_hoc,
        })
    }

    /// Tests every leaf factor present in `weights`, grouping by group label.
    ///
    /// Factors keep first-seen order; groups are sorted by label.
    pub fn test_all(&self, weights: &[RespondentGlobalWeight]) -> SignificanceTable {
        let mut order: Vec<(&str, &str)> = Vec::new();
        let mut samples: BTreeMap<(&str, &str), BTreeMap<&str, Vec<f64>>> = BTreeMap::new();
        for w in weights {
            let key = (w.top_factor.as_str(), w.factor.as_str());
            if !samples.contains_key(&key) {
                order.push(key);
            }
            samples
                .entry(key)
                .or_default()
                .entry(w.group.as_str())
                .or_default()
                .push(w.global_weight);
        }

        let mut table = SignificanceTable::default();
        for key in order {
            let groups: Vec<GroupSample> = samples
                .remove(&key)
                .unwrap_or_default()
                .into_iter()
                .map(|(group, values)| GroupSample::new(group, values))
                .collect();

            match self.test_factor(key.0, key.1, &groups) {
                Ok(result) => table.results.push(result),
                Err(skipped) => {
                    debug!(
                        top_factor = key.0,
                        factor = key.1,
                        reason = ?skipped.reason,
                        "ANOVA skipped"
                    );
                    table.skipped.push(skipped);
                }
            }
        }
        table
    }
}
