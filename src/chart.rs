//! Chart data shaping and tooltip formatting
//!
//! Bail-decision aggregates come out of the database as one [`Tally`] per
//! decision type. They are shaped into [`BailDecisionData`] rows in one of two
//! views:
//!
//! | View | `percentage` | `averageCost` | Plotted value |
//! |------|--------------|---------------|---------------|
//! | objective | share of decisions, 0-100 | mean cost | the field |
//! | comparative | ratio to global share | ratio to global cost | `(ratio - 1) * 100` |
//!
//! Charts only hand back the plotted value on hover. [`ValueTransform`] inverts
//! the display transform so the source row can be found again and a tooltip
//! like `25.0% above average | 10 Bail Decisions` built from it. The same
//! transform serves the percentage and the cost series.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Match tolerance between a recovered value and a row field
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Displayed deviations smaller than this read as "Same as average"
pub const SAME_AS_AVERAGE_THRESHOLD: f64 = 0.01;

/// How chart values are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Objective,
    Comparative,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Objective => "objective",
            ViewMode::Comparative => "comparative",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "objective" => Ok(ViewMode::Objective),
            "comparative" => Ok(ViewMode::Comparative),
            other => Err(format!("unknown view mode '{}'", other)),
        }
    }
}

/// One bar per bail-decision type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BailDecisionData {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: i64,
    pub percentage: f64,
    #[serde(rename = "averageCost")]
    pub average_cost: f64,
}

/// Raw per-type aggregate before shaping
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    pub kind: String,
    pub count: i64,
    pub average_cost: Option<f64>,
}

/// Row field a chart series plots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Percentage,
    AverageCost,
}

impl Metric {
    pub fn value(&self, row: &BailDecisionData) -> f64 {
        match self {
            Metric::Percentage => row.percentage,
            Metric::AverageCost => row.average_cost,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Metric::Percentage => "Bail Decisions",
            Metric::AverageCost => "Average Cost",
        }
    }
}

// ============================================================================
// Shaping
// ============================================================================

/// Objective rows: share of all decisions and mean cost per type.
/// Sorted by count, largest first.
pub fn objective_rows(tallies: &[Tally]) -> Vec<BailDecisionData> {
    let total: i64 = tallies.iter().map(|t| t.count).sum();

    let mut rows: Vec<BailDecisionData> = tallies
        .iter()
        .map(|t| BailDecisionData {
            kind: t.kind.clone(),
            count: t.count,
            percentage: if total > 0 { t.count as f64 / total as f64 * 100.0 } else { 0.0 },
            average_cost: t.average_cost.unwrap_or(0.0),
        })
        .collect();

    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.kind.cmp(&b.kind)));
    rows
}

/// Comparative rows: each objective field divided by the same type's field in
/// `baseline`. A missing or zero baseline counts as average (ratio 1.0).
pub fn comparative_rows(rows: &[BailDecisionData], baseline: &[BailDecisionData]) -> Vec<BailDecisionData> {
    rows.iter()
        .map(|row| {
            let base = baseline.iter().find(|b| b.kind == row.kind);
            BailDecisionData {
                kind: row.kind.clone(),
                count: row.count,
                percentage: ratio(row.percentage, base.map(|b| b.percentage)),
                average_cost: ratio(row.average_cost, base.map(|b| b.average_cost)),
            }
        })
        .collect()
}

fn ratio(value: f64, base: Option<f64>) -> f64 {
    match base {
        Some(b) if b.abs() > f64::EPSILON => value / b,
        _ => 1.0,
    }
}

// ============================================================================
// Display transform and inversion
// ============================================================================

/// Maps row values to plotted values and back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueTransform {
    pub view: ViewMode,
    pub tolerance: f64,
}

impl ValueTransform {
    pub fn new(view: ViewMode) -> Self {
        Self { view, tolerance: DEFAULT_TOLERANCE }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Row value to plotted value
    pub fn display(&self, raw: f64) -> f64 {
        match self.view {
            ViewMode::Objective => raw,
            ViewMode::Comparative => (raw - 1.0) * 100.0,
        }
    }

    /// Plotted value back to row value
    pub fn invert(&self, displayed: f64) -> f64 {
        match self.view {
            ViewMode::Objective => displayed,
            ViewMode::Comparative => displayed / 100.0 + 1.0,
        }
    }

    /// First row whose `metric` field lies within tolerance of the value the
    /// plotted point was drawn from
    pub fn find_row<'a>(
        &self,
        rows: &'a [BailDecisionData],
        metric: Metric,
        displayed: f64,
    ) -> Option<&'a BailDecisionData> {
        let original = self.invert(displayed);
        rows.iter().find(|row| (metric.value(row) - original).abs() < self.tolerance)
    }

    /// Tooltip text for a plotted value, or `""` when no row matches
    pub fn format_value(&self, rows: &[BailDecisionData], metric: Metric, displayed: f64) -> String {
        match self.find_row(rows, metric, displayed) {
            Some(row) => self.label(metric, displayed, row.count),
            None => String::new(),
        }
    }

    /// Tooltip text for a row that is already known, with no lookup
    pub fn format_row(&self, row: &BailDecisionData, metric: Metric) -> String {
        self.label(metric, self.display(metric.value(row)), row.count)
    }

    fn label(&self, metric: Metric, displayed: f64, count: i64) -> String {
        let head = match (self.view, metric) {
            (ViewMode::Objective, Metric::Percentage) => format!("{:.1}%", displayed),
            (ViewMode::Objective, Metric::AverageCost) => format!("${:.2}", displayed),
            (ViewMode::Comparative, _) => relative_phrase(displayed),
        };

        format!("{} | {} Bail Decisions", head, count)
    }
}

fn relative_phrase(displayed: f64) -> String {
    if displayed.abs() < SAME_AS_AVERAGE_THRESHOLD {
        "Same as average".to_string()
    } else if displayed > 0.0 {
        format!("{:.1}% above average", displayed)
    } else {
        format!("{:.1}% below average", displayed.abs())
    }
}

/// Tooltip for a plotted value under `view`, using the default tolerance
pub fn format_value(rows: &[BailDecisionData], metric: Metric, view: ViewMode, displayed: f64) -> String {
    ValueTransform::new(view).format_value(rows, metric, displayed)
}

// ============================================================================
// Chart series
// ============================================================================

/// Chart-ready series: one label, plotted value and tooltip per bar
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub metric: Metric,
    pub view: ViewMode,
    pub title: &'static str,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub tooltips: Vec<String>,
}

impl ChartSeries {
    pub fn build(rows: &[BailDecisionData], metric: Metric, view: ViewMode) -> Self {
        let transform = ValueTransform::new(view);
        let values: Vec<f64> = rows.iter().map(|r| transform.display(metric.value(r))).collect();
        let tooltips = rows.iter().map(|r| transform.format_row(r, metric)).collect();

        Self {
            metric,
            view,
            title: metric.title(),
            labels: rows.iter().map(|r| r.kind.clone()).collect(),
            values,
            tooltips,
        }
    }

    /// Largest absolute plotted value, for scaling bars
    pub fn max_magnitude(&self) -> f64 {
        self.values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }
}
