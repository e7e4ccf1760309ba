//! DRC output: a single rule violation, as produced by `pcb-drc` and
//! consumed by `pcb-autofix`.

use serde::{Deserialize, Serialize};

use crate::gir::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A point or polyline location in mm, with an optional layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub points: Vec<Point>,
    pub layer: Option<String>,
}

impl Location {
    pub fn point(p: Point, layer: Option<String>) -> Self {
        Location { points: vec![p], layer }
    }

    /// Lexicographic comparison key used for deterministic ordering
    /// (spec.md §4.6: "then location lexicographic").
    pub fn sort_key(&self) -> Vec<(i64, i64)> {
        self.points
            .iter()
            .map(|(x, y)| ((x * 1e4).round() as i64, (y * 1e4).round() as i64))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub rule_kind: String,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
    pub actual_value: Option<f64>,
    pub required_value: Option<f64>,
    pub objects: Vec<String>,
    pub net: Option<String>,
    pub component: Option<String>,
    /// Priority of the rule that produced this violation, copied forward
    /// so the report can be sorted without re-joining against the ruleset.
    pub rule_priority: i32,
}
