//! Runtime configuration (spec.md's ambient stack §1.3), mirroring
//! `seq-compiler::lint::LintConfig`'s pattern: a `serde`-deserializable
//! struct with a `from_toml`/`Default` pair rather than a bespoke parser.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory the artifact store writes per-kind subdirectories
    /// under (spec.md §6.2).
    pub store_dir: PathBuf,
    /// Fallback polygon clearance used when a pour-aware clearance check
    /// has to fall back to outline-only geometry (open question, see
    /// DESIGN.md — not a rule-kind default, just a reduced-fidelity
    /// floor).
    pub default_pour_clearance_mm: f64,
    /// spec.md §4.6: width checking is disabled for a run once more than
    /// this fraction of tracks fall outside the applicable rule's band.
    pub width_skip_threshold: f64,
    /// Overrides layered onto `pcb_rules::default_ruleset()` when no
    /// binary rule stream or companion `design_rules.json` yields rules
    /// (spec.md §4.3 "Defaults").
    pub default_rules: DefaultRuleOverrides,
    pub client: ClientConfig,
}

/// Per-field overrides of the five documented default rule values.
/// `None` leaves `pcb_rules::default_ruleset()`'s own constant in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultRuleOverrides {
    pub clearance_mm: Option<f64>,
    pub min_width_mm: Option<f64>,
    pub min_hole_mm: Option<f64>,
    pub hole_to_hole_mm: Option<f64>,
    pub mask_sliver_mm: Option<f64>,
}

impl DefaultRuleOverrides {
    /// Applies any set overrides to a freshly built default rule set.
    pub fn apply(&self, cir: &mut pcb_ir::cir::ConstraintIr) {
        use pcb_ir::cir::RuleKind;

        for rule in &mut cir.rules {
            match &mut rule.kind {
                RuleKind::Clearance(params) => {
                    if let Some(mm) = self.clearance_mm {
                        params.min_clearance_mm = mm;
                    }
                }
                RuleKind::Width(params) => {
                    if let Some(mm) = self.min_width_mm {
                        params.min_width_mm = mm;
                    }
                }
                RuleKind::Via(params) => {
                    if let Some(mm) = self.min_hole_mm {
                        params.min_drill_mm = mm;
                    }
                }
                RuleKind::HoleToHole(params) => {
                    if let Some(mm) = self.hole_to_hole_mm {
                        params.min_gap_mm = mm;
                    }
                }
                RuleKind::SolderMaskSliver(params) => {
                    if let Some(mm) = self.mask_sliver_mm {
                        params.min_gap_mm = mm;
                    }
                }
                _ => {}
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub command_file: PathBuf,
    pub result_file: PathBuf,
    pub routine_timeout_secs: u64,
    pub heavy_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store_dir: PathBuf::from("./pcb-artifacts"),
            default_pour_clearance_mm: 0.4,
            width_skip_threshold: 0.10,
            default_rules: DefaultRuleOverrides::default(),
            client: ClientConfig::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            command_file: PathBuf::from("./altium_command.json"),
            result_file: PathBuf::from("./PCB_Project/altium_result.json"),
            routine_timeout_secs: 10,
            heavy_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn routine_timeout(&self) -> Duration {
        Duration::from_secs(self.routine_timeout_secs)
    }

    pub fn heavy_timeout(&self) -> Duration {
        Duration::from_secs(self.heavy_timeout_secs)
    }
}

impl Config {
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("failed to parse config: {e}"))
    }

    pub fn load(path: &std::path::Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        Self::from_toml(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.default_pour_clearance_mm, 0.4);
        assert_eq!(config.width_skip_threshold, 0.10);
    }

    #[test]
    fn partial_toml_overrides_fall_back_to_defaults() {
        let config = Config::from_toml("store_dir = \"/tmp/pcb\"\n").unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/tmp/pcb"));
        assert_eq!(config.width_skip_threshold, 0.10);
    }

    #[test]
    fn rule_overrides_only_touch_set_fields() {
        use pcb_ir::cir::{ClearanceParams, ConstraintIr, Rule, RuleKind, RuleScope, WidthParams};

        let mut cir = ConstraintIr {
            rules: vec![
                Rule {
                    id: "default-clearance".into(),
                    scope: RuleScope::default(),
                    kind: RuleKind::Clearance(ClearanceParams { min_clearance_mm: 0.2, object_clearances: Vec::new() }),
                    enabled: true,
                    priority: 0,
                },
                Rule {
                    id: "default-width".into(),
                    scope: RuleScope::default(),
                    kind: RuleKind::Width(WidthParams { min_width_mm: 0.254, preferred_width_mm: None, max_width_mm: None }),
                    enabled: true,
                    priority: 0,
                },
            ],
            netclasses: Vec::new(),
        };

        let overrides = DefaultRuleOverrides { clearance_mm: Some(0.3), ..Default::default() };
        overrides.apply(&mut cir);

        let RuleKind::Clearance(params) = &cir.rules[0].kind else { unreachable!() };
        assert_eq!(params.min_clearance_mm, 0.3);
        let RuleKind::Width(params) = &cir.rules[1].kind else { unreachable!() };
        assert_eq!(params.min_width_mm, 0.254);
    }
}
