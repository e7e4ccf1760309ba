//! Wire shapes for the external-tool protocol (spec.md §6.3). Requests
//! are built as loose JSON objects — like the companion-JSON reader in
//! `pcb-import`, the applicator's own field set has grown ad hoc over
//! several command additions (`param_*` prefixes for rule fields), and a
//! rigid struct-per-action would just be re-flattened back into a map
//! at the call site anyway.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct Request {
    pub action: String,
    fields: Map<String, Value>,
}

impl Request {
    pub fn new(action: &str) -> Self {
        Request { action: action.to_string(), fields: Map::new() }
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Rule parameters are sent as `param_<key>` fields, one per entry
    /// (spec.md §6.3's `create_rule`/`update_rule` shapes).
    pub fn params(mut self, parameters: &Map<String, Value>) -> Self {
        for (key, value) in parameters {
            self.fields.insert(format!("param_{key}"), value.clone());
        }
        self
    }

    pub fn to_json(&self) -> Value {
        let mut obj = self.fields.clone();
        obj.insert("action".to_string(), Value::String(self.action.clone()));
        Value::Object(obj)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

pub fn ping() -> Request {
    Request::new("ping")
}

pub fn add_track(net: &str, x1: f64, y1: f64, x2: f64, y2: f64, width: f64, layer: &str) -> Request {
    Request::new("add_track")
        .field("net", net)
        .field("x1", x1)
        .field("y1", y1)
        .field("x2", x2)
        .field("y2", y2)
        .field("width", width)
        .field("layer", layer)
}

pub fn add_via(x: f64, y: f64, net: &str, hole: f64, diameter: f64) -> Request {
    Request::new("add_via").field("x", x).field("y", y).field("net", net).field("hole", hole).field("diameter", diameter)
}

pub fn move_component(designator: &str, x: f64, y: f64, rotation: Option<f64>) -> Request {
    Request::new("move_component").field("designator", designator).field("x", x).field("y", y).field("rotation", rotation.unwrap_or(0.0))
}

pub fn delete_track_by_endpoints(x1: f64, y1: f64, x2: f64, y2: f64) -> Request {
    Request::new("delete_track").field("x1", x1).field("y1", y1).field("x2", x2).field("y2", y2)
}

pub fn delete_track_by_net_layer(net: &str, layer: &str) -> Request {
    Request::new("delete_track").field("net", net).field("layer", layer)
}

pub fn delete_component(designator: &str) -> Request {
    Request::new("delete_component").field("designator", designator)
}

pub fn create_rule(rule_type: &str, rule_name: &str, parameters: &Map<String, Value>) -> Request {
    Request::new("create_rule").field("rule_type", rule_type).field("rule_name", rule_name).params(parameters)
}

pub fn update_rule(rule_name: &str, parameters: &Map<String, Value>) -> Request {
    Request::new("update_rule").field("rule_name", rule_name).params(parameters)
}

pub fn delete_rule(rule_name: &str) -> Request {
    Request::new("delete_rule").field("rule_name", rule_name)
}

pub fn export_pcb_info() -> Request {
    Request::new("export_pcb_info")
}

pub fn repour_polygons() -> Request {
    Request::new("repour_polygons")
}

pub fn export_copper_primitives() -> Request {
    Request::new("export_copper_primitives")
}

pub fn run_drc() -> Request {
    Request::new("run_drc")
}

pub fn adjust_copper_pour_clearance(x: f64, y: f64, clearance_mm: f64) -> Request {
    Request::new("adjust_copper_pour_clearance").field("x", x).field("y", y).field("clearance_mm", clearance_mm)
}

/// Heavy operations need the long timeout (spec.md §4.9).
pub fn is_heavy(action: &str) -> bool {
    matches!(action, "create_rule" | "update_rule" | "delete_rule" | "export_pcb_info")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_echoes_action_in_json() {
        let req = ping();
        assert_eq!(req.to_json()["action"], "ping");
    }

    #[test]
    fn create_rule_flattens_params_with_prefix() {
        let mut params = Map::new();
        params.insert("clearance_mm".into(), Value::from(0.2));
        let req = create_rule("clearance", "my-rule", &params);
        let json = req.to_json();
        assert_eq!(json["param_clearance_mm"], 0.2);
    }

    #[test]
    fn heavy_actions_match_spec_list() {
        assert!(is_heavy("create_rule"));
        assert!(is_heavy("export_pcb_info"));
        assert!(!is_heavy("add_track"));
    }
}
