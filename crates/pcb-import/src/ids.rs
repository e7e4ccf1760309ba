//! ID-stability helpers (spec.md §4.3): net IDs from lowercased,
//! space-replaced names; footprint IDs from lowercased designators;
//! layers get `L<index>` when no ID was recovered.

pub fn net_id(name: &str) -> String {
    format!("net-{}", name.trim().to_lowercase().replace(' ', "-"))
}

pub fn footprint_id(designator: &str) -> String {
    format!("fp-{}", designator.trim().to_lowercase())
}

pub fn layer_id_at(index: usize) -> String {
    format!("L{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_id_lowercases_and_dashes_spaces() {
        assert_eq!(net_id("VCC 3.3V"), "net-vcc-3.3v");
    }

    #[test]
    fn footprint_id_lowercases_designator() {
        assert_eq!(footprint_id("R1"), "fp-r1");
    }
}
