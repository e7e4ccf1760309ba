//! Message-text fallbacks for violation kinds that don't (yet) carry
//! structured endpoints, grounded on `auto_fix_engine.py`'s
//! `_parse_track_coords`/`_parse_unrouted_endpoints` regexes. `pcb-drc`
//! attaches real `location.points` wherever it can, so these only fire
//! when a violation came from a hybrid-mode native-tool report whose
//! message text is all that's available.

use pcb_ir::gir::Point;
use regex::Regex;

pub fn parse_track_coords(message: &str) -> Option<(Point, Point)> {
    let re = Regex::new(r"Track\s*\(([0-9.]+)mm?,([0-9.]+)mm?\)\s*\(([0-9.]+)mm?,([0-9.]+)mm?\)").ok()?;
    let caps = re.captures(message)?;
    Some((
        (caps[1].parse().ok()?, caps[2].parse().ok()?),
        (caps[3].parse().ok()?, caps[4].parse().ok()?),
    ))
}

pub fn parse_unrouted_endpoints(message: &str) -> Option<(Point, Point)> {
    let between = Regex::new(r"Between\s*\(([0-9.]+)mm,([0-9.]+)mm\)\s*And\s*\(([0-9.]+)mm,([0-9.]+)mm\)").ok()?;
    if let Some(caps) = between.captures(message) {
        return Some((
            (caps[1].parse().ok()?, caps[2].parse().ok()?),
            (caps[3].parse().ok()?, caps[4].parse().ok()?),
        ));
    }
    let pad_via = Regex::new(r"Between\s+Pad\s+.+?\(([0-9.]+)mm,([0-9.]+)mm\).+?\bAnd\s+Via\s*\(([0-9.]+)mm,([0-9.]+)mm\)").ok()?;
    let caps = pad_via.captures(message)?;
    Some((
        (caps[1].parse().ok()?, caps[2].parse().ok()?),
        (caps[3].parse().ok()?, caps[4].parse().ok()?),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_track_coords_from_antenna_message() {
        let msg = "dangling stub: Track (10.000mm,20.000mm)(15.000mm,20.000mm)";
        let (from, to) = parse_track_coords(msg).unwrap();
        assert_eq!(from, (10.0, 20.0));
        assert_eq!(to, (15.0, 20.0));
    }

    #[test]
    fn parses_between_and_form() {
        let msg = "UnRoutedNet: Between (1.0mm,2.0mm) And (3.0mm,4.0mm)";
        let (from, to) = parse_unrouted_endpoints(msg).unwrap();
        assert_eq!(from, (1.0, 2.0));
        assert_eq!(to, (3.0, 4.0));
    }
}
