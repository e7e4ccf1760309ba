//! Direct-then-L-detour routing (spec.md §4.7), grounded on
//! `auto_fix_engine.py`'s `_route_connection_with_fallback`: try one
//! straight segment, and if that's unsafe, six pre-enumerated pivot
//! points for an L-shaped two-leg route.

use pcb_ir::gir::{GeometryIr, Point};

/// The same six candidate pivots the original tries, in the same order
/// (two axis-aligned corners of the bounding box, then the two
/// midpoints of each side).
pub fn l_shape_pivots(from: Point, to: Point) -> [Point; 6] {
    let (x1, y1) = from;
    let (x2, y2) = to;
    [
        (x1, y2),
        (x2, y1),
        ((x1 + x2) / 2.0, y1),
        ((x1 + x2) / 2.0, y2),
        (x1, (y1 + y2) / 2.0),
        (x2, (y1 + y2) / 2.0),
    ]
}

const DEGENERATE_EPSILON: f64 = 1e-6;

fn close(a: Point, b: Point) -> bool {
    (a.0 - b.0).abs() < DEGENERATE_EPSILON && (a.1 - b.1).abs() < DEGENERATE_EPSILON
}

/// A pivot equal to either endpoint collapses the detour back into the
/// direct segment already tried, so it's skipped.
pub fn is_degenerate_pivot(pivot: Point, from: Point, to: Point) -> bool {
    close(pivot, from) || close(pivot, to)
}

/// spec.md §4.7 safety guard: a segment's capsule is checked against
/// every foreign-net pad at radius `rule_min + segment_half_width +
/// pad_half_size`. Reuses `pcb-drc`'s point-to-segment distance rather
/// than re-deriving a point-to-line helper.
pub fn is_direct_route_safe(net_id: &str, from: Point, to: Point, width_mm: f64, gir: &GeometryIr, min_clearance_mm: f64) -> bool {
    let half_w = (width_mm / 2.0).max(0.05);
    let guard = min_clearance_mm.max(0.05);

    for pad in &gir.pads {
        let Some(pad_net) = pad.net.as_deref() else { continue };
        if pad_net.is_empty() || pad_net == net_id {
            continue;
        }
        let Some(fp) = gir.footprint(&pad.footprint) else { continue };
        let position = pad.absolute_position(fp);
        let (half_x, half_y) = pad.half_size();
        let pad_radius = half_x.max(half_y);

        let distance = pcb_drc::geometry::dist_point_segment(position, from, to);
        if distance <= pad_radius + half_w + guard {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcb_ir::gir::*;

    fn gir_with_pad(pad_net: &str, pad_pos: Point) -> GeometryIr {
        GeometryIr {
            footprints: vec![Footprint {
                id: "fp-1".into(),
                reference: "R1".into(),
                position: (0.0, 0.0),
                rotation_deg: 0.0,
                layer: "L1".into(),
                library_name: None,
                part_number: None,
                pads: vec!["p1".into()],
            }],
            pads: vec![Pad {
                id: "p1".into(),
                footprint: "fp-1".into(),
                net: Some(pad_net.into()),
                shape: PadShape::Round,
                size: (0.5, 0.5),
                drill_mm: None,
                layers: vec!["L1".into()],
                relative_position: pad_pos,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn direct_route_unsafe_when_it_passes_through_foreign_pad() {
        let gir = gir_with_pad("net-b", (5.0, 0.0));
        assert!(!is_direct_route_safe("net-a", (0.0, 0.0), (10.0, 0.0), 0.25, &gir, 0.2));
    }

    #[test]
    fn direct_route_safe_when_far_from_foreign_pads() {
        let gir = gir_with_pad("net-b", (5.0, 10.0));
        assert!(is_direct_route_safe("net-a", (0.0, 0.0), (10.0, 0.0), 0.25, &gir, 0.2));
    }

    #[test]
    fn same_net_pad_never_blocks_a_route() {
        let gir = gir_with_pad("net-a", (5.0, 0.0));
        assert!(is_direct_route_safe("net-a", (0.0, 0.0), (10.0, 0.0), 0.25, &gir, 0.2));
    }

    #[test]
    fn pivot_equal_to_an_endpoint_is_degenerate() {
        assert!(is_degenerate_pivot((0.0, 0.0), (0.0, 0.0), (5.0, 5.0)));
        assert!(!is_degenerate_pivot((0.0, 5.0), (0.0, 0.0), (5.0, 5.0)));
    }
}
