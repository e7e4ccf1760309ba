//! Net connectivity (spec.md §4.6 unrouted-net / net-antennae).
//!
//! The python engine never actually builds a connectivity graph — it
//! approximates "routed" with a `nets_with_tracks` set and leaves
//! antenna detection as an unimplemented placeholder. spec.md §4.6
//! describes the real graph (pads/vias/track endpoints/polygon pours,
//! union-found into components) so that's what this module builds.

use std::collections::HashMap;

use pcb_ir::gir::{GeometryIr, Point};

const COINCIDENT_EPSILON_MM: f64 = 1e-3;

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }

    fn same_set(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }
}

fn close(a: Point, b: Point) -> bool {
    let (dx, dy) = (a.0 - b.0, a.1 - b.1);
    (dx * dx + dy * dy).sqrt() <= COINCIDENT_EPSILON_MM
}

/// One net's physical connection points: pads, vias, and track
/// endpoints, unioned wherever two points coincide or a track/pour
/// joins them.
pub struct NetGraph {
    points: Vec<Point>,
    pad_point_idx: Vec<usize>,
    uf: UnionFind,
}

impl NetGraph {
    pub fn build(gir: &GeometryIr, net_id: &str) -> NetGraph {
        let mut points: Vec<Point> = Vec::new();
        let mut pad_point_idx = Vec::new();

        for pad in gir.pads.iter().filter(|p| p.net.as_deref() == Some(net_id)) {
            let fp = gir.footprint(&pad.footprint);
            let pos = fp.map(|fp| pad.absolute_position(fp)).unwrap_or(pad.relative_position);
            pad_point_idx.push(points.len());
            points.push(pos);
        }

        for via in gir.vias.iter().filter(|v| v.net == net_id) {
            points.push(via.position);
        }

        let track_span: Vec<(usize, usize)> = gir
            .tracks
            .iter()
            .filter(|t| t.net == net_id)
            .map(|t| {
                let from_idx = push_or_reuse(&mut points, t.from);
                let to_idx = push_or_reuse(&mut points, t.to);
                (from_idx, to_idx)
            })
            .collect();

        let mut uf = UnionFind::new(points.len());

        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                if close(points[i], points[j]) {
                    uf.union(i, j);
                }
            }
        }
        for (a, b) in track_span {
            uf.union(a, b);
        }

        // Polygon pours bridge every pad/via they contain, on a
        // matching layer, into one cluster.
        for polygon in gir.polygons.iter().filter(|p| p.net.as_deref() == Some(net_id)) {
            let contained: Vec<usize> = points
                .iter()
                .enumerate()
                .filter(|(_, p)| crate::geometry::point_in_polygon(**p, &polygon.outline))
                .map(|(i, _)| i)
                .collect();
            for window in contained.windows(2) {
                uf.union(window[0], window[1]);
            }
        }

        NetGraph { points, pad_point_idx, uf }
    }

    /// True when every pad on the net is reachable from every other
    /// pad through tracks, vias, and pours.
    pub fn fully_connected(&mut self) -> bool {
        if self.pad_point_idx.len() < 2 {
            return true;
        }
        let first = self.pad_point_idx[0];
        self.pad_point_idx.iter().all(|&p| self.uf.same_set(first, p))
    }

    /// One representative point per disconnected pad cluster, paired up
    /// into a spanning chain — the segments auto-fix needs to add to
    /// make the net whole. Used in place of a ratsnest companion, which
    /// this importer never produces; the union-find already knows
    /// exactly which pads are unreachable from which.
    pub fn missing_connections(&mut self) -> Vec<(Point, Point)> {
        let mut representative: Vec<(usize, Point)> = Vec::new();
        for &idx in &self.pad_point_idx {
            let root = self.uf.find(idx);
            if !representative.iter().any(|(r, _)| *r == root) {
                representative.push((root, self.points[idx]));
            }
        }
        representative.windows(2).map(|w| (w[0].1, w[1].1)).collect()
    }

    /// Track endpoints that are the sole segment touching their
    /// location and aren't at a pad/via/pour — candidate antennae.
    pub fn dangling_track_endpoints(&self, gir: &GeometryIr, net_id: &str, tolerance_mm: f64) -> Vec<Point> {
        let tracks: Vec<_> = gir.tracks.iter().filter(|t| t.net == net_id).collect();
        let mut touch_count: HashMap<(i64, i64), usize> = HashMap::new();
        let key = |p: Point| ((p.0 * 1e4).round() as i64, (p.1 * 1e4).round() as i64);
        for t in &tracks {
            *touch_count.entry(key(t.from)).or_insert(0) += 1;
            *touch_count.entry(key(t.to)).or_insert(0) += 1;
        }

        let anchor_points: Vec<Point> = gir
            .pads
            .iter()
            .filter(|p| p.net.as_deref() == Some(net_id))
            .filter_map(|p| gir.footprint(&p.footprint).map(|fp| p.absolute_position(fp)))
            .chain(gir.vias.iter().filter(|v| v.net == net_id).map(|v| v.position))
            .collect();
        let pours: Vec<&Vec<Point>> = gir
            .polygons
            .iter()
            .filter(|p| p.net.as_deref() == Some(net_id))
            .map(|p| &p.outline)
            .collect();

        let near_anchor = |p: Point| -> bool {
            anchor_points.iter().any(|a| crate::geometry::dist_point_point(*a, p) <= tolerance_mm)
                || pours.iter().any(|outline| crate::geometry::point_in_polygon(p, outline))
        };

        let mut dangling = Vec::new();
        for t in &tracks {
            for endpoint in [t.from, t.to] {
                if touch_count.get(&key(endpoint)).copied().unwrap_or(0) == 1 && !near_anchor(endpoint) {
                    dangling.push(endpoint);
                }
            }
        }
        dangling
    }
}

fn push_or_reuse(points: &mut Vec<Point>, p: Point) -> usize {
    for (i, existing) in points.iter().enumerate() {
        if close(*existing, p) {
            return i;
        }
    }
    points.push(p);
    points.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcb_ir::gir::*;

    fn gir_with(tracks: Vec<Track>, pads: Vec<Pad>) -> GeometryIr {
        GeometryIr {
            board: None,
            nets: vec![Net { id: "net-a".into(), name: "A".into(), netclass: None }],
            footprints: vec![Footprint {
                id: "fp-u1".into(),
                reference: "U1".into(),
                position: (0.0, 0.0),
                rotation_deg: 0.0,
                layer: "L1".into(),
                library_name: None,
                part_number: None,
                pads: pads.iter().map(|p| p.id.clone()).collect(),
            }],
            pads,
            tracks,
            vias: vec![],
            polygons: vec![],
        }
    }

    fn pad(id: &str, pos: Point) -> Pad {
        Pad {
            id: id.into(),
            footprint: "fp-u1".into(),
            net: Some("net-a".into()),
            shape: PadShape::Round,
            size: (0.5, 0.5),
            drill_mm: None,
            layers: vec!["L1".into()],
            relative_position: pos,
        }
    }

    #[test]
    fn two_pads_joined_by_a_track_are_fully_connected() {
        let tracks = vec![Track {
            id: "t1".into(),
            net: "net-a".into(),
            layer: "L1".into(),
            from: (0.0, 0.0),
            to: (5.0, 0.0),
            width_mm: 0.2,
        }];
        let gir = gir_with(tracks, vec![pad("p1", (0.0, 0.0)), pad("p2", (5.0, 0.0))]);
        let mut graph = NetGraph::build(&gir, "net-a");
        assert!(graph.fully_connected());
    }

    #[test]
    fn two_unconnected_pads_are_not_fully_connected() {
        let gir = gir_with(vec![], vec![pad("p1", (0.0, 0.0)), pad("p2", (5.0, 0.0))]);
        let mut graph = NetGraph::build(&gir, "net-a");
        assert!(!graph.fully_connected());
    }

    #[test]
    fn stub_segment_off_a_junction_is_a_dangling_endpoint() {
        let tracks = vec![
            Track {
                id: "t1".into(),
                net: "net-a".into(),
                layer: "L1".into(),
                from: (0.0, 0.0),
                to: (5.0, 0.0),
                width_mm: 0.2,
            },
            Track {
                id: "t2".into(),
                net: "net-a".into(),
                layer: "L1".into(),
                from: (5.0, 0.0),
                to: (5.0, 3.0),
                width_mm: 0.2,
            },
        ];
        let gir = gir_with(tracks, vec![pad("p1", (0.0, 0.0))]);
        let dangling = NetGraph::build(&gir, "net-a").dangling_track_endpoints(&gir, "net-a", 0.05);
        assert_eq!(dangling, vec![(5.0, 3.0)]);
    }
}
