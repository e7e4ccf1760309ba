//! Shape primitives and edge-to-edge distance (spec.md §4.6: "All
//! distances use edge-to-edge, not center-to-center, semantics").
//!
//! Rect is an axis-aligned bounding box — pad rotation is folded into
//! its center via `Pad::absolute_position`, but rect/oval pads are not
//! rotated as oriented boxes. That's a simplification the python engine
//! shares (it only ever compares bounding radii); this module goes a
//! step further for the common pad/via/track combinations and falls
//! back to the same bounding-box treatment for the rest.

use pcb_ir::gir::Point;

#[derive(Debug, Clone)]
pub enum Shape {
    Circle { center: Point, radius: f64 },
    Capsule { from: Point, to: Point, half_width: f64 },
    Rect { center: Point, half_w: f64, half_h: f64 },
    Polygon { outline: Vec<Point> },
}

pub fn dist_point_point(a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    (dx * dx + dy * dy).sqrt()
}

pub fn dist_point_segment(p: Point, a: Point, b: Point) -> f64 {
    let (ax, ay) = a;
    let (bx, by) = b;
    let (px, py) = p;
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    if len_sq < 1e-12 {
        return dist_point_point(p, a);
    }
    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
    let closest = (ax + t * dx, ay + t * dy);
    dist_point_point(p, closest)
}

/// Minimum distance between two segments; 0.0 when they cross.
pub fn dist_segment_segment(a1: Point, a2: Point, b1: Point, b2: Point) -> f64 {
    if segments_intersect(a1, a2, b1, b2) {
        return 0.0;
    }
    [
        dist_point_segment(a1, b1, b2),
        dist_point_segment(a2, b1, b2),
        dist_point_segment(b1, a1, a2),
        dist_point_segment(b2, a1, a2),
    ]
    .into_iter()
    .fold(f64::INFINITY, f64::min)
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.0 <= a.0.max(b.0) && p.0 >= a.0.min(b.0) && p.1 <= a.1.max(b.1) && p.1 >= a.1.min(b.1)
}

fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let o1 = orientation(a1, a2, b1);
    let o2 = orientation(a1, a2, b2);
    let o3 = orientation(b1, b2, a1);
    let o4 = orientation(b1, b2, a2);

    if (o1 > 0.0) != (o2 > 0.0) && (o3 > 0.0) != (o4 > 0.0) {
        return true;
    }
    (o1.abs() < 1e-9 && on_segment(a1, a2, b1))
        || (o2.abs() < 1e-9 && on_segment(a1, a2, b2))
        || (o3.abs() < 1e-9 && on_segment(b1, b2, a1))
        || (o4.abs() < 1e-9 && on_segment(b1, b2, a2))
}

/// Ray-casting point-in-polygon, same algorithm as
/// `pcb_rules::scope`'s `InNamedPolygon` test.
pub fn point_in_polygon(point: Point, outline: &[Point]) -> bool {
    if outline.len() < 3 {
        return false;
    }
    let (px, py) = point;
    let mut inside = false;
    let mut j = outline.len() - 1;
    for i in 0..outline.len() {
        let (xi, yi) = outline[i];
        let (xj, yj) = outline[j];
        let intersects = ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi);
        if intersects {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn point_in_rect(p: Point, center: Point, half_w: f64, half_h: f64) -> bool {
    (p.0 - center.0).abs() <= half_w && (p.1 - center.1).abs() <= half_h
}

fn rect_edges(center: Point, half_w: f64, half_h: f64) -> [(Point, Point); 4] {
    let corners = [
        (center.0 - half_w, center.1 - half_h),
        (center.0 + half_w, center.1 - half_h),
        (center.0 + half_w, center.1 + half_h),
        (center.0 - half_w, center.1 + half_h),
    ];
    [
        (corners[0], corners[1]),
        (corners[1], corners[2]),
        (corners[2], corners[3]),
        (corners[3], corners[0]),
    ]
}

fn polygon_edges(outline: &[Point]) -> Vec<(Point, Point)> {
    if outline.len() < 2 {
        return Vec::new();
    }
    (0..outline.len())
        .map(|i| (outline[i], outline[(i + 1) % outline.len()]))
        .collect()
}

fn boundary_edges(s: &Shape) -> Vec<(Point, Point)> {
    match s {
        Shape::Rect { center, half_w, half_h } => rect_edges(*center, *half_w, *half_h).to_vec(),
        Shape::Polygon { outline } => polygon_edges(outline),
        Shape::Circle { .. } | Shape::Capsule { .. } => Vec::new(),
    }
}

fn contains_point(s: &Shape, p: Point) -> bool {
    match s {
        Shape::Rect { center, half_w, half_h } => point_in_rect(p, *center, *half_w, *half_h),
        Shape::Polygon { outline } => point_in_polygon(p, outline),
        Shape::Circle { center, radius } => dist_point_point(p, *center) <= *radius,
        Shape::Capsule { from, to, half_width } => dist_point_segment(p, *from, *to) <= *half_width,
    }
}

fn any_point(s: &Shape) -> Point {
    match s {
        Shape::Circle { center, .. } => *center,
        Shape::Capsule { from, .. } => *from,
        Shape::Rect { center, .. } => *center,
        Shape::Polygon { outline } => outline.first().copied().unwrap_or((0.0, 0.0)),
    }
}

fn dist_point_shape(p: Point, s: &Shape) -> f64 {
    match s {
        Shape::Circle { center, radius } => dist_point_point(p, *center) - radius,
        Shape::Capsule { from, to, half_width } => dist_point_segment(p, *from, *to) - half_width,
        Shape::Rect { center, half_w, half_h } => {
            let dx = ((p.0 - center.0).abs() - half_w).max(0.0);
            let dy = ((p.1 - center.1).abs() - half_h).max(0.0);
            let outside = (dx * dx + dy * dy).sqrt();
            if outside > 0.0 {
                outside
            } else {
                let penetration = (half_w - (p.0 - center.0).abs()).min(half_h - (p.1 - center.1).abs());
                -penetration
            }
        }
        Shape::Polygon { outline } => {
            let edges = polygon_edges(outline);
            let edge_dist = edges
                .iter()
                .map(|(a, b)| dist_point_segment(p, *a, *b))
                .fold(f64::INFINITY, f64::min);
            if point_in_polygon(p, outline) {
                -edge_dist
            } else {
                edge_dist
            }
        }
    }
}

fn dist_segment_shape(from: Point, to: Point, half_width: f64, s: &Shape) -> f64 {
    match s {
        Shape::Circle { center, radius } => dist_point_segment(*center, from, to) - half_width - radius,
        Shape::Capsule { from: f2, to: t2, half_width: h2 } => {
            dist_segment_segment(from, to, *f2, *t2) - half_width - h2
        }
        Shape::Rect { .. } | Shape::Polygon { .. } => {
            let edges = boundary_edges(s);
            let edge_dist = edges
                .iter()
                .map(|(a, b)| dist_segment_segment(from, to, *a, *b))
                .fold(f64::INFINITY, f64::min);
            let penetrating = contains_point(s, from) || contains_point(s, to);
            let base = if penetrating && edge_dist > 0.0 { -edge_dist } else { edge_dist };
            base - half_width
        }
    }
}

fn dist_shape_shape(a: &Shape, b: &Shape) -> f64 {
    let edges_a = boundary_edges(a);
    let edges_b = boundary_edges(b);
    let mut min_d = f64::INFINITY;
    for ea in &edges_a {
        for eb in &edges_b {
            min_d = min_d.min(dist_segment_segment(ea.0, ea.1, eb.0, eb.1));
        }
    }
    if min_d > 0.0 && (contains_point(a, any_point(b)) || contains_point(b, any_point(a))) {
        return -min_d;
    }
    min_d
}

/// Edge-to-edge clearance between two shapes. Negative means overlap
/// (the magnitude of the penetration), zero or positive means a gap.
pub fn clearance(a: &Shape, b: &Shape) -> f64 {
    match (a, b) {
        (Shape::Circle { center: c1, radius: r1 }, Shape::Circle { center: c2, radius: r2 }) => {
            dist_point_point(*c1, *c2) - r1 - r2
        }
        (Shape::Circle { center, radius }, Shape::Capsule { from, to, half_width })
        | (Shape::Capsule { from, to, half_width }, Shape::Circle { center, radius }) => {
            dist_point_segment(*center, *from, *to) - radius - half_width
        }
        (
            Shape::Capsule { from: f1, to: t1, half_width: h1 },
            Shape::Capsule { from: f2, to: t2, half_width: h2 },
        ) => dist_segment_segment(*f1, *t1, *f2, *t2) - h1 - h2,
        (Shape::Circle { center, radius }, other) | (other, Shape::Circle { center, radius }) => {
            dist_point_shape(*center, other) - radius
        }
        (Shape::Capsule { from, to, half_width }, other) | (other, Shape::Capsule { from, to, half_width }) => {
            dist_segment_shape(*from, *to, *half_width, other)
        }
        (a, b) => dist_shape_shape(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_circle_clearance_is_gap_between_edges() {
        let a = Shape::Circle { center: (0.0, 0.0), radius: 1.0 };
        let b = Shape::Circle { center: (3.0, 0.0), radius: 1.0 };
        assert!((clearance(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn overlapping_circles_report_negative_clearance() {
        let a = Shape::Circle { center: (0.0, 0.0), radius: 2.0 };
        let b = Shape::Circle { center: (1.0, 0.0), radius: 2.0 };
        assert!(clearance(&a, &b) < 0.0);
    }

    #[test]
    fn capsule_to_rect_detects_crossing() {
        let track = Shape::Capsule { from: (-5.0, 0.0), to: (5.0, 0.0), half_width: 0.1 };
        let rect = Shape::Rect { center: (0.0, 0.0), half_w: 1.0, half_h: 1.0 };
        assert!(clearance(&track, &rect) < 0.0);
    }

    #[test]
    fn point_in_polygon_detects_interior() {
        let square = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert!(point_in_polygon((5.0, 5.0), &square));
        assert!(!point_in_polygon((15.0, 5.0), &square));
    }
}
