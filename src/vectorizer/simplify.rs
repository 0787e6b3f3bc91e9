use geo::{Area, Polygon, Simplify};

use crate::error::TraceError;
use crate::geometry::{PathGeometry, Point, line_string_to_ring, ring_to_line_string};

/// How many times the tolerance is doubled when a ring is over the vertex limit.
const MAX_ESCALATIONS: usize = 8;

/// Douglas-Peucker simplification of a closed ring.
///
/// The result always keeps at least three of the input vertices. When the
/// ring has more than `max_vertices` vertices at `tolerance`, the tolerance is
/// doubled until it fits or the escalation budget runs out.
pub fn simplify_ring(
    ring: &[Point],
    tolerance: f64,
    max_vertices: usize,
) -> Result<Vec<Point>, TraceError> {
    let line = ring_to_line_string(ring);
    let mut epsilon = tolerance;
    let mut kept = ring.len();

    for _ in 0..=MAX_ESCALATIONS {
        let simplified = if epsilon > 0.0 {
            line_string_to_ring(&line.simplify(&epsilon))
        } else {
            ring.to_vec()
        };
        let simplified = if simplified.len() >= 3 {
            simplified
        } else {
            minimal_triangle(ring)
        };

        kept = simplified.len();
        if kept <= max_vertices {
            return Ok(simplified);
        }
        epsilon = if epsilon > 0.0 { epsilon * 2.0 } else { 0.5 };
    }

    Err(TraceError::VertexBudget {
        vertices: kept,
        limit: max_vertices,
    })
}

/// Simplify a region's outer ring and its holes so the whole path has at most
/// `max_vertices` vertices.
///
/// The outer ring must fit on its own. Holes are then kept largest first while
/// they fit in what is left; the rest are dropped, which fills them in. Kept
/// holes stay in their input order.
pub fn simplify_path(
    outer: &[Point],
    holes: &[Vec<Point>],
    tolerance: f64,
    max_vertices: usize,
) -> Result<PathGeometry, TraceError> {
    let outer = simplify_ring(outer, tolerance, max_vertices)?;
    let mut remaining = max_vertices.saturating_sub(outer.len());

    let mut by_area: Vec<(usize, f64)> = holes.iter().map(|h| ring_area(h)).enumerate().collect();
    by_area.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut kept: Vec<(usize, Vec<Point>)> = Vec::new();
    for (index, _) in by_area {
        if remaining < 3 {
            break;
        }
        // a hole over the remaining budget is dropped rather than failing the region
        if let Ok(ring) = simplify_ring(&holes[index], tolerance, remaining) {
            remaining -= ring.len();
            kept.push((index, ring));
        }
    }
    kept.sort_by_key(|(index, _)| *index);

    Ok(PathGeometry::with_holes(
        outer,
        kept.into_iter().map(|(_, ring)| ring).collect(),
    ))
}

fn ring_area(ring: &[Point]) -> f64 {
    Polygon::new(ring_to_line_string(ring), Vec::new()).unsigned_area()
}

/// Three ring vertices spanning the widest triangle reachable greedily: the
/// first vertex, the one farthest from it, and the one farthest from that
/// chord. Ring order is preserved.
pub fn minimal_triangle(ring: &[Point]) -> Vec<Point> {
    if ring.len() <= 3 {
        return ring.to_vec();
    }

    let anchor = ring[0];
    let far = index_of_max(ring, |p| distance(p, anchor));
    let apex = index_of_max(ring, |p| chord_distance(p, anchor, ring[far]));

    let mut picked = [0, far, apex];
    picked.sort_unstable();
    picked.iter().map(|&i| ring[i]).collect()
}

fn index_of_max(ring: &[Point], score: impl Fn(Point) -> f64) -> usize {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, &p) in ring.iter().enumerate() {
        let s = score(p);
        if s > best_score {
            best = i;
            best_score = s;
        }
    }
    best
}

fn distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

fn chord_distance(p: Point, start: Point, end: Point) -> f64 {
    let (dx, dy) = (end.x - start.x, end.y - start.y);
    let len = dx.hypot(dy);
    if len < 1e-12 {
        return distance(p, start);
    }
    ((p.x - start.x) * dy - (p.y - start.y) * dx).abs() / len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ]
    }

    /// A staircase edge: many corners, all within half a pixel of a straight diagonal.
    fn staircase(steps: usize) -> Vec<Point> {
        let mut ring = Vec::new();
        for i in 0..steps {
            let v = i as f64;
            ring.push(Point::new(v, v));
            ring.push(Point::new(v + 1.0, v));
        }
        let n = steps as f64;
        ring.push(Point::new(n, n));
        ring.push(Point::new(0.0, n));
        ring
    }

    mod simplify_ring {
        use super::*;

        #[test]
        fn zero_tolerance_keeps_ring() {
            let ring = staircase(10);
            assert_eq!(simplify_ring(&ring, 0.0, 1000).unwrap(), ring);
        }

        #[test]
        fn square_survives_default_tolerance() {
            let ring = square(20.0);
            assert_eq!(simplify_ring(&ring, 1.0, 400).unwrap(), ring);
        }

        #[test]
        fn staircase_collapses_to_triangle() {
            let simplified = simplify_ring(&staircase(40), 1.0, 400).unwrap();
            assert_eq!(simplified.len(), 3);
        }

        #[test]
        fn escalates_until_under_limit() {
            // 12-gon on a circle of radius 50
            let ring: Vec<Point> = (0..12)
                .map(|i| {
                    let a = i as f64 * std::f64::consts::TAU / 12.0;
                    Point::new(50.0 + 50.0 * a.cos(), 50.0 + 50.0 * a.sin())
                })
                .collect();
            let simplified = simplify_ring(&ring, 0.1, 6).unwrap();
            assert!(simplified.len() <= 6);
            assert!(simplified.len() >= 3);
        }

        #[test]
        fn impossible_limit_is_a_trace_error() {
            let err = simplify_ring(&square(10.0), 1.0, 2).unwrap_err();
            assert_eq!(err, TraceError::VertexBudget { vertices: 3, limit: 2 });
        }

        #[test]
        fn output_is_subset_of_input() {
            let ring = staircase(25);
            for v in simplify_ring(&ring, 2.0, 400).unwrap() {
                assert!(ring.contains(&v));
            }
        }
    }

    mod simplify_path {
        use super::*;

        fn offset_square(x: f64, y: f64, side: f64) -> Vec<Point> {
            square(side).into_iter().map(|p| Point::new(p.x + x, p.y + y)).collect()
        }

        #[test]
        fn holes_within_budget_are_kept() {
            let holes = vec![offset_square(2.0, 2.0, 2.0), offset_square(6.0, 2.0, 2.0)];
            let path = simplify_path(&square(10.0), &holes, 0.0, 12).unwrap();
            assert_eq!(path.holes(), holes.as_slice());
            assert_eq!(path.vertex_count(), 12);
        }

        #[test]
        fn smallest_holes_are_dropped_first() {
            let small = offset_square(1.0, 1.0, 1.0);
            let large = offset_square(4.0, 4.0, 4.0);
            let medium = offset_square(1.0, 6.0, 2.0);
            let holes = vec![small, large.clone(), medium.clone()];
            let path = simplify_path(&square(20.0), &holes, 0.0, 12).unwrap();
            assert_eq!(path.holes(), &[large, medium][..]);
            assert!(path.vertex_count() <= 12);
        }

        #[test]
        fn outer_ring_over_budget_is_an_error() {
            let err = simplify_path(&square(10.0), &[], 1.0, 2).unwrap_err();
            assert!(matches!(err, TraceError::VertexBudget { limit: 2, .. }));
        }
    }

    mod minimal_triangle {
        use super::*;

        #[test]
        fn picks_non_collinear_vertices_in_ring_order() {
            let tri = minimal_triangle(&square(1.0));
            assert_eq!(
                tri,
                vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)]
            );
        }

        #[test]
        fn short_rings_pass_through() {
            let ring = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
            assert_eq!(minimal_triangle(&ring), ring);
        }
    }
}
