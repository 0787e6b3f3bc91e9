use geo::Area;
use geo_types::{Coord, LineString, Polygon};
use serde::Serialize;

/// A vertex in working-grid coordinates. Pixel corners sit on integers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Point> for Coord<f64> {
    fn from(p: Point) -> Self {
        Coord { x: p.x, y: p.y }
    }
}

impl From<Coord<f64>> for Point {
    fn from(c: Coord<f64>) -> Self {
        Point { x: c.x, y: c.y }
    }
}

/// Closed outline of one traced region: an outer ring plus optional hole
/// rings. Rings are implicitly closed; the last vertex is never a copy of
/// the first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathGeometry {
    outer: Vec<Point>,
    holes: Vec<Vec<Point>>,
}

impl PathGeometry {
    pub fn new(outer: Vec<Point>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(outer: Vec<Point>, holes: Vec<Vec<Point>>) -> Self {
        Self { outer, holes }
    }

    /// Axis-aligned rectangle covering `[0, width] x [0, height]`.
    pub fn full_rect(width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        Self::new(vec![
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ])
    }

    pub fn outer(&self) -> &[Point] {
        &self.outer
    }

    pub fn holes(&self) -> &[Vec<Point>] {
        &self.holes
    }

    /// Outer ring first, then each hole.
    pub fn rings(&self) -> impl Iterator<Item = &[Point]> {
        std::iter::once(self.outer.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    pub fn vertex_count(&self) -> usize {
        self.rings().map(<[Point]>::len).sum()
    }

    /// Every ring has at least three vertices.
    pub fn is_valid(&self) -> bool {
        self.rings().all(|ring| ring.len() >= 3)
    }

    /// True when every vertex lies in `[0, width] x [0, height]`.
    pub fn within_bounds(&self, width: u32, height: u32) -> bool {
        let (w, h) = (width as f64, height as f64);
        self.rings()
            .flatten()
            .all(|p| (0.0..=w).contains(&p.x) && (0.0..=h).contains(&p.y))
    }

    /// Filled area: outer ring minus holes.
    pub fn area(&self) -> f64 {
        self.to_polygon().unsigned_area()
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            ring_to_line_string(&self.outer),
            self.holes.iter().map(|h| ring_to_line_string(h)).collect(),
        )
    }
}

/// Open-ring vertices to a closed geo line string.
pub fn ring_to_line_string(ring: &[Point]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = ring.iter().copied().map(Coord::from).collect();
    if let Some(&first) = coords.first() {
        coords.push(first);
    }
    LineString::new(coords)
}

/// Closed geo line string back to open-ring vertices.
pub fn line_string_to_ring(line: &LineString<f64>) -> Vec<Point> {
    let mut ring: Vec<Point> = line.coords().copied().map(Point::from).collect();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}
