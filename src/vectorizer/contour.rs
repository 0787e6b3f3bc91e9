//! Region labelling and boundary following.
//!
//! Foreground regions are 8-connected; the holes inside them are the
//! 4-connected background pockets that do not reach the grid border. Both are
//! walked along pixel edges ("crack following"), so every vertex is a pixel
//! corner inside `[0, width] x [0, height]` and the border clips the walk
//! naturally.

use image::{ImageBuffer, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use tracing::debug;

use crate::error::TraceError;
use crate::geometry::{PathGeometry, Point};
use crate::mask::{BACKGROUND, BinaryMask, FOREGROUND};

use super::MaskVectorizer;
use super::simplify::simplify_path;

type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Options for tracing one binary mask.
#[derive(Debug, Clone)]
pub struct ContourOptions {
    /// Regions and holes with fewer pixels are dropped.
    pub noise_floor_pixels: usize,
    /// Douglas-Peucker tolerance in pixels; 0 keeps every corner.
    pub simplify_tolerance: f64,
    /// Upper bound on vertices per path (outer ring plus holes) after
    /// simplification.
    pub max_vertices: usize,
}

impl Default for ContourOptions {
    fn default() -> Self {
        Self {
            noise_floor_pixels: 1,
            simplify_tolerance: 1.0,
            max_vertices: 400,
        }
    }
}

/// One surviving foreground region.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedRegion {
    pub geometry: PathGeometry,
    /// Foreground pixels in the region.
    pub pixel_count: usize,
}

/// Everything traced from one mask.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaskTrace {
    pub regions: Vec<TracedRegion>,
    /// Regions dropped by the noise floor.
    pub discarded: usize,
}

/// Traces every 8-connected foreground region above the noise floor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContourTracer;

impl MaskVectorizer for ContourTracer {
    type Options = ContourOptions;
    type Output = MaskTrace;

    fn vectorize(&self, mask: &BinaryMask, options: &Self::Options) -> Result<Self::Output, TraceError> {
        trace_regions(mask, options)
    }
}

/// Size and first pixel (in raster order) of one labelled component.
#[derive(Debug, Clone, Copy)]
struct ComponentStats {
    label: u32,
    pixels: usize,
    start: (u32, u32),
    touches_border: bool,
}

/// Label, filter, walk and simplify every foreground region of `mask`.
///
/// Regions come back in raster order of their top-left pixel.
pub fn trace_regions(mask: &BinaryMask, options: &ContourOptions) -> Result<MaskTrace, TraceError> {
    if mask.foreground_count() == 0 {
        return Ok(MaskTrace::default());
    }

    let regions = connected_components(mask.as_image(), Connectivity::Eight, Luma([BACKGROUND]));
    let region_stats = component_stats(&regions);
    // imageproc cannot label a grid with no pixel of the other value, and a
    // pocket needs foreground on all four sides anyway.
    let (w, h) = mask.dimensions();
    let pockets = (w >= 3 && h >= 3 && mask.foreground_count() < w as usize * h as usize)
        .then(|| connected_components(mask.as_image(), Connectivity::Four, Luma([FOREGROUND])));
    let pocket_stats = pockets.as_ref().map(component_stats).unwrap_or_default();

    let floor = options.noise_floor_pixels.max(1);
    let mut traced = Vec::new();
    let mut discarded = 0usize;

    for region in &region_stats {
        if region.pixels < floor {
            discarded += 1;
            continue;
        }

        let label = region.label;
        let outer = walk_boundary(
            |x, y| label_at(&regions, x, y) == Some(label),
            region.start,
            Connectivity::Eight,
            boundary_step_limit(region.pixels),
        )?;

        let mut holes = Vec::new();
        if let Some(pockets) = &pockets {
            for pocket in pocket_stats
                .iter()
                .filter(|p| !p.touches_border && p.pixels >= floor)
                .filter(|p| hole_owner(&regions, p) == Some(label))
            {
                let pocket_label = pocket.label;
                holes.push(walk_boundary(
                    |x, y| label_at(pockets, x, y) == Some(pocket_label),
                    pocket.start,
                    Connectivity::Four,
                    boundary_step_limit(pocket.pixels),
                )?);
            }
        }

        let geometry = simplify_path(&outer, &holes, options.simplify_tolerance, options.max_vertices)?;
        if geometry.holes().len() < holes.len() {
            debug!(
                dropped = holes.len() - geometry.holes().len(),
                limit = options.max_vertices,
                "filled holes over the vertex limit"
            );
        }
        traced.push(TracedRegion {
            geometry,
            pixel_count: region.pixels,
        });
    }

    debug!(
        regions = region_stats.len(),
        kept = traced.len(),
        discarded,
        floor,
        "traced mask regions"
    );
    Ok(MaskTrace {
        regions: traced,
        discarded,
    })
}

/// Collect per-label statistics, ordered by each component's first pixel.
fn component_stats(labels: &LabelImage) -> Vec<ComponentStats> {
    let (w, h) = labels.dimensions();
    let mut stats: Vec<Option<ComponentStats>> = Vec::new();

    for (x, y, px) in labels.enumerate_pixels() {
        let label = px[0];
        if label == 0 {
            continue;
        }
        let idx = (label - 1) as usize;
        if stats.len() <= idx {
            stats.resize(idx + 1, None);
        }
        let on_border = x == 0 || y == 0 || x + 1 == w || y + 1 == h;
        let entry = stats[idx].get_or_insert(ComponentStats {
            label,
            pixels: 0,
            start: (x, y),
            touches_border: false,
        });
        entry.pixels += 1;
        entry.touches_border |= on_border;
    }

    let mut stats: Vec<ComponentStats> = stats.into_iter().flatten().collect();
    stats.sort_by_key(|s| (s.start.1, s.start.0));
    stats
}

fn label_at(labels: &LabelImage, x: i64, y: i64) -> Option<u32> {
    if x < 0 || y < 0 || x >= labels.width() as i64 || y >= labels.height() as i64 {
        return None;
    }
    Some(labels.get_pixel(x as u32, y as u32)[0])
}

/// The foreground region enclosing an interior pocket: the pixel directly
/// above the pocket's first pixel always belongs to it.
fn hole_owner(regions: &LabelImage, pocket: &ComponentStats) -> Option<u32> {
    let (x, y) = pocket.start;
    label_at(regions, x as i64, y as i64 - 1).filter(|&label| label != 0)
}

/// A boundary never has more edges than four per pixel.
fn boundary_step_limit(pixels: usize) -> usize {
    pixels.saturating_mul(4).saturating_add(4)
}

/// Unit steps E, S, W, N (image y grows downwards, so each entry is a right
/// turn from the previous one).
const DIRECTIONS: [(i64, i64); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
const EAST: usize = 0;

/// Pixels ahead-left and ahead-right of vertex `v` when moving in `dir`.
fn ahead_pixels(v: (i64, i64), dir: usize) -> ((i64, i64), (i64, i64)) {
    let (x, y) = v;
    match dir {
        0 => ((x, y - 1), (x, y)),
        1 => ((x, y), (x - 1, y)),
        2 => ((x - 1, y), (x - 1, y - 1)),
        _ => ((x - 1, y - 1), (x, y - 1)),
    }
}

/// Next direction at vertex `v`, keeping the region on the right-hand side.
/// The two connectivities differ only on a diagonal pinch.
fn next_direction(
    inside: &impl Fn(i64, i64) -> bool,
    v: (i64, i64),
    dir: usize,
    connectivity: Connectivity,
) -> usize {
    let (left, right) = ahead_pixels(v, dir);
    let left_in = inside(left.0, left.1);
    let right_in = inside(right.0, right.1);
    let turn_left = (dir + 3) % 4;
    let turn_right = (dir + 1) % 4;

    match connectivity {
        Connectivity::Eight => {
            if left_in {
                turn_left
            } else if right_in {
                dir
            } else {
                turn_right
            }
        }
        Connectivity::Four => {
            if !right_in {
                turn_right
            } else if left_in {
                turn_left
            } else {
                dir
            }
        }
    }
}

/// Walk the outer boundary of the pixel set described by `inside`, starting
/// at the top-left corner of `start`, which must be the set's first pixel in
/// raster order. Returns the corner vertices, clockwise in image coordinates.
pub fn walk_boundary(
    inside: impl Fn(i64, i64) -> bool,
    start: (u32, u32),
    connectivity: Connectivity,
    max_steps: usize,
) -> Result<Vec<Point>, TraceError> {
    let origin = (start.0 as i64, start.1 as i64);
    let mut corners = vec![corner(origin)];
    // The first pixel's top edge is always on the boundary.
    let mut dir = EAST;
    let mut vertex = (origin.0 + 1, origin.1);
    let mut steps = 1usize;

    loop {
        let next = next_direction(&inside, vertex, dir, connectivity);
        if vertex == origin && next == EAST {
            break;
        }
        if next != dir {
            corners.push(corner(vertex));
        }
        let (dx, dy) = DIRECTIONS[next];
        vertex = (vertex.0 + dx, vertex.1 + dy);
        dir = next;

        steps += 1;
        if steps > max_steps {
            return Err(TraceError::RunawayBoundary { steps });
        }
    }

    Ok(corners)
}

fn corner(v: (i64, i64)) -> Point {
    Point::new(v.0 as f64, v.1 as f64)
}
