#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::{SweepOrder, VectorizeOptions};
use crate::document::{Component, ShapeKind, VectorDocument};
use crate::error::TraceError;
use crate::geometry::PathGeometry;
use crate::loader::LuminanceGrid;
use crate::mask::threshold_mask;
use crate::vectorizer::MaskVectorizer;
use crate::vectorizer::contour::{ContourOptions, ContourTracer, MaskTrace};
use crate::{VectorizeError, VectorizeResult};

/// Threshold recorded on the fallback component: it covers everything, as a
/// mask at 255 would on a non-white image.
pub const FALLBACK_THRESHOLD: u8 = 255;

/// What happened during one threshold sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// Thresholds that traced successfully, in sweep order.
    pub traced: Vec<u8>,
    /// Thresholds whose contribution was dropped, with the reason.
    pub failed: Vec<(u8, TraceError)>,
    /// Regions discarded by the noise floor across all thresholds.
    pub noise_regions: usize,
    /// True when nothing was traced and the full-bounds rectangle was emitted.
    pub fallback_used: bool,
}

/// One threshold of the sweep: its position in the ascending list (which
/// picks the palette entry) and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Level {
    index: usize,
    threshold: u8,
}

fn sweep_levels(thresholds: &[u8], order: SweepOrder) -> Vec<Level> {
    let levels = thresholds
        .iter()
        .enumerate()
        .map(|(index, &threshold)| Level { index, threshold });
    match order {
        SweepOrder::Ascending => levels.collect(),
        SweepOrder::WidestFirst => levels.rev().collect(),
    }
}

fn trace_level(grid: &LuminanceGrid, level: Level, options: &ContourOptions) -> Result<MaskTrace, TraceError> {
    let mask = threshold_mask(grid, level.threshold);
    ContourTracer.vectorize(&mask, options)
}

/// Mask and trace every level. Results come back in `levels` order whether
/// or not they were computed concurrently.
fn trace_levels(
    grid: &LuminanceGrid,
    levels: &[Level],
    options: &ContourOptions,
    parallel: bool,
) -> Vec<Result<MaskTrace, TraceError>> {
    #[cfg(feature = "parallel")]
    {
        if parallel {
            return levels
                .par_iter()
                .map(|&level| trace_level(grid, level, options))
                .collect();
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    levels
        .iter()
        .map(|&level| trace_level(grid, level, options))
        .collect()
}

/// Run the threshold sweep over `grid` and merge every surviving region into
/// one document.
///
/// Ids count up from 1 across the whole sweep, so they follow sweep order.
/// A threshold that fails to trace is dropped and logged. If every
/// threshold fails the sweep is a [`VectorizeError::TraceFailure`]; if the
/// sweep succeeds but yields no regions, a single full-bounds rectangle in
/// `options.fallback_fill` is emitted instead.
pub fn compose_layers(
    grid: &LuminanceGrid,
    options: &VectorizeOptions,
) -> VectorizeResult<(VectorDocument, SweepReport)> {
    let (width, height) = (grid.width(), grid.height());
    let contour = ContourOptions {
        noise_floor_pixels: options.noise_floor_pixels(grid.pixel_count()),
        simplify_tolerance: options.simplify_tolerance,
        max_vertices: options.max_path_vertices,
    };
    let levels = sweep_levels(&options.thresholds, options.sweep_order);
    let results = trace_levels(grid, &levels, &contour, options.parallel);

    let mut report = SweepReport::default();
    let mut components = Vec::new();
    let mut next_id = 1u32;

    for (level, result) in levels.iter().zip(results) {
        match result {
            Ok(trace) => {
                debug!(
                    threshold = level.threshold,
                    regions = trace.regions.len(),
                    discarded = trace.discarded,
                    "threshold traced"
                );
                report.traced.push(level.threshold);
                report.noise_regions += trace.discarded;
                let fill = options.color_for_level(level.index);
                for region in trace.regions {
                    components.push(Component::new(
                        next_id,
                        region.geometry,
                        fill,
                        level.threshold,
                        ShapeKind::Polygon,
                    ));
                    next_id += 1;
                }
            }
            Err(err) => {
                warn!(threshold = level.threshold, error = %err, "dropping threshold");
                report.failed.push((level.threshold, err));
            }
        }
    }

    if !levels.is_empty() && report.failed.len() == levels.len() {
        return Err(VectorizeError::TraceFailure {
            thresholds: levels.len(),
        });
    }

    if components.is_empty() {
        warn!(width, height, "no regions traced, emitting full-bounds fallback");
        report.fallback_used = true;
        components.push(Component::new(
            1,
            PathGeometry::full_rect(width, height),
            options.fallback_fill,
            FALLBACK_THRESHOLD,
            ShapeKind::Rect,
        ));
    }

    Ok((VectorDocument::new(width, height, components), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::HexColor;
    use image::{GrayImage, Luma};

    /// White canvas with dark rectangles painted at the given luminance.
    fn canvas(w: u32, h: u32, rects: &[(u32, u32, u32, u32, u8)]) -> LuminanceGrid {
        let mut img = GrayImage::from_pixel(w, h, Luma([255]));
        for &(x0, y0, rw, rh, value) in rects {
            for y in y0..y0 + rh {
                for x in x0..x0 + rw {
                    img.put_pixel(x, y, Luma([value]));
                }
            }
        }
        LuminanceGrid::from_gray(img).unwrap()
    }

    fn options() -> VectorizeOptions {
        VectorizeOptions::default().with_parallel(false)
    }

    mod sweep_levels {
        use super::*;

        #[test]
        fn widest_first_reverses_but_keeps_palette_index() {
            let levels = sweep_levels(&[80, 100, 140], SweepOrder::WidestFirst);
            assert_eq!(
                levels,
                vec![
                    Level { index: 2, threshold: 140 },
                    Level { index: 1, threshold: 100 },
                    Level { index: 0, threshold: 80 },
                ]
            );
        }

        #[test]
        fn ascending_keeps_order() {
            let levels = sweep_levels(&[80, 100], SweepOrder::Ascending);
            assert_eq!(levels[0], Level { index: 0, threshold: 80 });
            assert_eq!(levels[1], Level { index: 1, threshold: 100 });
        }
    }

    mod compose_layers {
        use super::*;

        mod unit {
            use super::*;

            #[test]
            fn blank_canvas_falls_back_to_one_rect() {
                let grid = canvas(100, 100, &[]);
                let (doc, report) = compose_layers(&grid, &options()).unwrap();

                assert!(report.fallback_used);
                assert_eq!(doc.components().len(), 1);
                let only = &doc.components()[0];
                assert_eq!(only.id, 1);
                assert_eq!(only.kind, ShapeKind::Rect);
                assert_eq!(only.fill, HexColor::WHITE);
                assert_eq!(only.source_threshold, FALLBACK_THRESHOLD);
                assert!((only.area_estimate - 10_000.0).abs() < 1e-9);
            }

            #[test]
            fn nested_levels_paint_dark_over_light() {
                // one dark core inside a lighter halo
                let grid = canvas(40, 40, &[(5, 5, 30, 30, 120), (15, 15, 10, 10, 20)]);
                let opts = options().with_thresholds(vec![60, 160]);
                let (doc, report) = compose_layers(&grid, &opts).unwrap();

                assert_eq!(report.traced, vec![160, 60]);
                let thresholds: Vec<u8> = doc.components().iter().map(|c| c.source_threshold).collect();
                assert_eq!(thresholds, vec![160, 60]);
                assert_eq!(doc.components()[0].fill, opts.color_for_level(1));
                assert_eq!(doc.components()[1].fill, opts.color_for_level(0));
                assert!(doc.components()[0].area_estimate > doc.components()[1].area_estimate);
            }

            #[test]
            fn ascending_order_is_honored() {
                let grid = canvas(40, 40, &[(5, 5, 30, 30, 120), (15, 15, 10, 10, 20)]);
                let opts = options()
                    .with_thresholds(vec![60, 160])
                    .with_sweep_order(SweepOrder::Ascending);
                let (doc, _) = compose_layers(&grid, &opts).unwrap();
                let thresholds: Vec<u8> = doc.components().iter().map(|c| c.source_threshold).collect();
                assert_eq!(thresholds, vec![60, 160]);
            }

            #[test]
            fn ids_are_continuous_across_thresholds() {
                let grid = canvas(60, 20, &[(2, 2, 8, 8, 10), (20, 2, 8, 8, 10), (40, 2, 8, 8, 90)]);
                let opts = options().with_thresholds(vec![50, 100]);
                let (doc, _) = compose_layers(&grid, &opts).unwrap();

                // 100 sees all three squares, 50 sees the two darkest
                let ids: Vec<u32> = doc.components().iter().map(|c| c.id).collect();
                assert_eq!(ids, vec![1, 2, 3, 4, 5]);
            }

            #[test]
            fn speckle_is_counted_as_noise() {
                let grid = canvas(100, 100, &[(50, 50, 1, 1, 0)]);
                let (doc, report) = compose_layers(&grid, &options()).unwrap();
                assert!(report.fallback_used);
                assert_eq!(doc.components().len(), 1);
                // the speckle is below every threshold
                assert_eq!(report.noise_regions, 4);
            }

            #[test]
            fn every_threshold_failing_is_a_trace_failure() {
                let grid = canvas(20, 20, &[(2, 2, 10, 10, 0)]);
                let mut opts = options().with_thresholds(vec![50, 100]);
                // bypasses validate() on purpose
                opts.max_path_vertices = 2;
                let err = compose_layers(&grid, &opts).unwrap_err();
                assert!(matches!(err, VectorizeError::TraceFailure { thresholds: 2 }));
            }

            #[test]
            fn failing_threshold_is_dropped_not_fatal() {
                // level 100 sees a three-tooth comb that no four-vertex ring
                // can follow; level 50 sees only a square inside one tooth
                let grid = canvas(
                    300,
                    360,
                    &[
                        (10, 10, 280, 40, 80),
                        (10, 50, 40, 300, 80),
                        (130, 50, 40, 300, 80),
                        (250, 50, 40, 300, 80),
                        (20, 100, 20, 20, 10),
                    ],
                );
                let opts = options()
                    .with_thresholds(vec![50, 100])
                    .with_simplify_tolerance(0.0)
                    .with_max_path_vertices(4);
                let (doc, report) = compose_layers(&grid, &opts).unwrap();

                assert_eq!(report.failed.len(), 1);
                assert_eq!(report.failed[0].0, 100);
                assert!(matches!(report.failed[0].1, TraceError::VertexBudget { limit: 4, .. }));
                assert_eq!(report.traced, vec![50]);
                assert!(!report.fallback_used);
                assert_eq!(doc.components().len(), 1);
                assert_eq!(doc.components()[0].id, 1);
                assert_eq!(doc.components()[0].source_threshold, 50);
            }

            #[cfg(feature = "parallel")]
            #[test]
            fn parallel_matches_sequential() {
                let grid = canvas(64, 48, &[(3, 3, 20, 30, 30), (30, 10, 25, 25, 120), (40, 20, 5, 5, 70)]);
                let sequential = compose_layers(&grid, &options()).unwrap();
                let parallel = compose_layers(&grid, &options().with_parallel(true)).unwrap();
                assert_eq!(sequential, parallel);
            }
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                /// Ids strictly increase and every vertex stays in bounds
                #[test]
                fn ids_monotonic_and_bounded(
                    w in 1u32..24,
                    h in 1u32..24,
                    values in proptest::collection::vec(proptest::num::u8::ANY, 576)
                ) {
                    let img = GrayImage::from_fn(w, h, |x, y| Luma([values[(y * 24 + x) as usize]]));
                    let grid = LuminanceGrid::from_gray(img).unwrap();
                    let (doc, _) = compose_layers(&grid, &options()).unwrap();

                    prop_assert!(!doc.components().is_empty());
                    prop_assert!(doc.components().windows(2).all(|p| p[0].id < p[1].id));
                    for c in doc.components() {
                        prop_assert!(c.id >= 1);
                        prop_assert!(c.geometry.is_valid());
                        prop_assert!(c.geometry.within_bounds(w, h));
                    }
                }
            }
        }
    }
}
