use image::imageops::FilterType;

use crate::color::{HexColor, default_palette};
use crate::{VectorizeError, VectorizeResult};

/// Hard ceiling for the working resolution, independent of user options.
pub const MAX_WORKING_EDGE_LIMIT: u32 = 4096;

pub const DEFAULT_THRESHOLDS: [u8; 4] = [80, 100, 140, 180];

/// Order in which thresholds are swept; component ids (and therefore paint
/// order) follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepOrder {
    /// Highest threshold first: the widest, lightest masks paint underneath
    /// the darker detail traced at lower thresholds.
    #[default]
    WidestFirst,
    /// Thresholds in the order they are listed.
    Ascending,
}

/// Options for the whole raster-to-vector run.
#[derive(Debug, Clone)]
pub struct VectorizeOptions {
    /// Longer edge of the working grid; larger inputs are downsampled.
    pub max_working_edge: u32,
    /// Strictly ascending luminance cutoffs, one trace pass each.
    pub thresholds: Vec<u8>,
    /// Fill colors indexed by threshold position, cycled when shorter.
    pub palette: Vec<HexColor>,
    /// Minimum region size as a fraction of the working grid's pixel count.
    pub noise_floor_ratio: f64,
    /// Douglas-Peucker tolerance in working-grid pixels.
    pub simplify_tolerance: f64,
    /// Pixels with alpha below this are treated as background.
    pub alpha_cutoff: u8,
    /// Filter used when downsampling to the working resolution.
    pub resize_filter: FilterType,
    /// Largest accepted encoded input, in bytes.
    pub max_input_bytes: u64,
    /// Largest accepted decoded input, in pixels.
    pub max_input_pixels: u64,
    /// Upper bound on vertices per ring after simplification.
    pub max_path_vertices: usize,
    /// Fill of the single component emitted when nothing was traced.
    pub fallback_fill: HexColor,
    pub sweep_order: SweepOrder,
    /// Trace thresholds concurrently (requires the `parallel` feature).
    pub parallel: bool,
}

impl Default for VectorizeOptions {
    fn default() -> Self {
        Self {
            max_working_edge: 600,
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            palette: default_palette(),
            noise_floor_ratio: 0.001,
            simplify_tolerance: 1.0,
            alpha_cutoff: 128,
            resize_filter: FilterType::Triangle,
            max_input_bytes: 32 * 1024 * 1024,
            max_input_pixels: 40_000_000,
            max_path_vertices: 400,
            fallback_fill: HexColor::WHITE,
            sweep_order: SweepOrder::WidestFirst,
            parallel: true,
        }
    }
}

impl VectorizeOptions {
    pub fn with_max_working_edge(mut self, edge: u32) -> Self {
        self.max_working_edge = edge;
        self
    }

    pub fn with_thresholds(mut self, thresholds: impl Into<Vec<u8>>) -> Self {
        self.thresholds = thresholds.into();
        self
    }

    pub fn with_palette(mut self, palette: impl Into<Vec<HexColor>>) -> Self {
        self.palette = palette.into();
        self
    }

    pub fn with_noise_floor_ratio(mut self, ratio: f64) -> Self {
        self.noise_floor_ratio = ratio;
        self
    }

    pub fn with_simplify_tolerance(mut self, tolerance: f64) -> Self {
        self.simplify_tolerance = tolerance;
        self
    }

    pub fn with_alpha_cutoff(mut self, cutoff: u8) -> Self {
        self.alpha_cutoff = cutoff;
        self
    }

    pub fn with_resize_filter(mut self, filter: FilterType) -> Self {
        self.resize_filter = filter;
        self
    }

    pub fn with_max_path_vertices(mut self, limit: usize) -> Self {
        self.max_path_vertices = limit;
        self
    }

    pub fn with_fallback_fill(mut self, fill: HexColor) -> Self {
        self.fallback_fill = fill;
        self
    }

    pub fn with_sweep_order(mut self, order: SweepOrder) -> Self {
        self.sweep_order = order;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Palette entry for the threshold at `index` in the ascending list.
    pub fn color_for_level(&self, index: usize) -> HexColor {
        if self.palette.is_empty() {
            return self.fallback_fill;
        }
        self.palette[index % self.palette.len()]
    }

    /// Minimum pixel count a region needs on a grid of `total_pixels`.
    pub fn noise_floor_pixels(&self, total_pixels: u64) -> usize {
        let floor = (self.noise_floor_ratio * total_pixels as f64).ceil() as usize;
        floor.max(1)
    }

    /// Check that the options describe a runnable pipeline.
    pub fn validate(&self) -> VectorizeResult<()> {
        let invalid = |msg: String| Err(VectorizeError::InvalidConfig(msg));

        if self.thresholds.is_empty() {
            return invalid("at least one threshold is required".into());
        }
        if !self.thresholds.windows(2).all(|w| w[0] < w[1]) {
            return invalid(format!(
                "thresholds must be strictly ascending, got {:?}",
                self.thresholds
            ));
        }
        if self.palette.is_empty() {
            return invalid("palette must not be empty".into());
        }
        if !self.noise_floor_ratio.is_finite() || !(0.0..1.0).contains(&self.noise_floor_ratio) {
            return invalid(format!(
                "noise floor ratio must be in [0, 1), got {}",
                self.noise_floor_ratio
            ));
        }
        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance < 0.0 {
            return invalid(format!(
                "simplify tolerance must be a non-negative number, got {}",
                self.simplify_tolerance
            ));
        }
        if self.max_working_edge == 0 || self.max_working_edge > MAX_WORKING_EDGE_LIMIT {
            return invalid(format!(
                "max working edge must be in 1..={MAX_WORKING_EDGE_LIMIT}, got {}",
                self.max_working_edge
            ));
        }
        if self.max_path_vertices < 3 {
            return invalid(format!(
                "max path vertices must be at least 3, got {}",
                self.max_path_vertices
            ));
        }
        if matches!(self.resize_filter, FilterType::Nearest) {
            return invalid("nearest-neighbor resampling aliases thresholded edges".into());
        }
        Ok(())
    }
}
