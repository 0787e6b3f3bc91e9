pub mod color;
pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod layer;
pub mod loader;
pub mod mask;
pub mod svg;
pub mod vectorizer;

pub use color::HexColor;
pub use config::{SweepOrder, VectorizeOptions};
pub use document::{Component, ComponentDescriptor, ShapeKind, VectorDocument};
pub use error::{TraceError, VectorizeError, VectorizeResult};
pub use layer::SweepReport;
pub use vectorizer::MaskVectorizer;

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use image::imageops::FilterType;
use serde::Serialize;
use tracing::info;

use crate::layer::compose_layers;
use crate::loader::{LuminanceGrid, check_byte_len, load_luminance, normalize};

/// Entry point for configuring and running raster-to-vector conversion.
#[derive(Debug, Clone, Default)]
pub struct Vectorizer {
    options: VectorizeOptions,
}

impl Vectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every option at once.
    pub fn with_options(mut self, options: VectorizeOptions) -> Self {
        self.options = options;
        self
    }

    /// Get a reference to the current options.
    pub fn options(&self) -> &VectorizeOptions {
        &self.options
    }

    /// Cap the longer edge of the working grid.
    pub fn with_max_working_edge(mut self, edge: u32) -> Self {
        self.options.max_working_edge = edge;
        self
    }

    /// Set the strictly ascending luminance thresholds to sweep.
    pub fn with_thresholds(mut self, thresholds: impl Into<Vec<u8>>) -> Self {
        self.options.thresholds = thresholds.into();
        self
    }

    /// Set the fill palette, indexed by threshold position.
    pub fn with_palette(mut self, palette: impl Into<Vec<HexColor>>) -> Self {
        self.options.palette = palette.into();
        self
    }

    /// Set the minimum region size as a fraction of the working grid.
    pub fn with_noise_floor_ratio(mut self, ratio: f64) -> Self {
        self.options.noise_floor_ratio = ratio;
        self
    }

    /// Set the path simplification tolerance in working-grid pixels.
    pub fn with_simplify_tolerance(mut self, tolerance: f64) -> Self {
        self.options.simplify_tolerance = tolerance;
        self
    }

    /// Set the alpha below which pixels count as background.
    pub fn with_alpha_cutoff(mut self, cutoff: u8) -> Self {
        self.options.alpha_cutoff = cutoff;
        self
    }

    /// Set the filter used to downsample to the working grid.
    pub fn with_resize_filter(mut self, filter: FilterType) -> Self {
        self.options.resize_filter = filter;
        self
    }

    pub fn with_sweep_order(mut self, order: SweepOrder) -> Self {
        self.options.sweep_order = order;
        self
    }

    /// Cap the vertices of each path, holes included.
    pub fn with_max_path_vertices(mut self, limit: usize) -> Self {
        self.options.max_path_vertices = limit;
        self
    }

    /// Set the fill of the full-bounds rectangle emitted when nothing traces.
    pub fn with_fallback_fill(mut self, fill: HexColor) -> Self {
        self.options.fallback_fill = fill;
        self
    }

    /// Trace thresholds concurrently when the `parallel` feature is enabled.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.options.parallel = parallel;
        self
    }

    /// Decode PNG or JPEG bytes and trace them.
    pub fn for_bytes(&self, bytes: &[u8]) -> VectorizeResult<TracedImage> {
        self.options.validate()?;
        let grid = load_luminance(bytes, &self.options)?;
        self.trace_grid(&grid)
    }

    /// Read an image file and trace it. Files over `max_input_bytes` are
    /// rejected from their metadata without being read.
    pub fn for_path(&self, path: impl AsRef<Path>) -> VectorizeResult<TracedImage> {
        self.options.validate()?;
        let file = File::open(path)?;
        check_byte_len(file.metadata()?.len(), &self.options)?;

        // never buffer more than one byte past the limit, even if the file grew
        let mut bytes = Vec::new();
        file.take(self.options.max_input_bytes.saturating_add(1))
            .read_to_end(&mut bytes)?;
        self.for_bytes(&bytes)
    }

    /// Trace an already decoded image. The pixel limit still applies.
    pub fn for_image(&self, image: &DynamicImage) -> VectorizeResult<TracedImage> {
        self.options.validate()?;
        let grid = normalize(image, &self.options)?;
        self.trace_grid(&grid)
    }

    fn trace_grid(&self, grid: &LuminanceGrid) -> VectorizeResult<TracedImage> {
        let (document, report) = compose_layers(grid, &self.options)?;
        info!(
            width = document.width(),
            height = document.height(),
            components = document.components().len(),
            dropped_thresholds = report.failed.len(),
            noise_regions = report.noise_regions,
            fallback = report.fallback_used,
            "vectorized image"
        );
        Ok(TracedImage::new(document, report))
    }
}

/// Result of tracing one image: the document, its serialized form, and the
/// sweep report.
#[derive(Debug, Clone)]
pub struct TracedImage {
    document: Arc<VectorDocument>,
    svg: String,
    report: SweepReport,
}

impl TracedImage {
    fn new(document: VectorDocument, report: SweepReport) -> Self {
        let svg = svg::to_svg(&document);
        Self {
            document: Arc::new(document),
            svg,
            report,
        }
    }

    /// Get a reference to the traced document.
    pub fn document(&self) -> &VectorDocument {
        self.document.as_ref()
    }

    /// Get the serialized SVG document.
    pub fn svg(&self) -> &str {
        &self.svg
    }

    /// Editable descriptors of every component, in paint order.
    pub fn components(&self) -> Vec<ComponentDescriptor> {
        self.document.descriptors()
    }

    pub fn report(&self) -> &SweepReport {
        &self.report
    }

    pub fn width(&self) -> u32 {
        self.document.width()
    }

    pub fn height(&self) -> u32 {
        self.document.height()
    }

    /// A copy with component `id` recolored and the SVG rewritten to match.
    pub fn recolored(&self, id: u32, color: HexColor) -> VectorizeResult<TracedImage> {
        Ok(Self {
            svg: svg::recolor(&self.svg, id, color)?,
            document: Arc::new(self.document.recolored(id, color)?),
            report: self.report.clone(),
        })
    }

    /// A copy with component `id` at `opacity` and the SVG rewritten to match.
    pub fn with_opacity(&self, id: u32, opacity: f32) -> VectorizeResult<TracedImage> {
        Ok(Self {
            svg: svg::set_opacity(&self.svg, id, opacity)?,
            document: Arc::new(self.document.with_opacity(id, opacity)?),
            report: self.report.clone(),
        })
    }

    /// Save the SVG document to the specified path.
    pub fn save_svg(&self, path: impl AsRef<Path>) -> VectorizeResult<()> {
        fs::write(path, &self.svg)?;
        Ok(())
    }

    /// Save the component descriptors as pretty-printed JSON.
    pub fn save_components(&self, path: impl AsRef<Path>) -> VectorizeResult<()> {
        let json = serde_json::to_string_pretty(&self.components())?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Consume the handle and return the caller-facing output record.
    pub fn into_output(self) -> VectorizeOutput {
        VectorizeOutput {
            components: self.document.descriptors(),
            width: self.document.width(),
            height: self.document.height(),
            document: self.svg,
        }
    }
}

/// The serialized document plus everything a caller needs to edit it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorizeOutput {
    pub document: String,
    pub components: Vec<ComponentDescriptor>,
    pub width: u32,
    pub height: u32,
}
