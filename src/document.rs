use std::sync::Arc;

use serde::Serialize;

use crate::color::HexColor;
use crate::geometry::PathGeometry;
use crate::{VectorizeError, VectorizeResult};

/// How a component's geometry came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Traced outline of a mask region.
    Polygon,
    /// Full-bounds rectangle emitted when nothing was traced.
    Rect,
}

/// One colored, independently editable shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Positive, unique within a document; also the paint order.
    pub id: u32,
    /// Shared between a document and its patched copies.
    pub geometry: Arc<PathGeometry>,
    pub fill: HexColor,
    /// Fill opacity in `[0, 1]`.
    pub opacity: f32,
    pub source_threshold: u8,
    /// Filled area in working-grid pixels (outer ring minus holes).
    pub area_estimate: f64,
    pub kind: ShapeKind,
}

impl Component {
    pub fn new(id: u32, geometry: PathGeometry, fill: HexColor, source_threshold: u8, kind: ShapeKind) -> Self {
        let area_estimate = geometry.area();
        Self {
            id,
            geometry: Arc::new(geometry),
            fill,
            opacity: 1.0,
            source_threshold,
            area_estimate,
            kind,
        }
    }

    pub fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor {
            id: self.id,
            shape: self.kind,
            color: self.fill,
            threshold: self.source_threshold,
        }
    }
}

/// The editable summary of a component handed to callers alongside the SVG.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentDescriptor {
    pub id: u32,
    pub shape: ShapeKind,
    pub color: HexColor,
    pub threshold: u8,
}

/// The traced result: a coordinate space and its components in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDocument {
    width: u32,
    height: u32,
    components: Vec<Component>,
}

impl VectorDocument {
    /// Components are sorted by id; the document keeps that order.
    pub fn new(width: u32, height: u32, mut components: Vec<Component>) -> Self {
        components.sort_by_key(|c| c.id);
        Self {
            width,
            height,
            components,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, id: u32) -> Option<&Component> {
        self.components
            .binary_search_by_key(&id, |c| c.id)
            .ok()
            .map(|idx| &self.components[idx])
    }

    pub fn descriptors(&self) -> Vec<ComponentDescriptor> {
        self.components.iter().map(Component::descriptor).collect()
    }

    /// A copy of this document with component `id` filled with `color`.
    pub fn recolored(&self, id: u32, color: HexColor) -> VectorizeResult<Self> {
        self.patched(id, |c| c.fill = color)
    }

    /// A copy of this document with component `id` at `opacity`, clamped to `[0, 1]`.
    pub fn with_opacity(&self, id: u32, opacity: f32) -> VectorizeResult<Self> {
        if !opacity.is_finite() {
            return Err(VectorizeError::InvalidConfig(format!(
                "opacity must be a finite number, got {opacity}"
            )));
        }
        let opacity = opacity.clamp(0.0, 1.0);
        self.patched(id, |c| c.opacity = opacity)
    }

    fn patched(&self, id: u32, edit: impl FnOnce(&mut Component)) -> VectorizeResult<Self> {
        let idx = self
            .components
            .binary_search_by_key(&id, |c| c.id)
            .map_err(|_| VectorizeError::ComponentNotFound { id })?;
        let mut copy = self.clone();
        edit(&mut copy.components[idx]);
        Ok(copy)
    }
}
