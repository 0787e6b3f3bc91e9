//! SVG serialization and attribute-level edits of serialized documents.
//!
//! Every component becomes one `<path>` element carrying an
//! `id="component-N"` attribute, so a caller holding only the document
//! string can recolor a shape by rewriting that element's `fill` without
//! re-tracing. [`parse_paths`] reads back what [`to_svg`] writes through
//! `roxmltree`, and edits splice new values into the byte range the parser
//! reports for the attribute, so the rest of the document is untouched.

use std::fmt::Write;

use crate::color::HexColor;
use crate::document::VectorDocument;
use crate::geometry::{PathGeometry, Point};
use crate::{VectorizeError, VectorizeResult};

const ID_PREFIX: &str = "component-";

/// Serialize a document. The output depends only on the document, so the
/// same document always produces the same bytes.
#[must_use]
pub fn to_svg(document: &VectorDocument) -> String {
    let (w, h) = (document.width(), document.height());
    let mut out = String::new();

    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );

    for component in document.components() {
        let _ = writeln!(
            out,
            r#"  <path id="{ID_PREFIX}{}" d="{}" fill="{}" fill-opacity="{}" fill-rule="evenodd" data-threshold="{}"/>"#,
            component.id,
            path_data(&component.geometry),
            component.fill,
            format_opacity(component.opacity),
            component.source_threshold,
        );
    }

    out.push_str("</svg>\n");
    out
}

/// `d` attribute for a geometry: one closed `M … Z` subpath per ring.
pub fn path_data(geometry: &PathGeometry) -> String {
    let mut d = String::new();
    for ring in geometry.rings() {
        for (i, p) in ring.iter().enumerate() {
            if !d.is_empty() {
                d.push(' ');
            }
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd} {} {}", format_coord(p.x), format_coord(p.y));
        }
        if !ring.is_empty() {
            d.push_str(" Z");
        }
    }
    d
}

fn format_coord(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v:.2}")
    }
}

fn format_opacity(opacity: f32) -> String {
    let text = format!("{opacity:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() { "0".into() } else { text.into() }
}

/// Rewrite the `fill` of component `id` in a serialized document.
pub fn recolor(svg: &str, id: u32, color: HexColor) -> VectorizeResult<String> {
    replace_attribute(svg, id, "fill", &color.to_string())
}

/// Rewrite the `fill-opacity` of component `id`, clamped to `[0, 1]`.
pub fn set_opacity(svg: &str, id: u32, opacity: f32) -> VectorizeResult<String> {
    if !opacity.is_finite() {
        return Err(VectorizeError::InvalidConfig(format!(
            "opacity must be a finite number, got {opacity}"
        )));
    }
    replace_attribute(svg, id, "fill-opacity", &format_opacity(opacity.clamp(0.0, 1.0)))
}

fn replace_attribute(svg: &str, id: u32, name: &str, value: &str) -> VectorizeResult<String> {
    let doc = parse_document(svg)?;
    let element_id = format!("{ID_PREFIX}{id}");
    let node = doc
        .descendants()
        .find(|n| n.is_element() && n.attribute("id") == Some(element_id.as_str()))
        .ok_or(VectorizeError::ComponentNotFound { id })?;
    let span = node
        .attributes()
        .find(|attr| attr.name() == name)
        .map(|attr| attr.range_value())
        .ok_or_else(|| {
            VectorizeError::MalformedDocument(format!("component {id} has no `{name}` attribute"))
        })?;

    let mut out = String::with_capacity(svg.len() + value.len());
    out.push_str(&svg[..span.start]);
    out.push_str(value);
    out.push_str(&svg[span.end..]);
    Ok(out)
}

fn parse_document(svg: &str) -> VectorizeResult<roxmltree::Document<'_>> {
    roxmltree::Document::parse(svg)
        .map_err(|e| VectorizeError::MalformedDocument(format!("failed to parse svg xml: {e}")))
}

/// A path element as read back from a serialized document.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgPath {
    pub id: u32,
    pub d: String,
    pub fill: HexColor,
    pub opacity: f32,
    pub threshold: u8,
}

/// Read the component paths of a document written by [`to_svg`], in
/// document order. Every `<path>` element must be a component.
pub fn parse_paths(svg: &str) -> VectorizeResult<Vec<SvgPath>> {
    let doc = parse_document(svg)?;
    doc.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "path")
        .map(|n| parse_path(&n))
        .collect()
}

fn parse_path(node: &roxmltree::Node<'_, '_>) -> VectorizeResult<SvgPath> {
    let get = |name: &str| {
        node.attribute(name)
            .ok_or_else(|| VectorizeError::MalformedDocument(format!("<path> without `{name}`")))
    };
    let malformed = |what: &str, value: &str| VectorizeError::MalformedDocument(format!("bad {what} `{value}`"));

    let raw_id = get("id")?;
    let id = raw_id
        .strip_prefix(ID_PREFIX)
        .and_then(|n| n.parse::<u32>().ok())
        .ok_or_else(|| malformed("id", raw_id))?;
    let fill = HexColor::parse(get("fill")?)?;
    let opacity = match node.attribute("fill-opacity") {
        Some(raw) => raw.parse::<f32>().map_err(|_| malformed("fill-opacity", raw))?,
        None => 1.0,
    };
    let raw_threshold = get("data-threshold")?;
    let threshold = raw_threshold
        .parse::<u8>()
        .map_err(|_| malformed("data-threshold", raw_threshold))?;

    Ok(SvgPath {
        id,
        d: get("d")?.to_string(),
        fill,
        opacity,
        threshold,
    })
}

/// Parse a `d` attribute made of `M`/`L`/`Z` commands back into rings.
pub fn parse_path_data(d: &str) -> VectorizeResult<Vec<Vec<Point>>> {
    let mut rings: Vec<Vec<Point>> = Vec::new();
    let mut tokens = d.split_whitespace();
    let coord = |t: Option<&str>| -> VectorizeResult<f64> {
        t.and_then(|t| t.parse().ok())
            .ok_or_else(|| VectorizeError::MalformedDocument(format!("bad path data `{d}`")))
    };

    while let Some(cmd) = tokens.next() {
        match cmd {
            "M" => {
                let x = coord(tokens.next())?;
                let y = coord(tokens.next())?;
                rings.push(vec![Point::new(x, y)]);
            }
            "L" => {
                let x = coord(tokens.next())?;
                let y = coord(tokens.next())?;
                rings
                    .last_mut()
                    .ok_or_else(|| VectorizeError::MalformedDocument("line-to before move-to".into()))?
                    .push(Point::new(x, y));
            }
            "Z" => {}
            other => {
                return Err(VectorizeError::MalformedDocument(format!(
                    "unsupported path command `{other}`"
                )));
            }
        }
    }

    Ok(rings)
}
