//! Turns heterogeneous OCR responses into one list of `(text, box, score)`.
//!
//! Three backend formats are understood, selected by [`PayloadShape`]:
//! polygon arrays at the top level, the same arrays under `data`, and an
//! HTML fragment whose cells and paragraphs carry their geometry in
//! attributes. All of them share clamping and missing-text handling.

use std::fmt;

use serde_json::Value;
use snafu::ensure;

use crate::{
    consts::*,
    error::{BoxviewError, DecodeSnafu, EmptyDetectionsSnafu},
    layout::element::{Normalized, NormalizedRegion},
};

pub mod markup;
pub mod polygon;

pub use markup::normalize_markup;

/// Which backend produced a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum PayloadShape {
    /// `{"text_content": [[polygon, [text, confidence]], ...]}`
    Flat,
    /// `{"data": {"text_content": [...]}}`
    Nested,
    /// `{"data": "<html>...<td x=.. y=.. w=.. h=..>text</td>..."}`
    Markup,
}

impl PayloadShape {
    pub fn name(&self) -> &'static str {
        match self {
            PayloadShape::Flat => "flat",
            PayloadShape::Nested => "nested",
            PayloadShape::Markup => "markup",
        }
    }

    /// Decimal digits used when a confidence is shown, `None` if the
    /// backend reports no confidence at all.
    pub fn confidence_precision(&self) -> Option<usize> {
        match self {
            PayloadShape::Flat => Some(FLAT_CONFIDENCE_PRECISION),
            PayloadShape::Nested => Some(NESTED_CONFIDENCE_PRECISION),
            PayloadShape::Markup => None,
        }
    }
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalizes one OCR response against a `width x height` image.
///
/// Regions keep backend order: array order for polygon payloads, all `td`
/// elements then all `p` elements (each in document order) for markup.
/// Every box is clamped into the image.
pub fn normalize(
    payload: &Value,
    shape: PayloadShape,
    width: u32,
    height: u32,
) -> Result<Normalized, BoxviewError> {
    match shape {
        PayloadShape::Flat | PayloadShape::Nested => {
            let entries = polygon::locate_entries(payload, shape)?;
            let regions = polygon::normalize_entries(entries, shape, width, height)?;
            Ok(Normalized {
                regions,
                skipped: 0,
            })
        }
        PayloadShape::Markup => {
            let html = match payload {
                Value::String(html) => html.as_str(),
                _ => payload.get("data").and_then(Value::as_str).ok_or_else(|| {
                    DecodeSnafu {
                        shape,
                        message: "expected a string under `data`",
                    }
                    .build()
                })?,
            };
            normalize_markup(html, width, height)
        }
    }
}

/// Arithmetic mean of the region confidences.
///
/// Errors when no region carries a confidence, which covers both the empty
/// set and markup results.
pub fn average_confidence(regions: &[NormalizedRegion]) -> Result<f64, BoxviewError> {
    let (sum, count) = regions
        .iter()
        .filter_map(|region| region.confidence)
        .fold((0f64, 0usize), |(sum, count), confidence| {
            (sum + confidence, count + 1)
        });

    ensure!(count > 0, EmptyDetectionsSnafu);
    Ok(sum / count as f64)
}

/// Text shared by all shapes: absent content becomes `NULL`.
pub(crate) fn resolve_text(text: Option<String>) -> String {
    match text {
        Some(text) if text != NONE_TEXT => text,
        _ => NULL_TEXT.to_string(),
    }
}
