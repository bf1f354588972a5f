use serde::Serialize;

use crate::{analysis::bbox::Rect, normalize::PayloadShape};

/// One detection in canonical form.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct NormalizedRegion {
    pub text: String,
    #[serde(rename = "box")]
    pub bbox: Rect,
    /// Absent for markup payloads, which carry no scores.
    pub confidence: Option<f64>,
}

impl NormalizedRegion {
    /// Confidence formatted the way each backend's results are shown.
    pub fn display_confidence(&self, shape: PayloadShape) -> Option<String> {
        let precision = shape.confidence_precision()?;
        self.confidence
            .map(|confidence| format!("{confidence:.precision$}"))
    }

    /// Human readable caption, `<confidence>_<text>` when a score exists.
    pub fn caption(&self, shape: PayloadShape) -> String {
        match self.display_confidence(shape) {
            Some(confidence) => format!("{confidence}_{}", self.text),
            None => self.text.clone(),
        }
    }
}

/// Result of normalizing one payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Normalized {
    pub regions: Vec<NormalizedRegion>,
    /// Markup elements dropped for missing or malformed geometry.
    pub skipped: usize,
}

impl Normalized {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|region| region.text.as_str())
    }
}
