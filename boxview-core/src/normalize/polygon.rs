use std::{fmt, marker::PhantomData};

use serde::{
    Deserialize, Deserializer,
    de::{Error, IgnoredAny, SeqAccess, Visitor},
};
use serde_json::Value;
use snafu::ensure;

use crate::{
    analysis::bbox::Rect,
    error::{BoxviewError, DecodeSnafu},
    layout::element::NormalizedRegion,
};

use super::{PayloadShape, resolve_text};

const DETECTIONS_KEY: &str = "text_content";
const NESTED_KEY: &str = "data";

/// `[[x, y] x 4, [text, confidence]]`
type PolygonEntry = Pair<Vec<[f64; 2]>, Recognition>;

type Recognition = Pair<Option<String>, Confidence>;

/// An array read by its first two elements. Backends may append extra
/// fields, which are skipped.
#[derive(Debug)]
struct Pair<A, B>(A, B);

impl<'de, A, B> Deserialize<'de> for Pair<A, B>
where
    A: Deserialize<'de>,
    B: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PairVisitor<A, B>(PhantomData<(A, B)>);

        impl<'de, A, B> Visitor<'de> for PairVisitor<A, B>
        where
            A: Deserialize<'de>,
            B: Deserialize<'de>,
        {
            type Value = Pair<A, B>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an array with at least 2 elements")
            }

            fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
            where
                S: SeqAccess<'de>,
            {
                let first = seq
                    .next_element()?
                    .ok_or_else(|| Error::invalid_length(0, &self))?;
                let second = seq
                    .next_element()?
                    .ok_or_else(|| Error::invalid_length(1, &self))?;
                while seq.next_element::<IgnoredAny>()?.is_some() {}

                Ok(Pair(first, second))
            }
        }

        deserializer.deserialize_seq(PairVisitor(PhantomData))
    }
}

/// Backends send the score either as a number or as its string form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Confidence {
    Number(f64),
    Text(String),
}

impl Confidence {
    fn value(&self) -> Option<f64> {
        match self {
            Confidence::Number(value) => Some(*value),
            Confidence::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Finds the detection array for the flat and nested layouts.
pub(crate) fn locate_entries(payload: &Value, shape: PayloadShape) -> Result<&Value, BoxviewError> {
    let container = match shape {
        PayloadShape::Nested => payload.get(NESTED_KEY),
        _ => Some(payload),
    };

    container
        .and_then(|container| container.get(DETECTIONS_KEY))
        .ok_or_else(|| {
            DecodeSnafu {
                shape,
                message: format!("missing key `{DETECTIONS_KEY}`"),
            }
            .build()
        })
}

/// Converts polygon detections into regions.
///
/// The box is spanned by the first and third polygon points, so rotated
/// regions degrade to those two corners.
pub(crate) fn normalize_entries(
    entries: &Value,
    shape: PayloadShape,
    width: u32,
    height: u32,
) -> Result<Vec<NormalizedRegion>, BoxviewError> {
    let entries = Vec::<PolygonEntry>::deserialize(entries).map_err(|err| {
        DecodeSnafu {
            shape,
            message: err.to_string(),
        }
        .build()
    })?;

    entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| entry_to_region(idx, entry, shape, width, height))
        .collect()
}

fn entry_to_region(
    idx: usize,
    Pair(points, Pair(text, confidence)): PolygonEntry,
    shape: PayloadShape,
    width: u32,
    height: u32,
) -> Result<NormalizedRegion, BoxviewError> {
    ensure!(
        points.len() >= 3,
        DecodeSnafu {
            shape,
            message: format!("detection {idx} has {} points, need 4", points.len()),
        }
    );

    let confidence = confidence.value().ok_or_else(|| {
        DecodeSnafu {
            shape,
            message: format!("detection {idx} has malformed confidence {confidence:?}"),
        }
        .build()
    })?;

    let [x1, y1] = points[0];
    let [x2, y2] = points[2];
    let bbox = Rect::from_corners(
        round_half_even(x1),
        round_half_even(y1),
        round_half_even(x2),
        round_half_even(y2),
    )
    .clamp_to(width, height);

    Ok(NormalizedRegion {
        text: resolve_text(text),
        bbox,
        confidence: Some(confidence),
    })
}

fn round_half_even(value: f64) -> i32 {
    value.round_ties_even() as i32
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_locate_entries() {
        let flat = json!({ "text_content": [] });
        let nested = json!({ "data": { "text_content": [1] } });

        assert!(locate_entries(&flat, PayloadShape::Flat).is_ok());
        assert_eq!(
            locate_entries(&nested, PayloadShape::Nested).ok(),
            Some(&json!([1]))
        );
        assert!(locate_entries(&nested, PayloadShape::Flat).is_err());
        assert!(locate_entries(&flat, PayloadShape::Nested).is_err());
    }

    #[test]
    fn test_first_and_third_points_span_box() -> Result<(), Box<dyn std::error::Error>> {
        // Rotated quad: the second and fourth points are ignored
        let entries = json!([
            [[[10, 12], [80, 2], [90, 40], [20, 50]], ["tilted", "0.8"]]
        ]);

        let regions = normalize_entries(&entries, PayloadShape::Flat, 200, 200)?;
        assert_eq!(regions[0].bbox, Rect::from_corners(10, 12, 90, 40));
        Ok(())
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(0.5), 0);
        assert_eq!(round_half_even(1.5), 2);
        assert_eq!(round_half_even(2.5), 2);
        assert_eq!(round_half_even(2.6), 3);
        assert_eq!(round_half_even(-0.4), 0);
    }

    #[test]
    fn test_malformed_entries_are_decode_errors() {
        let short_polygon = json!([[[[0, 0], [1, 1]], ["x", "0.5"]]]);
        let bad_confidence = json!([[[[0, 0], [1, 0], [1, 1], [0, 1]], ["x", "high"]]]);
        let bad_shape = json!([{ "points": [], "text": "x" }]);

        for entries in [short_polygon, bad_confidence, bad_shape] {
            let result = normalize_entries(&entries, PayloadShape::Nested, 10, 10);
            assert!(
                matches!(result, Err(BoxviewError::Decode { .. })),
                "{entries} should not decode"
            );
        }
    }

    #[test]
    fn test_trailing_fields_are_ignored() -> Result<(), Box<dyn std::error::Error>> {
        let entries = json!([
            [[[1, 2], [9, 2], [9, 8], [1, 8]], ["extra", "0.5", "zh"], {"angle": 0}],
            [[[0, 0], [4, 0], [4, 4], [0, 4]], [null, 0.25]]
        ]);

        let regions = normalize_entries(&entries, PayloadShape::Flat, 10, 10)?;
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].text, "extra");
        assert_eq!(regions[0].bbox, Rect::from_corners(1, 2, 9, 8));
        assert_eq!(regions[0].confidence, Some(0.5));
        assert_eq!(regions[1].confidence, Some(0.25));
        Ok(())
    }

    #[test]
    fn test_recognition_needs_text_and_score() {
        let entries = json!([[[[0, 0], [1, 0], [1, 1], [0, 1]], ["lonely"]]]);
        let result = normalize_entries(&entries, PayloadShape::Flat, 10, 10);
        assert!(matches!(result, Err(BoxviewError::Decode { .. })));
    }

    #[test]
    fn test_empty_detection_list() -> Result<(), Box<dyn std::error::Error>> {
        let regions = normalize_entries(&json!([]), PayloadShape::Flat, 10, 10)?;
        assert!(regions.is_empty());
        Ok(())
    }
}
