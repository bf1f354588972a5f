//! Annotation export written by the labeling tool.
//!
//! Only the fields the dataset generator reads are modelled; everything
//! else in the export is ignored.

use serde::Deserialize;

use crate::{
    analysis::bbox::Rect,
    error::{BoxviewError, ImageNameSnafu},
};

#[derive(Debug, Clone, Deserialize)]
pub struct StudioTask {
    /// Stored upload name, `<hash>-<image id>.<ext>`.
    pub file_upload: String,
    #[serde(default)]
    pub annotations: Vec<StudioAnnotation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudioAnnotation {
    #[serde(default)]
    pub result: Vec<StudioResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudioResult {
    pub id: String,
    pub value: RectangleValue,
}

/// Rectangle in percent of the image size.
#[derive(Debug, Clone, Deserialize)]
pub struct RectangleValue {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rectanglelabels: Vec<String>,
}

impl StudioTask {
    /// Recovers the image id from the upload name.
    ///
    /// The name is cut at the first `.`, then the second `-` separated
    /// piece is the id: `"290eed43-page_1.png"` gives `"page_1"`.
    pub fn image_name(&self) -> Result<&str, BoxviewError> {
        self.file_upload
            .split('.')
            .next()
            .and_then(|stem| stem.split('-').nth(1))
            .ok_or_else(|| {
                ImageNameSnafu {
                    file_upload: self.file_upload.as_str(),
                }
                .build()
            })
    }

    /// Results of the first annotation set, the only one exported.
    pub fn results(&self) -> &[StudioResult] {
        self.annotations
            .first()
            .map(|annotation| annotation.result.as_slice())
            .unwrap_or_default()
    }
}

impl StudioResult {
    pub fn label(&self) -> Option<&str> {
        self.value.rectanglelabels.first().map(String::as_str)
    }
}

impl RectangleValue {
    /// Converts the percent rectangle to pixels, rounding half to even.
    pub fn to_pixels(&self, width: u32, height: u32) -> Rect {
        let (width, height) = (width as f64, height as f64);
        let scale = |extent: f64, percent: f64| (0.01 * extent * percent).round_ties_even() as i32;

        Rect::from_corners(
            scale(width, self.x),
            scale(height, self.y),
            scale(width, self.x + self.width),
            scale(height, self.y + self.height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(file_upload: &str) -> StudioTask {
        StudioTask {
            file_upload: file_upload.to_string(),
            annotations: Vec::new(),
        }
    }

    #[test]
    fn test_image_name() {
        assert_eq!(task("290eed43-page_1.png").image_name().ok(), Some("page_1"));
        assert_eq!(task("a-b-c.png").image_name().ok(), Some("b"));
        assert_eq!(task("a-b.c-d.png").image_name().ok(), Some("b"));
        assert!(matches!(
            task("page_1.png").image_name(),
            Err(BoxviewError::ImageName { .. })
        ));
    }

    #[test]
    fn test_deserialize_export() -> Result<(), Box<dyn std::error::Error>> {
        let tasks: Vec<StudioTask> = serde_json::from_str(
            r#"[{
                "id": 7,
                "file_upload": "290eed43-page_1.png",
                "annotations": [{
                    "id": 3,
                    "completed_by": 1,
                    "result": [{
                        "id": "r1",
                        "type": "rectanglelabels",
                        "original_width": 1000,
                        "value": {
                            "x": 10, "y": 20.5, "width": 30, "height": 4.25,
                            "rotation": 0,
                            "rectanglelabels": ["text"]
                        }
                    }]
                }]
            }]"#,
        )?;

        let results = tasks[0].results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "r1");
        assert_eq!(results[0].label(), Some("text"));
        assert_eq!(results[0].value.y, 20.5);
        Ok(())
    }

    #[test]
    fn test_results_without_annotations() {
        assert!(task("a-b.png").results().is_empty());
    }

    #[test]
    fn test_to_pixels() {
        let value = RectangleValue {
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 5.0,
            rectanglelabels: vec!["text".to_string()],
        };
        assert_eq!(value.to_pixels(1000, 800), Rect::from_corners(100, 160, 400, 200));

        // 0.01 * 50 * 5 = 2.5 rounds down to the even 2, 0.01 * 50 * 7 = 3.5 rounds up to 4
        let half = RectangleValue {
            x: 5.0,
            y: 7.0,
            width: 0.0,
            height: 0.0,
            rectanglelabels: Vec::new(),
        };
        assert_eq!(half.to_pixels(50, 50), Rect::from_corners(2, 4, 2, 4));
    }
}
