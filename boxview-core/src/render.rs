use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_hollow_rect_mut, draw_text_mut},
    rect::Rect as DrawRect,
};
use snafu::ResultExt;
use tracing::*;

use crate::{
    config::RenderConfig,
    error::{BoxviewError, FontSnafu, IoReadSnafu},
    layout::element::NormalizedRegion,
};

/// What to draw for every region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOptions {
    /// 1 px outline through both corners of the box.
    pub boxes: bool,
    /// Recognized text next to the top-left corner.
    pub text: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            boxes: true,
            text: false,
        }
    }
}

pub struct Renderer {
    font: Option<FontVec>,
    config: RenderConfig,
}

impl Renderer {
    /// Creates a renderer, loading the overlay font when one is configured.
    pub fn new(config: &RenderConfig) -> Result<Self, BoxviewError> {
        let font = config
            .font_path
            .as_deref()
            .map(load_font)
            .transpose()?;

        Ok(Self {
            font,
            config: config.clone(),
        })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draws `regions` onto a copy of `image`.
    pub fn draw(
        &self,
        image: &DynamicImage,
        regions: &[NormalizedRegion],
        options: DrawOptions,
    ) -> RgbImage {
        let mut output_img = image.to_rgb8();

        let font = match (options.text, &self.font) {
            (true, None) => {
                warn!("text overlay requested but no font is configured, drawing boxes only");
                None
            }
            (true, Some(font)) => Some(font),
            (false, _) => None,
        };

        let box_color = Rgb(self.config.box_color);
        let text_color = Rgb(self.config.text_color);
        let font_scale = PxScale::from(self.config.text_size);
        let (offset_x, offset_y) = self.config.text_offset;

        for region in regions {
            let bbox = region.bbox;

            if options.boxes {
                // Both corners are inside the outline, so a zero-width or
                // zero-height box still shows up as a line or a dot.
                let rect = DrawRect::at(bbox.min.x, bbox.min.y)
                    .of_size(bbox.width() + 1, bbox.height() + 1);
                draw_hollow_rect_mut(&mut output_img, rect, box_color);
            }

            if let Some(font) = font {
                draw_text_mut(
                    &mut output_img,
                    text_color,
                    bbox.min.x.max(0) + offset_x,
                    bbox.min.y.max(0) + offset_y,
                    font_scale,
                    font,
                    &region.text,
                );
            }
        }

        output_img
    }
}

fn load_font(path: &Path) -> Result<FontVec, BoxviewError> {
    let data = std::fs::read(path).context(IoReadSnafu {
        path: path.to_string_lossy(),
    })?;
    let font = FontVec::try_from_vec(data).context(FontSnafu {})?;
    info!("loaded overlay font {}", path.display());
    Ok(font)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::analysis::bbox::Rect;

    fn region(bbox: Rect) -> NormalizedRegion {
        NormalizedRegion {
            text: "A".to_string(),
            bbox,
            confidence: Some(0.9),
        }
    }

    #[test]
    fn test_draw_outline_on_copy() -> Result<(), Box<dyn std::error::Error>> {
        let image = DynamicImage::new_rgb8(100, 100);
        let renderer = Renderer::new(&RenderConfig::default())?;

        let output = renderer.draw(
            &image,
            &[region(Rect::from_corners(5, 5, 50, 20))],
            DrawOptions::default(),
        );

        let green = Rgb([0, 255, 0]);
        assert_eq!(output.dimensions(), (100, 100));
        // Both corners belong to the outline
        assert_eq!(*output.get_pixel(5, 5), green);
        assert_eq!(*output.get_pixel(50, 5), green);
        assert_eq!(*output.get_pixel(5, 20), green);
        assert_eq!(*output.get_pixel(50, 20), green);
        assert_eq!(*output.get_pixel(20, 5), green);
        assert_eq!(*output.get_pixel(50, 12), green);
        // Unfilled inside, untouched outside
        assert_eq!(*output.get_pixel(20, 10), Rgb([0, 0, 0]));
        assert_eq!(*output.get_pixel(51, 20), Rgb([0, 0, 0]));
        assert_eq!(*output.get_pixel(60, 60), Rgb([0, 0, 0]));
        // Source image stays untouched
        assert_eq!(image.to_rgb8().get_pixel(5, 5), &Rgb([0, 0, 0]));
        Ok(())
    }

    #[test]
    fn test_draw_degenerate_boxes() -> Result<(), Box<dyn std::error::Error>> {
        let image = DynamicImage::new_rgb8(100, 100);
        let renderer = Renderer::new(&RenderConfig::default())?;
        let regions = [
            region(Rect::from_corners(5, 5, 50, 20)),
            region(Rect::from_corners(70, 10, 70, 40)),
            region(Rect::from_corners(80, 90, 95, 90)),
            region(Rect::from_corners(30, 60, 30, 60)),
        ];

        let output = renderer.draw(&image, &regions, DrawOptions::default());

        let green = Rgb([0, 255, 0]);
        let black = Rgb([0, 0, 0]);
        assert_eq!(*output.get_pixel(50, 20), green);
        // Zero width: vertical line
        assert_eq!(*output.get_pixel(70, 10), green);
        assert_eq!(*output.get_pixel(70, 20), green);
        assert_eq!(*output.get_pixel(70, 40), green);
        assert_eq!(*output.get_pixel(71, 20), black);
        // Zero height: horizontal line
        assert_eq!(*output.get_pixel(88, 90), green);
        assert_eq!(*output.get_pixel(88, 91), black);
        // Zero area: a single dot
        assert_eq!(*output.get_pixel(30, 60), green);
        assert_eq!(*output.get_pixel(31, 60), black);
        assert_eq!(*output.get_pixel(30, 61), black);
        Ok(())
    }

    #[test]
    fn test_draw_box_on_frame_edge() -> Result<(), Box<dyn std::error::Error>> {
        let image = DynamicImage::new_rgb8(20, 20);
        let renderer = Renderer::new(&RenderConfig::default())?;

        // Clamped to the right edge, x2 equals the image width
        let output = renderer.draw(
            &image,
            &[region(Rect::from_corners(10, 2, 20, 8))],
            DrawOptions::default(),
        );

        assert_eq!(output.dimensions(), (20, 20));
        assert_eq!(*output.get_pixel(10, 2), Rgb([0, 255, 0]));
        assert_eq!(*output.get_pixel(19, 8), Rgb([0, 255, 0]));
        Ok(())
    }

    #[test]
    fn test_draw_disabled_boxes() -> Result<(), Box<dyn std::error::Error>> {
        let image = DynamicImage::new_rgb8(20, 20);
        let renderer = Renderer::new(&RenderConfig::default())?;
        let regions = [
            region(Rect::from_corners(3, 3, 3, 10)),
            region(Rect::from_corners(2, 2, 8, 8)),
        ];

        let disabled = renderer.draw(
            &image,
            &regions,
            DrawOptions {
                boxes: false,
                text: false,
            },
        );
        assert!(disabled.pixels().all(|pixel| *pixel == Rgb([0, 0, 0])));
        Ok(())
    }

    #[test]
    fn test_text_without_font_draws_boxes_only() -> Result<(), Box<dyn std::error::Error>> {
        let image = DynamicImage::new_rgb8(30, 30);
        let renderer = Renderer::new(&RenderConfig::default())?;
        assert!(!renderer.has_font());

        let output = renderer.draw(
            &image,
            &[region(Rect::from_corners(10, 10, 20, 20))],
            DrawOptions {
                boxes: true,
                text: true,
            },
        );
        let red = Rgb([255, 0, 0]);
        assert!(output.pixels().all(|pixel| *pixel != red));
        assert_eq!(*output.get_pixel(10, 10), Rgb([0, 255, 0]));
        Ok(())
    }

    #[test]
    fn test_invalid_font_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(b"not a font")?;

        let config = RenderConfig {
            font_path: Some(temp_file.path().to_path_buf()),
            ..RenderConfig::default()
        };
        assert!(matches!(
            Renderer::new(&config),
            Err(BoxviewError::Font { .. })
        ));
        Ok(())
    }
}
