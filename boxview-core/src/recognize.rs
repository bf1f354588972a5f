use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use snafu::{ResultExt, ensure};
use tracing::*;

use crate::{
    analysis::bbox::Rect,
    client::{OcrBackend, Upload},
    consts::{CROP_FILE_NAME, CROP_MIME},
    error::{BoxviewError, EmptyCropSnafu, ImageEncodeSnafu},
    normalize::{PayloadShape, normalize},
};

/// Recognizes the text inside `rect`.
///
/// The crop is uploaded as a standalone PNG, the markup response is
/// normalized against the crop's own size and the texts are joined with
/// newlines. Any failure is logged and yields `None`.
pub fn crop_and_recognize<B: OcrBackend + ?Sized>(
    backend: &B,
    image: &DynamicImage,
    rect: Rect,
) -> Option<String> {
    match try_crop_and_recognize(backend, image, rect) {
        Ok(text) => Some(text),
        Err(err) => {
            warn!("recognize region {:?} failed: {}", rect.to_array(), err);
            None
        }
    }
}

fn try_crop_and_recognize<B: OcrBackend + ?Sized>(
    backend: &B,
    image: &DynamicImage,
    rect: Rect,
) -> Result<String, BoxviewError> {
    let crop = crop(image, rect)?;
    let upload = Upload::new(CROP_FILE_NAME, encode_png(&crop)?).with_mime(CROP_MIME);

    let payload = backend.recognize(upload)?;
    let normalized = normalize(&payload, PayloadShape::Markup, crop.width(), crop.height())?;
    debug!(
        "region {:?}: {} texts, {} skipped",
        rect.to_array(),
        normalized.regions.len(),
        normalized.skipped
    );

    Ok(normalized.texts().collect::<Vec<_>>().join("\n"))
}

/// Cuts `rect` out of `image`, clamped to the image bounds.
pub fn crop(image: &DynamicImage, rect: Rect) -> Result<DynamicImage, BoxviewError> {
    let (width, height) = (image.width(), image.height());
    let clamped = rect.clamp_to(width, height);
    ensure!(
        !clamped.is_empty(),
        EmptyCropSnafu {
            rect,
            width,
            height
        }
    );

    Ok(image.crop_imm(
        clamped.min.x as u32,
        clamped.min.y as u32,
        clamped.width(),
        clamped.height(),
    ))
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, BoxviewError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .context(ImageEncodeSnafu {})?;
    Ok(buffer.into_inner())
}
