use snafu::prelude::*;

use crate::{analysis::bbox::Rect, normalize::PayloadShape};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum BoxviewError {
    #[snafu(display("Decode `{}` payload error: {}", shape, message))]
    Decode {
        shape: PayloadShape,
        message: String,
    },
    #[snafu(display("Json `{}` error: {}", stage, source))]
    Json {
        source: serde_json::Error,
        stage: String,
    },
    #[snafu(display("Http request `{}` error: {}", stage, source))]
    Http {
        source: reqwest::Error,
        stage: String,
    },
    #[snafu(display("Ocr endpoint {} returned status {}", endpoint, status))]
    Status { status: u16, endpoint: String },
    #[snafu(display("Image Read `{}` error: {}", path, source))]
    ImageRead {
        source: image::ImageError,
        path: String,
    },
    #[snafu(display("Image Encode error: {}", source))]
    ImageEncode { source: image::ImageError },
    #[snafu(display("Image Write `{}` error: {}", path, source))]
    ImageWrite {
        source: image::ImageError,
        path: String,
    },
    #[snafu(display("Read `{}` error: {}", path, source))]
    IoRead {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Write `{}` error: {}", path, source))]
    IoWrite {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Load Font error: {}", source))]
    Font { source: ab_glyph::InvalidFont },
    #[snafu(display("Parse config `{}` error: {}", path, source))]
    ConfigParse {
        source: toml::de::Error,
        path: String,
    },
    #[snafu(display("No confidence values in detection set"))]
    EmptyDetections,
    #[snafu(display("Can not recover image name from upload `{}`", file_upload))]
    ImageName { file_upload: String },
    #[snafu(display("Crop {:?} is empty inside {}x{} image", rect, width, height))]
    EmptyCrop { rect: Rect, width: u32, height: u32 },
}
