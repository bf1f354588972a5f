pub mod analysis;
pub mod client;
pub mod config;
pub mod consts;
pub mod dataset;
pub mod error;
pub mod layout;
pub mod normalize;
pub mod recognize;
pub mod render;
pub mod visualize;

// Re-export commonly used types
pub use analysis::bbox::Rect;
pub use client::{OcrBackend, OcrClient, Upload};
pub use config::{AppConfig, OcrConfig, RenderConfig};
pub use error::BoxviewError;
pub use layout::element::{Normalized, NormalizedRegion};
pub use normalize::{PayloadShape, average_confidence, normalize};
pub use recognize::crop_and_recognize;
pub use render::{DrawOptions, Renderer};
