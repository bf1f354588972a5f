/// Default markup-extraction endpoint.
///
/// The service answers with `{"data": "<html ...>"}` where every detected
/// cell or paragraph carries `x`, `y`, `w`, `h` attributes.
pub const DEFAULT_OCR_ENDPOINT: &str = "http://127.0.0.1:9230/ocr/gilocr/image_extract?key=dmp";

/// Request timeout for one OCR call, in milliseconds (3000 s).
///
/// Recognition of a full page can take minutes on a busy backend, so the
/// client effectively waits until the service answers.
pub const DEFAULT_TIMEOUT_MS: u64 = 3_000_000;

/// Multipart field name the OCR service reads the upload from.
pub const UPLOAD_FIELD_NAME: &str = "file";

/// File name and mime type used when uploading an encoded crop.
pub const CROP_FILE_NAME: &str = "image.png";
pub const CROP_MIME: &str = "image/png";

/// Annotation labels whose regions never reach the dataset.
///
/// Tables, formulas and pictures are handled by dedicated pipelines; the
/// dataset only keeps free-text regions.
pub const DEFAULT_SKIP_LABELS: [&str; 15] = [
    "table",
    "wireless",
    "formula",
    "image",
    "head_image",
    "foot_image",
    "有线表",
    "缺线表",
    "独立公式",
    "行内内嵌公式",
    "图片",
    "图表",
    "分子结构图",
    "页脚图片",
    "页眉图片",
];

/// Placeholder text for detections without any recognized content.
pub const NULL_TEXT: &str = "NULL";

/// Textual form of a missing value in upstream payloads.
pub const NONE_TEXT: &str = "None";

/// Tags recognized in markup payloads, in output order.
pub const MARKUP_TAGS: [&str; 2] = ["td", "p"];

/// Outline color, RGB.
pub const BOX_COLOR: [u8; 3] = [0, 255, 0];

/// Overlay text color, RGB.
pub const TEXT_COLOR: [u8; 3] = [255, 0, 0];

/// Overlay text size in pixels.
pub const TEXT_SIZE: f32 = 13.0;

/// Overlay text offset relative to the clamped top-left corner.
pub const TEXT_OFFSET: (i32, i32) = (-10, -5);

/// Decimal digits used when displaying confidences of flat payloads.
pub const FLAT_CONFIDENCE_PRECISION: usize = 4;

/// Decimal digits used when displaying confidences of nested payloads.
pub const NESTED_CONFIDENCE_PRECISION: usize = 2;

/// Extensions the batch visualizer leaves alone.
pub const SKIPPED_EXTENSIONS: [&str; 2] = ["cach", "txt"];

/// Extension of the page images referenced by annotation exports.
pub const DATASET_IMAGE_EXTENSION: &str = "png";

pub const OCR_ENDPOINT_ENV_NAME: &str = "BOXVIEW_OCR_ENDPOINT";
pub const OCR_TIMEOUT_ENV_NAME: &str = "BOXVIEW_OCR_TIMEOUT_MS";
pub const FONT_PATH_ENV_NAME: &str = "BOXVIEW_FONT_PATH";
