use glam::IVec2;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An axis-aligned rectangle in integer pixel coordinates.
///
/// `min` is the top-left corner and `max` the bottom-right corner of the
/// region, following image conventions (y grows downwards).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// The top-left corner.
    pub min: IVec2,
    /// The bottom-right corner.
    pub max: IVec2,
}

impl Rect {
    /// Creates a new rectangle from its top-left and bottom-right corners.
    ///
    /// # Example
    /// ```
    /// use glam::IVec2;
    /// use boxview_core::analysis::bbox::Rect;
    /// let rect = Rect::new(IVec2::new(0, 0), IVec2::new(10, 5));
    /// assert_eq!(rect.width(), 10);
    /// ```
    pub fn new(min: IVec2, max: IVec2) -> Self {
        Self { min, max }
    }

    /// Creates a rectangle from `x1, y1, x2, y2`.
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::new(IVec2::new(x1, y1), IVec2::new(x2, y2))
    }

    /// Creates a rectangle from its top-left corner and size.
    ///
    /// # Example
    /// ```
    /// use boxview_core::analysis::bbox::Rect;
    /// let rect = Rect::from_xywh(1, 2, 5, 3);
    /// // Creates a rect from (1,2) to (6,5)
    /// assert_eq!(rect.to_array(), [1, 2, 6, 5]);
    /// ```
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        let min = IVec2::new(x, y);
        Self::new(min, min + IVec2::new(width, height))
    }

    /// Horizontal extent, zero for inverted rectangles.
    pub fn width(&self) -> u32 {
        (self.max.x - self.min.x).max(0) as u32
    }

    /// Vertical extent, zero for inverted rectangles.
    pub fn height(&self) -> u32 {
        (self.max.y - self.min.y).max(0) as u32
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Whether the rectangle covers no pixel at all.
    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Clamps the rectangle into a `width x height` frame.
    ///
    /// Every coordinate is clamped into `[0, width] x [0, height]`, then the
    /// bottom-right corner is pulled up to the top-left one if the input was
    /// inverted, so the result always satisfies
    /// `0 <= x1 <= x2 <= width` and `0 <= y1 <= y2 <= height`.
    ///
    /// # Example
    /// ```
    /// use boxview_core::analysis::bbox::Rect;
    /// let rect = Rect::from_corners(-10, -10, 150, 150).clamp_to(100, 100);
    /// assert_eq!(rect, Rect::from_corners(0, 0, 100, 100));
    /// ```
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let bound = IVec2::new(
            width.min(i32::MAX as u32) as i32,
            height.min(i32::MAX as u32) as i32,
        );
        let min = self.min.clamp(IVec2::ZERO, bound);
        let max = self.max.clamp(IVec2::ZERO, bound).max(min);
        Self::new(min, max)
    }

    /// Whether the rectangle lies fully inside a `width x height` frame.
    pub fn fits_in(&self, width: u32, height: u32) -> bool {
        self.min.x >= 0
            && self.min.y >= 0
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
            && self.max.x as i64 <= width as i64
            && self.max.y as i64 <= height as i64
    }

    /// `[x1, y1, x2, y2]`, the layout used by every output format.
    pub fn to_array(&self) -> [i32; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }
}

impl From<[i32; 4]> for Rect {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self::from_corners(x1, y1, x2, y2)
    }
}

impl Serialize for Rect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Rect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <[i32; 4]>::deserialize(deserializer).map(Rect::from)
    }
}
