use serde::{Deserialize, Serialize};

/// Axis-aligned face box in frame pixel coordinates, as reported by the
/// detector.
///
/// `right >= left` and `bottom >= top` are expected but not checked; the
/// detector is trusted and out-of-frame or negative values pass through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// `(left + right / 2, top + bottom / 2)`.
    ///
    /// Not the geometric center: only the far edge is halved. Association
    /// thresholds were tuned against this value, so it stays the default.
    pub fn biased_midpoint(&self) -> (f64, f64) {
        (
            self.left as f64 + self.right as f64 / 2.0,
            self.top as f64 + self.bottom as f64 / 2.0,
        )
    }

    /// `((left + right) / 2, (top + bottom) / 2)`.
    pub fn geometric_midpoint(&self) -> (f64, f64) {
        (
            (self.left as f64 + self.right as f64) / 2.0,
            (self.top as f64 + self.bottom as f64) / 2.0,
        )
    }
}

impl From<[i32; 4]> for BoundingBox {
    fn from([left, top, right, bottom]: [i32; 4]) -> Self {
        Self::new(left, top, right, bottom)
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.left, b.top, b.right, b.bottom]
    }
}
