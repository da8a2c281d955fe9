//! Bounding box geometry
//!
//! Axis-aligned box in frame pixel coordinates, origin at the top-left.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BBox {
    /// Create a new bounding box
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Calculate area of the bounding box
    pub fn area(&self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Whether the box lies entirely inside a `width` x `height` frame
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && i64::from(self.right()) <= i64::from(width)
            && i64::from(self.bottom()) <= i64::from(height)
    }

    /// Box of the given size sitting directly on top of this one,
    /// left-aligned.
    pub fn stacked_above(&self, width: i32, height: i32) -> BBox {
        BBox::new(self.x, self.y - height, width, height)
    }

    /// Clip to a `width` x `height` frame, `None` if nothing is left.
    pub fn clipped(&self, width: u32, height: u32) -> Option<BBox> {
        let max_x = i32::try_from(width).unwrap_or(i32::MAX);
        let max_y = i32::try_from(height).unwrap_or(i32::MAX);

        let x1 = self.x.clamp(0, max_x);
        let y1 = self.y.clamp(0, max_y);
        let x2 = self.right().clamp(0, max_x);
        let y2 = self.bottom().clamp(0, max_y);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(BBox::new(x1, y1, x2 - x1, y2 - y1))
    }
}
