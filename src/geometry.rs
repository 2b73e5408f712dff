/// Axis-aligned bounding box in pixel coordinates, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the rightmost column
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the bottom row
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when `other` lies entirely inside this box
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }
}

/// Expand a bounding box by `pad` pixels on every side, clamped to the image.
///
/// Near an edge the padding degrades to asymmetric; the result never leaves
/// `[0, image_width) x [0, image_height)` and always contains the input box.
pub fn pad_and_clamp(
    bbox: &BoundingBox,
    pad: u32,
    image_width: u32,
    image_height: u32,
) -> BoundingBox {
    let x = bbox.x.saturating_sub(pad);
    let y = bbox.y.saturating_sub(pad);
    let right = (bbox.right() + pad).min(image_width);
    let bottom = (bbox.bottom() + pad).min(image_height);

    BoundingBox {
        x,
        y,
        width: right.saturating_sub(x),
        height: bottom.saturating_sub(y),
    }
}
