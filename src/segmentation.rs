use image::{GrayImage, Luma, RgbImage};

/// Mask value for a candidate-item pixel
pub const MASK_ON: u8 = 255;
/// Mask value for a background (tray surface) pixel
pub const MASK_OFF: u8 = 0;

/// Convert one RGB pixel to HSV in float units:
/// hue in degrees 0..360, saturation and value in 0..1.
pub fn rgb_to_hsv_f32(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let rf = r as f32 / 255.0;
    let gf = g as f32 / 255.0;
    let bf = b as f32 / 255.0;

    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let value = max;
    let saturation = if max > 0.0 { delta / max } else { 0.0 };

    let mut hue = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    (hue, saturation, value)
}

/// Quantize HSV to the OpenCV 8-bit scale: h in 0..=179, s and v in 0..=255.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (h, s, v) = rgb_to_hsv_f32(r, g, b);

    // Hue is stored halved so it fits a byte; 360 wraps back to 0
    let h_u8 = ((h * 0.5).round() as u16 % 180) as u8;
    let s_u8 = (s * 255.0).round() as u8;
    let v_u8 = (v * 255.0).round() as u8;

    (h_u8, s_u8, v_u8)
}

/// Build the item mask for an RGB image.
///
/// A pixel belongs to the tray surface when its saturation is at most
/// `sat_max` and its value is at least `val_min`; hue is deliberately
/// unconstrained, the surface is discriminated by low saturation and
/// sufficient brightness alone. The item mask is the complement of the
/// tray mask. This is a heuristic: items that are themselves low-saturation
/// and bright will end up classified as background.
pub fn segment_items(image: &RgbImage, sat_max: u8, val_min: u8) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut mask = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let pixel = image.get_pixel(x, y);
            let (_h, s, v) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);

            let is_tray = s <= sat_max && v >= val_min;
            let mask_value = if is_tray { MASK_OFF } else { MASK_ON };
            mask.put_pixel(x, y, Luma([mask_value]));
        }
    }

    mask
}
