use image::RgbImage;

use crate::errors::Result;

/// Square edge length the label model expects its inputs scaled to
pub const CLASSIFIER_INPUT_SIZE: u32 = 128;

/// Result of classifying one cropped item
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Raw model label, resolved to a display name via the price book
    pub label: String,
    /// Confidence in percent, 0..=100
    pub confidence: f32,
}

/// Label model for cropped items.
///
/// The actual model is an external black box; implementations wrap whatever
/// inference backend is deployed. Tests substitute a fake.
pub trait Classifier: Send + Sync {
    fn classify(&self, image: &RgbImage) -> Result<Classification>;
}

/// Scale a crop to the square input size the model was trained on
pub fn prepare_classifier_input(image: &RgbImage) -> RgbImage {
    image::imageops::resize(
        image,
        CLASSIFIER_INPUT_SIZE,
        CLASSIFIER_INPUT_SIZE,
        image::imageops::FilterType::Triangle,
    )
}
