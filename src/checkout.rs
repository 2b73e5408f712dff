use image::RgbImage;
use serde::Serialize;

use crate::classify::{prepare_classifier_input, Classifier};
use crate::detector::TrayDetector;
use crate::errors::Result;
use crate::pricing::PriceBook;

/// One priced, classified item on the tray
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReceiptLine {
    /// 1-based rank of the detection (1 = largest item)
    pub position: usize,
    pub item_name: String,
    pub price: u64,
    /// Classifier confidence in percent, rounded to two decimals
    pub confidence: f32,
}

/// Itemized result of one tray photo
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct Receipt {
    pub lines: Vec<ReceiptLine>,
    pub total_price: u64,
}

impl Receipt {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Glue between the detector, the label model and the price book.
///
/// All collaborators are borrowed; the checkout owns no state of its own and
/// a single instance may serve any number of calls.
pub struct Checkout<'a> {
    detector: &'a TrayDetector,
    classifier: &'a dyn Classifier,
    price_book: &'a PriceBook,
}

impl<'a> Checkout<'a> {
    pub fn new(
        detector: &'a TrayDetector,
        classifier: &'a dyn Classifier,
        price_book: &'a PriceBook,
    ) -> Self {
        Self {
            detector,
            classifier,
            price_book,
        }
    }

    /// Detect every item on the tray, classify and price each crop.
    ///
    /// An empty receipt means no items were detected; it is not an error.
    pub fn run(&self, image: &RgbImage) -> Result<Receipt> {
        let detections = self.detector.detect(image)?;

        let mut receipt = Receipt::default();
        for (index, detection) in detections.iter().enumerate() {
            let input = prepare_classifier_input(&detection.image);
            let classification = self.classifier.classify(&input)?;
            let entry = self.price_book.resolve(&classification.label);

            receipt.total_price += entry.price;
            receipt.lines.push(ReceiptLine {
                position: index + 1,
                item_name: entry.display_name,
                price: entry.price,
                confidence: (classification.confidence * 100.0).round() / 100.0,
            });
        }

        Ok(receipt)
    }
}
