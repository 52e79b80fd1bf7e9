pub mod ocr;
pub mod vision;

pub use ocr::{OcrLanguages, TesseractOcr};
pub use vision::{VisionOcr, sniff_mime};
