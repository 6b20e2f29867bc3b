//! Thin vendor adapters behind capability traits.
//!
//! Each adapter is one outbound call with no internal state: speech
//! recognition, document OCR, and speech synthesis. The traits exist so
//! the HTTP layer and the coaching core can be exercised against stubs.

pub mod ocr;
pub mod speech;
pub mod tts;
