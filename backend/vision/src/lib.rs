//! Receipt OCR pipeline.
//!
//! One image in, one normalized receipt out: data-URL encode, a single
//! chat-completion call to a vision model, JSON fished out of the free-text
//! reply, optional fields defaulted. A small content-hash cache dedupes
//! identical re-uploads so the provider is not billed twice.

pub mod cache;
pub mod hash;
pub mod provider;
pub mod scan;

pub use cache::ScanCache;
pub use hash::image_hash;
pub use provider::OpenAiVision;
pub use scan::{Scanner, RECEIPT_PROMPT};
