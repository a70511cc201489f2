//! Food icon lookup and generation.
//!
//! Every distinct food name gets one generated icon, cached under its
//! normalized form. The at-most-one-generation-per-name invariant is held by
//! the store: remotely by the reservation RPC, locally by per-key
//! single-flight. Generation failure is never a hard error: callers get an
//! empty string and fall back to a default glyph.

pub mod generate;
pub mod normalize;
pub mod service;
pub mod store;

pub use generate::OpenAiImages;
pub use normalize::{name_variants, normalize};
pub use service::IconService;
pub use store::{MemoryIconStore, SupabaseIconStore};
