//! Bill persistence backends.
//!
//! The hosted database (Supabase/PostgREST) owns real persistence; the
//! in-memory store stands in for it when no credentials are configured and
//! in tests.

pub mod memory;
pub mod supabase;

pub use memory::{CountingStore, MemoryBillStore};
pub use supabase::SupabaseBillStore;
