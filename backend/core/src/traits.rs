use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::SplitError;
use crate::types::{Bill, BillUpdate};

/// Reads raw text off a receipt image via an external vision model.
///
/// Implementations return the model's free-text reply; JSON extraction and
/// normalization happen in the scan pipeline, not here.
#[async_trait]
pub trait ReceiptReader: Send + Sync {
    /// Provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send one image and an instruction to the vision model and return its
    /// text response.
    async fn read_receipt(&self, image: &[u8], mime: &str, prompt: &str) -> Result<String>;
}

/// Generates an icon image for a normalized food name, returning a hosted URL.
#[async_trait]
pub trait IconGenerator: Send + Sync {
    async fn generate(&self, normalized_name: &str) -> Result<String>;
}

/// Outcome of an atomic icon-cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconLookup {
    /// Cached URL for this name.
    Hit(String),
    /// Miss; this caller now holds the generation slot for the name.
    Reserved,
    /// Miss, but another caller is already generating this name.
    InFlight,
}

/// Icon cache storage with an atomic get-or-reserve operation.
///
/// The at-most-one-generation-per-name invariant lives behind this trait:
/// the remote implementation delegates it to a stored procedure, the local
/// one to a per-key single-flight guard.
#[async_trait]
pub trait IconStore: Send + Sync {
    /// Atomically look up `normalized` (and its `variants`); on miss, mark a
    /// generation in progress and return [`IconLookup::Reserved`].
    async fn get_or_reserve(&self, normalized: &str, variants: &[String]) -> Result<IconLookup>;

    /// Persist a freshly generated URL and release the reservation.
    async fn persist(&self, normalized: &str, url: &str) -> Result<()>;

    /// Release a reservation without a result, after a failed generation,
    /// so the name can be retried later.
    async fn release(&self, normalized: &str) -> Result<()>;

    /// Batch lookup. Returns only the names that were found; misses are
    /// silently dropped.
    async fn fetch_many(&self, normalized: &[String]) -> Result<HashMap<String, String>>;
}

/// Bill persistence. Concurrency and conflict resolution are the backing
/// service's problem; this interface is plain CRUD by token.
#[async_trait]
pub trait BillStore: Send + Sync {
    /// All bills, newest first.
    async fn list(&self) -> Result<Vec<Bill>, SplitError>;

    async fn get(&self, token: &str) -> Result<Option<Bill>, SplitError>;

    async fn insert(&self, bill: Bill) -> Result<(), SplitError>;

    /// Apply a partial update. `NotFound` on unknown token.
    async fn update(&self, token: &str, update: BillUpdate) -> Result<Bill, SplitError>;

    /// `NotFound` on unknown token.
    async fn delete(&self, token: &str) -> Result<(), SplitError>;
}
