//! Scan pipeline: image bytes to a normalized receipt.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use tabsplit_core::{ReceiptReader, ScannedReceipt, SplitError};

use crate::cache::ScanCache;
use crate::hash::image_hash;

/// Fixed instruction sent with every receipt image.
pub const RECEIPT_PROMPT: &str = "You are a receipt parser. Extract the restaurant receipt in \
this image and reply with STRICT JSON only, no prose, no code fences, matching exactly: \
{\"place\": string|null, \"date\": string|null, \"items\": [{\"label\": string, \"price\": \
number, \"quantity\": number}], \"subtotal\": number, \"tax\": number, \"tip\": number, \
\"total\": number}. Prices are line totals. Use null for anything you cannot read.";

/// First brace-delimited object in the reply. Models wrap JSON in prose or
/// code fences despite the instruction.
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Pull the receipt JSON out of a free-text model reply.
///
/// No schema validation beyond optional-field defaulting: absent fields
/// become `None`/empty/zero via the serde defaults on [`ScannedReceipt`].
pub fn parse_receipt(reply: &str) -> Result<ScannedReceipt, SplitError> {
    let raw = JSON_OBJECT
        .find(reply)
        .ok_or_else(|| SplitError::Provider {
            provider: "vision".into(),
            message: "no JSON object in model reply".into(),
        })?
        .as_str();
    serde_json::from_str(raw).map_err(|e| SplitError::Provider {
        provider: "vision".into(),
        message: format!("unparseable receipt JSON: {e}"),
    })
}

/// The OCR front door: reader + dedupe cache + wall-clock budget.
pub struct Scanner {
    reader: Arc<dyn ReceiptReader>,
    cache: ScanCache,
    timeout: Duration,
}

impl Scanner {
    pub fn new(reader: Arc<dyn ReceiptReader>, cache: ScanCache, timeout: Duration) -> Self {
        Self {
            reader,
            cache,
            timeout,
        }
    }

    /// Scan a receipt image, preferring a cached result for identical bytes.
    pub async fn scan(&self, image: &[u8], mime: &str) -> Result<ScannedReceipt, SplitError> {
        let key = image_hash(image);
        if let Some(hit) = self.cache.get(key) {
            debug!(key, scanned_at = %hit.scanned_at, "scan cache hit");
            return Ok(hit.receipt);
        }

        let call = self.reader.read_receipt(image, mime, RECEIPT_PROMPT);
        let reply = match tokio::time::timeout(self.timeout, call).await {
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "receipt scan timed out");
                return Err(SplitError::Timeout(format!(
                    "receipt scan exceeded {}ms",
                    self.timeout.as_millis()
                )));
            }
            Ok(Err(e)) => {
                return Err(SplitError::Provider {
                    provider: self.reader.name().to_string(),
                    message: e.to_string(),
                })
            }
            Ok(Ok(reply)) => reply,
        };

        let receipt = parse_receipt(&reply)?;
        self.cache.insert(key, receipt.clone());
        Ok(receipt)
    }
}
