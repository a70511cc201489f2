//! Icon lookup front door.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use tabsplit_core::{IconGenerator, IconLookup, IconStore};

use crate::normalize::{name_variants, normalize};

/// Delay between generation calls when pregenerating a list. An open-loop
/// throttle for the image provider's rate limit, nothing smarter.
const PREGENERATE_DELAY: Duration = Duration::from_secs(2);

/// Cache-first icon lookup with on-demand generation.
pub struct IconService {
    store: Arc<dyn IconStore>,
    generator: Arc<dyn IconGenerator>,
}

impl IconService {
    pub fn new(store: Arc<dyn IconStore>, generator: Arc<dyn IconGenerator>) -> Self {
        Self { store, generator }
    }

    /// Icon URL for a raw food name.
    ///
    /// Never a hard error: any failure along the way degrades to an empty
    /// string, which tells the caller to fall back to a default glyph.
    pub async fn icon_for(&self, raw_name: &str) -> String {
        let (url, _) = self.resolve(raw_name).await;
        url
    }

    /// Batch lookup. Returns only the names that were found, keyed by their
    /// normalized form; misses are silently dropped.
    pub async fn icons_for(&self, raw_names: &[String]) -> HashMap<String, String> {
        let mut normalized: Vec<String> = raw_names
            .iter()
            .map(|n| normalize(n))
            .filter(|n| !n.is_empty())
            .collect();
        normalized.sort();
        normalized.dedup();

        match self.store.fetch_many(&normalized).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "batch icon lookup failed");
                HashMap::new()
            }
        }
    }

    /// Walk a list of names sequentially, generating missing icons with a
    /// fixed delay between generation calls.
    pub async fn pregenerate(&self, raw_names: &[String]) {
        for name in raw_names {
            let (_, generated) = self.resolve(name).await;
            if generated {
                tokio::time::sleep(PREGENERATE_DELAY).await;
            }
        }
    }

    /// Returns the URL (possibly empty) and whether a generation call was made.
    async fn resolve(&self, raw_name: &str) -> (String, bool) {
        let name = normalize(raw_name);
        if name.is_empty() {
            return (String::new(), false);
        }
        let variants = name_variants(&name);

        let lookup = match self.store.get_or_reserve(&name, &variants).await {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!(name = %name, error = %e, "icon reservation failed");
                return (String::new(), false);
            }
        };

        match lookup {
            IconLookup::Hit(url) => {
                debug!(name = %name, "icon cache hit");
                (url, false)
            }
            IconLookup::InFlight => {
                // Another caller owns the generation slot; show the fallback
                // glyph this time around.
                debug!(name = %name, "icon generation already in flight");
                (String::new(), false)
            }
            IconLookup::Reserved => match self.generator.generate(&name).await {
                Ok(url) => {
                    if let Err(e) = self.store.persist(&name, &url).await {
                        // The caller still gets the fresh URL; only the cache
                        // write is lost.
                        warn!(name = %name, error = %e, "icon persist failed");
                    }
                    (url, true)
                }
                Err(e) => {
                    warn!(name = %name, error = %e, "icon generation failed");
                    if let Err(e) = self.store.release(&name).await {
                        warn!(name = %name, error = %e, "reservation release failed");
                    }
                    (String::new(), true)
                }
            },
        }
    }
}
