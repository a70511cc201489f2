//! Icon cache stores.
//!
//! The Supabase store delegates the at-most-one-generation invariant to a
//! reservation RPC; the in-memory store replaces it with a local in-flight
//! set, so two concurrent misses on one name still produce a single
//! generation.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use moka::sync::Cache;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use tabsplit_core::{IconLookup, IconStore};

/// Process-local icon store: a bounded cache plus an in-flight reservation set.
pub struct MemoryIconStore {
    icons: Cache<String, String>,
    in_flight: Mutex<HashSet<String>>,
}

impl MemoryIconStore {
    pub fn new(capacity: u64) -> Self {
        Self {
            icons: Cache::builder().max_capacity(capacity).build(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl IconStore for MemoryIconStore {
    async fn get_or_reserve(&self, normalized: &str, variants: &[String]) -> Result<IconLookup> {
        if let Some(url) = self.icons.get(normalized) {
            return Ok(IconLookup::Hit(url));
        }
        for variant in variants {
            if let Some(url) = self.icons.get(variant) {
                return Ok(IconLookup::Hit(url));
            }
        }

        let mut in_flight = self.in_flight.lock().unwrap();
        if in_flight.contains(normalized) {
            return Ok(IconLookup::InFlight);
        }
        in_flight.insert(normalized.to_string());
        Ok(IconLookup::Reserved)
    }

    async fn persist(&self, normalized: &str, url: &str) -> Result<()> {
        self.icons.insert(normalized.to_string(), url.to_string());
        self.in_flight.lock().unwrap().remove(normalized);
        Ok(())
    }

    async fn release(&self, normalized: &str) -> Result<()> {
        self.in_flight.lock().unwrap().remove(normalized);
        Ok(())
    }

    async fn fetch_many(&self, normalized: &[String]) -> Result<HashMap<String, String>> {
        Ok(normalized
            .iter()
            .filter_map(|name| self.icons.get(name).map(|url| (name.clone(), url)))
            .collect())
    }
}

/// Supabase-backed icon store.
///
/// `get_or_reserve` calls the `get_or_reserve_icon` stored procedure, which
/// atomically checks presence and, on miss, flags a generation in progress.
pub struct SupabaseIconStore {
    client: Client,
    base_url: String,
    service_key: String,
}

#[derive(Deserialize)]
struct ReserveReply {
    status: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct IconRow {
    name: String,
    url: String,
}

impl SupabaseIconStore {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }

    fn request(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn rpc(&self, name: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let resp = self
            .request(
                self.client
                    .post(format!("{}/rest/v1/rpc/{name}", self.base_url)),
            )
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!(
                "supabase rpc {name} failed ({}): {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            );
        }
        Ok(resp)
    }
}

#[async_trait]
impl IconStore for SupabaseIconStore {
    async fn get_or_reserve(&self, normalized: &str, variants: &[String]) -> Result<IconLookup> {
        let resp = self
            .rpc(
                "get_or_reserve_icon",
                serde_json::json!({ "name": normalized, "variants": variants }),
            )
            .await?;
        let reply: ReserveReply = resp.json().await?;
        debug!(name = normalized, status = %reply.status, "icon reservation");
        match (reply.status.as_str(), reply.url) {
            ("hit", Some(url)) => Ok(IconLookup::Hit(url)),
            ("reserved", _) => Ok(IconLookup::Reserved),
            ("in_flight", _) => Ok(IconLookup::InFlight),
            (other, _) => bail!("unexpected reservation status: {other}"),
        }
    }

    async fn persist(&self, normalized: &str, url: &str) -> Result<()> {
        let resp = self
            .request(
                self.client
                    .post(format!("{}/rest/v1/food_icons", self.base_url)),
            )
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&serde_json::json!({ "name": normalized, "url": url }))
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!(
                "supabase icon persist failed ({}): {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            );
        }
        Ok(())
    }

    async fn release(&self, normalized: &str) -> Result<()> {
        self.rpc(
            "release_icon_reservation",
            serde_json::json!({ "name": normalized }),
        )
        .await?;
        Ok(())
    }

    async fn fetch_many(&self, normalized: &[String]) -> Result<HashMap<String, String>> {
        if normalized.is_empty() {
            return Ok(HashMap::new());
        }
        let filter = format!("in.({})", normalized.join(","));
        let resp = self
            .request(
                self.client
                    .get(format!("{}/rest/v1/food_icons", self.base_url)),
            )
            .query(&[("select", "name,url"), ("name", filter.as_str())])
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!(
                "supabase icon fetch failed ({}): {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            );
        }
        let rows: Vec<IconRow> = resp.json().await?;
        Ok(rows.into_iter().map(|r| (r.name, r.url)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reserve_then_persist_then_hit() {
        let store = MemoryIconStore::new(16);
        let lookup = store.get_or_reserve("ramen", &[]).await.unwrap();
        assert_eq!(lookup, IconLookup::Reserved);

        store.persist("ramen", "https://icons/ramen.png").await.unwrap();
        let lookup = store.get_or_reserve("ramen", &[]).await.unwrap();
        assert_eq!(lookup, IconLookup::Hit("https://icons/ramen.png".into()));
    }

    #[tokio::test]
    async fn second_caller_sees_in_flight() {
        let store = MemoryIconStore::new(16);
        assert_eq!(store.get_or_reserve("pho", &[]).await.unwrap(), IconLookup::Reserved);
        assert_eq!(store.get_or_reserve("pho", &[]).await.unwrap(), IconLookup::InFlight);

        // Releasing without a result frees the name for a retry.
        store.release("pho").await.unwrap();
        assert_eq!(store.get_or_reserve("pho", &[]).await.unwrap(), IconLookup::Reserved);
    }

    #[tokio::test]
    async fn variant_hit_is_a_hit() {
        let store = MemoryIconStore::new(16);
        assert_eq!(store.get_or_reserve("dumpling", &[]).await.unwrap(), IconLookup::Reserved);
        store.persist("dumpling", "https://icons/d.png").await.unwrap();

        let lookup = store
            .get_or_reserve("dumplings", &["dumpling".to_string()])
            .await
            .unwrap();
        assert_eq!(lookup, IconLookup::Hit("https://icons/d.png".into()));
    }

    #[tokio::test]
    async fn fetch_many_returns_only_found() {
        let store = MemoryIconStore::new(16);
        let _ = store.get_or_reserve("tea", &[]).await.unwrap();
        store.persist("tea", "https://icons/tea.png").await.unwrap();

        let found = store
            .fetch_many(&["tea".to_string(), "coffee".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["tea"], "https://icons/tea.png");
    }
}
