//! Supabase-backed bill store.
//!
//! Plain PostgREST calls over HTTP. Transactions, conflicts, and concurrent
//! writers are the remote side's problem; errors come back as
//! [`SplitError::Storage`] with the provider's message attached and are never
//! retried here.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use tabsplit_core::{Bill, BillStore, BillUpdate, SplitError};

pub struct SupabaseBillStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseBillStore {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }

    fn bills_url(&self) -> String {
        format!("{}/rest/v1/bills", self.base_url)
    }

    fn request(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn rows_from(resp: reqwest::Response) -> Result<Vec<Bill>, SplitError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SplitError::Storage(e.to_string()))?;
        if !status.is_success() {
            return Err(SplitError::Storage(format!("supabase {status}: {body}")));
        }
        serde_json::from_str(&body).map_err(|e| SplitError::Storage(e.to_string()))
    }
}

#[async_trait]
impl BillStore for SupabaseBillStore {
    async fn list(&self) -> Result<Vec<Bill>, SplitError> {
        let resp = self
            .request(self.client.get(self.bills_url()))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await
            .map_err(|e| SplitError::Storage(e.to_string()))?;
        Self::rows_from(resp).await
    }

    async fn get(&self, token: &str) -> Result<Option<Bill>, SplitError> {
        let filter = format!("eq.{token}");
        let resp = self
            .request(self.client.get(self.bills_url()))
            .query(&[("select", "*"), ("token", filter.as_str())])
            .send()
            .await
            .map_err(|e| SplitError::Storage(e.to_string()))?;
        Ok(Self::rows_from(resp).await?.into_iter().next())
    }

    async fn insert(&self, bill: Bill) -> Result<(), SplitError> {
        debug!(token = %bill.token, "inserting bill row");
        let resp = self
            .request(self.client.post(self.bills_url()))
            .header("Prefer", "return=minimal")
            .json(&bill)
            .send()
            .await
            .map_err(|e| SplitError::Storage(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SplitError::Storage(format!("supabase {status}: {body}")));
        }
        Ok(())
    }

    async fn update(&self, token: &str, update: BillUpdate) -> Result<Bill, SplitError> {
        // Fetch first so the recomputed total can be sent along with the patch.
        let current = self
            .get(token)
            .await?
            .ok_or_else(|| SplitError::NotFound(format!("bill {token}")))?;

        let mut patch = serde_json::Map::new();
        if let Some(ref v) = update.title {
            patch.insert("title".into(), v.clone().into());
        }
        if let Some(ref v) = update.place {
            patch.insert("place".into(), v.clone().into());
        }
        if let Some(ref v) = update.date {
            patch.insert("date".into(), v.clone().into());
        }
        if let Some(v) = update.subtotal {
            patch.insert("subtotal".into(), v.into());
        }
        if let Some(v) = update.sales_tax {
            patch.insert("sales_tax".into(), v.into());
        }
        if let Some(v) = update.tip {
            patch.insert("tip".into(), v.into());
        }
        if update.touches_money() {
            let total = update.subtotal.unwrap_or(current.subtotal)
                + update.sales_tax.unwrap_or(current.sales_tax)
                + update.tip.unwrap_or(current.tip);
            patch.insert("total".into(), total.into());
        }

        let resp = self
            .request(self.client.patch(self.bills_url()))
            .query(&[("token", &format!("eq.{token}"))])
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(|e| SplitError::Storage(e.to_string()))?;
        Self::rows_from(resp)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SplitError::NotFound(format!("bill {token}")))
    }

    async fn delete(&self, token: &str) -> Result<(), SplitError> {
        let resp = self
            .request(self.client.delete(self.bills_url()))
            .query(&[("token", &format!("eq.{token}"))])
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| SplitError::Storage(e.to_string()))?;
        let deleted = Self::rows_from(resp).await?;
        if deleted.is_empty() {
            return Err(SplitError::NotFound(format!("bill {token}")));
        }
        Ok(())
    }
}
