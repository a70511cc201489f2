use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use tabsplit_core::{Bill, BillStore, BillUpdate, SplitError};

/// In-memory bill store.
///
/// A handful of rows behind an `RwLock`, with no eviction or indexing. Used
/// when the hosted database is not configured, and in tests.
#[derive(Clone, Default)]
pub struct MemoryBillStore {
    bills: Arc<RwLock<HashMap<String, Bill>>>,
}

impl MemoryBillStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn apply_update(bill: &mut Bill, update: BillUpdate) {
    let recompute = update.touches_money();
    if let Some(title) = update.title {
        bill.title = Some(title);
    }
    if let Some(place) = update.place {
        bill.place = Some(place);
    }
    if let Some(date) = update.date {
        bill.date = Some(date);
    }
    if let Some(subtotal) = update.subtotal {
        bill.subtotal = subtotal;
    }
    if let Some(tax) = update.sales_tax {
        bill.sales_tax = tax;
    }
    if let Some(tip) = update.tip {
        bill.tip = tip;
    }
    if recompute {
        bill.total = bill.subtotal + bill.sales_tax + bill.tip;
    }
}

#[async_trait]
impl BillStore for MemoryBillStore {
    async fn list(&self) -> Result<Vec<Bill>, SplitError> {
        let bills = self.bills.read().unwrap();
        let mut all: Vec<Bill> = bills.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn get(&self, token: &str) -> Result<Option<Bill>, SplitError> {
        Ok(self.bills.read().unwrap().get(token).cloned())
    }

    async fn insert(&self, bill: Bill) -> Result<(), SplitError> {
        self.bills.write().unwrap().insert(bill.token.clone(), bill);
        Ok(())
    }

    async fn update(&self, token: &str, update: BillUpdate) -> Result<Bill, SplitError> {
        let mut bills = self.bills.write().unwrap();
        let bill = bills
            .get_mut(token)
            .ok_or_else(|| SplitError::NotFound(format!("bill {token}")))?;
        apply_update(bill, update);
        Ok(bill.clone())
    }

    async fn delete(&self, token: &str) -> Result<(), SplitError> {
        let mut bills = self.bills.write().unwrap();
        bills
            .remove(token)
            .map(|_| ())
            .ok_or_else(|| SplitError::NotFound(format!("bill {token}")))
    }
}

/// Call-counting wrapper around [`MemoryBillStore`], used in handler tests to
/// assert that validation failures never reach the store.
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: MemoryBillStore,
    writes: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of update/delete/insert calls that reached the store.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn seed(&self, bill: Bill) {
        // Seeding is test setup, not a counted write.
        let _ = self.inner.insert(bill).await;
    }
}

#[async_trait]
impl BillStore for CountingStore {
    async fn list(&self) -> Result<Vec<Bill>, SplitError> {
        self.inner.list().await
    }

    async fn get(&self, token: &str) -> Result<Option<Bill>, SplitError> {
        self.inner.get(token).await
    }

    async fn insert(&self, bill: Bill) -> Result<(), SplitError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(bill).await
    }

    async fn update(&self, token: &str, update: BillUpdate) -> Result<Bill, SplitError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update(token, update).await
    }

    async fn delete(&self, token: &str) -> Result<(), SplitError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bill(title: &str) -> Bill {
        let mut b = Bill::new();
        b.title = Some(title.to_string());
        b.subtotal = 10.0;
        b.total = 10.0;
        b
    }

    #[tokio::test]
    async fn insert_get_delete_roundtrip() {
        let store = MemoryBillStore::new();
        let b = bill("dinner");
        let token = b.token.clone();

        store.insert(b).await.unwrap();
        assert!(store.get(&token).await.unwrap().is_some());

        store.delete(&token).await.unwrap();
        assert!(store.get(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_unknown_token_is_not_found() {
        let store = MemoryBillStore::new();
        let err = store.delete("nope").await.unwrap_err();
        assert!(matches!(err, SplitError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_unknown_token_is_not_found() {
        let store = MemoryBillStore::new();
        let err = store
            .update("nope", BillUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SplitError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_recomputes_total_when_money_changes() {
        let store = MemoryBillStore::new();
        let b = bill("dinner");
        let token = b.token.clone();
        store.insert(b).await.unwrap();

        let updated = store
            .update(
                &token,
                BillUpdate {
                    tip: Some(2.5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!((updated.total - 12.5).abs() < 1e-9);

        // A title-only update leaves total alone.
        let updated = store
            .update(
                &token,
                BillUpdate {
                    title: Some("brunch".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!((updated.total - 12.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryBillStore::new();
        let mut first = bill("first");
        first.created_at = chrono::Utc::now() - chrono::Duration::seconds(60);
        let second = bill("second");

        store.insert(first).await.unwrap();
        store.insert(second).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all[0].title.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn counting_store_counts_writes_only() {
        let store = CountingStore::new();
        store.seed(bill("seeded")).await;
        assert_eq!(store.write_count(), 0);

        let _ = store.delete("missing").await;
        assert_eq!(store.write_count(), 1);
        let _ = store.list().await;
        assert_eq!(store.write_count(), 1);
    }
}
