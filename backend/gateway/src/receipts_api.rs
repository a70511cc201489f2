//! Receipt field updates.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use serde_json::{json, Value};
use tracing::info;

use tabsplit_core::BillUpdate;

use crate::responses::ApiError;
use crate::server::AppState;

/// `PUT /api/receipts/:token/update`
///
/// Body is a partial update; an empty `{}` is rejected before any store
/// write is issued.
pub async fn update_receipt(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    headers: HeaderMap,
    Json(update): Json<BillUpdate>,
) -> Result<Json<Value>, ApiError> {
    state.check_rate_limit(&headers).await?;
    if update.is_empty() {
        return Err(ApiError::bad_request("NO_FIELDS", "update body has no fields"));
    }

    let bill = state.store.update(&token, update).await?;
    info!(token = %bill.token, "receipt updated");
    Ok(Json(json!({ "ok": true, "bill": bill })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use std::sync::Arc;

    use tabsplit_core::Bill;
    use tabsplit_store::CountingStore;

    use crate::test_support::state_with;

    #[tokio::test]
    async fn empty_update_is_rejected_before_any_write() {
        let store = CountingStore::new();
        let bill = Bill::new();
        let token = bill.token.clone();
        store.seed(bill).await;
        let state = state_with(Arc::new(store.clone()));

        let err = update_receipt(
            State(state),
            Path(token),
            HeaderMap::new(),
            Json(BillUpdate::default()),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "NO_FIELDS");
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn unknown_token_is_404() {
        let state = state_with(Arc::new(CountingStore::new()));
        let update = BillUpdate {
            tip: Some(2.0),
            ..Default::default()
        };

        let err = update_receipt(
            State(state),
            Path("missing".to_string()),
            HeaderMap::new(),
            Json(update),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "NOT_FOUND");
    }

    #[tokio::test]
    async fn partial_update_recomputes_total() {
        let store = CountingStore::new();
        let mut bill = Bill::new();
        bill.subtotal = 10.0;
        bill.total = 10.0;
        let token = bill.token.clone();
        store.seed(bill).await;
        let state = state_with(Arc::new(store));

        let update = BillUpdate {
            tip: Some(2.0),
            ..Default::default()
        };
        let Json(body) = update_receipt(State(state), Path(token), HeaderMap::new(), Json(update))
            .await
            .unwrap();

        assert_eq!(body["ok"], true);
        assert!((body["bill"]["total"].as_f64().unwrap() - 12.0).abs() < 1e-9);
    }
}
