//! Bill CRUD and split-total handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use tabsplit_core::{person_totals, Bill, BillItem, ItemShare, Person};
use tabsplit_icons::normalize;

use crate::responses::ApiError;
use crate::server::AppState;

/// `GET /api/bills/list`
pub async fn list_bills(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let bills = state.store.list().await?;
    Ok(Json(json!({ "ok": true, "bills": bills })))
}

#[derive(Deserialize)]
pub struct DeleteParams {
    token: Option<String>,
}

/// `DELETE /api/bills/delete?token=`
pub async fn delete_bill(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, ApiError> {
    state.check_rate_limit(&headers).await?;
    let token = match params.token.as_deref() {
        Some(t) if !t.is_empty() => t,
        _ => return Err(ApiError::bad_request("MISSING_TOKEN", "token query parameter is required")),
    };

    state.store.delete(token).await?;
    info!(token, "bill deleted");
    Ok(Json(json!({ "ok": true, "message": "bill deleted" })))
}

#[derive(Deserialize)]
pub struct NewItem {
    pub label: String,
    pub price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
pub struct CreateBillRequest {
    pub title: Option<String>,
    pub place: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub items: Vec<NewItem>,
    pub subtotal: Option<f64>,
    pub sales_tax: Option<f64>,
    pub tip: Option<f64>,
}

/// `POST /api/bills/create`: manual entry, no scan involved.
pub async fn create_bill(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateBillRequest>,
) -> Result<Json<Value>, ApiError> {
    state.check_rate_limit(&headers).await?;
    if req.items.is_empty() && req.title.is_none() {
        return Err(ApiError::bad_request(
            "INVALID_BODY",
            "a bill needs a title or at least one item",
        ));
    }

    let mut bill = Bill::new();
    bill.title = req.title;
    bill.place = req.place;
    bill.date = req.date;
    bill.items = req
        .items
        .into_iter()
        .map(|i| BillItem::new(i.label, i.price, i.quantity))
        .collect();
    bill.subtotal = req
        .subtotal
        .unwrap_or_else(|| bill.items.iter().map(|i| i.price).sum());
    bill.sales_tax = req.sales_tax.unwrap_or(0.0);
    bill.tip = req.tip.unwrap_or(0.0);
    bill.total = bill.subtotal + bill.sales_tax + bill.tip;

    attach_icons(&state, &mut bill).await;

    state.store.insert(bill.clone()).await?;
    info!(token = %bill.token, items = bill.items.len(), "bill created");
    Ok(Json(json!({ "ok": true, "bill": bill })))
}

/// Fill in cached icons for item labels. Best-effort: misses and a missing
/// icon service both leave the icon unset.
pub(crate) async fn attach_icons(state: &AppState, bill: &mut Bill) {
    let Some(icons) = &state.icons else {
        return;
    };
    let labels: Vec<String> = bill.items.iter().map(|i| i.label.clone()).collect();
    let found = icons.icons_for(&labels).await;
    if found.is_empty() {
        return;
    }
    for item in &mut bill.items {
        if let Some(url) = found.get(&normalize(&item.label)) {
            item.icon = Some(url.clone());
        }
    }
}

#[derive(Deserialize)]
pub struct SplitRequest {
    pub bill_token: String,
    pub people: Vec<Person>,
    pub shares: Vec<ItemShare>,
}

/// `POST /api/split/totals`
pub async fn split_totals(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SplitRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.people.is_empty() {
        return Err(ApiError::bad_request("INVALID_BODY", "people must not be empty"));
    }
    let bill = state
        .store
        .get(&req.bill_token)
        .await?
        .ok_or_else(|| tabsplit_core::SplitError::NotFound(format!("bill {}", req.bill_token)))?;

    let totals = person_totals(&bill, &req.people, &req.shares);
    Ok(Json(json!({ "ok": true, "totals": totals })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    use tabsplit_store::MemoryBillStore;

    use crate::test_support::state_with;

    #[tokio::test]
    async fn delete_unknown_token_is_404_not_500() {
        let state = state_with(Arc::new(MemoryBillStore::new()));
        let err = delete_bill(
            State(state),
            HeaderMap::new(),
            Query(DeleteParams {
                token: Some("does-not-exist".into()),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "NOT_FOUND");
    }

    #[tokio::test]
    async fn delete_without_token_is_400() {
        let state = state_with(Arc::new(MemoryBillStore::new()));
        let err = delete_bill(State(state), HeaderMap::new(), Query(DeleteParams { token: None }))
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "MISSING_TOKEN");
    }

    #[tokio::test]
    async fn create_then_list_roundtrip() {
        let store = Arc::new(MemoryBillStore::new());
        let state = state_with(store);

        let req = CreateBillRequest {
            title: Some("team dinner".into()),
            place: None,
            date: None,
            items: vec![
                NewItem { label: "Pizza".into(), price: 18.0, quantity: 1 },
                NewItem { label: "Beer".into(), price: 12.0, quantity: 2 },
            ],
            subtotal: None,
            sales_tax: Some(3.0),
            tip: None,
        };
        let Json(created) = create_bill(State(state.clone()), HeaderMap::new(), Json(req))
            .await
            .unwrap();
        assert_eq!(created["ok"], true);
        // Subtotal derived from items, total from subtotal + tax + tip.
        assert!((created["bill"]["subtotal"].as_f64().unwrap() - 30.0).abs() < 1e-9);
        assert!((created["bill"]["total"].as_f64().unwrap() - 33.0).abs() < 1e-9);

        let Json(listed) = list_bills(State(state)).await.unwrap();
        assert_eq!(listed["bills"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_blank_bills() {
        let state = state_with(Arc::new(MemoryBillStore::new()));
        let req = CreateBillRequest {
            title: None,
            place: None,
            date: None,
            items: vec![],
            subtotal: None,
            sales_tax: None,
            tip: None,
        };
        let err = create_bill(State(state), HeaderMap::new(), Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.code, "INVALID_BODY");
    }

    #[tokio::test]
    async fn split_totals_on_unknown_bill_is_404() {
        let state = state_with(Arc::new(MemoryBillStore::new()));
        let err = split_totals(
            State(state),
            Json(SplitRequest {
                bill_token: "missing".into(),
                people: vec![Person::new("A")],
                shares: vec![],
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
