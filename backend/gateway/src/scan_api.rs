//! Receipt scanning and icon endpoints.

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::bills_api::attach_icons;
use crate::responses::ApiError;
use crate::server::AppState;

/// `POST /api/ocr`: legacy mock path kept for the old client. Returns a
/// canned receipt without touching any provider.
pub async fn ocr_mock() -> Json<Value> {
    Json(json!({
        "ok": true,
        "receipt": {
            "place": "Sample Diner",
            "date": "2024-01-01",
            "items": [
                { "label": "Burger", "price": 9.5, "quantity": 1 },
                { "label": "Fries", "price": 3.5, "quantity": 1 }
            ],
            "subtotal": 13.0,
            "tax": 1.1,
            "tip": 0.0,
            "total": 14.1
        }
    }))
}

/// `POST /api/scan-receipt`: multipart upload with a `file` field.
pub async fn scan_receipt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    state.check_rate_limit(&headers).await?;

    let mut image: Option<(Vec<u8>, String)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::bad_request("INVALID_BODY", format!("malformed multipart body: {e}"))
    })? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" || name == "image" {
            let mime = field
                .content_type()
                .unwrap_or("image/jpeg")
                .to_string();
            let bytes = field.bytes().await.map_err(|e| {
                ApiError::bad_request("INVALID_BODY", format!("unreadable file field: {e}"))
            })?;
            image = Some((bytes.to_vec(), mime));
        }
    }

    let Some((bytes, mime)) = image else {
        return Err(ApiError::bad_request("INVALID_BODY", "missing file field"));
    };
    run_scan(&state, &bytes, &mime).await
}

#[derive(Deserialize)]
pub struct Base64ScanRequest {
    pub image: String,
    pub mime: Option<String>,
}

/// `POST /api/scan-receipt-base64`: JSON body with a base64 image. A data
/// URL prefix is tolerated and stripped.
pub async fn scan_receipt_base64(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<Base64ScanRequest>,
) -> Result<Json<Value>, ApiError> {
    state.check_rate_limit(&headers).await?;

    let raw = match req.image.find("base64,") {
        Some(idx) => &req.image[idx + "base64,".len()..],
        None => req.image.as_str(),
    };
    let bytes = STANDARD
        .decode(raw.trim())
        .map_err(|e| ApiError::bad_request("INVALID_BODY", format!("invalid base64 image: {e}")))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("INVALID_BODY", "empty image"));
    }
    let mime = req.mime.unwrap_or_else(|| "image/jpeg".to_string());
    run_scan(&state, &bytes, &mime).await
}

async fn run_scan(state: &AppState, bytes: &[u8], mime: &str) -> Result<Json<Value>, ApiError> {
    let scanner = state
        .scanner
        .as_ref()
        .ok_or_else(|| ApiError::not_configured("receipt scanning"))?;

    let receipt = scanner.scan(bytes, mime).await?;
    let mut bill = receipt.clone().into_bill();
    attach_icons(state, &mut bill).await;
    state.store.insert(bill.clone()).await?;
    info!(token = %bill.token, items = bill.items.len(), "receipt scanned");

    Ok(Json(json!({ "ok": true, "token": bill.token, "receipt": receipt, "bill": bill })))
}

#[derive(Deserialize)]
pub struct IconsParams {
    names: Option<String>,
}

/// `GET /api/icons?names=a,b,c`: batch icon lookup; only found names come back.
pub async fn batch_icons(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IconsParams>,
) -> Result<Json<Value>, ApiError> {
    let Some(names) = params.names.filter(|n| !n.is_empty()) else {
        return Err(ApiError::bad_request("INVALID_BODY", "names query parameter is required"));
    };
    let icons = state
        .icons
        .as_ref()
        .ok_or_else(|| ApiError::not_configured("icon lookup"))?;

    let names: Vec<String> = names.split(',').map(|n| n.trim().to_string()).collect();
    let found = icons.icons_for(&names).await;
    Ok(Json(json!({ "ok": true, "icons": found })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use std::time::Duration;

    use tabsplit_core::ReceiptReader;
    use tabsplit_store::MemoryBillStore;
    use tabsplit_vision::{ScanCache, Scanner};

    use crate::rate_limit::RateLimiter;
    use crate::test_support::state_with;

    struct FixedReader(&'static str);

    #[async_trait]
    impl ReceiptReader for FixedReader {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn read_receipt(&self, _image: &[u8], _mime: &str, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    const CAFE_REPLY: &str = r#"{"place":"Cafe","items":[{"label":"Tea","price":3}],"subtotal":3,"tax":0,"tip":0,"total":3}"#;

    fn scanning_state(store: Arc<MemoryBillStore>) -> Arc<AppState> {
        let scanner = Scanner::new(
            Arc::new(FixedReader(CAFE_REPLY)),
            ScanCache::new(8, Duration::from_secs(60)),
            Duration::from_millis(200),
        );
        Arc::new(AppState {
            store,
            scanner: Some(Arc::new(scanner)),
            icons: None,
            rate_limiter: RateLimiter::new(10_000, 60),
        })
    }

    #[tokio::test]
    async fn scan_without_provider_reports_not_configured() {
        let state = state_with(Arc::new(MemoryBillStore::new()));
        let req = Base64ScanRequest {
            image: STANDARD.encode(b"jpegbytes"),
            mime: None,
        };
        let err = scan_receipt_base64(State(state), HeaderMap::new(), Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "NOT_CONFIGURED");
    }

    #[tokio::test]
    async fn invalid_base64_is_400() {
        let store = Arc::new(MemoryBillStore::new());
        let state = scanning_state(store);
        let req = Base64ScanRequest {
            image: "not//valid==base64!!".into(),
            mime: None,
        };
        let err = scan_receipt_base64(State(state), HeaderMap::new(), Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_BODY");
    }

    #[tokio::test]
    async fn base64_scan_creates_a_bill() {
        let store = Arc::new(MemoryBillStore::new());
        let state = scanning_state(store.clone());

        let req = Base64ScanRequest {
            image: format!("data:image/jpeg;base64,{}", STANDARD.encode(b"jpegbytes")),
            mime: None,
        };
        let Json(body) = scan_receipt_base64(State(state), HeaderMap::new(), Json(req))
            .await
            .unwrap();

        assert_eq!(body["ok"], true);
        assert_eq!(body["receipt"]["items"][0]["label"], "Tea");
        let token = body["token"].as_str().unwrap();

        use tabsplit_core::BillStore;
        let stored = store.get(token).await.unwrap().unwrap();
        assert_eq!(stored.items.len(), 1);
        assert!((stored.total - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn rate_limited_scan_is_429() {
        let store = Arc::new(MemoryBillStore::new());
        let scanner = Scanner::new(
            Arc::new(FixedReader(CAFE_REPLY)),
            ScanCache::new(8, Duration::from_secs(60)),
            Duration::from_millis(200),
        );
        let state = Arc::new(AppState {
            store,
            scanner: Some(Arc::new(scanner)),
            icons: None,
            rate_limiter: RateLimiter::new(0, 60),
        });

        let req = Base64ScanRequest {
            image: STANDARD.encode(b"jpegbytes"),
            mime: None,
        };
        let err = scan_receipt_base64(State(state), HeaderMap::new(), Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.code, "RATE_LIMITED");
    }
}
