//! Router assembly and server startup.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use tabsplit_core::BillStore;
use tabsplit_icons::IconService;
use tabsplit_vision::Scanner;

use crate::rate_limit::RateLimiter;
use crate::responses::ApiError;
use crate::{bills_api, receipts_api, scan_api};

/// Application state shared across routes.
///
/// The scanner and icon service are optional: when the provider credentials
/// are absent the handlers answer `NOT_CONFIGURED` instead of being built.
pub struct AppState {
    pub store: Arc<dyn BillStore>,
    pub scanner: Option<Arc<Scanner>>,
    pub icons: Option<Arc<IconService>>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Caller IP for rate limiting: proxy header first, since the service
    /// runs behind a reverse proxy in deployment.
    pub fn caller_ip(headers: &HeaderMap) -> String {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// 429 unless the caller is within the window.
    pub async fn check_rate_limit(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let ip = Self::caller_ip(headers);
        if self.rate_limiter.check_limit(&ip).await {
            Ok(())
        } else {
            Err(tabsplit_core::SplitError::RateLimited.into())
        }
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/bills/list", get(bills_api::list_bills))
        .route("/api/bills/create", post(bills_api::create_bill))
        .route("/api/bills/delete", delete(bills_api::delete_bill))
        .route("/api/receipts/:token/update", put(receipts_api::update_receipt))
        .route("/api/split/totals", post(bills_api::split_totals))
        .route("/api/ocr", post(scan_api::ocr_mock))
        .route("/api/scan-receipt", post(scan_api::scan_receipt))
        .route("/api/scan-receipt-base64", post(scan_api::scan_receipt_base64))
        .route("/api/icons", get(scan_api::batch_icons))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn start_server(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let app = build_router(state);
    info!("tabsplit HTTP server listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "tabsplit",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "no such route")
}
