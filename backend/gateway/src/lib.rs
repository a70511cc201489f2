//! HTTP surface of the tabsplit backend.
//!
//! Every handler follows the same shape: method check (axum routing),
//! rate-limit check where the request mutates, minimal field validation,
//! delegate to the store or a provider service, map errors onto the fixed
//! envelope `{ ok: false, code, message, details? }`.

pub mod bills_api;
pub mod rate_limit;
pub mod receipts_api;
pub mod responses;
pub mod scan_api;
pub mod server;

pub use rate_limit::RateLimiter;
pub use responses::ApiError;
pub use server::{build_router, start_server, AppState};
