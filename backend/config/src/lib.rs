pub mod redact;
pub mod schema;

pub use redact::{redact_opt, redact_secret};
pub use schema::AppConfig;
