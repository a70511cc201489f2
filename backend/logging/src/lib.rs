//! Structured logging for the tabsplit backend.
//!
//! Console output for interactive runs plus daily-rolling NDJSON files for
//! anything that needs to be grepped after the fact.

pub mod logger;

pub use logger::init_logger;
