//! Core types and shared functionality for sheetview.
//!
//! This crate provides:
//! - Document references, fetch targets and raw payloads
//! - Cache store trait with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod payload;

pub use cache::{CacheDb, CacheKey, CacheStore, Clock, ManualClock, SystemClock};
pub use document::{DocumentReference, FetchTarget};
pub use error::Error;
pub use payload::{ContentType, RawPayload};
