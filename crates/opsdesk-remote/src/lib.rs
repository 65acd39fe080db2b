//! REST client for the back-office API
//!
//! Provides the [`PageSource`](opsdesk_core::PageSource) implementations
//! behind each list view and the operator actions on single rows.

pub mod actions;
pub mod client;
pub mod sources;

pub use client::{build_url, decode_envelope, Envelope, RemoteApi};
pub use sources::RemoteSource;
