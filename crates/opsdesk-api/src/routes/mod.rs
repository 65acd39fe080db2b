//! Route modules for the API server
//!
//! Each list-facing module follows the same structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API and HTMX partial endpoints
//! - page.rs: HTML rendering and full page endpoints

pub mod actions;
pub mod events;
pub mod lists;
pub mod settings;
