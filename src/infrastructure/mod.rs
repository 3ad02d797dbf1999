//! Infrastructure layer providing external service integrations.
//!
//! Local persistence, the HTTP backend, analytics, configuration and
//! logging setup live here.

pub mod analytics;
pub mod backend;
pub mod config;
pub mod export;
pub mod logging;
pub mod persistence;
pub mod purchased_items;
pub mod stores;

pub use analytics::*;
pub use backend::*;
pub use config::*;
pub use export::*;
pub use persistence::*;
pub use purchased_items::*;
pub use stores::*;
