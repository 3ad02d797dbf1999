//! grocer - terminal grocery ordering client
//!
//! Browse a product catalog, keep a local cart, place orders and review
//! order history against a remote grocery backend.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
