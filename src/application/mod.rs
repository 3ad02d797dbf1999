//! Application layer managing state and business workflows.
//!
//! This module coordinates between the stores and the presentation layer:
//! the cart, the product list and sign-up presenters, and the top-level
//! application state.

pub mod background;
pub mod cart;
pub mod product_list;
pub mod signup;
pub mod state;

pub use background::*;
pub use cart::*;
pub use product_list::*;
pub use signup::*;
pub use state::*;
