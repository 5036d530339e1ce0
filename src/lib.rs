//! Headless client core for a travel-booking home page
//!
//! Debounced destination/tour/province suggestions with a submit cache,
//! search history, and a login/register panel over a local key-value store.
//! Controllers are plain objects driven by method calls, so the binary (and
//! the tests) can run them without a browser.

pub mod api;
pub mod auth;
pub mod config;
pub mod dates;
pub mod debounce;
pub mod error;
pub mod history;
pub mod logging;
pub mod nav;
pub mod session;
pub mod suggest;
pub mod text;
pub mod util;

pub use error::{ClientError, ClientResult};
pub use nav::Navigation;
