// Library surface for headless/integration tests and reuse.
// The terminal front end lives in main.rs and ui.rs only.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod registry;
pub mod runtime;
pub mod sentence_list;
pub mod session;
pub mod store;
pub mod timer;
pub mod user;

pub use error::{Error, Result};
