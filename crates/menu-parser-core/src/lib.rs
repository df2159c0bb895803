#[cfg(feature = "network")]
pub mod api;
pub mod config;
pub mod error;
pub mod menu;
pub mod prompt;

#[cfg(feature = "network")]
pub use api::MenuParser;
pub use config::{ApiHost, ProviderConfig};
pub use error::{MenuError, Result};
pub use menu::{Menu, MenuItem};
