pub mod config;
pub mod error;
pub mod post;
pub mod types;

pub use config::parse_site_toml;
pub use error::{Error, Result};
pub use types::*;
