//! Blog post store: the in-memory post collection, the selected post and
//! the loading flag, plus the sources posts are fetched from.

pub mod error;
pub mod source;
pub mod state;
pub mod store;

pub use error::FetchError;
pub use source::{FixtureSource, MarkdownSource, PostSource, RemoteSource};
pub use state::BlogState;
pub use store::{FetchHandle, FetchOutcome, PostStore};
