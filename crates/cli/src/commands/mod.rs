pub mod build;
pub mod init;
pub mod preview;
pub mod validate;

use anyhow::{Context, Result};
use nianouth_core::{Site, config::parse_site_toml};
use nianouth_store::{FetchOutcome, PostStore, source};
use std::path::Path;

/// Load `site.toml` from a blog directory
pub(crate) fn load_site(path: &Path) -> Result<Site> {
    if !path.exists() {
        anyhow::bail!(
            "Blog directory does not exist: {}\nRun 'nianouth init {}' first",
            path.display(),
            path.display()
        );
    }

    let site_toml_path = path.join("site.toml");
    if !site_toml_path.exists() {
        anyhow::bail!(
            "site.toml not found in {}\nRun 'nianouth init {}' first",
            path.display(),
            path.display()
        );
    }

    parse_site_toml(&site_toml_path).context("Failed to parse site.toml")
}

/// Build a store over the configured post source and wait for the first fetch
pub(crate) async fn load_posts(site: &Site, path: &Path) -> Result<PostStore> {
    let source = source::from_config(&site.posts, path);
    let description = source.describe();
    let store = PostStore::new(source);

    match store.fetch_posts().wait().await {
        FetchOutcome::Applied(_) => Ok(store),
        FetchOutcome::Failed(e) => {
            Err(e).with_context(|| format!("Failed to fetch posts from {}", description))
        }
        FetchOutcome::Superseded => anyhow::bail!("Post fetch from {} was cancelled", description),
    }
}
