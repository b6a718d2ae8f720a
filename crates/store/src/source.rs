use crate::error::FetchError;
use async_trait::async_trait;
use nianouth_core::post::parse_post_file;
use nianouth_core::{BlogPost, PostSourceConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

/// Supplies the posts a `fetch_posts` call installs into the store
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_posts(&self) -> Result<Vec<BlogPost>, FetchError>;

    /// Short human-readable description for logs
    fn describe(&self) -> String;
}

/// Build the configured source. Relative paths resolve against `site_root`.
pub fn from_config(config: &PostSourceConfig, site_root: &Path) -> Arc<dyn PostSource> {
    match config {
        PostSourceConfig::Fixture { delay } => Arc::new(FixtureSource::welcome().with_delay(*delay)),
        PostSourceConfig::Markdown { dir } => Arc::new(MarkdownSource::new(site_root.join(dir))),
        PostSourceConfig::Remote { url } => Arc::new(RemoteSource::new(url.clone())),
    }
}

/// A fixed list of posts, returned after a simulated round-trip
#[derive(Debug, Clone)]
pub struct FixtureSource {
    posts: Vec<BlogPost>,
    delay: Duration,
}

impl FixtureSource {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

    pub fn new(posts: Vec<BlogPost>) -> Self {
        Self {
            posts,
            delay: Self::DEFAULT_DELAY,
        }
    }

    /// The single welcome post the blog ships with, published now
    pub fn welcome() -> Self {
        Self::new(vec![welcome_post()])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

pub fn welcome_post() -> BlogPost {
    BlogPost {
        id: 1,
        title: "欢迎来到 NIANOUTH 技术博客".to_string(),
        slug: "welcome-to-my-blog".to_string(),
        excerpt: "这是我的第一篇技术博客，介绍了我搭建这个博客的过程和技术栈选择。".to_string(),
        content: "详细内容...".to_string(),
        published_at: Some(chrono::Utc::now().to_rfc3339()),
        tags: vec![
            "Vue".to_string(),
            "Vite".to_string(),
            "TypeScript".to_string(),
        ],
        author: "作者".to_string(),
    }
}

#[async_trait]
impl PostSource for FixtureSource {
    async fn fetch_posts(&self) -> Result<Vec<BlogPost>, FetchError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.posts.clone())
    }

    fn describe(&self) -> String {
        format!("fixture ({} posts, {:?} delay)", self.posts.len(), self.delay)
    }
}

/// Markdown files with front matter, one post per `.md` file
#[derive(Debug, Clone)]
pub struct MarkdownSource {
    dir: PathBuf,
}

impl MarkdownSource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Load every `.md` file under `dir`, in path order. Ids default to the
/// 1-based position.
pub fn load_markdown_posts(dir: &Path) -> Result<Vec<BlogPost>, FetchError> {
    if !dir.is_dir() {
        return Err(FetchError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("posts directory not found: {}", dir.display()),
        )));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| FetchError::Io(e.into()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "md") {
            paths.push(path.to_path_buf());
        }
    }

    let mut posts = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        posts.push(parse_post_file(path, i as u64 + 1)?);
    }
    Ok(posts)
}

#[async_trait]
impl PostSource for MarkdownSource {
    async fn fetch_posts(&self) -> Result<Vec<BlogPost>, FetchError> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || load_markdown_posts(&dir))
            .await
            .map_err(|e| FetchError::Io(std::io::Error::other(e)))?
    }

    fn describe(&self) -> String {
        format!("markdown ({})", self.dir.display())
    }
}

/// JSON array of posts served over HTTP
#[derive(Debug, Clone)]
pub struct RemoteSource {
    client: reqwest::Client,
    url: String,
}

impl RemoteSource {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl PostSource for RemoteSource {
    async fn fetch_posts(&self) -> Result<Vec<BlogPost>, FetchError> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let posts: Vec<BlogPost> = response.json().await?;
        Ok(posts)
    }

    fn describe(&self) -> String {
        format!("remote ({})", self.url)
    }
}
