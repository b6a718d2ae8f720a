use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// A single blog article.
///
/// JSON field names follow the camelCase shape of the post API
/// (`publishedAt`), so remote responses deserialize directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: u64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    /// ISO-8601 timestamp. Empty or absent means unpublished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: String,
}

impl BlogPost {
    pub fn is_published(&self) -> bool {
        self.published_at.as_deref().is_some_and(|at| !at.is_empty())
    }

    /// Parsed publication timestamp, `None` when unpublished or malformed
    pub fn published_date(&self) -> Option<DateTime<FixedOffset>> {
        let at = self.published_at.as_deref()?.trim();
        DateTime::parse_from_rfc3339(at).ok()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Turn a title or file stem into a URL-safe slug.
///
/// Only ASCII letters and digits survive; anything else is dropped, so a
/// title written entirely in CJK yields an empty slug.
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    for c in s.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// A slug is URL-safe when it is non-empty and only holds lowercase ASCII
/// letters, digits and single hyphens between them.
pub fn is_url_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Complete site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub info: SiteInfo,
    pub meta: MetaConfig,
    pub theme: ThemeConfig,
    pub build: BuildConfig,
    pub posts: PostSourceConfig,
}

impl Site {
    /// Base path the site is served under for the given mode
    pub fn base(&self, mode: BuildMode) -> &str {
        match mode {
            BuildMode::Development => &self.build.base,
            BuildMode::Production => &self.build.production_base,
        }
    }

    /// Sidebar group whose prefix matches `path`, longest prefix first
    pub fn sidebar_for(&self, path: &str) -> Option<&SidebarGroup> {
        self.theme
            .sidebar
            .iter()
            .filter(|group| path_has_prefix(path, &group.prefix))
            .max_by_key(|group| group.prefix.len())
    }
}

fn path_has_prefix(path: &str, prefix: &str) -> bool {
    path.starts_with(prefix) || format!("{}/", path) == prefix
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    pub title: String,
    pub description: String,
    pub lang: String,
    pub clean_urls: bool,
    pub last_updated: bool,
    pub out_dir: PathBuf,
}

/// Extra `<head>` content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub site_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<Logo>,
    pub nav: Vec<NavItem>,
    pub sidebar: Vec<SidebarGroup>,
    pub social: Vec<SocialLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_link: Option<EditLink>,
    pub labels: Labels,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logo {
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavItem {
    pub text: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl NavItem {
    pub fn is_external(&self) -> bool {
        is_external_link(&self.link)
    }
}

pub fn is_external_link(link: &str) -> bool {
    link.starts_with("http://") || link.starts_with("https://") || link.starts_with("mailto:")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidebarGroup {
    pub prefix: String,
    pub text: String,
    #[serde(default)]
    pub items: Vec<SidebarItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidebarItem {
    pub text: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialLink {
    pub icon: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditLink {
    /// URL with a `:path` placeholder for the source file
    pub pattern: String,
    pub text: String,
}

impl EditLink {
    pub fn url_for(&self, source_path: &str) -> String {
        self.pattern.replace(":path", source_path)
    }
}

/// UI strings shown by the theme
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub prev: String,
    pub next: String,
    pub outline: String,
    pub return_to_top: String,
    pub dark_mode: String,
    pub light_mode: String,
    pub loading: String,
    pub not_found: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            prev: "Previous page".to_string(),
            next: "Next page".to_string(),
            outline: "On this page".to_string(),
            return_to_top: "Return to top".to_string(),
            dark_mode: "Dark mode".to_string(),
            light_mode: "Light mode".to_string(),
            loading: "Loading...".to_string(),
            not_found: "Page not found".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub base: String,
    pub production_base: String,
    pub port: u16,
    pub not_found: NotFoundPolicy,
}

/// What an unmatched path resolves to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotFoundPolicy {
    /// Dedicated not-found page
    #[default]
    Page,
    /// Resolve to the home page
    Home,
}

/// Where `fetch_posts` gets its data from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PostSourceConfig {
    /// Built-in posts served after a simulated latency
    Fixture { delay: Duration },
    /// Markdown files with TOML front matter, relative to the site root
    Markdown { dir: PathBuf },
    /// JSON array of posts fetched over HTTP
    Remote { url: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

impl BuildMode {
    /// Read the mode from `NIANOUTH_ENV` (`production` or anything else)
    pub fn from_env() -> Self {
        match std::env::var("NIANOUTH_ENV") {
            Ok(v) if v.eq_ignore_ascii_case("production") => BuildMode::Production,
            _ => BuildMode::Development,
        }
    }
}
