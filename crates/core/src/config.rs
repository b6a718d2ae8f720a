use crate::error::{Error, Result};
use crate::types::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_FIXTURE_DELAY_MS: u64 = 1000;
const DEFAULT_PORT: u16 = 3000;

/// Raw TOML configuration structure
/// This matches the site.toml file structure exactly
#[derive(Debug, Deserialize)]
struct RawConfig {
    site: RawSiteInfo,
    #[serde(default)]
    meta: MetaConfig,
    theme: RawTheme,
    #[serde(default)]
    build: RawBuild,
    #[serde(default)]
    posts: RawPosts,
}

#[derive(Debug, Deserialize)]
struct RawSiteInfo {
    title: String,
    description: String,
    #[serde(default = "default_lang")]
    lang: String,
    #[serde(default = "default_true")]
    clean_urls: bool,
    #[serde(default = "default_true")]
    last_updated: bool,
    out_dir: Option<String>, // Convert to PathBuf
}

#[derive(Debug, Deserialize)]
struct RawTheme {
    site_title: Option<String>,
    logo: Option<Logo>,
    #[serde(default)]
    nav: Vec<NavItem>,
    #[serde(default)]
    sidebar: Vec<SidebarGroup>,
    #[serde(default)]
    social: Vec<SocialLink>,
    edit_link: Option<EditLink>,
    #[serde(default)]
    labels: Labels,
    search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawBuild {
    base: Option<String>,
    production_base: Option<String>,
    port: Option<u16>,
    #[serde(default)]
    not_found: NotFoundPolicy,
}

#[derive(Debug, Default, Deserialize)]
struct RawPosts {
    source: Option<String>,
    dir: Option<String>, // Convert to PathBuf
    url: Option<String>,
    delay_ms: Option<u64>,
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

/// Parse site.toml from a file path
pub fn parse_site_toml<P: AsRef<Path>>(path: P) -> Result<Site> {
    let content = fs::read_to_string(path)?;
    parse_site_toml_str(&content)
}

/// Parse site.toml from a string (useful for testing)
pub fn parse_site_toml_str(content: &str) -> Result<Site> {
    let raw: RawConfig = toml::from_str(content)?;

    let out_dir = match raw.site.out_dir {
        Some(dir) => validate_path(&dir, "site.out_dir")?,
        None => PathBuf::from("dist"),
    };

    let info = SiteInfo {
        title: raw.site.title,
        description: raw.site.description,
        lang: raw.site.lang,
        clean_urls: raw.site.clean_urls,
        last_updated: raw.site.last_updated,
        out_dir,
    };

    for item in &raw.theme.nav {
        validate_link(&item.link, "theme.nav.link")?;
    }
    for group in &raw.theme.sidebar {
        validate_link(&group.prefix, "theme.sidebar.prefix")?;
        for item in &group.items {
            validate_link(&item.link, "theme.sidebar.items.link")?;
        }
    }

    let theme = ThemeConfig {
        site_title: raw.theme.site_title.unwrap_or_else(|| info.title.clone()),
        logo: raw.theme.logo,
        nav: raw.theme.nav,
        sidebar: raw.theme.sidebar,
        social: raw.theme.social,
        edit_link: raw.theme.edit_link,
        labels: raw.theme.labels,
        search: raw.theme.search,
    };

    // Production falls back to the development base
    let base = match raw.build.base {
        Some(base) => validate_base(&base, "build.base")?,
        None => "/".to_string(),
    };
    let production_base = match raw.build.production_base {
        Some(base) => validate_base(&base, "build.production_base")?,
        None => base.clone(),
    };

    let build = BuildConfig {
        base,
        production_base,
        port: raw.build.port.unwrap_or(DEFAULT_PORT),
        not_found: raw.build.not_found,
    };

    let posts = parse_post_source(raw.posts)?;

    Ok(Site {
        info,
        meta: raw.meta,
        theme,
        build,
        posts,
    })
}

fn parse_post_source(raw: RawPosts) -> Result<PostSourceConfig> {
    match raw.source.as_deref().unwrap_or("fixture") {
        "fixture" => Ok(PostSourceConfig::Fixture {
            delay: Duration::from_millis(raw.delay_ms.unwrap_or(DEFAULT_FIXTURE_DELAY_MS)),
        }),
        "markdown" => {
            let dir = raw.dir.as_deref().unwrap_or("posts");
            Ok(PostSourceConfig::Markdown {
                dir: validate_path(dir, "posts.dir")?,
            })
        }
        "remote" => {
            let url = raw.url.ok_or_else(|| {
                Error::ConfigParse("posts.url is required when posts.source = \"remote\"".to_string())
            })?;
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::ConfigParse(format!(
                    "posts.url must be an http(s) URL: '{}'",
                    url
                )));
            }
            Ok(PostSourceConfig::Remote { url })
        }
        other => Err(Error::ConfigParse(format!(
            "Unknown posts.source '{}', expected fixture, markdown or remote",
            other
        ))),
    }
}

/// Validate and convert a path string to PathBuf.
///
/// Rejects absolute paths and parent directory references (`..`) so a
/// site.toml cannot point the build at files outside the site directory.
///
/// ```text
/// validate_path("posts", "posts.dir")        → Ok(PathBuf)
/// validate_path("/etc", "posts.dir")         → Err("Absolute paths not allowed...")
/// validate_path("../dist", "site.out_dir")   → Err("Parent directory references...")
/// ```
pub fn validate_path(path_str: &str, field_name: &str) -> Result<PathBuf> {
    let path = Path::new(path_str);

    if path.is_absolute() {
        return Err(Error::ConfigParse(format!(
            "Absolute paths not allowed in '{}': '{}'. Use relative paths only.",
            field_name, path_str
        )));
    }

    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::ConfigParse(format!(
                "Parent directory references (..) not allowed in '{}': '{}'",
                field_name, path_str
            )));
        }
    }

    if path_str.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    Ok(path.to_path_buf())
}

/// Base paths are absolute URL paths with a trailing slash, e.g. `/ai-agent-coding/`
fn validate_base(base: &str, field_name: &str) -> Result<String> {
    if !base.starts_with('/') || !base.ends_with('/') {
        return Err(Error::ConfigParse(format!(
            "'{}' must start and end with '/': '{}'",
            field_name, base
        )));
    }
    if base.split('/').any(|segment| segment == "..") {
        return Err(Error::ConfigParse(format!(
            "Parent directory references (..) not allowed in '{}': '{}'",
            field_name, base
        )));
    }
    Ok(base.to_string())
}

/// Internal links must be absolute site paths; external links pass through
fn validate_link(link: &str, field_name: &str) -> Result<()> {
    if is_external_link(link) || link.starts_with('/') {
        Ok(())
    } else {
        Err(Error::ConfigParse(format!(
            "Link in '{}' must start with '/' or be an http(s) URL: '{}'",
            field_name, link
        )))
    }
}
