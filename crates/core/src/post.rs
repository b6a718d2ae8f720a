//! Markdown post files: a `+++`-delimited TOML front matter block followed by
//! the markdown body.

use crate::error::{Error, Result};
use crate::types::{BlogPost, slugify};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const FRONT_MATTER_DELIMITER: &str = "+++";

#[derive(Debug, Deserialize)]
struct FrontMatter {
    id: Option<u64>,
    title: String,
    slug: Option<String>,
    #[serde(default)]
    excerpt: String,
    published_at: Option<toml::Value>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    author: String,
}

/// Read a markdown post from disk. The slugified file stem is the fallback
/// slug.
pub fn parse_post_file<P: AsRef<Path>>(path: P, fallback_id: u64) -> Result<BlogPost> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    parse_post_str(&content, stem, fallback_id)
        .map_err(|e| Error::InvalidData(format!("{}: {}", path.display(), e)))
}

/// Parse a markdown post from a string
pub fn parse_post_str(content: &str, stem: &str, fallback_id: u64) -> Result<BlogPost> {
    let (front, body) = split_front_matter(content)?;
    let fm: FrontMatter = toml::from_str(front)?;

    let id = fm.id.unwrap_or(fallback_id);

    // A stem with no ASCII letters or digits (e.g. `前端指南.md`) falls back to the id
    let slug = match fm.slug {
        Some(slug) => slug,
        None => match slugify(stem) {
            derived if derived.is_empty() => format!("post-{}", id),
            derived => derived,
        },
    };

    // TOML has a native datetime type; accept it as well as a string
    let published_at = match fm.published_at {
        Some(toml::Value::String(s)) => Some(s),
        Some(toml::Value::Datetime(dt)) => Some(dt.to_string()),
        Some(other) => {
            return Err(Error::InvalidData(format!(
                "published_at must be a string or datetime, got {}",
                other.type_str()
            )));
        }
        None => None,
    };

    Ok(BlogPost {
        id,
        title: fm.title,
        slug,
        excerpt: fm.excerpt,
        content: body.trim_start_matches(['\r', '\n']).to_string(),
        published_at,
        tags: fm.tags,
        author: fm.author,
    })
}

fn split_front_matter(content: &str) -> Result<(&str, &str)> {
    let content = content.trim_start_matches('\u{feff}');
    let rest = content
        .strip_prefix(FRONT_MATTER_DELIMITER)
        .ok_or_else(|| Error::InvalidData("Missing '+++' front matter block".to_string()))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_DELIMITER {
            let front = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((front, body));
        }
        offset += line.len();
    }

    Err(Error::InvalidData(
        "Unterminated front matter block, expected closing '+++'".to_string(),
    ))
}

/// Render a post back into its markdown file form
pub fn to_markdown(post: &BlogPost) -> String {
    let mut out = String::from("+++\n");
    out.push_str(&format!("id = {}\n", post.id));
    out.push_str(&format!("title = {}\n", toml_string(&post.title)));
    out.push_str(&format!("slug = {}\n", toml_string(&post.slug)));
    out.push_str(&format!("excerpt = {}\n", toml_string(&post.excerpt)));
    if let Some(at) = &post.published_at {
        out.push_str(&format!("published_at = {}\n", toml_string(at)));
    }
    let tags: Vec<String> = post.tags.iter().map(|t| toml_string(t)).collect();
    out.push_str(&format!("tags = [{}]\n", tags.join(", ")));
    out.push_str(&format!("author = {}\n", toml_string(&post.author)));
    out.push_str("+++\n\n");
    out.push_str(&post.content);
    if !post.content.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn toml_string(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}
