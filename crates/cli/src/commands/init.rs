use anyhow::{Context, Result};
use nianouth_core::post::to_markdown;
use nianouth_store::source::welcome_post;
use std::fs;
use std::path::{Path, PathBuf};

/// Escape a string for a TOML basic string.
///
/// The scaffolded site.toml keeps comments and layout, so it is written as
/// text rather than serialized.
fn toml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\x08', "\\b")
        .replace('\x0C', "\\f")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Scaffold a new blog directory.
///
/// Creates the directory if needed, then writes:
/// - `site.toml` reading posts from `posts/`
/// - `posts/welcome-to-my-blog.md`
/// - an empty `public/` for static assets
///
/// # Errors
///
/// Returns an error if `site.toml` already exists or a file cannot be
/// written.
pub async fn run(path: PathBuf) -> Result<()> {
    println!("Initializing blog directory: {}", path.display());

    let site_toml_path = path.join("site.toml");
    if site_toml_path.exists() {
        anyhow::bail!(
            "site.toml already exists at {}\nHint: Delete it first or use a different directory",
            site_toml_path.display()
        );
    }

    create_directory_structure(&path)?;

    let title = path
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "My Blog".to_string());

    fs::write(&site_toml_path, generate_site_toml(&title))
        .context("Failed to write site.toml")?;
    println!("✓ Created site.toml");

    let post = welcome_post();
    let post_path = path.join("posts").join(format!("{}.md", post.slug));
    if post_path.exists() {
        println!("  Keeping existing {}", post_path.display());
    } else {
        fs::write(&post_path, to_markdown(&post))
            .with_context(|| format!("Failed to write {}", post_path.display()))?;
        println!("✓ Created {}", post_path.display());
    }

    println!("\nNext steps:");
    println!("  1. Edit site.toml");
    println!("  2. Write posts in posts/");
    println!("  3. Run: nianouth preview {}", path.display());

    Ok(())
}

fn create_directory_structure(base: &Path) -> Result<()> {
    fs::create_dir_all(base.join("posts")).context("Failed to create posts directory")?;
    fs::create_dir_all(base.join("public")).context("Failed to create public directory")?;
    Ok(())
}

fn generate_site_toml(title: &str) -> String {
    let title = toml_escape_string(title);
    format!(
        r#"[site]
title = "{title}"
description = "Notes on modern web development"
lang = "en"
clean_urls = true
last_updated = true
# out_dir = "dist"

[meta]
description = "Notes on modern web development"
keywords = []
# favicon = "/favicon.ico"

[theme]
site_title = "{title}"
# logo = {{ src = "/logo.svg", alt = "Logo" }}

[[theme.nav]]
text = "Home"
link = "/"

[[theme.nav]]
text = "Blog"
link = "/blog/"

[[theme.nav]]
text = "About"
link = "/about"

[[theme.sidebar]]
prefix = "/blog/"
text = "Posts"
items = [{{ text = "Welcome", link = "/blog/welcome-to-my-blog" }}]

# [[theme.social]]
# icon = "github"
# link = "https://github.com/you"

# [theme.edit_link]
# pattern = "https://github.com/you/blog/edit/main/:path"
# text = "Edit this page"

[build]
base = "/"
# production_base = "/blog/"
port = 3000
# Unmatched paths: "page" renders a not-found page, "home" redirects home
not_found = "page"

[posts]
source = "markdown"
dir = "posts"
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use nianouth_core::config::{parse_site_toml, parse_site_toml_str};
    use nianouth_core::post::parse_post_file;
    use nianouth_core::{NotFoundPolicy, PostSourceConfig};
    use tempfile::TempDir;

    #[test]
    fn test_toml_escape_string() {
        assert_eq!(toml_escape_string(r#"a "b" \c"#), r#"a \"b\" \\c"#);
        assert_eq!(toml_escape_string("line\nbreak\t"), "line\\nbreak\\t");
    }

    #[test]
    fn test_generated_site_toml_parses() {
        let site = parse_site_toml_str(&generate_site_toml(r#"Quote "Blog""#)).unwrap();
        assert_eq!(site.info.title, r#"Quote "Blog""#);
        assert_eq!(site.theme.nav.len(), 3);
        assert_eq!(site.build.not_found, NotFoundPolicy::Page);
        assert_eq!(
            site.posts,
            PostSourceConfig::Markdown {
                dir: PathBuf::from("posts")
            }
        );
    }

    #[tokio::test]
    async fn test_init_scaffolds_blog() {
        let dir = TempDir::new().unwrap();
        let blog = dir.path().join("my-blog");
        run(blog.clone()).await.unwrap();

        let site = parse_site_toml(blog.join("site.toml")).unwrap();
        assert_eq!(site.info.title, "my-blog");
        assert!(blog.join("public").is_dir());

        let post = parse_post_file(blog.join("posts/welcome-to-my-blog.md"), 1).unwrap();
        assert_eq!(post.slug, "welcome-to-my-blog");
        assert_eq!(post.tags, vec!["Vue", "Vite", "TypeScript"]);
    }

    #[tokio::test]
    async fn test_init_refuses_existing_site_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("site.toml"), "keep me").unwrap();

        let err = run(dir.path().to_path_buf()).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(dir.path().join("site.toml")).unwrap(), "keep me");
    }
}
