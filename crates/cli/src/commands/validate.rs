use super::{load_posts, load_site};
use nianouth_validator::{ValidationReport, validate_site};
use std::path::PathBuf;

pub async fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating blog at: {}", path.display());

    let site = load_site(&path)?;
    println!("✓ site.toml valid");
    println!("  Site: {}", site.info.title);

    let store = load_posts(&site, &path).await?;
    let report = validate_site(&site, &store.posts());
    print_report(&report);

    if !report.is_ok() {
        anyhow::bail!("Validation failed with {} error(s)", report.errors.len());
    }

    println!("\n✅ Site is valid");
    Ok(())
}

/// Print a validation report the same way for `validate` and `build`
pub(crate) fn print_report(report: &ValidationReport) {
    for line in &report.info {
        println!("  {}", line);
    }
    for warning in &report.warnings {
        println!("  ⚠ {}", warning);
    }
    for error in &report.errors {
        eprintln!("  ✗ {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SITE: &str = r#"
[site]
title = "Test"
description = "Test blog"

[theme]

[posts]
source = "markdown"
"#;

    fn post(slug: &str) -> String {
        format!("+++\ntitle = \"Post\"\nslug = \"{}\"\npublished_at = \"2025-01-01T00:00:00Z\"\n+++\n\nBody\n", slug)
    }

    fn blog(posts: &[(&str, String)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("site.toml"), SITE).unwrap();
        fs::create_dir(dir.path().join("posts")).unwrap();
        for (name, content) in posts {
            fs::write(dir.path().join("posts").join(name), content).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_validate_ok() {
        let dir = blog(&[("a.md", post("first")), ("b.md", post("second"))]);
        run(dir.path().to_path_buf()).await.unwrap();
    }

    #[tokio::test]
    async fn test_validate_fails_on_duplicate_slug() {
        let dir = blog(&[("a.md", post("same")), ("b.md", post("same"))]);
        let err = run(dir.path().to_path_buf()).await.unwrap_err();
        assert!(err.to_string().contains("Validation failed"));
    }

    #[tokio::test]
    async fn test_validate_missing_site_toml() {
        let dir = TempDir::new().unwrap();
        let err = run(dir.path().to_path_buf()).await.unwrap_err();
        assert!(err.to_string().contains("site.toml not found"));
    }
}
