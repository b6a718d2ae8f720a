use super::validate::print_report;
use super::{load_posts, load_site};
use anyhow::{Context, Result};
use nianouth_core::BuildMode;
use nianouth_generator::{RenderContext, generate_site};
use nianouth_validator::validate_site;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Build the static site into `output` (default: `site.out_dir` under the
/// blog directory)
pub async fn run(path: PathBuf, output: Option<PathBuf>, mode: BuildMode) -> Result<()> {
    println!("🔨 Building static site...");
    println!("   Source: {}", path.display());

    let site = load_site(&path)?;
    let output = output.unwrap_or_else(|| path.join(&site.info.out_dir));
    let base = site.base(mode);

    println!("   Output: {}", output.display());
    println!("   Mode:   {:?} (base {})", mode, base);
    println!();

    println!("✓ Loaded: {}", site.info.title);
    let store = load_posts(&site, &path).await?;
    println!("  Posts: {}", store.posts().len());
    println!("  Published: {}", store.published_posts().len());
    println!();

    println!("🔍 Validating...");
    let report = validate_site(&site, &store.posts());
    print_report(&report);
    if !report.is_ok() {
        anyhow::bail!("Validation failed with {} error(s)", report.errors.len());
    }
    println!();

    println!("📄 Rendering pages...");
    let ctx = RenderContext::new(&site, base, false);
    let generated = generate_site(&ctx, &store).context("Failed to render site")?;

    fs::create_dir_all(&output).context("Failed to create output directory")?;
    for page in &generated.pages {
        write_file(&output.join(&page.file), page.html.as_bytes())?;
    }
    println!("   ✓ Generated {} pages", generated.pages.len());

    for (file, data) in &generated.assets {
        write_file(&output.join(file), data)?;
    }
    println!("   ✓ Generated {} data files", generated.assets.len());

    println!("🎨 Copying public assets...");
    let copied = copy_public(&path.join("public"), &output)?;
    println!("   ✓ Copied {} files", copied);

    println!();
    println!("✅ Build complete!");
    println!("   Output: {}", output.display());
    println!();
    println!("To test locally:");
    println!("   cd {} && python3 -m http.server 8000", output.display());
    println!();

    Ok(())
}

fn write_file(dst: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(dst, data).with_context(|| format!("Failed to write {}", dst.display()))
}

/// Copy everything under `public/` into the output root, keeping the tree
fn copy_public(public: &Path, output: &Path) -> Result<usize> {
    if !public.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(public) {
        let entry = entry.context("Failed to read public directory")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(public)
            .context("Public file outside public directory")?;
        let dst = output.join(relative);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::copy(entry.path(), &dst)
            .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        copied += 1;
    }
    tracing::debug!(copied, "public assets copied");
    Ok(copied)
}
