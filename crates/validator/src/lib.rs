// Site validation: post identity, publication dates and link targets

use nianouth_core::{BlogPost, Site, is_external_link, is_url_safe_slug};
use nianouth_router::{Page, Router};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a site and its posts.
///
/// Errors make the site unbuildable (a slug lookup would be ambiguous or a
/// post URL unusable). Warnings point at links that lead nowhere.
pub fn validate_site(site: &Site, posts: &[BlogPost]) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_posts(posts, &mut report);
    validate_links(site, posts, &mut report);

    let published = posts.iter().filter(|p| p.is_published()).count();
    report.info.push(format!(
        "{} posts ({} published, {} drafts)",
        posts.len(),
        published,
        posts.len() - published
    ));
    report
}

fn validate_posts(posts: &[BlogPost], report: &mut ValidationReport) {
    let mut slugs: HashMap<&str, u64> = HashMap::new();
    let mut ids: HashSet<u64> = HashSet::new();

    for post in posts {
        if post.slug.is_empty() {
            report
                .errors
                .push(format!("Post {} ('{}') has an empty slug", post.id, post.title));
        } else if !is_url_safe_slug(&post.slug) {
            report.errors.push(format!(
                "Post {} has a slug that is not URL-safe: '{}' (use lowercase letters, digits and '-')",
                post.id, post.slug
            ));
        }

        if let Some(first) = slugs.insert(&post.slug, post.id) {
            report.errors.push(format!(
                "Duplicate slug '{}' used by posts {} and {}",
                post.slug, first, post.id
            ));
        }

        if !ids.insert(post.id) {
            report.errors.push(format!("Duplicate post id {}", post.id));
        }

        if post.is_published() && post.published_date().is_none() {
            report.warnings.push(format!(
                "Post '{}' has a published_at that is not an RFC 3339 timestamp: '{}'",
                post.slug,
                post.published_at.as_deref().unwrap_or_default()
            ));
        }

        if !post.is_published() {
            report
                .info
                .push(format!("Post '{}' is a draft and will not be listed", post.slug));
        }
    }
}

fn validate_links(site: &Site, posts: &[BlogPost], report: &mut ValidationReport) {
    let router = Router::new(site.build.not_found);
    let known: HashSet<&str> = posts.iter().map(|p| p.slug.as_str()).collect();

    let nav = site.theme.nav.iter().map(|item| ("theme.nav", &item.link));
    let sidebar = site
        .theme
        .sidebar
        .iter()
        .flat_map(|group| group.items.iter())
        .map(|item| ("theme.sidebar", &item.link));

    for (field, link) in nav.chain(sidebar) {
        if is_external_link(link) {
            continue;
        }
        let matched = router.resolve(link);
        if matched.page == Page::NotFound || matched.redirected {
            report
                .warnings
                .push(format!("Link '{}' in {} does not match any route", link, field));
        } else if let Some(slug) = matched.slug()
            && !known.contains(slug)
        {
            report
                .warnings
                .push(format!("Link '{}' in {} points to an unknown post", link, field));
        }
    }
}
