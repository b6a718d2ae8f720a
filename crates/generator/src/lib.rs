// Static site generation: routed pages rendered to HTML files

pub mod markdown;
pub mod pages;
pub mod template;

use nianouth_core::{Error, Result, Site, is_external_link};
use nianouth_router::{Addressing, HistoryMode, Page, RouteMatch, Router};
use nianouth_store::PostStore;

pub use pages::{PageQuery, render_page};

/// Settings shared by every rendered page
pub struct RenderContext<'a> {
    pub site: &'a Site,
    pub addressing: Addressing,
    /// Adds the live-reload script and preview badge
    pub preview: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(site: &'a Site, base: &str, preview: bool) -> Self {
        Self {
            site,
            addressing: Addressing::new(HistoryMode::Path, base),
            preview,
        }
    }

    /// URL of an internal route path, honouring the base path and
    /// `clean_urls`. External links pass through untouched.
    pub fn link(&self, path: &str) -> String {
        if is_external_link(path) {
            return path.to_string();
        }
        let trimmed = path.trim_end_matches('/');
        if self.preview || self.site.info.clean_urls || trimmed.is_empty() {
            self.addressing.href(path)
        } else {
            format!("{}.html", self.addressing.href(trimmed))
        }
    }

    pub fn post_link(&self, slug: &str) -> String {
        match Router::path_for(Page::BlogPost, Some(slug)) {
            Some(path) => self.link(&path),
            None => self.link("/blog"),
        }
    }

    pub fn asset(&self, path: &str) -> String {
        if is_external_link(path) {
            return path.to_string();
        }
        self.addressing.asset(path)
    }
}

/// A rendered page and the file it is written to
#[derive(Debug, Clone)]
pub struct GeneratedPage {
    pub route: String,
    pub file: String,
    pub html: String,
}

pub struct GeneratedSite {
    pub pages: Vec<GeneratedPage>,
    pub assets: Vec<(String, Vec<u8>)>, // (path, data)
}

/// Output file for a route path.
///
/// With clean URLs every route gets a directory with an `index.html`;
/// without them routes become `<path>.html`.
pub fn output_file(route_path: &str, clean_urls: bool) -> String {
    let trimmed = route_path.trim_matches('/');
    if trimmed.is_empty() {
        "index.html".to_string()
    } else if clean_urls {
        format!("{}/index.html", trimmed)
    } else {
        format!("{}.html", trimmed)
    }
}

/// Render every route of the site from the store's current posts.
///
/// Post pages select their post through `fetch_post`, so the store's
/// `current_post` is left on the last post rendered. Also writes
/// `posts.json` with the published posts, the shape `RemoteSource` reads.
pub fn generate_site(ctx: &RenderContext, store: &PostStore) -> Result<GeneratedSite> {
    let router = Router::new(ctx.site.build.not_found);
    let query = PageQuery::default();
    let mut pages = Vec::new();

    for route in pages::site_routes(&router, &store.snapshot()) {
        if let Some(slug) = route.slug() {
            store.fetch_post(slug);
        }
        pages.push(render_route(ctx, store, &route, &query));
    }

    let not_found = RouteMatch {
        page: Page::NotFound,
        path: "/404".to_string(),
        params: Vec::new(),
        redirected: false,
    };
    let mut page = render_route(ctx, store, &not_found, &query);
    page.file = "404.html".to_string();
    pages.push(page);

    let posts_json = serde_json::to_vec_pretty(&store.published_posts())
        .map_err(|e| Error::InvalidData(format!("Failed to serialize posts: {}", e)))?;

    tracing::debug!(pages = pages.len(), "site generated");
    Ok(GeneratedSite {
        pages,
        assets: vec![("posts.json".to_string(), posts_json)],
    })
}

fn render_route(ctx: &RenderContext, store: &PostStore, route: &RouteMatch, query: &PageQuery) -> GeneratedPage {
    let html = render_page(ctx, &store.snapshot(), route, query);
    GeneratedPage {
        route: route.path.clone(),
        file: output_file(&route.path, ctx.site.info.clean_urls),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nianouth_core::BlogPost;
    use nianouth_core::config::parse_site_toml_str;
    use nianouth_store::FixtureSource;
    use nianouth_store::source::welcome_post;
    use std::sync::Arc;
    use std::time::Duration;

    const SITE: &str = r##"
[site]
title = "NIANOUTH"
description = "探索现代 Web 开发技术"
lang = "zh-CN"

[meta]
keywords = ["Vue.js", "TypeScript"]
favicon = "/favicon.ico"

[theme]
logo = { src = "/logo.svg", alt = "博客 Logo" }

[[theme.nav]]
text = "首页"
link = "/"

[[theme.nav]]
text = "博客"
link = "/blog/"

[[theme.nav]]
text = "GitHub"
link = "https://github.com"
target = "_blank"

[[theme.sidebar]]
prefix = "/blog/"
text = "博客文章"
items = [{ text = "欢迎来到 NIANOUTH 技术博客", link = "/blog/welcome-to-my-blog" }]

[theme.edit_link]
pattern = "https://github.com/nianouth/blog/edit/main/docs/:path"
text = "在 GitHub 上编辑此页"

[theme.labels]
prev = "上一页"
next = "下一页"
not_found = "页面未找到"

[build]
production_base = "/ai-agent-coding/"
"##;

    fn site() -> Site {
        parse_site_toml_str(SITE).unwrap()
    }

    fn second_post() -> BlogPost {
        BlogPost {
            id: 2,
            title: "Vue 3 组合式 API 详解".to_string(),
            slug: "vue3-composition-api".to_string(),
            excerpt: "setup & friends".to_string(),
            content: "## Setup\n\nRefs and reactive state.\n".to_string(),
            published_at: Some("2025-03-01T10:00:00+08:00".to_string()),
            tags: vec!["Vue".to_string()],
            author: "作者".to_string(),
        }
    }

    async fn loaded_store() -> PostStore {
        let source = FixtureSource::new(vec![welcome_post(), second_post()])
            .with_delay(Duration::from_millis(0));
        let store = PostStore::new(Arc::new(source));
        store.fetch_posts().wait().await;
        store
    }

    #[test]
    fn test_output_file() {
        assert_eq!(output_file("/", true), "index.html");
        assert_eq!(output_file("/about", true), "about/index.html");
        assert_eq!(output_file("/blog/hello", true), "blog/hello/index.html");
        assert_eq!(output_file("/", false), "index.html");
        assert_eq!(output_file("/blog/hello", false), "blog/hello.html");
    }

    #[test]
    fn test_links_follow_base_and_clean_urls() {
        let mut site = site();
        let ctx = RenderContext::new(&site, "/ai-agent-coding/", false);
        assert_eq!(ctx.link("/blog/"), "/ai-agent-coding/blog/");
        assert_eq!(ctx.post_link("hello"), "/ai-agent-coding/blog/hello");
        assert_eq!(ctx.link("https://github.com"), "https://github.com");
        assert_eq!(ctx.asset("/logo.svg"), "/ai-agent-coding/logo.svg");

        site.info.clean_urls = false;
        let ctx = RenderContext::new(&site, "/", false);
        assert_eq!(ctx.link("/"), "/");
        assert_eq!(ctx.link("/blog/"), "/blog.html");
        assert_eq!(ctx.post_link("hello"), "/blog/hello.html");
    }

    #[tokio::test]
    async fn test_generate_site_pages() {
        let site = site();
        let store = loaded_store().await;
        let ctx = RenderContext::new(&site, "/", false);
        let generated = generate_site(&ctx, &store).unwrap();

        let files: Vec<&str> = generated.pages.iter().map(|p| p.file.as_str()).collect();
        assert_eq!(
            files,
            vec![
                "index.html",
                "about/index.html",
                "blog/index.html",
                "blog/welcome-to-my-blog/index.html",
                "blog/vue3-composition-api/index.html",
                "404.html",
            ]
        );
        assert_eq!(generated.assets[0].0, "posts.json");
        let posts: Vec<BlogPost> = serde_json::from_slice(&generated.assets[0].1).unwrap();
        assert_eq!(posts.len(), 2);
    }

    #[tokio::test]
    async fn test_post_page_content() {
        let site = site();
        let store = loaded_store().await;
        store.fetch_post("vue3-composition-api");
        let ctx = RenderContext::new(&site, "/", false);
        let route = Router::default().resolve("/blog/vue3-composition-api");
        let html = render_page(&ctx, &store.snapshot(), &route, &PageQuery::default());

        assert!(html.contains("<title>Vue 3 组合式 API 详解 | NIANOUTH</title>"));
        assert!(html.contains(r#"<h2 id="setup">Setup</h2>"#));
        assert!(html.contains("2025-03-01"));
        assert!(html.contains("https://github.com/nianouth/blog/edit/main/docs/blog/vue3-composition-api.md"));
        // Previous published post links back to the welcome post
        assert!(html.contains("上一页"));
        assert!(html.contains(r#"href="/blog/welcome-to-my-blog""#));
        // Sidebar for /blog/ is shown
        assert!(html.contains("博客文章"));
        assert!(!html.contains("PREVIEW MODE"));
    }

    #[tokio::test]
    async fn test_missing_post_renders_not_found_state() {
        let site = site();
        let store = loaded_store().await;
        store.fetch_post("does-not-exist");
        let ctx = RenderContext::new(&site, "/", false);
        let route = Router::default().resolve("/blog/does-not-exist");
        let html = render_page(&ctx, &store.snapshot(), &route, &PageQuery::default());
        assert!(html.contains("页面未找到"));
        assert!(html.contains("does-not-exist"));
    }

    #[tokio::test]
    async fn test_blog_list_and_tag_filter() {
        let site = site();
        let store = loaded_store().await;
        let ctx = RenderContext::new(&site, "/", true);
        let route = Router::default().resolve("/blog");

        let html = render_page(&ctx, &store.snapshot(), &route, &PageQuery::default());
        assert!(html.contains("<title>博客 | NIANOUTH</title>"));
        assert!(html.contains("欢迎来到 NIANOUTH 技术博客"));
        assert!(html.contains("setup &amp; friends"));
        assert!(html.contains("PREVIEW MODE"));
        assert!(html.contains("/_reload"));

        let query = PageQuery { tag: Some("TypeScript") };
        let html = render_page(&ctx, &store.snapshot(), &route, &query);
        assert!(html.contains("欢迎来到 NIANOUTH 技术博客"));
        assert!(!html.contains("setup &amp; friends"));
    }

    #[tokio::test]
    async fn test_home_page_layout() {
        let site = site();
        let store = loaded_store().await;
        let ctx = RenderContext::new(&site, "/ai-agent-coding/", false);
        let route = Router::default().resolve("/");
        let html = render_page(&ctx, &store.snapshot(), &route, &PageQuery::default());

        assert!(html.contains(r#"<html lang="zh-CN">"#));
        assert!(html.contains(r#"<meta name="keywords" content="Vue.js, TypeScript">"#));
        assert!(html.contains(r#"href="/ai-agent-coding/favicon.ico""#));
        assert!(html.contains(r#"src="/ai-agent-coding/logo.svg""#));
        assert!(html.contains(r#"target="_blank""#));
        assert!(html.contains(r#"<a href="/ai-agent-coding/" class="active">首页</a>"#));
    }

    #[test]
    fn test_loading_and_error_notices() {
        let site = site();
        let ctx = RenderContext::new(&site, "/", false);
        let state = nianouth_store::BlogState {
            loading: true,
            error: Some("transport error: <timeout>".to_string()),
            ..Default::default()
        };
        let route = Router::default().resolve("/blog");
        let html = render_page(&ctx, &state, &route, &PageQuery::default());
        assert!(html.contains("Loading..."));
        assert!(html.contains("transport error: &lt;timeout&gt;"));
    }

    #[test]
    fn test_unmatched_route_page() {
        let site = site();
        let ctx = RenderContext::new(&site, "/", false);
        let route = Router::default().resolve("/nope");
        let html = render_page(&ctx, &Default::default(), &route, &PageQuery::default());
        assert!(html.contains("<h1>404</h1>"));
    }
}
