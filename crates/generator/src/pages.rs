use crate::RenderContext;
use crate::markdown::{Heading, render_markdown};
use crate::template::{PageFrame, html_escape, layout};
use nianouth_core::BlogPost;
use nianouth_router::{Page, RouteMatch, Router};
use nianouth_store::BlogState;

const HOME_LATEST: usize = 5;

/// Query options a page may honour
#[derive(Debug, Clone, Default)]
pub struct PageQuery<'a> {
    /// Restrict the post list to one tag
    pub tag: Option<&'a str>,
}

/// Render the page a route resolved to, from a state snapshot.
///
/// `BlogPost` pages render `state.current_post`, so the caller selects the
/// post with `PostStore::fetch_post` before taking the snapshot.
pub fn render_page(ctx: &RenderContext, state: &BlogState, route: &RouteMatch, query: &PageQuery) -> String {
    let (title, body, outline) = match route.page {
        Page::Home => (None, home(ctx, state), Vec::new()),
        Page::About => (Some(nav_text(ctx, "/about", "About")), about(ctx, state), Vec::new()),
        Page::Blog => (
            Some(nav_text(ctx, "/blog", "Blog")),
            blog(ctx, state, query.tag),
            Vec::new(),
        ),
        Page::BlogPost => match &state.current_post {
            Some(post) => {
                let (body, outline) = blog_post(ctx, state, post);
                (Some(post.title.clone()), body, outline)
            }
            None => (
                Some(ctx.site.theme.labels.not_found.clone()),
                post_not_found(ctx, state, route.slug().unwrap_or_default()),
                Vec::new(),
            ),
        },
        Page::NotFound => (
            Some(ctx.site.theme.labels.not_found.clone()),
            not_found(ctx),
            Vec::new(),
        ),
    };

    let frame = PageFrame {
        title: title.as_deref(),
        path: &route.path,
        outline: &outline,
    };
    layout(ctx, &frame, &body)
}

/// Text of the nav item pointing at `path`, or a fallback
fn nav_text(ctx: &RenderContext, path: &str, fallback: &str) -> String {
    ctx.site
        .theme
        .nav
        .iter()
        .find(|item| item.link.trim_end_matches('/') == path)
        .map(|item| item.text.clone())
        .unwrap_or_else(|| fallback.to_string())
}

fn status_notice(ctx: &RenderContext, state: &BlogState) -> String {
    let mut out = String::new();
    if state.loading {
        out.push_str(&format!(
            r#"<div class="notice loading">{}</div>"#,
            html_escape(&ctx.site.theme.labels.loading)
        ));
    }
    if let Some(error) = &state.error {
        out.push_str(&format!(
            r#"<div class="notice error">{}</div>"#,
            html_escape(error)
        ));
    }
    out
}

fn home(ctx: &RenderContext, state: &BlogState) -> String {
    let latest: Vec<&BlogPost> = state.published_posts().into_iter().take(HOME_LATEST).collect();
    let list = if latest.is_empty() {
        String::new()
    } else {
        format!(
            r#"<section class="latest"><h2>{}</h2>{}<p><a href="{}">{} →</a></p></section>"#,
            html_escape(&nav_text(ctx, "/blog", "Blog")),
            post_list(ctx, &latest),
            html_escape(&ctx.link("/blog")),
            html_escape(&nav_text(ctx, "/blog", "Blog"))
        )
    };

    format!(
        r#"<section class="hero">
            <h1>{}</h1>
            <p>{}</p>
        </section>
        {}
        {}"#,
        html_escape(&ctx.site.theme.site_title),
        html_escape(&ctx.site.info.description),
        status_notice(ctx, state),
        list
    )
}

fn about(ctx: &RenderContext, state: &BlogState) -> String {
    let mut authors: Vec<&str> = Vec::new();
    for post in &state.posts {
        if !post.author.is_empty() && !authors.contains(&post.author.as_str()) {
            authors.push(&post.author);
        }
    }
    let authors_html = if authors.is_empty() {
        String::new()
    } else {
        let names: Vec<String> = authors.iter().map(|a| html_escape(a)).collect();
        format!(r#"<p class="authors">{}</p>"#, names.join(" · "))
    };

    format!(
        r#"<h1>{}</h1>
        <p>{}</p>
        {}
        {}"#,
        html_escape(&nav_text(ctx, "/about", "About")),
        html_escape(&ctx.site.info.description),
        authors_html,
        tag_list(ctx, &state.tags())
    )
}

fn blog(ctx: &RenderContext, state: &BlogState, tag: Option<&str>) -> String {
    let posts: Vec<&BlogPost> = match tag {
        Some(tag) => state
            .posts_by_tag(tag)
            .into_iter()
            .filter(|p| p.is_published())
            .collect(),
        None => state.published_posts(),
    };

    let heading = match tag {
        Some(tag) => format!(
            r#"<h1>{} <span class="tag">{}</span></h1>"#,
            html_escape(&nav_text(ctx, "/blog", "Blog")),
            html_escape(tag)
        ),
        None => format!("<h1>{}</h1>", html_escape(&nav_text(ctx, "/blog", "Blog"))),
    };

    format!(
        "{}\n{}\n{}",
        heading,
        status_notice(ctx, state),
        post_list(ctx, &posts)
    )
}

fn blog_post(ctx: &RenderContext, state: &BlogState, post: &BlogPost) -> (String, Vec<Heading>) {
    let labels = &ctx.site.theme.labels;
    let (content, outline) = render_markdown(&post.content);

    let edit_link = ctx
        .site
        .theme
        .edit_link
        .as_ref()
        .map(|link| {
            format!(
                r#"<a class="edit-link" href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
                html_escape(&link.url_for(&format!("blog/{}.md", post.slug))),
                html_escape(&link.text)
            )
        })
        .unwrap_or_default();

    let (prev, next) = state.adjacent_published(&post.slug);
    let footer_link = |post: Option<&BlogPost>, label: &str, class: &str| match post {
        Some(p) => format!(
            r#"<a class="{}" href="{}"><span class="label">{}</span>{}</a>"#,
            class,
            html_escape(&ctx.post_link(&p.slug)),
            html_escape(label),
            html_escape(&p.title)
        ),
        None => "<span></span>".to_string(),
    };
    let doc_footer = if prev.is_some() || next.is_some() {
        format!(
            r#"<nav class="doc-footer">{}{}</nav>"#,
            footer_link(prev, &labels.prev, "prev"),
            footer_link(next, &labels.next, "next")
        )
    } else {
        String::new()
    };

    let body = format!(
        r#"<article class="post">
            <h1>{}</h1>
            <div class="post-meta">{}</div>
            {}
            <div class="post-content">
{}
            </div>
            {}
            {}
        </article>"#,
        html_escape(&post.title),
        post_meta(ctx, post),
        tag_list(ctx, &post.tags.iter().map(String::as_str).collect::<Vec<_>>()),
        content,
        edit_link,
        doc_footer
    );
    (body, outline)
}

fn post_not_found(ctx: &RenderContext, state: &BlogState, slug: &str) -> String {
    format!(
        r#"<h1>{}</h1>
        {}
        <p class="notice">{}</p>
        <p><a href="{}">← {}</a></p>"#,
        html_escape(&ctx.site.theme.labels.not_found),
        status_notice(ctx, state),
        html_escape(slug),
        html_escape(&ctx.link("/blog")),
        html_escape(&nav_text(ctx, "/blog", "Blog"))
    )
}

fn not_found(ctx: &RenderContext) -> String {
    format!(
        r#"<h1>404</h1>
        <p>{}</p>
        <p><a href="{}">← {}</a></p>"#,
        html_escape(&ctx.site.theme.labels.not_found),
        html_escape(&ctx.link("/")),
        html_escape(&ctx.site.theme.site_title)
    )
}

fn post_list(ctx: &RenderContext, posts: &[&BlogPost]) -> String {
    let items: String = posts
        .iter()
        .map(|post| {
            format!(
                r#"<li class="post-card">
                <h2><a href="{}">{}</a></h2>
                <div class="post-meta">{}</div>
                <p>{}</p>
                {}
            </li>"#,
                html_escape(&ctx.post_link(&post.slug)),
                html_escape(&post.title),
                post_meta(ctx, post),
                html_escape(&post.excerpt),
                tag_list(ctx, &post.tags.iter().map(String::as_str).collect::<Vec<_>>())
            )
        })
        .collect();
    format!(r#"<ul class="post-list">{}</ul>"#, items)
}

fn post_meta(ctx: &RenderContext, post: &BlogPost) -> String {
    let mut parts = Vec::new();
    if !post.author.is_empty() {
        parts.push(html_escape(&post.author));
    }
    if ctx.site.info.last_updated
        && let Some(date) = post.published_date()
    {
        parts.push(format!(
            r#"<time datetime="{}">{}</time>"#,
            html_escape(&date.to_rfc3339()),
            date.format("%Y-%m-%d")
        ));
    }
    parts.join(" · ")
}

fn tag_list(ctx: &RenderContext, tags: &[&str]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let items: String = tags
        .iter()
        .map(|tag| {
            format!(
                r#"<li><a class="tag" href="{}?tag={}">{}</a></li>"#,
                html_escape(&ctx.link("/blog")),
                html_escape(&encode_query_value(tag)),
                html_escape(tag)
            )
        })
        .collect();
    format!(r#"<ul class="tags">{}</ul>"#, items)
}

/// Percent-encode everything but unreserved characters
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Routes to render for a full site build: every page plus one per
/// published post. Drafts get no page.
pub fn site_routes(router: &Router, state: &BlogState) -> Vec<RouteMatch> {
    let mut routes = Vec::new();
    for page in [Page::Home, Page::About, Page::Blog] {
        if let Some(path) = Router::path_for(page, None) {
            routes.push(router.resolve(&path));
        }
    }
    for post in state.published_posts() {
        if let Some(path) = Router::path_for(Page::BlogPost, Some(&post.slug)) {
            routes.push(router.resolve(&path));
        }
    }
    routes
}
