use super::load_site;
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, Uri, header},
    response::{
        IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use nianouth_core::{Site, config::parse_site_toml, config::validate_path};
use nianouth_generator::{PageQuery, RenderContext, render_page};
use nianouth_router::{Page, Router as SiteRouter};
use nianouth_store::{FetchOutcome, PostStore, source};
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use serde::Deserialize;
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::{RwLock, broadcast};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    site_path: PathBuf,
    /// Reloaded when site.toml changes
    site: Arc<RwLock<Site>>,
    store: PostStore,
    reload_tx: broadcast::Sender<()>,
}

/// Query parameters a routed page honours
#[derive(Debug, Deserialize)]
struct PageParams {
    tag: Option<String>,
}

/// Start preview server with hot reload for local development.
///
/// This command:
/// - Loads site.toml and starts fetching posts from the configured source
/// - Resolves every request through the site router and renders the page
/// - Serves files from `public/`
/// - Watches the blog directory, re-fetches posts and triggers hot reload
///
/// # Arguments
///
/// * `path` - Path to blog directory containing site.toml
/// * `port` - Port to serve on (default: `build.port`)
pub async fn run(path: PathBuf, port: Option<u16>) -> Result<()> {
    println!("📝 Starting preview server...");
    println!("   Blog: {}", path.display());

    let site = load_site(&path)?;
    let port = port.unwrap_or(site.build.port);

    let source = source::from_config(&site.posts, &path);
    println!("   ✓ Loaded: {}", site.info.title);
    println!("   ✓ Posts: {}", source.describe());

    let (reload_tx, _) = broadcast::channel::<()>(100);

    let state = AppState {
        site_path: path.clone(),
        site: Arc::new(RwLock::new(site)),
        store: PostStore::new(source),
        reload_tx: reload_tx.clone(),
    };

    // Pages render a loading notice until the first fetch lands
    refresh_posts(&state);

    let watcher_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = watch_files(watcher_state).await {
            tracing::error!(error = %e, "file watcher stopped");
        }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\n🚀 Preview ready at: http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app(state))
        .await
        .context("Server error")?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/_reload", get(sse_handler))
        .fallback(get(page_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Re-fetch posts in the background and reload browsers once they land.
/// A newer refresh supersedes this one, which then stays silent.
fn refresh_posts(state: &AppState) {
    let handle = state.store.fetch_posts();
    let reload_tx = state.reload_tx.clone();
    tokio::spawn(async move {
        match handle.wait().await {
            FetchOutcome::Applied(count) => {
                println!("   ✓ Loaded {} posts", count);
                let _ = reload_tx.send(());
            }
            FetchOutcome::Failed(e) => {
                tracing::warn!(error = %e, "post fetch failed");
                let _ = reload_tx.send(());
            }
            FetchOutcome::Superseded => {}
        }
    });
}

/// Watch for file changes and trigger reload
async fn watch_files(state: AppState) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;

    watcher.watch(&state.site_path, RecursiveMode::Recursive)?;

    let site_toml = state.site_path.join("site.toml");

    while let Some(event) = rx.recv().await {
        if !matches!(
            event.kind,
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
        ) {
            continue;
        }

        let out_dir = state.site_path.join(&state.site.read().await.info.out_dir);
        let relevant: Vec<&PathBuf> = event
            .paths
            .iter()
            .filter(|p| {
                let filename = p.file_name().unwrap_or_default().to_string_lossy();
                !filename.starts_with('.') && !filename.ends_with('~') && !p.starts_with(&out_dir)
            })
            .collect();
        if relevant.is_empty() {
            continue;
        }

        if relevant.iter().any(|p| **p == site_toml) {
            match parse_site_toml(&site_toml) {
                Ok(site) => {
                    if site.posts != state.site.read().await.posts {
                        println!("   ⚠ [posts] changed, restart preview to switch source");
                    }
                    *state.site.write().await = site;
                    println!("   📝 site.toml changed, reloading...");
                    let _ = state.reload_tx.send(());
                }
                Err(e) => eprintln!("   ✗ site.toml: {}", e),
            }
        } else {
            println!("   📝 File changed, refreshing posts...");
            refresh_posts(&state);
        }
    }

    Ok(())
}

/// SSE endpoint for hot reload
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            if rx.recv().await.is_ok() {
                yield Ok(Event::default().data("reload"));
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Every request that is not `/_reload`: a file from `public/`, else a
/// routed page
async fn page_handler(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
    uri: Uri,
) -> Response {
    if let Some(response) = serve_public(&state.site_path.join("public"), uri.path()).await {
        return response;
    }

    let site = state.site.read().await.clone();
    let ctx = RenderContext::new(&site, "/", true);
    let route = SiteRouter::new(site.build.not_found).resolve(uri.path());

    if route.redirected {
        return Redirect::to(&ctx.link(&route.path)).into_response();
    }

    // Select the post and render from the same result, so a concurrent
    // request for another slug cannot swap the post under us
    let mut snapshot = state.store.snapshot();
    if let Some(slug) = route.slug() {
        snapshot.current_post = state.store.fetch_post(slug);
    }

    let query = PageQuery {
        tag: params.tag.as_deref().filter(|tag| !tag.is_empty()),
    };
    let html = render_page(&ctx, &snapshot, &route, &query);

    let status = match route.page {
        Page::NotFound => StatusCode::NOT_FOUND,
        Page::BlogPost if snapshot.current_post.is_none() && !snapshot.loading => {
            StatusCode::NOT_FOUND
        }
        _ => StatusCode::OK,
    };
    (status, [(header::CONTENT_TYPE, "text/html; charset=utf-8")], html).into_response()
}

/// Serve a file from the public directory, `None` if there is no such file
async fn serve_public(public: &Path, request_path: &str) -> Option<Response> {
    let relative = request_path.trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }
    let relative = validate_path(relative, "request path").ok()?;
    let file = public.join(relative);
    if !file.is_file() {
        return None;
    }

    match tokio::fs::read(&file).await {
        Ok(data) => {
            let mime = mime_guess::from_path(&file).first_or_octet_stream();
            Some(([(header::CONTENT_TYPE, mime.to_string())], data).into_response())
        }
        Err(e) => {
            tracing::warn!(file = %file.display(), error = %e, "failed to read public file");
            Some(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use nianouth_core::config::parse_site_toml_str;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const SITE: &str = r#"
[site]
title = "Preview"
description = "Preview test"

[theme]

[posts]
source = "markdown"
"#;

    const HELLO: &str = "+++\ntitle = \"Hello Rust\"\nslug = \"hello\"\npublished_at = \"2025-01-01T00:00:00Z\"\ntags = [\"Rust\"]\n+++\n\nBody\n";
    const VUE: &str = "+++\ntitle = \"Vue Notes\"\nslug = \"vue\"\npublished_at = \"2025-02-01T00:00:00Z\"\ntags = [\"Vue\"]\n+++\n\nBody\n";

    async fn test_state(site_toml: &str) -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("site.toml"), site_toml).unwrap();
        fs::create_dir_all(dir.path().join("posts")).unwrap();
        fs::write(dir.path().join("posts/a.md"), HELLO).unwrap();
        fs::write(dir.path().join("posts/b.md"), VUE).unwrap();
        fs::create_dir_all(dir.path().join("public")).unwrap();
        fs::write(dir.path().join("public/logo.svg"), "<svg/>").unwrap();

        let site = parse_site_toml_str(site_toml).unwrap();
        let store = PostStore::new(source::from_config(&site.posts, dir.path()));
        assert!(store.fetch_posts().wait().await.is_applied());

        let (reload_tx, _) = broadcast::channel(4);
        let state = AppState {
            site_path: dir.path().to_path_buf(),
            site: Arc::new(RwLock::new(site)),
            store,
            reload_tx,
        };
        (dir, state)
    }

    async fn request(state: &AppState, uri: &str) -> (StatusCode, String, Option<String>) {
        let response = app(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned(), content_type)
    }

    #[tokio::test]
    async fn test_post_page() {
        let (_dir, state) = test_state(SITE).await;
        let (status, body, content_type) = request(&state, "/blog/hello").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Hello Rust"));
        assert!(body.contains("PREVIEW MODE"));
        assert_eq!(content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert_eq!(
            state.store.current_post().map(|p| p.slug),
            Some("hello".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_post_is_404() {
        let (_dir, state) = test_state(SITE).await;
        let (status, _, _) = request(&state, "/blog/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(state.store.current_post().is_none());
    }

    #[tokio::test]
    async fn test_unmatched_path_renders_not_found() {
        let (_dir, state) = test_state(SITE).await;
        let (status, body, _) = request(&state, "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<h1>404</h1>"));
    }

    #[tokio::test]
    async fn test_unmatched_path_redirects_home() {
        let site = format!("{}\n[build]\nnot_found = \"home\"\n", SITE);
        let (_dir, state) = test_state(&site).await;
        let response = app(state.clone())
            .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    }

    #[tokio::test]
    async fn test_tag_filter() {
        let (_dir, state) = test_state(SITE).await;
        let (_, body, _) = request(&state, "/blog?tag=Vue").await;
        assert!(body.contains("Vue Notes"));
        assert!(!body.contains("Hello Rust"));

        let (_, body, _) = request(&state, "/blog/").await;
        assert!(body.contains("Vue Notes"));
        assert!(body.contains("Hello Rust"));

        // Percent-encoded and empty values
        let (_, body, _) = request(&state, "/blog?tag=%52ust").await;
        assert!(body.contains("Hello Rust"));
        assert!(!body.contains("Vue Notes"));

        let (_, body, _) = request(&state, "/blog?tag=").await;
        assert!(body.contains("Vue Notes"));
        assert!(body.contains("Hello Rust"));
    }

    #[tokio::test]
    async fn test_serves_public_files() {
        let (_dir, state) = test_state(SITE).await;
        let (status, body, content_type) = request(&state, "/logo.svg").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<svg/>");
        assert_eq!(content_type.as_deref(), Some("image/svg+xml"));
    }

    #[tokio::test]
    async fn test_public_does_not_escape_directory() {
        let (_dir, state) = test_state(SITE).await;
        let (status, body, _) = request(&state, "/../site.toml").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.contains("[posts]"));
    }
}
