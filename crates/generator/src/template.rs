use crate::RenderContext;
use crate::markdown::Heading;
use nianouth_core::is_external_link;

/// HTML-escape a string to prevent XSS attacks
///
/// Escapes: & < > " '
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Everything the layout needs besides the page body
pub struct PageFrame<'a> {
    pub title: Option<&'a str>,
    pub path: &'a str,
    pub outline: &'a [Heading],
}

/// Wrap a rendered page body in the site layout
pub fn layout(ctx: &RenderContext, frame: &PageFrame, body: &str) -> String {
    let site = ctx.site;
    let theme = &site.theme;
    let labels = &theme.labels;

    let page_title = match frame.title {
        Some(title) => format!("{} | {}", html_escape(title), html_escape(&site.info.title)),
        None => html_escape(&site.info.title),
    };

    let description = site
        .meta
        .description
        .as_deref()
        .unwrap_or(&site.info.description);
    let keywords_meta = if site.meta.keywords.is_empty() {
        String::new()
    } else {
        format!(
            r#"<meta name="keywords" content="{}">"#,
            html_escape(&site.meta.keywords.join(", "))
        )
    };
    let favicon = site
        .meta
        .favicon
        .as_deref()
        .map(|href| format!(r#"<link rel="icon" href="{}">"#, html_escape(&ctx.asset(href))))
        .unwrap_or_default();

    let logo = theme
        .logo
        .as_ref()
        .map(|logo| {
            format!(
                r#"<img class="logo" src="{}" alt="{}">"#,
                html_escape(&ctx.asset(&logo.src)),
                html_escape(&logo.alt)
            )
        })
        .unwrap_or_default();

    let nav: String = theme
        .nav
        .iter()
        .map(|item| {
            let active = if is_active(frame.path, &item.link) {
                r#" class="active""#
            } else {
                ""
            };
            let target = item
                .target
                .as_deref()
                .map(|t| format!(r#" target="{}" rel="noopener noreferrer""#, html_escape(t)))
                .unwrap_or_default();
            format!(
                r#"<a href="{}"{}{}>{}</a>"#,
                html_escape(&ctx.link(&item.link)),
                active,
                target,
                html_escape(&item.text)
            )
        })
        .collect();

    let sidebar = match site.sidebar_for(frame.path) {
        Some(group) if !group.items.is_empty() => {
            let items: String = group
                .items
                .iter()
                .map(|item| {
                    let active = if frame.path == item.link.trim_end_matches('/') {
                        r#" class="active""#
                    } else {
                        ""
                    };
                    format!(
                        r#"<li><a href="{}"{}>{}</a></li>"#,
                        html_escape(&ctx.link(&item.link)),
                        active,
                        html_escape(&item.text)
                    )
                })
                .collect();
            format!(
                r#"<aside class="sidebar"><h2>{}</h2><ul>{}</ul></aside>"#,
                html_escape(&group.text),
                items
            )
        }
        _ => String::new(),
    };

    let outline = outline_html(labels.outline.as_str(), frame.outline);

    let social: String = theme
        .social
        .iter()
        .map(|link| {
            format!(
                r#"<a class="social social-{}" href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
                html_escape(&link.icon),
                html_escape(&link.link),
                html_escape(&link.icon)
            )
        })
        .collect();

    // Preview badge and reload script only in preview mode
    let preview_badge = if ctx.preview {
        r#"<div class="preview-badge">PREVIEW MODE - Live Reload Active</div>"#
    } else {
        ""
    };
    let reload_script = if ctx.preview { RELOAD_SCRIPT } else { "" };

    let footer_text = if ctx.preview {
        "Generated by nianouth • Press Ctrl+C to stop preview"
    } else {
        "Generated by nianouth"
    };

    format!(
        r##"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{page_title}</title>
    <meta name="description" content="{description}">
    {keywords_meta}
    {favicon}
    <style>{styles}</style>
</head>
<body>
    <a id="top"></a>
    <header class="navbar">
        <a class="brand" href="{home}">{logo}<span>{site_title}</span></a>
        <nav>{nav}</nav>
        <button class="theme-toggle" type="button" data-dark="{dark}" data-light="{light}">{dark}</button>
    </header>
    {preview_badge}
    <div class="layout">
        {sidebar}
        <main class="content">
{body}
        </main>
        {outline}
    </div>
    <footer class="footer">
        <div class="social-links">{social}</div>
        <a class="return-to-top" href="#top">{return_to_top}</a>
        <p>{footer_text}</p>
    </footer>
    <script>{theme_script}</script>
    {reload_script}
</body>
</html>"##,
        lang = html_escape(&site.info.lang),
        page_title = page_title,
        description = html_escape(description),
        keywords_meta = keywords_meta,
        favicon = favicon,
        styles = STYLES,
        home = html_escape(&ctx.link("/")),
        logo = logo,
        site_title = html_escape(&theme.site_title),
        nav = nav,
        dark = html_escape(&labels.dark_mode),
        light = html_escape(&labels.light_mode),
        preview_badge = preview_badge,
        sidebar = sidebar,
        body = body,
        outline = outline,
        social = social,
        return_to_top = html_escape(&labels.return_to_top),
        footer_text = footer_text,
        theme_script = THEME_SCRIPT,
        reload_script = reload_script,
    )
}

/// Nav links are active on their own path and below it; `/` only on itself
fn is_active(current: &str, link: &str) -> bool {
    if is_external_link(link) {
        return false;
    }
    let link = link.trim_end_matches('/');
    if link.is_empty() {
        return current == "/";
    }
    current == link || current.starts_with(&format!("{}/", link))
}

fn outline_html(label: &str, headings: &[Heading]) -> String {
    let items: String = headings
        .iter()
        .filter(|h| h.level >= 2)
        .map(|h| {
            format!(
                r##"<li class="level-{}"><a href="#{}">{}</a></li>"##,
                h.level,
                html_escape(&h.anchor),
                html_escape(&h.text)
            )
        })
        .collect();
    if items.is_empty() {
        return String::new();
    }
    format!(
        r#"<aside class="outline"><h2>{}</h2><ul>{}</ul></aside>"#,
        html_escape(label),
        items
    )
}

const RELOAD_SCRIPT: &str = r#"<script>
        // Hot reload via Server-Sent Events
        const eventSource = new EventSource('/_reload');
        eventSource.onmessage = () => {
            console.log('Reloading...');
            location.reload();
        };
        eventSource.onerror = () => {
            console.log('Preview server disconnected');
            eventSource.close();
        };
    </script>"#;

const THEME_SCRIPT: &str = r#"
        (function () {
            const root = document.documentElement;
            const button = document.querySelector('.theme-toggle');
            const apply = (mode) => {
                root.dataset.theme = mode;
                button.textContent = mode === 'dark' ? button.dataset.light : button.dataset.dark;
            };
            apply(localStorage.getItem('theme') || 'light');
            button.addEventListener('click', () => {
                const next = root.dataset.theme === 'dark' ? 'light' : 'dark';
                localStorage.setItem('theme', next);
                apply(next);
            });
        })();
    "#;

const STYLES: &str = r#"
        :root {
            --brand: #3451b2;
            --bg: #ffffff;
            --bg-soft: #f6f6f7;
            --text: #213547;
            --text-muted: #6b7280;
            --border: #e2e2e3;
        }
        :root[data-theme="dark"] {
            --brand: #a8b1ff;
            --bg: #1b1b1f;
            --bg-soft: #202127;
            --text: #dfdfd6;
            --text-muted: #98989f;
            --border: #2e2e32;
        }
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "PingFang SC", "Microsoft YaHei", sans-serif;
            line-height: 1.7;
            color: var(--text);
            background: var(--bg);
        }
        a { color: var(--brand); text-decoration: none; }
        a:hover { text-decoration: underline; }
        .navbar {
            display: flex;
            align-items: center;
            gap: 2rem;
            padding: 0.75rem 2rem;
            border-bottom: 1px solid var(--border);
        }
        .brand { display: flex; align-items: center; gap: 0.5rem; font-weight: 600; color: var(--text); }
        .logo { height: 28px; }
        .navbar nav { display: flex; gap: 1.25rem; flex: 1; }
        .navbar nav a { color: var(--text); }
        .navbar nav a.active { color: var(--brand); }
        .theme-toggle {
            background: var(--bg-soft);
            color: var(--text);
            border: 1px solid var(--border);
            border-radius: 4px;
            padding: 0.25rem 0.75rem;
            cursor: pointer;
        }
        .preview-badge {
            background: var(--brand);
            color: var(--bg);
            padding: 0.5rem 2rem;
            font-weight: bold;
        }
        .layout {
            display: flex;
            gap: 2rem;
            max-width: 1200px;
            margin: 0 auto;
            padding: 2rem;
        }
        .sidebar, .outline { width: 220px; flex-shrink: 0; font-size: 0.9rem; }
        .sidebar h2, .outline h2 { font-size: 0.9rem; margin-bottom: 0.5rem; }
        .sidebar ul, .outline ul { list-style: none; }
        .sidebar a.active { font-weight: 600; }
        .outline .level-3 { padding-left: 1rem; }
        .content { flex: 1; min-width: 0; }
        .content h1 { font-size: 2rem; margin-bottom: 1rem; }
        .content h2 { margin: 1.5rem 0 0.75rem; }
        .content p { margin-bottom: 1rem; }
        .content pre {
            background: var(--bg-soft);
            padding: 1rem;
            border-radius: 6px;
            overflow-x: auto;
            margin-bottom: 1rem;
        }
        .hero { padding: 3rem 0; }
        .hero h1 { font-size: 3rem; color: var(--brand); }
        .hero p { font-size: 1.2rem; color: var(--text-muted); }
        .post-list { list-style: none; }
        .post-card {
            padding: 1.25rem 0;
            border-bottom: 1px solid var(--border);
        }
        .post-card h2 { font-size: 1.3rem; margin: 0 0 0.25rem; }
        .post-meta { color: var(--text-muted); font-size: 0.85rem; margin-bottom: 0.5rem; }
        .tags { display: flex; gap: 0.5rem; flex-wrap: wrap; list-style: none; }
        .tag {
            background: var(--bg-soft);
            border: 1px solid var(--border);
            border-radius: 999px;
            padding: 0 0.6rem;
            font-size: 0.8rem;
        }
        .notice {
            padding: 1rem;
            border-left: 3px solid var(--brand);
            background: var(--bg-soft);
            margin-bottom: 1rem;
        }
        .notice.error { border-left-color: #e5484d; }
        .doc-footer {
            display: flex;
            justify-content: space-between;
            gap: 1rem;
            margin-top: 2rem;
            padding-top: 1rem;
            border-top: 1px solid var(--border);
        }
        .doc-footer .label { display: block; font-size: 0.8rem; color: var(--text-muted); }
        .edit-link { display: inline-block; margin-top: 2rem; }
        .footer {
            border-top: 1px solid var(--border);
            padding: 2rem;
            text-align: center;
            color: var(--text-muted);
            font-size: 0.9rem;
        }
        .social-links { display: flex; gap: 1rem; justify-content: center; margin-bottom: 0.5rem; }
        .return-to-top { display: inline-block; margin-bottom: 0.5rem; }
        @media (max-width: 960px) {
            .outline { display: none; }
        }
        @media (max-width: 768px) {
            .layout { flex-direction: column; }
            .sidebar { width: 100%; }
            .navbar { flex-wrap: wrap; gap: 1rem; }
        }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
        assert_eq!(html_escape("欢迎"), "欢迎");
    }

    #[test]
    fn test_is_active() {
        assert!(is_active("/", "/"));
        assert!(!is_active("/blog", "/"));
        assert!(is_active("/blog", "/blog/"));
        assert!(is_active("/blog/hello", "/blog/"));
        assert!(!is_active("/blogroll", "/blog/"));
        assert!(!is_active("/", "https://github.com"));
    }

    #[test]
    fn test_outline_skips_h1_and_empty() {
        let headings = vec![
            Heading {
                level: 1,
                text: "Title".to_string(),
                anchor: "title".to_string(),
            },
            Heading {
                level: 3,
                text: "Detail".to_string(),
                anchor: "detail".to_string(),
            },
        ];
        let html = outline_html("页面导航", &headings);
        assert!(html.contains("页面导航"));
        assert!(html.contains(r##"<li class="level-3"><a href="#detail">Detail</a></li>"##));
        assert!(!html.contains("#title"));
        assert!(outline_html("x", &headings[..1]).is_empty());
    }
}
