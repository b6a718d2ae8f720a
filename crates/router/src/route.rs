use nianouth_core::NotFoundPolicy;

/// Page a path resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    About,
    /// Post list
    Blog,
    /// Single post, selected by the `slug` parameter
    BlogPost,
    NotFound,
}

impl Page {
    pub fn name(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::About => "About",
            Page::Blog => "Blog",
            Page::BlogPost => "BlogPost",
            Page::NotFound => "NotFound",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(&'static str),
    Param(&'static str),
}

/// One row of the route table
#[derive(Debug, Clone)]
pub struct RouteDef {
    pub pattern: &'static str,
    pub page: Page,
    segments: Vec<Segment>,
}

impl RouteDef {
    pub fn new(pattern: &'static str, page: Page) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name),
                None => Segment::Static(s),
            })
            .collect();
        Self {
            pattern,
            page,
            segments,
        }
    }

    fn matches(&self, segments: &[&str]) -> Option<Vec<(String, String)>> {
        if segments.len() != self.segments.len() {
            return None;
        }
        let mut params = Vec::new();
        for (expected, actual) in self.segments.iter().zip(segments) {
            match expected {
                Segment::Static(s) if s == actual => {}
                Segment::Static(_) => return None,
                Segment::Param(name) => params.push((name.to_string(), actual.to_string())),
            }
        }
        Some(params)
    }
}

/// Result of resolving a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub page: Page,
    /// Normalized path that was matched
    pub path: String,
    pub params: Vec<(String, String)>,
    /// The requested path was unmatched and the not-found policy sent it home
    pub redirected: bool,
}

impl RouteMatch {
    pub fn name(&self) -> &'static str {
        self.page.name()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn slug(&self) -> Option<&str> {
        self.param("slug")
    }
}

/// Maps URL paths to pages
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<RouteDef>,
    not_found: NotFoundPolicy,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(NotFoundPolicy::default())
    }
}

impl Router {
    pub fn new(not_found: NotFoundPolicy) -> Self {
        Self {
            routes: vec![
                RouteDef::new("/", Page::Home),
                RouteDef::new("/about", Page::About),
                RouteDef::new("/blog", Page::Blog),
                RouteDef::new("/blog/:slug", Page::BlogPost),
            ],
            not_found,
        }
    }

    pub fn routes(&self) -> &[RouteDef] {
        &self.routes
    }

    pub fn not_found_policy(&self) -> NotFoundPolicy {
        self.not_found
    }

    /// Resolve a path to exactly one page.
    ///
    /// Query strings and fragments are ignored and a trailing slash is
    /// insignificant. Parameters are captured verbatim.
    pub fn resolve(&self, path: &str) -> RouteMatch {
        let segments = split_path(path);
        let normalized = format!("/{}", segments.join("/"));

        for route in &self.routes {
            if let Some(params) = route.matches(&segments) {
                return RouteMatch {
                    page: route.page,
                    path: normalized,
                    params,
                    redirected: false,
                };
            }
        }

        tracing::debug!(path, "no route matched");
        match self.not_found {
            NotFoundPolicy::Page => RouteMatch {
                page: Page::NotFound,
                path: normalized,
                params: Vec::new(),
                redirected: false,
            },
            NotFoundPolicy::Home => RouteMatch {
                page: Page::Home,
                path: "/".to_string(),
                params: Vec::new(),
                redirected: true,
            },
        }
    }

    /// Path that resolves to `page`. `BlogPost` needs a slug; `NotFound` has
    /// no path of its own.
    pub fn path_for(page: Page, slug: Option<&str>) -> Option<String> {
        match page {
            Page::Home => Some("/".to_string()),
            Page::About => Some("/about".to_string()),
            Page::Blog => Some("/blog".to_string()),
            Page::BlogPost => slug
                .filter(|s| !s.is_empty() && !s.contains('/'))
                .map(|s| format!("/blog/{}", s)),
            Page::NotFound => None,
        }
    }
}

fn split_path(path: &str) -> Vec<&str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty()).collect()
}
