use crate::route::{RouteMatch, Router};

/// How a route path is written into a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    /// `/base/#/blog/hello`
    Hash,
    /// `/base/blog/hello`
    #[default]
    Path,
}

/// Converts between route paths and URLs under a base path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addressing {
    mode: HistoryMode,
    base: String,
}

impl Addressing {
    pub fn new(mode: HistoryMode, base: &str) -> Self {
        let trimmed = base.trim_matches('/');
        let base = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", trimmed)
        };
        Self { mode, base }
    }

    pub fn mode(&self) -> HistoryMode {
        self.mode
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// URL for a route path
    pub fn href(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        match self.mode {
            HistoryMode::Path => format!("{}{}", self.base, path),
            HistoryMode::Hash => format!("{}#/{}", self.base, path),
        }
    }

    /// URL for a static asset, never hash-addressed
    pub fn asset(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    /// Route path for a URL, `None` if it lies outside the base
    pub fn location_to_path(&self, location: &str) -> Option<String> {
        match self.mode {
            HistoryMode::Hash => {
                let (before, fragment) = match location.split_once('#') {
                    Some((before, fragment)) => (before, Some(fragment)),
                    None => (location, None),
                };
                self.strip_base(before)?;
                let path = fragment.unwrap_or("/").trim_start_matches('/');
                Some(format!("/{}", path))
            }
            HistoryMode::Path => self.strip_base(location),
        }
    }

    fn strip_base(&self, location: &str) -> Option<String> {
        let base_no_slash = self.base.trim_end_matches('/');
        if location == base_no_slash {
            return Some("/".to_string());
        }
        let rest = location.strip_prefix(&self.base)?;
        Some(format!("/{}", rest))
    }
}

/// In-memory navigation stack
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<String>,
    index: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History {
    pub fn new(initial: &str) -> Self {
        Self {
            entries: vec![initial.to_string()],
            index: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    /// Push a new entry, dropping any forward entries
    pub fn push(&mut self, path: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(path.to_string());
        self.index += 1;
    }

    pub fn replace(&mut self, path: &str) {
        self.entries[self.index] = path.to_string();
    }

    pub fn back(&mut self) -> Option<&str> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<&str> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    /// Number of entries, never zero: a history always holds its initial entry
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Router plus history: the active page follows the current entry
#[derive(Debug, Clone)]
pub struct Navigator {
    router: Router,
    history: History,
    addressing: Addressing,
}

impl Navigator {
    pub fn new(router: Router, addressing: Addressing) -> Self {
        Self {
            router,
            history: History::default(),
            addressing,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn addressing(&self) -> &Addressing {
        &self.addressing
    }

    /// Go to `path`. A redirected match records where it landed.
    pub fn navigate(&mut self, path: &str) -> RouteMatch {
        let matched = self.router.resolve(path);
        if matched.path != self.history.current() {
            self.history.push(&matched.path);
        }
        tracing::debug!(path, page = matched.name(), "navigated");
        matched
    }

    /// Go to the route a full URL points at. URLs outside the base are
    /// treated like unmatched paths.
    pub fn navigate_to_location(&mut self, location: &str) -> RouteMatch {
        match self.addressing.location_to_path(location) {
            Some(path) => self.navigate(&path),
            None => self.navigate(location),
        }
    }

    pub fn back(&mut self) -> Option<RouteMatch> {
        let path = self.history.back()?.to_string();
        Some(self.router.resolve(&path))
    }

    pub fn forward(&mut self) -> Option<RouteMatch> {
        let path = self.history.forward()?.to_string();
        Some(self.router.resolve(&path))
    }

    pub fn current(&self) -> RouteMatch {
        self.router.resolve(self.history.current())
    }

    pub fn href(&self, path: &str) -> String {
        self.addressing.href(path)
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Page;
    use nianouth_core::NotFoundPolicy;

    #[test]
    fn test_addressing_normalizes_base() {
        assert_eq!(Addressing::new(HistoryMode::Path, "").base(), "/");
        assert_eq!(Addressing::new(HistoryMode::Path, "/").base(), "/");
        assert_eq!(
            Addressing::new(HistoryMode::Path, "ai-agent-coding").base(),
            "/ai-agent-coding/"
        );
    }

    #[test]
    fn test_path_hrefs() {
        let a = Addressing::new(HistoryMode::Path, "/ai-agent-coding/");
        assert_eq!(a.href("/"), "/ai-agent-coding/");
        assert_eq!(a.href("/blog/hello"), "/ai-agent-coding/blog/hello");
        assert_eq!(a.asset("/logo.svg"), "/ai-agent-coding/logo.svg");
    }

    #[test]
    fn test_hash_hrefs() {
        let a = Addressing::new(HistoryMode::Hash, "/");
        assert_eq!(a.href("/"), "/#/");
        assert_eq!(a.href("/blog/hello"), "/#/blog/hello");
        assert_eq!(a.asset("logo.svg"), "/logo.svg");
    }

    #[test]
    fn test_location_to_path() {
        let path = Addressing::new(HistoryMode::Path, "/base/");
        assert_eq!(path.location_to_path("/base/blog").as_deref(), Some("/blog"));
        assert_eq!(path.location_to_path("/base").as_deref(), Some("/"));
        assert_eq!(path.location_to_path("/base/").as_deref(), Some("/"));
        assert!(path.location_to_path("/other/blog").is_none());

        let hash = Addressing::new(HistoryMode::Hash, "/base/");
        assert_eq!(hash.location_to_path("/base/#/blog/x").as_deref(), Some("/blog/x"));
        assert_eq!(hash.location_to_path("/base/").as_deref(), Some("/"));
        assert!(hash.location_to_path("/elsewhere/#/blog").is_none());
    }

    #[test]
    fn test_history_stack() {
        let mut h = History::default();
        assert_eq!(h.len(), 1);
        assert!(h.back().is_none());
        h.push("/blog");
        h.push("/blog/a");
        assert_eq!(h.back(), Some("/blog"));
        assert_eq!(h.forward(), Some("/blog/a"));
        assert!(h.forward().is_none());

        h.back();
        h.push("/about");
        assert_eq!(h.len(), 3);
        assert!(h.forward().is_none());
        h.replace("/");
        assert_eq!(h.current(), "/");
    }

    #[test]
    fn test_navigator_follows_history() {
        let mut nav = Navigator::new(Router::default(), Addressing::new(HistoryMode::Hash, "/"));
        assert_eq!(nav.current().page, Page::Home);

        let m = nav.navigate("/blog/welcome-to-my-blog");
        assert_eq!(m.page, Page::BlogPost);
        assert_eq!(m.slug(), Some("welcome-to-my-blog"));
        assert_eq!(nav.current().slug(), Some("welcome-to-my-blog"));

        nav.navigate("/about");
        assert_eq!(nav.back().unwrap().page, Page::BlogPost);
        assert_eq!(nav.back().unwrap().page, Page::Home);
        assert!(nav.back().is_none());
        assert_eq!(nav.forward().unwrap().page, Page::BlogPost);
    }

    #[test]
    fn test_navigating_to_same_path_does_not_grow_history() {
        let mut nav = Navigator::new(Router::default(), Addressing::new(HistoryMode::Path, "/"));
        nav.navigate("/blog");
        nav.navigate("/blog/");
        assert_eq!(nav.history().len(), 2);
    }

    #[test]
    fn test_navigate_to_location() {
        let mut nav = Navigator::new(
            Router::default(),
            Addressing::new(HistoryMode::Hash, "/ai-agent-coding/"),
        );
        let m = nav.navigate_to_location("/ai-agent-coding/#/blog/hello");
        assert_eq!(m.slug(), Some("hello"));
        assert_eq!(nav.href(&m.path), "/ai-agent-coding/#/blog/hello");
    }

    #[test]
    fn test_redirect_records_home() {
        let mut nav = Navigator::new(
            Router::new(NotFoundPolicy::Home),
            Addressing::new(HistoryMode::Path, "/"),
        );
        nav.navigate("/blog");
        let m = nav.navigate("/nowhere");
        assert!(m.redirected);
        assert_eq!(nav.history().current(), "/");
    }
}
