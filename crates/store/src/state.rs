use nianouth_core::BlogPost;

/// Everything the store knows. Readers only ever see snapshots of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogState {
    /// In fetch order
    pub posts: Vec<BlogPost>,
    pub current_post: Option<BlogPost>,
    pub loading: bool,
    /// Message of the last failed fetch, cleared by the next successful one
    pub error: Option<String>,
}

impl BlogState {
    /// Posts with a non-empty `published_at`, in fetch order
    pub fn published_posts(&self) -> Vec<&BlogPost> {
        self.posts.iter().filter(|p| p.is_published()).collect()
    }

    /// Posts carrying exactly `tag`, in fetch order
    pub fn posts_by_tag(&self, tag: &str) -> Vec<&BlogPost> {
        self.posts.iter().filter(|p| p.has_tag(tag)).collect()
    }

    /// First post with the given slug
    pub fn find_by_slug(&self, slug: &str) -> Option<&BlogPost> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    /// Distinct tags across all posts, in first-seen order
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for tag in self.posts.iter().flat_map(|p| p.tags.iter()) {
            if !tags.contains(&tag.as_str()) {
                tags.push(tag);
            }
        }
        tags
    }

    /// Neighbours of a post among the published posts: (previous, next)
    pub fn adjacent_published(&self, slug: &str) -> (Option<&BlogPost>, Option<&BlogPost>) {
        let published = self.published_posts();
        match published.iter().position(|p| p.slug == slug) {
            Some(i) => {
                let prev = i.checked_sub(1).and_then(|j| published.get(j).copied());
                let next = published.get(i + 1).copied();
                (prev, next)
            }
            None => (None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: u64, slug: &str, published: bool, tags: &[&str]) -> BlogPost {
        BlogPost {
            id,
            title: slug.to_uppercase(),
            slug: slug.to_string(),
            excerpt: String::new(),
            content: String::new(),
            published_at: published.then(|| "2025-01-01T00:00:00Z".to_string()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            author: String::new(),
        }
    }

    fn state() -> BlogState {
        BlogState {
            posts: vec![
                post(1, "a", true, &["Vue", "Vite"]),
                post(2, "b", false, &["Vue"]),
                post(3, "c", true, &["TypeScript", "Vue"]),
                post(4, "d", true, &["vue"]),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_state() {
        let state = BlogState::default();
        assert!(state.posts.is_empty());
        assert!(state.current_post.is_none());
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_published_posts_subset_in_order() {
        let state = state();
        let published = state.published_posts();
        let slugs: Vec<&str> = published.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "c", "d"]);
        assert!(published.iter().all(|p| p.is_published()));
        assert!(published.iter().all(|p| state.posts.contains(p)));
    }

    #[test]
    fn test_posts_by_tag_exact_match_in_order() {
        let state = state();
        let slugs: Vec<&str> = state
            .posts_by_tag("Vue")
            .iter()
            .map(|p| p.slug.as_str())
            .collect();
        assert_eq!(slugs, vec!["a", "b", "c"]);
        assert!(state.posts_by_tag("Vu").is_empty());
        assert_eq!(state.posts_by_tag("vue").len(), 1);
    }

    #[test]
    fn test_tags_distinct() {
        assert_eq!(state().tags(), vec!["Vue", "Vite", "TypeScript", "vue"]);
    }

    #[test]
    fn test_adjacent_published_skips_drafts() {
        let state = state();
        let (prev, next) = state.adjacent_published("c");
        assert_eq!(prev.unwrap().slug, "a");
        assert_eq!(next.unwrap().slug, "d");

        let (prev, next) = state.adjacent_published("a");
        assert!(prev.is_none());
        assert_eq!(next.unwrap().slug, "c");

        assert_eq!(state.adjacent_published("b"), (None, None));
    }
}
