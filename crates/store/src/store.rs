use crate::error::FetchError;
use crate::source::PostSource;
use crate::state::BlogState;
use nianouth_core::BlogPost;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

/// Single source of truth for blog post data.
///
/// `PostStore` is a handle: clones share one `BlogState`, and only the two
/// actions below write to it. Readers take snapshots or subscribe to
/// changes.
#[derive(Clone)]
pub struct PostStore {
    inner: Arc<Inner>,
}

struct Inner {
    state: watch::Sender<BlogState>,
    source: Arc<dyn PostSource>,
    /// Id of the most recently started `fetch_posts`. Only read or written
    /// inside `send_modify`/`send_if_modified` so it changes in lockstep
    /// with the state.
    generation: AtomicU64,
    in_flight: Mutex<Option<AbortHandle>>,
}

/// How a `fetch_posts` call ended
#[derive(Debug)]
pub enum FetchOutcome {
    /// Posts were replaced with this many entries
    Applied(usize),
    /// The source failed; posts were left unchanged
    Failed(FetchError),
    /// A later fetch started first, or the fetch was cancelled
    Superseded,
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied(_))
    }
}

/// Handle to an in-flight `fetch_posts`
pub struct FetchHandle {
    task: JoinHandle<FetchOutcome>,
}

impl FetchHandle {
    /// Wait for the fetch to settle
    pub async fn wait(self) -> FetchOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => FetchOutcome::Superseded,
            Err(e) => FetchOutcome::Failed(FetchError::Transport(format!("fetch task panicked: {}", e))),
        }
    }

    /// Abort the fetch. Posts stay as they are and `loading` is cleared.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Clears `loading` when the fetch that owns it goes away, whether it
/// completed, failed or was aborted mid-flight.
struct LoadingGuard {
    inner: Arc<Inner>,
    generation: u64,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let inner = &self.inner;
        let generation = self.generation;
        inner.state.send_if_modified(|state| {
            if inner.generation.load(Ordering::SeqCst) == generation && state.loading {
                state.loading = false;
                true
            } else {
                false
            }
        });
    }
}

impl PostStore {
    pub fn new(source: Arc<dyn PostSource>) -> Self {
        let (state, _) = watch::channel(BlogState::default());
        Self {
            inner: Arc::new(Inner {
                state,
                source,
                generation: AtomicU64::new(0),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Replace `posts` with whatever the source returns.
    ///
    /// `loading` is set before this returns; the source runs on a spawned
    /// task. Starting another fetch aborts this one and the last started
    /// fetch wins. Must be called from within a tokio runtime.
    pub fn fetch_posts(&self) -> FetchHandle {
        let mut generation = 0;
        self.inner.state.send_modify(|state| {
            generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.loading = true;
        });
        tracing::debug!(generation, source = %self.inner.source.describe(), "fetching posts");

        let guard = LoadingGuard {
            inner: self.inner.clone(),
            generation,
        };
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            let result = inner.source.fetch_posts().await;
            inner.complete(generation, result)
        });

        let previous = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(task.abort_handle());
        if let Some(previous) = previous {
            previous.abort();
        }

        FetchHandle { task }
    }

    /// Select the loaded post with this slug as `current_post`.
    ///
    /// Only the posts already in the store are searched. An unknown slug
    /// leaves `current_post` as `None`. The scan happens in one state
    /// update, so its loading transition is never observable and a posts
    /// fetch still in flight keeps its own `loading` flag.
    pub fn fetch_post(&self, slug: &str) -> Option<BlogPost> {
        let mut found = None;
        self.inner.state.send_modify(|state| {
            state.current_post = state.find_by_slug(slug).cloned();
            found = state.current_post.clone();
        });
        if found.is_none() {
            tracing::debug!(slug, "post not found");
        }
        found
    }

    pub fn subscribe(&self) -> watch::Receiver<BlogState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> BlogState {
        self.inner.state.borrow().clone()
    }

    pub fn posts(&self) -> Vec<BlogPost> {
        self.inner.state.borrow().posts.clone()
    }

    pub fn current_post(&self) -> Option<BlogPost> {
        self.inner.state.borrow().current_post.clone()
    }

    pub fn loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    pub fn published_posts(&self) -> Vec<BlogPost> {
        self.inner
            .state
            .borrow()
            .published_posts()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn posts_by_tag(&self, tag: &str) -> Vec<BlogPost> {
        self.inner
            .state
            .borrow()
            .posts_by_tag(tag)
            .into_iter()
            .cloned()
            .collect()
    }
}

impl Inner {
    fn complete(&self, generation: u64, result: Result<Vec<BlogPost>, FetchError>) -> FetchOutcome {
        let mut result = Some(result);
        let mut outcome = FetchOutcome::Superseded;

        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match result.take() {
                Some(Ok(posts)) => {
                    outcome = FetchOutcome::Applied(posts.len());
                    state.posts = posts;
                    state.error = None;
                }
                Some(Err(err)) => {
                    state.error = Some(err.to_string());
                    outcome = FetchOutcome::Failed(err);
                }
                None => return false,
            }
            state.loading = false;
            true
        });

        match &outcome {
            FetchOutcome::Applied(count) => tracing::info!(generation, count, "posts loaded"),
            FetchOutcome::Failed(err) => tracing::warn!(generation, error = %err, "failed to fetch posts"),
            FetchOutcome::Superseded => tracing::warn!(generation, "discarding superseded fetch"),
        }
        outcome
    }
}
