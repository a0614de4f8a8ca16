//! Places rendered posts into a container and keeps it fresh.
//!
//! The presenter owns the refresh cycle counter. Every fetch is stamped with
//! the cycle that started it, and a batch from a cycle older than the last
//! applied one is dropped so a slow response never overwrites newer content.

use crate::config::FeedConfig;
use crate::feeds::profile::ProfileLookup;
use crate::feeds::{FeedData, FeedFetcher, FeedMessage, FetchedPost};
use crate::post::{Post, RenderedPost};
use crate::render::{escape_html, render_with, wrap, RenderOptions};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Rendered posts, newest batch first.
#[derive(Debug, Clone, Default)]
pub struct Container {
    posts: Vec<RenderedPost>,
    limit: Option<usize>,
}

impl Container {
    /// A container that keeps at most `limit` posts, dropping the oldest.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            posts: Vec::new(),
            limit: Some(limit.max(1)),
        }
    }

    /// Insert `batch` above the current content, keeping batch order and
    /// skipping posts already shown. Returns how many were added.
    pub fn prepend(&mut self, batch: Vec<RenderedPost>) -> usize {
        let mut seen: HashSet<String> = self.posts.iter().map(|p| p.id.clone()).collect();
        let mut fresh: Vec<RenderedPost> = batch
            .into_iter()
            .filter(|post| seen.insert(post.id.clone()))
            .collect();
        let added = fresh.len();
        fresh.append(&mut self.posts);
        self.posts = fresh;
        if let Some(limit) = self.limit {
            self.posts.truncate(limit);
        }
        added
    }

    pub fn posts(&self) -> &[RenderedPost] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn to_html(&self) -> String {
        self.posts.iter().map(|p| p.markup.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { added: usize },
    Superseded,
}

pub struct Presenter {
    config: FeedConfig,
    options: RenderOptions,
    container: Container,
    next_cycle: u64,
    applied_cycle: u64,
    last_error: Option<String>,
    profiles: Option<Arc<dyn ProfileLookup>>,
}

impl Presenter {
    pub fn new(config: FeedConfig) -> Self {
        let options = config.render_options();
        let container = Container::with_limit(config.max_posts.max(config.count));
        Self {
            config,
            options,
            container,
            next_cycle: 0,
            applied_cycle: 0,
            last_error: None,
            profiles: None,
        }
    }

    /// Attach the lookup used for mention hover previews.
    pub fn with_profiles(mut self, profiles: Arc<dyn ProfileLookup>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Start a new refresh cycle and return its number.
    pub fn begin_cycle(&mut self) -> u64 {
        self.next_cycle += 1;
        self.next_cycle
    }

    /// Render a post, falling back to plain text if its annotations are invalid.
    fn render_post(&self, post: &Post) -> RenderedPost {
        match render_with(post, &self.options) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(post_id = %post.id, error = %e, "rendering post without entities");
                RenderedPost {
                    id: post.id.clone(),
                    markup: wrap(&post.id, &post.text),
                }
            }
        }
    }

    pub fn apply(&mut self, cycle: u64, posts: &[Post]) -> ApplyOutcome {
        if cycle <= self.applied_cycle {
            debug!(cycle, applied = self.applied_cycle, "dropping superseded batch");
            return ApplyOutcome::Superseded;
        }

        let rendered: Vec<RenderedPost> = posts.iter().map(|post| self.render_post(post)).collect();
        let added = self.container.prepend(rendered);
        self.applied_cycle = cycle;
        self.last_error = None;

        info!(cycle, added, total = self.container.len(), "applied batch");
        ApplyOutcome::Applied { added }
    }

    /// Handle one fetch result. Returns true when the container changed.
    pub fn handle(&mut self, message: FeedMessage) -> bool {
        match message.data {
            FeedData::Posts(fetched) => {
                let posts: Vec<Post> = fetched.into_iter().map(resolve).collect();
                matches!(
                    self.apply(message.cycle, &posts),
                    ApplyOutcome::Applied { added } if added > 0
                )
            }
            FeedData::Error(error) if message.cycle <= self.applied_cycle => {
                debug!(cycle = message.cycle, applied = self.applied_cycle, %error, "ignoring superseded fetch error");
                false
            }
            FeedData::Error(error) => {
                warn!(cycle = message.cycle, %error, "fetch failed");
                self.last_error = Some(error);
                false
            }
        }
    }

    fn follow_button(&self) -> String {
        let username = escape_html(&self.config.username);
        format!(
            r#"<a class="follow-button" href="{}/{}">Follow @{}</a>"#,
            escape_html(&self.options.site_url),
            escape_html(&urlencoding::encode(&self.config.username)),
            username
        )
    }

    pub fn to_html(&self) -> String {
        let mut html = format!(
            r#"<div class="postfeed" data-username="{}">"#,
            escape_html(&self.config.username)
        );
        html.push_str(&self.container.to_html());
        if self.config.follow_button {
            html.push_str(&self.follow_button());
        }
        html.push_str("</div>");
        html
    }

    /// Screen names carried by rendered mentions, in document order.
    pub fn mention_targets(&self) -> Vec<String> {
        let Ok(selector) = Selector::parse("a.post-mention[data-screen-name]") else {
            return Vec::new();
        };
        let document = Html::parse_fragment(&self.container.to_html());
        let mut seen = HashSet::new();
        document
            .select(&selector)
            .filter_map(|a| a.value().attr("data-screen-name"))
            .filter(|name| seen.insert(name.to_string()))
            .map(str::to_string)
            .collect()
    }

    /// Tooltip markup for a hovered mention. `None` when tooltips are off or
    /// the lookup fails.
    pub async fn hover(&self, screen_name: &str) -> Option<String> {
        if !self.config.tooltips {
            return None;
        }
        let profiles = self.profiles.as_ref()?;
        match profiles.profile_image(screen_name).await {
            Ok(image_url) => Some(format!(
                r#"<div class="tooltip post-mention-tooltip"><span class="post-mention-img"><img src="{}"/></span></div>"#,
                escape_html(&image_url)
            )),
            Err(e) => {
                warn!(screen_name, error = %e, "profile lookup failed");
                None
            }
        }
    }

    /// Fetch and apply once, or keep refreshing on the configured interval
    /// until `shutdown` resolves. `on_update` receives the container HTML
    /// after every change.
    pub async fn run<S, F>(
        &mut self,
        fetcher: Arc<dyn FeedFetcher>,
        mut on_update: S,
        shutdown: F,
    ) where
        S: FnMut(&str),
        F: Future<Output = ()>,
    {
        if !self.config.auto_refresh {
            let cycle = self.begin_cycle();
            let message = fetch_cycle(fetcher.as_ref(), cycle).await;
            if self.handle(message) {
                on_update(&self.to_html());
            }
            return;
        }

        let (tx, mut rx) = mpsc::channel::<FeedMessage>(8);
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.refresh_interval_ms));
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let cycle = self.begin_cycle();
                    let fetcher = Arc::clone(&fetcher);
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let message = fetch_cycle(fetcher.as_ref(), cycle).await;
                        let _ = tx.send(message).await;
                    });
                }
                Some(message) = rx.recv() => {
                    if self.handle(message) {
                        on_update(&self.to_html());
                    }
                }
            }
        }
        info!(cycles = self.next_cycle, "refresh stopped");
    }
}

/// Posts whose entities could not be translated are shown as plain text.
fn resolve(fetched: FetchedPost) -> Post {
    fetched.unwrap_or_else(|untranslated| {
        warn!(post_id = %untranslated.post.id, error = %untranslated.error, "rendering post without entities");
        untranslated.post
    })
}

async fn fetch_cycle(fetcher: &dyn FeedFetcher, cycle: u64) -> FeedMessage {
    let data = match fetcher.fetch().await {
        Ok(posts) => FeedData::Posts(posts),
        Err(e) => FeedData::Error(e.to_string()),
    };
    FeedMessage { cycle, data }
}
