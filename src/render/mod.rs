//! Entity-aware rendering of posts into HTML.
//!
//! Rendering is a pure function of its arguments: annotations are flattened
//! and ordered by [`normalize`], interleaved with the literal text by
//! [`reconstruct`], and the result is wrapped in a per-post container by
//! [`wrap`]. Nothing is kept between calls, so any number of threads may
//! render concurrently.

pub mod entity;
pub mod normalize;
pub mod reconstruct;

pub use entity::{escape_html, render_entity, RenderOptions, DEFAULT_SITE_URL};
pub use normalize::normalize;
pub use reconstruct::{reconstruct, segments, Segment};

use crate::error::RenderError;
use crate::post::{Post, RenderedPost};
use tracing::debug;

/// Wrap rendered post markup in its container block.
pub fn wrap(id: &str, inner: &str) -> String {
    format!(
        r#"<div class="post" data-post-id="{}">{}</div>"#,
        escape_html(id),
        inner
    )
}

pub fn render(post: &Post) -> Result<RenderedPost, RenderError> {
    render_with(post, &RenderOptions::default())
}

pub fn render_with(post: &Post, options: &RenderOptions) -> Result<RenderedPost, RenderError> {
    let ordered = normalize(&post.annotations);
    let inner = reconstruct(&post.text, &ordered, options)?;
    let markup = wrap(&post.id, &inner);

    debug!(post_id = %post.id, entities = ordered.len(), "rendered post");

    Ok(RenderedPost {
        id: post.id.clone(),
        markup,
    })
}

/// Render a batch, keeping input order. Fails on the first invalid post.
pub fn render_all(posts: &[Post], options: &RenderOptions) -> Result<Vec<RenderedPost>, RenderError> {
    posts.iter().map(|post| render_with(post, options)).collect()
}
