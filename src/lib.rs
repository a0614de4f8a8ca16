//! Fetch a user's recent posts and render them as entity-linked HTML.
//!
//! [`feeds`] retrieves posts and translates the wire format into [`post`]
//! types, [`render`] turns each post into markup, and [`presenter`] keeps a
//! container of rendered posts up to date.

pub mod config;
pub mod error;
pub mod feeds;
pub mod logging;
pub mod post;
pub mod presenter;
pub mod render;

pub use error::{AnnotationIssue, ConfigError, FetchError, RenderError};
pub use post::{Annotation, AnnotationKind, AnnotationPayload, AnnotationSet, Post, RenderedPost, Span};
pub use render::{render, render_all, render_with, RenderOptions};
