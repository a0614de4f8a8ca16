use crate::post::{Annotation, AnnotationPayload};

pub const DEFAULT_SITE_URL: &str = "https://twitter.com";

/// Where profile and search links point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub site_url: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            site_url: DEFAULT_SITE_URL.to_string(),
        }
    }
}

impl RenderOptions {
    pub fn new(site_url: &str) -> Self {
        Self {
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    fn profile_url(&self, screen_name: &str) -> String {
        format!("{}/{}", self.site_url, urlencoding::encode(screen_name))
    }

    fn search_url(&self, tag_text: &str) -> String {
        format!("{}/search/%23{}", self.site_url, urlencoding::encode(tag_text))
    }
}

/// Escape HTML special characters for text and attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render one annotation as an anchor fragment.
pub fn render_entity(annotation: &Annotation, options: &RenderOptions) -> String {
    match &annotation.payload {
        AnnotationPayload::Mention {
            screen_name,
            display_name,
        } => {
            let name = escape_html(screen_name);
            format!(
                r#"<a class="post-mention" href="{}" title="{}" data-screen-name="{}"><span class="post-at">@</span>{}</a>"#,
                escape_html(&options.profile_url(screen_name)),
                escape_html(display_name),
                name,
                name,
            )
        }
        AnnotationPayload::Link {
            short_url,
            expanded_url,
            display_url,
        } => format!(
            r#"<a class="post-link" href="{}" title="Visit {}">{}</a>"#,
            escape_html(short_url),
            escape_html(expanded_url),
            escape_html(display_url),
        ),
        AnnotationPayload::Hashtag { tag_text } => {
            let tag = escape_html(tag_text);
            format!(
                r##"<a class="post-hashtag" href="{}" title="Show search: #{}"><span class="post-hash">#</span>{}</a>"##,
                escape_html(&options.search_url(tag_text)),
                tag,
                tag,
            )
        }
        AnnotationPayload::Media {
            media_url,
            display_url,
        } => format!(
            r#"<a class="post-media" href="{}">{}</a>"#,
            escape_html(media_url),
            escape_html(display_url),
        ),
    }
}
