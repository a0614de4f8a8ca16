use super::{build_client, get_json, FeedFetcher, FetchedPost, UntranslatedPost};
use crate::error::{AnnotationIssue, FetchError, RenderError};
use crate::post::{Annotation, AnnotationKind, AnnotationPayload, AnnotationSet, Post, Span};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

/// Fetches a user's most recent posts from the search endpoint.
pub struct SearchFetcher {
    endpoint: String,
    username: String,
    count: usize,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ApiPost>,
}

#[derive(Debug, Deserialize)]
struct ApiPost {
    id_str: String,
    text: String,
    /// Left untyped so a malformed entity group fails only its own post.
    #[serde(default)]
    entities: Value,
}

#[derive(Debug, Deserialize)]
struct ApiMention {
    screen_name: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiUrl {
    url: String,
    #[serde(default)]
    expanded_url: Option<String>,
    #[serde(default)]
    display_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiHashtag {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiMedia {
    media_url: String,
    display_url: String,
}

impl SearchFetcher {
    pub fn new(endpoint: String, username: String, count: usize) -> Self {
        Self {
            endpoint,
            username,
            count,
            client: build_client(),
        }
    }

    fn request_url(&self) -> String {
        format!(
            "{}?q={}&rpp={}&result_type=recent&include_entities=true",
            self.endpoint,
            urlencoding::encode(&format!("from:{}", self.username)),
            self.count,
        )
    }
}

fn kind_for_key(key: &str) -> Option<AnnotationKind> {
    match key {
        "user_mentions" => Some(AnnotationKind::Mention),
        "urls" => Some(AnnotationKind::Link),
        "hashtags" => Some(AnnotationKind::Hashtag),
        "media" => Some(AnnotationKind::Media),
        _ => None,
    }
}

/// Read `indices: [start, end]`. Range checks happen at render time.
fn parse_indices(entity: &Value) -> Option<Span> {
    match entity.get("indices")?.as_array()?.as_slice() {
        [start, end] => Some(Span::new(
            usize::try_from(start.as_u64()?).ok()?,
            usize::try_from(end.as_u64()?).ok()?,
        )),
        _ => None,
    }
}

fn parse_payload(kind: AnnotationKind, entity: Value) -> Result<AnnotationPayload, serde_json::Error> {
    Ok(match kind {
        AnnotationKind::Mention => {
            let m: ApiMention = serde_json::from_value(entity)?;
            AnnotationPayload::Mention {
                screen_name: m.screen_name,
                display_name: m.name,
            }
        }
        AnnotationKind::Link => {
            let u: ApiUrl = serde_json::from_value(entity)?;
            AnnotationPayload::Link {
                expanded_url: u.expanded_url.unwrap_or_else(|| u.url.clone()),
                display_url: u.display_url.unwrap_or_else(|| u.url.clone()),
                short_url: u.url,
            }
        }
        AnnotationKind::Hashtag => {
            let h: ApiHashtag = serde_json::from_value(entity)?;
            AnnotationPayload::Hashtag { tag_text: h.text }
        }
        AnnotationKind::Media => {
            let m: ApiMedia = serde_json::from_value(entity)?;
            AnnotationPayload::Media {
                media_url: m.media_url,
                display_url: m.display_url,
            }
        }
    })
}

fn invalid_group(key: &str, kind: Option<AnnotationKind>) -> RenderError {
    let reason = match kind {
        Some(_) => AnnotationIssue::MalformedPayload(format!("`{}` is not an array", key)),
        None => AnnotationIssue::UnknownKind(key.to_string()),
    };
    RenderError::invalid(kind, Span::new(0, 0), reason)
}

/// Translate the wire `entities` object into an [`AnnotationSet`].
fn translate_entities(entities: &Value) -> Result<AnnotationSet, RenderError> {
    let mut set = AnnotationSet::new();

    let groups = match entities {
        Value::Null => return Ok(set),
        Value::Object(groups) => groups,
        other => {
            return Err(RenderError::invalid(
                None,
                Span::new(0, 0),
                AnnotationIssue::MalformedPayload(format!("entities must be an object, got {}", other)),
            ))
        }
    };

    for (key, group) in groups {
        let kind = kind_for_key(key);
        let items = match group {
            Value::Null => continue,
            Value::Array(items) => items,
            _ => return Err(invalid_group(key, kind)),
        };

        for entity in items {
            let span = parse_indices(entity);
            let Some(kind) = kind else {
                return Err(RenderError::invalid(
                    None,
                    span.unwrap_or(Span::new(0, 0)),
                    AnnotationIssue::UnknownKind(key.clone()),
                ));
            };
            let Some(span) = span else {
                return Err(RenderError::invalid(
                    Some(kind),
                    Span::new(0, 0),
                    AnnotationIssue::MalformedIndices,
                ));
            };
            let payload = parse_payload(kind, entity.clone()).map_err(|e| {
                RenderError::invalid(
                    Some(kind),
                    span,
                    AnnotationIssue::MalformedPayload(e.to_string()),
                )
            })?;
            set.push(Annotation::new(span, payload));
        }
    }

    Ok(set)
}

fn into_post(api: ApiPost) -> FetchedPost {
    match translate_entities(&api.entities) {
        Ok(annotations) => Ok(Post::new(api.id_str, api.text, annotations)),
        Err(error) => Err(UntranslatedPost {
            post: Post::new(api.id_str, api.text, AnnotationSet::new()),
            error,
        }),
    }
}

#[async_trait]
impl FeedFetcher for SearchFetcher {
    async fn fetch(&self) -> Result<Vec<FetchedPost>, FetchError> {
        let url = self.request_url();
        let response: SearchResponse = get_json(&self.client, &url).await?;

        let posts: Vec<FetchedPost> = response
            .results
            .into_iter()
            .take(self.count)
            .map(into_post)
            .collect();

        let untranslated = posts.iter().filter(|post| post.is_err()).count();
        info!(username = %self.username, posts = posts.len(), untranslated, "fetched posts");
        Ok(posts)
    }
}
