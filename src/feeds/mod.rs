pub mod profile;
pub mod search;

use crate::error::{FetchError, RenderError};
use crate::post::Post;
use async_trait::async_trait;

/// A post whose entities could not be translated into annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntranslatedPost {
    /// The post's id and text, with no annotations.
    pub post: Post,
    pub error: RenderError,
}

/// One fetched post. Entity failures are handed to the caller, which decides
/// whether to fall back to plain text.
pub type FetchedPost = Result<Post, UntranslatedPost>;

/// Result of one refresh cycle, tagged with the cycle that requested it.
#[derive(Debug, Clone)]
pub struct FeedMessage {
    pub cycle: u64,
    pub data: FeedData,
}

#[derive(Debug, Clone)]
pub enum FeedData {
    Posts(Vec<FetchedPost>),
    Error(String),
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<FetchedPost>, FetchError>;
}

pub(crate) fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(20))
        .user_agent(concat!("postfeed/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// GET `url` and decode a JSON body, mapping each failure to a [`FetchError`].
pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, FetchError> {
    let request_error = |source| FetchError::Request {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(request_error)?;
    if !response.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let body = response.text().await.map_err(request_error)?;
    serde_json::from_str(&body).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        source,
    })
}
