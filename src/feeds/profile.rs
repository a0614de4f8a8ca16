use super::{build_client, get_json};
use crate::error::FetchError;
use async_trait::async_trait;
use serde::Deserialize;

/// On-demand profile lookup used for mention hover previews.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    /// Profile image URL for `screen_name`.
    async fn profile_image(&self, screen_name: &str) -> Result<String, FetchError>;
}

pub struct ProfileFetcher {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    profile_image_url: String,
}

impl ProfileFetcher {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: build_client(),
        }
    }
}

#[async_trait]
impl ProfileLookup for ProfileFetcher {
    async fn profile_image(&self, screen_name: &str) -> Result<String, FetchError> {
        let url = format!(
            "{}?screen_name={}&size=normal",
            self.endpoint,
            urlencoding::encode(screen_name)
        );
        let user: ApiUser = get_json(&self.client, &url).await?;
        Ok(user.profile_image_url)
    }
}
