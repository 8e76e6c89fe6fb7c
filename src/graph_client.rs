//! Facebook and Instagram Graph API access

use crate::error::LookupError;
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub(crate) const FACEBOOK_PROFILE_FIELDS: &str =
    "id,username,name,created_time,followers_count,verified,about,location,picture";
pub(crate) const INSTAGRAM_PROFILE_FIELDS: &str =
    "id,username,name,followers_count,media_count,is_verified,profile_picture_url";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacebookProfile {
    pub id: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub created_time: Option<String>,
    pub followers_count: Option<u64>,
    pub verified: Option<bool>,
    pub about: Option<String>,
    pub location: Option<FacebookLocation>,
    pub picture: Option<FacebookPicture>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacebookLocation {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacebookPicture {
    pub data: Option<FacebookPictureData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacebookPictureData {
    pub url: Option<String>,
}

/// Entry of an Instagram username search. Entries without an id cannot be
/// looked up further.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstagramUser {
    pub id: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstagramProfile {
    pub id: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub followers_count: Option<u64>,
    pub media_count: Option<u64>,
    pub profile_picture_url: Option<String>,
    pub is_verified: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstagramMedia {
    pub timestamp: Option<String>,
}

/// `{ "data": [...] }` envelope used by Graph list endpoints
#[derive(Debug, Deserialize)]
struct DataPage<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// Upstream profile APIs
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Fetch a Facebook user or page. `None` when upstream returned no object.
    async fn facebook_profile(&self, username: &str)
        -> Result<Option<FacebookProfile>, LookupError>;

    /// Search Instagram accounts by username
    async fn instagram_search(&self, username: &str) -> Result<Vec<InstagramUser>, LookupError>;

    async fn instagram_profile(&self, user_id: &str) -> Result<InstagramProfile, LookupError>;

    /// The single oldest media item of an account, if any
    async fn instagram_oldest_media(
        &self,
        user_id: &str,
    ) -> Result<Option<InstagramMedia>, LookupError>;
}

/// Build the shared upstream HTTP client with a per-call timeout
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent("ProfileLookup/1.0")
        .build()
}

/// Read an upstream response body as JSON.
///
/// Non-success statuses become [`LookupError::Upstream`] carrying the status
/// and whatever payload the upstream sent back.
pub(crate) async fn read_json(response: Response) -> Result<Value, LookupError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(LookupError::upstream_transport)?;

    if !status.is_success() {
        let details = serde_json::from_slice::<Value>(&bytes).ok().or_else(|| {
            let text = String::from_utf8_lossy(&bytes).trim().to_string();
            (!text.is_empty()).then_some(Value::String(text))
        });
        return Err(LookupError::upstream_status(status.as_u16(), details));
    }

    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(LookupError::upstream_transport)
}

/// Graph API client over HTTP
#[derive(Clone)]
pub struct HttpGraphApi {
    client: Client,
    facebook_url: String,
    facebook_token: String,
    instagram_url: String,
    instagram_token: String,
}

impl HttpGraphApi {
    pub fn new(
        client: Client,
        facebook_url: impl Into<String>,
        facebook_token: impl Into<String>,
        instagram_url: impl Into<String>,
        instagram_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            facebook_url: facebook_url.into(),
            facebook_token: facebook_token.into(),
            instagram_url: instagram_url.into(),
            instagram_token: instagram_token.into(),
        }
    }

    /// Append path segments to a base URL, percent-encoding each one
    fn endpoint(base: &str, segments: &[&str]) -> Result<Url, LookupError> {
        let mut url = Url::parse(base).map_err(LookupError::upstream_transport)?;
        url.path_segments_mut()
            .map_err(|_| LookupError::upstream_transport(format!("Invalid base URL: {base}")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, url: Url, query: &[(&str, &str)]) -> Result<Value, LookupError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(LookupError::upstream_transport)?;
        read_json(response).await
    }
}

#[async_trait]
impl GraphApi for HttpGraphApi {
    async fn facebook_profile(
        &self,
        username: &str,
    ) -> Result<Option<FacebookProfile>, LookupError> {
        let url = Self::endpoint(&self.facebook_url, &[username])?;
        let body = self
            .get_json(
                url,
                &[
                    ("fields", FACEBOOK_PROFILE_FIELDS),
                    ("access_token", self.facebook_token.as_str()),
                ],
            )
            .await?;

        if !body.is_object() {
            return Ok(None);
        }
        serde_json::from_value(body)
            .map(Some)
            .map_err(LookupError::upstream_transport)
    }

    async fn instagram_search(&self, username: &str) -> Result<Vec<InstagramUser>, LookupError> {
        let url = Self::endpoint(&self.instagram_url, &["ig_users", "search"])?;
        let body = self
            .get_json(
                url,
                &[("q", username), ("access_token", self.instagram_token.as_str())],
            )
            .await?;

        let page: DataPage<InstagramUser> =
            serde_json::from_value(body).map_err(LookupError::upstream_transport)?;
        Ok(page.data)
    }

    async fn instagram_profile(&self, user_id: &str) -> Result<InstagramProfile, LookupError> {
        let url = Self::endpoint(&self.instagram_url, &[user_id])?;
        let body = self
            .get_json(
                url,
                &[
                    ("fields", INSTAGRAM_PROFILE_FIELDS),
                    ("access_token", self.instagram_token.as_str()),
                ],
            )
            .await?;

        serde_json::from_value(body).map_err(LookupError::upstream_transport)
    }

    async fn instagram_oldest_media(
        &self,
        user_id: &str,
    ) -> Result<Option<InstagramMedia>, LookupError> {
        let url = Self::endpoint(&self.instagram_url, &[user_id, "media"])?;
        let body = self
            .get_json(
                url,
                &[
                    ("fields", "timestamp"),
                    ("limit", "1"),
                    ("access_token", self.instagram_token.as_str()),
                ],
            )
            .await?;

        let page: DataPage<InstagramMedia> =
            serde_json::from_value(body).map_err(LookupError::upstream_transport)?;
        Ok(page.data.into_iter().next())
    }
}
