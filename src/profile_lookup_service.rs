//! Platform-dispatched profile lookup.
//!
//! Each lookup runs strictly in sequence: CAPTCHA gate, upstream fetch,
//! age estimation, normalization. Nothing is shared between requests.

use crate::account_age::{parse_timestamp, AgeEstimate};
use crate::captcha_verifier::{verify_captcha, CaptchaVerifier};
use crate::clock::Clock;
use crate::error::LookupError;
use crate::graph_client::{GraphApi, InstagramMedia};
use crate::profile_normalizer::{normalize_facebook, normalize_instagram, NormalizedProfile};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Facebook,
    Instagram,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Facebook, Platform::Instagram];

    /// Lowercase identifier used in routes and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            other => Err(format!("Unknown platform: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub platform: Platform,
    pub username: String,
    pub captcha_token: Option<String>,
}

impl LookupRequest {
    pub fn new(
        platform: Platform,
        username: impl Into<String>,
        captcha_token: Option<String>,
    ) -> Self {
        Self {
            platform,
            username: username.into(),
            captcha_token,
        }
    }
}

pub struct ProfileLookupService {
    captcha: Arc<dyn CaptchaVerifier>,
    graph: Arc<dyn GraphApi>,
    clock: Arc<dyn Clock>,
}

impl ProfileLookupService {
    pub fn new(
        captcha: Arc<dyn CaptchaVerifier>,
        graph: Arc<dyn GraphApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            captcha,
            graph,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn lookup(&self, request: &LookupRequest) -> Result<NormalizedProfile, LookupError> {
        verify_captcha(self.captcha.as_ref(), request.captcha_token.as_deref()).await?;

        info!("{} lookup for {}", request.platform, request.username);
        match request.platform {
            Platform::Facebook => self.lookup_facebook(&request.username).await,
            Platform::Instagram => self.lookup_instagram(&request.username).await,
        }
    }

    async fn lookup_facebook(&self, username: &str) -> Result<NormalizedProfile, LookupError> {
        let user = self
            .graph
            .facebook_profile(username)
            .await?
            .ok_or_else(|| LookupError::NotFound("User or Page not found".to_string()))?;

        debug!(
            "Facebook API response: {}",
            serde_json::to_string(&user).unwrap_or_default()
        );

        let age = AgeEstimate::from_raw_creation(user.created_time.as_deref(), self.now());
        Ok(normalize_facebook(username, &user, age))
    }

    async fn lookup_instagram(&self, username: &str) -> Result<NormalizedProfile, LookupError> {
        let wanted = username.to_lowercase();
        let user_id = self
            .graph
            .instagram_search(username)
            .await?
            .into_iter()
            .filter(|u| {
                u.username
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase() == wanted)
            })
            .find_map(|u| u.id)
            .ok_or_else(|| LookupError::NotFound("User not found".to_string()))?;

        let profile = self.graph.instagram_profile(&user_id).await?;

        // Oldest media stands in for the creation date. Its failure must not
        // fail the lookup.
        let age = match self.graph.instagram_oldest_media(&user_id).await {
            Ok(media) => self.estimate_from_media(media),
            Err(e) => {
                warn!("Media fetch error for {}: {}", username, e);
                AgeEstimate::unknown()
            }
        };

        debug!(
            "Instagram API response: {}",
            serde_json::to_string(&profile).unwrap_or_default()
        );

        Ok(normalize_instagram(username, &profile, age))
    }

    fn estimate_from_media(&self, media: Option<InstagramMedia>) -> AgeEstimate {
        media
            .and_then(|m| m.timestamp)
            .and_then(|ts| parse_timestamp(&ts))
            .map(|observed| AgeEstimate::from_earliest_activity(observed, self.now()))
            .unwrap_or_else(AgeEstimate::unknown)
    }
}
