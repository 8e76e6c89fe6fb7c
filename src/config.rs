//! Service configuration loaded from the environment

use crate::profile_lookup_service::Platform;
use std::fmt;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";
pub const DEFAULT_FACEBOOK_GRAPH_URL: &str = "https://graph.facebook.com/v21.0";
pub const DEFAULT_INSTAGRAM_GRAPH_URL: &str = "https://graph.instagram.com/v21.0";

#[derive(Clone)]
pub struct ServiceConfig {
    pub bind_host: String,
    pub port: u16,
    pub recaptcha_secret: String,
    pub recaptcha_verify_url: String,
    pub facebook_access_token: String,
    pub facebook_graph_url: String,
    pub instagram_access_token: String,
    pub instagram_graph_url: String,
    /// Applied to every upstream call
    pub upstream_timeout: Duration,
    /// Which lookup routes this deployment serves
    pub enabled_platforms: Vec<Platform>,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .field("recaptcha_verify_url", &self.recaptcha_verify_url)
            .field("facebook_graph_url", &self.facebook_graph_url)
            .field("instagram_graph_url", &self.instagram_graph_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("enabled_platforms", &self.enabled_platforms)
            .finish_non_exhaustive()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            recaptcha_secret: String::new(),
            recaptcha_verify_url: DEFAULT_RECAPTCHA_VERIFY_URL.to_string(),
            facebook_access_token: String::new(),
            facebook_graph_url: DEFAULT_FACEBOOK_GRAPH_URL.to_string(),
            instagram_access_token: String::new(),
            instagram_graph_url: DEFAULT_INSTAGRAM_GRAPH_URL.to_string(),
            upstream_timeout: Duration::from_secs(10),
            enabled_platforms: Platform::ALL.to_vec(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or invalid values keep defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let string_or = |key: &str, default: String| lookup(key).unwrap_or(default);
        let secret = |key: &str| {
            lookup(key).unwrap_or_else(|| {
                warn!("{} not set, upstream calls will be rejected", key);
                String::new()
            })
        };

        let port = lookup("PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);
        let upstream_timeout = match lookup("UPSTREAM_TIMEOUT_SECS") {
            None => defaults.upstream_timeout,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!(
                        "Invalid UPSTREAM_TIMEOUT_SECS {:?}, using {}s",
                        raw,
                        defaults.upstream_timeout.as_secs()
                    );
                    defaults.upstream_timeout
                }
            },
        };
        let enabled_platforms = lookup("ENABLED_PLATFORMS")
            .map(|v| parse_platforms(&v))
            .unwrap_or(defaults.enabled_platforms);

        Self {
            bind_host: string_or("BIND_HOST", defaults.bind_host),
            port,
            recaptcha_secret: secret("RECAPTCHA_SECRET_KEY"),
            recaptcha_verify_url: string_or("RECAPTCHA_VERIFY_URL", defaults.recaptcha_verify_url),
            facebook_access_token: secret("FACEBOOK_ACCESS_TOKEN"),
            facebook_graph_url: string_or("FACEBOOK_GRAPH_URL", defaults.facebook_graph_url),
            instagram_access_token: secret("INSTAGRAM_ACCESS_TOKEN"),
            instagram_graph_url: string_or("INSTAGRAM_GRAPH_URL", defaults.instagram_graph_url),
            upstream_timeout,
            enabled_platforms,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn is_enabled(&self, platform: Platform) -> bool {
        self.enabled_platforms.contains(&platform)
    }

    /// Text served by `GET /`, naming the platforms this deployment covers
    pub fn liveness_message(&self) -> &'static str {
        match (
            self.is_enabled(Platform::Facebook),
            self.is_enabled(Platform::Instagram),
        ) {
            (true, false) => "Facebook Account Age Checker API is running",
            (false, true) => "Instagram Account Age Checker API is running",
            _ => "Meta (Facebook/Instagram) Account Age Checker API is running",
        }
    }
}

/// Comma separated platform list. Unknown names are skipped; an empty result
/// enables every platform.
pub fn parse_platforms(raw: &str) -> Vec<Platform> {
    let mut platforms = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match name.parse::<Platform>() {
            Ok(p) if !platforms.contains(&p) => platforms.push(p),
            Ok(_) => {}
            Err(e) => warn!("Ignoring ENABLED_PLATFORMS entry: {}", e),
        }
    }
    if platforms.is_empty() {
        Platform::ALL.to_vec()
    } else {
        platforms
    }
}
