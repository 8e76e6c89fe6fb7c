//! CAPTCHA gate run ahead of every upstream profile fetch

use crate::error::LookupError;
use crate::graph_client::read_json;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Ask the verification service whether `token` is valid.
    async fn verify(&self, token: &str) -> Result<bool, LookupError>;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// reCAPTCHA `siteverify` client
#[derive(Clone)]
pub struct RecaptchaVerifier {
    client: Client,
    verify_url: String,
    secret: String,
}

impl RecaptchaVerifier {
    pub fn new(client: Client, verify_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            client,
            verify_url: verify_url.into(),
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str) -> Result<bool, LookupError> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(LookupError::upstream_transport)?;

        let body = read_json(response).await?;
        let verdict: SiteVerifyResponse =
            serde_json::from_value(body).map_err(LookupError::upstream_transport)?;

        if !verdict.success {
            debug!("reCAPTCHA rejected token: {:?}", verdict.error_codes);
        }
        Ok(verdict.success)
    }
}

/// Fail fast on a missing token, then on a rejected one.
///
/// No network call is made when the token is absent or empty.
pub async fn verify_captcha(
    verifier: &dyn CaptchaVerifier,
    token: Option<&str>,
) -> Result<(), LookupError> {
    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => return Err(LookupError::MissingCaptcha),
    };

    if verifier.verify(token).await? {
        Ok(())
    } else {
        Err(LookupError::CaptchaRejected)
    }
}
