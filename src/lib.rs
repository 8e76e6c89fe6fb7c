pub mod account_age;
pub mod captcha_verifier;
pub mod clock;
pub mod config;
pub mod error;
pub mod graph_client;
pub mod profile_lookup_service;
pub mod profile_normalizer;
pub mod routes;

#[cfg(test)]
mod tests;

pub use account_age::AgeEstimate;
pub use captcha_verifier::{CaptchaVerifier, RecaptchaVerifier};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ServiceConfig;
pub use error::LookupError;
pub use graph_client::{GraphApi, HttpGraphApi};
pub use profile_lookup_service::{LookupRequest, Platform, ProfileLookupService};
pub use profile_normalizer::NormalizedProfile;
pub use routes::{router, AppState};

use std::sync::Arc;

/// Wire the HTTP-backed service and router for a configuration
pub fn build_app(
    config: &ServiceConfig,
    clock: Arc<dyn Clock>,
) -> Result<axum::Router, reqwest::Error> {
    let client = graph_client::build_http_client(config.upstream_timeout)?;

    let captcha = Arc::new(RecaptchaVerifier::new(
        client.clone(),
        config.recaptcha_verify_url.clone(),
        config.recaptcha_secret.clone(),
    ));
    let graph = Arc::new(HttpGraphApi::new(
        client,
        config.facebook_graph_url.clone(),
        config.facebook_access_token.clone(),
        config.instagram_graph_url.clone(),
        config.instagram_access_token.clone(),
    ));

    let state = AppState {
        service: Arc::new(ProfileLookupService::new(captcha, graph, clock)),
        liveness_message: config.liveness_message(),
    };
    Ok(router(state, &config.enabled_platforms))
}
