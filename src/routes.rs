//! HTTP surface: liveness, health and one lookup route per enabled platform

use crate::error::LookupError;
use crate::profile_lookup_service::{LookupRequest, Platform, ProfileLookupService};
use axum::{
    body::Bytes,
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProfileLookupService>,
    pub liveness_message: &'static str,
}

/// Body of a lookup request
#[derive(Debug, Default, Deserialize)]
pub struct LookupBody {
    #[serde(default)]
    pub recaptcha: Option<String>,
}

impl LookupBody {
    /// A missing or malformed body counts as an empty one
    pub fn from_bytes(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub fn router(state: AppState, platforms: &[Platform]) -> Router {
    let mut router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler));

    for &platform in platforms {
        let path = format!("/api/{}/{{username}}", platform.as_str());
        router = router.route(
            &path,
            post(
                move |state: State<AppState>, username: Path<String>, body: Bytes| {
                    lookup_handler(platform, state, username, body)
                },
            ),
        );
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router.layer(cors).with_state(state)
}

async fn root_handler(State(state): State<AppState>) -> &'static str {
    state.liveness_message
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: state
            .service
            .now()
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

async fn lookup_handler(
    platform: Platform,
    State(state): State<AppState>,
    Path(username): Path<String>,
    body: Bytes,
) -> Response {
    let body = LookupBody::from_bytes(&body);
    let request = LookupRequest::new(platform, username, body.recaptcha);

    match state.service.lookup(&request).await {
        Ok(profile) => Json(profile).into_response(),
        Err(e) => {
            match &e {
                LookupError::MissingCaptcha | LookupError::CaptchaRejected => {
                    debug!("{} lookup for {} rejected: {}", platform, request.username, e);
                }
                LookupError::Upstream {
                    details: Some(payload),
                    ..
                } => error!("{} API Error: {}", platform, payload),
                _ => error!("{} API Error: {}", platform, e),
            }
            e.into_response()
        }
    }
}
