use crate::captcha_verifier::CaptchaVerifier;
use crate::clock::FixedClock;
use crate::error::LookupError;
use crate::graph_client::{
    FacebookLocation, FacebookProfile, GraphApi, InstagramMedia, InstagramProfile, InstagramUser,
};
use crate::profile_lookup_service::{LookupRequest, Platform, ProfileLookupService};
use crate::profile_normalizer::PLACEHOLDER_AVATAR;
use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct MockCaptcha {
    accept: bool,
    calls: AtomicUsize,
}

impl MockCaptcha {
    fn new(accept: bool) -> Arc<Self> {
        Arc::new(Self {
            accept,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CaptchaVerifier for MockCaptcha {
    async fn verify(&self, _token: &str) -> Result<bool, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.accept)
    }
}

enum MediaOutcome {
    Found(&'static str),
    Empty,
    Fails,
}

struct MockGraph {
    facebook: Option<FacebookProfile>,
    search: Vec<InstagramUser>,
    instagram: InstagramProfile,
    media: MediaOutcome,
    calls: AtomicUsize,
}

impl MockGraph {
    fn new() -> Self {
        Self {
            facebook: None,
            search: Vec::new(),
            instagram: InstagramProfile::default(),
            media: MediaOutcome::Empty,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphApi for MockGraph {
    async fn facebook_profile(
        &self,
        _username: &str,
    ) -> Result<Option<FacebookProfile>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.facebook.clone())
    }

    async fn instagram_search(&self, _username: &str) -> Result<Vec<InstagramUser>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.search.clone())
    }

    async fn instagram_profile(&self, user_id: &str) -> Result<InstagramProfile, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(Some(user_id), self.instagram.id.as_deref());
        Ok(self.instagram.clone())
    }

    async fn instagram_oldest_media(
        &self,
        _user_id: &str,
    ) -> Result<Option<InstagramMedia>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.media {
            MediaOutcome::Found(ts) => Ok(Some(InstagramMedia {
                timestamp: Some(ts.to_string()),
            })),
            MediaOutcome::Empty => Ok(None),
            MediaOutcome::Fails => Err(LookupError::upstream_status(
                400,
                Some(serde_json::json!({"error": {"message": "Unsupported get request"}})),
            )),
        }
    }
}

fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn service(captcha: Arc<MockCaptcha>, graph: Arc<MockGraph>) -> ProfileLookupService {
    ProfileLookupService::new(captcha, graph, Arc::new(FixedClock(fixed_now())))
}

fn token() -> Option<String> {
    Some("token-123".to_string())
}

fn instagram_graph(media: MediaOutcome) -> MockGraph {
    let mut graph = MockGraph::new();
    graph.search = vec![
        InstagramUser {
            id: Some("1".to_string()),
            username: Some("nature.pics.fan".to_string()),
        },
        InstagramUser {
            id: Some("2".to_string()),
            username: Some("Nature.Pics".to_string()),
        },
    ];
    graph.instagram = InstagramProfile {
        id: Some("2".to_string()),
        username: Some("Nature.Pics".to_string()),
        name: Some("Nature Pictures".to_string()),
        followers_count: Some(52_000),
        media_count: Some(812),
        profile_picture_url: None,
        is_verified: Some(true),
    };
    graph.media = media;
    graph
}

#[tokio::test]
async fn test_missing_captcha_skips_all_calls() {
    let captcha = MockCaptcha::new(true);
    let graph = Arc::new(MockGraph::new());
    let service = service(captcha.clone(), graph.clone());

    for missing in [None, Some(String::new())] {
        let request = LookupRequest::new(Platform::Facebook, "acme", missing);
        let err = service.lookup(&request).await.unwrap_err();
        assert!(matches!(err, LookupError::MissingCaptcha));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "reCAPTCHA required");
    }
    assert_eq!(captcha.calls.load(Ordering::SeqCst), 0);
    assert_eq!(graph.calls(), 0);
}

#[tokio::test]
async fn test_rejected_captcha_skips_profile_fetch() {
    let captcha = MockCaptcha::new(false);
    let graph = Arc::new(MockGraph::new());
    let service = service(captcha.clone(), graph.clone());

    let request = LookupRequest::new(Platform::Instagram, "nature.pics", token());
    let err = service.lookup(&request).await.unwrap_err();
    assert!(matches!(err, LookupError::CaptchaRejected));
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(captcha.calls.load(Ordering::SeqCst), 1);
    assert_eq!(graph.calls(), 0);
}

#[tokio::test]
async fn test_facebook_lookup() {
    let mut graph = MockGraph::new();
    graph.facebook = Some(FacebookProfile {
        id: Some("1001".to_string()),
        name: Some("Acme Corp".to_string()),
        created_time: Some("2023-04-27T12:00:00+0000".to_string()),
        followers_count: Some(10),
        location: Some(FacebookLocation { name: None }),
        ..Default::default()
    });
    let graph = Arc::new(graph);
    let service = service(MockCaptcha::new(true), graph.clone());

    let request = LookupRequest::new(Platform::Facebook, "acme", token());
    let profile = service.lookup(&request).await.unwrap();

    assert_eq!(profile.username, "acme");
    assert_eq!(profile.nickname, "Acme Corp");
    assert_eq!(profile.estimated_creation_date, "4/27/2023");
    assert_eq!(profile.age_days, 401);
    assert_eq!(profile.account_age, "1 years, 1 months");
    assert_eq!(profile.region, "N/A");
    assert_eq!(profile.avatar, PLACEHOLDER_AVATAR);
    assert_eq!(graph.calls(), 1);
}

#[tokio::test]
async fn test_facebook_without_object_is_not_found() {
    let service = service(MockCaptcha::new(true), Arc::new(MockGraph::new()));

    let request = LookupRequest::new(Platform::Facebook, "nobody", token());
    let err = service.lookup(&request).await.unwrap_err();
    assert!(matches!(err, LookupError::NotFound(_)));
    assert_eq!(err.to_string(), "User or Page not found");
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_instagram_username_match_is_case_insensitive() {
    let graph = Arc::new(instagram_graph(MediaOutcome::Found("2023-04-27T18:30:00+0000")));
    let service = service(MockCaptcha::new(true), graph.clone());

    let request = LookupRequest::new(Platform::Instagram, "NATURE.pics", token());
    let profile = service.lookup(&request).await.unwrap();

    assert_eq!(profile.user_id, "2");
    assert_eq!(profile.username, "Nature.Pics");
    assert_eq!(profile.verified, "Yes");
    assert_eq!(profile.total_posts, 812);
    assert_eq!(profile.estimated_creation_date, "4/27/2023");
    assert_eq!(profile.age_days, 400);
    assert_eq!(profile.account_age, "1 years, 1 months");
    assert_eq!(graph.calls(), 3);
}

#[tokio::test]
async fn test_instagram_match_without_id_is_skipped() {
    let mut graph = instagram_graph(MediaOutcome::Empty);
    graph.search.insert(
        0,
        InstagramUser {
            id: None,
            username: Some("nature.pics".to_string()),
        },
    );
    let graph = Arc::new(graph);
    let service = service(MockCaptcha::new(true), graph.clone());

    let request = LookupRequest::new(Platform::Instagram, "nature.pics", token());
    let profile = service.lookup(&request).await.unwrap();
    assert_eq!(profile.user_id, "2");
    assert_eq!(graph.calls(), 3);
}

#[tokio::test]
async fn test_instagram_no_match_is_user_not_found() {
    let graph = Arc::new(instagram_graph(MediaOutcome::Empty));
    let service = service(MockCaptcha::new(true), graph.clone());

    let request = LookupRequest::new(Platform::Instagram, "nature", token());
    let err = service.lookup(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "User not found");
    // Only the search ran
    assert_eq!(graph.calls(), 1);
}

#[tokio::test]
async fn test_instagram_media_failure_is_not_fatal() {
    let graph = Arc::new(instagram_graph(MediaOutcome::Fails));
    let service = service(MockCaptcha::new(true), graph.clone());

    let request = LookupRequest::new(Platform::Instagram, "nature.pics", token());
    let profile = service.lookup(&request).await.unwrap();

    assert_eq!(profile.estimated_creation_date, "N/A");
    assert_eq!(profile.account_age, "N/A");
    assert_eq!(profile.age_days, 0);
    assert_eq!(profile.nickname, "Nature Pictures");
    assert_eq!(profile.followers, 52_000);
    assert_eq!(profile.avatar, PLACEHOLDER_AVATAR);
    assert_eq!(graph.calls(), 3);
}

#[tokio::test]
async fn test_instagram_without_media_has_unknown_age() {
    let graph = Arc::new(instagram_graph(MediaOutcome::Empty));
    let service = service(MockCaptcha::new(true), graph);

    let request = LookupRequest::new(Platform::Instagram, "nature.pics", token());
    let profile = service.lookup(&request).await.unwrap();
    assert_eq!(profile.estimated_creation_date, "N/A");
    assert_eq!(profile.age_days, 0);
}

#[tokio::test]
async fn test_repeated_lookups_are_identical() {
    let graph = Arc::new(instagram_graph(MediaOutcome::Found("2020-02-02T02:02:02+0000")));
    let service = service(MockCaptcha::new(true), graph);

    let request = LookupRequest::new(Platform::Instagram, "nature.pics", token());
    let first = serde_json::to_vec(&service.lookup(&request).await.unwrap()).unwrap();
    let second = serde_json::to_vec(&service.lookup(&request).await.unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_platform_parsing() {
    assert_eq!("facebook".parse::<Platform>(), Ok(Platform::Facebook));
    assert_eq!("Instagram".parse::<Platform>(), Ok(Platform::Instagram));
    assert!("tiktok".parse::<Platform>().is_err());
    assert_eq!(Platform::Facebook.to_string(), "Facebook");
    assert_eq!(Platform::Instagram.as_str(), "instagram");
}
