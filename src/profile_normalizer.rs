//! Mapping of upstream payloads into the unified profile schema.
//!
//! Every absent upstream field is replaced by a fixed default. Fields a
//! platform never exposes (Instagram bio and location) are always `"N/A"`.

use crate::account_age::{AgeEstimate, NOT_AVAILABLE};
use crate::graph_client::{FacebookProfile, InstagramProfile};
use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_AVATAR: &str = "https://via.placeholder.com/50";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedProfile {
    pub username: String,
    pub nickname: String,
    pub estimated_creation_date: String,
    pub account_age: String,
    pub age_days: i64,
    pub followers: u64,
    pub total_posts: u64,
    pub verified: String,
    pub description: String,
    pub region: String,
    pub user_id: String,
    pub avatar: String,
}

/// Non-empty upstream string or the fallback
fn or_default(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

fn yes_no(flag: Option<bool>) -> String {
    let answer = if flag.unwrap_or(false) { "Yes" } else { "No" };
    answer.to_string()
}

pub fn normalize_facebook(
    requested_username: &str,
    user: &FacebookProfile,
    age: AgeEstimate,
) -> NormalizedProfile {
    let avatar = user
        .picture
        .as_ref()
        .and_then(|p| p.data.as_ref())
        .and_then(|d| d.url.as_deref());

    NormalizedProfile {
        username: or_default(user.username.as_deref(), requested_username),
        nickname: or_default(user.name.as_deref(), NOT_AVAILABLE),
        estimated_creation_date: age.estimated_creation_date,
        account_age: age.account_age,
        age_days: age.age_days,
        followers: user.followers_count.unwrap_or(0),
        // Graph API has no post count for users or pages
        total_posts: 0,
        verified: yes_no(user.verified),
        description: or_default(user.about.as_deref(), NOT_AVAILABLE),
        region: or_default(
            user.location.as_ref().and_then(|l| l.name.as_deref()),
            NOT_AVAILABLE,
        ),
        user_id: or_default(user.id.as_deref(), NOT_AVAILABLE),
        avatar: or_default(avatar, PLACEHOLDER_AVATAR),
    }
}

pub fn normalize_instagram(
    requested_username: &str,
    user: &InstagramProfile,
    age: AgeEstimate,
) -> NormalizedProfile {
    NormalizedProfile {
        username: or_default(user.username.as_deref(), requested_username),
        nickname: or_default(user.name.as_deref(), NOT_AVAILABLE),
        estimated_creation_date: age.estimated_creation_date,
        account_age: age.account_age,
        age_days: age.age_days,
        followers: user.followers_count.unwrap_or(0),
        total_posts: user.media_count.unwrap_or(0),
        verified: yes_no(user.is_verified),
        description: NOT_AVAILABLE.to_string(),
        region: NOT_AVAILABLE.to_string(),
        user_id: or_default(user.id.as_deref(), NOT_AVAILABLE),
        avatar: or_default(user.profile_picture_url.as_deref(), PLACEHOLDER_AVATAR),
    }
}
