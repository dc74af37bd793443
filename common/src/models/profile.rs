// common/src/models/profile.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Signed-in user as returned by the whoami endpoint
///
/// Replaced wholesale by every successful verification, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subscription: Subscription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niche: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_settings: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trial,
    PastDue,
    Canceled,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Why a whoami payload could not be turned into a profile
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("response body is not a JSON object")]
    NotAnObject,

    #[error("no user profile found in response")]
    MissingProfile,

    #[error("malformed user profile: {0}")]
    InvalidProfile(#[from] serde_json::Error),

    #[error("unreadable response body: {0}")]
    Body(String),
}

/// Pull the profile out of a whoami body
///
/// The endpoint has shipped three shapes over time. Candidates are tried in
/// this order and the first object carrying an `id` (or `_id`) wins:
///
/// 1. the body itself: `{ "id": .., "email": .. }`
/// 2. one level down: `{ "user": {..} }` or `{ "data": {..} }`
/// 3. two levels down: `{ "data": { "user": {..} } }`
pub fn decode_profile(body: Value) -> Result<UserProfile, DecodeError> {
    if !body.is_object() {
        return Err(DecodeError::NotAnObject);
    }

    let candidates = [
        Some(&body),
        body.get("user"),
        body.get("data"),
        body.get("data").and_then(|data| data.get("user")),
    ];

    let profile = candidates
        .into_iter()
        .flatten()
        .find(|candidate| looks_like_profile(candidate))
        .ok_or(DecodeError::MissingProfile)?;

    Ok(UserProfile::deserialize(profile)?)
}

fn looks_like_profile(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.contains_key("id") || object.contains_key("_id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile_json() -> Value {
        json!({
            "id": "u_42",
            "email": "ada@example.com",
            "name": "Ada",
            "subscription": { "status": "trial", "plan": "creator" },
            "niche": "fitness",
            "brandSettings": { "primaryColor": "#ff00aa" }
        })
    }

    #[test]
    fn test_decodes_direct_shape() {
        let profile = decode_profile(profile_json()).unwrap();
        assert_eq!(profile.id, "u_42");
        assert_eq!(profile.subscription.status, SubscriptionStatus::Trial);
        assert_eq!(profile.subscription.plan.as_deref(), Some("creator"));
        assert_eq!(profile.niche.as_deref(), Some("fitness"));
        assert!(profile.brand_settings.is_some());
        assert!(profile.usage.is_none());
    }

    #[test]
    fn test_decodes_one_level_nested() {
        let by_user = decode_profile(json!({ "user": profile_json() })).unwrap();
        let by_data = decode_profile(json!({ "success": true, "data": profile_json() })).unwrap();
        assert_eq!(by_user, by_data);
        assert_eq!(by_user.email, "ada@example.com");
    }

    #[test]
    fn test_decodes_two_levels_nested() {
        let profile = decode_profile(json!({ "data": { "user": profile_json() } })).unwrap();
        assert_eq!(profile.name, "Ada");
    }

    #[test]
    fn test_direct_shape_wins_over_nested() {
        let mut body = profile_json();
        body["user"] = json!({ "id": "other", "email": "other@example.com" });
        let profile = decode_profile(body).unwrap();
        assert_eq!(profile.id, "u_42");
    }

    #[test]
    fn test_accepts_underscore_id_and_unknown_status() {
        let profile = decode_profile(json!({
            "_id": "abc",
            "email": "x@example.com",
            "subscription": { "status": "something_new" }
        }))
        .unwrap();
        assert_eq!(profile.id, "abc");
        assert_eq!(profile.subscription.status, SubscriptionStatus::Unknown);
    }

    #[test]
    fn test_missing_profile() {
        let err = decode_profile(json!({ "data": { "token": "t" } })).unwrap_err();
        assert!(matches!(err, DecodeError::MissingProfile));
    }

    #[test]
    fn test_not_an_object() {
        let err = decode_profile(json!(["id"])).unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject));
    }

    #[test]
    fn test_profile_without_email_is_invalid() {
        let err = decode_profile(json!({ "user": { "id": "u_1" } })).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidProfile(_)));
    }
}
