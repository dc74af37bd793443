// common/src/models/session.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use super::profile::UserProfile;

/// User-facing message for a verification that ran out of retries
pub const CONNECTION_ISSUE: &str = "Connection issue. Please try again.";

/// Coordinator state, broadcast to every subscribed binding on each transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Checking,
    Authenticated { user: UserProfile },
    Unauthenticated,
    /// Retries exhausted on a non-auth failure; the credential is kept
    ErrorRecoverable { last_known_user: Option<UserProfile> },
}

impl SessionState {
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            SessionState::Authenticated { user } => Some(user),
            SessionState::ErrorRecoverable { last_known_user } => last_known_user.as_ref(),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Checking => "checking",
            SessionState::Authenticated { .. } => "authenticated",
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::ErrorRecoverable { .. } => "error_recoverable",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Authenticated { user } => write!(f, "authenticated({})", user.id),
            other => f.write_str(other.label()),
        }
    }
}

/// What a consumer binding exposes to its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthView {
    pub user: Option<UserProfile>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for AuthView {
    fn default() -> Self {
        Self::loading()
    }
}

impl AuthView {
    /// Nothing known yet
    pub fn loading() -> Self {
        Self {
            user: None,
            loading: true,
            error: None,
        }
    }

    /// Seeded from a fresh cache entry
    pub fn signed_in(user: UserProfile) -> Self {
        Self {
            user: Some(user),
            loading: false,
            error: None,
        }
    }

    /// Fold one coordinator broadcast into the view
    pub fn apply(&mut self, state: &SessionState) {
        match state {
            // Keep whatever user is on screen while a check runs
            SessionState::Idle | SessionState::Checking => {
                self.loading = true;
                self.error = None;
            }
            SessionState::Authenticated { user } => {
                *self = Self::signed_in(user.clone());
            }
            SessionState::Unauthenticated => {
                self.user = None;
                self.loading = false;
                self.error = None;
            }
            // The coordinator only carries a user verified for the current credential
            SessionState::ErrorRecoverable { last_known_user } => {
                self.user = last_known_user.clone();
                self.loading = false;
                self.error = Some(CONNECTION_ISSUE.to_string());
            }
        }
    }
}
