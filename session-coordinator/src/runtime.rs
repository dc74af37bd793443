// session-coordinator/src/runtime.rs
use actix::prelude::*;
use common::{AuthView, Config, SessionState};
use std::sync::Arc;

use crate::binding::{AuthHandle, ConsumerBinding};
use crate::cache::SessionCache;
use crate::coordinator::{
    GetSessionMetrics, GetSessionState, Logout, RefreshSession, SessionCoordinator, SessionMetrics, SignIn,
    VerifySession,
};
use crate::credential_store::CredentialStore;
use crate::error::SessionError;
use crate::identity::IdentityService;
use crate::navigation::{Navigator, RouteGuard};
use crate::retry::RetryPolicy;

/// Holds the single coordinator and what bindings need next to it
///
/// Build one per process and clone it into whatever mounts bindings.
#[derive(Clone)]
pub struct AuthRuntime {
    coordinator: Addr<SessionCoordinator>,
    cache: SessionCache,
    credentials: Arc<dyn CredentialStore>,
    credential_key: String,
}

impl AuthRuntime {
    /// Start the coordinator on the current arbiter
    pub fn start(
        config: &Config,
        credentials: Arc<dyn CredentialStore>,
        identity: Arc<dyn IdentityService>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let cache = SessionCache::new(config.session.freshness_window());
        let credential_key = config.session.credential_key.clone();

        let coordinator = SessionCoordinator::new(Arc::clone(&credentials), identity, navigator, cache.clone())
            .with_policy(RetryPolicy::from(&config.session))
            .with_route_guard(RouteGuard::from(&config.navigation))
            .with_credential_key(credential_key.clone())
            .start();

        Self {
            coordinator,
            cache,
            credentials,
            credential_key,
        }
    }

    pub fn coordinator(&self) -> &Addr<SessionCoordinator> {
        &self.coordinator
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// What a new binding can show before the coordinator answers
    pub fn initial_view(&self) -> AuthView {
        self.credentials
            .get(&self.credential_key)
            .and_then(|credential| self.cache.read(&credential))
            .map(AuthView::signed_in)
            .unwrap_or_else(AuthView::loading)
    }

    /// Mount a consumer binding
    pub fn mount(&self) -> AuthHandle {
        ConsumerBinding::mount(self.coordinator.clone(), self.initial_view())
    }

    pub async fn verify(&self) -> Result<SessionState, SessionError> {
        self.coordinator.send(VerifySession).await?
    }

    pub async fn refresh(&self) -> Result<SessionState, SessionError> {
        self.coordinator.send(RefreshSession).await?
    }

    pub async fn sign_in(&self, credential: impl Into<String>) -> Result<SessionState, SessionError> {
        self.coordinator
            .send(SignIn {
                credential: credential.into(),
            })
            .await?
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        self.coordinator.send(Logout).await?;
        Ok(())
    }

    pub async fn state(&self) -> Result<SessionState, SessionError> {
        Ok(self.coordinator.send(GetSessionState).await?)
    }

    pub async fn metrics(&self) -> Result<SessionMetrics, SessionError> {
        Ok(self.coordinator.send(GetSessionMetrics).await?)
    }
}
