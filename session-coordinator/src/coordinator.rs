// session-coordinator/src/coordinator.rs
use actix::prelude::*;
use common::{credential_fingerprint, SessionState, SessionUpdate, UserProfile};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::cache::SessionCache;
use crate::credential_store::CredentialStore;
use crate::error::{IdentityError, SessionError};
use crate::identity::IdentityService;
use crate::navigation::{Navigator, RouteGuard};
use crate::retry::{FailureClass, RetryPolicy, VerificationAttempt};

/// Default key the bearer credential is stored under
pub const DEFAULT_CREDENTIAL_KEY: &str = "token";

/// Actor message: Verify the stored credential, serving the cache when fresh
#[derive(Message)]
#[rtype(result = "Result<SessionState, SessionError>")]
pub struct VerifySession;

/// Actor message: Verify against the identity service even on a fresh cache hit
#[derive(Message)]
#[rtype(result = "Result<SessionState, SessionError>")]
pub struct RefreshSession;

/// Actor message: Store a newly issued credential and verify it
#[derive(Message)]
#[rtype(result = "Result<SessionState, SessionError>")]
pub struct SignIn {
    pub credential: String,
}

/// Actor message: Drop credential and cache, from any state
#[derive(Message)]
#[rtype(result = "()")]
pub struct Logout;

/// Actor message: Start receiving `SessionUpdate` broadcasts
#[derive(Message)]
#[rtype(result = "()")]
pub struct Subscribe {
    pub id: Uuid,
    pub recipient: Recipient<SessionUpdate>,
}

/// Actor message: Stop receiving broadcasts; unknown ids are ignored
#[derive(Message)]
#[rtype(result = "()")]
pub struct Unsubscribe {
    pub id: Uuid,
}

/// Actor message: Current state without side effects
#[derive(Message)]
#[rtype(result = "SessionState")]
pub struct GetSessionState;

/// Actor message: Get coordinator metrics
#[derive(Message)]
#[rtype(result = "SessionMetrics")]
pub struct GetSessionMetrics;

/// Coordinator metrics
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionMetrics {
    pub network_calls: u64,
    pub cache_hits: u64,
    pub joined_waiters: u64,
    pub retries: u64,
    pub fatal_failures: u64,
    pub subscribers: usize,
    pub in_flight: bool,
}

/// The one process-wide owner of session state
///
/// All mutation happens inside this actor's handlers, so at most one
/// `VerificationAttempt` exists at any time no matter how many bindings
/// call in.
pub struct SessionCoordinator {
    credentials: Arc<dyn CredentialStore>,
    identity: Arc<dyn IdentityService>,
    navigator: Arc<dyn Navigator>,
    cache: SessionCache,
    policy: RetryPolicy,
    guard: RouteGuard,
    credential_key: String,
    state: SessionState,
    attempt: Option<VerificationAttempt>,
    waiters: Vec<oneshot::Sender<SessionState>>,
    subscribers: DashMap<Uuid, Recipient<SessionUpdate>>,
    // Last profile verified for a credential, shown on recoverable errors for that credential only
    last_known: Option<(String, UserProfile)>,
    sequence: u64,
    metrics: SessionMetrics,
}

impl SessionCoordinator {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        identity: Arc<dyn IdentityService>,
        navigator: Arc<dyn Navigator>,
        cache: SessionCache,
    ) -> Self {
        Self {
            credentials,
            identity,
            navigator,
            cache,
            policy: RetryPolicy::default(),
            guard: RouteGuard::default(),
            credential_key: DEFAULT_CREDENTIAL_KEY.to_string(),
            state: SessionState::Idle,
            attempt: None,
            waiters: Vec::new(),
            subscribers: DashMap::new(),
            last_known: None,
            sequence: 0,
            metrics: SessionMetrics::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_route_guard(mut self, guard: RouteGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_credential_key(mut self, key: impl Into<String>) -> Self {
        self.credential_key = key.into();
        self
    }

    fn current_credential(&self) -> Option<String> {
        self.credentials
            .get(&self.credential_key)
            .filter(|credential| !credential.is_empty())
    }

    // Set state and fan it out to every subscriber, in emission order
    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::info!("Session state {} -> {}", self.state, next);
        }
        self.state = next;
        self.sequence += 1;

        let update = SessionUpdate {
            state: self.state.clone(),
            sequence: self.sequence,
        };
        for subscriber in self.subscribers.iter() {
            subscriber.value().do_send(update.clone());
        }
    }

    fn enter_unauthenticated(&mut self) {
        self.transition(SessionState::Unauthenticated);
        self.guard.enforce(self.navigator.as_ref());
    }

    fn last_known_user(&self, credential: &str) -> Option<UserProfile> {
        self.last_known
            .as_ref()
            .filter(|(known, _)| known == credential)
            .map(|(_, user)| user.clone())
    }

    fn resolve_waiters(&mut self) {
        let state = self.state.clone();
        for waiter in self.waiters.drain(..) {
            // A dropped receiver just means nobody awaits the reply
            let _ = waiter.send(state.clone());
        }
    }

    fn enqueue_waiter(&mut self) -> ResponseFuture<Result<SessionState, SessionError>> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push(tx);
        Box::pin(async move { rx.await.map_err(|_| SessionError::CoordinatorStopped) })
    }

    fn resolved(state: SessionState) -> ResponseFuture<Result<SessionState, SessionError>> {
        Box::pin(async move { Ok(state) })
    }

    /// Shared path for verify, refresh and sign-in
    fn verify(&mut self, force: bool, ctx: &mut Context<Self>) -> ResponseFuture<Result<SessionState, SessionError>> {
        // Signed out is an answer, not an error, even with a stale attempt still running
        let Some(credential) = self.current_credential() else {
            tracing::debug!("No credential stored");
            self.enter_unauthenticated();
            return Self::resolved(self.state.clone());
        };

        // Join the attempt already in flight. If it is for an older credential
        // the stale guard restarts it for this one when it lands.
        if let Some(attempt) = self.attempt.as_ref() {
            if attempt.credential != credential {
                tracing::debug!("Credential changed under the in-flight verification, queueing for restart");
            }
            self.metrics.joined_waiters += 1;
            tracing::debug!("Joining in-flight verification ({} waiting)", self.waiters.len() + 1);
            return self.enqueue_waiter();
        }

        if !force {
            if let Some(user) = self.cache.read(&credential) {
                self.metrics.cache_hits += 1;
                tracing::debug!("Session cache hit for user {}", user.id);
                self.last_known = Some((credential, user.clone()));
                self.transition(SessionState::Authenticated { user });
                return Self::resolved(self.state.clone());
            }
        }

        self.start_attempt(credential, ctx);
        self.enqueue_waiter()
    }

    fn start_attempt(&mut self, credential: String, ctx: &mut Context<Self>) {
        tracing::info!("Verifying credential {}", credential_fingerprint(&credential));
        self.attempt = Some(VerificationAttempt::new(credential));
        self.transition(SessionState::Checking);
        self.issue_call(ctx);
    }

    fn issue_call(&mut self, ctx: &mut Context<Self>) {
        let Some(attempt) = self.attempt.as_ref() else {
            return;
        };
        let credential = attempt.credential.clone();
        let identity = Arc::clone(&self.identity);
        self.metrics.network_calls += 1;

        let call = async move { identity.verify_identity(&credential).await };
        ctx.spawn(
            call.into_actor(self)
                .map(|result, act, ctx| act.complete_call(result, ctx)),
        );
    }

    // The stored credential no longer matches what is being verified
    fn is_stale(&self, attempt: &VerificationAttempt) -> bool {
        self.current_credential().as_deref() != Some(attempt.credential.as_str())
    }

    fn settle_stale(&mut self, ctx: &mut Context<Self>) {
        match self.current_credential() {
            Some(credential) => {
                tracing::info!("Credential changed during verification, starting over");
                // Waiters stay queued for the new attempt
                self.start_attempt(credential, ctx);
            }
            None => {
                tracing::info!("Credential removed during verification, discarding result");
                // Logout already broadcast and redirected
                if self.state != SessionState::Unauthenticated {
                    self.enter_unauthenticated();
                }
                self.resolve_waiters();
            }
        }
    }

    fn retry(&mut self, ctx: &mut Context<Self>) {
        let stale = match self.attempt.as_ref() {
            Some(attempt) => self.is_stale(attempt),
            None => return,
        };

        if stale {
            self.attempt = None;
            self.settle_stale(ctx);
        } else {
            self.issue_call(ctx);
        }
    }

    fn complete_call(&mut self, result: Result<UserProfile, IdentityError>, ctx: &mut Context<Self>) {
        let Some(mut attempt) = self.attempt.take() else {
            tracing::warn!("Verification result arrived with no attempt in flight");
            return;
        };

        if self.is_stale(&attempt) {
            self.settle_stale(ctx);
            return;
        }

        let fingerprint = credential_fingerprint(&attempt.credential);
        match result {
            Ok(user) => {
                tracing::info!(
                    "Credential {} verified for user {} after {} retries in {:?}",
                    fingerprint,
                    user.id,
                    attempt.retry_count,
                    attempt.started_at.elapsed()
                );
                self.cache.write(&attempt.credential, user.clone());
                self.last_known = Some((attempt.credential.clone(), user.clone()));
                self.transition(SessionState::Authenticated { user });
            }
            Err(error) => {
                let class = self.policy.classify(&error);
                attempt.classification = Some(class);

                if self.policy.should_retry(&attempt) {
                    attempt.retry_count += 1;
                    let delay = self.policy.delay_before_retry(&attempt);
                    tracing::warn!(
                        "Verification of {} failed ({}), retry {}/{} in {:?}",
                        fingerprint,
                        error,
                        attempt.retry_count,
                        self.policy.max_retries(),
                        delay
                    );
                    self.metrics.retries += 1;
                    self.attempt = Some(attempt);
                    ctx.run_later(delay, |act, ctx| act.retry(ctx));
                    return;
                }

                match class {
                    FailureClass::Fatal => {
                        tracing::warn!("Credential {} rejected ({}), signing out", fingerprint, error);
                        self.metrics.fatal_failures += 1;
                        self.credentials.remove(&self.credential_key);
                        self.cache.clear();
                        self.last_known = None;
                        self.enter_unauthenticated();
                    }
                    FailureClass::Transient => {
                        tracing::error!(
                            "Verification of {} gave up after {} attempts: {}",
                            fingerprint,
                            attempt.retry_count + 1,
                            error
                        );
                        // Keep credential and cache; the user stays on screen
                        self.transition(SessionState::ErrorRecoverable {
                            last_known_user: self.last_known_user(&attempt.credential),
                        });
                    }
                }
            }
        }

        self.resolve_waiters();
    }
}

impl Actor for SessionCoordinator {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            "SessionCoordinator started (fresh for {:?}, {} retries)",
            self.cache.freshness_window(),
            self.policy.max_retries()
        );
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            "SessionCoordinator stopped. {} network calls, {} cache hits, {} joined waiters",
            self.metrics.network_calls,
            self.metrics.cache_hits,
            self.metrics.joined_waiters
        );
    }
}

impl Handler<VerifySession> for SessionCoordinator {
    type Result = ResponseFuture<Result<SessionState, SessionError>>;

    fn handle(&mut self, _msg: VerifySession, ctx: &mut Self::Context) -> Self::Result {
        self.verify(false, ctx)
    }
}

impl Handler<RefreshSession> for SessionCoordinator {
    type Result = ResponseFuture<Result<SessionState, SessionError>>;

    fn handle(&mut self, _msg: RefreshSession, ctx: &mut Self::Context) -> Self::Result {
        self.verify(true, ctx)
    }
}

impl Handler<SignIn> for SessionCoordinator {
    type Result = ResponseFuture<Result<SessionState, SessionError>>;

    fn handle(&mut self, msg: SignIn, ctx: &mut Self::Context) -> Self::Result {
        tracing::info!("Storing credential {}", credential_fingerprint(&msg.credential));
        self.credentials.set(&self.credential_key, &msg.credential);
        self.verify(true, ctx)
    }
}

impl Handler<Logout> for SessionCoordinator {
    type Result = ();

    fn handle(&mut self, _msg: Logout, _ctx: &mut Self::Context) -> Self::Result {
        tracing::info!("Signing out");
        self.credentials.remove(&self.credential_key);
        self.cache.clear();
        self.last_known = None;
        self.enter_unauthenticated();
    }
}

impl Handler<Subscribe> for SessionCoordinator {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _ctx: &mut Self::Context) -> Self::Result {
        self.subscribers.insert(msg.id, msg.recipient);
        tracing::debug!("Binding {} subscribed ({} total)", msg.id, self.subscribers.len());
    }
}

impl Handler<Unsubscribe> for SessionCoordinator {
    type Result = ();

    fn handle(&mut self, msg: Unsubscribe, _ctx: &mut Self::Context) -> Self::Result {
        if self.subscribers.remove(&msg.id).is_some() {
            tracing::debug!("Binding {} unsubscribed ({} left)", msg.id, self.subscribers.len());
        }
    }
}

impl Handler<GetSessionState> for SessionCoordinator {
    type Result = MessageResult<GetSessionState>;

    fn handle(&mut self, _msg: GetSessionState, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.state.clone())
    }
}

impl Handler<GetSessionMetrics> for SessionCoordinator {
    type Result = MessageResult<GetSessionMetrics>;

    fn handle(&mut self, _msg: GetSessionMetrics, _ctx: &mut Self::Context) -> Self::Result {
        let mut metrics = self.metrics.clone();
        metrics.subscribers = self.subscribers.len();
        metrics.in_flight = self.attempt.is_some();
        MessageResult(metrics)
    }
}
