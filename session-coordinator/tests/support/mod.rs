// session-coordinator/tests/support/mod.rs
#![allow(dead_code)]

use actix::prelude::*;
use async_trait::async_trait;
use common::{Config, SessionUpdate, Subscription, SubscriptionStatus, UserProfile};
use parking_lot::Mutex;
use session_coordinator::{
    AuthRuntime, CredentialStore, HistoryNavigator, IdentityError, IdentityService, MemoryCredentialStore,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const KEY: &str = "token";
pub const CREDENTIAL: &str = "cred-alpha";

pub fn user(id: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        name: format!("User {}", id),
        subscription: Subscription {
            status: SubscriptionStatus::Active,
            plan: Some("pro".to_string()),
        },
        niche: None,
        brand_settings: None,
        usage: None,
    }
}

/// One scripted identity-service reply
#[derive(Debug, Clone)]
pub enum Reply {
    Profile(UserProfile),
    Timeout,
    Refused,
    Status(u16),
}

impl Reply {
    fn into_result(self) -> Result<UserProfile, IdentityError> {
        match self {
            Reply::Profile(user) => Ok(user),
            Reply::Timeout => Err(IdentityError::Timeout),
            Reply::Refused => Err(IdentityError::Network("connection refused".to_string())),
            Reply::Status(code) => Err(IdentityError::Status { code }),
        }
    }
}

/// Identity service that plays back replies and counts calls
pub struct ScriptedIdentity {
    script: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Reply>,
    delay: Duration,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedIdentity {
    pub fn new(fallback: Reply) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            delay: Duration::from_millis(5),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replies served before the fallback, in order
    pub fn then(self, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.script.lock().extend(replies);
        self
    }

    pub fn set_fallback(&self, reply: Reply) {
        *self.fallback.lock() = reply;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl IdentityService for ScriptedIdentity {
    async fn verify_identity(&self, credential: &str) -> Result<UserProfile, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(credential.to_string());

        let reply = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.lock().clone());

        tokio::time::sleep(self.delay).await;
        reply.into_result()
    }
}

/// Config with short delays so retry paths run quickly
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.session.retry_delay_ms = 10;
    config
}

pub struct Harness {
    pub runtime: AuthRuntime,
    pub identity: Arc<ScriptedIdentity>,
    pub credentials: Arc<MemoryCredentialStore>,
    pub navigator: Arc<HistoryNavigator>,
}

impl Harness {
    pub fn start(identity: ScriptedIdentity, credential: Option<&str>) -> Self {
        Self::start_at(identity, credential, "/dashboard")
    }

    pub fn start_at(identity: ScriptedIdentity, credential: Option<&str>, path: &str) -> Self {
        let identity = Arc::new(identity);
        let credentials = Arc::new(match credential {
            Some(value) => MemoryCredentialStore::with_entry(KEY, value),
            None => MemoryCredentialStore::new(),
        });
        let navigator = Arc::new(HistoryNavigator::new(path));

        let runtime = AuthRuntime::start(
            &test_config(),
            credentials.clone(),
            identity.clone(),
            navigator.clone(),
        );

        Self {
            runtime,
            identity,
            credentials,
            navigator,
        }
    }

    pub fn stored_credential(&self) -> Option<String> {
        self.credentials.get(KEY)
    }
}

/// Subscriber that records every broadcast it receives
pub struct Recorder {
    pub updates: Arc<Mutex<Vec<SessionUpdate>>>,
}

impl Actor for Recorder {
    type Context = Context<Self>;
}

impl Handler<SessionUpdate> for Recorder {
    type Result = ();

    fn handle(&mut self, msg: SessionUpdate, _ctx: &mut Self::Context) -> Self::Result {
        self.updates.lock().push(msg);
    }
}

pub fn recorder() -> (Addr<Recorder>, Arc<Mutex<Vec<SessionUpdate>>>) {
    let updates = Arc::new(Mutex::new(Vec::new()));
    let addr = Recorder {
        updates: updates.clone(),
    }
    .start();
    (addr, updates)
}

/// Let queued mailbox messages drain
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}
