// auth-probe/src/commands.rs
use common::{credential_fingerprint, AuthView, Config, SessionState};
use futures::future::join_all;
use serde::Serialize;
use session_coordinator::{
    AuthRuntime, CredentialStore, CredentialStoreError, FileCredentialStore, HistoryNavigator, HttpIdentityClient,
    IdentityError, RouteGuard, SessionError, SessionMetrics,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] CredentialStoreError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct Report {
    state: SessionState,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    views: Vec<AuthView>,
    redirects: Vec<String>,
    metrics: SessionMetrics,
}

#[derive(Serialize)]
struct StatusReport<'a> {
    endpoint: String,
    credential_store: &'a str,
    credential_key: &'a str,
    credential: Option<String>,
    sign_in_path: String,
}

fn print_json(value: &impl Serialize) -> Result<(), ProbeError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints where the probe would connect and which credential it holds
pub fn status(config: &Config) -> Result<(), ProbeError> {
    let store = FileCredentialStore::open(&config.credential_store.path)?;
    let client = HttpIdentityClient::new(&config.identity)?;

    print_json(&StatusReport {
        endpoint: client.endpoint().to_string(),
        credential_store: &config.credential_store.path,
        credential_key: &config.session.credential_key,
        credential: store
            .get(&config.session.credential_key)
            .map(|credential| credential_fingerprint(&credential)),
        sign_in_path: RouteGuard::from(&config.navigation).sign_in_path().to_string(),
    })
}

/// A runtime wired to the file store and the HTTP identity client
pub struct Probe {
    runtime: AuthRuntime,
    navigator: Arc<HistoryNavigator>,
}

impl Probe {
    pub fn build(config: &Config, path: &str) -> Result<Self, ProbeError> {
        let credentials = Arc::new(FileCredentialStore::open(&config.credential_store.path)?);
        let identity = Arc::new(HttpIdentityClient::new(&config.identity)?);
        let navigator = Arc::new(HistoryNavigator::new(path));

        tracing::info!("Probing {} from {}", identity.endpoint(), path);

        let runtime = AuthRuntime::start(config, credentials, identity, navigator.clone());
        Ok(Self { runtime, navigator })
    }

    async fn report(&self, views: Vec<AuthView>) -> Result<(), ProbeError> {
        print_json(&Report {
            state: self.runtime.state().await?,
            views,
            redirects: self.navigator.redirects(),
            metrics: self.runtime.metrics().await?,
        })
    }

    pub async fn verify(&self, consumers: usize) -> Result<(), ProbeError> {
        let mut handles: Vec<_> = (0..consumers.max(1)).map(|_| self.runtime.mount()).collect();
        let views = join_all(handles.iter_mut().map(|handle| handle.settled())).await;
        self.report(views).await
    }

    pub async fn refresh(&self) -> Result<(), ProbeError> {
        self.runtime.refresh().await?;
        self.report(Vec::new()).await
    }

    pub async fn sign_in(&self, credential: String) -> Result<(), ProbeError> {
        tracing::info!("Signing in with credential {}", credential_fingerprint(&credential));
        self.runtime.sign_in(credential).await?;
        self.report(Vec::new()).await
    }

    pub async fn logout(&self) -> Result<(), ProbeError> {
        self.runtime.logout().await?;
        self.report(Vec::new()).await
    }

    pub async fn watch(&self, interval: u64) -> Result<(), ProbeError> {
        let mut handle = self.runtime.mount();
        tracing::info!("Watching as binding {}", handle.id());
        print_json(&handle.view())?;

        let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
        ticker.tick().await;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                view = handle.changed() => match view {
                    Some(view) => print_json(&view)?,
                    None => break,
                },
                _ = ticker.tick(), if interval > 0 => {
                    tracing::debug!("Forcing refresh");
                    self.runtime.refresh().await?;
                }
                _ = &mut shutdown => {
                    tracing::info!("Interrupted, tearing down binding");
                    break;
                }
            }
        }

        handle.teardown();
        self.report(Vec::new()).await
    }
}
