//! Client-side authentication session coordinator.
//!
//! One `SessionCoordinator` actor per process answers "who is signed in" for
//! every mounted `ConsumerBinding`: concurrent verifications share a single
//! identity call, fresh results come from a 30 second cache, and transient
//! failures are retried without signing the user out.

pub mod binding;
pub mod cache;
pub mod coordinator;
pub mod credential_store;
pub mod error;
pub mod identity;
pub mod navigation;
pub mod retry;
pub mod runtime;

pub use binding::{AuthHandle, ConsumerBinding, Teardown};
pub use cache::{SessionCache, SessionCacheEntry};
pub use coordinator::{
    GetSessionMetrics, GetSessionState, Logout, RefreshSession, SessionCoordinator, SessionMetrics, SignIn,
    Subscribe, Unsubscribe, VerifySession,
};
pub use credential_store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{CredentialStoreError, IdentityError, SessionError};
pub use identity::{HttpIdentityClient, IdentityService};
pub use navigation::{HistoryNavigator, Navigator, RouteGuard};
pub use retry::{FailureClass, RetryPolicy, VerificationAttempt};
pub use runtime::AuthRuntime;
