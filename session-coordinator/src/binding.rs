// session-coordinator/src/binding.rs
use actix::prelude::*;
use common::{AuthView, SessionState, SessionUpdate, UserProfile};
use tokio::sync::watch;
use uuid::Uuid;

use crate::coordinator::{Logout, RefreshSession, SessionCoordinator, Subscribe, Unsubscribe, VerifySession};
use crate::error::SessionError;

/// Actor message: Unmount the binding; repeated teardowns are no-ops
#[derive(Message)]
#[rtype(result = "()")]
pub struct Teardown;

/// One UI mount point's view of the session
///
/// Subscribes on start and unsubscribes on stop. The view sender is dropped
/// at teardown, so a broadcast that was already in flight has nowhere to go.
pub struct ConsumerBinding {
    id: Uuid,
    coordinator: Addr<SessionCoordinator>,
    view: Option<watch::Sender<AuthView>>,
    last_sequence: u64,
}

impl ConsumerBinding {
    /// Start a binding seeded with `initial` and hand back its owner handle
    pub fn mount(coordinator: Addr<SessionCoordinator>, initial: AuthView) -> AuthHandle {
        let id = Uuid::new_v4();
        let (tx, rx) = watch::channel(initial);

        let binding = ConsumerBinding {
            id,
            coordinator: coordinator.clone(),
            view: Some(tx),
            last_sequence: 0,
        }
        .start();

        AuthHandle {
            id,
            binding,
            coordinator,
            view: rx,
        }
    }
}

impl Actor for ConsumerBinding {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!("Binding {} mounted", self.id);

        // Same sender, so the coordinator sees Subscribe before VerifySession
        self.coordinator.do_send(Subscribe {
            id: self.id,
            recipient: ctx.address().recipient(),
        });
        self.coordinator.do_send(VerifySession);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.coordinator.do_send(Unsubscribe { id: self.id });
        tracing::debug!("Binding {} torn down", self.id);
    }
}

impl Handler<SessionUpdate> for ConsumerBinding {
    type Result = ();

    fn handle(&mut self, msg: SessionUpdate, _ctx: &mut Self::Context) -> Self::Result {
        let Some(view) = self.view.as_ref() else {
            return;
        };

        if msg.sequence <= self.last_sequence {
            tracing::warn!(
                "Binding {} dropped out-of-order update {} (at {})",
                self.id,
                msg.sequence,
                self.last_sequence
            );
            return;
        }
        self.last_sequence = msg.sequence;

        view.send_modify(|current| current.apply(&msg.state));
    }
}

impl Handler<Teardown> for ConsumerBinding {
    type Result = ();

    fn handle(&mut self, _msg: Teardown, ctx: &mut Self::Context) -> Self::Result {
        if self.view.take().is_some() {
            ctx.stop();
        }
    }
}

/// What the owner of a mount point holds: `{ user, loading, error, logout, refresh }`
///
/// Dropping the handle tears the binding down.
pub struct AuthHandle {
    id: Uuid,
    binding: Addr<ConsumerBinding>,
    coordinator: Addr<SessionCoordinator>,
    view: watch::Receiver<AuthView>,
}

impl AuthHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn view(&self) -> AuthView {
        self.view.borrow().clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.view.borrow().user.clone()
    }

    pub fn loading(&self) -> bool {
        self.view.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.view.borrow().error.clone()
    }

    /// Wait for the first view that is no longer loading
    ///
    /// Returns the last known view if the binding is torn down first.
    pub async fn settled(&mut self) -> AuthView {
        if let Ok(view) = self.view.wait_for(|view| !view.loading).await {
            return AuthView::clone(&view);
        }
        self.view()
    }

    /// Next view change, or `None` once the binding is gone
    pub async fn changed(&mut self) -> Option<AuthView> {
        self.view.changed().await.ok()?;
        Some(self.view.borrow_and_update().clone())
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        self.coordinator.send(Logout).await?;
        Ok(())
    }

    pub async fn refresh(&self) -> Result<SessionState, SessionError> {
        self.coordinator.send(RefreshSession).await?
    }

    pub fn teardown(&self) {
        self.binding.do_send(Teardown);
    }
}

impl Drop for AuthHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}
