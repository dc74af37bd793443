// common/src/messages.rs
use actix::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::session::SessionState;

/// Broadcast from the coordinator to every subscribed binding
#[derive(Debug, Clone, Serialize, Deserialize, Message)]
#[rtype(result = "()")]
pub struct SessionUpdate {
    pub state: SessionState,
    /// Monotonic per coordinator, lets subscribers check ordering
    pub sequence: u64,
}
