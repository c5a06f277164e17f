//! Session actor message types.

use tokio::sync::oneshot;

use super::state::Input;
use crate::auth::AuthEvent;

/// Messages that can be sent to a SessionActor
#[derive(Debug)]
pub enum EngineMessage {
    /// Auth change delivered outside the store subscription (OAuth callback)
    Event(AuthEvent),

    /// Result of a background step
    Apply(Input),

    /// Caller-initiated input; acknowledged once its synchronous effects ran
    ApplyAndAck {
        input: Input,
        response: oneshot::Sender<()>,
    },
}
