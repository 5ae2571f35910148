//! The Start/Stop protocol shared by long-lived frontier components
//! (the buffered scheduler today; anything else that owns background
//! tasks tomorrow).

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Start must be idempotent (returns [`LifecycleError::AlreadyStarted`] on
/// a second call without an intervening `stop`); Stop must be a no-op+error
/// when not started, and must not return until every internal worker has
/// exited.
///
/// `start` takes the parent cancellation token to derive its own internal,
/// cancellable child token from (a `CancellationToken::child_token()`),
/// mirroring `Start(ctx context.Context) error` deriving
/// `context.WithCancel(ctx)`. `stop` takes no token: in the source this
/// contract is modeled on, the `ctx` parameter to `Stop` is accepted but
/// never consulted — the component cancels its own internal context and
/// waits out its workers unconditionally.
#[async_trait::async_trait]
pub trait Lifecycle: Send + Sync {
    async fn start(&self, parent: &CancellationToken) -> Result<(), LifecycleError>;
    async fn stop(&self) -> Result<(), LifecycleError>;
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("component is already started")]
    AlreadyStarted,
    #[error("component is not started")]
    NotStarted,
}
