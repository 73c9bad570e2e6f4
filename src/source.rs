//! Position stream abstraction.
//!
//! A [`PositionSource`] hands out cancelable asynchronous fix streams. A stream
//! may end with an error (permission revoked, provider unavailable) and the
//! source must accept a fresh subscription afterwards. Dropping the stream is
//! the unsubscribe.

use std::sync::{Mutex, PoisonError};

use futures::channel::mpsc::{self, UnboundedSender};
use futures::stream::BoxStream;
use log::{debug, info};

use crate::error::SourceError;
use crate::types::PositionFix;

/// Stream of fixes handed to the controller.
pub type FixStream = BoxStream<'static, Result<PositionFix, SourceError>>;

pub trait PositionSource: Send + Sync {
    /// Open a new fix stream. Any previous stream from this source may end.
    fn subscribe(&self) -> FixStream;

    /// Best-effort most recent fix, for fast initial map centering.
    fn last_known_fix(&self) -> Option<PositionFix>;
}

#[derive(Default)]
struct ChannelState {
    sender: Option<UnboundedSender<Result<PositionFix, SourceError>>>,
    last_known: Option<PositionFix>,
}

/// [`PositionSource`] fed by pushing fixes into it.
///
/// Platform location callbacks call [`push`](Self::push) and
/// [`fail`](Self::fail); each `subscribe` opens a new channel and closes the
/// previous one.
#[derive(Default)]
pub struct ChannelPositionSource {
    state: Mutex<ChannelState>,
}

impl ChannelPositionSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ChannelState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Deliver a fix to the current subscriber. Returns false if nobody is listening.
    pub fn push(&self, fix: PositionFix) -> bool {
        self.with_state(|state| {
            if fix.is_valid() {
                state.last_known = Some(fix);
            }
            let delivered = state
                .sender
                .as_ref()
                .is_some_and(|tx| tx.unbounded_send(Ok(fix)).is_ok());
            if !delivered && state.sender.take().is_some() {
                debug!("run_tracker: [Source] Subscriber gone, dropping sender");
            }
            delivered
        })
    }

    /// Terminate the current stream with an error.
    pub fn fail(&self, error: SourceError) {
        self.with_state(|state| {
            if let Some(tx) = state.sender.take() {
                info!("run_tracker: [Source] Failing stream: {}", error);
                let _ = tx.unbounded_send(Err(error));
            }
        });
    }

    /// End the current stream without an error.
    pub fn close(&self) {
        self.with_state(|state| {
            state.sender.take();
        });
    }

    pub fn has_subscriber(&self) -> bool {
        self.with_state(|state| state.sender.as_ref().is_some_and(|tx| !tx.is_closed()))
    }
}

impl PositionSource for ChannelPositionSource {
    fn subscribe(&self) -> FixStream {
        let (tx, rx) = mpsc::unbounded();
        self.with_state(|state| {
            if state.sender.replace(tx).is_some() {
                debug!("run_tracker: [Source] Replacing previous subscription");
            }
        });
        Box::pin(rx)
    }

    fn last_known_fix(&self) -> Option<PositionFix> {
        self.with_state(|state| state.last_known)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use futures::StreamExt;

    fn fix(lat: f64) -> PositionFix {
        PositionFix::new(lat, 0.0, Utc::now())
    }

    #[tokio::test]
    async fn test_push_and_receive() {
        let source = ChannelPositionSource::new();
        assert!(!source.push(fix(1.0)));

        let mut stream = source.subscribe();
        assert!(source.has_subscriber());
        assert!(source.push(fix(2.0)));
        let received = stream.next().await.unwrap().unwrap();
        assert_eq!(received.latitude, 2.0);
        assert_eq!(source.last_known_fix().unwrap().latitude, 2.0);
    }

    #[tokio::test]
    async fn test_fail_then_resubscribe() {
        let source = ChannelPositionSource::new();
        let mut stream = source.subscribe();
        source.fail(SourceError::PermissionRevoked);

        assert_eq!(
            stream.next().await.unwrap().unwrap_err(),
            SourceError::PermissionRevoked
        );
        assert!(stream.next().await.is_none());

        let mut stream = source.subscribe();
        assert!(source.push(fix(3.0)));
        assert_eq!(stream.next().await.unwrap().unwrap().latitude, 3.0);
    }

    #[tokio::test]
    async fn test_dropped_stream_unsubscribes() {
        let source = ChannelPositionSource::new();
        let stream = source.subscribe();
        drop(stream);
        assert!(!source.has_subscriber());
        assert!(!source.push(fix(1.0)));
    }

    #[test]
    fn test_last_known_ignores_invalid() {
        let source = ChannelPositionSource::new();
        source.push(fix(4.0));
        source.push(fix(400.0));
        assert_eq!(source.last_known_fix().unwrap().latitude, 4.0);
    }
}
