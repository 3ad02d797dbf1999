use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use thiserror::Error;
use tracing::warn;

/// The worker thread ended without sending a result, usually by panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("background call ended without a result")]
pub struct CallLost;

/// One blocking call running on its own thread.
///
/// The result is handed back to the UI thread through [`try_take`] or
/// [`wait`]. Dropping the handle abandons the result.
///
/// [`try_take`]: BackgroundCall::try_take
/// [`wait`]: BackgroundCall::wait
#[derive(Debug)]
pub struct BackgroundCall<T> {
    receiver: Receiver<T>,
}

impl<T: Send + 'static> BackgroundCall<T> {
    pub fn spawn<F>(work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            // The receiver is gone when the call was cancelled.
            let _ = sender.send(work());
        });
        Self { receiver }
    }

    /// Returns the result if the call has finished, without blocking.
    /// `Ok(None)` while it is still running.
    pub fn try_take(&self) -> Result<Option<T>, CallLost> {
        match self.receiver.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                warn!("background call ended without a result");
                Err(CallLost)
            }
        }
    }

    /// Blocks until the call finishes.
    pub fn wait(self) -> Result<T, CallLost> {
        self.receiver.recv().map_err(|_| {
            warn!("background call ended without a result");
            CallLost
        })
    }
}
