use crate::SyncResult;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// A settled background pull. The error is kept as its rendered message so
/// that every waiter can get a copy.
type Settled = std::result::Result<SyncResult, String>;

/// The most recently started background pull.
#[derive(Default)]
pub(super) struct BackgroundPull {
    receiver: Mutex<Option<watch::Receiver<Option<Settled>>>>,
}

impl BackgroundPull {
    fn receiver(&self) -> MutexGuard<'_, Option<watch::Receiver<Option<Settled>>>> {
        self.receiver.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn `pull`, replacing whatever earlier background pull was tracked.
    pub(super) fn start<F>(&self, pull: F)
    where
        F: Future<Output = Result<SyncResult>> + Send + 'static,
    {
        let (sender, receiver) = watch::channel(None);
        *self.receiver() = Some(receiver);
        tokio::spawn(async move {
            let settled = pull.await.map_err(|e| e.to_string());
            match &settled {
                Ok(result) => tracing::info!(
                    downloaded = result.downloaded_files.len(),
                    errors = result.errors.len(),
                    "Background pull settled"
                ),
                Err(message) => tracing::error!(error = %message, "Background pull failed"),
            }
            sender.send_replace(Some(settled));
        });
    }

    pub(super) async fn wait(&self) -> Result<SyncResult> {
        let Some(mut receiver) = self.receiver().clone() else {
            exn::bail!(ErrorKind::NoBackgroundPull);
        };
        let settled = receiver.wait_for(Option::is_some).await.or_raise(|| {
            ErrorKind::BackgroundPull("background pull ended without reporting a result".to_string())
        })?;
        match &*settled {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(message)) => exn::bail!(ErrorKind::BackgroundPull(message.clone())),
            None => exn::bail!(ErrorKind::BackgroundPull("background pull has not settled".to_string())),
        }
    }

    pub(super) fn is_complete(&self) -> bool {
        self.receiver().as_ref().is_some_and(|receiver| receiver.borrow().is_some())
    }
}
