//! Owner-side handle to a running asset actor

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::{Error, Result};

/// A control request: string frames plus a slot for the command's outcome
#[derive(Debug)]
pub struct ControlRequest {
    pub frames: Vec<String>,
    pub reply: oneshot::Sender<Result<()>>,
}

/// Sends control commands to an asset actor
///
/// Dropping every handle closes the control channel, which the actor treats
/// like `$TERM`.
#[derive(Debug)]
pub struct AssetHandle {
    tx: mpsc::Sender<ControlRequest>,
    task: Option<JoinHandle<()>>,
}

impl AssetHandle {
    pub(crate) const fn new(tx: mpsc::Sender<ControlRequest>, task: JoinHandle<()>) -> Self {
        Self {
            tx,
            task: Some(task),
        }
    }

    /// Send raw command frames and wait for the outcome
    ///
    /// # Errors
    ///
    /// Returns the command's error, or `Error::Terminated` if the actor is gone
    pub async fn send<I, S>(&self, frames: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (reply, rx) = oneshot::channel();
        let request = ControlRequest {
            frames: frames.into_iter().map(Into::into).collect(),
            reply,
        };

        self.tx.send(request).await.map_err(|_| Error::Terminated)?;
        rx.await.map_err(|_| Error::Terminated)?
    }

    /// Apply configuration text
    ///
    /// # Errors
    ///
    /// Returns error if the configuration cannot be adopted
    pub async fn configure(&self, text: &str) -> Result<()> {
        self.send(["CONFIG", text]).await
    }

    /// Connect the actor to the bus
    ///
    /// # Errors
    ///
    /// Returns error if the connection cannot be established
    pub async fn start(&self) -> Result<()> {
        self.send(["START"]).await
    }

    /// Disconnect the actor and persist its devices
    ///
    /// # Errors
    ///
    /// Returns error if the devices cannot be stored
    pub async fn stop(&self) -> Result<()> {
        self.send(["STOP"]).await
    }

    /// Toggle verbose diagnostics
    ///
    /// # Errors
    ///
    /// Returns error if the actor is gone
    pub async fn verbose(&self) -> Result<()> {
        self.send(["VERBOSE"]).await
    }

    /// Terminate the actor and wait until it has released everything
    ///
    /// # Errors
    ///
    /// Returns error if the actor was already gone
    pub async fn terminate(mut self) -> Result<()> {
        let result = self.send(["$TERM"]).await;
        let joined = match self.task.take() {
            Some(task) => task.await,
            None => Ok(()),
        };
        if let Err(e) = joined {
            tracing::error!(error = %e, "asset actor task failed");
        }
        result
    }
}
