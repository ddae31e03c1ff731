//! Hand-off of display calls to the task that owns the renderer.
//!
//! Renderers are not safe to drive from arbitrary threads. [`UiRenderer`]
//! queues calls for a [`UiLoop`] running on the UI-owned task; if that loop
//! is gone it renders on the caller's thread instead of losing the call.

use std::sync::Arc;

use beacon_core::NotificationId;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::instance::DisplayArtifact;
use crate::platform::Renderer;

enum UiCommand {
    Notify(NotificationId, Box<DisplayArtifact>),
    Cancel(NotificationId),
}

fn apply(target: &dyn Renderer, cmd: UiCommand) {
    match cmd {
        UiCommand::Notify(id, artifact) => target.notify(id, &artifact),
        UiCommand::Cancel(id) => target.cancel(id),
    }
}

pub struct UiRenderer {
    tx: mpsc::UnboundedSender<UiCommand>,
    target: Arc<dyn Renderer>,
}

/// Receiving half; run it on the UI-owned task.
pub struct UiLoop {
    rx: mpsc::UnboundedReceiver<UiCommand>,
    target: Arc<dyn Renderer>,
}

impl UiRenderer {
    pub fn new(target: Arc<dyn Renderer>) -> (Self, UiLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                target: target.clone(),
            },
            UiLoop { rx, target },
        )
    }

    fn post(&self, cmd: UiCommand) {
        if let Err(mpsc::error::SendError(cmd)) = self.tx.send(cmd) {
            warn!("UI loop unavailable; rendering on caller thread");
            apply(self.target.as_ref(), cmd);
        }
    }
}

impl Renderer for UiRenderer {
    fn notify(&self, id: NotificationId, artifact: &DisplayArtifact) {
        self.post(UiCommand::Notify(id, Box::new(artifact.clone())));
    }

    fn cancel(&self, id: NotificationId) {
        self.post(UiCommand::Cancel(id));
    }
}

impl UiLoop {
    /// Apply queued calls in order until every [`UiRenderer`] is dropped.
    pub async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            apply(self.target.as_ref(), cmd);
        }
        debug!("UI loop stopped");
    }
}
