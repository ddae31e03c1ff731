use std::io::Write;
use std::sync::Arc;

use beacon_core::config::STORE_NAMESPACE;
use beacon_core::{BeaconConfig, EventSink, Lifecycle, NotificationEvent, NotificationId};
use beacon_protocol::EventFrame;
use beacon_scheduler::{
    AssetResolver, DisplayArtifact, FsAssetResolver, InstanceFactory, NotificationRegistry,
    PlatformCapability, Renderer, TimerService, TriggerPipeline, UiLoop, UiRenderer,
};
use beacon_store::{KeyValueStore, SqliteStore};
use tracing::{info, warn};

/// Every long-lived component, wired once at startup.
pub struct App {
    pub config: BeaconConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub timer: Arc<TimerService>,
    pub pipeline: Arc<TriggerPipeline>,
}

impl App {
    /// Open the on-disk store from `config` and wire everything around it.
    pub fn open(config: BeaconConfig) -> anyhow::Result<(Self, UiLoop)> {
        let store = SqliteStore::open(&config.store.path, STORE_NAMESPACE)?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    pub fn with_store(config: BeaconConfig, store: Arc<dyn KeyValueStore>) -> (Self, UiLoop) {
        let assets: Arc<dyn AssetResolver> = Arc::new(FsAssetResolver::new(&config.assets));
        let lifecycle = Arc::new(Lifecycle::new(config.lifecycle.event_queue_capacity));
        let timer = Arc::new(TimerService::new());
        let (renderer, ui_loop) = UiRenderer::new(Arc::new(LogRenderer));

        let registry = Arc::new(NotificationRegistry::new(
            store.clone(),
            assets.clone(),
            Arc::new(renderer),
            timer.clone(),
            lifecycle,
        ));
        let capability = PlatformCapability::from_config(&config.platform);
        let factory = InstanceFactory::for_platform(capability, config.app.name.clone(), assets);
        let pipeline = Arc::new(TriggerPipeline::new(registry, factory));

        (
            Self {
                config,
                store,
                timer,
                pipeline,
            },
            ui_loop,
        )
    }

    pub fn registry(&self) -> &Arc<NotificationRegistry> {
        self.pipeline.registry()
    }
}

/// Headless display surface: a shown notification is a log line.
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn notify(&self, id: NotificationId, artifact: &DisplayArtifact) {
        info!(
            %id,
            title = %artifact.title,
            text = %artifact.text,
            badge = artifact.badge,
            ongoing = artifact.ongoing,
            "notification shown"
        );
    }

    fn cancel(&self, id: NotificationId) {
        info!(%id, "notification removed from display");
    }
}

/// Writes lifecycle events to stdout as JSON lines, next to bridge responses.
pub struct StdoutSink;

impl EventSink for StdoutSink {
    fn deliver(&self, event: &NotificationEvent) {
        let frame = EventFrame::from(event.clone());
        if let Err(e) = write_json_line(&frame) {
            warn!(id = %event.id, error = %e, "failed to write event");
        }
    }
}

pub fn write_json_line(value: &impl serde::Serialize) -> std::io::Result<()> {
    let line = serde_json::to_string(value)?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "{line}")?;
    out.flush()
}
