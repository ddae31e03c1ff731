#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use beacon_core::{Lifecycle, NotificationId};
use beacon_scheduler::{
    AssetError, AssetResolver, DisplayArtifact, InstanceFactory, NotificationRegistry,
    PlatformCapability, Renderer, Timer, TriggerPipeline,
};
use beacon_store::{KeyValueStore, MemoryStore};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Renderer that remembers what is currently on screen.
#[derive(Default)]
pub struct RecordingRenderer {
    pub visible: Mutex<HashMap<NotificationId, DisplayArtifact>>,
    pub notify_calls: Mutex<Vec<NotificationId>>,
    pub cancel_calls: Mutex<Vec<NotificationId>>,
}

impl RecordingRenderer {
    pub fn is_visible(&self, id: i32) -> bool {
        self.visible.lock().unwrap().contains_key(&NotificationId(id))
    }

    pub fn notify_count(&self) -> usize {
        self.notify_calls.lock().unwrap().len()
    }
}

impl Renderer for RecordingRenderer {
    fn notify(&self, id: NotificationId, artifact: &DisplayArtifact) {
        self.notify_calls.lock().unwrap().push(id);
        self.visible.lock().unwrap().insert(id, artifact.clone());
    }

    fn cancel(&self, id: NotificationId) {
        self.cancel_calls.lock().unwrap().push(id);
        self.visible.lock().unwrap().remove(&id);
    }
}

/// Timer that records arm/disarm calls instead of waking anything up.
#[derive(Default)]
pub struct RecordingTimer {
    pub armed: Mutex<HashMap<NotificationId, DateTime<Utc>>>,
    pub schedule_calls: Mutex<Vec<(NotificationId, DateTime<Utc>)>>,
    pub cancel_calls: Mutex<Vec<NotificationId>>,
}

impl RecordingTimer {
    pub fn armed_at(&self, id: i32) -> Option<DateTime<Utc>> {
        self.armed.lock().unwrap().get(&NotificationId(id)).copied()
    }

    pub fn schedule_count(&self) -> usize {
        self.schedule_calls.lock().unwrap().len()
    }
}

impl Timer for RecordingTimer {
    fn schedule(&self, id: NotificationId, at: DateTime<Utc>, _payload: Value) {
        self.schedule_calls.lock().unwrap().push((id, at));
        self.armed.lock().unwrap().insert(id, at);
    }

    fn cancel(&self, id: NotificationId) {
        self.cancel_calls.lock().unwrap().push(id);
        self.armed.lock().unwrap().remove(&id);
    }
}

/// Every reference resolves; nothing touches the filesystem.
pub struct FakeAssets;

impl AssetResolver for FakeAssets {
    fn resolve_icon(&self, reference: &str) -> Result<String, AssetError> {
        if reference == "missing" {
            return Err(AssetError::NotFound(reference.to_string()));
        }
        Ok(format!("file:///res/{reference}.png"))
    }

    fn resolve_sound(&self, reference: Option<&str>) -> Result<String, AssetError> {
        Ok(match reference {
            Some(r) => format!("file:///res/{r}.ogg"),
            None => self.default_sound(),
        })
    }

    fn default_icon(&self) -> String {
        "res://icon".to_string()
    }

    fn default_sound(&self) -> String {
        "res://platform_default".to_string()
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub renderer: Arc<RecordingRenderer>,
    pub timer: Arc<RecordingTimer>,
    pub lifecycle: Arc<Lifecycle>,
    pub registry: Arc<NotificationRegistry>,
    pub pipeline: TriggerPipeline,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let renderer = Arc::new(RecordingRenderer::default());
        let timer = Arc::new(RecordingTimer::default());
        let lifecycle = Arc::new(Lifecycle::new(16));
        let assets: Arc<dyn AssetResolver> = Arc::new(FakeAssets);
        let registry = Arc::new(NotificationRegistry::new(
            store.clone() as Arc<dyn KeyValueStore>,
            assets.clone(),
            renderer.clone(),
            timer.clone(),
            lifecycle.clone(),
        ));
        let factory =
            InstanceFactory::for_platform(PlatformCapability { api_level: 30 }, "Test App", assets);
        let pipeline = TriggerPipeline::new(registry.clone(), factory);
        Self {
            store,
            renderer,
            timer,
            lifecycle,
            registry,
            pipeline,
        }
    }
}

pub fn props(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        other => panic!("expected object, got {other}"),
    }
}

pub fn ids(raw: &[i32]) -> Vec<NotificationId> {
    raw.iter().copied().map(NotificationId).collect()
}
