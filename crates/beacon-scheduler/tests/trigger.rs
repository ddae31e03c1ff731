mod common;

use std::sync::Arc;

use beacon_core::{Lifecycle, NotificationId};
use beacon_scheduler::{
    ArtifactBuilder, AssetResolver, BuildPath, DisplayArtifact, DropReason, InstanceFactory,
    NotificationRegistry, OptionRecord, PlatformCapability, Renderer, SchedulerError,
    TimerService, TriggerOutcome, TriggerPipeline, UiRenderer,
};
use beacon_store::MemoryStore;
use chrono::{Duration, TimeZone, Utc};
use common::{props, FakeAssets, Harness, RecordingRenderer};
use serde_json::json;

#[test]
fn fire_for_cancelled_id_displays_nothing_and_leaves_nothing() {
    let h = Harness::new();
    h.registry.schedule(props(json!({"id": 1}))).unwrap();
    h.registry.cancel(NotificationId(1)).unwrap();

    let outcome = h.pipeline.on_trigger(NotificationId(1), Some(&json!({"id": 1})));

    assert_eq!(outcome, TriggerOutcome::Dropped(DropReason::NotFound));
    assert_eq!(h.renderer.notify_count(), 0);
    assert!(h.registry.list_ids().is_empty());
}

#[test]
fn repeating_fire_advances_persisted_trigger_and_rearms() {
    let h = Harness::new();
    let original = Utc::now() + Duration::minutes(10);
    let original = Utc.timestamp_opt(original.timestamp(), 0).unwrap();
    h.registry
        .schedule(props(json!({"id": 2, "at": original.timestamp(), "every": "hour"})))
        .unwrap();
    let arms_before = h.timer.schedule_count();

    let outcome = h.pipeline.on_trigger_at(NotificationId(2), None, original);

    let expected = original + Duration::hours(1);
    assert_eq!(outcome, TriggerOutcome::Rearmed { next: expected });
    assert_eq!(h.timer.schedule_count(), arms_before + 1);
    assert_eq!(h.timer.armed_at(2), Some(expected));
    assert_eq!(
        h.registry.get(NotificationId(2)).unwrap().requested_at(),
        Some(expected)
    );
    assert!(h.renderer.is_visible(2));
}

#[test]
fn one_shot_fire_keeps_trigger_and_does_not_rearm() {
    let h = Harness::new();
    let original = Utc::now() + Duration::minutes(10);
    let original = Utc.timestamp_opt(original.timestamp(), 0).unwrap();
    h.registry
        .schedule(props(json!({"id": 3, "at": original.timestamp()})))
        .unwrap();
    let arms_before = h.timer.schedule_count();

    let outcome = h.pipeline.on_trigger_at(NotificationId(3), None, original);

    assert_eq!(outcome, TriggerOutcome::Displayed { updated: false });
    assert_eq!(h.timer.schedule_count(), arms_before);
    let stored = h.registry.get(NotificationId(3)).expect("kept as history");
    assert_eq!(stored.requested_at(), Some(original));
}

#[test]
fn edit_driven_fire_keeps_repeating_notification_armed() {
    let timer = Arc::new(TimerService::new());
    let renderer = Arc::new(RecordingRenderer::default());
    let assets: Arc<dyn AssetResolver> = Arc::new(FakeAssets);
    let registry = Arc::new(NotificationRegistry::new(
        Arc::new(MemoryStore::new()),
        assets.clone(),
        renderer.clone(),
        timer.clone(),
        Arc::new(Lifecycle::default()),
    ));
    let factory =
        InstanceFactory::for_platform(PlatformCapability { api_level: 30 }, "Test App", assets);
    let pipeline = TriggerPipeline::new(registry.clone(), factory);

    let scheduled = registry
        .schedule(props(json!({"id": 1, "every": "minute"})))
        .unwrap();
    let original = scheduled.requested_at().unwrap();
    registry
        .update(NotificationId(1), props(json!({"text": "edited"})))
        .unwrap()
        .unwrap();

    let now = Utc::now() + Duration::milliseconds(300);
    let outcomes = timer.fire_due(&pipeline, now);

    let expected = original + Duration::minutes(1);
    assert_eq!(
        outcomes,
        vec![(NotificationId(1), TriggerOutcome::Rearmed { next: expected })]
    );
    assert_eq!(timer.due_at(NotificationId(1)), Some(expected));
    assert_eq!(
        registry.get(NotificationId(1)).unwrap().requested_at(),
        Some(expected)
    );
    let shown = renderer.visible.lock().unwrap()[&NotificationId(1)].clone();
    assert_eq!(shown.text, "edited");
}

#[test]
fn edit_before_due_time_keeps_pending_trigger() {
    let h = Harness::new();
    let at = Utc.timestamp_opt((Utc::now() + Duration::minutes(10)).timestamp(), 0).unwrap();
    h.registry
        .schedule(props(json!({"id": 4, "at": at.timestamp(), "every": "day"})))
        .unwrap();
    h.registry
        .update(NotificationId(4), props(json!({"text": "edited"})))
        .unwrap()
        .unwrap();

    let outcome = h.pipeline.on_trigger(NotificationId(4), None);

    assert_eq!(outcome, TriggerOutcome::Rearmed { next: at });
    assert_eq!(h.timer.armed_at(4), Some(at));
    assert_eq!(h.registry.get(NotificationId(4)).unwrap().requested_at(), Some(at));
    assert!(h.renderer.is_visible(4));
}

#[test]
fn edited_one_shot_is_displayed_as_update() {
    let h = Harness::new();
    h.registry.schedule(props(json!({"id": 5}))).unwrap();
    h.registry
        .update(NotificationId(5), props(json!({"text": "edited"})))
        .unwrap()
        .unwrap();
    let arms_before = h.timer.schedule_count();

    let outcome = h.pipeline.on_trigger(NotificationId(5), None);

    assert_eq!(outcome, TriggerOutcome::Displayed { updated: true });
    assert_eq!(h.timer.schedule_count(), arms_before);
}

#[test]
fn displayed_artifact_matches_options() {
    let h = Harness::new();
    h.registry
        .schedule(props(json!({
            "id": 10, "text": "body", "badge": 3, "led": "FF8800",
            "ongoing": true, "icon": "bell", "data": {"k": "v"}
        })))
        .unwrap();
    h.pipeline.on_trigger(NotificationId(10), None);

    let a = h.renderer.visible.lock().unwrap()[&NotificationId(10)].clone();
    assert_eq!(a.title, "Test App");
    assert_eq!(a.text, "body");
    assert_eq!(a.badge, 3);
    assert_eq!(a.led_argb, 0xFFFF_8800);
    assert!(a.ongoing);
    assert_eq!(a.icon, "file:///res/bell.png");
    assert_eq!(a.data, json!({"k": "v"}));
    assert_eq!(a.path, BuildPath::Builder);
}

struct Broken;

impl ArtifactBuilder for Broken {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn build(
        &self,
        _record: &OptionRecord,
        _ctx: &beacon_scheduler::builder::BuildContext<'_>,
    ) -> beacon_scheduler::Result<DisplayArtifact> {
        Err(SchedulerError::Build {
            builder: "broken",
            reason: "unsupported".into(),
        })
    }
}

#[test]
fn fire_is_dropped_when_every_builder_fails() {
    let h = Harness::new();
    h.registry
        .schedule(props(json!({"id": 11, "every": "minute"})))
        .unwrap();
    let arms_before = h.timer.schedule_count();

    let factory = InstanceFactory::with_builders(
        "Test App",
        Arc::new(FakeAssets),
        Arc::new(Broken),
        Some(Arc::new(Broken)),
    );
    let pipeline = TriggerPipeline::new(h.registry.clone(), factory);

    let outcome = pipeline.on_trigger(NotificationId(11), None);
    assert_eq!(outcome, TriggerOutcome::Dropped(DropReason::BuildFailed));
    assert_eq!(h.renderer.notify_count(), 0);
    assert_eq!(h.timer.schedule_count(), arms_before);
    assert!(h.registry.exists(NotificationId(11)));
}

#[test]
fn click_clears_only_auto_clear_notifications() {
    let h = Harness::new();
    h.registry.schedule(props(json!({"id": 1, "autoClear": true}))).unwrap();
    h.registry.schedule(props(json!({"id": 2}))).unwrap();
    h.pipeline.on_trigger(NotificationId(1), None);
    h.pipeline.on_trigger(NotificationId(2), None);

    assert!(h.pipeline.on_clicked(NotificationId(1)));
    assert!(!h.pipeline.on_clicked(NotificationId(2)));
    assert!(!h.renderer.is_visible(1));
    assert!(h.renderer.is_visible(2));
    assert!(h.registry.exists(NotificationId(1)), "cleared record stays known");
}

#[test]
fn timer_service_fires_due_wakeups_once_and_keeps_one_per_id() {
    use beacon_scheduler::Timer;

    let timer = TimerService::new();
    let now = Utc::now();
    timer.schedule(NotificationId(1), now - Duration::seconds(1), json!({}));
    timer.schedule(NotificationId(1), now + Duration::hours(1), json!({}));
    timer.schedule(NotificationId(2), now, json!({}));
    assert_eq!(timer.armed_count(), 2, "re-arming replaces, never duplicates");

    let due = timer.take_due(now);
    assert_eq!(due.iter().map(|(id, _)| id.get()).collect::<Vec<_>>(), vec![2]);
    assert!(timer.take_due(now).is_empty());
    assert_eq!(timer.due_at(NotificationId(1)), Some(now + Duration::hours(1)));

    timer.cancel(NotificationId(1));
    assert_eq!(timer.armed_count(), 0);
}

#[tokio::test]
async fn ui_renderer_marshals_then_falls_back() {
    let target = Arc::new(RecordingRenderer::default());
    let (ui, ui_loop) = UiRenderer::new(target.clone());
    let handle = tokio::spawn(ui_loop.run());

    let h = Harness::new();
    h.registry.schedule(props(json!({"id": 1}))).unwrap();
    let record = h.registry.get(NotificationId(1)).unwrap();
    let factory = InstanceFactory::with_builders(
        "App",
        Arc::new(FakeAssets),
        Arc::new(beacon_scheduler::ModernBuilder),
        None,
    );
    let artifact = factory.assemble(record, Utc::now()).unwrap().artifact().clone();

    ui.notify(NotificationId(1), &artifact);
    ui.cancel(NotificationId(1));
    ui.notify(NotificationId(1), &artifact);
    drop(ui);
    handle.await.unwrap();
    assert_eq!(target.notify_count(), 2);
    assert!(target.is_visible(1));

    // Loop gone: calls still reach the renderer directly.
    let target = Arc::new(RecordingRenderer::default());
    let (ui, ui_loop) = UiRenderer::new(target.clone());
    drop(ui_loop);
    ui.notify(NotificationId(2), &artifact);
    assert!(target.is_visible(2));
}
