//! The canonical notification configuration.
//!
//! An [`OptionRecord`] wraps the caller's property mapping as-is and reads
//! every field through a lenient accessor with an explicit default, so a
//! record can always be built from whatever a caller (or an old store entry)
//! provides. Keys this layer does not interpret are carried along untouched.

use beacon_core::config::UPDATE_WINDOW_MS;
use beacon_core::NotificationId;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::assets::AssetResolver;
use crate::error::{Result, SchedulerError};
use crate::repeat::Repeat;

// Option keys are part of the persisted format; do not rename.
pub const KEY_ID: &str = "id";
pub const KEY_TITLE: &str = "title";
pub const KEY_TEXT: &str = "text";
pub const KEY_AT: &str = "at";
pub const KEY_BADGE: &str = "badge";
pub const KEY_ONGOING: &str = "ongoing";
pub const KEY_AUTO_CLEAR: &str = "autoClear";
pub const KEY_LED: &str = "led";
pub const KEY_ICON: &str = "icon";
pub const KEY_SMALL_ICON: &str = "smallIcon";
pub const KEY_SOUND: &str = "sound";
pub const KEY_ICON_URI: &str = "iconUri";
pub const KEY_SOUND_URI: &str = "soundUri";
pub const KEY_EVERY: &str = "every";
pub const KEY_UPDATED_AT: &str = "updatedAt";
pub const KEY_ACTIONS: &str = "actions";
pub const KEY_DATA: &str = "data";

const DEFAULT_ICON_REF: &str = "icon";
const DEFAULT_LED: &str = "000000";
const ALPHA_OPAQUE: u32 = 0xFF00_0000;

/// A button shown with the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub id: String,
    pub title: String,
}

/// Canonical configuration of one notification.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionRecord {
    props: Map<String, Value>,
}

impl OptionRecord {
    /// Wrap a property mapping without touching it.
    pub fn from_map(props: Map<String, Value>) -> Self {
        Self { props }
    }

    /// Wrap a mapping and run asset normalization on it.
    pub fn parse(props: Map<String, Value>, assets: &dyn AssetResolver) -> Self {
        let mut record = Self::from_map(props);
        record.normalize(assets);
        record
    }

    /// Accept any JSON value that is an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(props) => Ok(Self::from_map(props)),
            other => Err(SchedulerError::InvalidOptions(format!(
                "expected an object, got {}",
                type_name(&other)
            ))),
        }
    }

    pub fn props(&self) -> &Map<String, Value> {
        &self.props
    }

    pub fn into_props(self) -> Map<String, Value> {
        self.props
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.props.clone())
    }

    // --- normalization ----------------------------------------------------

    /// Whether asset references have already been resolved into this record.
    pub fn is_normalized(&self) -> bool {
        self.props.contains_key(KEY_ICON_URI)
    }

    /// Resolve icon and sound references once and cache the URIs.
    ///
    /// No-op when `iconUri` is already present. Failures fall back to the
    /// resolver's defaults.
    pub fn normalize(&mut self, assets: &dyn AssetResolver) {
        if self.is_normalized() {
            return;
        }

        let icon_ref = self.icon();
        let icon_uri = assets.resolve_icon(&icon_ref).unwrap_or_else(|e| {
            debug!(id = %self.id(), icon = %icon_ref, error = %e, "icon falls back to default");
            assets.default_icon()
        });

        let sound_ref = self.sound();
        let sound_uri = assets.resolve_sound(sound_ref.as_deref()).unwrap_or_else(|e| {
            debug!(id = %self.id(), sound = ?sound_ref, error = %e, "sound falls back to default");
            assets.default_sound()
        });

        self.props.insert(KEY_ICON_URI.into(), icon_uri.into());
        self.props.insert(KEY_SOUND_URI.into(), sound_uri.into());
    }

    /// Forget resolved URIs so the next [`normalize`](Self::normalize) runs again.
    pub fn reset_normalization(&mut self) {
        self.props.remove(KEY_ICON_URI);
        self.props.remove(KEY_SOUND_URI);
    }

    // --- mutation ---------------------------------------------------------

    /// Overlay `updates` onto this record, key by key.
    ///
    /// If an update touches an asset reference, the cached URIs are dropped
    /// so they get resolved again.
    pub fn merge(&mut self, updates: Map<String, Value>) {
        let touches_assets = [KEY_ICON, KEY_SOUND, KEY_ICON_URI, KEY_SOUND_URI]
            .iter()
            .any(|k| updates.contains_key(*k));
        if touches_assets
            && !(updates.contains_key(KEY_ICON_URI) && updates.contains_key(KEY_SOUND_URI))
        {
            self.reset_normalization();
        }
        for (key, value) in updates {
            self.props.insert(key, value);
        }
    }

    pub fn stamp_updated(&mut self, now: DateTime<Utc>) {
        self.props
            .insert(KEY_UPDATED_AT.into(), Value::from(now.timestamp_millis()));
    }

    /// Persist the effective trigger so it no longer drifts with `now`.
    pub fn pin_trigger(&mut self, now: DateTime<Utc>) {
        let at = self.trigger_at(now);
        self.set_trigger(at);
    }

    pub fn set_trigger(&mut self, at: DateTime<Utc>) {
        self.props.insert(KEY_AT.into(), Value::from(at.timestamp()));
    }

    // --- accessors --------------------------------------------------------

    pub fn id(&self) -> NotificationId {
        let id = self
            .opt_i64(KEY_ID)
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or(0);
        NotificationId(id)
    }

    /// Title, or `app_name` when the record carries none.
    pub fn title(&self, app_name: &str) -> String {
        match self.opt_str(KEY_TITLE) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => app_name.to_string(),
        }
    }

    pub fn text(&self) -> String {
        self.opt_str(KEY_TEXT).unwrap_or_default().to_string()
    }

    /// Requested trigger as stored (`at`, epoch seconds), if any.
    pub fn requested_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.opt_i64(KEY_AT)?;
        Utc.timestamp_opt(secs, 0).single()
    }

    /// Effective trigger: the requested moment, but never before `now`.
    pub fn trigger_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.requested_at() {
            Some(at) if at > now => at,
            _ => now,
        }
    }

    pub fn badge(&self) -> u32 {
        self.opt_i64(KEY_BADGE)
            .map(|b| u32::try_from(b.max(0)).unwrap_or(u32::MAX))
            .unwrap_or(0)
    }

    pub fn ongoing(&self) -> bool {
        self.opt_bool(KEY_ONGOING).unwrap_or(false)
    }

    pub fn auto_clear(&self) -> bool {
        self.opt_bool(KEY_AUTO_CLEAR).unwrap_or(false)
    }

    /// LED color as ARGB with the alpha channel forced opaque.
    pub fn led_color(&self) -> u32 {
        let hex = self.opt_str(KEY_LED).unwrap_or(DEFAULT_LED);
        led_color(hex)
    }

    pub fn icon(&self) -> String {
        match self.opt_str(KEY_ICON) {
            Some(i) if !i.is_empty() => i.to_string(),
            _ => DEFAULT_ICON_REF.to_string(),
        }
    }

    pub fn small_icon(&self) -> String {
        self.opt_str(KEY_SMALL_ICON).unwrap_or_default().to_string()
    }

    /// Sound reference; `None` means "platform default".
    pub fn sound(&self) -> Option<String> {
        self.opt_str(KEY_SOUND)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn icon_uri(&self) -> Option<&str> {
        self.opt_str(KEY_ICON_URI)
    }

    pub fn sound_uri(&self) -> Option<&str> {
        self.opt_str(KEY_SOUND_URI)
    }

    pub fn repeat(&self) -> Option<Repeat> {
        self.props.get(KEY_EVERY).and_then(Repeat::from_value)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        let ms = self.opt_i64(KEY_UPDATED_AT)?;
        Utc.timestamp_millis_opt(ms).single()
    }

    /// True when this record was edited within the last second.
    ///
    /// Lets a fire caused by an edit be told apart from the originally
    /// scheduled fire.
    pub fn is_update(&self, now: DateTime<Utc>) -> bool {
        match self.updated_at() {
            Some(at) => {
                let age = (now - at).num_milliseconds();
                (0..UPDATE_WINDOW_MS).contains(&age)
            }
            None => false,
        }
    }

    /// Action buttons; malformed entries are skipped.
    pub fn actions(&self) -> Vec<NotificationAction> {
        let Some(Value::Array(items)) = self.props.get(KEY_ACTIONS) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(action) => Some(action),
                Err(e) => {
                    warn!(id = %self.id(), error = %e, "skipping malformed action");
                    None
                }
            })
            .collect()
    }

    /// Opaque caller payload (`data`), `Null` when absent.
    pub fn data(&self) -> Value {
        self.props.get(KEY_DATA).cloned().unwrap_or(Value::Null)
    }

    // --- lenient readers --------------------------------------------------

    fn opt_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    fn opt_i64(&self, key: &str) -> Option<i64> {
        match self.props.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
            }
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    fn opt_bool(&self, key: &str) -> Option<bool> {
        match self.props.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            _ => None,
        }
    }
}

/// Parse a 6-hex-digit RGB string into opaque ARGB.
///
/// A leading `#` is accepted. Unparsable input yields opaque black.
pub fn led_color(hex: &str) -> u32 {
    let hex = hex.trim().trim_start_matches('#');
    let rgb = u32::from_str_radix(hex, 16).unwrap_or_else(|_| {
        warn!(led = %hex, "invalid LED color; using black");
        0
    });
    ALPHA_OPAQUE | (rgb & 0x00FF_FFFF)
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetError;
    use chrono::Duration;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAssets {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingAssets {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl AssetResolver for CountingAssets {
        fn resolve_icon(&self, reference: &str) -> std::result::Result<String, AssetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AssetError::NotFound(reference.to_string()))
            } else {
                Ok(format!("file:///res/{reference}.png"))
            }
        }

        fn resolve_sound(&self, reference: Option<&str>) -> std::result::Result<String, AssetError> {
            match (self.fail, reference) {
                (true, _) => Err(AssetError::Empty),
                (false, Some(r)) => Ok(format!("file:///res/{r}.ogg")),
                (false, None) => Ok(self.default_sound()),
            }
        }

        fn default_icon(&self) -> String {
            "res://icon".to_string()
        }

        fn default_sound(&self) -> String {
            "res://platform_default".to_string()
        }
    }

    fn record(v: Value) -> OptionRecord {
        OptionRecord::from_value(v).unwrap()
    }

    #[test]
    fn defaults_for_an_empty_mapping() {
        let r = record(json!({}));
        assert_eq!(r.id(), NotificationId(0));
        assert_eq!(r.title("My App"), "My App");
        assert_eq!(r.text(), "");
        assert_eq!(r.badge(), 0);
        assert!(!r.ongoing());
        assert!(!r.auto_clear());
        assert_eq!(r.led_color(), 0xFF00_0000);
        assert_eq!(r.icon(), "icon");
        assert_eq!(r.sound(), None);
        assert_eq!(r.repeat(), None);
        assert!(r.actions().is_empty());
    }

    #[test]
    fn lenient_coercion() {
        let r = record(json!({
            "id": "12", "badge": "3", "ongoing": "true", "autoClear": 1, "at": 1.9e9
        }));
        assert_eq!(r.id(), NotificationId(12));
        assert_eq!(r.badge(), 3);
        assert!(r.ongoing());
        assert!(r.auto_clear());
        assert_eq!(r.requested_at().unwrap().timestamp(), 1_900_000_000);

        let r = record(json!({ "id": 99_999_999_999i64, "badge": -4 }));
        assert_eq!(r.id(), NotificationId(0));
        assert_eq!(r.badge(), 0);
    }

    #[test]
    fn led_color_forces_full_alpha() {
        assert_eq!(led_color("FF8800"), 0xFFFF_8800);
        assert_eq!(led_color("000000"), 0xFF00_0000);
        assert_eq!(led_color("#00ff00"), 0xFF00_FF00);
        assert_eq!(led_color("zzz"), 0xFF00_0000);
        assert_eq!(record(json!({"led": "FF8800"})).led_color(), 0xFFFF_8800);
    }

    #[test]
    fn trigger_never_precedes_now() {
        let now = Utc::now();
        let past = record(json!({ "at": (now - Duration::hours(1)).timestamp() }));
        assert_eq!(past.trigger_at(now), now);

        let missing = record(json!({}));
        assert_eq!(missing.trigger_at(now), now);

        let future_secs = (now + Duration::hours(1)).timestamp();
        let future = record(json!({ "at": future_secs }));
        assert_eq!(future.trigger_at(now).timestamp(), future_secs);
        assert!(future.trigger_at(now) >= now);
    }

    #[test]
    fn normalization_runs_once() {
        let assets = CountingAssets::new(false);
        let mut r = OptionRecord::parse(
            record(json!({"icon": "bell", "sound": "chime"})).into_props(),
            &assets,
        );
        assert_eq!(r.icon_uri(), Some("file:///res/bell.png"));
        assert_eq!(r.sound_uri(), Some("file:///res/chime.ogg"));

        r.normalize(&assets);
        let reloaded = OptionRecord::parse(r.clone().into_props(), &assets);
        assert_eq!(assets.calls.load(Ordering::SeqCst), 1);
        assert_eq!(reloaded, r);
    }

    #[test]
    fn resolution_failure_falls_back_to_defaults() {
        let assets = CountingAssets::new(true);
        let r = OptionRecord::parse(record(json!({"icon": "nope"})).into_props(), &assets);
        assert_eq!(r.icon_uri(), Some("res://icon"));
        assert_eq!(r.sound_uri(), Some("res://platform_default"));
    }

    #[test]
    fn merge_overlays_and_invalidates_assets_on_change() {
        let assets = CountingAssets::new(false);
        let mut r = OptionRecord::parse(
            record(json!({"id": 1, "title": "a", "icon": "bell", "custom": 7})).into_props(),
            &assets,
        );
        r.merge(record(json!({"title": "b"})).into_props());
        assert_eq!(r.title(""), "b");
        assert!(r.is_normalized(), "unrelated edit keeps cached URIs");
        assert_eq!(r.props().get("custom"), Some(&json!(7)));

        r.merge(record(json!({"icon": "star"})).into_props());
        assert!(!r.is_normalized());
        r.normalize(&assets);
        assert_eq!(r.icon_uri(), Some("file:///res/star.png"));
    }

    #[test]
    fn is_update_only_within_the_window() {
        let now = Utc::now();
        let mut r = record(json!({}));
        assert!(!r.is_update(now));

        r.stamp_updated(now - Duration::milliseconds(200));
        assert!(r.is_update(now));

        r.stamp_updated(now - Duration::milliseconds(1500));
        assert!(!r.is_update(now));
    }

    #[test]
    fn json_roundtrip_keeps_display_fields() {
        let assets = CountingAssets::new(false);
        let original = OptionRecord::parse(
            record(json!({
                "id": 4, "title": "T", "text": "body", "badge": 2, "led": "FF8800",
                "ongoing": true, "autoClear": true, "icon": "bell", "sound": "chime",
                "every": "day"
            }))
            .into_props(),
            &assets,
        );
        let text = serde_json::to_string(&original).unwrap();
        let back: OptionRecord = serde_json::from_str(&text).unwrap();

        assert_eq!(back.title("x"), original.title("x"));
        assert_eq!(back.text(), original.text());
        assert_eq!(back.icon_uri(), original.icon_uri());
        assert_eq!(back.sound_uri(), original.sound_uri());
        assert_eq!(back.badge(), 2);
        assert_eq!(back.led_color(), 0xFFFF_8800);
        assert!(back.ongoing() && back.auto_clear());
        assert_eq!(back.repeat(), Some(Repeat::Day));
    }

    #[test]
    fn actions_skip_malformed_entries() {
        let r = record(json!({
            "actions": [{"id": "ok", "title": "OK"}, {"title": "missing id"}, 3]
        }));
        assert_eq!(
            r.actions(),
            vec![NotificationAction { id: "ok".into(), title: "OK".into() }]
        );
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(OptionRecord::from_value(json!([1, 2])).is_err());
        assert!(OptionRecord::from_value(json!("x")).is_err());
    }
}
