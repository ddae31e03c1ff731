//! Display artifact assembly.
//!
//! Two strategies sit behind [`ArtifactBuilder`]: the builder path for
//! current platforms and the legacy path for old ones. [`InstanceFactory`]
//! picks them once from the platform capability and falls back from the
//! builder path to the legacy path when the former fails.

use std::sync::Arc;

use beacon_core::config::{PlatformConfig, MODERN_BUILDER_MIN_API};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::assets::AssetResolver;
use crate::error::{Result, SchedulerError};
use crate::instance::{BuildPath, DisplayArtifact, NotificationInstance};
use crate::options::OptionRecord;

/// Inputs shared by every build.
pub struct BuildContext<'a> {
    pub app_name: &'a str,
    pub assets: &'a dyn AssetResolver,
    pub now: DateTime<Utc>,
}

pub trait ArtifactBuilder: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    fn build(&self, record: &OptionRecord, ctx: &BuildContext<'_>) -> Result<DisplayArtifact>;
}

/// Capability of the display platform, detected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapability {
    pub api_level: u32,
}

impl PlatformCapability {
    pub fn from_config(config: &PlatformConfig) -> Self {
        Self {
            api_level: config.api_level,
        }
    }

    pub fn supports_builder(self) -> bool {
        self.api_level >= MODERN_BUILDER_MIN_API
    }
}

/// Fields common to both paths; differences are limited to how the small
/// icon is obtained.
fn assemble(
    record: &OptionRecord,
    ctx: &BuildContext<'_>,
    small_icon: String,
    path: BuildPath,
) -> DisplayArtifact {
    DisplayArtifact {
        id: record.id(),
        title: record.title(ctx.app_name),
        text: record.text(),
        icon: record
            .icon_uri()
            .map(str::to_string)
            .unwrap_or_else(|| ctx.assets.default_icon()),
        small_icon,
        sound: record
            .sound_uri()
            .map(str::to_string)
            .unwrap_or_else(|| ctx.assets.default_sound()),
        badge: record.badge(),
        led_argb: record.led_color(),
        ongoing: record.ongoing(),
        auto_clear: record.auto_clear(),
        when: record.trigger_at(ctx.now),
        actions: record.actions(),
        data: record.data(),
        path,
    }
}

/// Mutable builder path. The builder API insists on a valid small icon, so
/// an explicit `smallIcon` that cannot be resolved fails the build.
pub struct ModernBuilder;

impl ArtifactBuilder for ModernBuilder {
    fn name(&self) -> &'static str {
        "builder"
    }

    fn build(&self, record: &OptionRecord, ctx: &BuildContext<'_>) -> Result<DisplayArtifact> {
        let reference = record.small_icon();
        let small_icon = if reference.is_empty() {
            ctx.assets.default_icon()
        } else {
            ctx.assets
                .resolve_small_icon(&reference)
                .map_err(|e| SchedulerError::Build {
                    builder: self.name(),
                    reason: format!("small icon: {e}"),
                })?
        };
        Ok(assemble(record, ctx, small_icon, BuildPath::Builder))
    }
}

/// Legacy immutable-notification path. Degrades every asset to its default
/// instead of failing.
pub struct LegacyBuilder;

impl ArtifactBuilder for LegacyBuilder {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn build(&self, record: &OptionRecord, ctx: &BuildContext<'_>) -> Result<DisplayArtifact> {
        let reference = record.small_icon();
        let small_icon = if reference.is_empty() {
            ctx.assets.default_icon()
        } else {
            ctx.assets
                .resolve_small_icon(&reference)
                .unwrap_or_else(|_| ctx.assets.default_icon())
        };
        Ok(assemble(record, ctx, small_icon, BuildPath::Legacy))
    }
}

/// Turns option records into [`NotificationInstance`]s.
pub struct InstanceFactory {
    app_name: String,
    assets: Arc<dyn AssetResolver>,
    primary: Arc<dyn ArtifactBuilder>,
    fallback: Option<Arc<dyn ArtifactBuilder>>,
}

impl InstanceFactory {
    /// Select the strategy for `capability`: builder with legacy fallback on
    /// capable platforms, legacy alone otherwise.
    pub fn for_platform(
        capability: PlatformCapability,
        app_name: impl Into<String>,
        assets: Arc<dyn AssetResolver>,
    ) -> Self {
        let (primary, fallback): (Arc<dyn ArtifactBuilder>, Option<Arc<dyn ArtifactBuilder>>) =
            if capability.supports_builder() {
                (Arc::new(ModernBuilder), Some(Arc::new(LegacyBuilder)))
            } else {
                (Arc::new(LegacyBuilder), None)
            };
        debug!(api_level = capability.api_level, primary = primary.name(), "builder strategy selected");
        Self::with_builders(app_name, assets, primary, fallback)
    }

    pub fn with_builders(
        app_name: impl Into<String>,
        assets: Arc<dyn AssetResolver>,
        primary: Arc<dyn ArtifactBuilder>,
        fallback: Option<Arc<dyn ArtifactBuilder>>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            assets,
            primary,
            fallback,
        }
    }

    /// Normalize `record` (if still needed) and build its display artifact.
    pub fn assemble(&self, mut record: OptionRecord, now: DateTime<Utc>) -> Result<NotificationInstance> {
        record.normalize(self.assets.as_ref());
        let ctx = BuildContext {
            app_name: &self.app_name,
            assets: self.assets.as_ref(),
            now,
        };

        let artifact = match self.primary.build(&record, &ctx) {
            Ok(a) => a,
            Err(e) => {
                let Some(fallback) = &self.fallback else {
                    return Err(e);
                };
                warn!(id = %record.id(), builder = self.primary.name(), error = %e,
                      "primary build failed, using fallback");
                fallback.build(&record, &ctx)?
            }
        };
        Ok(NotificationInstance::new(record, artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetError;
    use serde_json::json;

    struct StaticAssets;

    impl AssetResolver for StaticAssets {
        fn resolve_icon(&self, reference: &str) -> std::result::Result<String, AssetError> {
            if reference == "known" || reference == "icon" {
                Ok(format!("file:///res/{reference}.png"))
            } else {
                Err(AssetError::NotFound(reference.to_string()))
            }
        }
        fn resolve_sound(&self, _: Option<&str>) -> std::result::Result<String, AssetError> {
            Ok(self.default_sound())
        }
        fn default_icon(&self) -> String {
            "res://icon".into()
        }
        fn default_sound(&self) -> String {
            "res://platform_default".into()
        }
    }

    fn factory(api_level: u32) -> InstanceFactory {
        InstanceFactory::for_platform(PlatformCapability { api_level }, "App", Arc::new(StaticAssets))
    }

    fn record(v: serde_json::Value) -> OptionRecord {
        OptionRecord::from_value(v).unwrap()
    }

    #[test]
    fn strategy_follows_capability() {
        let now = Utc::now();
        let r = record(json!({"id": 1, "text": "hi"}));
        let modern = factory(MODERN_BUILDER_MIN_API).assemble(r.clone(), now).unwrap();
        let legacy = factory(MODERN_BUILDER_MIN_API - 1).assemble(r, now).unwrap();

        assert_eq!(modern.artifact().path, BuildPath::Builder);
        assert_eq!(legacy.artifact().path, BuildPath::Legacy);

        // Same visual result either way.
        let mut m = modern.artifact().clone();
        m.path = BuildPath::Legacy;
        assert_eq!(&m, legacy.artifact());
        assert_eq!(m.title, "App");
    }

    #[test]
    fn bad_small_icon_falls_back_to_legacy_with_default() {
        let inst = factory(30)
            .assemble(record(json!({"id": 2, "smallIcon": "ghost"})), Utc::now())
            .unwrap();
        assert_eq!(inst.artifact().path, BuildPath::Legacy);
        assert_eq!(inst.artifact().small_icon, "res://icon");

        let inst = factory(30)
            .assemble(record(json!({"id": 3, "smallIcon": "known"})), Utc::now())
            .unwrap();
        assert_eq!(inst.artifact().path, BuildPath::Builder);
        assert_eq!(inst.artifact().small_icon, "file:///res/known.png");
    }

    #[test]
    fn assemble_normalizes_unnormalized_records() {
        let inst = factory(30).assemble(record(json!({"id": 5})), Utc::now()).unwrap();
        assert_eq!(inst.options().icon_uri(), Some("file:///res/icon.png"));
        assert_eq!(inst.artifact().icon, "file:///res/icon.png");
        assert_eq!(inst.artifact().sound, "res://platform_default");
    }
}
