//! Resolution of symbolic icon/sound references to concrete URIs.
//!
//! Reference forms understood by [`FsAssetResolver`]:
//!
//! | Reference            | Resolves to                                   |
//! |----------------------|-----------------------------------------------|
//! | `res://name`, `name` | `file://` URI of `<resource_dir>/name.<ext>`  |
//! | `file://rel/path`    | `file://` URI of `<www_dir>/rel/path`         |
//! | `file:///abs/path`   | unchanged, if the file exists                 |
//! | `http(s)://…`        | unchanged (fetched by the renderer, if at all)|
//!
//! Anything that does not resolve is an [`AssetError`]; callers fall back to
//! the configured defaults.

use std::path::{Path, PathBuf};

use beacon_core::config::AssetsConfig;
use thiserror::Error;
use tracing::debug;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];
const SOUND_EXTENSIONS: &[&str] = &["ogg", "mp3", "wav", "m4a"];
/// Sound reference meaning "whatever the platform plays by default".
pub const PLATFORM_DEFAULT_SOUND: &str = "res://platform_default";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("empty asset reference")]
    Empty,

    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("unsupported asset scheme: {0}")]
    UnsupportedScheme(String),
}

/// Resolves symbolic asset references for option normalization and display.
pub trait AssetResolver: Send + Sync {
    /// Resolve a large-icon reference to a URI.
    fn resolve_icon(&self, reference: &str) -> Result<String, AssetError>;

    /// Resolve a sound reference. `None` asks for the platform default.
    fn resolve_sound(&self, reference: Option<&str>) -> Result<String, AssetError>;

    /// Resolve a small (status bar) icon. Same rules as large icons.
    fn resolve_small_icon(&self, reference: &str) -> Result<String, AssetError> {
        self.resolve_icon(reference)
    }

    /// Built-in icon used whenever resolution fails.
    fn default_icon(&self) -> String;

    /// Built-in sound used whenever resolution fails.
    fn default_sound(&self) -> String;
}

/// Resolver backed by a resource directory and a web bundle directory.
pub struct FsAssetResolver {
    resource_dir: PathBuf,
    www_dir: PathBuf,
    default_icon: String,
    default_sound: String,
}

impl FsAssetResolver {
    pub fn new(config: &AssetsConfig) -> Self {
        Self {
            resource_dir: PathBuf::from(&config.resource_dir),
            www_dir: PathBuf::from(&config.www_dir),
            default_icon: config.default_icon.clone(),
            default_sound: config.default_sound.clone(),
        }
    }

    fn resolve(&self, reference: &str, extensions: &[&str]) -> Result<String, AssetError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(AssetError::Empty);
        }

        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Ok(reference.to_string());
        }

        if let Some(abs) = reference.strip_prefix("file:///") {
            let path = Path::new("/").join(abs);
            return existing_file_uri(&path).ok_or_else(|| AssetError::NotFound(reference.into()));
        }

        if let Some(rel) = reference.strip_prefix("file://") {
            let path = self.www_dir.join(rel.trim_start_matches('/'));
            return existing_file_uri(&path).ok_or_else(|| AssetError::NotFound(reference.into()));
        }

        let name = match reference.strip_prefix("res://") {
            Some(name) => name,
            None if reference.contains("://") => {
                return Err(AssetError::UnsupportedScheme(reference.to_string()))
            }
            None => reference,
        };
        self.find_resource(name, extensions)
            .ok_or_else(|| AssetError::NotFound(reference.to_string()))
    }

    /// Look up `name` in the resource directory, with or without extension.
    fn find_resource(&self, name: &str, extensions: &[&str]) -> Option<String> {
        if name.is_empty() || name.contains("..") {
            return None;
        }
        let direct = self.resource_dir.join(name);
        if direct.extension().is_some() {
            if let Some(uri) = existing_file_uri(&direct) {
                return Some(uri);
            }
        }
        extensions
            .iter()
            .map(|ext| self.resource_dir.join(format!("{name}.{ext}")))
            .find_map(|p| existing_file_uri(&p))
    }
}

impl AssetResolver for FsAssetResolver {
    fn resolve_icon(&self, reference: &str) -> Result<String, AssetError> {
        let uri = self.resolve(reference, IMAGE_EXTENSIONS)?;
        debug!(%reference, %uri, "icon resolved");
        Ok(uri)
    }

    fn resolve_sound(&self, reference: Option<&str>) -> Result<String, AssetError> {
        match reference.map(str::trim) {
            None | Some("") => Ok(self.default_sound.clone()),
            Some(r) if r == PLATFORM_DEFAULT_SOUND => Ok(self.default_sound.clone()),
            Some(r) => self.resolve(r, SOUND_EXTENSIONS),
        }
    }

    fn default_icon(&self) -> String {
        self.default_icon.clone()
    }

    fn default_sound(&self) -> String {
        self.default_sound.clone()
    }
}

fn existing_file_uri(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    let abs = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    Some(format!("file://{}", abs.display()))
}
