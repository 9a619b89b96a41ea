mod document;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::{HotkeyRegistry, MacroConfig, Settings};

pub use document::{LenientInt, MacroDocument, PositionRecord, SettingsDocument};

pub const CONFIG_DIR_ENV: &str = "RENDA_CONFIG_DIR";
pub const SETTINGS_FILE: &str = "settings.json";
const JSON_EXTENSION: &str = "json";

/// `$RENDA_CONFIG_DIR`, or `~/.config/renda`.
pub fn config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("renda"))
}

/// True for a plain file name such as `work` or `work.json`.
pub fn is_bare_name(name: &str) -> bool {
    let path = Path::new(name);
    !path.is_absolute() && path.components().count() == 1 && !name.contains('/')
}

/// Macro and settings documents under one config directory.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(config_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    /// Bare names land in the config directory with `.json` added when they
    /// have no extension. Anything else is used as given.
    pub fn resolve(&self, name: &str) -> PathBuf {
        if !is_bare_name(name) {
            return PathBuf::from(name);
        }
        let mut path = self.dir.join(name);
        if path.extension().is_none() {
            path.set_extension(JSON_EXTENSION);
        }
        path
    }

    pub fn save_macro(&self, path: &Path, config: &MacroConfig) -> Result<()> {
        write_json(path, &MacroDocument::from_config(config))?;
        tracing::info!(
            "Saved {} positions to {}",
            config.positions.len(),
            path.display()
        );
        Ok(())
    }

    /// Returns `None` when `path` does not exist.
    pub fn load_macro(
        &self,
        path: &Path,
        current: &HotkeyRegistry,
    ) -> Result<Option<MacroConfig>> {
        let Some(doc) = read_json::<MacroDocument>(path)? else {
            tracing::warn!("Macro file not found: {}", path.display());
            return Ok(None);
        };
        let config = doc.into_config(current);
        tracing::info!(
            "Loaded {} positions from {}",
            config.positions.len(),
            path.display()
        );
        Ok(Some(config))
    }

    /// A missing settings file means default settings.
    pub fn load_settings(&self) -> Result<Settings> {
        Ok(read_json::<SettingsDocument>(&self.settings_path())?
            .map(SettingsDocument::into_settings)
            .unwrap_or_default())
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        write_json(
            &self.settings_path(),
            &SettingsDocument::from_settings(settings),
        )
    }

    /// Names of the macro documents in the config directory, sorted.
    pub fn list_configs(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.dir.display()))
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext == JSON_EXTENSION))
            .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
            .filter(|name| name != SETTINGS_FILE)
            .collect();
        names.sort();
        Ok(names)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    let value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(value))
}

/// Writes to a temporary file next to `path`, then renames it into place.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(json.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
