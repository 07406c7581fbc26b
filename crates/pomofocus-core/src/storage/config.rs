//! TOML-based user settings.
//!
//! Stores interval durations (minutes) and the engine policy flags.
//! The file lives at `~/.config/pomofocus/config.toml`; missing keys fall
//! back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::{clamp_minutes, IntervalMode, ModeCatalog};

/// Interval durations in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationsConfig {
    #[serde(default = "default_work")]
    pub work: u32,
    #[serde(default = "default_short_break")]
    pub short_break: u32,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
}

/// Behaviour flags the engine and notifiers consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Move to the complementary mode after an interval completes.
    #[serde(default = "default_true")]
    pub auto_switch: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub animations_enabled: bool,
}

/// User settings, serialized to/from TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(flatten)]
    pub policy: Policy,
    #[serde(default)]
    pub durations: DurationsConfig,
}

fn default_work() -> u32 {
    IntervalMode::Work.default_minutes()
}
fn default_short_break() -> u32 {
    IntervalMode::ShortBreak.default_minutes()
}
fn default_long_break() -> u32 {
    IntervalMode::LongBreak.default_minutes()
}
fn default_true() -> bool {
    true
}

impl Default for DurationsConfig {
    fn default() -> Self {
        Self {
            work: default_work(),
            short_break: default_short_break(),
            long_break: default_long_break(),
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            auto_switch: true,
            sound_enabled: true,
            animations_enabled: true,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            durations: DurationsConfig::default(),
        }
    }
}

impl Settings {
    /// Durations as a clamped catalog.
    pub fn catalog(&self) -> ModeCatalog {
        ModeCatalog::from_minutes(
            self.durations.work,
            self.durations.short_break,
            self.durations.long_break,
        )
    }

    /// Snapshot of the given catalog and policy.
    pub fn from_parts(catalog: &ModeCatalog, policy: Policy) -> Self {
        Self {
            policy,
            durations: DurationsConfig {
                work: catalog.minutes(IntervalMode::Work),
                short_break: catalog.minutes(IntervalMode::ShortBreak),
                long_break: catalog.minutes(IntervalMode::LongBreak),
            },
        }
    }

    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => {
                        let b = parse_bool(value)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as bool")))?;
                        serde_json::Value::Bool(b)
                    }
                    serde_json::Value::Number(_) => {
                        let n: i64 = value
                            .trim()
                            .parse()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(clamp_minutes(n).into())
                    }
                    _ => return Err(unknown()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Get a setting as string by dot-separated key (`durations.work`, `auto_switch`).
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a setting by key. Durations are clamped to 1..=120 minutes.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// as the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(*self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(())
    }

    /// All settable keys with their current values, in file order.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        let Ok(json) = serde_json::to_value(self) else {
            return out;
        };
        collect_leaves(&json, String::new(), &mut out);
        out
    }
}

fn collect_leaves(value: &serde_json::Value, prefix: String, out: &mut Vec<(String, String)>) {
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                collect_leaves(v, key, out);
            }
        }
        other => out.push((prefix, other.to_string())),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Where settings are persisted. The engine only ever sees `load`/`save`.
pub trait SettingsStore: Send {
    fn load(&self) -> Result<Settings, ConfigError>;
    fn save(&self, settings: &Settings) -> Result<(), ConfigError>;

    /// Load, falling back to defaults (and logging) on any failure.
    fn load_or_default(&self) -> Settings {
        self.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "settings unavailable, using defaults");
            Settings::default()
        })
    }

    /// Save, logging and swallowing any failure.
    fn save_or_log(&self, settings: &Settings) {
        if let Err(e) = self.save(settings) {
            tracing::warn!(error = %e, "failed to persist settings");
        }
    }
}

/// Settings file on disk.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data_dir>/config.toml`.
    pub fn open_default() -> Result<Self, ConfigError> {
        Ok(Self::new(data_dir()?.join("config.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    /// A missing file yields defaults; an unreadable or malformed one is an error.
    fn load(&self) -> Result<Settings, ConfigError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: self.path.clone(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(ConfigError::LoadFailed {
                path: self.path.clone(),
                message: e.to_string(),
            }),
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: self.path.clone(),
            message,
        };
        let content = toml::to_string_pretty(settings).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(&self.path, content).map_err(|e| save_failed(e.to_string()))
    }
}

/// In-memory store; clones share the saved value.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    saved: std::sync::Arc<std::sync::Mutex<Option<Settings>>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(settings: Settings) -> Self {
        let store = Self::default();
        *store.saved.lock().unwrap_or_else(|e| e.into_inner()) = Some(settings);
        store
    }

    pub fn saved(&self) -> Option<Settings> {
        *self.saved.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings, ConfigError> {
        Ok(self.saved().unwrap_or_default())
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = Some(*settings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_roundtrip() {
        let cfg = Settings::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn missing_keys_use_defaults() {
        let parsed: Settings = toml::from_str("auto_switch = false\n[durations]\nwork = 25\n").unwrap();
        assert!(!parsed.policy.auto_switch);
        assert!(parsed.policy.sound_enabled);
        assert_eq!(parsed.durations.work, 25);
        assert_eq!(parsed.durations.short_break, 15);
        assert_eq!(parsed.durations.long_break, 30);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Settings::default();
        assert_eq!(cfg.get("durations.work").as_deref(), Some("45"));
        assert_eq!(cfg.get("auto_switch").as_deref(), Some("true"));
        assert!(cfg.get("durations").is_none());
        assert!(cfg.get("durations.nap").is_none());
    }

    #[test]
    fn set_updates_bool_and_number() {
        let mut cfg = Settings::default();
        cfg.set("sound_enabled", "off").unwrap();
        cfg.set("durations.short_break", "10").unwrap();
        assert!(!cfg.policy.sound_enabled);
        assert_eq!(cfg.durations.short_break, 10);
    }

    #[test]
    fn set_clamps_durations() {
        let mut cfg = Settings::default();
        cfg.set("durations.work", "0").unwrap();
        assert_eq!(cfg.durations.work, 1);
        cfg.set("durations.long_break", "999").unwrap();
        assert_eq!(cfg.durations.long_break, 120);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Settings::default();
        assert!(matches!(cfg.set("durations.nap", "5"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(cfg.set("", "5"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(
            cfg.set("auto_switch", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg, Settings::default());
    }

    #[test]
    fn catalog_clamps_hand_edited_values() {
        let mut cfg = Settings::default();
        cfg.durations.work = 0;
        assert_eq!(cfg.catalog().duration(IntervalMode::Work), 60);
    }

    #[test]
    fn entries_lists_every_leaf() {
        let keys: Vec<String> = Settings::default().entries().into_iter().map(|(k, _)| k).collect();
        for key in ["auto_switch", "sound_enabled", "animations_enabled", "durations.work"] {
            assert!(keys.iter().any(|k| k == key), "missing {key}");
        }
    }

    #[test]
    fn toml_store_saves_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlSettingsStore::new(dir.path().join("nested").join("config.toml"));
        assert_eq!(store.load().unwrap(), Settings::default());

        let mut cfg = Settings::default();
        cfg.policy.auto_switch = false;
        cfg.durations.work = 25;
        store.save(&cfg).unwrap();
        assert_eq!(store.load().unwrap(), cfg);
    }

    #[test]
    fn toml_store_reports_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "durations = 3").unwrap();
        let store = TomlSettingsStore::new(&path);
        assert!(matches!(store.load(), Err(ConfigError::LoadFailed { .. })));
        assert_eq!(store.load_or_default(), Settings::default());
    }

    #[test]
    fn memory_store_shares_between_clones() {
        let store = MemorySettingsStore::new();
        let other = store.clone();
        let mut cfg = Settings::default();
        cfg.durations.long_break = 20;
        store.save(&cfg).unwrap();
        assert_eq!(other.load().unwrap().durations.long_break, 20);
    }
}
