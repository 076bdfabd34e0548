//! Config persistence: the preset store and a handful of top-level
//! settings, saved to a single JSON file and loaded back on startup.
//!
//! Saves are atomic — write to a temp file in the same directory, then
//! rename over the target — so a crash or power loss mid-write never
//! leaves a half-written config behind.

use crate::effects::EffectId;
use crate::errors::EngineError;
use crate::params::ParamValues;
use crate::preset::PresetStore;
use crate::state::PowerState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// The single JSON blob persisted to `default_config_path()` (or the
/// `--config` override). Every field is optional on load, so an older or
/// hand-edited file that's missing one simply falls back to
/// `GlobalState`'s own default for it (spec.md §3's "any missing field
/// takes default").
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConfigBlob {
    pub current_effect: Option<EffectId>,
    #[serde(default)]
    pub parameters_by_effect: HashMap<EffectId, ParamValues>,
    pub brightness: Option<f64>,
    pub power_state: Option<PowerState>,
    pub active_preset_id: Option<u64>,
    #[serde(default)]
    pub presets: PresetStore,
}

/// Default location for the config file: `$HOME/.config/led-scales/config.json`,
/// resolved via `dirs` so it works the same on the Pi and on a developer's
/// own machine.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("led-scales")
        .join("config.json")
}

pub fn load(path: &Path) -> Result<ConfigBlob, EngineError> {
    if !path.exists() {
        return Ok(ConfigBlob::default());
    }
    let raw = fs::read_to_string(path)?;
    let blob = serde_json::from_str(&raw)?;
    Ok(blob)
}

pub fn save(path: &Path, blob: &ConfigBlob) -> Result<(), EngineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(blob)?;

    let mut tmp_path = path.to_path_buf();
    let tmp_name = format!(
        ".{}.tmp",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("config.json")
    );
    tmp_path.set_file_name(tmp_name);

    fs::write(&tmp_path, raw)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
