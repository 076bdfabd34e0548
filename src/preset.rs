//! Presets: named, saved snapshots of an effect + its parameters + brightness,
//! that can be recalled later in one call.

use crate::effects::EffectId;
use crate::params::ParamValues;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Preset {
    pub id: u64,
    pub name: String,
    #[serde(rename = "effect_class")]
    pub effect: EffectId,
    pub brightness: f64,
    #[schema(value_type = Object)]
    pub parameters: ParamValues,
}

/// Id-keyed preset store. A plain `HashMap` — presets are looked up and
/// listed, never iterated in a stable order that matters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PresetStore(pub HashMap<u64, Preset>);

impl PresetStore {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn list(&self) -> Vec<&Preset> {
        let mut presets: Vec<&Preset> = self.0.values().collect();
        presets.sort_by_key(|p| p.id);
        presets
    }

    pub fn get(&self, id: u64) -> Option<&Preset> {
        self.0.get(&id)
    }

    pub fn remove(&mut self, id: u64) -> Option<Preset> {
        self.0.remove(&id)
    }

    /// Insert a new preset, generating an id from the current Unix time in
    /// milliseconds. Collisions (two presets saved in the same millisecond)
    /// are vanishingly rare but handled by probing upward one millisecond
    /// at a time.
    pub fn insert_new(&mut self, name: String, effect: EffectId, brightness: f64, parameters: ParamValues) -> Preset {
        let mut id = now_ms();
        while self.0.contains_key(&id) {
            id += 1;
        }
        let preset = Preset {
            id,
            name,
            effect,
            brightness,
            parameters,
        };
        self.0.insert(id, preset.clone());
        preset
    }

    /// `POST /presets` semantics: with an explicit `id` that already names a
    /// preset, overwrite it in place (the store's length is unchanged); with
    /// an `id` that doesn't exist yet, create it under that id; with no
    /// `id` at all, generate a fresh one exactly like `insert_new`.
    pub fn upsert(
        &mut self,
        id: Option<u64>,
        name: String,
        effect: EffectId,
        brightness: f64,
        parameters: ParamValues,
    ) -> Preset {
        let id = match id {
            Some(id) => id,
            None => {
                let mut candidate = now_ms();
                while self.0.contains_key(&candidate) {
                    candidate += 1;
                }
                candidate
            }
        };
        let preset = Preset {
            id,
            name,
            effect,
            brightness,
            parameters,
        };
        self.0.insert(id, preset.clone());
        preset
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_millis() as u64
}
