//! Global engine state: the single source of truth the render loop reads
//! every tick and every HTTP/Socket.IO handler mutates. Everything here
//! lives behind one `Mutex` — state changes are infrequent (human-driven)
//! compared to the render loop's tick rate, so a single lock is simpler
//! than finer-grained synchronization and never shows up as contention.

use crate::effects::EffectId;
use crate::params::ParamValues;
use crate::preset::PresetStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a power on/off transition takes to fade brightness to its
/// target, linearly.
pub const FADE_DURATION: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    On,
    Off,
}

impl Default for PowerState {
    fn default() -> Self {
        PowerState::On
    }
}

/// An in-progress brightness fade, started the moment the power target
/// last changed.
#[derive(Clone, Copy, Debug)]
struct Fade {
    from: f64,
    to: f64,
    started: Instant,
}

/// Everything the render loop needs to produce one frame, plus everything
/// the control surface needs to describe "what's currently happening".
pub struct GlobalState {
    pub effect: EffectId,
    /// Per-effect parameter values, so switching effects and back restores
    /// whatever was last set rather than resetting to defaults.
    params: HashMap<EffectId, ParamValues>,
    pub brightness: f64,
    /// Settles to `target_power_state` only once a fade completes; differs
    /// from it while a fade is in progress (spec.md §3).
    pub power_state: PowerState,
    /// The power state requested by the most recent `set_power` call —
    /// updated immediately, unlike `power_state`.
    pub target_power_state: PowerState,
    fade: Option<Fade>,
    pub active_preset_id: Option<u64>,
    pub presets: PresetStore,
    /// Bumped on every mutation; lets the Socket.IO layer debounce pushing
    /// `state_update` events to once per tick instead of once per field.
    pub generation: u64,
}

impl GlobalState {
    pub fn new() -> Self {
        Self {
            effect: EffectId::default(),
            params: HashMap::new(),
            brightness: 1.0,
            power_state: PowerState::On,
            target_power_state: PowerState::On,
            fade: None,
            active_preset_id: None,
            presets: PresetStore::new(),
            generation: 0,
        }
    }

    /// Raw per-effect parameter overrides, keyed by effect id — the shape
    /// persisted as `parameters_by_effect` in the config blob.
    pub fn params_map(&self) -> HashMap<EffectId, ParamValues> {
        self.params.clone()
    }

    /// Restore the per-effect parameter overrides loaded from the config
    /// blob at startup. Not a live mutation: doesn't bump `generation` or
    /// clear `active_preset_id`.
    pub fn set_params_map(&mut self, params: HashMap<EffectId, ParamValues>) {
        self.params = params;
    }

    /// Materialized (declared-defaults + overrides) parameter values for
    /// any effect, not just the currently active one — used by `GET
    /// /effects` to report "value" fields for every effect's catalog
    /// entry, per spec.md §4.5.
    pub fn materialized_params(&self, effect: EffectId) -> ParamValues {
        let spec = effect.instance().param_spec();
        let overrides = self.params.get(&effect).cloned().unwrap_or_default();
        ParamValues::from_spec_with_overrides(&spec, &overrides)
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn set_effect(&mut self, effect: EffectId) {
        self.effect = effect;
        self.active_preset_id = None;
        self.bump();
    }

    /// Current parameter values for the active effect, materialized from
    /// its declared spec plus whatever has been overlaid on top of it.
    pub fn current_params(&self) -> ParamValues {
        self.materialized_params(self.effect)
    }

    pub fn set_param(&mut self, name: &str, value: crate::params::ParamValue) {
        let entry = self.params.entry(self.effect).or_default();
        entry.0.insert(name.to_string(), value);
        self.active_preset_id = None;
        self.bump();
    }

    pub fn set_brightness(&mut self, brightness: f64) {
        self.brightness = brightness.clamp(0.0, 1.0);
        self.active_preset_id = None;
        self.bump();
    }

    /// Request a power transition. A no-op if already at (or already
    /// fading toward) the requested state. `power_state` itself only
    /// settles to `target` once the fade completes — see `settle_power`.
    pub fn set_power(&mut self, target: PowerState, now: Instant) {
        if self.target_power_state == target && self.fade.is_none() {
            return;
        }
        let current = self.power_multiplier(now);
        self.target_power_state = target;
        let to = match target {
            PowerState::On => 1.0,
            PowerState::Off => 0.0,
        };
        self.fade = Some(Fade {
            from: current,
            to,
            started: now,
        });
        self.bump();
    }

    /// The power-fade multiplier in `[0.0, 1.0]` to apply on top of
    /// `brightness`, linearly interpolated over [`FADE_DURATION`]. A pure
    /// read — doesn't settle `power_state`, see `settle_power`.
    pub fn power_multiplier(&self, now: Instant) -> f64 {
        match self.fade {
            None => {
                if self.power_state == PowerState::On {
                    1.0
                } else {
                    0.0
                }
            }
            Some(fade) => {
                let elapsed = now.saturating_duration_since(fade.started);
                if elapsed >= FADE_DURATION {
                    fade.to
                } else {
                    let t = elapsed.as_secs_f64() / FADE_DURATION.as_secs_f64();
                    fade.from + (fade.to - fade.from) * t
                }
            }
        }
    }

    /// Whether a power fade is still in progress at `now` — the render
    /// loop uses this to decide whether to keep ticking faster than the
    /// idle rate.
    pub fn is_fading(&self, now: Instant) -> bool {
        match self.fade {
            Some(fade) => now.saturating_duration_since(fade.started) < FADE_DURATION,
            None => false,
        }
    }

    /// Called once per render tick: if an in-progress fade has completed by
    /// `now`, settle `power_state` to `target_power_state` and clear the
    /// fade. This is the only place `power_state` itself changes.
    pub fn settle_power(&mut self, now: Instant) {
        if let Some(fade) = self.fade {
            if now.saturating_duration_since(fade.started) >= FADE_DURATION {
                self.power_state = self.target_power_state;
                self.fade = None;
            }
        }
    }

    pub fn save_preset(&mut self, name: String) -> crate::preset::Preset {
        let preset = self
            .presets
            .insert_new(name, self.effect, self.brightness, self.current_params());
        self.active_preset_id = Some(preset.id);
        self.bump();
        preset
    }

    pub fn apply_preset(&mut self, id: u64) -> Option<()> {
        let preset = self.presets.get(id)?.clone();
        self.effect = preset.effect;
        self.brightness = preset.brightness;
        self.params.insert(preset.effect, preset.parameters);
        self.active_preset_id = Some(preset.id);
        self.bump();
        Some(())
    }
}

impl Default for GlobalState {
    fn default() -> Self {
        Self::new()
    }
}

/// Render-loop health, updated every tick and read by `GET /state`'s
/// `render_status` field. Kept separate from `GlobalState` since it's
/// written at tick rate (tens of Hz) while `GlobalState` only changes on
/// user action — merging them would mean every control-surface read
/// contends with the render loop's own lock.
#[derive(Clone, Debug, Default, Serialize, utoipa::ToSchema)]
pub struct RenderStatus {
    pub fps: f64,
    pub consecutive_errors: u32,
    pub fallback_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn fresh_state_defaults_to_single_color_full_brightness_on() {
        let state = GlobalState::new();
        assert_eq!(state.effect, EffectId::SingleColor);
        assert_eq!(state.brightness, 1.0);
        assert_eq!(state.power_state, PowerState::On);
        assert_eq!(state.target_power_state, PowerState::On);
    }

    #[test]
    fn power_multiplier_is_one_when_on_with_no_fade() {
        let state = GlobalState::new();
        assert_eq!(state.power_multiplier(Instant::now()), 1.0);
    }

    #[test]
    fn fade_reaches_target_after_its_duration() {
        let mut state = GlobalState::new();
        let t0 = Instant::now();
        state.set_power(PowerState::Off, t0);
        let after = t0 + FADE_DURATION + Duration::from_millis(1);
        assert_eq!(state.power_multiplier(after), 0.0);
        assert!(!state.is_fading(after));
    }

    #[test]
    fn fade_is_partway_through_at_the_midpoint() {
        let mut state = GlobalState::new();
        let t0 = Instant::now();
        state.set_power(PowerState::Off, t0);
        let mid = t0 + FADE_DURATION / 2;
        let m = state.power_multiplier(mid);
        assert!(m > 0.0 && m < 1.0);
        assert!(state.is_fading(mid));
    }

    #[test]
    fn setting_a_param_does_not_clear_other_effects_params() {
        let mut state = GlobalState::new();
        state.set_effect(EffectId::RainbowRadial);
        state.set_param("speed", ParamValue::Float(0.9));
        state.set_effect(EffectId::SingleColor);
        state.set_effect(EffectId::RainbowRadial);
        assert_eq!(
            state.current_params().get("speed"),
            Some(&ParamValue::Float(0.9))
        );
    }

    #[test]
    fn applying_a_preset_restores_its_effect_and_params() {
        let mut state = GlobalState::new();
        state.set_effect(EffectId::RainbowSpin);
        state.set_brightness(0.4);
        let preset = state.save_preset("evening".to_string());

        state.set_effect(EffectId::SingleColor);
        state.set_brightness(1.0);
        state.apply_preset(preset.id).unwrap();

        assert_eq!(state.effect, EffectId::RainbowSpin);
        assert_eq!(state.brightness, 0.4);
        assert_eq!(state.active_preset_id, Some(preset.id));
    }

    #[test]
    fn applying_an_unknown_preset_id_fails_without_mutating_state() {
        let mut state = GlobalState::new();
        state.set_effect(EffectId::SingleColor);
        assert!(state.apply_preset(12345).is_none());
        assert_eq!(state.effect, EffectId::SingleColor);
    }
}
