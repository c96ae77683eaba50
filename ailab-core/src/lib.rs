use std::collections::BTreeMap;

use wasm_bindgen::prelude::*;

pub mod briefing;
mod error;
pub mod indices;
pub mod narrative;
mod occupations;
mod params;
mod sliders;
mod state;
mod step;
mod types;

pub use error::*;
pub use occupations::*;
pub use params::*;
pub use sliders::*;
pub use state::*;
pub use step::*;
pub use types::*;

#[cfg(feature = "instrument")]
pub use instrument;

/// Default simulated horizon in years.
pub const DEFAULT_YEARS: u32 = 10;

fn js_error(e: ConfigError) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

// ============================================================================
// WASM API - LabSimulation
// ============================================================================

/// Dashboard handle. Every input change re-runs the whole horizon from year
/// zero, so the history always matches the current sliders.
#[wasm_bindgen]
pub struct LabSimulation {
    dataset: OccupationDataset,
    params: ModelParams,
    sliders: SliderInputs,
    years: u32,
    history: History,
}

#[wasm_bindgen]
impl LabSimulation {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();

        Self::with_parts(OccupationDataset::builtin(), ModelParams::default())
    }

    /// Load a custom roster and calibration. An empty `params_json` keeps the
    /// reference calibration.
    #[wasm_bindgen]
    pub fn from_json(dataset_json: &str, params_json: &str) -> Result<LabSimulation, JsValue> {
        console_error_panic_hook::set_once();
        Self::try_from_json(dataset_json, params_json).map_err(js_error)
    }

    /// Set one slider by JSON name; the value saturates into its range.
    #[wasm_bindgen]
    pub fn set_slider(&mut self, key: &str, value: f64) -> Result<(), JsValue> {
        self.try_set_slider(key, value).map(|_| ()).map_err(js_error)
    }

    /// Replace every slider at once.
    #[wasm_bindgen]
    pub fn set_sliders(&mut self, sliders: SliderInputs) {
        self.sliders = sliders.clamped(&self.params);
        self.rerun();
    }

    #[wasm_bindgen]
    pub fn sliders(&self) -> SliderInputs {
        self.sliders
    }

    #[wasm_bindgen]
    pub fn apply_preset(&mut self, label: &str) -> Result<(), JsValue> {
        self.try_apply_preset(label).map_err(js_error)
    }

    /// Label of the preset matching the current sliders, if any.
    #[wasm_bindgen]
    pub fn active_preset(&self) -> Option<String> {
        matching_preset(&self.sliders).map(|p| p.label.to_string())
    }

    /// Apply every slider directive in an assistant reply and return the
    /// reply with the directives removed.
    #[wasm_bindgen]
    pub fn apply_assistant_reply(&mut self, reply: &str) -> String {
        let commands = briefing::parse_slider_commands(reply);
        if !commands.is_empty() {
            for command in &commands {
                let spec = self.params.slider(command.key);
                let value = spec.map_or(command.value, |s| command.value.max(s.min).min(s.max));
                self.sliders.set(command.key, value);
            }
            self.rerun();
        }
        briefing::strip_slider_commands(reply)
    }

    #[wasm_bindgen]
    pub fn set_horizon(&mut self, years: u32) {
        self.years = years;
        self.rerun();
    }

    #[wasm_bindgen]
    pub fn horizon(&self) -> u32 {
        self.years
    }

    #[wasm_bindgen]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    #[wasm_bindgen]
    pub fn history_snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            start_year: self.params.start_year,
            states: self
                .history
                .iter()
                .map(|s| StateSnapshot::capture(s, &self.dataset, &self.params))
                .collect(),
        }
    }

    /// Snapshot of year `start_year + index`, for the timeline scrubber.
    #[wasm_bindgen]
    pub fn state_at(&self, index: usize) -> Result<StateSnapshot, JsValue> {
        self.history
            .get(index)
            .map(|s| StateSnapshot::capture(s, &self.dataset, &self.params))
            .ok_or_else(|| {
                js_sys::Error::new(&format!(
                    "year index {index} is outside 0..={}",
                    self.history.len().saturating_sub(1)
                ))
                .into()
            })
    }

    #[wasm_bindgen]
    pub fn latest(&self) -> StateSnapshot {
        StateSnapshot::capture(self.latest_state(), &self.dataset, &self.params)
    }

    /// Slider metadata keyed by JSON name, for building the control panel.
    #[wasm_bindgen]
    pub fn slider_catalog(&self) -> Result<JsValue, JsValue> {
        let catalog: BTreeMap<&str, &SliderSpec> = self
            .params
            .sliders
            .iter()
            .map(|(k, spec)| (k.as_str(), spec))
            .collect();
        serde_wasm_bindgen::to_value(&catalog).map_err(JsValue::from)
    }

    /// Plain-text state summary for the chat assistant's prompt.
    #[wasm_bindgen]
    pub fn briefing(&self) -> String {
        briefing::briefing(&self.history, &self.sliders, &self.params)
    }

    #[wasm_bindgen]
    pub fn index_name(&self) -> String {
        self.params.disruption.variant.index_name().to_string()
    }
}

impl Default for LabSimulation {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Rust-side API - Used by the wasm wrappers and by tests
// ============================================================================

impl LabSimulation {
    pub fn with_parts(dataset: OccupationDataset, params: ModelParams) -> Self {
        let sliders = SliderInputs::defaults(&params);
        let mut sim = Self {
            dataset,
            params,
            sliders,
            years: DEFAULT_YEARS,
            history: Vec::new(),
        };
        sim.rerun();
        sim
    }

    pub fn try_from_json(dataset_json: &str, params_json: &str) -> Result<Self, ConfigError> {
        let dataset = OccupationDataset::from_json(dataset_json)?;
        let params = if params_json.trim().is_empty() {
            ModelParams::default()
        } else {
            ModelParams::from_json(params_json)?
        };
        params.validate_for(&dataset)?;
        Ok(Self::with_parts(dataset, params))
    }

    pub fn try_set_slider(&mut self, key: &str, value: f64) -> Result<SliderKey, ConfigError> {
        let key = self.sliders.set_named(key, value, &self.params)?;
        self.rerun();
        Ok(key)
    }

    pub fn try_apply_preset(&mut self, label: &str) -> Result<(), ConfigError> {
        self.sliders = preset(label)?.sliders.clamped(&self.params);
        self.rerun();
        Ok(())
    }

    pub fn dataset(&self) -> &OccupationDataset {
        &self.dataset
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn latest_state(&self) -> &SimulationState {
        // The history always holds at least year zero.
        &self.history[self.history.len() - 1]
    }

    fn rerun(&mut self) {
        self.history = run_simulation(&self.dataset, &self.sliders, &self.params, self.years);
    }
}
