// Slider inputs: the policy levers the dashboard (or the chat assistant)
// sets between runs. The engine reads them as-is; range enforcement is the
// caller's job, see `SliderInputs::clamped`.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::ConfigError;
use crate::params::ModelParams;
use crate::types::SliderKey;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct SliderInputs {
    pub ai_capability: f64,
    pub adoption_speed: f64,
    pub regulation: f64,
    pub retraining: f64,
    pub transfers: f64,
    pub labor_protection: f64,
    pub corporate_concentration: f64,
    #[serde(alias = "energyCost", alias = "openSourceAccess")]
    pub external_shock: f64,
    #[serde(alias = "supplyChainResilience", alias = "talentPipelineStrength")]
    pub resilience: f64,
}

impl SliderInputs {
    /// Every slider at its declared default.
    pub fn defaults(params: &ModelParams) -> Self {
        let mut sliders = Self::zeroed();
        for (key, spec) in &params.sliders {
            sliders.set(*key, spec.default);
        }
        sliders
    }

    /// Every slider at its declared minimum.
    pub fn minimums(params: &ModelParams) -> Self {
        let mut sliders = Self::zeroed();
        for (key, spec) in &params.sliders {
            sliders.set(*key, spec.min);
        }
        sliders
    }

    /// Every slider at its declared maximum.
    pub fn maximums(params: &ModelParams) -> Self {
        let mut sliders = Self::zeroed();
        for (key, spec) in &params.sliders {
            sliders.set(*key, spec.max);
        }
        sliders
    }

    fn zeroed() -> Self {
        Self {
            ai_capability: 0.0,
            adoption_speed: 0.0,
            regulation: 0.0,
            retraining: 0.0,
            transfers: 0.0,
            labor_protection: 0.0,
            corporate_concentration: 0.0,
            external_shock: 0.0,
            resilience: 0.0,
        }
    }

    pub fn get(&self, key: SliderKey) -> f64 {
        match key {
            SliderKey::AiCapability => self.ai_capability,
            SliderKey::AdoptionSpeed => self.adoption_speed,
            SliderKey::Regulation => self.regulation,
            SliderKey::Retraining => self.retraining,
            SliderKey::Transfers => self.transfers,
            SliderKey::LaborProtection => self.labor_protection,
            SliderKey::CorporateConcentration => self.corporate_concentration,
            SliderKey::ExternalShock => self.external_shock,
            SliderKey::Resilience => self.resilience,
        }
    }

    pub fn set(&mut self, key: SliderKey, value: f64) {
        let slot = match key {
            SliderKey::AiCapability => &mut self.ai_capability,
            SliderKey::AdoptionSpeed => &mut self.adoption_speed,
            SliderKey::Regulation => &mut self.regulation,
            SliderKey::Retraining => &mut self.retraining,
            SliderKey::Transfers => &mut self.transfers,
            SliderKey::LaborProtection => &mut self.labor_protection,
            SliderKey::CorporateConcentration => &mut self.corporate_concentration,
            SliderKey::ExternalShock => &mut self.external_shock,
            SliderKey::Resilience => &mut self.resilience,
        };
        *slot = value;
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: SliderKey, value: f64) -> Self {
        self.set(key, value);
        self
    }

    /// Set a slider by its JSON name, saturating into the declared range.
    pub fn set_named(
        &mut self,
        name: &str,
        value: f64,
        params: &ModelParams,
    ) -> Result<SliderKey, ConfigError> {
        let key = SliderKey::parse(name).ok_or_else(|| ConfigError::UnknownSlider(name.into()))?;
        let spec = params.slider(key).ok_or(ConfigError::MissingSlider(key))?;
        let value = if value.is_nan() { spec.default } else { value };
        self.set(key, value.max(spec.min).min(spec.max));
        Ok(key)
    }

    /// Copy with every slider saturated into its declared range.
    pub fn clamped(&self, params: &ModelParams) -> Self {
        let mut out = *self;
        for key in SliderKey::all() {
            if let Some(spec) = params.slider(key) {
                out.set(key, self.get(key).max(spec.min).min(spec.max));
            }
        }
        out
    }

    pub fn approx_eq(&self, other: &SliderInputs, tolerance: f64) -> bool {
        SliderKey::all().all(|k| (self.get(k) - other.get(k)).abs() < tolerance)
    }
}

// ============================================================================
// Presets - Named slider configurations offered by the dashboard
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Preset {
    pub label: &'static str,
    pub description: &'static str,
    pub sliders: SliderInputs,
}

/// Two preset vectors match when every slider is within this distance.
pub const PRESET_MATCH_TOLERANCE: f64 = 0.001;

pub const PRESETS: [Preset; 4] = [
    Preset {
        label: "Business as Usual",
        description: "Moderate AI growth, limited policy response",
        sliders: SliderInputs {
            ai_capability: 0.3,
            adoption_speed: 0.4,
            regulation: 0.3,
            retraining: 0.2,
            transfers: 0.2,
            labor_protection: 0.3,
            corporate_concentration: 0.4,
            external_shock: 0.0,
            resilience: 0.5,
        },
    },
    Preset {
        label: "AI Boom",
        description: "Rapid AI deployment, minimal friction",
        sliders: SliderInputs {
            ai_capability: 0.9,
            adoption_speed: 0.85,
            regulation: 0.1,
            retraining: 0.1,
            transfers: 0.1,
            labor_protection: 0.1,
            corporate_concentration: 0.7,
            external_shock: 0.4,
            resilience: 0.4,
        },
    },
    Preset {
        label: "Heavy Regulation",
        description: "Government slows AI, protects workers",
        sliders: SliderInputs {
            ai_capability: 0.5,
            adoption_speed: 0.3,
            regulation: 0.85,
            retraining: 0.5,
            transfers: 0.4,
            labor_protection: 0.8,
            corporate_concentration: 0.2,
            external_shock: -0.2,
            resilience: 0.6,
        },
    },
    Preset {
        label: "UBI Future",
        description: "Strong safety net, robust retraining",
        sliders: SliderInputs {
            ai_capability: 0.6,
            adoption_speed: 0.55,
            regulation: 0.4,
            retraining: 0.8,
            transfers: 0.85,
            labor_protection: 0.5,
            corporate_concentration: 0.3,
            external_shock: 0.2,
            resilience: 0.8,
        },
    },
];

pub fn preset(label: &str) -> Result<&'static Preset, ConfigError> {
    PRESETS
        .iter()
        .find(|p| p.label.eq_ignore_ascii_case(label))
        .ok_or_else(|| ConfigError::UnknownPreset(label.to_string()))
}

/// The preset whose sliders all match the current values, if any.
pub fn matching_preset(sliders: &SliderInputs) -> Option<&'static Preset> {
    PRESETS
        .iter()
        .find(|p| p.sliders.approx_eq(sliders, PRESET_MATCH_TOLERANCE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_slider_metadata() {
        let params = ModelParams::default();
        let sliders = SliderInputs::defaults(&params);
        for key in SliderKey::all() {
            assert_eq!(sliders.get(key), params.sliders[&key].default, "{key}");
        }
        assert_eq!(SliderInputs::minimums(&params).external_shock, -0.5);
        assert_eq!(SliderInputs::maximums(&params).transfers, 1.0);
    }

    #[test]
    fn set_named_saturates_and_resolves_aliases() {
        let params = ModelParams::default();
        let mut sliders = SliderInputs::defaults(&params);

        let key = sliders.set_named("energyCost", 2.0, &params).unwrap();
        assert_eq!(key, SliderKey::ExternalShock);
        assert_eq!(sliders.external_shock, 0.5);

        sliders.set_named("regulation", -1.0, &params).unwrap();
        assert_eq!(sliders.regulation, 0.0);

        assert!(matches!(
            sliders.set_named("warpDrive", 0.5, &params),
            Err(ConfigError::UnknownSlider(_))
        ));
    }

    #[test]
    fn deserializes_variant_specific_names() {
        let json = r#"{
            "aiCapability": 0.9, "adoptionSpeed": 0.85, "regulation": 0.1,
            "retraining": 0.1, "transfers": 0.1, "laborProtection": 0.1,
            "corporateConcentration": 0.7, "openSourceAccess": 0.4,
            "talentPipelineStrength": 0.4
        }"#;
        let sliders: SliderInputs = serde_json::from_str(json).unwrap();
        assert_eq!(matching_preset(&sliders).map(|p| p.label), Some("AI Boom"));
    }

    #[test]
    fn preset_matching_uses_tolerance() {
        let mut sliders = preset("ubi future").unwrap().sliders;
        sliders.transfers += 0.0005;
        assert_eq!(matching_preset(&sliders).map(|p| p.label), Some("UBI Future"));
        sliders.transfers += 0.01;
        assert!(matching_preset(&sliders).is_none());
        assert!(preset("Martian Colony").is_err());
    }
}
