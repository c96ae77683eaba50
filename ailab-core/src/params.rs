// Model parameters: every coefficient, clamp bound and narrative threshold
// the step reads. Loaded once (JSON or `Default`), validated, then shared
// read-only by every step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::ConfigError;
use crate::occupations::OccupationDataset;
use crate::types::{Bounds, DisruptionVariant, SliderKey};

// ============================================================================
// Slider metadata
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct SliderSpec {
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
    pub tooltip: String,
}

impl SliderSpec {
    fn new(label: &str, min: f64, max: f64, default: f64, tooltip: &str) -> Self {
        Self {
            label: label.to_string(),
            min,
            max,
            step: 0.05,
            default,
            tooltip: tooltip.to_string(),
        }
    }

    fn validate(&self, key: SliderKey) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidSliderSpec { key, reason };
        if !(self.min.is_finite() && self.max.is_finite() && self.min <= self.max) {
            return Err(invalid(format!("range [{}, {}] is empty", self.min, self.max)));
        }
        if !(self.min..=self.max).contains(&self.default) {
            return Err(invalid(format!(
                "default {} is outside [{}, {}]",
                self.default, self.min, self.max
            )));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(invalid(format!("step must be positive, got {}", self.step)));
        }
        Ok(())
    }
}

#[rustfmt::skip]
fn default_slider_specs(variant: DisruptionVariant) -> BTreeMap<SliderKey, SliderSpec> {
    let (shock_tooltip, resilience_tooltip) = match variant {
        DisruptionVariant::FoodPrice => (
            "Energy price shock passed through to food prices (-0.5 = cheap energy, +0.5 = expensive)",
            "How well logistics networks absorb workforce disruption",
        ),
        DisruptionVariant::TechLayoff => (
            "Availability of open-source AI models (-0.5 = locked down, +0.5 = widely available)",
            "Strength of the pipeline retraining displaced infrastructure staff",
        ),
    };

    BTreeMap::from([
        (SliderKey::AiCapability, SliderSpec::new("AI Capability", 0.0, 1.0, 0.5,
            "How capable AI systems are (0 = none, 1 = maximum)")),
        (SliderKey::AdoptionSpeed, SliderSpec::new("Adoption Speed", 0.0, 1.0, 0.5,
            "How fast firms deploy AI")),
        (SliderKey::Regulation, SliderSpec::new("Regulation", 0.0, 1.0, 0.3,
            "Government oversight of AI deployment")),
        (SliderKey::Retraining, SliderSpec::new("Retraining Programs", 0.0, 1.0, 0.2,
            "Investment in worker transitions")),
        (SliderKey::Transfers, SliderSpec::new("Social Transfers", 0.0, 1.0, 0.2,
            "UBI-style payments to displaced workers")),
        (SliderKey::LaborProtection, SliderSpec::new("Labor Protections", 0.0, 1.0, 0.3,
            "Legal barriers to layoffs")),
        (SliderKey::CorporateConcentration, SliderSpec::new("Corporate Concentration", 0.0, 1.0, 0.4,
            "Market power of large firms")),
        (SliderKey::ExternalShock, SliderSpec::new(variant.shock_name(), -0.5, 0.5, 0.0,
            shock_tooltip)),
        (SliderKey::Resilience, SliderSpec::new(variant.resilience_name(), 0.0, 1.0, 0.5,
            resilience_tooltip)),
    ])
}

// ============================================================================
// Coefficient groups
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdoptionParams {
    /// Share of adoption removed at full regulation
    pub regulation_drag: f64,
    /// Largest slowdown applied when stability collapses to zero
    pub slowdown_max: f64,
    /// Stability below which institutions start to slow deployment
    pub slowdown_threshold: f64,
    pub multiplier: Bounds,
}

impl Default for AdoptionParams {
    fn default() -> Self {
        Self {
            regulation_drag: 0.6,
            slowdown_max: 0.5,
            slowdown_threshold: 60.0,
            multiplier: Bounds::new(0.4, 1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmploymentParams {
    pub substitution: f64,
    pub labor_protection_damp: f64,
    pub retraining_damp: f64,
    /// Share of baseline headcount no occupation can fall below
    pub floor_ratio: f64,
    /// Extra floor per unit of retraining investment
    pub retraining_floor_boost: f64,
    pub max_job_loss_rate: f64,
}

impl Default for EmploymentParams {
    fn default() -> Self {
        Self {
            substitution: 0.3,
            labor_protection_damp: 0.5,
            retraining_damp: 0.3,
            floor_ratio: 0.5,
            retraining_floor_boost: 0.1,
            max_job_loss_rate: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WageParams {
    pub complementarity_wage: f64,
    pub concentration_wage_damp: f64,
    /// Oversupply-driven wage decline in shrinking routine occupations
    pub suppression: f64,
    /// Wages never drop below this share of baseline
    pub floor_ratio: f64,
}

impl Default for WageParams {
    fn default() -> Self {
        Self {
            complementarity_wage: 0.03,
            concentration_wage_damp: 0.2,
            suppression: 0.05,
            floor_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GdpParams {
    /// Share of displaced labor value captured as firm profit
    pub capital_capture_ratio: f64,
    pub bounds: Bounds,
}

impl Default for GdpParams {
    fn default() -> Self {
        Self {
            capital_capture_ratio: 0.6,
            bounds: Bounds::new(50.0, 200.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnemploymentParams {
    pub structural_rate: f64,
    pub demand_feedback: f64,
}

impl Default for UnemploymentParams {
    fn default() -> Self {
        Self {
            structural_rate: 0.08,
            demand_feedback: 0.3,
        }
    }
}

/// Which sensitive subset drives the disruption index, and how strongly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisruptionConfig {
    pub variant: DisruptionVariant,
    pub shortfall_pass_through: f64,
    /// Mature AI absorbs part of the transition chaos
    pub capability_chaos_damp: f64,
    pub efficiency_rate: f64,
    pub shock_pass_through: f64,
    pub bounds: Bounds,
}

impl Default for DisruptionConfig {
    fn default() -> Self {
        Self {
            variant: DisruptionVariant::default(),
            shortfall_pass_through: 0.8,
            capability_chaos_damp: 0.7,
            efficiency_rate: 0.02,
            shock_pass_through: 0.1,
            bounds: Bounds::new(0.5, 3.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InequalityParams {
    pub ai_inequality: f64,
    pub concentration_labor_share: f64,
    pub high_complementarity_threshold: f64,
    pub high_routine_threshold: f64,
    pub transfers_damp: f64,
    pub bounds: Bounds,
}

impl Default for InequalityParams {
    fn default() -> Self {
        Self {
            ai_inequality: 1.0,
            concentration_labor_share: 0.02,
            high_complementarity_threshold: 0.7,
            high_routine_threshold: 0.7,
            transfers_damp: 0.4,
            bounds: Bounds::new(0.5, 3.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StabilityParams {
    pub weight_unemployment: f64,
    pub weight_disruption: f64,
    pub weight_inequality: f64,
    /// Share of the disruption penalty absorbed per unit of transfers
    pub transfers_buffer: f64,
    pub bounds: Bounds,
}

impl Default for StabilityParams {
    fn default() -> Self {
        Self {
            weight_unemployment: 1.0,
            weight_disruption: 0.5,
            weight_inequality: 15.0,
            transfers_buffer: 0.35,
            bounds: Bounds::new(0.0, 100.0),
        }
    }
}

/// Trigger levels for the yearly narrative checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NarrativeThresholds {
    pub automation_capability: f64,
    pub automation_adoption: f64,
    pub accelerating_capability: f64,
    pub heavy_capability: f64,
    pub wage_capability: f64,
    pub strong_wage_capability: f64,
    pub shortfall_moderate: f64,
    pub shortfall_severe: f64,
    pub shock_elevated: f64,
    pub shock_high: f64,
    pub shock_falling: f64,
    pub unemployment_elevated: f64,
    pub unemployment_surging: f64,
    pub unemployment_crisis: f64,
    pub inequality_rising: f64,
    pub inequality_severe: f64,
    pub regulation_friction: f64,
    pub regulation_strong: f64,
    pub retraining_active: f64,
    pub retraining_capability: f64,
    pub transfers_active: f64,
    pub stability_stress: f64,
    pub stability_warning: f64,
    pub stability_critical: f64,
    pub gdp_surging: f64,
    pub gdp_contracting: f64,
}

impl Default for NarrativeThresholds {
    fn default() -> Self {
        Self {
            automation_capability: 0.3,
            automation_adoption: 0.2,
            accelerating_capability: 0.5,
            heavy_capability: 0.7,
            wage_capability: 0.4,
            strong_wage_capability: 0.7,
            shortfall_moderate: 0.05,
            shortfall_severe: 0.15,
            shock_elevated: 0.1,
            shock_high: 0.2,
            shock_falling: -0.1,
            unemployment_elevated: 0.12,
            unemployment_surging: 0.15,
            unemployment_crisis: 0.20,
            inequality_rising: 1.4,
            inequality_severe: 2.0,
            regulation_friction: 0.6,
            regulation_strong: 0.7,
            retraining_active: 0.5,
            retraining_capability: 0.3,
            transfers_active: 0.5,
            stability_stress: 65.0,
            stability_warning: 50.0,
            stability_critical: 30.0,
            gdp_surging: 130.0,
            gdp_contracting: 80.0,
        }
    }
}

// ============================================================================
// ModelParams - The full bundle
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelParams {
    pub start_year: i32,
    /// Overrides the dataset's labor force when set
    pub labor_force: Option<f64>,
    pub adoption: AdoptionParams,
    pub employment: EmploymentParams,
    pub wages: WageParams,
    pub gdp: GdpParams,
    pub unemployment: UnemploymentParams,
    pub disruption: DisruptionConfig,
    pub inequality: InequalityParams,
    pub stability: StabilityParams,
    pub narrative: NarrativeThresholds,
    pub sliders: BTreeMap<SliderKey, SliderSpec>,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self::for_variant(DisruptionVariant::default())
    }
}

impl ModelParams {
    /// Reference calibration for the given disruption variant.
    pub fn for_variant(variant: DisruptionVariant) -> Self {
        Self {
            start_year: 2025,
            labor_force: None,
            adoption: AdoptionParams::default(),
            employment: EmploymentParams::default(),
            wages: WageParams::default(),
            gdp: GdpParams::default(),
            unemployment: UnemploymentParams::default(),
            disruption: DisruptionConfig {
                variant,
                ..DisruptionConfig::default()
            },
            inequality: InequalityParams::default(),
            stability: StabilityParams::default(),
            narrative: NarrativeThresholds::default(),
            sliders: default_slider_specs(variant),
        }
    }

    /// Parse and validate a parameter document. Missing fields fall back to
    /// the reference calibration. Without a `sliders` table the slider
    /// metadata follows the document's disruption variant.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let document: serde_json::Value = serde_json::from_str(json)?;
        let has_sliders = document.get("sliders").is_some();
        let mut params: ModelParams = serde_json::from_value(document)?;
        if !has_sliders {
            params.sliders = default_slider_specs(params.disruption.variant);
        }
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = [
            ("adoption.multiplier", self.adoption.multiplier),
            ("gdp.bounds", self.gdp.bounds),
            ("disruption.bounds", self.disruption.bounds),
            ("inequality.bounds", self.inequality.bounds),
            ("stability.bounds", self.stability.bounds),
        ];
        for (name, b) in bounds {
            if !b.is_valid() {
                return Err(ConfigError::InvalidBounds {
                    name,
                    min: b.min,
                    max: b.max,
                });
            }
        }
        if self.stability.bounds.max > 100.0 {
            return Err(ConfigError::InvalidBounds {
                name: "stability.bounds",
                min: self.stability.bounds.min,
                max: self.stability.bounds.max,
            });
        }

        let threshold = self.adoption.slowdown_threshold;
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "adoption.slowdownThreshold",
                value: threshold,
            });
        }
        let unit_ratios = [
            ("employment.floorRatio", self.employment.floor_ratio),
            ("employment.maxJobLossRate", self.employment.max_job_loss_rate),
            ("wages.floorRatio", self.wages.floor_ratio),
        ];
        for (name, value) in unit_ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }
        if let Some(labor_force) = self.labor_force {
            if !(labor_force.is_finite() && labor_force > 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "laborForce",
                    value: labor_force,
                });
            }
        }

        for key in SliderKey::all() {
            self.sliders
                .get(&key)
                .ok_or(ConfigError::MissingSlider(key))?
                .validate(key)?;
        }
        Ok(())
    }

    /// Checks that only make sense once the roster is known.
    pub fn validate_for(&self, dataset: &OccupationDataset) -> Result<(), ConfigError> {
        let labor_force = self.labor_force_for(dataset);
        let employment = dataset.total_baseline_employment();
        if labor_force < employment {
            return Err(ConfigError::LaborForceTooSmall {
                labor_force,
                employment,
            });
        }
        Ok(())
    }

    pub fn labor_force_for(&self, dataset: &OccupationDataset) -> f64 {
        self.labor_force.unwrap_or_else(|| dataset.labor_force())
    }

    pub fn slider(&self, key: SliderKey) -> Option<&SliderSpec> {
        self.sliders.get(&key)
    }
}
