//! Composite-index formulas.
//!
//! Each function is one line of the yearly model, kept free-standing so the
//! step reads as a sequence of named quantities and each term can be tested
//! on its own. Every returned index is already clamped to its declared bounds.

use crate::occupations::Occupation;
use crate::params::ModelParams;
use crate::sliders::SliderInputs;
use crate::types::clamp;

// === ADOPTION ===

/// Throttle on adoption from social instability, in the declared multiplier range.
pub fn stability_multiplier(stability: f64, params: &ModelParams) -> f64 {
    let p = &params.adoption;
    let stress = ((p.slowdown_threshold - stability) / p.slowdown_threshold).max(0.0);
    p.multiplier.clamp(1.0 - p.slowdown_max * stress)
}

/// Adoption speed after regulation drag and the stability slowdown.
pub fn effective_adoption(sliders: &SliderInputs, stability: f64, params: &ModelParams) -> f64 {
    sliders.adoption_speed
        * (1.0 - sliders.regulation * params.adoption.regulation_drag)
        * stability_multiplier(stability, params)
}

// === EMPLOYMENT ===

pub fn job_loss_rate(
    occupation: &Occupation,
    sliders: &SliderInputs,
    effective_adoption: f64,
    params: &ModelParams,
) -> f64 {
    let p = &params.employment;
    let retraining_damp = sliders.retraining * p.retraining_damp;
    let rate = sliders.ai_capability
        * effective_adoption
        * occupation.routine_score
        * (1.0 - occupation.social_score)
        * p.substitution
        * (1.0 - sliders.labor_protection * p.labor_protection_damp)
        * (1.0 - retraining_damp);
    clamp(rate, 0.0, p.max_job_loss_rate)
}

/// Share of baseline headcount an occupation cannot fall below this year.
pub fn employment_floor_ratio(sliders: &SliderInputs, params: &ModelParams) -> f64 {
    let p = &params.employment;
    (p.floor_ratio + sliders.retraining * p.retraining_floor_boost).min(1.0)
}

pub fn next_employment(
    occupation: &Occupation,
    previous: f64,
    job_loss_rate: f64,
    floor_ratio: f64,
) -> f64 {
    (occupation.employment * floor_ratio).max(previous * (1.0 - job_loss_rate))
}

// === WAGES ===

pub fn wage_growth(occupation: &Occupation, sliders: &SliderInputs, params: &ModelParams) -> f64 {
    let p = &params.wages;
    sliders.ai_capability
        * occupation.complementarity_score
        * p.complementarity_wage
        * (1.0 - sliders.corporate_concentration * p.concentration_wage_damp)
}

/// Oversupply pressure on wages in occupations that have shed workers.
pub fn wage_suppression(occupation: &Occupation, employment: f64, params: &ModelParams) -> f64 {
    let employment_ratio = employment / occupation.employment;
    occupation.routine_score * (1.0 - employment_ratio).max(0.0) * params.wages.suppression
}

pub fn next_wage(
    occupation: &Occupation,
    previous: f64,
    growth: f64,
    suppression: f64,
    params: &ModelParams,
) -> f64 {
    (occupation.mean_wage * params.wages.floor_ratio).max(previous * (1.0 + growth - suppression))
}

// === GDP ===

/// Output of displaced labor that accrues to firms instead of vanishing.
pub fn capital_gains(displaced_wage_value: f64, sliders: &SliderInputs, params: &ModelParams) -> f64 {
    displaced_wage_value * sliders.ai_capability * params.gdp.capital_capture_ratio
}

pub fn gdp_index(raw_gdp: f64, base_gdp: f64, params: &ModelParams) -> f64 {
    params.gdp.bounds.clamp(raw_gdp / base_gdp * 100.0)
}

// === UNEMPLOYMENT ===

pub fn unemployment_rate(labor_force: f64, total_employment: f64) -> f64 {
    clamp((labor_force - total_employment) / labor_force, 0.0, 1.0)
}

/// Headline unemployment plus the demand-feedback surcharge above the
/// structural rate. Only the stability formula sees this figure.
pub fn adjusted_unemployment(unemployment: f64, params: &ModelParams) -> f64 {
    let p = &params.unemployment;
    unemployment + (unemployment - p.structural_rate).max(0.0) * p.demand_feedback
}

// === DISRUPTION ===

/// Relative shortfall of the sensitive subset; zero when it had no baseline.
pub fn subset_shortfall(baseline: f64, current: f64) -> f64 {
    if baseline > 0.0 {
        (baseline - current) / baseline
    } else {
        0.0
    }
}

pub fn transition_chaos(shortfall: f64, sliders: &SliderInputs, params: &ModelParams) -> f64 {
    let p = &params.disruption;
    shortfall
        * (1.0 - sliders.ai_capability * p.capability_chaos_damp)
        * p.shortfall_pass_through
        * (1.0 - sliders.resilience)
}

pub fn adoption_efficiency(
    sliders: &SliderInputs,
    effective_adoption: f64,
    params: &ModelParams,
) -> f64 {
    sliders.ai_capability * effective_adoption * params.disruption.efficiency_rate
}

pub fn disruption_index(
    previous: f64,
    chaos: f64,
    efficiency: f64,
    sliders: &SliderInputs,
    params: &ModelParams,
) -> f64 {
    let p = &params.disruption;
    let shock = 1.0 + sliders.external_shock * p.shock_pass_through;
    p.bounds.clamp(previous * (1.0 + chaos) * (1.0 - efficiency) * shock)
}

// === INEQUALITY ===

/// Mean of `values`, zero for an empty slice.
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// This year's wage divergence: mean gain among high-complementarity
/// occupations plus mean loss among high-routine ones, over the average
/// baseline wage.
pub fn wage_divergence(
    complementary_gains: &[f64],
    routine_losses: &[f64],
    average_baseline_wage: f64,
) -> f64 {
    if average_baseline_wage <= 0.0 {
        return 0.0;
    }
    (mean(complementary_gains) + mean(routine_losses)) / average_baseline_wage
}

pub fn inequality_index(
    previous: f64,
    divergence: f64,
    sliders: &SliderInputs,
    params: &ModelParams,
) -> f64 {
    let p = &params.inequality;
    let damp = 1.0 - sliders.transfers * p.transfers_damp;
    let ai_term = divergence * p.ai_inequality * damp;
    let concentration_term = sliders.corporate_concentration * p.concentration_labor_share * damp;
    p.bounds.clamp(previous + ai_term + concentration_term)
}

// === STABILITY ===

/// Disruption above neutral, less the share bought down by transfers, in points.
pub fn disruption_penalty(disruption: f64, sliders: &SliderInputs, params: &ModelParams) -> f64 {
    let deviation = (disruption - 1.0).max(0.0);
    let buffer = sliders.transfers * params.stability.transfers_buffer * deviation;
    (deviation - buffer) * 100.0
}

pub fn stability_index(
    adjusted_unemployment: f64,
    disruption_penalty: f64,
    inequality: f64,
    params: &ModelParams,
) -> f64 {
    let p = &params.stability;
    p.bounds.clamp(
        100.0
            - adjusted_unemployment * 100.0 * p.weight_unemployment
            - disruption_penalty * p.weight_disruption
            - (inequality - 1.0) * p.weight_inequality,
    )
}
