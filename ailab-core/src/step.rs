use crate::indices;
use crate::narrative::{self, JobLossLeader, WageGainLeader, YearFacts};
use crate::occupations::OccupationDataset;
use crate::params::ModelParams;
use crate::sliders::SliderInputs;
use crate::state::{History, OccupationState, SimulationState, build_initial_state};
use crate::types::OccupationId;

// ============================================================================
// Step Report - Intermediates of one simulated year
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub year: i32,
    pub stability_multiplier: f64,
    pub effective_adoption: f64,
    /// `(occupation, rate)` in roster order
    pub job_loss_rates: Vec<(OccupationId, f64)>,
    pub wage_bill: f64,
    pub capital_gains: f64,
    pub raw_gdp: f64,
    pub adjusted_unemployment: f64,
    pub shortfall: f64,
    pub transition_chaos: f64,
    pub adoption_efficiency: f64,
    pub wage_divergence: f64,
    pub disruption_penalty: f64,
    /// Largest absolute employment loss this year, earliest in roster on ties
    pub most_displaced: Option<OccupationId>,
    /// Largest absolute wage gain this year, earliest in roster on ties
    pub top_wage_gain: Option<OccupationId>,
    pub events: Vec<String>,
}

impl StepReport {
    pub fn job_loss_rate(&self, id: OccupationId) -> Option<f64> {
        self.job_loss_rates
            .iter()
            .find(|(o, _)| *o == id)
            .map(|(_, r)| *r)
    }
}

// ============================================================================
// Step - Advance one year
// ============================================================================

/// Advance `state` by one year. Pure: the same inputs always give the same state.
///
/// Panics if `state` holds an occupation id that is not part of `dataset`.
pub fn step(
    state: &SimulationState,
    dataset: &OccupationDataset,
    sliders: &SliderInputs,
    params: &ModelParams,
) -> SimulationState {
    step_with_report(state, dataset, sliders, params).0
}

pub fn step_with_report(
    state: &SimulationState,
    dataset: &OccupationDataset,
    sliders: &SliderInputs,
    params: &ModelParams,
) -> (SimulationState, StepReport) {
    let year = state.year + 1;

    // 1. Adoption
    let stability_multiplier = indices::stability_multiplier(state.stability_index, params);
    let effective_adoption = indices::effective_adoption(sliders, state.stability_index, params);
    let floor_ratio = indices::employment_floor_ratio(sliders, params);

    // 2-3. Employment and wages
    let mut occupations = Vec::with_capacity(state.occupations.len());
    let mut job_loss_rates = Vec::with_capacity(state.occupations.len());
    for prev in &state.occupations {
        let base = &dataset[prev.id];
        let rate = indices::job_loss_rate(base, sliders, effective_adoption, params);
        let employment = indices::next_employment(base, prev.employment, rate, floor_ratio);
        let growth = indices::wage_growth(base, sliders, params);
        let suppression = indices::wage_suppression(base, employment, params);
        let wage = indices::next_wage(base, prev.wage, growth, suppression, params);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "occupation",
            year = year as i64,
            occupation = base.key.as_str(),
            employment = employment,
            wage = wage,
            job_loss_rate = rate,
            wage_growth = growth,
            wage_suppression = suppression,
        );

        job_loss_rates.push((prev.id, rate));
        occupations.push(OccupationState {
            id: prev.id,
            employment,
            wage,
        });
    }

    // 4. GDP
    let mut total_employment = 0.0;
    let mut wage_bill = 0.0;
    let mut displaced_value = 0.0;
    for o in &occupations {
        let base = &dataset[o.id];
        total_employment += o.employment;
        wage_bill += o.employment * o.wage;
        displaced_value += (base.employment - o.employment).max(0.0) * o.wage;
    }
    let capital_gains = indices::capital_gains(displaced_value, sliders, params);
    let raw_gdp = wage_bill + capital_gains;
    let gdp_index = indices::gdp_index(raw_gdp, state.base_gdp, params);

    // 5. Unemployment
    let labor_force = params.labor_force_for(dataset);
    let unemployment_rate = indices::unemployment_rate(labor_force, total_employment);
    let adjusted_unemployment = indices::adjusted_unemployment(unemployment_rate, params);

    // 6. Disruption
    let category = params.disruption.variant.category();
    let subset_now: f64 = occupations
        .iter()
        .filter(|o| dataset[o.id].in_category(category))
        .map(|o| o.employment)
        .sum();
    let shortfall =
        indices::subset_shortfall(dataset.baseline_employment_in(category), subset_now);
    let transition_chaos = indices::transition_chaos(shortfall, sliders, params);
    let adoption_efficiency = indices::adoption_efficiency(sliders, effective_adoption, params);
    let disruption_index = indices::disruption_index(
        state.disruption_index,
        transition_chaos,
        adoption_efficiency,
        sliders,
        params,
    );

    // 7. Inequality
    let ineq = &params.inequality;
    let mut complementary_gains = Vec::new();
    let mut routine_losses = Vec::new();
    for (prev, next) in state.occupations.iter().zip(&occupations) {
        let base = &dataset[prev.id];
        if base.complementarity_score >= ineq.high_complementarity_threshold {
            complementary_gains.push((next.wage - prev.wage).max(0.0));
        }
        if base.routine_score >= ineq.high_routine_threshold {
            routine_losses.push((prev.wage - next.wage).max(0.0));
        }
    }
    let wage_divergence = indices::wage_divergence(
        &complementary_gains,
        &routine_losses,
        dataset.average_baseline_wage(),
    );
    let inequality_index =
        indices::inequality_index(state.inequality_index, wage_divergence, sliders, params);

    // 8. Stability
    let disruption_penalty = indices::disruption_penalty(disruption_index, sliders, params);
    let stability_index = indices::stability_index(
        adjusted_unemployment,
        disruption_penalty,
        inequality_index,
        params,
    );

    // 9. Narrative
    let most_displaced = leader_by(&state.occupations, &occupations, |p, n| {
        p.employment - n.employment
    });
    let top_wage_gain = leader_by(&state.occupations, &occupations, |p, n| n.wage - p.wage);

    let facts = YearFacts {
        year,
        sliders,
        effective_adoption,
        shortfall,
        unemployment_rate,
        inequality_index,
        stability_index,
        gdp_index,
        job_loss_leader: most_displaced.map(|i| JobLossLeader {
            occupation: &dataset[occupations[i].id],
            employment: occupations[i].employment,
        }),
        wage_gain_leader: top_wage_gain.map(|i| WageGainLeader {
            occupation: &dataset[occupations[i].id],
            previous_wage: state.occupations[i].wage,
            wage: occupations[i].wage,
        }),
    };
    let events = narrative::generate_events(&facts, params);

    let mut event_log = Vec::with_capacity(state.event_log.len() + events.len());
    event_log.extend_from_slice(&state.event_log);
    event_log.extend(events.iter().cloned());

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "year",
        year = year as i64,
        total_employment = total_employment,
        unemployment_rate = unemployment_rate,
        adjusted_unemployment = adjusted_unemployment,
        gdp_index = gdp_index,
        disruption_index = disruption_index,
        inequality_index = inequality_index,
        stability_index = stability_index,
        effective_adoption = effective_adoption,
        stability_multiplier = stability_multiplier,
        shortfall = shortfall,
        capital_gains = capital_gains,
        events = events.len() as u64,
    );

    let next = SimulationState {
        year,
        occupations,
        total_employment,
        unemployment_rate,
        gdp_index,
        disruption_index,
        inequality_index,
        stability_index,
        event_log,
        base_gdp: state.base_gdp,
    };

    let report = StepReport {
        year,
        stability_multiplier,
        effective_adoption,
        job_loss_rates,
        wage_bill,
        capital_gains,
        raw_gdp,
        adjusted_unemployment,
        shortfall,
        transition_chaos,
        adoption_efficiency,
        wage_divergence,
        disruption_penalty,
        most_displaced: most_displaced.map(|i| next.occupations[i].id),
        top_wage_gain: top_wage_gain.map(|i| next.occupations[i].id),
        events,
    };

    (next, report)
}

/// Index of the occupation with the largest positive `delta`; the first one
/// wins ties.
fn leader_by(
    prev: &[OccupationState],
    next: &[OccupationState],
    delta: impl Fn(&OccupationState, &OccupationState) -> f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, (p, n)) in prev.iter().zip(next).enumerate() {
        let d = delta(p, n);
        if d > 0.0 && best.is_none_or(|(_, b)| d > b) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

// ============================================================================
// Run Loop
// ============================================================================

/// Year zero plus `years` steps under fixed sliders. `history[i].year` is
/// `start_year + i`.
pub fn run_simulation(
    dataset: &OccupationDataset,
    sliders: &SliderInputs,
    params: &ModelParams,
    years: u32,
) -> History {
    let mut history = Vec::with_capacity(years as usize + 1);
    history.push(build_initial_state(dataset, params));
    for _ in 0..years {
        let next = step(&history[history.len() - 1], dataset, sliders, params);
        history.push(next);
    }
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupations::Occupation;
    use crate::types::SliderKey;

    fn twin(key: &str, name: &str) -> Occupation {
        Occupation {
            key: key.into(),
            name: name.into(),
            employment: 1_000_000.0,
            mean_wage: 40_000.0,
            routine_score: 0.9,
            analytical_score: 0.2,
            social_score: 0.1,
            manual_score: 0.3,
            complementarity_score: 0.2,
            sector: "Administrative".into(),
            logistics: false,
            infrastructure: true,
        }
    }

    #[test]
    fn step_advances_one_year_and_extends_log() {
        let dataset = OccupationDataset::builtin();
        let params = ModelParams::default();
        let sliders = SliderInputs::defaults(&params);
        let initial = build_initial_state(&dataset, &params);

        let (next, report) = step_with_report(&initial, &dataset, &sliders, &params);
        assert_eq!(next.year, initial.year + 1);
        assert!(next.event_log.len() > initial.event_log.len());
        assert_eq!(next.event_log[..initial.event_log.len()], initial.event_log[..]);
        assert_eq!(next.event_log[initial.event_log.len()..], report.events[..]);
        assert_eq!(next.base_gdp(), initial.base_gdp());
        assert_eq!(report.job_loss_rates.len(), dataset.len());
        // No instability yet, so adoption is only dragged by regulation
        assert_eq!(report.stability_multiplier, 1.0);
        assert!((report.effective_adoption - 0.5 * (1.0 - 0.3 * 0.6)).abs() < 1e-12);
    }

    #[test]
    fn step_is_pure() {
        let dataset = OccupationDataset::builtin();
        let params = ModelParams::default();
        let sliders = SliderInputs::defaults(&params).with(SliderKey::AiCapability, 0.8);
        let initial = build_initial_state(&dataset, &params);
        let before = initial.clone();

        let a = step(&initial, &dataset, &sliders, &params);
        let b = step(&initial, &dataset, &sliders, &params);
        assert_eq!(a, b);
        assert_eq!(initial, before);
    }

    #[test]
    fn displaced_value_and_wage_gaps_feed_gdp_and_inequality() {
        let dataset = OccupationDataset::builtin();
        let params = ModelParams::default();
        let sliders = SliderInputs::defaults(&params).with(SliderKey::AiCapability, 0.8);
        let initial = build_initial_state(&dataset, &params);

        let (next, report) = step_with_report(&initial, &dataset, &sliders, &params);

        // GDP: wage bill plus the captured share of displaced output
        let displaced: f64 = next
            .occupations
            .iter()
            .map(|o| (dataset[o.id].employment - o.employment).max(0.0) * o.wage)
            .sum();
        assert!(displaced > 0.0);
        assert!(report.capital_gains > 0.0);
        assert!((report.capital_gains - displaced * 0.8 * 0.6).abs() < 1e-6 * displaced);
        assert_eq!(report.raw_gdp, report.wage_bill + report.capital_gains);
        let expected_gdp = report.raw_gdp / initial.base_gdp() * 100.0;
        assert!((next.gdp_index - expected_gdp).abs() < 1e-9);

        // Inequality: mean complementary gain plus mean routine loss
        let ineq = &params.inequality;
        let mut gains = Vec::new();
        let mut losses = Vec::new();
        for (p, n) in initial.occupations.iter().zip(&next.occupations) {
            let base = &dataset[p.id];
            if base.complementarity_score >= ineq.high_complementarity_threshold {
                gains.push((n.wage - p.wage).max(0.0));
            }
            if base.routine_score >= ineq.high_routine_threshold {
                losses.push((p.wage - n.wage).max(0.0));
            }
        }
        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
        let divergence = (mean(&gains) + mean(&losses)) / dataset.average_baseline_wage();
        assert!(divergence > 0.0);
        assert!((report.wage_divergence - divergence).abs() < 1e-12);

        let damp = 1.0 - sliders.transfers * ineq.transfers_damp;
        let increment = divergence * ineq.ai_inequality * damp
            + sliders.corporate_concentration * ineq.concentration_labor_share * damp;
        assert!((next.inequality_index - (initial.inequality_index + increment)).abs() < 1e-12);
        assert!(next.inequality_index - initial.inequality_index > 0.4 * 0.02 * damp);
    }

    #[test]
    fn most_displaced_ties_go_to_roster_order() {
        let dataset = OccupationDataset::from_records(
            vec![twin("clerks_a", "Clerks A"), twin("clerks_b", "Clerks B")],
            2_200_000.0,
        )
        .unwrap();
        let params = ModelParams::default();
        let sliders = SliderInputs::defaults(&params)
            .with(SliderKey::AiCapability, 0.9)
            .with(SliderKey::AdoptionSpeed, 1.0)
            .with(SliderKey::Regulation, 0.0);
        let initial = build_initial_state(&dataset, &params);

        let (_, report) = step_with_report(&initial, &dataset, &sliders, &params);
        assert_eq!(report.most_displaced, dataset.id_of("clerks_a"));
        assert!(
            report.events[0].starts_with("2026: Heavy automation wave: Clerks A down"),
            "{:?}",
            report.events
        );
    }

    #[test]
    fn no_losses_means_no_leader() {
        let dataset = OccupationDataset::builtin();
        let params = ModelParams::default();
        let sliders = SliderInputs::defaults(&params).with(SliderKey::AiCapability, 0.0);
        let initial = build_initial_state(&dataset, &params);

        let (next, report) = step_with_report(&initial, &dataset, &sliders, &params);
        assert_eq!(report.most_displaced, None);
        assert_eq!(report.top_wage_gain, None);
        assert_eq!(next.total_employment, initial.total_employment);
    }

    #[test]
    #[should_panic(expected = "not part of this dataset")]
    fn unknown_occupation_panics() {
        let dataset = OccupationDataset::builtin();
        let params = ModelParams::default();
        let sliders = SliderInputs::defaults(&params);
        let mut state = build_initial_state(&dataset, &params);
        state.occupations[0].id = OccupationId::default();
        step(&state, &dataset, &sliders, &params);
    }

    #[test]
    fn run_produces_one_state_per_year() {
        let dataset = OccupationDataset::builtin();
        let params = ModelParams::default();
        let sliders = SliderInputs::defaults(&params);
        let history = run_simulation(&dataset, &sliders, &params, 10);
        assert_eq!(history.len(), 11);
        for (i, s) in history.iter().enumerate() {
            assert_eq!(s.year, params.start_year + i as i32);
        }
        assert_eq!(run_simulation(&dataset, &sliders, &params, 0).len(), 1);
    }
}
