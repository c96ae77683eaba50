use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::occupations::OccupationDataset;
use crate::params::ModelParams;
use crate::types::{KeyToU64, OccupationId};

// ============================================================================
// Simulation State - One simulated year
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OccupationState {
    pub id: OccupationId,
    pub employment: f64,
    pub wage: f64,
}

/// A complete year of the simulation. States are values: the step reads one
/// and returns a new one, and a run keeps every year for rewinding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub year: i32,
    pub occupations: Vec<OccupationState>,
    pub total_employment: f64,
    pub unemployment_rate: f64,
    pub gdp_index: f64,
    /// Food-price or tech-layoff index, depending on the configured variant
    pub disruption_index: f64,
    pub inequality_index: f64,
    pub stability_index: f64,
    pub event_log: Vec<String>,
    /// Year-0 wage bill, carried so the GDP index never drifts
    pub(crate) base_gdp: f64,
}

/// Every year of a run, index `i` holding year `start_year + i`.
pub type History = Vec<SimulationState>;

impl SimulationState {
    pub fn base_gdp(&self) -> f64 {
        self.base_gdp
    }

    /// Entries are stored in roster order, so the lookup goes through the
    /// dataset's position index.
    pub fn occupation(
        &self,
        dataset: &OccupationDataset,
        id: OccupationId,
    ) -> Option<&OccupationState> {
        let entry = self.occupations.get(dataset.position(id)?)?;
        (entry.id == id).then_some(entry)
    }

    /// Events appended in this state's own year.
    pub fn events_this_year(&self) -> impl Iterator<Item = &str> {
        let prefix = format!("{}: ", self.year);
        self.event_log
            .iter()
            .filter(move |e| e.starts_with(&prefix))
            .map(String::as_str)
    }

    /// The last `n` events of the log, oldest first.
    pub fn recent_events(&self, n: usize) -> &[String] {
        let start = self.event_log.len().saturating_sub(n);
        &self.event_log[start..]
    }
}

/// Year-zero state: baseline employment and wages, neutral indices.
pub fn build_initial_state(dataset: &OccupationDataset, params: &ModelParams) -> SimulationState {
    let occupations: Vec<OccupationState> = dataset
        .iter()
        .map(|(id, o)| OccupationState {
            id,
            employment: o.employment,
            wage: o.mean_wage,
        })
        .collect();

    let total_employment = dataset.total_baseline_employment();
    let labor_force = params.labor_force_for(dataset);
    let unemployment_rate = (labor_force - total_employment) / labor_force;
    let year = params.start_year;

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "year",
        year = year as i64,
        total_employment = total_employment,
        unemployment_rate = unemployment_rate,
        gdp_index = 100.0,
        disruption_index = 1.0,
        inequality_index = 1.0,
        stability_index = 100.0,
        events = 1u64,
    );

    SimulationState {
        year,
        occupations,
        total_employment,
        unemployment_rate,
        gdp_index: 100.0,
        disruption_index: 1.0,
        inequality_index: 1.0,
        stability_index: 100.0,
        event_log: vec![format!(
            "{year}: Simulation initialized. Adjust sliders to begin."
        )],
        base_gdp: dataset.baseline_wage_bill(),
    }
}

// ============================================================================
// Snapshots - Render-ready views for the dashboard
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct OccupationSnapshot {
    pub id: u64,
    pub key: String,
    pub name: String,
    pub sector: String,
    pub baseline_employment: f64,
    pub employment: f64,
    /// Percent change from baseline headcount
    pub employment_change_pct: f64,
    pub baseline_wage: f64,
    pub wage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub year: i32,
    pub total_employment: f64,
    pub unemployment_rate: f64,
    pub gdp_index: f64,
    pub disruption_index: f64,
    pub disruption_label: String,
    pub inequality_index: f64,
    pub stability_index: f64,
    pub stability_label: String,
    pub event_log: Vec<String>,
    pub occupations: Vec<OccupationSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    pub start_year: i32,
    pub states: Vec<StateSnapshot>,
}

impl StateSnapshot {
    pub fn capture(
        state: &SimulationState,
        dataset: &OccupationDataset,
        params: &ModelParams,
    ) -> Self {
        let occupations = state
            .occupations
            .iter()
            .map(|o| {
                let base = &dataset[o.id];
                OccupationSnapshot {
                    id: o.id.to_u64(),
                    key: base.key.clone(),
                    name: base.name.clone(),
                    sector: base.sector.clone(),
                    baseline_employment: base.employment,
                    employment: o.employment,
                    employment_change_pct: (o.employment / base.employment - 1.0) * 100.0,
                    baseline_wage: base.mean_wage,
                    wage: o.wage,
                }
            })
            .collect();

        StateSnapshot {
            year: state.year,
            total_employment: state.total_employment,
            unemployment_rate: state.unemployment_rate,
            gdp_index: state.gdp_index,
            disruption_index: state.disruption_index,
            disruption_label: params.disruption.variant.index_name().to_string(),
            inequality_index: state.inequality_index,
            stability_index: state.stability_index,
            stability_label: crate::briefing::StabilityLabel::of(state.stability_index)
                .to_string(),
            event_log: state.event_log.clone(),
            occupations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_sits_at_baseline() {
        let dataset = OccupationDataset::builtin();
        let params = ModelParams::default();
        let state = build_initial_state(&dataset, &params);

        assert_eq!(state.year, 2025);
        assert_eq!(state.occupations.len(), dataset.len());
        for (occ, (id, base)) in state.occupations.iter().zip(dataset.iter()) {
            assert_eq!(occ.id, id);
            assert_eq!(occ.employment, base.employment);
            assert_eq!(occ.wage, base.mean_wage);
        }
        assert_eq!(state.gdp_index, 100.0);
        assert_eq!(state.disruption_index, 1.0);
        assert_eq!(state.inequality_index, 1.0);
        assert_eq!(state.stability_index, 100.0);
        assert!((state.unemployment_rate - 0.08).abs() < 1e-4);
        assert_eq!(
            state.event_log,
            vec!["2025: Simulation initialized. Adjust sliders to begin.".to_string()]
        );
        assert_eq!(state.base_gdp(), dataset.baseline_wage_bill());
    }

    #[test]
    fn labor_force_override_moves_baseline_unemployment() {
        let dataset = OccupationDataset::builtin();
        let params = ModelParams {
            labor_force: Some(dataset.total_baseline_employment() * 2.0),
            ..ModelParams::default()
        };
        let state = build_initial_state(&dataset, &params);
        assert!((state.unemployment_rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn occupation_lookup_uses_roster_position() {
        let dataset = OccupationDataset::builtin();
        let params = ModelParams::default();
        let state = build_initial_state(&dataset, &params);

        let nurses = dataset.id_of("registered_nurses").unwrap();
        let entry = state.occupation(&dataset, nurses).unwrap();
        assert_eq!(entry.id, nurses);
        assert_eq!(entry.wage, 85_000.0);

        assert_eq!(state.occupation(&dataset, OccupationId::default()), None);
        // A state not in roster order does not match
        let mut shuffled = state.clone();
        shuffled.occupations.swap(0, dataset.position(nurses).unwrap());
        assert_eq!(shuffled.occupation(&dataset, nurses), None);
    }

    #[test]
    fn snapshot_reports_change_from_baseline() {
        let dataset = OccupationDataset::builtin();
        let params = ModelParams::default();
        let mut state = build_initial_state(&dataset, &params);
        let cashiers = dataset.id_of("cashiers").unwrap();
        let idx = dataset.position(cashiers).unwrap();
        state.occupations[idx].employment = 3_300_000.0 * 0.9;

        let snap = StateSnapshot::capture(&state, &dataset, &params);
        let row = &snap.occupations[idx];
        assert_eq!(row.key, "cashiers");
        assert_eq!(row.id, cashiers.to_u64());
        assert!((row.employment_change_pct + 10.0).abs() < 1e-9);
        assert_eq!(snap.stability_label, "Stable");
        assert_eq!(snap.disruption_label, "Tech Layoff Index");
    }
}
