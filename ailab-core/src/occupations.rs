// Occupation roster: the static dataset every simulation runs against.
//
// Records are validated once when the dataset is built and then stored in a
// slotmap arena. States refer to occupations by `OccupationId`, so the step
// never searches the roster by string key.

use std::collections::HashMap;
use std::ops::Index;

use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};

use crate::error::ConfigError;
use crate::types::{DisruptionCategory, OccupationId};

/// Tracked employment is ~44.8M; this puts baseline unemployment near 8%.
pub const BASE_LABOR_FORCE: f64 = 48_744_565.0;

// ============================================================================
// Occupation - One tracked role with its structural scores
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occupation {
    #[serde(alias = "id")]
    pub key: String,
    pub name: String,
    /// Baseline headcount
    pub employment: f64,
    /// Baseline mean annual wage
    pub mean_wage: f64,
    pub routine_score: f64,
    pub analytical_score: f64,
    pub social_score: f64,
    pub manual_score: f64,
    /// How much AI amplifies this role rather than replacing it
    pub complementarity_score: f64,
    pub sector: String,
    #[serde(default, alias = "isLogistics")]
    pub logistics: bool,
    #[serde(default, alias = "isInfrastructure")]
    pub infrastructure: bool,
}

impl Occupation {
    pub fn in_category(&self, category: DisruptionCategory) -> bool {
        match category {
            DisruptionCategory::Logistics => self.logistics,
            DisruptionCategory::Infrastructure => self.infrastructure,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let scores = [
            ("routineScore", self.routine_score),
            ("analyticalScore", self.analytical_score),
            ("socialScore", self.social_score),
            ("manualScore", self.manual_score),
            ("complementarityScore", self.complementarity_score),
        ];
        for (field, value) in scores {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ScoreOutOfRange {
                    occupation: self.key.clone(),
                    field,
                    value,
                });
            }
        }
        for (field, value) in [("employment", self.employment), ("meanWage", self.mean_wage)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveBaseline {
                    occupation: self.key.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// OccupationDataset - Arena of validated occupations plus the labor force
// ============================================================================

#[derive(Debug, Clone)]
pub struct OccupationDataset {
    occupations: SlotMap<OccupationId, Occupation>,
    order: Vec<OccupationId>,
    positions: SecondaryMap<OccupationId, usize>,
    by_key: HashMap<String, OccupationId>,
    labor_force: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetDocument {
    labor_force: f64,
    occupations: Vec<Occupation>,
}

impl OccupationDataset {
    /// Validate records and build the arena. Roster order is preserved and
    /// drives every iteration in the engine.
    pub fn from_records(
        records: Vec<Occupation>,
        labor_force: f64,
    ) -> Result<Self, ConfigError> {
        if records.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }

        let mut occupations = SlotMap::with_capacity_and_key(records.len());
        let mut order = Vec::with_capacity(records.len());
        let mut positions = SecondaryMap::with_capacity(records.len());
        let mut by_key = HashMap::with_capacity(records.len());
        let mut employment = 0.0;

        for record in records {
            record.validate()?;
            if by_key.contains_key(&record.key) {
                return Err(ConfigError::DuplicateOccupation(record.key));
            }
            employment += record.employment;
            let key = record.key.clone();
            let id = occupations.insert(record);
            positions.insert(id, order.len());
            order.push(id);
            by_key.insert(key, id);
        }

        if !(labor_force.is_finite() && labor_force >= employment) {
            return Err(ConfigError::LaborForceTooSmall {
                labor_force,
                employment,
            });
        }

        Ok(Self {
            occupations,
            order,
            positions,
            by_key,
            labor_force,
        })
    }

    /// Parse `{ "laborForce": .., "occupations": [..] }`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let doc: DatasetDocument = serde_json::from_str(json)?;
        Self::from_records(doc.occupations, doc.labor_force)
    }

    /// The built-in roster of 25 US occupations.
    pub fn builtin() -> Self {
        Self::from_records(builtin_roster(), BASE_LABOR_FORCE)
            .unwrap_or_else(|e| panic!("built-in occupation roster is invalid: {e}"))
    }

    pub fn labor_force(&self) -> f64 {
        self.labor_force
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: OccupationId) -> Option<&Occupation> {
        self.occupations.get(id)
    }

    pub fn id_of(&self, key: &str) -> Option<OccupationId> {
        self.by_key.get(key).copied()
    }

    /// Roster order ids
    pub fn ids(&self) -> &[OccupationId] {
        &self.order
    }

    /// Index of `id` in roster order.
    pub fn position(&self, id: OccupationId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Iterate `(id, occupation)` in roster order.
    pub fn iter(&self) -> impl Iterator<Item = (OccupationId, &Occupation)> {
        self.order.iter().map(|&id| (id, &self.occupations[id]))
    }

    pub fn total_baseline_employment(&self) -> f64 {
        self.iter().map(|(_, o)| o.employment).sum()
    }

    pub fn baseline_wage_bill(&self) -> f64 {
        self.iter().map(|(_, o)| o.employment * o.mean_wage).sum()
    }

    /// Unweighted mean of baseline wages across the roster.
    pub fn average_baseline_wage(&self) -> f64 {
        self.iter().map(|(_, o)| o.mean_wage).sum::<f64>() / self.len() as f64
    }

    pub fn baseline_employment_in(&self, category: DisruptionCategory) -> f64 {
        self.iter()
            .filter(|(_, o)| o.in_category(category))
            .map(|(_, o)| o.employment)
            .sum()
    }
}

impl Index<OccupationId> for OccupationDataset {
    type Output = Occupation;

    /// Panics if the id does not belong to this dataset: a state built from
    /// one roster must never be stepped against another.
    fn index(&self, id: OccupationId) -> &Occupation {
        match self.occupations.get(id) {
            Some(occupation) => occupation,
            None => panic!("occupation {id:?} is not part of this dataset"),
        }
    }
}

// ============================================================================
// Built-in roster
// ============================================================================

/// Scores are `[routine, analytical, social, manual, complementarity]`.
#[allow(clippy::too_many_arguments)]
fn occupation(
    key: &str,
    name: &str,
    employment: f64,
    mean_wage: f64,
    scores: [f64; 5],
    sector: &str,
    logistics: bool,
    infrastructure: bool,
) -> Occupation {
    let [routine, analytical, social, manual, complementarity] = scores;
    Occupation {
        key: key.to_string(),
        name: name.to_string(),
        employment,
        mean_wage,
        routine_score: routine,
        analytical_score: analytical,
        social_score: social,
        manual_score: manual,
        complementarity_score: complementarity,
        sector: sector.to_string(),
        logistics,
        infrastructure,
    }
}

#[rustfmt::skip]
pub fn builtin_roster() -> Vec<Occupation> {
    vec![
        // Service, retail and logistics
        occupation("home_health_aides", "Home Health & Personal Care Aides", 4_000_000.0, 32_000.0, [0.4, 0.2, 0.9, 0.7, 0.3], "Healthcare", false, false),
        occupation("retail_sales", "Retail Salespersons", 3_700_000.0, 35_000.0, [0.7, 0.3, 0.6, 0.4, 0.2], "Retail", false, false),
        occupation("fast_food", "Fast Food & Counter Workers", 3_500_000.0, 28_000.0, [0.8, 0.2, 0.5, 0.6, 0.1], "Food", false, false),
        occupation("general_managers", "General & Operations Managers", 3_000_000.0, 110_000.0, [0.3, 0.8, 0.8, 0.1, 0.8], "Management", false, false),
        occupation("registered_nurses", "Registered Nurses", 3_100_000.0, 85_000.0, [0.2, 0.7, 0.9, 0.5, 0.8], "Healthcare", false, false),
        occupation("cashiers", "Cashiers", 3_300_000.0, 30_000.0, [0.9, 0.2, 0.5, 0.4, 0.1], "Retail", false, false),
        occupation("stockers", "Stockers & Order Fillers", 2_900_000.0, 34_000.0, [0.8, 0.3, 0.3, 0.8, 0.2], "Retail", true, false),
        occupation("office_clerks", "General Office Clerks", 2_800_000.0, 42_000.0, [0.85, 0.4, 0.4, 0.2, 0.3], "Administrative", false, false),
        occupation("customer_service", "Customer Service Representatives", 2_700_000.0, 39_000.0, [0.85, 0.4, 0.7, 0.1, 0.4], "Services", false, false),
        occupation("laborers", "Laborers & Freight Movers", 2_600_000.0, 36_000.0, [0.7, 0.2, 0.2, 0.9, 0.2], "Logistics", true, false),
        occupation("truck_drivers", "Heavy & Tractor-Trailer Truck Drivers", 2_200_000.0, 55_000.0, [0.55, 0.3, 0.2, 0.8, 0.3], "Logistics", true, false),
        occupation("teachers", "Elementary School Teachers", 2_000_000.0, 65_000.0, [0.4, 0.6, 0.9, 0.2, 0.6], "Education", false, false),
        occupation("software_dev", "Software Developers", 1_600_000.0, 120_000.0, [0.35, 0.95, 0.4, 0.1, 0.95], "Technology", false, false),
        occupation("janitors", "Janitors & Cleaners", 2_300_000.0, 31_000.0, [0.6, 0.2, 0.2, 0.9, 0.2], "Facilities", false, false),
        occupation("accountants", "Accountants & Auditors", 1_500_000.0, 78_000.0, [0.8, 0.85, 0.4, 0.1, 0.7], "Finance", false, false),
        // Tech and knowledge work
        occupation("it_support", "IT Support Specialists", 920_000.0, 62_000.0, [0.75, 0.55, 0.6, 0.2, 0.35], "Technology", false, true),
        occupation("data_scientists", "Data Scientists", 180_000.0, 108_000.0, [0.45, 0.95, 0.3, 0.05, 0.85], "Technology", false, false),
        occupation("cybersecurity", "Cybersecurity Analysts", 170_000.0, 120_000.0, [0.3, 0.9, 0.3, 0.05, 0.9], "Technology", false, true),
        occupation("technical_writers", "Technical Writers", 55_000.0, 80_000.0, [0.8, 0.6, 0.3, 0.05, 0.3], "Technology", false, false),
        occupation("data_entry", "Data Entry Keyers", 140_000.0, 38_000.0, [0.95, 0.15, 0.2, 0.1, 0.05], "Administrative", false, false),
        occupation("network_admins", "Network & Systems Admins", 350_000.0, 92_000.0, [0.55, 0.75, 0.3, 0.3, 0.6], "Technology", false, true),
        occupation("mgmt_analysts", "Management Analysts", 950_000.0, 99_000.0, [0.5, 0.85, 0.6, 0.05, 0.75], "Management", false, false),
        occupation("systems_analysts", "Computer Systems Analysts", 600_000.0, 103_000.0, [0.6, 0.85, 0.4, 0.05, 0.7], "Technology", false, true),
        occupation("ml_engineers", "ML & AI Engineers", 80_000.0, 145_000.0, [0.2, 0.98, 0.3, 0.05, 0.95], "Technology", false, false),
        occupation("graphic_designers", "Graphic Designers", 200_000.0, 58_000.0, [0.7, 0.6, 0.3, 0.3, 0.25], "Creative", false, false),
    ]
}
