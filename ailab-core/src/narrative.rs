// Narrative events: a pure function of one step's inputs and results.
//
// Checks run in a fixed priority order and each appends at most one line.
// When nothing fires, a "stable year" line is picked by year offset, so the
// log grows every year and identical inputs always produce identical text.

use crate::occupations::Occupation;
use crate::params::ModelParams;
use crate::sliders::SliderInputs;
use crate::types::DisruptionVariant;

/// The occupation that shed the most workers this year.
#[derive(Debug, Clone, Copy)]
pub struct JobLossLeader<'a> {
    pub occupation: &'a Occupation,
    pub employment: f64,
}

impl JobLossLeader<'_> {
    /// Percent decline from baseline headcount
    pub fn decline_from_baseline_pct(&self) -> f64 {
        (1.0 - self.employment / self.occupation.employment) * 100.0
    }
}

/// The occupation with the largest absolute wage gain this year.
#[derive(Debug, Clone, Copy)]
pub struct WageGainLeader<'a> {
    pub occupation: &'a Occupation,
    pub previous_wage: f64,
    pub wage: f64,
}

impl WageGainLeader<'_> {
    pub fn gain_pct(&self) -> f64 {
        (self.wage / self.previous_wage - 1.0) * 100.0
    }
}

/// Everything the narrative checks look at for one year.
#[derive(Debug, Clone, Copy)]
pub struct YearFacts<'a> {
    pub year: i32,
    pub sliders: &'a SliderInputs,
    pub effective_adoption: f64,
    pub shortfall: f64,
    pub unemployment_rate: f64,
    pub inequality_index: f64,
    pub stability_index: f64,
    pub gdp_index: f64,
    pub job_loss_leader: Option<JobLossLeader<'a>>,
    pub wage_gain_leader: Option<WageGainLeader<'a>>,
}

const STABLE_YEAR_MESSAGES: [&str; 3] = [
    "Economy holding steady. Conditions stable across all indicators.",
    "No major disruptions this year. Gradual AI integration continuing.",
    "Moderate conditions. Employment and prices within normal range.",
];

pub fn generate_events(facts: &YearFacts<'_>, params: &ModelParams) -> Vec<String> {
    let t = &params.narrative;
    let s = facts.sliders;
    let variant = params.disruption.variant;
    let mut lines: Vec<String> = Vec::new();

    // Automation
    if s.ai_capability > t.automation_capability && facts.effective_adoption > t.automation_adoption {
        let leader = facts.job_loss_leader;
        let name = leader.map_or("Routine workers", |l| l.occupation.name.as_str());
        if s.ai_capability > t.heavy_capability {
            match leader {
                Some(l) => lines.push(format!(
                    "Heavy automation wave: {} down {:.1}% from baseline.",
                    name,
                    l.decline_from_baseline_pct()
                )),
                None => lines.push("Heavy automation wave across routine occupations.".into()),
            }
        } else if s.ai_capability > t.accelerating_capability {
            lines.push(format!(
                "AI adoption accelerating; {name} seeing notable job displacement."
            ));
        } else {
            lines.push(format!(
                "{name} employment declining as AI handles routine tasks."
            ));
        }
    }

    // Wage gains for complementary roles
    if s.ai_capability > t.wage_capability {
        let leader = facts.wage_gain_leader;
        let name = leader.map_or("high-skill workers", |l| l.occupation.name.as_str());
        match leader {
            Some(l) if s.ai_capability > t.strong_wage_capability => lines.push(format!(
                "Skilled workers thriving: {} wages up {:.1}% this year from AI leverage.",
                name,
                l.gain_pct()
            )),
            _ => lines.push(format!(
                "Wages rising for {name} as AI tools boost productivity."
            )),
        }
    }

    // Sensitive-subset shortfall
    let category = variant.category().label();
    let shortfall_pct = facts.shortfall * 100.0;
    if facts.shortfall > t.shortfall_severe {
        lines.push(format!(
            "Severe {category} shortfall ({shortfall_pct:.0}% below baseline) pushing {} higher.",
            variant.pressure()
        ));
    } else if facts.shortfall > t.shortfall_moderate {
        lines.push(format!(
            "{} rising: {category} workforce down {shortfall_pct:.0}% from baseline.",
            capitalize(variant.pressure())
        ));
    }

    // Exogenous shock
    let shock = s.external_shock;
    let pass_through_pct = shock * params.disruption.shock_pass_through * 100.0;
    if shock > t.shock_high {
        lines.push(shock_spike(variant, shock * 100.0, pass_through_pct));
    } else if shock > t.shock_elevated {
        lines.push(shock_pressure(variant, pass_through_pct));
    } else if shock < t.shock_falling {
        lines.push(shock_easing(variant).to_string());
    }

    // Unemployment
    let u_pct = facts.unemployment_rate * 100.0;
    if facts.unemployment_rate > t.unemployment_crisis {
        lines.push(format!("Unemployment crisis: {u_pct:.1}% of workforce displaced."));
    } else if facts.unemployment_rate > t.unemployment_surging {
        lines.push(format!(
            "Unemployment surging to {u_pct:.1}%, straining social systems."
        ));
    } else if facts.unemployment_rate > t.unemployment_elevated {
        lines.push(format!(
            "Unemployment elevated at {u_pct:.1}%, above structural baseline."
        ));
    }

    // Inequality
    let ineq = facts.inequality_index;
    if ineq > t.inequality_severe {
        lines.push(format!(
            "Severe inequality (index {ineq:.2}): top earners capturing most AI gains."
        ));
    } else if ineq > t.inequality_rising {
        lines.push(format!(
            "Inequality rising ({ineq:.2}). Corporate concentration amplifying wage gap."
        ));
    }

    // Policy levers
    if s.regulation > t.regulation_strong {
        lines.push("Strong AI regulation constraining adoption rate this year.".into());
    } else if s.regulation > t.regulation_friction {
        lines.push("Regulatory friction slowing AI deployment across sectors.".into());
    }
    if s.retraining > t.retraining_active && s.ai_capability > t.retraining_capability {
        lines.push("Active retraining programs cushioning displacement for some workers.".into());
    }
    if s.transfers > t.transfers_active {
        lines.push("Social transfers helping stabilize household incomes amid disruption.".into());
    }

    // Stability
    let stab = facts.stability_index;
    if stab < t.stability_critical {
        lines.push(format!("CRITICAL: Social stability collapsing ({stab:.0}/100)."));
    } else if stab < t.stability_warning {
        lines.push(format!(
            "WARNING: Social stability critically low ({stab:.0}/100)."
        ));
    } else if stab < t.stability_stress {
        lines.push(format!("Social stability under stress ({stab:.0}/100)."));
    }

    // GDP
    let gdp = facts.gdp_index;
    if gdp > t.gdp_surging {
        lines.push(format!(
            "GDP index surging to {gdp:.1}: productivity gains outpacing displacement."
        ));
    } else if gdp < t.gdp_contracting {
        lines.push(format!(
            "GDP index falling to {gdp:.1}: output contracting as jobs disappear."
        ));
    }

    if lines.is_empty() {
        let offset = (facts.year - params.start_year).rem_euclid(STABLE_YEAR_MESSAGES.len() as i32);
        lines.push(STABLE_YEAR_MESSAGES[offset as usize].to_string());
    }

    lines
        .into_iter()
        .map(|line| format!("{}: {}", facts.year, line))
        .collect()
}

fn shock_spike(variant: DisruptionVariant, shock_pct: f64, pass_through_pct: f64) -> String {
    match variant {
        DisruptionVariant::FoodPrice => format!(
            "Energy cost spike (+{shock_pct:.0}%) adding {pass_through_pct:.1}% to food prices."
        ),
        DisruptionVariant::TechLayoff => format!(
            "Open-source AI surge (+{shock_pct:.0}%) adding {pass_through_pct:.1}% to tech layoffs."
        ),
    }
}

fn shock_pressure(variant: DisruptionVariant, pass_through_pct: f64) -> String {
    match variant {
        DisruptionVariant::FoodPrice => format!(
            "Energy cost pressure passed through to food prices (+{pass_through_pct:.1}%)."
        ),
        DisruptionVariant::TechLayoff => format!(
            "Open-source model releases adding to tech layoff pressure (+{pass_through_pct:.1}%)."
        ),
    }
}

fn shock_easing(variant: DisruptionVariant) -> &'static str {
    match variant {
        DisruptionVariant::FoodPrice => "Falling energy costs easing food price pressure.",
        DisruptionVariant::TechLayoff => {
            "Restricted open-source AI access easing tech layoff pressure."
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupations::OccupationDataset;
    use crate::types::SliderKey;

    fn calm_sliders(params: &ModelParams) -> SliderInputs {
        SliderInputs::defaults(params)
            .with(SliderKey::AiCapability, 0.1)
            .with(SliderKey::Transfers, 0.0)
            .with(SliderKey::Regulation, 0.0)
    }

    fn calm_facts<'a>(year: i32, sliders: &'a SliderInputs) -> YearFacts<'a> {
        YearFacts {
            year,
            sliders,
            effective_adoption: 0.1,
            shortfall: 0.0,
            unemployment_rate: 0.08,
            inequality_index: 1.0,
            stability_index: 90.0,
            gdp_index: 100.0,
            job_loss_leader: None,
            wage_gain_leader: None,
        }
    }

    #[test]
    fn quiet_years_cycle_through_stable_messages() {
        let params = ModelParams::default();
        let sliders = calm_sliders(&params);
        let years: Vec<String> = (2026..=2029)
            .map(|y| generate_events(&calm_facts(y, &sliders), &params).remove(0))
            .collect();

        assert_eq!(
            years[0],
            "2026: No major disruptions this year. Gradual AI integration continuing."
        );
        assert!(years[1].starts_with("2027: Moderate conditions."));
        assert!(years[2].starts_with("2028: Economy holding steady."));
        assert!(years[3].starts_with("2029: No major disruptions"));
    }

    #[test]
    fn heavy_automation_names_the_biggest_loser() {
        let params = ModelParams::default();
        let dataset = OccupationDataset::builtin();
        let cashiers = &dataset[dataset.id_of("cashiers").unwrap()];
        let sliders = calm_sliders(&params).with(SliderKey::AiCapability, 0.9);
        let facts = YearFacts {
            effective_adoption: 0.5,
            job_loss_leader: Some(JobLossLeader {
                occupation: cashiers,
                employment: cashiers.employment * 0.8,
            }),
            ..calm_facts(2027, &sliders)
        };
        let events = generate_events(&facts, &params);
        assert_eq!(
            events[0],
            "2027: Heavy automation wave: Cashiers down 20.0% from baseline."
        );
        // ai > 0.4 also reports wage movement
        assert!(events[1].contains("high-skill workers"));
    }

    #[test]
    fn strong_wage_gains_name_the_leader() {
        let params = ModelParams::default();
        let dataset = OccupationDataset::builtin();
        let ml = &dataset[dataset.id_of("ml_engineers").unwrap()];
        let sliders = calm_sliders(&params).with(SliderKey::AiCapability, 0.8);
        let facts = YearFacts {
            wage_gain_leader: Some(WageGainLeader {
                occupation: ml,
                previous_wage: 100_000.0,
                wage: 102_500.0,
            }),
            ..calm_facts(2026, &sliders)
        };
        assert_eq!(
            generate_events(&facts, &params),
            vec![
                "2026: Skilled workers thriving: ML & AI Engineers wages up 2.5% this year from AI leverage."
                    .to_string()
            ]
        );

        // Below the strong threshold the leader is still named
        let moderate = sliders.with(SliderKey::AiCapability, 0.6);
        let facts = YearFacts {
            sliders: &moderate,
            ..facts
        };
        assert_eq!(
            generate_events(&facts, &params),
            vec!["2026: Wages rising for ML & AI Engineers as AI tools boost productivity.".to_string()]
        );
    }

    #[test]
    fn automation_wording_follows_capability() {
        let params = ModelParams::default();
        let dataset = OccupationDataset::builtin();
        let clerks = &dataset[dataset.id_of("office_clerks").unwrap()];
        let leader = Some(JobLossLeader {
            occupation: clerks,
            employment: clerks.employment * 0.9,
        });

        let accelerating = calm_sliders(&params).with(SliderKey::AiCapability, 0.6);
        let facts = YearFacts {
            effective_adoption: 0.4,
            job_loss_leader: leader,
            ..calm_facts(2027, &accelerating)
        };
        assert_eq!(
            generate_events(&facts, &params)[0],
            "2027: AI adoption accelerating; General Office Clerks seeing notable job displacement."
        );

        let routine = calm_sliders(&params).with(SliderKey::AiCapability, 0.35);
        let facts = YearFacts {
            sliders: &routine,
            ..facts
        };
        assert_eq!(
            generate_events(&facts, &params),
            vec!["2027: General Office Clerks employment declining as AI handles routine tasks.".to_string()]
        );
    }

    #[test]
    fn thresholds_fire_in_priority_order() {
        let params = ModelParams::default();
        let sliders = calm_sliders(&params)
            .with(SliderKey::ExternalShock, 0.3)
            .with(SliderKey::Regulation, 0.8)
            .with(SliderKey::Transfers, 0.9);
        let facts = YearFacts {
            shortfall: 0.2,
            unemployment_rate: 0.25,
            inequality_index: 2.5,
            stability_index: 20.0,
            gdp_index: 70.0,
            ..calm_facts(2030, &sliders)
        };
        let events = generate_events(&facts, &params);
        let expected_prefixes = [
            "2030: Severe infrastructure shortfall (20% below baseline) pushing tech layoffs higher.",
            "2030: Open-source AI surge (+30%) adding 3.0% to tech layoffs.",
            "2030: Unemployment crisis: 25.0% of workforce displaced.",
            "2030: Severe inequality (index 2.50)",
            "2030: Strong AI regulation",
            "2030: Social transfers helping",
            "2030: CRITICAL: Social stability collapsing (20/100).",
            "2030: GDP index falling to 70.0",
        ];
        assert_eq!(events.len(), expected_prefixes.len(), "{events:#?}");
        for (event, prefix) in events.iter().zip(expected_prefixes) {
            assert!(event.starts_with(prefix), "{event} !~ {prefix}");
        }
    }

    #[test]
    fn food_price_variant_wording() {
        let params = ModelParams::for_variant(DisruptionVariant::FoodPrice);
        let sliders = calm_sliders(&params).with(SliderKey::ExternalShock, -0.3);
        let facts = YearFacts {
            shortfall: 0.08,
            ..calm_facts(2028, &sliders)
        };
        let events = generate_events(&facts, &params);
        assert_eq!(
            events,
            vec![
                "2028: Food prices rising: logistics workforce down 8% from baseline.".to_string(),
                "2028: Falling energy costs easing food price pressure.".to_string(),
            ]
        );
    }
}
