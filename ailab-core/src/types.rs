use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use tsify_next::Tsify;

// ============================================================================
// IDs - Using slotmap for generational indices
// ============================================================================

new_key_type! {
    pub struct OccupationId;
}

/// Trait for converting SlotMap keys to u64 for WASM boundary
pub trait KeyToU64 {
    fn to_u64(self) -> u64;
}

impl KeyToU64 for OccupationId {
    fn to_u64(self) -> u64 {
        self.0.as_ffi()
    }
}

// ============================================================================
// Bounds - Declared [min, max] range of a derived index
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Like `f64::clamp`, but does not panic when `min > max`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

// ============================================================================
// Sliders - The policy levers exposed to the dashboard
// ============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum SliderKey {
    AiCapability,
    AdoptionSpeed,
    Regulation,
    Retraining,
    Transfers,
    LaborProtection,
    CorporateConcentration,
    // Energy cost (food-price variant) or open-source access (tech-layoff variant)
    #[serde(alias = "energyCost", alias = "openSourceAccess")]
    ExternalShock,
    // Supply-chain resilience or talent-pipeline strength
    #[serde(alias = "supplyChainResilience", alias = "talentPipelineStrength")]
    Resilience,
}

impl SliderKey {
    pub const ALL: [SliderKey; 9] = [
        SliderKey::AiCapability,
        SliderKey::AdoptionSpeed,
        SliderKey::Regulation,
        SliderKey::Retraining,
        SliderKey::Transfers,
        SliderKey::LaborProtection,
        SliderKey::CorporateConcentration,
        SliderKey::ExternalShock,
        SliderKey::Resilience,
    ];

    /// Returns an iterator over all slider keys in display order
    pub fn all() -> impl Iterator<Item = SliderKey> {
        Self::ALL.into_iter()
    }

    /// Canonical camelCase name, as used in JSON documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            SliderKey::AiCapability => "aiCapability",
            SliderKey::AdoptionSpeed => "adoptionSpeed",
            SliderKey::Regulation => "regulation",
            SliderKey::Retraining => "retraining",
            SliderKey::Transfers => "transfers",
            SliderKey::LaborProtection => "laborProtection",
            SliderKey::CorporateConcentration => "corporateConcentration",
            SliderKey::ExternalShock => "externalShock",
            SliderKey::Resilience => "resilience",
        }
    }

    /// Parse a canonical name or one of the variant-specific aliases.
    pub fn parse(name: &str) -> Option<SliderKey> {
        let key = match name {
            "aiCapability" => SliderKey::AiCapability,
            "adoptionSpeed" => SliderKey::AdoptionSpeed,
            "regulation" => SliderKey::Regulation,
            "retraining" => SliderKey::Retraining,
            "transfers" => SliderKey::Transfers,
            "laborProtection" => SliderKey::LaborProtection,
            "corporateConcentration" => SliderKey::CorporateConcentration,
            "externalShock" | "energyCost" | "openSourceAccess" => SliderKey::ExternalShock,
            "resilience" | "supplyChainResilience" | "talentPipelineStrength" => {
                SliderKey::Resilience
            }
            _ => return None,
        };
        Some(key)
    }
}

impl std::fmt::Display for SliderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Disruption variants - Which sensitive subset and index the model tracks
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum DisruptionCategory {
    Logistics,
    Infrastructure,
}

impl DisruptionCategory {
    pub fn label(&self) -> &'static str {
        match self {
            DisruptionCategory::Logistics => "logistics",
            DisruptionCategory::Infrastructure => "infrastructure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum DisruptionVariant {
    /// Logistics shortfall feeding a food-price index; shock is energy cost.
    FoodPrice,
    /// Infrastructure shortfall feeding a tech-layoff index; shock is open-source AI access.
    #[default]
    TechLayoff,
}

impl DisruptionVariant {
    pub fn category(&self) -> DisruptionCategory {
        match self {
            DisruptionVariant::FoodPrice => DisruptionCategory::Logistics,
            DisruptionVariant::TechLayoff => DisruptionCategory::Infrastructure,
        }
    }

    pub fn index_name(&self) -> &'static str {
        match self {
            DisruptionVariant::FoodPrice => "Food Price Index",
            DisruptionVariant::TechLayoff => "Tech Layoff Index",
        }
    }

    /// What a rising index means, in narrative wording.
    pub fn pressure(&self) -> &'static str {
        match self {
            DisruptionVariant::FoodPrice => "food prices",
            DisruptionVariant::TechLayoff => "tech layoffs",
        }
    }

    pub fn shock_name(&self) -> &'static str {
        match self {
            DisruptionVariant::FoodPrice => "Energy Cost Shock",
            DisruptionVariant::TechLayoff => "Open-Source AI Access",
        }
    }

    pub fn resilience_name(&self) -> &'static str {
        match self {
            DisruptionVariant::FoodPrice => "Supply Chain Resilience",
            DisruptionVariant::TechLayoff => "Talent Pipeline Strength",
        }
    }

    /// Variant-specific JSON key for the shock slider.
    pub fn shock_key(&self) -> &'static str {
        match self {
            DisruptionVariant::FoodPrice => "energyCost",
            DisruptionVariant::TechLayoff => "openSourceAccess",
        }
    }

    /// Variant-specific JSON key for the resilience slider.
    pub fn resilience_key(&self) -> &'static str {
        match self {
            DisruptionVariant::FoodPrice => "supplyChainResilience",
            DisruptionVariant::TechLayoff => "talentPipelineStrength",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_aliases_resolve_to_shared_keys() {
        assert_eq!(SliderKey::parse("energyCost"), Some(SliderKey::ExternalShock));
        assert_eq!(SliderKey::parse("openSourceAccess"), Some(SliderKey::ExternalShock));
        assert_eq!(
            SliderKey::parse("talentPipelineStrength"),
            Some(SliderKey::Resilience)
        );
        assert_eq!(SliderKey::parse("warpDrive"), None);

        let key: SliderKey = serde_json::from_str("\"supplyChainResilience\"").unwrap();
        assert_eq!(key, SliderKey::Resilience);
    }

    #[test]
    fn canonical_names_round_trip_through_parse() {
        for key in SliderKey::all() {
            assert_eq!(SliderKey::parse(key.as_str()), Some(key));
        }
    }

    #[test]
    fn bounds_clamp_saturates() {
        let b = Bounds::new(0.5, 3.0);
        assert_eq!(b.clamp(10.0), 3.0);
        assert_eq!(b.clamp(0.1), 0.5);
        assert!(b.contains(1.0));
        assert!(!Bounds::new(2.0, 1.0).is_valid());
    }
}
