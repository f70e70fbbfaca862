//! Fertilizer requirement lookup.
//!
//! Source tables give compost in t/ha and nutrients in kg/ha. Everything
//! leaving this module is kg per ropani:
//! `kg_per_ropani = kg_per_ha * HA_TO_ROPANI`, and compost is first scaled
//! from tonnes to kilograms.

use serde::Serialize;
use tracing::trace;

use crate::{
    calendar::Region,
    error::UnitError,
    records::{ChemicalFertilizer, FertilizerRate},
    units::{self, Unit, HA_TO_ROPANI},
};

/// Which regions a fertilizer table row applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RegionScope {
    Only(Region),
    /// High and mid hills.
    Hills,
    All,
}

const SCOPE_LABELS: &[(&str, RegionScope)] = &[
    ("high hills", RegionScope::Only(Region::High)),
    ("high hill", RegionScope::Only(Region::High)),
    ("उच्च पहाड", RegionScope::Only(Region::High)),
    ("mid hills", RegionScope::Only(Region::Mid)),
    ("mid hill", RegionScope::Only(Region::Mid)),
    ("मध्य पहाड", RegionScope::Only(Region::Mid)),
    ("terai", RegionScope::Only(Region::Terai)),
    ("inner terai", RegionScope::Only(Region::Terai)),
    ("तराई", RegionScope::Only(Region::Terai)),
    ("hills", RegionScope::Hills),
    ("hill", RegionScope::Hills),
    ("पहाड", RegionScope::Hills),
    ("all", RegionScope::All),
    ("all regions", RegionScope::All),
    ("सबै", RegionScope::All),
];

impl RegionScope {
    /// Exact (case-insensitive) match against the known region labels.
    pub fn from_label(label: &str) -> Option<RegionScope> {
        let needle = label.trim().to_lowercase();
        SCOPE_LABELS
            .iter()
            .find(|(l, _)| *l == needle)
            .map(|&(_, scope)| scope)
    }

    pub fn covers(&self, region: Region) -> bool {
        match self {
            RegionScope::Only(r) => *r == region,
            RegionScope::Hills => matches!(region, Region::High | Region::Mid),
            RegionScope::All => true,
        }
    }
}

/// Fertilizer requirement in kilograms per ropani.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FertilizerQuantities {
    pub compost: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

impl FertilizerQuantities {
    pub const ZERO: FertilizerQuantities = FertilizerQuantities {
        compost: 0.0,
        nitrogen: 0.0,
        phosphorus: 0.0,
        potassium: 0.0,
    };

    /// Convert a per-hectare source rate (compost in t/ha, nutrients in kg/ha).
    pub fn from_rate(rate: &FertilizerRate) -> Self {
        FertilizerQuantities {
            compost: rate.compost_t_ha * 1000.0 * HA_TO_ROPANI,
            nitrogen: rate.nitrogen_kg_ha * HA_TO_ROPANI,
            phosphorus: rate.phosphorus_kg_ha * HA_TO_ROPANI,
            potassium: rate.potassium_kg_ha * HA_TO_ROPANI,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Totals for a field of `area` measured in `unit`.
    pub fn for_area(&self, area: f64, unit: Unit) -> Result<FertilizerQuantities, UnitError> {
        let ropani = units::convert(area, unit, Unit::Ropani)?;
        Ok(FertilizerQuantities {
            compost: self.compost * ropani,
            nitrogen: self.nitrogen * ropani,
            phosphorus: self.phosphorus * ropani,
            potassium: self.potassium * ropani,
        })
    }
}

/// Outcome of a fertilizer lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "match", content = "quantities", rename_all = "lowercase")]
pub enum FertilizerMatch {
    /// Crop name matched exactly in a row covering the region.
    Exact(FertilizerQuantities),
    /// Best effort: partial name match, or a row from another region.
    Fallback(FertilizerQuantities),
    NoMatch,
}

impl FertilizerMatch {
    pub fn quantities(&self) -> FertilizerQuantities {
        match self {
            FertilizerMatch::Exact(q) | FertilizerMatch::Fallback(q) => *q,
            FertilizerMatch::NoMatch => FertilizerQuantities::ZERO,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, FertilizerMatch::Exact(_))
    }
}

/// Per-family regional tables (rice, maize, wheat) plus other crops and vegetables.
#[derive(Debug, Clone, Default)]
pub struct FertilizerTables {
    pub family: Vec<FertilizerRate>,
    pub other: Vec<FertilizerRate>,
}

fn name_equals(rate: &FertilizerRate, crop: &str) -> bool {
    rate.crop.trim().to_lowercase() == crop
}

fn name_overlaps(rate: &FertilizerRate, crop: &str) -> bool {
    let pattern = rate.crop.trim().to_lowercase();
    !pattern.is_empty() && (pattern.contains(crop) || crop.contains(&pattern))
}

fn average(rates: &[&FertilizerRate]) -> FertilizerQuantities {
    let n = rates.len() as f64;
    let mean = |f: fn(&FertilizerRate) -> f64| rates.iter().map(|r| f(r)).sum::<f64>() / n;
    FertilizerQuantities::from_rate(&FertilizerRate {
        crop: String::new(),
        scope: RegionScope::All,
        compost_t_ha: mean(|r| r.compost_t_ha),
        nitrogen_kg_ha: mean(|r| r.nitrogen_kg_ha),
        phosphorus_kg_ha: mean(|r| r.phosphorus_kg_ha),
        potassium_kg_ha: mean(|r| r.potassium_kg_ha),
    })
}

impl FertilizerTables {
    /// Ordered match rules, first hit wins:
    /// 1. exact name in a row covering `region` (family tables averaged, then other crops),
    /// 2. substring name in a row covering `region` (same order),
    /// 3. first substring match in any region (other crops, then family tables).
    pub fn lookup(&self, crop: &str, region: Region) -> FertilizerMatch {
        let crop = crop.trim().to_lowercase();
        if crop.is_empty() {
            return FertilizerMatch::NoMatch;
        }

        for (exact, matcher) in [
            (true, name_equals as fn(&FertilizerRate, &str) -> bool),
            (false, name_overlaps),
        ] {
            let family: Vec<&FertilizerRate> = self
                .family
                .iter()
                .filter(|r| r.scope.covers(region) && matcher(r, &crop))
                .collect();
            let hit = if !family.is_empty() {
                Some(average(&family))
            } else {
                self.other
                    .iter()
                    .find(|r| r.scope.covers(region) && matcher(r, &crop))
                    .map(FertilizerQuantities::from_rate)
            };
            if let Some(q) = hit {
                trace!(crop = %crop, ?region, exact, "fertilizer rate matched");
                return if exact {
                    FertilizerMatch::Exact(q)
                } else {
                    FertilizerMatch::Fallback(q)
                };
            }
        }

        self.other
            .iter()
            .chain(self.family.iter())
            .find(|r| name_overlaps(r, &crop))
            .map(|r| FertilizerMatch::Fallback(FertilizerQuantities::from_rate(r)))
            .unwrap_or(FertilizerMatch::NoMatch)
    }
}

/// Mass of one commercial product needed to supply a requirement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductAmount {
    pub name: String,
    pub kg: f64,
}

/// Translate a nutrient requirement into commercial products.
///
/// Products are told apart by their nutrient profile: a N+P product (DAP)
/// covers phosphorus first, falling back to a P-only product; a N-only product
/// (Urea) covers the nitrogen still missing; a K-only product (MoP) covers
/// potassium. Requirements no product can cover are left out.
pub fn products_for(
    need: &FertilizerQuantities,
    products: &[ChemicalFertilizer],
) -> Vec<ProductAmount> {
    let mut out = Vec::new();
    let mut nitrogen_left = need.nitrogen;

    let phosphate = products
        .iter()
        .find(|p| p.phosphorus_pct > 0.0 && p.nitrogen_pct > 0.0 && p.potassium_pct == 0.0)
        .or_else(|| {
            products
                .iter()
                .find(|p| p.phosphorus_pct > 0.0 && p.nitrogen_pct == 0.0 && p.potassium_pct == 0.0)
        });
    if let Some(p) = phosphate.filter(|_| need.phosphorus > 0.0) {
        let kg = need.phosphorus / (p.phosphorus_pct / 100.0);
        nitrogen_left -= kg * p.nitrogen_pct / 100.0;
        out.push(ProductAmount {
            name: p.name.clone(),
            kg,
        });
    }

    let nitrogen = products
        .iter()
        .find(|p| p.nitrogen_pct > 0.0 && p.phosphorus_pct == 0.0 && p.potassium_pct == 0.0);
    if let Some(p) = nitrogen.filter(|_| nitrogen_left > 0.0) {
        out.push(ProductAmount {
            name: p.name.clone(),
            kg: nitrogen_left / (p.nitrogen_pct / 100.0),
        });
    }

    let potash = products
        .iter()
        .find(|p| p.potassium_pct > 0.0 && p.nitrogen_pct == 0.0 && p.phosphorus_pct == 0.0);
    if let Some(p) = potash.filter(|_| need.potassium > 0.0) {
        out.push(ProductAmount {
            name: p.name.clone(),
            kg: need.potassium / (p.potassium_pct / 100.0),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rate(crop: &str, scope: RegionScope, c: f64, n: f64, p: f64, k: f64) -> FertilizerRate {
        FertilizerRate {
            crop: crop.to_string(),
            scope,
            compost_t_ha: c,
            nitrogen_kg_ha: n,
            phosphorus_kg_ha: p,
            potassium_kg_ha: k,
        }
    }

    fn tables() -> FertilizerTables {
        FertilizerTables {
            family: vec![
                rate("Rice", RegionScope::Only(Region::Terai), 6.0, 100.0, 30.0, 30.0),
                rate("Rice", RegionScope::Hills, 6.0, 80.0, 30.0, 30.0),
                rate("Hybrid Rice", RegionScope::Only(Region::Terai), 6.0, 120.0, 60.0, 40.0),
            ],
            other: vec![
                rate("Cauliflower", RegionScope::Only(Region::Mid), 20.0, 120.0, 80.0, 60.0),
                rate("Cauliflower", RegionScope::Only(Region::Terai), 20.0, 150.0, 90.0, 60.0),
                rate("Green Pea", RegionScope::All, 15.0, 30.0, 60.0, 40.0),
            ],
        }
    }

    #[test]
    fn test_conversion_to_kg_per_ropani() {
        let q = FertilizerQuantities::from_rate(&rate("x", RegionScope::All, 6.0, 100.0, 30.0, 0.0));
        assert_eq!(q.compost, 6.0 * 1000.0 * HA_TO_ROPANI);
        assert_eq!(q.nitrogen, 100.0 * HA_TO_ROPANI);
        assert_eq!(q.phosphorus, 30.0 * HA_TO_ROPANI);
        assert_eq!(q.potassium, 0.0);
    }

    #[test]
    fn test_exact_match_in_region() {
        let m = tables().lookup("rice", Region::Mid);
        assert!(m.is_exact());
        assert_eq!(m.quantities().nitrogen, 80.0 * HA_TO_ROPANI);
    }

    #[test]
    fn test_substring_matches_are_averaged() {
        // "ric" overlaps both Terai rice rows
        let m = tables().lookup("ric", Region::Terai);
        let q = m.quantities();
        assert!(matches!(m, FertilizerMatch::Fallback(_)));
        assert_relative_eq!(q.nitrogen, 110.0 * HA_TO_ROPANI, max_relative = 1e-12);
        assert_relative_eq!(q.phosphorus, 45.0 * HA_TO_ROPANI, max_relative = 1e-12);
    }

    #[test]
    fn test_other_crops_prefer_region() {
        let m = tables().lookup("Cauliflower", Region::Terai);
        assert!(m.is_exact());
        assert_eq!(m.quantities().nitrogen, 150.0 * HA_TO_ROPANI);
    }

    #[test]
    fn test_other_crops_fall_back_to_first_match() {
        let m = tables().lookup("Cauliflower", Region::High);
        assert_eq!(
            m,
            FertilizerMatch::Fallback(FertilizerQuantities::from_rate(&tables().other[0]))
        );

        let pea = tables().lookup("Pea", Region::Terai);
        assert!(matches!(pea, FertilizerMatch::Fallback(_)));
    }

    #[test]
    fn test_no_match_is_all_zero() {
        for crop in ["Dragon Fruit", "", "   "] {
            let m = tables().lookup(crop, Region::Mid);
            assert_eq!(m, FertilizerMatch::NoMatch);
            assert_eq!(
                m.quantities(),
                FertilizerQuantities {
                    compost: 0.0,
                    nitrogen: 0.0,
                    phosphorus: 0.0,
                    potassium: 0.0
                }
            );
        }
    }

    #[test]
    fn test_scope_labels() {
        assert_eq!(RegionScope::from_label("Mid Hills"), Some(RegionScope::Only(Region::Mid)));
        assert_eq!(RegionScope::from_label(" hills "), Some(RegionScope::Hills));
        assert_eq!(RegionScope::from_label("Mid-west"), None);
        assert!(RegionScope::Hills.covers(Region::High));
        assert!(!RegionScope::Hills.covers(Region::Terai));
    }

    #[test]
    fn test_for_area() {
        let per_ropani = FertilizerQuantities {
            compost: 100.0,
            nitrogen: 5.0,
            phosphorus: 2.0,
            potassium: 1.0,
        };
        let total = per_ropani.for_area(16.0, Unit::Aana).unwrap();
        assert_relative_eq!(total.nitrogen, 5.0, max_relative = 1e-12);
        assert!(per_ropani.for_area(1.0, Unit::Pathi).is_err());
    }

    #[test]
    fn test_products_for() {
        let products = vec![
            ChemicalFertilizer {
                name: "Urea".into(),
                nitrogen_pct: 46.0,
                phosphorus_pct: 0.0,
                potassium_pct: 0.0,
            },
            ChemicalFertilizer {
                name: "DAP".into(),
                nitrogen_pct: 18.0,
                phosphorus_pct: 46.0,
                potassium_pct: 0.0,
            },
            ChemicalFertilizer {
                name: "Muriate of Potash".into(),
                nitrogen_pct: 0.0,
                phosphorus_pct: 0.0,
                potassium_pct: 60.0,
            },
        ];
        let need = FertilizerQuantities {
            compost: 0.0,
            nitrogen: 10.0,
            phosphorus: 4.6,
            potassium: 3.0,
        };
        let out = products_for(&need, &products);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].name, "DAP");
        assert_relative_eq!(out[0].kg, 10.0, max_relative = 1e-12);
        // DAP brought 1.8 kg N, Urea covers the remaining 8.2 kg
        assert_eq!(out[1].name, "Urea");
        assert_relative_eq!(out[1].kg, 8.2 / 0.46, max_relative = 1e-12);
        assert_eq!(out[2].name, "Muriate of Potash");
        assert_relative_eq!(out[2].kg, 5.0, max_relative = 1e-12);

        assert!(products_for(&FertilizerQuantities::ZERO, &products).is_empty());
    }
}
