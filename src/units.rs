//! Traditional Nepali measurement units and their metric equivalents.
//!
//! Every unit carries a factor to the metric base of its dimension (square
//! metres, litres or kilograms), so any two units of one dimension convert
//! through that base.

use serde::Serialize;
use std::{fmt, str::FromStr};

use crate::error::UnitError;

/// Kilograms per hectare → kilograms per ropani (one ropani in hectares).
pub const HA_TO_ROPANI: f64 = 0.0508737;

pub const ROPANI_SQ_M: f64 = 508.737;
pub const BIGHA_SQ_M: f64 = 6772.63;
pub const MANA_LITRES: f64 = 0.568_261_25;
pub const DHARNI_KG: f64 = 2.3918;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MetricBase {
    SquareMetre,
    Litre,
    Kilogram,
}

impl MetricBase {
    pub fn symbol(&self) -> &'static str {
        match self {
            MetricBase::SquareMetre => "m²",
            MetricBase::Litre => "L",
            MetricBase::Kilogram => "kg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Unit {
    // area
    SquareMetre,
    SquareFoot,
    Hectare,
    Acre,
    Ropani,
    Aana,
    Paisa,
    Daam,
    Bigha,
    Kattha,
    Dhur,
    // volume
    Litre,
    Millilitre,
    Mana,
    Pathi,
    Muri,
    // mass
    Kilogram,
    Gram,
    Quintal,
    Tonne,
    Dharni,
    Ser,
    Pau,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct UnitDefinition {
    pub unit: Unit,
    pub name: &'static str,
    #[serde(skip)]
    pub aliases: &'static [&'static str],
    pub to_metric_factor: f64,
    pub metric_unit: MetricBase,
}

const fn def(
    unit: Unit,
    name: &'static str,
    aliases: &'static [&'static str],
    to_metric_factor: f64,
    metric_unit: MetricBase,
) -> UnitDefinition {
    UnitDefinition {
        unit,
        name,
        aliases,
        to_metric_factor,
        metric_unit,
    }
}

use MetricBase::{Kilogram as KG, Litre as L, SquareMetre as M2};

pub static UNITS: &[UnitDefinition] = &[
    def(Unit::SquareMetre, "Square Metre", &["m2", "m²", "sqm", "sq m", "square meter", "वर्ग मिटर"], 1.0, M2),
    def(Unit::SquareFoot, "Square Foot", &["ft2", "sqft", "sq ft", "square feet", "वर्ग फिट"], 0.092_903_04, M2),
    def(Unit::Hectare, "Hectare", &["ha", "हेक्टर"], 10_000.0, M2),
    def(Unit::Acre, "Acre", &["ac", "एकर"], 4_046.856_422_4, M2),
    def(Unit::Ropani, "Ropani", &["रोपनी"], ROPANI_SQ_M, M2),
    def(Unit::Aana, "Aana", &["ana", "आना"], ROPANI_SQ_M / 16.0, M2),
    def(Unit::Paisa, "Paisa", &["पैसा"], ROPANI_SQ_M / 64.0, M2),
    def(Unit::Daam, "Daam", &["dam", "दाम"], ROPANI_SQ_M / 256.0, M2),
    def(Unit::Bigha, "Bigha", &["बिघा"], BIGHA_SQ_M, M2),
    def(Unit::Kattha, "Kattha", &["katha", "कठ्ठा"], BIGHA_SQ_M / 20.0, M2),
    def(Unit::Dhur, "Dhur", &["धुर"], BIGHA_SQ_M / 400.0, M2),
    def(Unit::Litre, "Litre", &["l", "liter", "लिटर"], 1.0, L),
    def(Unit::Millilitre, "Millilitre", &["ml", "milliliter"], 0.001, L),
    def(Unit::Mana, "Mana", &["माना"], MANA_LITRES, L),
    def(Unit::Pathi, "Pathi", &["पाथी"], MANA_LITRES * 8.0, L),
    def(Unit::Muri, "Muri", &["मुरी"], MANA_LITRES * 160.0, L),
    def(Unit::Kilogram, "Kilogram", &["kg", "kilo", "के.जी.", "किलो"], 1.0, KG),
    def(Unit::Gram, "Gram", &["g", "ग्राम"], 0.001, KG),
    def(Unit::Quintal, "Quintal", &["q", "क्विन्टल"], 100.0, KG),
    def(Unit::Tonne, "Tonne", &["t", "ton", "टन"], 1_000.0, KG),
    def(Unit::Dharni, "Dharni", &["धार्नी"], DHARNI_KG, KG),
    def(Unit::Ser, "Ser", &["सेर"], DHARNI_KG / 3.0, KG),
    def(Unit::Pau, "Pau", &["पाउ"], DHARNI_KG / 12.0, KG),
];

impl Unit {
    /// `UNITS` lists units in declaration order.
    pub fn definition(&self) -> &'static UnitDefinition {
        &UNITS[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        self.definition().name
    }

    pub fn lookup(name: &str) -> Option<Unit> {
        let needle = name.trim().to_lowercase();
        UNITS
            .iter()
            .find(|d| d.name.to_lowercase() == needle || d.aliases.contains(&needle.as_str()))
            .map(|d| d.unit)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::lookup(s).ok_or_else(|| UnitError::UnknownUnit(s.to_string()))
    }
}

/// Convert `value` between two units of the same dimension. No rounding.
pub fn convert(value: f64, from: Unit, to: Unit) -> Result<f64, UnitError> {
    let (f, t) = (from.definition(), to.definition());
    if f.metric_unit != t.metric_unit {
        return Err(UnitError::IncompatibleUnits {
            from: f.name.to_string(),
            from_base: f.metric_unit.symbol(),
            to: t.name.to_string(),
            to_base: t.metric_unit.symbol(),
        });
    }
    Ok(value * f.to_metric_factor / t.to_metric_factor)
}

/// [`convert`] with unit names as typed by a user (`"Ropani"`, `"kattha"`, `"रोपनी"`).
pub fn convert_unit(value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
    convert(value, from.parse()?, to.parse()?)
}

/// Round for display; conversion itself never rounds.
pub fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    (value * scale).round() / scale
}

/// Units of one dimension, in table order.
pub fn units_of(base: MetricBase) -> impl Iterator<Item = &'static UnitDefinition> {
    UNITS.iter().filter(move |d| d.metric_unit == base)
}
