// src/records.rs
//
// Typed rows for each source table, built from a schema-validated RawTable.

use serde::Serialize;
use tracing::debug;

use crate::{
    calendar::Region,
    error::SchemaError,
    fertilizer::RegionScope,
    table::{utils::parse_number, Field, RawTable, TableId},
};

/// One row of the master crop calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarRow {
    pub region: Region,
    pub crop_nepali: String,
    pub crop_english: String,
    pub variety: String,
    pub planting_months: String,
    pub seed_rate: String,
    pub spacing: String,
    pub maturity_days: String,
    pub yield_: String,
    pub characteristics: String,
    pub adaptation: String,
}

/// Regional fertilizer requirement in source units.
#[derive(Debug, Clone, PartialEq)]
pub struct FertilizerRate {
    pub crop: String,
    pub scope: RegionScope,
    pub compost_t_ha: f64,
    pub nitrogen_kg_ha: f64,
    pub phosphorus_kg_ha: f64,
    pub potassium_kg_ha: f64,
}

/// Per-plant doses for a fruit tree of a given age.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FruitTreeRate {
    pub crop: String,
    pub age_years: String,
    pub compost_kg: f64,
    pub nitrogen_g: f64,
    pub phosphorus_g: f64,
    pub potassium_g: f64,
}

/// Nutrient content of a commercial fertilizer, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChemicalFertilizer {
    pub name: String,
    pub nitrogen_pct: f64,
    pub phosphorus_pct: f64,
    pub potassium_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimeRequirement {
    pub ph_from: f64,
    pub ph_to: f64,
    pub texture: String,
    pub lime_kg_per_ropani: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhEntry {
    pub crop_category: String,
    pub crop_name: String,
    pub optimal_ph_range: String,
}

pub fn parse_calendar(raw: &RawTable) -> Result<Vec<CalendarRow>, SchemaError> {
    let table = TableId::CropCalendar.schema().bind(raw)?;
    let mut out = Vec::with_capacity(table.len());

    for (i, row) in table.rows().enumerate() {
        let label = row.get(Field::Region);
        let region = Region::from_label(label).ok_or_else(|| SchemaError::UnknownRegion {
            table: table.name(),
            row: i + 1,
            label: label.to_string(),
        })?;
        out.push(CalendarRow {
            region,
            crop_nepali: row.get(Field::CropNepali).to_string(),
            crop_english: row.get(Field::CropEnglish).to_string(),
            variety: row.get(Field::Variety).to_string(),
            planting_months: row.get(Field::PlantingMonths).to_string(),
            seed_rate: row.get(Field::SeedRate).to_string(),
            spacing: row.get(Field::Spacing).to_string(),
            maturity_days: row.get(Field::MaturityDays).to_string(),
            yield_: row.get(Field::Yield).to_string(),
            characteristics: row.get(Field::Characteristics).to_string(),
            adaptation: row.get(Field::Adaptation).to_string(),
        });
    }
    Ok(out)
}

/// Parse one of the regional rate tables (rice, maize, wheat, other crops).
pub fn parse_fertilizer_rates(
    id: TableId,
    raw: &RawTable,
) -> Result<Vec<FertilizerRate>, SchemaError> {
    let table = id.schema().bind(raw)?;
    let mut out = Vec::with_capacity(table.len());

    for (i, row) in table.rows().enumerate() {
        let crop = row.get(Field::Crop);
        if crop.is_empty() {
            debug!(table = table.name(), row = i + 1, "skipping rate without crop name");
            continue;
        }
        let label = row.get(Field::Region);
        let scope = RegionScope::from_label(label).ok_or_else(|| SchemaError::UnknownRegion {
            table: table.name(),
            row: i + 1,
            label: label.to_string(),
        })?;
        out.push(FertilizerRate {
            crop: crop.to_string(),
            scope,
            compost_t_ha: parse_number(row.get(Field::Compost)),
            nitrogen_kg_ha: parse_number(row.get(Field::Nitrogen)),
            phosphorus_kg_ha: parse_number(row.get(Field::Phosphorus)),
            potassium_kg_ha: parse_number(row.get(Field::Potassium)),
        });
    }
    Ok(out)
}

pub fn parse_fruit_tree_rates(raw: &RawTable) -> Result<Vec<FruitTreeRate>, SchemaError> {
    let table = TableId::FruitTreeFertilizer.schema().bind(raw)?;
    Ok(table
        .rows()
        .filter(|row| !row.get(Field::Crop).is_empty())
        .map(|row| FruitTreeRate {
            crop: row.get(Field::Crop).to_string(),
            age_years: row.get(Field::TreeAge).to_string(),
            compost_kg: parse_number(row.get(Field::Compost)),
            nitrogen_g: parse_number(row.get(Field::Nitrogen)),
            phosphorus_g: parse_number(row.get(Field::Phosphorus)),
            potassium_g: parse_number(row.get(Field::Potassium)),
        })
        .collect())
}

pub fn parse_chemical_fertilizers(
    id: TableId,
    raw: &RawTable,
) -> Result<Vec<ChemicalFertilizer>, SchemaError> {
    let table = id.schema().bind(raw)?;
    Ok(table
        .rows()
        .filter(|row| !row.get(Field::ProductName).is_empty())
        .map(|row| ChemicalFertilizer {
            name: row.get(Field::ProductName).to_string(),
            nitrogen_pct: parse_number(row.get(Field::Nitrogen)),
            phosphorus_pct: parse_number(row.get(Field::Phosphorus)),
            potassium_pct: parse_number(row.get(Field::Potassium)),
        })
        .collect())
}

pub fn parse_lime_requirements(raw: &RawTable) -> Result<Vec<LimeRequirement>, SchemaError> {
    let table = TableId::LimeRequirement.schema().bind(raw)?;
    Ok(table
        .rows()
        .map(|row| LimeRequirement {
            ph_from: parse_number(row.get(Field::PhFrom)),
            ph_to: parse_number(row.get(Field::PhTo)),
            texture: row.get(Field::Texture).to_string(),
            lime_kg_per_ropani: parse_number(row.get(Field::LimePerRopani)),
        })
        .collect())
}

pub fn parse_ph_entries(id: TableId, raw: &RawTable) -> Result<Vec<PhEntry>, SchemaError> {
    let table = id.schema().bind(raw)?;
    Ok(table
        .rows()
        .filter(|row| !row.get(Field::Crop).is_empty())
        .map(|row| PhEntry {
            crop_category: row.get(Field::Category).to_string(),
            crop_name: row.get(Field::Crop).to_string(),
            optimal_ph_range: row.get(Field::OptimalPh).to_string(),
        })
        .collect())
}
