// src/store/dataset.rs

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::crop::{crop_key, renumber, CropRecord};
use crate::{
    calendar::{is_month_in_period, sowing_dates, Language, NepaliMonth, Region, SowingDates},
    fertilizer::{products_for, FertilizerMatch, FertilizerQuantities, FertilizerTables, ProductAmount},
    records::{
        parse_calendar, parse_chemical_fertilizers, parse_fertilizer_rates,
        parse_fruit_tree_rates, parse_lime_requirements, parse_ph_entries, CalendarRow,
        ChemicalFertilizer, FruitTreeRate, LimeRequirement, PhEntry,
    },
    table::{RawTable, TableId},
};

/// An English and a Nepali variant of one table.
#[derive(Debug, Clone, Default)]
struct Localized<T> {
    english: T,
    nepali: T,
}

impl<T> Localized<T> {
    fn get(&self, lang: Language) -> &T {
        match lang {
            Language::English => &self.english,
            Language::Nepali => &self.nepali,
        }
    }
}

/// A crop's sowing window in one region, resolved to calendar dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropSowingDates {
    pub name: String,
    pub variety: String,
    pub window: String,
    pub dates: Option<SowingDates>,
}

/// Everything one load produced. Immutable; queries are plain reads.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    calendar: Vec<CalendarRow>,
    fertilizer: FertilizerTables,
    fruit_trees: Vec<FruitTreeRate>,
    chemicals: Localized<Vec<ChemicalFertilizer>>,
    lime: Vec<LimeRequirement>,
    ph: Localized<Vec<PhEntry>>,
}

fn take(tables: &mut HashMap<TableId, RawTable>, id: TableId) -> Result<RawTable> {
    tables
        .remove(&id)
        .ok_or_else(|| anyhow!("table {} was not loaded", id))
}

impl Dataset {
    /// Build from one [`RawTable`] per [`TableId`], validating every schema.
    pub fn from_tables(mut tables: HashMap<TableId, RawTable>) -> Result<Dataset> {
        let calendar = parse_calendar(&take(&mut tables, TableId::CropCalendar)?)
            .context("parsing crop calendar")?;

        let mut family = Vec::new();
        for id in [
            TableId::RiceFertilizer,
            TableId::MaizeFertilizer,
            TableId::WheatFertilizer,
        ] {
            let raw = take(&mut tables, id)?;
            family.extend(parse_fertilizer_rates(id, &raw).with_context(|| format!("parsing {}", id))?);
        }
        let other = parse_fertilizer_rates(
            TableId::OtherCropsFertilizer,
            &take(&mut tables, TableId::OtherCropsFertilizer)?,
        )
        .context("parsing other-crops fertilizer")?;

        let fruit_trees = parse_fruit_tree_rates(&take(&mut tables, TableId::FruitTreeFertilizer)?)
            .context("parsing fruit-tree fertilizer")?;

        let chemicals = Localized {
            english: parse_chemical_fertilizers(
                TableId::ChemicalFertilizersEn,
                &take(&mut tables, TableId::ChemicalFertilizersEn)?,
            )?,
            nepali: parse_chemical_fertilizers(
                TableId::ChemicalFertilizersNe,
                &take(&mut tables, TableId::ChemicalFertilizersNe)?,
            )?,
        };

        let lime = parse_lime_requirements(&take(&mut tables, TableId::LimeRequirement)?)
            .context("parsing lime requirement")?;

        let ph = Localized {
            english: parse_ph_entries(TableId::SoilPhEn, &take(&mut tables, TableId::SoilPhEn)?)?,
            nepali: parse_ph_entries(TableId::SoilPhNe, &take(&mut tables, TableId::SoilPhNe)?)?,
        };

        if ph.english.len() != ph.nepali.len() {
            warn!(
                english = ph.english.len(),
                nepali = ph.nepali.len(),
                "pH tables differ in length"
            );
        }

        Ok(Dataset {
            calendar,
            fertilizer: FertilizerTables { family, other },
            fruit_trees,
            chemicals,
            lime,
            ph,
        })
    }

    pub fn calendar(&self) -> &[CalendarRow] {
        &self.calendar
    }

    /// One record per crop (keyed by lower-cased English name) in order of first
    /// appearance, with every region's sowing window merged in. Fertilizer is
    /// given for the mid hills.
    pub fn crops_data(&self, lang: Language) -> Vec<CropRecord> {
        let mut records: Vec<CropRecord> = Vec::new();
        let mut by_key: HashMap<String, usize> = HashMap::new();

        for row in &self.calendar {
            let key = crop_key(&row.crop_english);
            if key.is_empty() {
                debug!(crop = %row.crop_nepali, "calendar row without English name skipped");
                continue;
            }
            let idx = *by_key.entry(key).or_insert_with(|| {
                let fertilizer = self.fertilizer_info(&row.crop_english, Region::Mid);
                records.push(CropRecord::from_row(row, lang, fertilizer));
                records.len() - 1
            });
            records[idx]
                .sowing_windows
                .fill(row.region, &row.planting_months);
        }

        renumber(&mut records);
        records
    }

    /// [`Self::crops_data`] sorted by display name.
    pub fn all_crops(&self, lang: Language) -> Vec<CropRecord> {
        let mut records = self.crops_data(lang);
        records.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        renumber(&mut records);
        records
    }

    /// Calendar rows for `region` whose planting period includes `month`, in
    /// source order. Only `region`'s sowing window is set and fertilizer is
    /// computed for `region`.
    pub fn crops_by_month(&self, month: NepaliMonth, region: Region, lang: Language) -> Vec<CropRecord> {
        let mut records: Vec<CropRecord> = self
            .calendar
            .iter()
            .filter(|row| row.region == region)
            .filter(|row| is_month_in_period(&row.planting_months, month))
            .map(|row| {
                let fertilizer = self.fertilizer_info(&row.crop_english, region);
                let mut record = CropRecord::from_row(row, lang, fertilizer);
                record.sowing_windows.fill(region, &row.planting_months);
                record
            })
            .collect();
        renumber(&mut records);
        records
    }

    /// Case-insensitive substring search over name, variety and remarks.
    pub fn search_crops(&self, query: &str, lang: Language) -> Vec<CropRecord> {
        let needle = query.trim().to_lowercase();
        let mut records: Vec<CropRecord> = self
            .crops_data(lang)
            .into_iter()
            .filter(|r| {
                [&r.name, &r.variety, &r.remarks]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect();
        renumber(&mut records);
        records
    }

    pub fn fertilizer_match(&self, crop: &str, region: Region) -> FertilizerMatch {
        self.fertilizer.lookup(crop, region)
    }

    /// kg per ropani; all zero when no table knows the crop.
    pub fn fertilizer_info(&self, crop: &str, region: Region) -> FertilizerQuantities {
        self.fertilizer_match(crop, region).quantities()
    }

    /// Commercial products (named in `lang`) that supply `need`.
    pub fn fertilizer_products(&self, need: &FertilizerQuantities, lang: Language) -> Vec<ProductAmount> {
        products_for(need, self.chemicals.get(lang))
    }

    pub fn chemical_fertilizers(&self, lang: Language) -> &[ChemicalFertilizer] {
        self.chemicals.get(lang)
    }

    /// First pH entry whose crop name contains `crop` (case-insensitive).
    pub fn ph_info(&self, crop: &str, lang: Language) -> Option<&PhEntry> {
        let needle = crop.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.ph
            .get(lang)
            .iter()
            .find(|e| e.crop_name.to_lowercase().contains(&needle))
    }

    /// Lime band for a soil pH (rounded to one decimal) and texture.
    pub fn lime_requirement(&self, ph: f64, texture: &str) -> Option<&LimeRequirement> {
        let ph = (ph * 10.0).round() / 10.0;
        self.lime.iter().find(|l| {
            l.ph_from <= ph && ph <= l.ph_to && l.texture.eq_ignore_ascii_case(texture.trim())
        })
    }

    /// Per-plant doses for every age class of fruit trees whose name contains `query`.
    pub fn fruit_tree_rates(&self, query: &str) -> Vec<&FruitTreeRate> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.fruit_trees
            .iter()
            .filter(|r| r.crop.to_lowercase().contains(&needle))
            .collect()
    }

    /// Every crop with a sowing window in `region`, with the window resolved to
    /// Gregorian dates around `today`.
    pub fn sowing_calendar(&self, region: Region, lang: Language, today: NaiveDate) -> Vec<CropSowingDates> {
        self.crops_data(lang)
            .into_iter()
            .filter_map(|r| {
                let window = r.sowing_windows.get(region)?.to_string();
                Some(CropSowingDates {
                    dates: sowing_dates(&window, today),
                    name: r.name,
                    variety: r.variety,
                    window,
                })
            })
            .collect()
    }
}
