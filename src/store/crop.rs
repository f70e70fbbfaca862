// src/store/crop.rs

use serde::Serialize;

use crate::{
    calendar::{Language, Region},
    fertilizer::FertilizerQuantities,
    records::CalendarRow,
    table::utils::leading_number,
};

/// Sowing window text per region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SowingWindows {
    #[serde(rename = "highHillSowing")]
    pub high: Option<String>,
    #[serde(rename = "midHillSowing")]
    pub mid: Option<String>,
    #[serde(rename = "teraiSowing")]
    pub terai: Option<String>,
}

impl SowingWindows {
    pub fn get(&self, region: Region) -> Option<&str> {
        match region {
            Region::High => self.high.as_deref(),
            Region::Mid => self.mid.as_deref(),
            Region::Terai => self.terai.as_deref(),
        }
    }

    fn slot(&mut self, region: Region) -> &mut Option<String> {
        match region {
            Region::High => &mut self.high,
            Region::Mid => &mut self.mid,
            Region::Terai => &mut self.terai,
        }
    }

    /// Fill `region`'s slot unless an earlier row already did.
    pub fn fill(&mut self, region: Region, window: &str) {
        let slot = self.slot(region);
        if slot.is_none() {
            *slot = Some(window.to_string());
        }
    }
}

/// Plant and row spacing in centimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Spacing {
    pub plant: f64,
    pub row: f64,
}

impl Spacing {
    /// Parse a `"60x45"` / `"60 × 45"` cell; missing or unreadable sides are 0.
    pub fn parse(cell: &str) -> Spacing {
        let mut parts = cell.split(&['×', 'x', 'X'][..]);
        let mut side = || parts.next().and_then(leading_number).unwrap_or(0.0);
        let plant = side();
        let row = side();
        Spacing { plant, row }
    }
}

/// One crop as served to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRecord {
    pub serial: usize,
    pub name: String,
    pub english_name: String,
    pub variety: String,
    pub sowing_windows: SowingWindows,
    pub fertilizer: FertilizerQuantities,
    pub spacing: Spacing,
    pub seed_rate: String,
    pub maturity_days: String,
    #[serde(rename = "yield")]
    pub yield_: String,
    pub remarks: String,
}

impl CropRecord {
    /// Record for `row` with no sowing window filled yet; `serial` is assigned by the caller.
    pub(crate) fn from_row(
        row: &CalendarRow,
        lang: Language,
        fertilizer: FertilizerQuantities,
    ) -> CropRecord {
        CropRecord {
            serial: 0,
            name: display_name(row, lang),
            english_name: row.crop_english.clone(),
            variety: row.variety.clone(),
            sowing_windows: SowingWindows::default(),
            fertilizer,
            spacing: Spacing::parse(&row.spacing),
            seed_rate: row.seed_rate.clone(),
            maturity_days: row.maturity_days.clone(),
            yield_: row.yield_.clone(),
            remarks: remarks(row, lang),
        }
    }

    /// Lower-cased English name; the identity of a consolidated record.
    pub fn key(&self) -> String {
        crop_key(&self.english_name)
    }
}

pub(crate) fn crop_key(english_name: &str) -> String {
    english_name.trim().to_lowercase()
}

fn display_name(row: &CalendarRow, lang: Language) -> String {
    match lang {
        Language::Nepali if !row.crop_nepali.is_empty() => row.crop_nepali.clone(),
        _ => row.crop_english.clone(),
    }
}

fn no_info(lang: Language) -> &'static str {
    match lang {
        Language::English => "No additional information available",
        Language::Nepali => "थप जानकारी उपलब्ध छैन",
    }
}

fn remarks(row: &CalendarRow, lang: Language) -> String {
    let text = [row.characteristics.trim(), row.adaptation.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(". ");
    if text.is_empty() {
        no_info(lang).to_string()
    } else {
        text
    }
}

/// Number records 1..=n in their current order.
pub(crate) fn renumber(records: &mut [CropRecord]) {
    for (i, r) in records.iter_mut().enumerate() {
        r.serial = i + 1;
    }
}
