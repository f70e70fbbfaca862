// src/table/schema.rs

use std::{collections::HashMap, fmt};

use serde::Serialize;

use super::RawTable;
use crate::error::SchemaError;

/// Every source table the store loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TableId {
    CropCalendar,
    ChemicalFertilizersEn,
    ChemicalFertilizersNe,
    RiceFertilizer,
    MaizeFertilizer,
    WheatFertilizer,
    OtherCropsFertilizer,
    FruitTreeFertilizer,
    LimeRequirement,
    SoilPhEn,
    SoilPhNe,
}

impl TableId {
    pub const ALL: [TableId; 11] = [
        TableId::CropCalendar,
        TableId::ChemicalFertilizersEn,
        TableId::ChemicalFertilizersNe,
        TableId::RiceFertilizer,
        TableId::MaizeFertilizer,
        TableId::WheatFertilizer,
        TableId::OtherCropsFertilizer,
        TableId::FruitTreeFertilizer,
        TableId::LimeRequirement,
        TableId::SoilPhEn,
        TableId::SoilPhNe,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            TableId::CropCalendar => "crop_calendar.csv",
            TableId::ChemicalFertilizersEn => "chemical_fertilizers_en.csv",
            TableId::ChemicalFertilizersNe => "chemical_fertilizers_ne.csv",
            TableId::RiceFertilizer => "fertilizer_rice.csv",
            TableId::MaizeFertilizer => "fertilizer_maize.csv",
            TableId::WheatFertilizer => "fertilizer_wheat.csv",
            TableId::OtherCropsFertilizer => "fertilizer_other_crops.csv",
            TableId::FruitTreeFertilizer => "fertilizer_fruit_trees.csv",
            TableId::LimeRequirement => "lime_requirement.csv",
            TableId::SoilPhEn => "soil_ph_en.csv",
            TableId::SoilPhNe => "soil_ph_ne.csv",
        }
    }

    pub fn schema(&self) -> &'static TableSchema {
        match self {
            TableId::CropCalendar => &CROP_CALENDAR,
            TableId::ChemicalFertilizersEn => &CHEMICAL_FERTILIZERS_EN,
            TableId::ChemicalFertilizersNe => &CHEMICAL_FERTILIZERS_NE,
            TableId::RiceFertilizer => &RICE_FERTILIZER,
            TableId::MaizeFertilizer => &MAIZE_FERTILIZER,
            TableId::WheatFertilizer => &WHEAT_FERTILIZER,
            TableId::OtherCropsFertilizer => &OTHER_CROPS_FERTILIZER,
            TableId::FruitTreeFertilizer => &FRUIT_TREE_FERTILIZER,
            TableId::LimeRequirement => &LIME_REQUIREMENT,
            TableId::SoilPhEn => &SOIL_PH_EN,
            TableId::SoilPhNe => &SOIL_PH_NE,
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema().name)
    }
}

/// Logical column names, independent of the header wording of any one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Region,
    CropNepali,
    CropEnglish,
    Variety,
    PlantingMonths,
    SeedRate,
    Spacing,
    MaturityDays,
    Yield,
    Characteristics,
    Adaptation,
    Crop,
    Category,
    Compost,
    Nitrogen,
    Phosphorus,
    Potassium,
    TreeAge,
    ProductName,
    PhFrom,
    PhTo,
    Texture,
    LimePerRopani,
    OptimalPh,
}

#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [(Field, &'static str)],
}

const REGIONAL_RATE_COLUMNS: &[(Field, &str)] = &[
    (Field::Crop, "Crop"),
    (Field::Region, "Region"),
    (Field::Compost, "Compost (t/ha)"),
    (Field::Nitrogen, "N (kg/ha)"),
    (Field::Phosphorus, "P2O5 (kg/ha)"),
    (Field::Potassium, "K2O (kg/ha)"),
];

pub static CROP_CALENDAR: TableSchema = TableSchema {
    name: "crop_calendar",
    columns: &[
        (Field::Region, "क्षेत्र"),
        (Field::CropNepali, "बाली"),
        (Field::CropEnglish, "Crop"),
        (Field::Variety, "जात"),
        (Field::PlantingMonths, "रोप्ने समय"),
        (Field::SeedRate, "बीउ दर"),
        (Field::Spacing, "दुरी (से.मि.)"),
        (Field::MaturityDays, "पाक्ने दिन"),
        (Field::Yield, "उत्पादन"),
        (Field::Characteristics, "विशेषता"),
        (Field::Adaptation, "अनुकूलता"),
    ],
};

pub static CHEMICAL_FERTILIZERS_EN: TableSchema = TableSchema {
    name: "chemical_fertilizers_en",
    columns: &[
        (Field::ProductName, "Fertilizer"),
        (Field::Nitrogen, "N (%)"),
        (Field::Phosphorus, "P2O5 (%)"),
        (Field::Potassium, "K2O (%)"),
    ],
};

pub static CHEMICAL_FERTILIZERS_NE: TableSchema = TableSchema {
    name: "chemical_fertilizers_ne",
    columns: &[
        (Field::ProductName, "मल"),
        (Field::Nitrogen, "नाइट्रोजन (%)"),
        (Field::Phosphorus, "फस्फोरस (%)"),
        (Field::Potassium, "पोटास (%)"),
    ],
};

pub static RICE_FERTILIZER: TableSchema = TableSchema {
    name: "fertilizer_rice",
    columns: REGIONAL_RATE_COLUMNS,
};

pub static MAIZE_FERTILIZER: TableSchema = TableSchema {
    name: "fertilizer_maize",
    columns: REGIONAL_RATE_COLUMNS,
};

pub static WHEAT_FERTILIZER: TableSchema = TableSchema {
    name: "fertilizer_wheat",
    columns: REGIONAL_RATE_COLUMNS,
};

pub static OTHER_CROPS_FERTILIZER: TableSchema = TableSchema {
    name: "fertilizer_other_crops",
    columns: REGIONAL_RATE_COLUMNS,
};

pub static FRUIT_TREE_FERTILIZER: TableSchema = TableSchema {
    name: "fertilizer_fruit_trees",
    columns: &[
        (Field::Crop, "Fruit"),
        (Field::TreeAge, "Age (years)"),
        (Field::Compost, "Compost (kg/plant)"),
        (Field::Nitrogen, "N (g/plant)"),
        (Field::Phosphorus, "P2O5 (g/plant)"),
        (Field::Potassium, "K2O (g/plant)"),
    ],
};

pub static LIME_REQUIREMENT: TableSchema = TableSchema {
    name: "lime_requirement",
    columns: &[
        (Field::PhFrom, "pH From"),
        (Field::PhTo, "pH To"),
        (Field::Texture, "Soil Texture"),
        (Field::LimePerRopani, "Lime (kg/ropani)"),
    ],
};

pub static SOIL_PH_EN: TableSchema = TableSchema {
    name: "soil_ph_en",
    columns: &[
        (Field::Category, "Crop Category"),
        (Field::Crop, "Crop"),
        (Field::OptimalPh, "Optimal pH"),
    ],
};

pub static SOIL_PH_NE: TableSchema = TableSchema {
    name: "soil_ph_ne",
    columns: &[
        (Field::Category, "बाली समूह"),
        (Field::Crop, "बाली"),
        (Field::OptimalPh, "उपयुक्त पी.एच."),
    ],
};

impl TableSchema {
    /// Resolve every schema column against `raw`'s headers.
    /// Errors on the first expected header that is absent; extra columns are ignored.
    pub fn bind<'a>(&'static self, raw: &'a RawTable) -> Result<BoundTable<'a>, SchemaError> {
        let mut index = HashMap::with_capacity(self.columns.len());
        for &(field, header) in self.columns {
            let pos = raw.column(header).ok_or(SchemaError::MissingColumn {
                table: self.name,
                column: header,
            })?;
            index.insert(field, pos);
        }
        Ok(BoundTable {
            schema: self,
            raw,
            index,
        })
    }
}

/// A [`RawTable`] whose headers were validated against a [`TableSchema`].
pub struct BoundTable<'a> {
    schema: &'static TableSchema,
    raw: &'a RawTable,
    index: HashMap<Field, usize>,
}

impl<'a> BoundTable<'a> {
    pub fn name(&self) -> &'static str {
        self.schema.name
    }

    pub fn len(&self) -> usize {
        self.raw.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = BoundRow<'_>> {
        self.raw.rows.iter().map(move |cells| BoundRow {
            cells,
            index: &self.index,
        })
    }
}

pub struct BoundRow<'a> {
    cells: &'a [String],
    index: &'a HashMap<Field, usize>,
}

impl<'a> BoundRow<'a> {
    /// Cell for `field`; fields outside the table's schema read as `""`.
    pub fn get(&self, field: Field) -> &'a str {
        self.index
            .get(&field)
            .and_then(|&i| self.cells.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}
