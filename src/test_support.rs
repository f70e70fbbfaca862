// src/test_support.rs
//
// Shared fixtures for unit tests.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::table::{MemorySource, TableId};

pub fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,krishi=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn bundled(table: TableId) -> &'static str {
    match table {
        TableId::CropCalendar => include_str!("../data/crop_calendar.csv"),
        TableId::ChemicalFertilizersEn => include_str!("../data/chemical_fertilizers_en.csv"),
        TableId::ChemicalFertilizersNe => include_str!("../data/chemical_fertilizers_ne.csv"),
        TableId::RiceFertilizer => include_str!("../data/fertilizer_rice.csv"),
        TableId::MaizeFertilizer => include_str!("../data/fertilizer_maize.csv"),
        TableId::WheatFertilizer => include_str!("../data/fertilizer_wheat.csv"),
        TableId::OtherCropsFertilizer => include_str!("../data/fertilizer_other_crops.csv"),
        TableId::FruitTreeFertilizer => include_str!("../data/fertilizer_fruit_trees.csv"),
        TableId::LimeRequirement => include_str!("../data/lime_requirement.csv"),
        TableId::SoilPhEn => include_str!("../data/soil_ph_en.csv"),
        TableId::SoilPhNe => include_str!("../data/soil_ph_ne.csv"),
    }
}

/// Every table from the `data/` directory, held in memory.
pub fn sample_source() -> MemorySource {
    TableId::ALL
        .into_iter()
        .fold(MemorySource::new(), |src, id| src.with_table(id, bundled(id)))
}
