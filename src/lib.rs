pub mod calendar;
pub mod config;
pub mod error;
pub mod fertilizer;
pub mod records;
pub mod store;
pub mod table;
pub mod units;

#[cfg(test)]
mod test_support;

pub use calendar::{Language, NepaliMonth, Region};
pub use config::Config;
pub use error::{SchemaError, StoreError, UnitError};
pub use fertilizer::{FertilizerMatch, FertilizerQuantities};
pub use store::{AgroDataStore, CropRecord, StoreState};
pub use units::{convert_unit, Unit};
