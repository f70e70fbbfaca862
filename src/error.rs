use thiserror::Error;

/// Failures of the unit conversion helper.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error("unknown unit `{0}`")]
    UnknownUnit(String),

    #[error("cannot convert {from} ({from_base}) to {to} ({to_base})")]
    IncompatibleUnits {
        from: String,
        from_base: &'static str,
        to: String,
        to_base: &'static str,
    },
}

/// A source table does not have the shape its schema expects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("table `{table}` is missing column `{column}`")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("table `{table}` row {row}: unknown region label `{label}`")]
    UnknownRegion {
        table: &'static str,
        row: usize,
        label: String,
    },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("agronomic data store is not ready; call initialize() first")]
    NotReady,
}
