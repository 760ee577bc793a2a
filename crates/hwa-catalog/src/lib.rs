//! hwa-catalog: physical variable names and units.
//!
//! Three naming domains meet here:
//! - parameter keys used by simulation metadata (`Btot`, `Ux`, `Density`)
//! - canonical engine symbols (`B`, `vx`, `n`)
//! - output field names with SI unit, UCD tag and description
//!
//! The tables are immutable; build a [`Catalog`] once and pass it by reference.

pub mod error;
pub mod names;
pub mod units;

pub use error::{CatalogError, CatalogResult};
pub use names::{NameTranslator, Variable};
pub use units::{QuantityEntry, UnitCatalog, UnitSpec, unit_factor};

/// Immutable bundle of the unit and name tables.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub units: UnitCatalog,
    pub names: NameTranslator,
}

impl Catalog {
    pub fn standard() -> Self {
        Self {
            units: UnitCatalog::standard(),
            names: NameTranslator::standard(),
        }
    }

    /// Resolve a parameter key into a fully described variable.
    pub fn resolve(&self, key: &str) -> CatalogResult<Variable> {
        self.names.resolve(key, &self.units)
    }

    /// Describe a canonical symbol as it appears in an engine header.
    pub fn describe_symbol(&self, symbol: &str) -> CatalogResult<Variable> {
        self.names.describe_symbol(symbol, &self.units)
    }

    pub fn to_canonical_list<S: AsRef<str>>(&self, keys: &[S]) -> CatalogResult<Vec<String>> {
        self.names.to_canonical_list(keys)
    }

    pub fn unit_factor(&self, unit: &str) -> f64 {
        self.units.unit_factor(unit)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}
