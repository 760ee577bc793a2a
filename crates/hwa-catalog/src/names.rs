//! Translation between parameter keys, engine symbols and output field names.

use std::collections::HashMap;

use crate::units::UnitCatalog;
use crate::{CatalogError, CatalogResult};

/// Parameter key (as declared by simulation metadata) -> engine symbol.
const PARAMETER_KEYS: [(&str, &str); 15] = [
    ("Density", "n"),
    ("Ux", "vx"),
    ("Uy", "vy"),
    ("Uz", "vz"),
    ("Utot", "v"),
    ("Jx", "jx"),
    ("Jy", "jy"),
    ("Jz", "jz"),
    ("Jtot", "j"),
    ("Pressure", "P"),
    ("Temperature", "T"),
    ("Bx", "Bx"),
    ("By", "By"),
    ("Bz", "Bz"),
    ("Btot", "B"),
];

/// Engine symbol -> output field name.
const FIELD_NAMES: [(&str, &str); 26] = [
    ("t", "Time"),
    ("x", "x"),
    ("y", "y"),
    ("z", "z"),
    ("rho", "MassDensity"),
    ("n", "Density"),
    ("vx", "Ux"),
    ("vy", "Uy"),
    ("vz", "Uz"),
    ("v", "Utot"),
    ("jx", "Jx"),
    ("jy", "Jy"),
    ("jz", "Jz"),
    ("j", "Jtot"),
    ("U", "EnergyDensity"),
    ("P", "Pressure"),
    ("T", "Temperature"),
    ("Bx", "Bx"),
    ("By", "By"),
    ("Bz", "Bz"),
    ("B", "Btot"),
    ("Ex", "Ex"),
    ("Ey", "Ey"),
    ("Ez", "Ez"),
    ("E", "Etot"),
    ("Ebin0", "ParticleFlux"),
];

/// A physical variable resolved across all three naming domains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Key as the caller spelled it.
    pub key: String,
    pub symbol: String,
    pub field_name: String,
    pub unit: String,
    pub ucd: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NameTranslator {
    /// Lowercased key or field name -> engine symbol.
    by_key: HashMap<String, &'static str>,
    by_symbol: HashMap<&'static str, &'static str>,
}

impl NameTranslator {
    pub fn standard() -> Self {
        let mut by_key: HashMap<String, &'static str> = FIELD_NAMES
            .iter()
            .filter(|(symbol, _)| !matches!(*symbol, "t" | "x" | "y" | "z"))
            .map(|(symbol, field)| (field.to_ascii_lowercase(), *symbol))
            .collect();
        // Metadata keys win over field names on collision.
        for (key, symbol) in PARAMETER_KEYS {
            by_key.insert(key.to_ascii_lowercase(), symbol);
        }
        Self {
            by_key,
            by_symbol: FIELD_NAMES.iter().copied().collect(),
        }
    }

    /// Engine symbol for a parameter key, matched case-insensitively
    /// (`BTOT`, `btot` and `Btot` all give `B`).
    pub fn symbol_for_key(&self, key: &str) -> CatalogResult<&'static str> {
        self.by_key
            .get(&key.trim().to_ascii_lowercase())
            .copied()
            .ok_or_else(|| CatalogError::UnknownVariable {
                key: key.to_string(),
            })
    }

    /// Output field name for an engine symbol; unnamed symbols keep their spelling.
    pub fn field_name<'a>(&self, symbol: &'a str) -> &'a str {
        self.by_symbol.get(symbol).copied().unwrap_or(symbol)
    }

    pub fn resolve(&self, key: &str, units: &UnitCatalog) -> CatalogResult<Variable> {
        let symbol = self.symbol_for_key(key)?;
        let mut variable = self.describe_symbol(symbol, units)?;
        variable.key = key.trim().to_string();
        Ok(variable)
    }

    pub fn describe_symbol(&self, symbol: &str, units: &UnitCatalog) -> CatalogResult<Variable> {
        let entry = units
            .quantity(symbol)
            .ok_or_else(|| CatalogError::UnknownSymbol {
                symbol: symbol.to_string(),
            })?;
        let field_name = self.field_name(symbol).to_string();
        Ok(Variable {
            key: field_name.clone(),
            symbol: entry.symbol.to_string(),
            field_name,
            unit: entry.unit.to_string(),
            ucd: entry.ucd.to_string(),
            description: entry.description.to_string(),
        })
    }

    /// Engine symbols for `keys`, in caller order.
    pub fn to_canonical_list<S: AsRef<str>>(&self, keys: &[S]) -> CatalogResult<Vec<String>> {
        keys.iter()
            .map(|k| self.symbol_for_key(k.as_ref()).map(str::to_string))
            .collect()
    }
}

impl Default for NameTranslator {
    fn default() -> Self {
        Self::standard()
    }
}
