//! SI units, UCD tags and unit conversion factors for engine quantities.

use std::collections::HashMap;

use hwa_core::Real;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityEntry {
    pub symbol: &'static str,
    pub unit: &'static str,
    pub ucd: &'static str,
    pub description: &'static str,
}

const fn q(
    symbol: &'static str,
    unit: &'static str,
    ucd: &'static str,
    description: &'static str,
) -> QuantityEntry {
    QuantityEntry {
        symbol,
        unit,
        ucd,
        description,
    }
}

const QUANTITIES: [QuantityEntry; 41] = [
    q("t", "s", "time.epoch", "Time"),
    q("x", "m", "pos.cartesian.x", "Position X"),
    q("y", "m", "pos.cartesian.y", "Position Y"),
    q("z", "m", "pos.cartesian.z", "Position Z"),
    q("rho", "kg/m3", "phys.density", "Mass density"),
    q("mass", "kg", "phys.mass", "Mass"),
    q("n", "1/m^3", "phys.density", "Number density"),
    q("density", "1/m^3", "phys.density", "Number density"),
    q("rhovx", "kg/(m^2*s)", "phys.density", "Momentum flux, X component"),
    q("rhovy", "kg/(m^2*s)", "phys.density", "Momentum flux, Y component"),
    q("rhovz", "kg/(m^2*s)", "phys.density", "Momentum flux, Z component"),
    q("vx", "m/s", "phys.veloc", "Velocity, X component"),
    q("vy", "m/s", "phys.veloc", "Velocity, Y component"),
    q("vz", "m/s", "phys.veloc", "Velocity, Z component"),
    q("v", "m/s", "phys.veloc", "Velocity, total"),
    q("ux", "m/s", "phys.veloc", "Velocity, X component"),
    q("uy", "m/s", "phys.veloc", "Velocity, Y component"),
    q("uz", "m/s", "phys.veloc", "Velocity, Z component"),
    q("utot", "m/s", "phys.veloc", "Velocity, total"),
    q("U", "J/m^3", "phys.energy.density", "Total energy density"),
    q("P", "J/m^3", "phys.pressure", "Pressure"),
    q("T", "K", "phys.temperature", "Temperature"),
    q("temperature", "K", "phys.temperature", "Temperature"),
    q("Bx", "T", "phys.magField", "Magnetic field, X component"),
    q("By", "T", "phys.magField", "Magnetic field, Y component"),
    q("Bz", "T", "phys.magField", "Magnetic field, Z component"),
    q("B", "T", "phys.magField", "Magnetic field, total"),
    q("btot", "T", "phys.magField", "Magnetic field, total"),
    q("Ex", "V/m^2", "phys.electField", "Electric field, X component"),
    q("Ey", "V/m^2", "phys.electField", "Electric field, Y component"),
    q("Ez", "V/m^2", "phys.electField", "Electric field, Z component"),
    q("E", "V/m^2", "phys.electField", "Electric field, total"),
    q("etot", "V/m^2", "phys.electField", "Electric field, total"),
    q("jx", "A/m^2", "phys", "Current density, X component"),
    q("jy", "A/m^2", "phys", "Current density, Y component"),
    q("jz", "A/m^2", "phys", "Current density, Z component"),
    q("j", "A/m^2", "phys", "Current density, total"),
    q("jtot", "A/m^2", "phys", "Current density, total"),
    q("vr", "m/s", "phys.veloc", "Velocity, radial component"),
    q("U1", "J/m^3", "phys.energy.density", "Energy density"),
    q(
        "Ebin0",
        "m-2.s-1.sr-1.eV-1",
        "phys.flux.density",
        "Particle flux",
    ),
];

/// Factors from common non-SI units to the units the engine expects.
const CONVERSIONS: [(&str, Real); 8] = [
    ("km", 1000.0),
    ("mi", 1609.344),
    ("km/s", 1000.0),
    ("km/h", 1.0 / 3.6),
    ("g", 0.001),
    ("1/cm^3", 1.0e6),
    ("cm^-3", 1.0e6),
    ("nT", 1.0e-9),
];

/// A unit string split into its numeric multiplier and unit suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSpec {
    pub multiplier: Real,
    pub unit: String,
    /// SI factor of `unit`; `None` when the unit is not recognized.
    pub factor: Option<Real>,
}

impl UnitSpec {
    pub fn si_factor(&self) -> Real {
        self.multiplier * self.factor.unwrap_or(1.0)
    }
}

#[derive(Debug, Clone)]
pub struct UnitCatalog {
    by_symbol: HashMap<&'static str, QuantityEntry>,
    conversions: HashMap<&'static str, Real>,
}

impl UnitCatalog {
    pub fn standard() -> Self {
        Self {
            by_symbol: QUANTITIES.iter().map(|e| (e.symbol, *e)).collect(),
            conversions: CONVERSIONS.iter().copied().collect(),
        }
    }

    pub fn quantity(&self, symbol: &str) -> Option<&QuantityEntry> {
        self.by_symbol.get(symbol)
    }

    pub fn quantities(&self) -> impl Iterator<Item = &QuantityEntry> {
        QUANTITIES.iter()
    }

    /// True when `unit` is already an SI unit used by some engine quantity.
    pub fn is_canonical(&self, unit: &str) -> bool {
        QUANTITIES.iter().any(|e| e.unit == unit)
    }

    /// SI factor of a bare unit (no multiplier), if known.
    pub fn factor_of(&self, unit: &str) -> Option<Real> {
        if self.is_canonical(unit) {
            return Some(1.0);
        }
        self.conversions.get(unit).copied()
    }

    pub fn parse_unit(&self, text: &str) -> UnitSpec {
        let text = text.trim();
        if let Some(factor) = self.factor_of(text) {
            return UnitSpec {
                multiplier: 1.0,
                unit: text.to_string(),
                factor: Some(factor),
            };
        }

        let split_idx = text
            .find(|c: char| !c.is_ascii_digit() && !matches!(c, '.' | 'x' | '+' | '-' | '^'))
            .unwrap_or(text.len());
        let (num_part, unit_part) = text.split_at(split_idx);

        match parse_multiplier(num_part) {
            Some(multiplier) => UnitSpec {
                multiplier,
                unit: unit_part.to_string(),
                factor: if unit_part.is_empty() {
                    Some(1.0)
                } else {
                    self.factor_of(unit_part)
                },
            },
            None => UnitSpec {
                multiplier: 1.0,
                unit: text.to_string(),
                factor: None,
            },
        }
    }

    /// SI multiplier for a unit string. Unrecognized units pass through as 1.0.
    pub fn unit_factor(&self, text: &str) -> Real {
        let spec = self.parse_unit(text);
        if spec.factor.is_none() {
            tracing::warn!(unit = text, "unrecognized unit, values left unscaled");
        }
        spec.si_factor()
    }
}

impl Default for UnitCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Convenience over the standard catalog.
pub fn unit_factor(text: &str) -> Real {
    UnitCatalog::standard().unit_factor(text)
}

/// Parses `1000`, `6.371x10+6`, `6.371x10^6` or `1.3x10-12`. Empty means 1.
fn parse_multiplier(text: &str) -> Option<Real> {
    if text.is_empty() {
        return Some(1.0);
    }
    match text.split_once('x') {
        None => text.parse().ok(),
        Some((mantissa, power)) => {
            let mantissa: Real = if mantissa.is_empty() {
                1.0
            } else {
                mantissa.parse().ok()?
            };
            let exponent = power.strip_prefix("10")?;
            let exponent = exponent.strip_prefix('^').unwrap_or(exponent);
            let exponent: i32 = if exponent.is_empty() {
                1
            } else {
                exponent.parse().ok()?
            };
            Some(mantissa * (10.0 as Real).powi(exponent))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwa_core::{Tolerances, nearly_equal};

    fn tol() -> Tolerances {
        Tolerances {
            abs: 0.0,
            rel: 1e-6,
        }
    }

    #[test]
    fn canonical_units_are_identity() {
        let cat = UnitCatalog::standard();
        assert_eq!(cat.unit_factor("m"), 1.0);
        assert_eq!(cat.unit_factor("T"), 1.0);
        assert_eq!(cat.unit_factor("m/s"), 1.0);
    }

    #[test]
    fn conversion_table_units() {
        let cat = UnitCatalog::standard();
        assert_eq!(cat.unit_factor("km"), 1000.0);
        assert_eq!(cat.unit_factor("nT"), 1.0e-9);
        assert_eq!(cat.unit_factor("km/s"), 1000.0);
        assert_eq!(cat.unit_factor("1/cm^3"), 1.0e6);
    }

    #[test]
    fn planetary_radius_multiplier() {
        let cat = UnitCatalog::standard();
        assert!(nearly_equal(cat.unit_factor("6.371x10+6m"), 6.371e6, tol()));
        assert!(nearly_equal(cat.unit_factor("6.371x10^6m"), 6.371e6, tol()));
        assert!(nearly_equal(cat.unit_factor("2439.7km"), 2.4397e6, tol()));
        assert!(nearly_equal(cat.unit_factor("1.3x10-12T"), 1.3e-12, tol()));
    }

    #[test]
    fn unknown_units_pass_through() {
        let cat = UnitCatalog::standard();
        assert_eq!(cat.unit_factor("furlong"), 1.0);
        let spec = cat.parse_unit("furlong");
        assert_eq!(spec.factor, None);
        assert!(nearly_equal(cat.unit_factor("10furlong"), 10.0, tol()));
    }

    #[test]
    fn quantity_lookup() {
        let cat = UnitCatalog::standard();
        let b = cat.quantity("B").unwrap();
        assert_eq!(b.unit, "T");
        assert_eq!(b.ucd, "phys.magField");
        assert!(cat.quantity("nonsense").is_none());
    }
}
