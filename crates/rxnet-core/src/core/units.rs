use crate::core::constants;
use serde::Serialize;
use std::fmt;

/// Energy (and entropy) units reported by the external tool.
///
/// Conversion happens at the point of extraction; every stored record keeps
/// the originally parsed unit for traceability next to the canonical
/// kcal/mol value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnergyUnit {
    Hartree,
    KcalPerMol,
    KjPerMol,
    CalPerMolK,
    KcalPerMolK,
}

impl EnergyUnit {
    /// Parses a unit token as printed by the tool (`Ha`, `a.u.`,
    /// `kcal/mol`, `cal/mol.K`, ...). Unrecognized tokens yield `None`.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "hartree" | "ha" | "a.u." => Some(Self::Hartree),
            "kcal/mol" => Some(Self::KcalPerMol),
            "kj/mol" => Some(Self::KjPerMol),
            "cal/mol.k" | "cal/mol·k" => Some(Self::CalPerMolK),
            "kcal/mol.k" | "kcal/mol·k" => Some(Self::KcalPerMolK),
            _ => None,
        }
    }
}

impl fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Hartree => "Ha",
            Self::KcalPerMol => "kcal/mol",
            Self::KjPerMol => "kJ/mol",
            Self::CalPerMolK => "cal/mol.K",
            Self::KcalPerMolK => "kcal/mol.K",
        };
        f.write_str(s)
    }
}

/// Converts `value` between units. Returns `None` for pairs that have no
/// defined conversion (e.g. an energy into an entropy unit).
pub fn convert(value: f64, from: EnergyUnit, to: EnergyUnit) -> Option<f64> {
    use EnergyUnit::*;
    if from == to {
        return Some(value);
    }
    match (from, to) {
        (Hartree, KcalPerMol) => Some(value * constants::HARTREE_TO_KCALMOL),
        (KcalPerMol, Hartree) => Some(value / constants::HARTREE_TO_KCALMOL),
        (Hartree, KjPerMol) => Some(value * constants::HARTREE_TO_KJMOL),
        (KjPerMol, Hartree) => Some(value * constants::KJMOL_TO_HARTREE),
        (KjPerMol, KcalPerMol) => Some(value * constants::KJMOL_TO_KCALMOL),
        (KcalPerMol, KjPerMol) => Some(value / constants::KJMOL_TO_KCALMOL),
        (CalPerMolK, KcalPerMolK) => Some(value * constants::TO_KILO),
        (KcalPerMolK, CalPerMolK) => Some(value / constants::TO_KILO),
        _ => None,
    }
}

/// Converts an energy value to the canonical kcal/mol, logging and passing
/// the value through unchanged when the pair is not convertible. Mirrors the
/// tool-facing extraction paths, where an odd unit must not abort a record.
pub fn to_kcal_per_mol(value: f64, from: EnergyUnit) -> f64 {
    match convert(value, from, EnergyUnit::KcalPerMol) {
        Some(v) => v,
        None => {
            tracing::warn!(unit = %from, "no conversion to kcal/mol; keeping raw value");
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parse_accepts_tool_spellings() {
        assert_eq!(EnergyUnit::parse("Ha"), Some(EnergyUnit::Hartree));
        assert_eq!(EnergyUnit::parse("a.u."), Some(EnergyUnit::Hartree));
        assert_eq!(EnergyUnit::parse("hartree"), Some(EnergyUnit::Hartree));
        assert_eq!(EnergyUnit::parse("kcal/mol"), Some(EnergyUnit::KcalPerMol));
        assert_eq!(EnergyUnit::parse("cal/mol.K"), Some(EnergyUnit::CalPerMolK));
        assert_eq!(EnergyUnit::parse("eV"), None);
    }

    #[test]
    fn hartree_round_trips_through_kcal() {
        let e = -100.123456;
        let kcal = convert(e, EnergyUnit::Hartree, EnergyUnit::KcalPerMol).unwrap();
        assert_relative_eq!(kcal, -100.123456 * 627.509_608_030_592_7, epsilon = 1e-9);
        let back = convert(kcal, EnergyUnit::KcalPerMol, EnergyUnit::Hartree).unwrap();
        assert_relative_eq!(back, e, epsilon = 1e-12);
    }

    #[test]
    fn entropy_units_scale_by_kilo() {
        let s = convert(87.337, EnergyUnit::CalPerMolK, EnergyUnit::KcalPerMolK).unwrap();
        assert_relative_eq!(s, 0.087337, epsilon = 1e-12);
    }

    #[test]
    fn energy_to_entropy_is_not_convertible() {
        assert_eq!(convert(1.0, EnergyUnit::Hartree, EnergyUnit::KcalPerMolK), None);
    }
}
