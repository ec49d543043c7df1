//! Extracted result records and their provenance.

use crate::core::models::identity::CalculationIdentity;
use crate::core::units::{self, EnergyUnit};
use serde::Serialize;

/// A parsed numeric quantity: the value as reported by the tool, the unit it
/// was reported in, and the value converted to the canonical unit (kcal/mol
/// for energies, kcal/(mol·K) for entropies). Conversion happens at the
/// point of extraction, never deferred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: EnergyUnit,
    pub canonical: f64,
}

impl Quantity {
    /// An energy quantity, canonicalized to kcal/mol.
    pub fn energy(value: f64, unit: EnergyUnit) -> Self {
        Self { value, unit, canonical: units::to_kcal_per_mol(value, unit) }
    }

    /// An entropy quantity, canonicalized to kcal/(mol·K).
    pub fn entropy(value: f64, unit: EnergyUnit) -> Self {
        let canonical = units::convert(value, unit, EnergyUnit::KcalPerMolK).unwrap_or_else(|| {
            tracing::warn!(unit = %unit, "unrecognized entropy unit; keeping raw value");
            value
        });
        Self { value, unit, canonical }
    }
}

/// Convergence type reported by a successful optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Convergence {
    Minimum,
    TransitionState,
}

impl Convergence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Convergence::Minimum => "OPTIMIZATION CONVERGED",
            Convergence::TransitionState => "TRANSITION STATE CONVERGED",
        }
    }
}

/// Which marker produced a record's mode-specific base energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BaseEnergySource {
    /// Primary electronic-energy marker of the single-point text.
    FinalEnergy,
    /// Secondary electronic-energy marker of the single-point text.
    TotalEnergyFallback,
    /// Polarized-SCF marker (frozen and polarized decomposition variants).
    PolarizedScf,
    /// Final converged SCF-iteration line (full decomposition variant).
    ScfConvergence,
}

impl BaseEnergySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseEnergySource::FinalEnergy => "final_energy",
            BaseEnergySource::TotalEnergyFallback => "total_energy_fallback",
            BaseEnergySource::PolarizedScf => "polarized_scf",
            BaseEnergySource::ScfConvergence => "scf_convergence",
        }
    }
}

/// Mode-specific resolved base energy of a single-point record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaseEnergy {
    pub kcal_per_mol: f64,
    pub source: BaseEnergySource,
}

/// Which source produced the cavity-dispersion-solvent term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CdsSource {
    /// Difference of the two named free-energy components of the
    /// optimization output (authoritative).
    Components,
    /// Summary value of the optimization output (components missing).
    OptSummary,
}

impl CdsSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CdsSource::Components => "opt_components",
            CdsSource::OptSummary => "opt_summary",
        }
    }
}

/// Cavity-dispersion-solvent correction with its cross-validation outcomes.
/// Validation failures are recorded, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CdsCorrection {
    pub hartree: f64,
    pub kcal_per_mol: f64,
    pub source: CdsSource,
    /// Agreement with the optimization-output summary to 4 decimals, when
    /// that summary was present.
    pub opt_summary_ok: Option<bool>,
    /// Agreement with the single-point-output total to 3 decimals, when
    /// that total was present.
    pub sp_total_ok: Option<bool>,
}

/// Quasi-RRHO treatment parameters reported alongside the corrections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QrrhoParams {
    pub alpha: u32,
    pub omega_cm: u32,
}

/// The flat result of extracting one completed calculation. Carries the full
/// identity as provenance plus every extracted quantity; fallback and
/// validation decisions are retained as fields, not silently discarded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub identity: CalculationIdentity,
    /// Step-1 electronic energy. Extraction fails without it.
    pub electronic_energy: Quantity,
    /// Whether the secondary electronic-energy marker was used.
    pub energy_fallback: bool,
    pub enthalpy_corr: Option<Quantity>,
    pub entropy_corr: Option<Quantity>,
    /// Whether a secondary marker supplied either thermal correction.
    pub correction_fallback: bool,
    pub temperature_k: Option<f64>,
    pub pressure_atm: Option<f64>,
    pub zero_point_energy: Option<Quantity>,
    pub imaginary_frequencies: Option<u32>,
    pub convergence: Option<Convergence>,
    pub qrrho: Option<QrrhoParams>,
    pub base_energy: Option<BaseEnergy>,
    pub cds: Option<CdsCorrection>,
    /// Counterpoise correction, full decomposition variant only.
    pub bsse: Option<Quantity>,
    /// Derived enthalpy H (kcal/mol).
    pub enthalpy: Option<f64>,
    /// Derived Gibbs free energy G (kcal/mol).
    pub gibbs: Option<f64>,
}

impl ResultRecord {
    /// The most fully-corrected electronic energy available for this record,
    /// in kcal/mol: the mode-specific base energy when resolved, plus the
    /// solvent and counterpoise corrections when extracted.
    pub fn effective_energy_kcal(&self) -> f64 {
        let mut energy = self
            .base_energy
            .map(|b| b.kcal_per_mol)
            .unwrap_or(self.electronic_energy.canonical);
        if let Some(cds) = &self.cds {
            energy += cds.kcal_per_mol;
        }
        if let Some(bsse) = &self.bsse {
            energy += bsse.canonical;
        }
        energy
    }
}
