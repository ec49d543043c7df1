//! Fixed-order result extraction from completed calculation outputs.
//!
//! Extraction proceeds energy → thermal corrections → mode-specific base
//! energy → solvent correction → counterpoise correction → derived values,
//! because later steps depend on earlier ones. A missing electronic energy
//! is fatal for the record; everything else is optional and recorded with
//! its provenance.

use crate::core::constants;
use crate::core::models::identity::{CalculationIdentity, Variant};
use crate::core::models::record::{
    BaseEnergy, BaseEnergySource, CdsCorrection, CdsSource, Convergence, QrrhoParams, Quantity,
    ResultRecord,
};
use crate::core::units::{self, EnergyUnit};
use crate::engine::error::EngineError;
use crate::engine::patterns;
use regex::Regex;
use tracing::warn;

/// Tolerance for the optimization-output CDS summary cross-check (4 dp).
const CDS_OPT_TOLERANCE: f64 = 1e-4;
/// Tolerance for the single-point-output CDS total cross-check (3 dp).
const CDS_SP_TOLERANCE: f64 = 1e-3;

/// Value, unit, and whether the secondary marker supplied it.
fn value_with_fallback(
    content: &str,
    primary: &Regex,
    fallback: &Regex,
    default_unit: EnergyUnit,
) -> Option<(f64, EnergyUnit, bool)> {
    for (pattern, used_fallback) in [(primary, false), (fallback, true)] {
        if let Some(caps) = pattern.captures(content) {
            let value = caps[1].parse::<f64>().ok()?;
            let unit = caps
                .get(2)
                .map(|m| m.as_str())
                .map(|token| {
                    EnergyUnit::parse(token).unwrap_or_else(|| {
                        warn!(token, "unrecognized unit token; assuming {default_unit}");
                        default_unit
                    })
                })
                .unwrap_or(default_unit);
            return Some((value, unit, used_fallback));
        }
    }
    None
}

fn last_capture(content: &str, pattern: &Regex) -> Option<f64> {
    pattern
        .captures_iter(content)
        .last()
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

/// Extracts a record from an optimization output.
pub fn extract_opt(
    content: &str,
    identity: &CalculationIdentity,
) -> Result<ResultRecord, EngineError> {
    let mut record = extract_common(content, identity)?;

    // Thermal corrections, each independently falling back to the
    // non-QRRHO marker. Units convert at the point of extraction.
    if let Some((value, unit, fb)) = value_with_fallback(
        content,
        &patterns::QRRHO_TOTAL_ENTHALPY,
        &patterns::TOTAL_ENTHALPY_FALLBACK,
        EnergyUnit::KcalPerMol,
    ) {
        record.enthalpy_corr = Some(Quantity::energy(value, unit));
        record.correction_fallback |= fb;
    }
    if let Some((value, unit, fb)) = value_with_fallback(
        content,
        &patterns::QRRHO_TOTAL_ENTROPY,
        &patterns::TOTAL_ENTROPY_FALLBACK,
        EnergyUnit::CalPerMolK,
    ) {
        record.entropy_corr = Some(Quantity::entropy(value, unit));
        record.correction_fallback |= fb;
    }

    if let Some(caps) = patterns::THERMODYNAMICS.captures(content) {
        record.temperature_k = caps[1].parse().ok();
        record.pressure_atm = caps[2].parse().ok();
    }
    if let Some(caps) = patterns::QRRHO_PARAMETERS.captures(content) {
        if let (Ok(alpha), Ok(omega_cm)) = (caps[1].parse(), caps[2].parse()) {
            record.qrrho = Some(QrrhoParams { alpha, omega_cm });
        }
    }
    if let Some(caps) = patterns::ZERO_POINT_ENERGY.captures(content) {
        if let Ok(value) = caps[1].parse::<f64>() {
            let unit = EnergyUnit::parse(&caps[2]).unwrap_or(EnergyUnit::KcalPerMol);
            record.zero_point_energy = Some(Quantity::energy(value, unit));
        }
    }

    derive_thermochemistry(&mut record);
    Ok(record)
}

/// Extracts a record from a single-point output. `opt_content` is the text
/// of the optimization this single point depends on; it is required for the
/// solvent-correction components and is supplied by the caller from the
/// per-group cache.
pub fn extract_sp(
    sp_content: &str,
    opt_content: Option<&str>,
    identity: &CalculationIdentity,
) -> Result<ResultRecord, EngineError> {
    let mut record = extract_common(sp_content, identity)?;

    // Mode-specific base-energy resolution: the two decomposition markers
    // are mutually exclusive by variant; a plain single point reuses the
    // electronic-energy marker.
    record.base_energy = match identity.variant {
        Some(Variant::FullCat) => last_capture(sp_content, &patterns::SCF_CONVERGED)
            .map(|hartree| BaseEnergy {
                kcal_per_mol: units::to_kcal_per_mol(hartree, EnergyUnit::Hartree),
                source: BaseEnergySource::ScfConvergence,
            })
            .or_else(|| {
                warn!(species = %identity.species, "no converged SCF line in full-variant output");
                None
            }),
        Some(Variant::PolCat) | Some(Variant::FrzCat) => {
            last_capture(sp_content, &patterns::EDA_POLARIZED)
                .map(|hartree| BaseEnergy {
                    kcal_per_mol: units::to_kcal_per_mol(hartree, EnergyUnit::Hartree),
                    source: BaseEnergySource::PolarizedScf,
                })
                .or_else(|| {
                    warn!(species = %identity.species, "no polarized-SCF marker in decomposition output");
                    None
                })
        }
        None => Some(BaseEnergy {
            kcal_per_mol: record.electronic_energy.canonical,
            source: if record.energy_fallback {
                BaseEnergySource::TotalEnergyFallback
            } else {
                BaseEnergySource::FinalEnergy
            },
        }),
    };

    // Solvent correction applies when the single-point method combo carries
    // an implicit-solvent model.
    let solvated = identity
        .sp_combo
        .as_ref()
        .is_some_and(|combo| combo.solvent.is_some());
    if solvated {
        record.cds = parse_cds(opt_content, Some(sp_content));
        if record.cds.is_none() {
            warn!(species = %identity.species, "solvated single point without extractable CDS term");
        }
    }

    // Counterpoise correction, full decomposition variant only. The tool
    // reports it in kJ/mol.
    if identity.variant == Some(Variant::FullCat) {
        if let Some(kjmol) = last_capture(sp_content, &patterns::EDA_BSSE) {
            let hartree = kjmol * constants::KJMOL_TO_HARTREE;
            record.bsse = Some(Quantity {
                value: kjmol,
                unit: EnergyUnit::KjPerMol,
                canonical: units::to_kcal_per_mol(hartree, EnergyUnit::Hartree),
            });
        }
    }

    derive_thermochemistry(&mut record);
    Ok(record)
}

/// Step 1 plus the always-scanned markers shared by both modes.
fn extract_common(
    content: &str,
    identity: &CalculationIdentity,
) -> Result<ResultRecord, EngineError> {
    let (value, unit, fallback) = value_with_fallback(
        content,
        &patterns::FINAL_ENERGY,
        &patterns::FINAL_ENERGY_FALLBACK,
        EnergyUnit::Hartree,
    )
    .ok_or_else(|| EngineError::MissingEnergy {
        path: identity.output_rel_path(),
    })?;

    let convergence = patterns::OPTIMIZATION_STATUS.captures(content).map(|caps| {
        if &caps[1] == "TRANSITION STATE CONVERGED" {
            Convergence::TransitionState
        } else {
            Convergence::Minimum
        }
    });
    let imaginary_frequencies = patterns::IMAGINARY_FREQUENCIES
        .captures(content)
        .and_then(|caps| caps[1].parse().ok());

    Ok(ResultRecord {
        identity: identity.clone(),
        electronic_energy: Quantity::energy(value, unit),
        energy_fallback: fallback,
        enthalpy_corr: None,
        entropy_corr: None,
        correction_fallback: false,
        temperature_k: None,
        pressure_atm: None,
        zero_point_energy: None,
        imaginary_frequencies,
        convergence,
        qrrho: None,
        base_energy: None,
        cds: None,
        bsse: None,
        enthalpy: None,
        gibbs: None,
    })
}

/// Derived values, computed only when every input is present, on the most
/// fully-corrected energy available.
fn derive_thermochemistry(record: &mut ResultRecord) {
    let energy = record.effective_energy_kcal();
    if let Some(dh) = record.enthalpy_corr {
        record.enthalpy = Some(energy + dh.canonical);
    }
    if let (Some(h), Some(t), Some(ds)) =
        (record.enthalpy, record.temperature_k, record.entropy_corr)
    {
        record.gibbs = Some(h - t * ds.canonical);
    }
}

/// Cavity-dispersion-solvent term with cross-file validation.
///
/// Primary source is the difference of the two named free-energy components
/// of the optimization output (last occurrences); this is cross-validated
/// against the optimization summary (4 dp) and the single-point total
/// (3 dp). A failed cross-check logs a warning and the component-derived
/// value is kept; the summary is used only when the components are absent.
pub fn parse_cds(opt_content: Option<&str>, sp_content: Option<&str>) -> Option<CdsCorrection> {
    let mut source = None;
    let mut hartree = 0.0;
    let mut kcal = 0.0;
    let mut opt_summary_ok = None;

    if let Some(opt) = opt_content {
        let g_s = last_capture(opt, &patterns::SMD_G_S);
        let g_enp = last_capture(opt, &patterns::SMD_G_ENP);
        let summary = last_capture(opt, &patterns::SMD_CDS_SUMMARY);

        if let (Some(g_s), Some(g_enp)) = (g_s, g_enp) {
            hartree = g_s - g_enp;
            kcal = units::to_kcal_per_mol(hartree, EnergyUnit::Hartree);
            source = Some(CdsSource::Components);
            if let Some(summary_kcal) = summary {
                let ok = (kcal - summary_kcal).abs() <= CDS_OPT_TOLERANCE;
                if !ok {
                    warn!(
                        components = format!("{kcal:.4}"),
                        summary = format!("{summary_kcal:.4}"),
                        "CDS validation failed against optimization summary (4 dp)"
                    );
                }
                opt_summary_ok = Some(ok);
            }
        } else if let Some(summary_kcal) = summary {
            kcal = summary_kcal;
            hartree = units::convert(kcal, EnergyUnit::KcalPerMol, EnergyUnit::Hartree)
                .unwrap_or(kcal / constants::HARTREE_TO_KCALMOL);
            source = Some(CdsSource::OptSummary);
        }
    }

    let source = source?;

    let sp_total_ok = sp_content
        .and_then(|sp| last_capture(sp, &patterns::SMD_CDS_SP_TOTAL))
        .map(|sp_total| {
            let ok = (kcal - sp_total).abs() <= CDS_SP_TOLERANCE;
            if !ok {
                warn!(
                    derived = format!("{kcal:.3}"),
                    sp_total = format!("{sp_total:.3}"),
                    "CDS validation failed against single-point total (3 dp)"
                );
            }
            ok
        });

    Some(CdsCorrection {
        hartree,
        kcal_per_mol: kcal,
        source,
        opt_summary_ok,
        sp_total_ok,
    })
}
