//! Tabular export of result records and assembled profiles.

use crate::core::models::profile::PathwayProfile;
use crate::core::models::record::ResultRecord;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

fn fmt_opt_u32(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes the flat record table: identity metadata first, then the
/// extracted quantities in canonical units, then the provenance flags.
pub fn write_records_csv(path: &Path, records: &[ResultRecord]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "Method",
        "Category",
        "Branch",
        "Calc_Type",
        "Mode",
        "SP_Method",
        "Identifier",
        "Species",
        "E",
        "E Unit",
        "E (kcal/mol)",
        "Enthalpy Corr. (kcal/mol)",
        "Entropy Corr. (kcal/mol.K)",
        "Temperature (K)",
        "Pressure (atm)",
        "ZPE (kcal/mol)",
        "Imaginary Frequencies",
        "Convergence",
        "Base Energy (kcal/mol)",
        "Base Source",
        "CDS (kcal/mol)",
        "CDS Source",
        "BSSE (kcal/mol)",
        "H (kcal/mol)",
        "G (kcal/mol)",
        "Energy Fallback",
        "Correction Fallback",
    ])?;

    for record in records {
        let id = &record.identity;
        writer.write_record([
            id.combo.method.clone(),
            id.category.as_str().to_owned(),
            id.branch.as_str().to_owned(),
            id.variant.map(|v| v.as_str().to_owned()).unwrap_or_default(),
            id.mode.as_str().to_owned(),
            id.sp_combo.as_ref().map(|c| c.method.clone()).unwrap_or_default(),
            id.file_stem(),
            id.species.clone(),
            format!("{:.10}", record.electronic_energy.value),
            record.electronic_energy.unit.to_string(),
            format!("{:.6}", record.electronic_energy.canonical),
            fmt_opt(record.enthalpy_corr.map(|q| q.canonical)),
            fmt_opt(record.entropy_corr.map(|q| q.canonical)),
            fmt_opt(record.temperature_k),
            fmt_opt(record.pressure_atm),
            fmt_opt(record.zero_point_energy.map(|q| q.canonical)),
            fmt_opt_u32(record.imaginary_frequencies),
            record.convergence.map(|c| c.as_str().to_owned()).unwrap_or_default(),
            fmt_opt(record.base_energy.map(|b| b.kcal_per_mol)),
            record
                .base_energy
                .map(|b| b.source.as_str().to_owned())
                .unwrap_or_default(),
            fmt_opt(record.cds.map(|c| c.kcal_per_mol)),
            record.cds.map(|c| c.source.as_str().to_owned()).unwrap_or_default(),
            fmt_opt(record.bsse.map(|q| q.canonical)),
            fmt_opt(record.enthalpy),
            fmt_opt(record.gibbs),
            if record.energy_fallback { "yes" } else { "no" }.to_owned(),
            if record.correction_fallback { "yes" } else { "no" }.to_owned(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Which stage set of a pathway to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSelection {
    Raw,
    Electronic,
    Gibbs,
}

/// Writes assembled pathway profiles, one row per stage.
pub fn write_profiles_csv(
    path: &Path,
    profiles: &[PathwayProfile],
    selection: ProfileSelection,
) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "Pathway",
        "Stage",
        "Calc_Type",
        "Species",
        "E (kcal/mol)",
        "G (kcal/mol)",
        "Source",
    ])?;

    for profile in profiles {
        let pathway = profile.catalyst.as_deref().unwrap_or("uncatalyzed");
        let stages = match selection {
            ProfileSelection::Raw => &profile.raw,
            ProfileSelection::Electronic => &profile.by_electronic,
            ProfileSelection::Gibbs => &profile.by_gibbs,
        };
        for stage in stages {
            writer.write_record([
                pathway.to_owned(),
                stage.stage.as_str().to_owned(),
                stage.variant.map(|v| v.as_str().to_owned()).unwrap_or_default(),
                stage.species_label(),
                format!("{:.6}", stage.electronic_kcal),
                fmt_opt(stage.gibbs_kcal),
                stage.source.as_str().to_owned(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}
