//! Compiled markers for the external tool's output text.
//!
//! Every numeric quantity the pipeline extracts is anchored to one of these
//! patterns. They are compiled once per process; all scanning is plain
//! text-over-regex, no stateful parsing.

use once_cell::sync::Lazy;
use regex::Regex;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern must compile")
}

/// Primary electronic-energy marker, optional unit token.
pub static FINAL_ENERGY: Lazy<Regex> =
    Lazy::new(|| re(r"(?m)Final energy is\s+([-+]?\d+\.\d+)(?:[ \t]+([A-Za-z][A-Za-z0-9./\-]*))?\s*$"));

/// Secondary electronic-energy marker, used when the primary is absent.
pub static FINAL_ENERGY_FALLBACK: Lazy<Regex> =
    Lazy::new(|| re(r"(?m)Total energy =\s+([-+]?\d+\.\d+)(?:[ \t]+([A-Za-z][A-Za-z0-9./\-]*))?\s*$"));

pub static OPTIMIZATION_STATUS: Lazy<Regex> =
    Lazy::new(|| re(r"(OPTIMIZATION CONVERGED|TRANSITION STATE CONVERGED)"));

pub static THERMODYNAMICS: Lazy<Regex> = Lazy::new(|| {
    re(r"STANDARD THERMODYNAMIC QUANTITIES AT\s+([-+]?\d+\.\d+)\s*K\s+AND\s+([-+]?\d+\.\d+)\s*ATM")
});

pub static IMAGINARY_FREQUENCIES: Lazy<Regex> =
    Lazy::new(|| re(r"This Molecule has\s+(\d+)\s+Imaginary Frequencies"));

pub static ZERO_POINT_ENERGY: Lazy<Regex> = Lazy::new(|| {
    re(r"(?m)Zero point vibrational energy:\s+([-+]?\d+\.\d+)\s+([A-Za-z][A-Za-z0-9./\-]*)")
});

pub static QRRHO_PARAMETERS: Lazy<Regex> = Lazy::new(|| {
    re(r"Quasi-RRHO corrections using alpha\s*=\s*(\d+),\s*and omega\s*=\s*(\d+)\s*cm\^-1")
});

pub static QRRHO_TOTAL_ENTHALPY: Lazy<Regex> = Lazy::new(|| {
    re(r"(?m)QRRHO-Total Enthalpy:\s+([-+]?\d+\.\d+)\s+([A-Za-z][A-Za-z0-9./\-]*)")
});

pub static TOTAL_ENTHALPY_FALLBACK: Lazy<Regex> = Lazy::new(|| {
    re(r"(?m)Total Enthalpy:\s+([-+]?\d+\.\d+)\s+([A-Za-z][A-Za-z0-9./\-]*)")
});

pub static QRRHO_TOTAL_ENTROPY: Lazy<Regex> = Lazy::new(|| {
    re(r"(?m)QRRHO-Total Entropy:\s+([-+]?\d+\.\d+)\s+([A-Za-z][A-Za-z0-9./\-]*)")
});

pub static TOTAL_ENTROPY_FALLBACK: Lazy<Regex> = Lazy::new(|| {
    re(r"(?m)Total Entropy:\s+([-+]?\d+\.\d+)\s+([A-Za-z][A-Za-z0-9./\-]*)")
});

/// Elect-nuc-pol free energy of the system, implicit-solvent summary block.
pub static SMD_G_ENP: Lazy<Regex> = Lazy::new(|| {
    re(r"(?m)\(3\)\s+G-ENP\(liq\) elect-nuc-pol free energy of system\s+([-+]?\d+\.\d+)\s+a\.u\.")
});

/// Total free energy of the system in solution, same block.
pub static SMD_G_S: Lazy<Regex> =
    Lazy::new(|| re(r"(?m)\(6\)\s+G-S\(liq\) free energy of system\s+([-+]?\d+\.\d+)\s+a\.u\."));

/// Reported cavity-dispersion-solvent summary of the optimization output.
pub static SMD_CDS_SUMMARY: Lazy<Regex> =
    Lazy::new(|| re(r"(?m)G_CDS\s+=\s+([-+]?\d+\.\d+)\s+kcal/mol"));

/// Cavity-dispersion-solvent total of the single-point output.
pub static SMD_CDS_SP_TOTAL: Lazy<Regex> =
    Lazy::new(|| re(r"(?m)Total:\s+([-+]?\d+\.\d+)\s*\n\s*-+"));

/// Polarized-SCF base energy of the frozen/polarized decomposition
/// variants, in Hartree.
pub static EDA_POLARIZED: Lazy<Regex> =
    Lazy::new(|| re(r"(?m)^\s*Polarized SCF energy\s*=\s*([-+]?\d+\.\d+)"));

/// Final converged SCF-iteration line; the full decomposition variant takes
/// its base energy from the last occurrence, in Hartree.
pub static SCF_CONVERGED: Lazy<Regex> = Lazy::new(|| {
    re(r"(?m)^\s*\d+\s+([-+]?\d+\.\d+)\s+[0-9.eE+-]+\s+Convergence criterion met")
});

/// Counterpoise correction of the full decomposition variant, in kJ/mol.
pub static EDA_BSSE: Lazy<Regex> =
    Lazy::new(|| re(r"(?m)^\s*BSSE \(kJ/mol\)\s*=\s*([-+]?\d+\.\d+)"));

pub static TOTAL_JOB_TIME: Lazy<Regex> = Lazy::new(|| re(r"Total job time:\s*(.*)"));

pub static WALL_SECONDS: Lazy<Regex> = Lazy::new(|| re(r"([0-9]+(?:\.[0-9]+)?)s\(wall\)"));

/// Body of the tool's fatal-error report: everything after the banner line,
/// up to the first blank line.
pub static FATAL_ERROR_BODY: Lazy<Regex> =
    Lazy::new(|| re(r"(?s)fatal error occurred.*?\n\s*(.*?)(?:\n{2,}|\z)"));

/// Clause boundary used to truncate the tool's error messages to their first
/// sentence.
pub static CLAUSE_BOUNDARY: Lazy<Regex> = Lazy::new(|| re(r"[.;]|\band\b"));

/// Last coordinate block of an optimization output.
pub static NUCLEAR_ORIENTATION: Lazy<Regex> = Lazy::new(|| re(r"Standard Nuclear Orientation"));

/// One coordinate line: index, element, x, y, z.
pub static COORD_LINE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?m)^\s*\d+\s+([A-Za-z]+)\s+([-+]?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)[ \t]+([-+]?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)[ \t]+([-+]?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_energy_captures_value_and_unit() {
        let caps = FINAL_ENERGY.captures("Final energy is   -100.123456 Ha\n").unwrap();
        assert_eq!(&caps[1], "-100.123456");
        assert_eq!(caps.get(2).unwrap().as_str(), "Ha");
    }

    #[test]
    fn final_energy_unit_is_optional() {
        let caps = FINAL_ENERGY.captures("Final energy is -1.5\n").unwrap();
        assert_eq!(&caps[1], "-1.5");
        assert!(caps.get(2).is_none());
    }

    #[test]
    fn scf_converged_matches_iteration_line() {
        let text = "  9    -629.3186942441      2.50e-08  Convergence criterion met\n";
        let caps = SCF_CONVERGED.captures(text).unwrap();
        assert_eq!(&caps[1], "-629.3186942441");
    }

    #[test]
    fn sp_total_requires_separator_line() {
        let text = "Total:       -5.364\n ---------------\n";
        assert_eq!(&SMD_CDS_SP_TOTAL.captures(text).unwrap()[1], "-5.364");
        assert!(SMD_CDS_SP_TOTAL.captures("Total: -5.364\n").is_none());
    }
}
