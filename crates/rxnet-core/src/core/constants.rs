//! Physical constants and conversion factors.
//!
//! Values are based on the CODATA 2022 recommended values of the fundamental
//! physical constants unless otherwise stated.
//! Reference: <https://physics.nist.gov/constants> (DOI: 10.1103/RevModPhys.93.025010)

/// Hartree in Joules.
pub const HARTREE_TO_J: f64 = 4.359_744_722_206_0e-18;

/// Multiplier for kilo.
pub const TO_KILO: f64 = 1.0e-3;

/// Hartree in kilojoules.
pub const HARTREE_TO_KJ: f64 = HARTREE_TO_J * TO_KILO;

/// Avogadro's number in mol^-1.
pub const AVOGADRO: f64 = 6.022_140_76e23;

/// Hartree in kJ/mol.
pub const HARTREE_TO_KJMOL: f64 = HARTREE_TO_KJ * AVOGADRO;

/// kJ/mol in kcal/mol (thermochemical calorie).
pub const KJMOL_TO_KCALMOL: f64 = 1.0 / 4.184;

/// Hartree in kcal/mol.
pub const HARTREE_TO_KCALMOL: f64 = HARTREE_TO_KJMOL * KJMOL_TO_KCALMOL;

// Back-conversion used for the counterpoise term, which the external tool
// reports in kJ/mol. Kept distinct until the reported value is adjusted
// upstream.
pub const KJMOL_TO_HARTREE: f64 = 1.0 / 2625.531_158_466_000_3;

/// Boltzmann constant in J/K.
pub const BOLTZMANN: f64 = 1.380_649e-23;

/// Molar gas constant R in J/(mol.K).
pub const MOLAR_GAS_CONSTANT: f64 = AVOGADRO * BOLTZMANN;

/// Standard atmosphere in Pa.
pub const ATM_TO_PA: f64 = 101_325.0;

/// Cubic meters in liters.
pub const M3_TO_L: f64 = 1000.0;
