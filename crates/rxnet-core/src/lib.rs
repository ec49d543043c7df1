//! # rxnet Core Library
//!
//! A campaign manager for combinatorial quantum-chemistry calculations over a
//! reaction network: reactants, products, catalysts, and a matrix of
//! computational methods. The library derives every required calculation's
//! canonical identity and on-disk location, classifies each calculation's
//! lifecycle state from the external tool's raw text output, extracts and
//! reconciles thermodynamic quantities from completed outputs, and assembles
//! per-pathway reaction-energy profiles.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains the immutable configuration model
//!   (`ReactionNetworkConfig`), the derived identity and result records
//!   (`CalculationIdentity`, `ResultRecord`), physical constants, unit
//!   conversion, and I/O utilities.
//!
//! - **[`engine`]: The Logic Core.** Pure functions over text and
//!   configuration: the combinatorial identity enumerator, the lifecycle
//!   status classifier, the fixed-order result-extraction pipeline, and the
//!   input-file synthesizer with its explicit template cache.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   It ties the `engine` and `core` together into complete batch procedures:
//!   input generation, status reporting, result extraction, and profile
//!   assembly. Every workflow recomputes from current configuration and file
//!   contents; nothing is persisted between runs.

pub mod core;
pub mod engine;
pub mod workflows;
