//! Core 3D potential-field inversion by planting anomalous densities.
//!
//! Grows compact bodies around user-chosen seed cells of a prism mesh so
//! that the accreted physical properties reproduce observed gravity,
//! gravity-gradient, or magnetic data.
//!
//! Main components:
//! - [`mesh`] — regular 3D prism meshes and neighbor topology.
//! - [`kernel`] — closed-form forward kernels for a rectangular prism.
//! - [`data`] — data modules: observed data plus incremental misfit.
//! - [`seed`] — growth seeds and their accreted bodies.
//! - [`regularizer`] — the compactness penalty.
//! - [`engine`] — the greedy accretion loop.
//! - [`config`] — global configuration for the growth algorithm.
//! - [`gridder`] — observation point layouts for surveys.
//! - [`error`] — validation and runtime error types.
//! - [`types`] — shared type aliases and IDs.
//!
//! The coordinate system is x → North, y → East, z → Down. Inputs are in
//! SI units; predicted gravity is in mGal, tensor components in Eötvös,
//! and total-field anomalies in nT.

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod gridder;
pub mod kernel;
pub mod mesh;
pub mod regularizer;
pub mod seed;
pub mod types;
