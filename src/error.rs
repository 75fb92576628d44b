use glam::DVec3;
use thiserror::Error;

use crate::types::CellId;

/// A cell index that maps outside the mesh grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cell index {index} is outside a mesh of {size} cells")]
pub struct OutOfBounds {
    pub index: CellId,
    pub size: usize,
}

/// Pre-loop validation failures. Nothing is mutated when these are
/// returned; the run never starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("seed point ({}, {}, {}) is outside the mesh", .0.x, .0.y, .0.z)]
    SeedOutsideMesh(DVec3),
    #[error("seed point ({}, {}, {}) falls on an inactive cell", .0.x, .0.y, .0.z)]
    SeedInactive(DVec3),
    #[error("two seeds claim the same cell {0}")]
    DuplicateSeed(CellId),
    #[error("seed cell {0} is not an active cell of this mesh")]
    SeedCellInvalid(CellId),
    #[error("at least one seed is required")]
    NoSeeds,
    #[error("delta must be positive, got {0}")]
    NonPositiveDelta(f64),
    #[error("regul must be non-negative, got {0}")]
    NegativeRegul(f64),
}

/// Mismatched observation arrays at data-module construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("coordinate and value arrays must have the same length, got {positions} and {values}")]
pub struct DataShapeError {
    pub positions: usize,
    pub values: usize,
}
