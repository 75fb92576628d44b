/// Identifier for a cell in a [`crate::mesh::PrismMesh`].
///
/// This is the flat index `i + j*nx + k*nx*ny` of the cell, and is only
/// meaningful within the lifetime of a given mesh instance.
pub type CellId = usize;

/// Index of a seed in the seed list passed to the engine.
pub type SeedId = usize;
