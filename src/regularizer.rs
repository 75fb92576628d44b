use glam::DVec3;

use crate::mesh::PrismMesh;

/// The compactness regularizer.
///
/// Penalizes candidate cells by their distance to the running centroid
/// of the seed body they would join, keeping estimated bodies
/// concentrated around their seeds. Distances are normalized by the
/// mean extent of the mesh so the penalty is commensurate with the
/// normalized data misfit, then raised to `power`.
///
/// The penalty only competes with data-misfit reduction in the
/// combined score; it never rejects a candidate on its own.
#[derive(Debug, Clone, Copy)]
pub struct Compactness {
    weight: f64,
    power: i32,
}

impl Compactness {
    /// Builds the regularizer for a mesh, normalizing by the mean of
    /// the mesh extents along the three axes.
    pub fn new(mesh: &PrismMesh, power: i32) -> Self {
        let (nx, ny, nz) = mesh.shape();
        let d = mesh.spacing();
        let extent = (nx as f64 * d.x + ny as f64 * d.y + nz as f64 * d.z) / 3.0;
        let weight = if extent > 0.0 { 1.0 / extent } else { 1.0 };
        Self { weight, power }
    }

    /// Increase of the compactness penalty when a cell centered at
    /// `cell_center` joins a body with the given centroid.
    pub fn gain(&self, cell_center: DVec3, centroid: DVec3) -> f64 {
        let dist = (cell_center - centroid).length();
        self.weight * dist.powi(self.power)
    }
}
