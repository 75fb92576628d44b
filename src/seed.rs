use glam::DVec3;
use tracing::info;

use crate::error::ConfigError;
use crate::mesh::PrismMesh;
use crate::types::CellId;

/// Physical properties assigned to every cell a seed accretes.
///
/// The closed set of supported property kinds: density sources feed the
/// gravity and gradient-tensor modules, magnetization sources feed the
/// total-field modules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicalProps {
    /// Density contrast in kg/m^3.
    Density(f64),
    /// Magnetization intensity in A/m with its direction given by
    /// inclination and declination in degrees.
    Magnetization {
        intensity: f64,
        inclination: f64,
        declination: f64,
    },
}

/// A growth origin: a mesh cell plus the properties its body carries.
///
/// The body only ever grows, one cell per accretion, and a cell
/// accreted to one seed is never reassigned. The running sum of body
/// cell centers feeds the compactness regularizer.
#[derive(Debug, Clone)]
pub struct Seed {
    cell: CellId,
    props: PhysicalProps,
    body: Vec<CellId>,
    center_sum: DVec3,
}

impl Seed {
    fn new(cell: CellId, props: PhysicalProps, center: DVec3) -> Self {
        Self {
            cell,
            props,
            body: vec![cell],
            center_sum: center,
        }
    }

    /// The cell the seed was planted in.
    pub fn cell(&self) -> CellId {
        self.cell
    }

    pub fn props(&self) -> &PhysicalProps {
        &self.props
    }

    /// Cells accreted to this seed, in accretion order. The first
    /// entry is always the seed cell itself.
    pub fn body(&self) -> &[CellId] {
        &self.body
    }

    /// Centroid of the current body.
    pub fn centroid(&self) -> DVec3 {
        self.center_sum / self.body.len() as f64
    }

    /// Records an accepted accretion. Called by the engine only.
    pub(crate) fn accrete(&mut self, cell: CellId, center: DVec3) {
        self.body.push(cell);
        self.center_sum += center;
    }
}

/// Plants seeds in the mesh from `(point, properties)` pairs.
///
/// Each point is mapped to the cell that contains it. Fails fast, with
/// nothing partially built, if a point is outside the mesh, falls on
/// an inactive cell, or two seeds land in the same cell.
pub fn sow(mesh: &PrismMesh, raw: &[(DVec3, PhysicalProps)]) -> Result<Vec<Seed>, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::NoSeeds);
    }
    let mut seeds: Vec<Seed> = Vec::with_capacity(raw.len());
    for &(point, props) in raw {
        let cell = mesh
            .locate(point)
            .ok_or(ConfigError::SeedOutsideMesh(point))?;
        if !mesh.is_active(cell) {
            return Err(ConfigError::SeedInactive(point));
        }
        if seeds.iter().any(|s| s.cell == cell) {
            return Err(ConfigError::DuplicateSeed(cell));
        }
        // locate() guarantees the index is in bounds.
        let center = mesh.center(cell).expect("located cell is in bounds");
        seeds.push(Seed::new(cell, props, center));
    }
    info!(count = seeds.len(), "sowed seeds in the mesh");
    Ok(seeds)
}
