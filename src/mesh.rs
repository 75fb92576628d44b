use glam::DVec3;

use crate::error::{DataShapeError, OutOfBounds};
use crate::types::CellId;

/// A right rectangular prism, the cell of the discretized 3D domain.
///
/// Bounds follow the x → North, y → East, z → Down convention, so
/// `min.z` is the top of the prism and `max.z` the bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prism {
    pub min: DVec3,
    pub max: DVec3,
}

impl Prism {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> DVec3 {
        0.5 * (self.min + self.max)
    }
}

/// A regular 3D mesh of prisms with an active/inactive mask.
///
/// Cells are identified by the flat index `i + j*nx + k*nx*ny`, where
/// `i` runs along x, `j` along y, and `k` along z (downward). Cells
/// masked out by topography are inactive: they never appear as
/// neighbors and may not host seeds.
#[derive(Debug, Clone)]
pub struct PrismMesh {
    min: DVec3,
    shape: (usize, usize, usize),
    spacing: DVec3,
    active: Vec<bool>,
}

impl PrismMesh {
    /// Divides the volume between `min` and `max` into
    /// `shape = (nx, ny, nz)` prisms, all active.
    pub fn new(min: DVec3, max: DVec3, shape: (usize, usize, usize)) -> Self {
        let (nx, ny, nz) = shape;
        let spacing = DVec3::new(
            (max.x - min.x) / nx as f64,
            (max.y - min.y) / ny as f64,
            (max.z - min.z) / nz as f64,
        );
        Self {
            min,
            shape,
            spacing,
            active: vec![true; nx * ny * nz],
        }
    }

    /// Total number of cells, active or not.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.shape
    }

    /// Cell size along each axis.
    pub fn spacing(&self) -> DVec3 {
        self.spacing
    }

    pub fn is_active(&self, index: CellId) -> bool {
        self.active.get(index).copied().unwrap_or(false)
    }

    fn grid(&self, index: CellId) -> (usize, usize, usize) {
        let (nx, ny, _) = self.shape;
        (index % nx, (index / nx) % ny, index / (nx * ny))
    }

    /// Returns the prism geometry of the cell at `index`.
    ///
    /// ### Returns
    /// The cell bounds, or [`OutOfBounds`] if `index` maps outside the
    /// grid. Inactive cells still have geometry.
    pub fn cell(&self, index: CellId) -> Result<Prism, OutOfBounds> {
        if index >= self.len() {
            return Err(OutOfBounds {
                index,
                size: self.len(),
            });
        }
        let (i, j, k) = self.grid(index);
        let offset = DVec3::new(i as f64, j as f64, k as f64) * self.spacing;
        let min = self.min + offset;
        Ok(Prism::new(min, min + self.spacing))
    }

    /// Center coordinates of the cell at `index`.
    pub fn center(&self, index: CellId) -> Result<DVec3, OutOfBounds> {
        Ok(self.cell(index)?.center())
    }

    /// Face-adjacent (6-connectivity) active neighbors of a cell.
    ///
    /// Boundary cells simply return fewer candidates; inactive cells
    /// are excluded. The result is ordered by ascending flat index.
    pub fn neighbors(&self, index: CellId) -> Vec<CellId> {
        let (nx, ny, nz) = self.shape;
        let (i, j, k) = self.grid(index);
        let mut out = Vec::with_capacity(6);
        if k > 0 {
            out.push(index - nx * ny);
        }
        if j > 0 {
            out.push(index - nx);
        }
        if i > 0 {
            out.push(index - 1);
        }
        if i + 1 < nx {
            out.push(index + 1);
        }
        if j + 1 < ny {
            out.push(index + nx);
        }
        if k + 1 < nz {
            out.push(index + nx * ny);
        }
        out.retain(|&n| self.is_active(n));
        out
    }

    /// Finds the cell that contains `point`, if any.
    ///
    /// Points on the upper boundary of the volume are clamped into the
    /// last cell along that axis. Returns `None` for points outside
    /// the mesh volume; the cell may be inactive.
    pub fn locate(&self, point: DVec3) -> Option<CellId> {
        let (nx, ny, nz) = self.shape;
        let rel = (point - self.min) / self.spacing;
        if rel.x < 0.0 || rel.y < 0.0 || rel.z < 0.0 {
            return None;
        }
        let clamp = |v: f64, n: usize| -> Option<usize> {
            // A zero-cell axis contains no point.
            if n == 0 {
                return None;
            }
            let c = v.floor() as usize;
            if c < n {
                Some(c)
            } else if v <= n as f64 {
                // On the far face of the volume.
                Some(n - 1)
            } else {
                None
            }
        };
        let i = clamp(rel.x, nx)?;
        let j = clamp(rel.y, ny)?;
        let k = clamp(rel.z, nz)?;
        Some(i + j * nx + k * nx * ny)
    }

    /// Deactivates cells above the topographic surface.
    ///
    /// `surface` gives the z coordinate of the ground per column, in
    /// x-fastest order (`nx * ny` entries). A cell is masked out when
    /// its center lies above (smaller z than) the surface of its
    /// column. Masking is cumulative with previous calls.
    pub fn apply_topography(&mut self, surface: &[f64]) -> Result<(), DataShapeError> {
        let (nx, ny, nz) = self.shape;
        if surface.len() != nx * ny {
            return Err(DataShapeError {
                positions: nx * ny,
                values: surface.len(),
            });
        }
        for k in 0..nz {
            let zc = self.min.z + (k as f64 + 0.5) * self.spacing.z;
            for (col, &ground) in surface.iter().enumerate() {
                if zc < ground {
                    self.active[col + k * nx * ny] = false;
                }
            }
        }
        Ok(())
    }

    /// Explicitly activates or deactivates a single cell.
    pub fn set_active(&mut self, index: CellId, active: bool) -> Result<(), OutOfBounds> {
        if index >= self.len() {
            return Err(OutOfBounds {
                index,
                size: self.len(),
            });
        }
        self.active[index] = active;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> PrismMesh {
        // 3x3x3 mesh over a 3 m cube, unit cells.
        PrismMesh::new(DVec3::ZERO, DVec3::splat(3.0), (3, 3, 3))
    }

    #[test]
    fn cell_returns_bounds_and_rejects_out_of_range() {
        let mesh = cube();
        let p = mesh.cell(0).unwrap();
        assert_eq!(p.min, DVec3::ZERO);
        assert_eq!(p.max, DVec3::splat(1.0));

        // Last cell sits at the far corner.
        let p = mesh.cell(26).unwrap();
        assert_eq!(p.min, DVec3::splat(2.0));

        let err = mesh.cell(27).unwrap_err();
        assert_eq!(err, OutOfBounds { index: 27, size: 27 });
    }

    #[test]
    fn interior_cell_has_six_neighbors_corner_has_three() {
        let mesh = cube();
        // Center of the 3x3x3 grid.
        let center = 1 + 3 + 9;
        let n = mesh.neighbors(center);
        assert_eq!(n, vec![4, 10, 12, 14, 16, 22]);

        // Origin corner.
        assert_eq!(mesh.neighbors(0), vec![1, 3, 9]);
    }

    #[test]
    fn neighbors_skip_inactive_cells() {
        let mut mesh = cube();
        mesh.set_active(1, false).unwrap();
        assert_eq!(mesh.neighbors(0), vec![3, 9]);
    }

    #[test]
    fn locate_maps_points_to_cells() {
        let mesh = cube();
        assert_eq!(mesh.locate(DVec3::new(0.5, 0.5, 0.5)), Some(0));
        assert_eq!(mesh.locate(DVec3::new(2.5, 2.5, 2.5)), Some(26));
        // The far face is clamped into the last cell.
        assert_eq!(mesh.locate(DVec3::splat(3.0)), Some(26));
        assert_eq!(mesh.locate(DVec3::new(-0.1, 0.5, 0.5)), None);
        assert_eq!(mesh.locate(DVec3::new(0.5, 0.5, 3.1)), None);
    }

    #[test]
    fn zero_cell_axis_yields_an_empty_mesh_without_panicking() {
        let mesh = PrismMesh::new(DVec3::ZERO, DVec3::splat(1.0), (0, 2, 2));
        assert_eq!(mesh.len(), 0);
        assert!(mesh.is_empty());
        assert_eq!(mesh.locate(DVec3::splat(0.5)), None);
        assert_eq!(mesh.locate(DVec3::ZERO), None);
        assert!(mesh.cell(0).is_err());
    }

    #[test]
    fn topography_masks_cells_above_the_surface() {
        let mut mesh = cube();
        // Ground at z = 1 everywhere: the whole first layer (centers at
        // z = 0.5) is above ground.
        mesh.apply_topography(&[1.0; 9]).unwrap();
        for idx in 0..9 {
            assert!(!mesh.is_active(idx));
        }
        for idx in 9..27 {
            assert!(mesh.is_active(idx));
        }
    }

    #[test]
    fn topography_rejects_wrong_column_count() {
        let mut mesh = cube();
        assert!(mesh.apply_topography(&[0.0; 4]).is_err());
    }
}
