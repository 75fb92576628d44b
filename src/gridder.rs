//! Observation point layouts for synthetic and real surveys.

use glam::DVec3;
use rand::Rng;

/// A regular grid of observation points over `area = (x1, x2, y1, y2)`
/// at constant height `z`, with `shape = (nx, ny)` points per axis.
///
/// Points include both endpoints of each axis and are ordered
/// x-fastest, matching the mesh column order.
pub fn regular(area: (f64, f64, f64, f64), shape: (usize, usize), z: f64) -> Vec<DVec3> {
    let (x1, x2, y1, y2) = area;
    let (nx, ny) = shape;
    let step = |lo: f64, hi: f64, n: usize, i: usize| {
        if n > 1 {
            lo + (hi - lo) * i as f64 / (n - 1) as f64
        } else {
            lo
        }
    };
    let mut points = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            points.push(DVec3::new(
                step(x1, x2, nx, i),
                step(y1, y2, ny, j),
                z,
            ));
        }
    }
    points
}

/// `count` observation points scattered uniformly over the area at
/// constant height `z`.
pub fn scatter(
    area: (f64, f64, f64, f64),
    count: usize,
    z: f64,
    rng: &mut impl Rng,
) -> Vec<DVec3> {
    let (x1, x2, y1, y2) = area;
    (0..count)
        .map(|_| {
            let x = rng.random_range(x1..=x2);
            let y = rng.random_range(y1..=y2);
            DVec3::new(x, y, z)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_covers_the_area_endpoints() {
        let pts = regular((0.0, 10.0, -5.0, 5.0), (3, 2), -1.0);
        assert_eq!(pts.len(), 6);
        assert_eq!(pts[0], DVec3::new(0.0, -5.0, -1.0));
        assert_eq!(pts[2], DVec3::new(10.0, -5.0, -1.0));
        assert_eq!(pts[5], DVec3::new(10.0, 5.0, -1.0));
        assert!(pts.iter().all(|p| p.z == -1.0));
    }

    #[test]
    fn scatter_stays_inside_the_area() {
        let mut rng = rand::rng();
        let pts = scatter((0.0, 10.0, -5.0, 5.0), 50, -1.0, &mut rng);
        assert_eq!(pts.len(), 50);
        for p in pts {
            assert!((0.0..=10.0).contains(&p.x));
            assert!((-5.0..=5.0).contains(&p.y));
            assert_eq!(p.z, -1.0);
        }
    }
}
