//! Closed-form forward kernels for a right rectangular prism.
//!
//! Gravity and gradient-tensor kernels follow Nagy et al. (2000); the
//! total-field magnetic kernel follows Bhattacharyya (1964). All of
//! them integrate analytically over the prism volume, so a cell's
//! effect on an observation point is a pure function of its bounds and
//! physical property.
//!
//! Inputs are SI; outputs are mGal (gravity), Eötvös (tensor), and nT
//! (magnetics).

use glam::DVec3;

use crate::mesh::Prism;

/// Gravitational constant in m^3 kg^-1 s^-2.
pub const G: f64 = 6.673e-11;

/// Conversion from SI acceleration to mGal.
pub const SI2MGAL: f64 = 1e5;

/// Conversion from SI gradient to Eötvös.
pub const SI2EOTVOS: f64 = 1e9;

/// Proportionality constant of magnetics, mu_0 / (4 pi).
pub const CM: f64 = 1e-7;

/// Conversion from Tesla to nanoTesla.
pub const T2NT: f64 = 1e9;

/// Direction cosines of a vector with the given inclination and
/// declination, both in degrees. Inclination is positive downward and
/// declination is measured from North toward East.
pub fn dircos(inc: f64, dec: f64) -> DVec3 {
    let (inc, dec) = (inc.to_radians(), dec.to_radians());
    DVec3::new(
        inc.cos() * dec.cos(),
        inc.cos() * dec.sin(),
        inc.sin(),
    )
}

/// Shifts the prism corners so that the observation point is the origin.
///
/// Returns `([x2-px, x1-px], [y2-py, y1-py], [z2-pz, z1-pz])`: the
/// corner ordering that gives the conventional `(-1)^(i+j+k)` signs.
fn corner_offsets(prism: &Prism, p: DVec3) -> ([f64; 2], [f64; 2], [f64; 2]) {
    (
        [prism.max.x - p.x, prism.min.x - p.x],
        [prism.max.y - p.y, prism.min.y - p.y],
        [prism.max.z - p.z, prism.min.z - p.z],
    )
}

/// Sums `kernel` over the eight prism corners with alternating signs.
fn corner_sum(prism: &Prism, p: DVec3, kernel: impl Fn(f64, f64, f64, f64) -> f64) -> f64 {
    let (x, y, z) = corner_offsets(prism, p);
    let mut res = 0.0;
    for k in 0..2 {
        for j in 0..2 {
            for i in 0..2 {
                let r = (x[i] * x[i] + y[j] * y[j] + z[k] * z[k]).sqrt();
                let sign = if (i + j + k) % 2 == 0 { 1.0 } else { -1.0 };
                res += sign * kernel(x[i], y[j], z[k], r);
            }
        }
    }
    res
}

/// Vertical gravitational attraction of the prism, in mGal.
pub fn gz(prism: &Prism, density: f64, p: DVec3) -> f64 {
    let res = corner_sum(prism, p, |x, y, z, r| {
        // Minus because the formula is for the gradient of the
        // potential and gravity is -grad(V).
        -(x * (y + r).ln() + y * (x + r).ln() - z * (x * y).atan2(z * r))
    });
    G * SI2MGAL * density * res
}

/// The xx component of the gravity gradient tensor, in Eötvös.
pub fn gxx(prism: &Prism, density: f64, p: DVec3) -> f64 {
    let res = corner_sum(prism, p, |x, y, z, r| (z * y).atan2(x * r));
    G * SI2EOTVOS * density * res
}

/// The xy component of the gravity gradient tensor, in Eötvös.
pub fn gxy(prism: &Prism, density: f64, p: DVec3) -> f64 {
    let res = corner_sum(prism, p, |_x, _y, z, r| -((z + r).ln()));
    G * SI2EOTVOS * density * res
}

/// The xz component of the gravity gradient tensor, in Eötvös.
pub fn gxz(prism: &Prism, density: f64, p: DVec3) -> f64 {
    let res = corner_sum(prism, p, |_x, y, _z, r| -((y + r).ln()));
    G * SI2EOTVOS * density * res
}

/// The yy component of the gravity gradient tensor, in Eötvös.
pub fn gyy(prism: &Prism, density: f64, p: DVec3) -> f64 {
    let res = corner_sum(prism, p, |x, y, z, r| (z * x).atan2(y * r));
    G * SI2EOTVOS * density * res
}

/// The yz component of the gravity gradient tensor, in Eötvös.
pub fn gyz(prism: &Prism, density: f64, p: DVec3) -> f64 {
    let res = corner_sum(prism, p, |x, _y, _z, r| -((x + r).ln()));
    G * SI2EOTVOS * density * res
}

/// The zz component of the gravity gradient tensor, in Eötvös.
pub fn gzz(prism: &Prism, density: f64, p: DVec3) -> f64 {
    let res = corner_sum(prism, p, |x, y, z, r| (x * y).atan2(z * r));
    G * SI2EOTVOS * density * res
}

/// Total-field magnetic anomaly of a uniformly magnetized prism, in nT.
///
/// ### Parameters
/// - `prism` - Source geometry.
/// - `intensity` - Magnetization intensity in A/m.
/// - `mag_dir` - Direction cosines of the magnetization vector.
/// - `field_dir` - Direction cosines of the regional geomagnetic field.
/// - `p` - Observation point.
pub fn total_field(
    prism: &Prism,
    intensity: f64,
    mag_dir: DVec3,
    field_dir: DVec3,
    p: DVec3,
) -> f64 {
    let (mx, my, mz) = (mag_dir.x, mag_dir.y, mag_dir.z);
    let (fx, fy, fz) = (field_dir.x, field_dir.y, field_dir.z);
    let (x, y, z) = corner_offsets(prism, p);
    let mut res = 0.0;
    for k in 0..2 {
        // The z corners carry the opposite sign of the x/y pattern.
        let scale = if k == 0 { -intensity } else { intensity };
        let z_sqr = z[k] * z[k];
        for j in 0..2 {
            let y_sqr = y[j] * y[j];
            for i in 0..2 {
                let x_sqr = x[i] * x[i];
                let xy = x[i] * y[j];
                let r_sqr = x_sqr + y_sqr + z_sqr;
                let r = r_sqr.sqrt();
                let zr = z[k] * r;
                let sign = if (i + j) % 2 == 0 { 1.0 } else { -1.0 };
                res += sign
                    * scale
                    * (0.5 * (my * fz + mz * fy) * ((r - x[i]) / (r + x[i])).ln()
                        + 0.5 * (mx * fz + mz * fx) * ((r - y[j]) / (r + y[j])).ln()
                        - (mx * fy + my * fx) * (r + z[k]).ln()
                        - mx * fx * xy.atan2(x_sqr + zr + z_sqr)
                        - my * fy * xy.atan2(r_sqr + zr - x_sqr)
                        + mz * fz * xy.atan2(zr));
            }
        }
    }
    CM * T2NT * res
}
