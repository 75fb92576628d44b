//! Data modules: observed potential-field data plus the incremental
//! misfit bookkeeping the accretion engine scores candidates with.
//!
//! A [`DataModule`] wraps one observed field component. Scoring calls
//! ([`DataModule::contribution`], [`DataModule::misfit_delta`]) are
//! read-only and may run many times per round; only
//! [`DataModule::commit`] mutates the predicted accumulator, and only
//! after the engine accepts a candidate.

use glam::DVec3;

use crate::error::DataShapeError;
use crate::kernel;
use crate::mesh::Prism;
use crate::seed::PhysicalProps;

/// The observed field component a data module inverts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldComponent {
    /// Vertical gravitational attraction, mGal.
    Gz,
    /// Gravity gradient tensor components, Eötvös.
    Gxx,
    Gxy,
    Gxz,
    Gyy,
    Gyz,
    Gzz,
    /// Total-field magnetic anomaly, nT, for a regional field with the
    /// given inclination and declination in degrees.
    TotalField { inc: f64, dec: f64 },
}

impl FieldComponent {
    /// Effect of a single prism with the given properties on one
    /// observation point. Properties that do not feed this component
    /// (e.g. magnetization on a gravity module) contribute zero.
    pub fn effect(&self, prism: &Prism, props: &PhysicalProps, p: DVec3) -> f64 {
        match (self, props) {
            (Self::Gz, PhysicalProps::Density(d)) => kernel::gz(prism, *d, p),
            (Self::Gxx, PhysicalProps::Density(d)) => kernel::gxx(prism, *d, p),
            (Self::Gxy, PhysicalProps::Density(d)) => kernel::gxy(prism, *d, p),
            (Self::Gxz, PhysicalProps::Density(d)) => kernel::gxz(prism, *d, p),
            (Self::Gyy, PhysicalProps::Density(d)) => kernel::gyy(prism, *d, p),
            (Self::Gyz, PhysicalProps::Density(d)) => kernel::gyz(prism, *d, p),
            (Self::Gzz, PhysicalProps::Density(d)) => kernel::gzz(prism, *d, p),
            (
                Self::TotalField { inc, dec },
                PhysicalProps::Magnetization {
                    intensity,
                    inclination,
                    declination,
                },
            ) => kernel::total_field(
                prism,
                *intensity,
                kernel::dircos(*inclination, *declination),
                kernel::dircos(*inc, *dec),
                p,
            ),
            _ => 0.0,
        }
    }
}

/// Order of the residual norm used by the data misfit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Norm {
    L1,
    #[default]
    L2,
}

impl Norm {
    fn of(&self, values: impl Iterator<Item = f64>) -> f64 {
        match self {
            Norm::L1 => values.map(f64::abs).sum(),
            Norm::L2 => values.map(|v| v * v).sum::<f64>().sqrt(),
        }
    }
}

/// One observed field component with its stations and the running
/// predicted data of the growing estimate.
///
/// The misfit is the norm of the residuals normalized by the norm of
/// the observed data, so modules of different components and units are
/// commensurable when summed.
#[derive(Debug, Clone)]
pub struct DataModule {
    component: FieldComponent,
    positions: Vec<DVec3>,
    observed: Vec<f64>,
    predicted: Vec<f64>,
    norm: Norm,
    weight: f64,
}

impl DataModule {
    /// Wraps observed data measured at `positions`.
    ///
    /// ### Parameters
    /// - `component` - Which field component `observed` holds.
    /// - `positions` - Station coordinates, aligned with `observed`.
    /// - `observed` - Observed values, one per station.
    /// - `norm` - Residual norm order.
    ///
    /// ### Returns
    /// The data module, or [`DataShapeError`] if the arrays disagree
    /// in length.
    pub fn new(
        component: FieldComponent,
        positions: Vec<DVec3>,
        observed: Vec<f64>,
        norm: Norm,
    ) -> Result<Self, DataShapeError> {
        if positions.len() != observed.len() {
            return Err(DataShapeError {
                positions: positions.len(),
                values: observed.len(),
            });
        }
        let obs_norm = norm.of(observed.iter().copied());
        // All-zero data would make the normalization blow up.
        let weight = if obs_norm > 0.0 { 1.0 / obs_norm } else { 1.0 };
        let predicted = vec![0.0; observed.len()];
        Ok(Self {
            component,
            positions,
            observed,
            predicted,
            norm,
            weight,
        })
    }

    pub fn component(&self) -> FieldComponent {
        self.component
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    /// The predicted data accumulated so far, aligned with the
    /// observations.
    pub fn predicted(&self) -> &[f64] {
        &self.predicted
    }

    /// Per-station effect of accreting `prism` with `props`.
    ///
    /// Pure function of the cell geometry and properties; safe to call
    /// any number of times while scoring.
    pub fn contribution(&self, prism: &Prism, props: &PhysicalProps) -> Vec<f64> {
        self.positions
            .iter()
            .map(|&p| self.component.effect(prism, props, p))
            .collect()
    }

    /// Current normalized data misfit.
    pub fn misfit(&self) -> f64 {
        self.misfit_of(self.predicted.iter().copied())
    }

    /// Change in misfit if `contribution` were added to the predicted
    /// data. Negative values mean the candidate improves the fit.
    pub fn misfit_delta(&self, contribution: &[f64]) -> f64 {
        let with = self.misfit_of(
            self.predicted
                .iter()
                .zip(contribution)
                .map(|(p, c)| p + c),
        );
        with - self.misfit()
    }

    fn misfit_of(&self, predicted: impl Iterator<Item = f64>) -> f64 {
        self.weight
            * self
                .norm
                .of(self.observed.iter().zip(predicted).map(|(o, p)| o - p))
    }

    /// Permanently adds the effect of `prism` to the predicted data.
    /// Called by the engine only after the candidate is accepted.
    pub fn commit(&mut self, prism: &Prism, props: &PhysicalProps) {
        for (pred, pos) in self.predicted.iter_mut().zip(&self.positions) {
            *pred += self.component.effect(prism, props, *pos);
        }
    }

    /// Permanently adds an already computed per-station contribution.
    ///
    /// Equivalent to [`DataModule::commit`] for the cell the
    /// contribution was computed from; lets the engine reuse the
    /// winning candidate's scored contribution instead of sweeping the
    /// kernel a second time.
    pub fn commit_contribution(&mut self, contribution: &[f64]) {
        for (pred, c) in self.predicted.iter_mut().zip(contribution) {
            *pred += c;
        }
    }
}

/// Forward-models a set of property-tagged prisms onto observation
/// points. Used to build synthetic surveys.
pub fn forward(
    component: FieldComponent,
    positions: &[DVec3],
    sources: &[(Prism, PhysicalProps)],
) -> Vec<f64> {
    positions
        .iter()
        .map(|&p| {
            sources
                .iter()
                .map(|(prism, props)| component.effect(prism, props, p))
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prism() -> Prism {
        Prism::new(DVec3::new(-50.0, -50.0, 50.0), DVec3::new(50.0, 50.0, 150.0))
    }

    fn stations() -> Vec<DVec3> {
        vec![
            DVec3::new(0.0, 0.0, -10.0),
            DVec3::new(100.0, 0.0, -10.0),
            DVec3::new(0.0, 200.0, -10.0),
        ]
    }

    #[test]
    fn new_rejects_mismatched_arrays() {
        let err = DataModule::new(FieldComponent::Gz, stations(), vec![1.0, 2.0], Norm::L2)
            .unwrap_err();
        assert_eq!(err, DataShapeError { positions: 3, values: 2 });
    }

    #[test]
    fn misfit_starts_at_one_and_drops_to_zero_on_perfect_fit() {
        let props = PhysicalProps::Density(500.0);
        let obs = forward(FieldComponent::Gz, &stations(), &[(prism(), props)]);
        let mut dm = DataModule::new(FieldComponent::Gz, stations(), obs, Norm::L2).unwrap();

        // Normalized misfit of an empty estimate is exactly 1.
        assert!((dm.misfit() - 1.0).abs() < 1e-12);

        dm.commit(&prism(), &props);
        assert!(dm.misfit() < 1e-12);
    }

    #[test]
    fn misfit_delta_matches_commit() {
        let props = PhysicalProps::Density(500.0);
        let obs = forward(FieldComponent::Gz, &stations(), &[(prism(), props)]);
        let mut dm = DataModule::new(FieldComponent::Gz, stations(), obs, Norm::L2).unwrap();

        let contrib = dm.contribution(&prism(), &props);
        let delta = dm.misfit_delta(&contrib);
        let before = dm.misfit();
        dm.commit(&prism(), &props);
        assert!((dm.misfit() - (before + delta)).abs() < 1e-12);
    }

    #[test]
    fn scoring_does_not_mutate_predicted() {
        let props = PhysicalProps::Density(500.0);
        let obs = forward(FieldComponent::Gz, &stations(), &[(prism(), props)]);
        let dm = DataModule::new(FieldComponent::Gz, stations(), obs, Norm::L2).unwrap();

        let contrib = dm.contribution(&prism(), &props);
        let d1 = dm.misfit_delta(&contrib);
        let d2 = dm.misfit_delta(&contrib);
        assert_eq!(d1, d2);
        assert!(dm.predicted().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn commit_is_linear_and_order_independent() {
        let props = PhysicalProps::Density(500.0);
        let other = Prism::new(DVec3::new(50.0, -50.0, 50.0), DVec3::new(150.0, 50.0, 150.0));
        let obs = vec![0.0; 3];

        let mut ab =
            DataModule::new(FieldComponent::Gz, stations(), obs.clone(), Norm::L2).unwrap();
        ab.commit(&prism(), &props);
        ab.commit(&other, &props);

        let mut ba = DataModule::new(FieldComponent::Gz, stations(), obs, Norm::L2).unwrap();
        ba.commit(&other, &props);
        ba.commit(&prism(), &props);

        let sum: Vec<f64> = ab
            .contribution(&prism(), &props)
            .iter()
            .zip(ab.contribution(&other, &props))
            .map(|(a, b)| a + b)
            .collect();
        for i in 0..3 {
            assert!((ab.predicted()[i] - ba.predicted()[i]).abs() < 1e-12);
            assert!((ab.predicted()[i] - sum[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn committing_a_scored_contribution_matches_the_kernel_commit() {
        let props = PhysicalProps::Density(500.0);
        let obs = forward(FieldComponent::Gz, &stations(), &[(prism(), props)]);
        let mut from_kernel =
            DataModule::new(FieldComponent::Gz, stations(), obs, Norm::L2).unwrap();
        let mut from_contribution = from_kernel.clone();

        let contrib = from_kernel.contribution(&prism(), &props);
        from_kernel.commit(&prism(), &props);
        from_contribution.commit_contribution(&contrib);

        // Same effect values, added once each way: bitwise identical.
        assert_eq!(from_kernel.predicted(), from_contribution.predicted());
        assert_eq!(from_kernel.misfit(), from_contribution.misfit());
    }

    #[test]
    fn magnetization_does_not_feed_gravity_modules() {
        let mag = PhysicalProps::Magnetization {
            intensity: 10.0,
            inclination: 90.0,
            declination: 0.0,
        };
        let dm = DataModule::new(
            FieldComponent::Gz,
            stations(),
            vec![1.0, 2.0, 3.0],
            Norm::L2,
        )
        .unwrap();
        let contrib = dm.contribution(&prism(), &mag);
        assert!(contrib.iter().all(|&c| c == 0.0));
        assert_eq!(dm.misfit_delta(&contrib), 0.0);
    }

    #[test]
    fn l1_norm_misfit_is_supported() {
        let dm = DataModule::new(
            FieldComponent::Gz,
            stations(),
            vec![1.0, -2.0, 3.0],
            Norm::L1,
        )
        .unwrap();
        // Residuals equal the observations, so the normalized L1
        // misfit is 1.
        assert!((dm.misfit() - 1.0).abs() < 1e-12);
    }
}
