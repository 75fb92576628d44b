use crate::error::ConfigError;

/// Global configuration for the growth algorithm.
#[derive(Debug, Clone, Copy)]
pub struct GrowthConfig {
    /// Compactness regularizing parameter. Zero disables the penalty;
    /// larger values trade data fit for rounder, smaller bodies.
    pub regul: f64,
    /// Minimum improvement of the goal function required to accept an
    /// accretion. Must be positive.
    pub delta: f64,
    /// Power the normalized centroid distance is raised to in the
    /// compactness penalty. Usually between 3 and 7.
    pub power: i32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            regul: 0.0,
            delta: 1e-4,
            power: 3,
        }
    }
}

impl GrowthConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(self.delta > 0.0) {
            return Err(ConfigError::NonPositiveDelta(self.delta));
        }
        if !(self.regul >= 0.0) {
            return Err(ConfigError::NegativeRegul(self.regul));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GrowthConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_scalars() {
        let mut cfg = GrowthConfig::default();
        cfg.delta = 0.0;
        assert_eq!(
            cfg.validate().unwrap_err(),
            ConfigError::NonPositiveDelta(0.0)
        );

        let mut cfg = GrowthConfig::default();
        cfg.delta = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = GrowthConfig::default();
        cfg.regul = -1.0;
        assert_eq!(cfg.validate().unwrap_err(), ConfigError::NegativeRegul(-1.0));
    }
}
