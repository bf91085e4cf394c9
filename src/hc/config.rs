//! Hill climbing configuration.

/// Which hill-climbing variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HcVariant {
    /// Scan every neighbor, descend to the best improving one.
    Classic,
    /// Descend to the best of the first `first_x` improving neighbors.
    FirstX,
    /// Repeated first-X climbs from the initial state with a growing width.
    #[default]
    RandomRestart,
}

/// Configuration for the hill-climbing runners.
///
/// # Examples
///
/// ```
/// use u_timetable::hc::HcConfig;
///
/// let config = HcConfig::default()
///     .with_max_iterations(500)
///     .with_first_x(100)
///     .with_max_restarts(5)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct HcConfig {
    /// Maximum descent steps per climb.
    pub max_iterations: usize,

    /// Improving neighbors collected per step by the first-X variant.
    ///
    /// A negative value never fills up, so the whole neighborhood is
    /// scanned. Zero ends a step at the first non-improving neighbor.
    pub first_x: i64,

    /// Restarts performed by the random-restart variant.
    pub max_restarts: usize,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for HcConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            first_x: 50,
            max_restarts: 10,
            seed: None,
        }
    }
}

impl HcConfig {
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_first_x(mut self, x: i64) -> Self {
        self.first_x = x;
        self
    }

    pub fn with_max_restarts(mut self, n: usize) -> Self {
        self.max_restarts = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_restarts == 0 {
            return Err("max_restarts must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HcConfig::default();
        assert_eq!(config.max_iterations, 200);
        assert_eq!(config.first_x, 50);
        assert_eq!(config.max_restarts, 10);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = HcConfig::default()
            .with_max_iterations(10)
            .with_first_x(-3)
            .with_max_restarts(2)
            .with_seed(9);
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.first_x, -3);
        assert_eq!(config.max_restarts, 2);
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn test_validate_zero_restarts() {
        let config = HcConfig::default().with_max_restarts(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_variant() {
        assert_eq!(HcVariant::default(), HcVariant::RandomRestart);
    }
}
