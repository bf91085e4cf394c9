//! Monte Carlo tree search configuration.

use std::f64::consts::FRAC_1_SQRT_2;

/// Configuration parameters for Monte Carlo tree search.
///
/// # Examples
///
/// ```
/// use u_timetable::mcts::MctsConfig;
///
/// let config = MctsConfig::default()
///     .with_budget(100)
///     .with_seed(7);
/// assert_eq!(config.budget, 100);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// Simulations run before committing to each action.
    pub budget: usize,

    /// UCT exploration constant `c`.
    pub exploration: f64,

    /// Depth at which a state counts as terminal.
    ///
    /// `None` uses the number of slots in the weekly grid.
    pub max_depth: Option<usize>,

    /// Random seed (None for a fresh seed).
    pub seed: Option<u64>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            budget: 50,
            exploration: FRAC_1_SQRT_2,
            max_depth: None,
            seed: None,
        }
    }
}

impl MctsConfig {
    /// Sets the number of simulations per decision.
    pub fn with_budget(mut self, n: usize) -> Self {
        self.budget = n;
        self
    }

    /// Sets the exploration constant.
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    /// Overrides the terminal depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.budget == 0 {
            return Err("budget must be at least 1".into());
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(format!(
                "exploration must be finite and non-negative, got {}",
                self.exploration
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.budget, 50);
        assert!((config.exploration - 1.0 / 2f64.sqrt()).abs() < 1e-12);
        assert!(config.max_depth.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        assert!(MctsConfig::default().with_budget(0).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_exploration() {
        assert!(MctsConfig::default().with_exploration(-1.0).validate().is_err());
        assert!(MctsConfig::default()
            .with_exploration(f64::NAN)
            .validate()
            .is_err());
    }
}
