//! Search and self-play configuration parameters.

use thiserror::Error;

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("c_base must be finite and non-zero, got {0}")]
    InvalidCBase(f64),

    #[error("c_init must be finite, got {0}")]
    InvalidCInit(f64),

    #[error("noise_alpha must be finite and >= 0, got {0}")]
    InvalidNoiseAlpha(f64),

    #[error("noise_fraction must be within [0, 1], got {0}")]
    InvalidNoiseFraction(f64),

    #[error("{0} must be greater than 0")]
    Zero(&'static str),
}

/// Configuration for MCTS self-play.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Additive term of the PUCT exploration factor.
    /// AlphaZero uses 1.25.
    pub c_init: f64,

    /// Scale of the logarithmic growth of the exploration factor with
    /// parent visits. AlphaZero uses 19652. Must be non-zero.
    pub c_base: f64,

    /// Dirichlet noise alpha for root exploration.
    /// Set to 0.0 to disable noise (for evaluation).
    pub noise_alpha: f64,

    /// Fraction of each root prior replaced by noise.
    /// 0.25 means 75% prior + 25% noise.
    pub noise_fraction: f64,

    /// Searches (expansions plus terminal absorptions) per committed move.
    pub evaluations_per_move: u32,

    /// Games are cut off and scored as a draw after this many turns.
    pub max_turns: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            c_init: 1.25,
            c_base: 19652.0,
            noise_alpha: 0.5,
            noise_fraction: 0.25,
            evaluations_per_move: 200,
            max_turns: 1_000_000,
        }
    }
}

impl SearchConfig {
    /// Create config for training (with exploration noise).
    pub fn for_training() -> Self {
        Self::default()
    }

    /// Create config for evaluation (no root noise).
    pub fn for_evaluation() -> Self {
        Self {
            noise_alpha: 0.0,
            noise_fraction: 0.0,
            ..Self::default()
        }
    }

    /// Create a fast config for testing.
    pub fn for_testing() -> Self {
        Self {
            c_init: 1.25,
            c_base: 19652.0,
            noise_alpha: 0.0,
            noise_fraction: 0.0,
            evaluations_per_move: 16,
            max_turns: 64,
        }
    }

    /// Builder pattern: set the PUCT constants.
    pub fn with_puct(mut self, c_init: f64, c_base: f64) -> Self {
        self.c_init = c_init;
        self.c_base = c_base;
        self
    }

    /// Builder pattern: set root noise.
    pub fn with_noise(mut self, alpha: f64, fraction: f64) -> Self {
        self.noise_alpha = alpha;
        self.noise_fraction = fraction;
        self
    }

    /// Builder pattern: set searches per move.
    pub fn with_evaluations_per_move(mut self, n: u32) -> Self {
        self.evaluations_per_move = n;
        self
    }

    /// Builder pattern: set the turn cap.
    pub fn with_max_turns(mut self, n: usize) -> Self {
        self.max_turns = n;
        self
    }

    /// Whether root noise is enabled.
    pub fn noise_enabled(&self) -> bool {
        self.noise_alpha > 0.0 && self.noise_fraction > 0.0
    }

    /// Check the values the search relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.c_init.is_finite() {
            return Err(ConfigError::InvalidCInit(self.c_init));
        }
        if !self.c_base.is_finite() || self.c_base == 0.0 {
            return Err(ConfigError::InvalidCBase(self.c_base));
        }
        if !self.noise_alpha.is_finite() || self.noise_alpha < 0.0 {
            return Err(ConfigError::InvalidNoiseAlpha(self.noise_alpha));
        }
        if !(0.0..=1.0).contains(&self.noise_fraction) {
            return Err(ConfigError::InvalidNoiseFraction(self.noise_fraction));
        }
        if self.evaluations_per_move == 0 {
            return Err(ConfigError::Zero("evaluations_per_move"));
        }
        if self.max_turns == 0 {
            return Err(ConfigError::Zero("max_turns"));
        }
        Ok(())
    }
}
