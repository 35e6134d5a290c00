use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gate::StaggerSchedule;
use crate::viewport::{ThresholdError, VisibilityThreshold};

/// Saturation value of the loader's progress counter.
pub const PROGRESS_MAX: f64 = 100.0;

const DEFAULT_QUOTES: [&str; 8] = [
    "Code is poetry written in logic.",
    "Innovation distinguishes between a leader and a follower.",
    "The best way to predict the future is to create it.",
    "Simplicity is the ultimate sophistication.",
    "Stay hungry, stay foolish.",
    "Think different, build different.",
    "Design is not just what it looks like - design is how it works.",
    "The only way to do great work is to love what you do.",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),
    #[error("progress_step must be finite and positive, got {0}")]
    InvalidStep(f64),
    #[error("quote list is empty")]
    NoQuotes,
    #[error(transparent)]
    Threshold(#[from] ThresholdError),
}

/// Timing and content of the loading screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub quote_period_ms: u64,
    pub progress_period_ms: u64,
    pub progress_step: f64,
    pub settle_delay_ms: u64,
    pub quotes: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            quote_period_ms: 1200,
            progress_period_ms: 60,
            progress_step: 1.5,
            settle_delay_ms: 800,
            quotes: DEFAULT_QUOTES.iter().map(|q| (*q).to_owned()).collect(),
        }
    }
}

impl LoaderConfig {
    /// Parse and validate. Missing fields take their defaults.
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quote_period_ms == 0 {
            return Err(ConfigError::NonPositive("quote_period_ms"));
        }
        if self.progress_period_ms == 0 {
            return Err(ConfigError::NonPositive("progress_period_ms"));
        }
        if !self.progress_step.is_finite() || self.progress_step <= 0.0 {
            return Err(ConfigError::InvalidStep(self.progress_step));
        }
        if self.quotes.is_empty() {
            return Err(ConfigError::NoQuotes);
        }
        Ok(())
    }

    pub fn quote_period(&self) -> Duration {
        Duration::from_millis(self.quote_period_ms)
    }

    pub fn progress_period(&self) -> Duration {
        Duration::from_millis(self.progress_period_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Progress ticks needed to reach [`PROGRESS_MAX`]: `ceil(100 / step)`.
    pub fn ticks_to_saturation(&self) -> u32 {
        (PROGRESS_MAX / self.progress_step).ceil() as u32
    }
}

/// Threshold and stagger timing of one animated section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevealConfig {
    pub threshold: f64,
    pub base_delay_ms: u64,
    pub stagger_ms: u64,
    pub child_duration_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self::about()
    }
}

impl RevealConfig {
    /// Long-form sections: slow cascade.
    pub const fn about() -> Self {
        Self {
            threshold: 0.3,
            base_delay_ms: 200,
            stagger_ms: 300,
            child_duration_ms: 1000,
        }
    }

    /// Timeline entries: revealed earlier, tighter cascade.
    pub const fn experience() -> Self {
        Self {
            threshold: 0.2,
            base_delay_ms: 100,
            stagger_ms: 200,
            child_duration_ms: 800,
        }
    }

    /// Skill chips: many small children, quick cascade.
    pub const fn skills() -> Self {
        Self {
            threshold: 0.2,
            base_delay_ms: 200,
            stagger_ms: 100,
            child_duration_ms: 600,
        }
    }

    /// Project cards.
    pub const fn projects() -> Self {
        Self {
            threshold: 0.2,
            base_delay_ms: 200,
            stagger_ms: 100,
            child_duration_ms: 800,
        }
    }

    /// Form rows: quick cascade.
    pub const fn contact() -> Self {
        Self {
            threshold: 0.3,
            base_delay_ms: 200,
            stagger_ms: 100,
            child_duration_ms: 600,
        }
    }

    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.threshold()?;
        Ok(())
    }

    pub fn threshold(&self) -> Result<VisibilityThreshold, ThresholdError> {
        VisibilityThreshold::new(self.threshold)
    }

    pub fn schedule(&self) -> StaggerSchedule {
        StaggerSchedule::new(
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.stagger_ms),
            Duration::from_millis(self.child_duration_ms),
        )
    }
}

/// Everything a host needs to drive one page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub loader: LoaderConfig,
    /// Applied to every section when set; otherwise each section keeps its
    /// own preset.
    pub reveal: Option<RevealConfig>,
}

impl SiteConfig {
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(data)?;
        config.loader.validate()?;
        if let Some(reveal) = &config.reveal {
            reveal.validate()?;
        }
        Ok(config)
    }
}
