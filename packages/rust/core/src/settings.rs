//! Immutable per-run settings handed to every pipeline component.

use modelcharts_shared::{AppConfig, Result};

use crate::classifier::DomainRules;
use crate::transform::EraBoundaries;

/// Everything the pure pipeline stages read, resolved once from [`AppConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    /// Ordered domain classification rules.
    pub rules: DomainRules,
    /// Inclusive lower bounds of Era2 and Era3.
    pub eras: EraBoundaries,
    /// Axis padding: extra units beyond an extremum that lands on an integer.
    pub margin: f64,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            rules: DomainRules::default(),
            eras: EraBoundaries::default(),
            margin: 1.0,
        }
    }
}

impl ChartSettings {
    /// Resolve settings from a loaded config, validating it first.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rules: DomainRules::from_config(&config.classifier.rules)?,
            eras: EraBoundaries {
                era2_start: config.eras.era2_start,
                era3_start: config.eras.era3_start,
            },
            margin: config.axes.margin,
        })
    }
}
