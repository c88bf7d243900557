//! Network configuration
//!
//! Applied by [`Pme::configure`](crate::Pme::configure) and
//! [`Pme::begin_with`](crate::Pme::begin_with). Values are written verbatim;
//! range checking is the caller's job.

use pme_chip::network::{DEFAULT_CONTEXT, DEFAULT_MAXIF, DEFAULT_MINIF};
use pme_chip::{ClassificationMode, DistanceMode};

/// Global network configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmeConfig {
    /// Global context (1–127)
    pub global_context: u16,

    /// Distance norm
    pub distance_mode: DistanceMode,

    /// Classifier strategy
    pub classification_mode: ClassificationMode,

    /// Minimum influence field given to newly committed neurons
    pub min_aif: u16,

    /// Maximum influence field given to newly committed neurons
    pub max_aif: u16,
}

impl Default for PmeConfig {
    fn default() -> Self {
        Self {
            global_context: DEFAULT_CONTEXT,
            distance_mode: DistanceMode::L1,
            classification_mode: ClassificationMode::Rbf,
            min_aif: DEFAULT_MINIF,
            max_aif: DEFAULT_MAXIF,
        }
    }
}

impl PmeConfig {
    /// Set the global context.
    #[must_use]
    pub const fn with_context(mut self, context: u16) -> Self {
        self.global_context = context;
        self
    }

    /// Set the distance norm.
    #[must_use]
    pub const fn with_distance_mode(mut self, mode: DistanceMode) -> Self {
        self.distance_mode = mode;
        self
    }

    /// Set the classifier strategy.
    #[must_use]
    pub const fn with_classification_mode(mut self, mode: ClassificationMode) -> Self {
        self.classification_mode = mode;
        self
    }

    /// Set the influence field bounds.
    #[must_use]
    pub const fn with_influence(mut self, min_aif: u16, max_aif: u16) -> Self {
        self.min_aif = min_aif;
        self.max_aif = max_aif;
        self
    }

    /// GCR value encoding context and distance mode.
    #[must_use]
    pub const fn gcr_value(&self) -> u16 {
        self.global_context | self.distance_mode.gcr_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_power_on() {
        let c = PmeConfig::default();
        assert_eq!(c.global_context, 1);
        assert_eq!(c.distance_mode, DistanceMode::L1);
        assert_eq!(c.classification_mode, ClassificationMode::Rbf);
        assert_eq!(c.min_aif, 2);
        assert_eq!(c.max_aif, 0x4000);
    }

    #[test]
    fn gcr_encoding() {
        let c = PmeConfig::default()
            .with_context(5)
            .with_distance_mode(DistanceMode::LSup);
        assert_eq!(c.gcr_value(), 0x0085);
    }
}
