use serde::Serialize;

/// SSA construction statistics for one environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SsaStats {
    pub labels: usize,
    pub variables: usize,
    pub phis_created: usize,
    /// Trivial phis replaced by their single operand
    pub phis_removed: usize,
}

impl SsaStats {
    pub fn live_phis(&self) -> usize {
        self.phis_created - self.phis_removed
    }

    /// Fraction of created phis that turned out trivial
    pub fn reduction_ratio(&self) -> f64 {
        if self.phis_created == 0 {
            return 0.0;
        }
        self.phis_removed as f64 / self.phis_created as f64
    }
}
