//! Pluggable point-distance between individual samples.

/// Point-distance charged for matching one sample of each sequence.
///
/// The choice also fixes how an accumulated path cost maps back to a
/// distance: squared differences accumulate in squared space and are
/// finalized with a square root, absolute differences accumulate directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StepCost {
    /// Squared difference `(x - y)^2`. The default.
    #[default]
    SquaredDifference,

    /// Absolute difference `|x - y|`.
    AbsoluteDifference,
}

impl StepCost {
    /// Cost of matching sample `x` against sample `y`.
    #[must_use]
    pub fn eval(self, x: f64, y: f64) -> f64 {
        match self {
            Self::SquaredDifference => {
                let d = x - y;
                d * d
            }
            Self::AbsoluteDifference => (x - y).abs(),
        }
    }

    /// Map an accumulated path cost to a distance.
    #[must_use]
    pub fn finalize(self, accumulated: f64) -> f64 {
        match self {
            Self::SquaredDifference => accumulated.sqrt(),
            Self::AbsoluteDifference => accumulated,
        }
    }

    /// Map a distance into accumulated-cost space, for cutoff comparisons.
    pub(crate) fn to_raw(self, distance: f64) -> f64 {
        match self {
            Self::SquaredDifference => distance * distance,
            Self::AbsoluteDifference => distance,
        }
    }
}
