//! DTW configuration and one-shot normalization.

use crate::error::SettingsError;
use crate::stepcost::StepCost;

/// Immutable DTW configuration. Thread-safe and copyable.
///
/// All structural constraints use `0` to mean "unconstrained"; in particular
/// `window = 0` means *no band constraint*, not a zero-width band.
///
/// The legacy symmetric `penalty` and the direction-specific `penalty_s1` /
/// `penalty_s2` form a small tagged configuration: if both directional
/// penalties are unset (zero) and `penalty` is non-zero, both directions
/// resolve to `penalty`. The resolution happens exactly once, in
/// [`Dtw::new`](crate::Dtw::new), so the DP core only ever sees the
/// directional pair. Constructing settings with `penalty = p` is therefore
/// observably identical to `penalty_s1 = p, penalty_s2 = p`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DtwSettings {
    window: usize,
    max_step: usize,
    max_length_diff: usize,
    penalty: f64,
    penalty_s1: f64,
    penalty_s2: f64,
    psi_s1: usize,
    psi_s2: usize,
    max_dist: f64,
    use_pruning: bool,
    step_cost: StepCost,
}

impl Default for DtwSettings {
    fn default() -> Self {
        Self {
            window: 0,
            max_step: 0,
            max_length_diff: 0,
            penalty: 0.0,
            penalty_s1: 0.0,
            penalty_s2: 0.0,
            psi_s1: 0,
            psi_s2: 0,
            max_dist: f64::INFINITY,
            use_pruning: false,
            step_cost: StepCost::SquaredDifference,
        }
    }
}

impl DtwSettings {
    /// Create unconstrained default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the warping window half-width (`0` = unconstrained).
    ///
    /// Cell `(i, j)` is kept only when `|i * (m / n) - j| <= window`, a band
    /// around the scaled diagonal so sequences of different lengths keep a
    /// usable corridor.
    #[must_use]
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Set the maximum index drift off the unit diagonal (`0` = unconstrained).
    #[must_use]
    pub fn with_max_step(mut self, max_step: usize) -> Self {
        self.max_step = max_step;
        self
    }

    /// Set the maximum allowed length difference (`0` = unconstrained).
    ///
    /// Pairs whose lengths differ by more fail fast with
    /// [`DtwError::LengthMismatch`](crate::DtwError::LengthMismatch).
    #[must_use]
    pub fn with_max_length_diff(mut self, max_length_diff: usize) -> Self {
        self.max_length_diff = max_length_diff;
        self
    }

    /// Set the legacy symmetric penalty for non-diagonal moves.
    #[must_use]
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    /// Set the penalty charged on vertical moves (consuming an extra sample
    /// of the first sequence without advancing the second).
    #[must_use]
    pub fn with_penalty_s1(mut self, penalty_s1: f64) -> Self {
        self.penalty_s1 = penalty_s1;
        self
    }

    /// Set the penalty charged on horizontal moves (consuming an extra sample
    /// of the second sequence without advancing the first).
    #[must_use]
    pub fn with_penalty_s2(mut self, penalty_s2: f64) -> Self {
        self.penalty_s2 = penalty_s2;
        self
    }

    /// Set both boundary relaxation counts at once.
    #[must_use]
    pub fn with_psi(mut self, psi: usize) -> Self {
        self.psi_s1 = psi;
        self.psi_s2 = psi;
        self
    }

    /// Set how many leading/trailing samples of the first sequence may be
    /// skipped for free.
    #[must_use]
    pub fn with_psi_s1(mut self, psi_s1: usize) -> Self {
        self.psi_s1 = psi_s1;
        self
    }

    /// Set how many leading/trailing samples of the second sequence may be
    /// skipped for free.
    #[must_use]
    pub fn with_psi_s2(mut self, psi_s2: usize) -> Self {
        self.psi_s2 = psi_s2;
        self
    }

    /// Set the early-abandonment threshold. Computations whose distance
    /// would exceed it return an infinite distance instead of completing.
    #[must_use]
    pub fn with_max_dist(mut self, max_dist: f64) -> Self {
        self.max_dist = max_dist;
        self
    }

    /// Enable pruning: tighten the abandonment threshold with an upper bound
    /// derived from the explicit diagonal-then-edge alignment.
    #[must_use]
    pub fn with_use_pruning(mut self, use_pruning: bool) -> Self {
        self.use_pruning = use_pruning;
        self
    }

    /// Set the point-distance between samples.
    #[must_use]
    pub fn with_step_cost(mut self, step_cost: StepCost) -> Self {
        self.step_cost = step_cost;
        self
    }

    /// Return the configured window half-width.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Return the configured maximum index drift.
    #[must_use]
    pub fn max_step(&self) -> usize {
        self.max_step
    }

    /// Return the configured maximum length difference.
    #[must_use]
    pub fn max_length_diff(&self) -> usize {
        self.max_length_diff
    }

    /// Return the legacy symmetric penalty.
    #[must_use]
    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    /// Return the vertical-move penalty.
    #[must_use]
    pub fn penalty_s1(&self) -> f64 {
        self.penalty_s1
    }

    /// Return the horizontal-move penalty.
    #[must_use]
    pub fn penalty_s2(&self) -> f64 {
        self.penalty_s2
    }

    /// Return the boundary relaxation count for the first sequence.
    #[must_use]
    pub fn psi_s1(&self) -> usize {
        self.psi_s1
    }

    /// Return the boundary relaxation count for the second sequence.
    #[must_use]
    pub fn psi_s2(&self) -> usize {
        self.psi_s2
    }

    /// Return the early-abandonment threshold.
    #[must_use]
    pub fn max_dist(&self) -> f64 {
        self.max_dist
    }

    /// Return whether pruning is enabled.
    #[must_use]
    pub fn use_pruning(&self) -> bool {
        self.use_pruning
    }

    /// Return the configured point-distance.
    #[must_use]
    pub fn step_cost(&self) -> StepCost {
        self.step_cost
    }

    /// Validate all numeric fields.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SettingsError::NegativeField`] | `penalty`, `penalty_s1`, `penalty_s2` negative or non-finite, or `max_dist` negative or NaN |
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (field, value) in [
            ("penalty", self.penalty),
            ("penalty_s1", self.penalty_s1),
            ("penalty_s2", self.penalty_s2),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::NegativeField { field, value });
            }
        }
        // max_dist may be +infinity (disabled) but never NaN or negative.
        if self.max_dist.is_nan() || self.max_dist < 0.0 {
            return Err(SettingsError::NegativeField {
                field: "max_dist",
                value: self.max_dist,
            });
        }
        Ok(())
    }

    /// Validate and normalize into the internal resolved form.
    ///
    /// Folds the legacy symmetric `penalty` into the directional pair when
    /// both directional penalties are unset, so downstream code is agnostic
    /// to the legacy field.
    pub(crate) fn resolve(self) -> Result<Resolved, SettingsError> {
        self.validate()?;
        let (penalty_s1, penalty_s2) =
            if self.penalty_s1 == 0.0 && self.penalty_s2 == 0.0 && self.penalty != 0.0 {
                (self.penalty, self.penalty)
            } else {
                (self.penalty_s1, self.penalty_s2)
            };
        Ok(Resolved {
            window: self.window,
            max_step: self.max_step,
            max_length_diff: self.max_length_diff,
            penalty_s1,
            penalty_s2,
            psi_s1: self.psi_s1,
            psi_s2: self.psi_s2,
            max_dist: self.max_dist,
            use_pruning: self.use_pruning,
            step_cost: self.step_cost,
        })
    }
}

/// Normalized settings as seen by the DP core: directional penalties only.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resolved {
    pub window: usize,
    pub max_step: usize,
    pub max_length_diff: usize,
    pub penalty_s1: f64,
    pub penalty_s2: f64,
    pub psi_s1: usize,
    pub psi_s2: usize,
    pub max_dist: f64,
    pub use_pruning: bool,
    pub step_cost: StepCost,
}
