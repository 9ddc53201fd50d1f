//! Warping path types for DTW alignment.

use crate::series::SequenceView;
use crate::stepcost::StepCost;

/// A single step in a warping path, mapping sample index `a` in the first
/// sequence to sample index `b` in the second sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarpingStep {
    /// Index in the first sequence.
    pub a: usize,
    /// Index in the second sequence.
    pub b: usize,
}

/// An ordered sequence of warping steps, non-decreasing in both indices.
///
/// Consecutive steps differ by exactly one of `(1,1)`, `(1,0)`, `(0,1)`.
/// The path starts and ends at cells permitted by boundary relaxation; it is
/// empty when no alignment is reachable.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpingPath(Vec<WarpingStep>);

impl WarpingPath {
    /// Create a new warping path from a vector of steps.
    pub(crate) fn new(steps: Vec<WarpingStep>) -> Self {
        Self(steps)
    }

    /// Return the warping steps as a slice.
    #[must_use]
    pub fn steps(&self) -> &[WarpingStep] {
        &self.0
    }

    /// Return the number of steps in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the path contains no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recompute the accumulated step-plus-penalty cost of this path.
    ///
    /// Sums the point-distance of every matched pair and charges
    /// `penalty_s1` for each vertical move and `penalty_s2` for each
    /// horizontal move. For a path recovered from a tracked fill this equals
    /// the raw (pre-finalization) extracted cost, which makes it useful for
    /// auditing path validity.
    #[must_use]
    pub fn accumulated_cost(
        &self,
        a: SequenceView<'_>,
        b: SequenceView<'_>,
        step_cost: StepCost,
        penalty_s1: f64,
        penalty_s2: f64,
    ) -> f64 {
        let mut total = 0.0;
        let mut prev: Option<WarpingStep> = None;
        for &step in &self.0 {
            total += step_cost.eval(a[step.a], b[step.b]);
            if let Some(p) = prev {
                if step.a == p.a + 1 && step.b == p.b {
                    total += penalty_s1;
                } else if step.a == p.a && step.b == p.b + 1 {
                    total += penalty_s2;
                }
            }
            prev = Some(step);
        }
        total
    }
}

impl<'a> IntoIterator for &'a WarpingPath {
    type Item = &'a WarpingStep;
    type IntoIter = std::slice::Iter<'a, WarpingStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
