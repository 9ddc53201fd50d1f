//! DTW distance computation: accumulation, extraction, and batch evaluation.

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::band::Band;
use crate::distance::DtwDistance;
use crate::error::{DtwError, SettingsError};
use crate::grid::{CostGrid, DIR_DIAGONAL, DIR_HORIZONTAL, DIR_VERTICAL, Traceback};
use crate::matrix::DistanceMatrix;
use crate::path::WarpingPath;
use crate::series::{Sequence, SequenceView};
use crate::settings::{DtwSettings, Resolved};

/// DTW calculator holding normalized settings. Thread-safe and copyable.
///
/// Settings are validated and normalized exactly once at construction; the
/// legacy symmetric penalty is already folded into the directional pair by
/// the time any computation runs.
#[derive(Debug, Clone, Copy)]
pub struct Dtw {
    cfg: Resolved,
}

impl Dtw {
    /// Create a calculator from validated settings.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SettingsError::NegativeField`] | A penalty or `max_dist` is negative or NaN |
    pub fn new(settings: DtwSettings) -> Result<Self, SettingsError> {
        Ok(Self {
            cfg: settings.resolve()?,
        })
    }

    /// Create an unconstrained calculator with default settings.
    #[must_use]
    pub fn unconstrained() -> Self {
        Self {
            cfg: DtwSettings::default()
                .resolve()
                .expect("default settings are valid"),
        }
    }

    /// Compute the DTW distance between two sequences.
    ///
    /// Uses a memory-efficient rolling two-row buffer rather than allocating
    /// the full cost grid. Runs in O(n * bw) time and O(bw) space, where `bw`
    /// is the band width (`m` for unconstrained settings).
    ///
    /// Returns [`DtwDistance::INFINITY`] when the constraints leave no
    /// reachable alignment or when the accumulated cost exceeds `max_dist`;
    /// neither is an error.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::LengthMismatch`] | Lengths differ by more than `max_length_diff` |
    /// | [`DtwError::GridAllocation`] | Row buffers cannot be allocated |
    #[instrument(skip(self, a, b), fields(n = a.len(), m = b.len()))]
    pub fn distance(
        &self,
        a: SequenceView<'_>,
        b: SequenceView<'_>,
    ) -> Result<DtwDistance, DtwError> {
        let x = a.as_slice();
        let y = b.as_slice();
        self.check_lengths(x.len(), y.len())?;

        let band = Band::resolve(x.len(), y.len(), self.cfg.window, self.cfg.max_step);
        let cutoff = self.effective_cutoff(x, y);
        let raw = self.accumulate_rolling(x, y, &band, cutoff)?;
        let raw = match cutoff {
            Some(c) if raw > c => f64::INFINITY,
            _ => raw,
        };
        Ok(DtwDistance::new(self.cfg.step_cost.finalize(raw)))
    }

    /// Compute the DTW distance and optimal warping path between two sequences.
    ///
    /// Allocates the full banded cost grid with traceback directions. Runs in
    /// O(n * bw) time and space. Use [`distance`][Dtw::distance] when only the
    /// scalar distance is needed. An unreachable pair yields
    /// ([`DtwDistance::INFINITY`], empty path).
    ///
    /// # Errors
    ///
    /// Same conditions as [`distance`][Dtw::distance].
    #[instrument(skip(self, a, b), fields(n = a.len(), m = b.len()))]
    pub fn distance_and_path(
        &self,
        a: SequenceView<'_>,
        b: SequenceView<'_>,
    ) -> Result<(DtwDistance, WarpingPath), DtwError> {
        let grid = self.warping_grid(a, b, Traceback::Enabled)?;
        let path = grid.best_path()?;
        Ok((grid.distance(), path))
    }

    /// Fill and return the accumulated-cost grid for a pair.
    ///
    /// With [`Traceback::Enabled`] the grid supports
    /// [`best_path`](CostGrid::best_path); with [`Traceback::Disabled`] only
    /// [`distance`](CostGrid::distance) is available and path recovery fails
    /// with [`DtwError::PathNotTracked`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::LengthMismatch`] | Lengths differ by more than `max_length_diff` |
    /// | [`DtwError::GridAllocation`] | The banded grid cannot be allocated |
    #[instrument(skip(self, a, b), fields(n = a.len(), m = b.len()))]
    pub fn warping_grid(
        &self,
        a: SequenceView<'_>,
        b: SequenceView<'_>,
        traceback: Traceback,
    ) -> Result<CostGrid, DtwError> {
        let x = a.as_slice();
        let y = b.as_slice();
        self.check_lengths(x.len(), y.len())?;

        let band = Band::resolve(x.len(), y.len(), self.cfg.window, self.cfg.max_step);
        let cutoff = self.effective_cutoff(x, y);
        let mut grid = CostGrid::try_new(
            x.len(),
            y.len(),
            band,
            traceback,
            self.cfg.psi_s1,
            self.cfg.psi_s2,
            self.cfg.step_cost,
            cutoff,
        )?;
        self.fill_grid(x, y, &mut grid);
        Ok(grid)
    }

    /// Compute pairwise DTW distances for a collection of sequences.
    ///
    /// Only the strict triangle is evaluated (each pair once, with the
    /// lower-indexed sequence as the first argument) and mirrored on
    /// access. `workers` controls parallelism: `1` forces a sequential loop
    /// (useful for determinism verification), `0` uses the ambient rayon
    /// pool, any other value installs a dedicated pool of that size for the
    /// call. Pair results are independent, so the matrix content is
    /// identical regardless of scheduling.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::LengthMismatch`] | Any pair violates `max_length_diff` (checked up front; all-or-nothing) |
    /// | [`DtwError::ThreadPool`] | The dedicated worker pool cannot be built |
    /// | [`DtwError::GridAllocation`] | A per-pair fill cannot allocate its buffers |
    #[instrument(skip(self, series), fields(n = series.len(), workers))]
    pub fn distance_matrix(
        &self,
        series: &[Sequence],
        workers: usize,
    ) -> Result<DistanceMatrix, DtwError> {
        if self.cfg.max_length_diff > 0 && series.len() > 1 {
            let mut min_len = usize::MAX;
            let mut max_len = 0;
            for s in series {
                min_len = min_len.min(s.len());
                max_len = max_len.max(s.len());
            }
            if max_len - min_len > self.cfg.max_length_diff {
                return Err(DtwError::LengthMismatch {
                    diff: max_len - min_len,
                    max: self.cfg.max_length_diff,
                });
            }
        }

        let n = series.len();
        let total_pairs = n * n.saturating_sub(1) / 2;
        let views: Vec<SequenceView<'_>> = series.iter().map(|s| s.as_view()).collect();

        let compute = |flat_idx: usize| -> Result<DtwDistance, DtwError> {
            // Map flat index back to (i, j) where i > j:
            // flat_idx = i*(i-1)/2 + j, so i = floor((1 + sqrt(1 + 8*flat_idx)) / 2)
            let i = ((1.0 + (1.0 + 8.0 * flat_idx as f64).sqrt()) / 2.0).floor() as usize;
            let j = flat_idx - i * (i - 1) / 2;
            self.distance(views[j], views[i])
        };

        let data = match workers {
            1 => (0..total_pairs)
                .map(compute)
                .collect::<Result<Vec<_>, _>>()?,
            0 => (0..total_pairs)
                .into_par_iter()
                .map(compute)
                .collect::<Result<Vec<_>, _>>()?,
            k => rayon::ThreadPoolBuilder::new()
                .num_threads(k)
                .build()?
                .install(|| {
                    (0..total_pairs)
                        .into_par_iter()
                        .map(compute)
                        .collect::<Result<Vec<_>, _>>()
                })?,
        };

        Ok(DistanceMatrix::from_raw(n, data))
    }

    fn check_lengths(&self, n: usize, m: usize) -> Result<(), DtwError> {
        let diff = n.abs_diff(m);
        if self.cfg.max_length_diff > 0 && diff > self.cfg.max_length_diff {
            return Err(DtwError::LengthMismatch {
                diff,
                max: self.cfg.max_length_diff,
            });
        }
        Ok(())
    }

    /// Abandonment threshold in accumulated-cost space, if any.
    ///
    /// `max_dist` converts directly. With pruning enabled the threshold is
    /// tightened to the accumulated cost of the explicit diagonal-then-edge
    /// alignment, a valid warping path and hence a true upper bound, whenever
    /// that path is representable under the active constraints (equal
    /// lengths, or no window/max_step constraint). A finite result therefore
    /// always equals the exact distance.
    fn effective_cutoff(&self, a: &[f64], b: &[f64]) -> Option<f64> {
        let mut cutoff = self
            .cfg
            .max_dist
            .is_finite()
            .then(|| self.cfg.step_cost.to_raw(self.cfg.max_dist));

        let bound_valid =
            a.len() == b.len() || (self.cfg.window == 0 && self.cfg.max_step == 0);
        if self.cfg.use_pruning && bound_valid {
            let ub = self.diagonal_alignment_cost(a, b);
            if ub.is_finite() {
                debug!(upper_bound = ub, "pruning threshold from diagonal alignment");
                cutoff = Some(cutoff.map_or(ub, |c| c.min(ub)));
            }
        }
        cutoff
    }

    /// Accumulated cost of the alignment that pairs samples index-by-index
    /// and consumes the tail of the longer sequence against the last sample
    /// of the shorter one, penalties included.
    fn diagonal_alignment_cost(&self, a: &[f64], b: &[f64]) -> f64 {
        if a.is_empty() || b.is_empty() {
            return if a.len() == b.len() { 0.0 } else { f64::INFINITY };
        }
        let step = self.cfg.step_cost;
        let k = a.len().min(b.len());
        let mut total = 0.0;
        for i in 0..k {
            total += step.eval(a[i], b[i]);
        }
        for &x in &a[k..] {
            total += step.eval(x, b[k - 1]) + self.cfg.penalty_s1;
        }
        for &y in &b[k..] {
            total += step.eval(a[k - 1], y) + self.cfg.penalty_s2;
        }
        total
    }

    /// Rolling two-row fill: returns the minimum accumulated cost over the
    /// psi-relaxed endpoint cells.
    ///
    /// Each row buffer has `bw + 2` slots: index 0 is the left sentinel and
    /// index `bw + 1` the right sentinel, both permanently infinite; active
    /// columns occupy `1..=width`. Out-of-band predecessor reads resolve to
    /// infinity, boundary-row and boundary-column reads resolve through the
    /// psi relaxation rules.
    fn accumulate_rolling(
        &self,
        a: &[f64],
        b: &[f64],
        band: &Band,
        cutoff: Option<f64>,
    ) -> Result<f64, DtwError> {
        let cfg = &self.cfg;
        let n = a.len();
        let m = b.len();
        let psi_s1 = cfg.psi_s1;
        let psi_s2 = cfg.psi_s2;
        let row0 = |j: usize| if j <= psi_s2 { 0.0 } else { f64::INFINITY };
        let col0 = |i: usize| if i <= psi_s1 { 0.0 } else { f64::INFINITY };

        // Endpoint (0, m) is only admissible when relaxation may skip all of
        // the first sequence.
        let mut endpoint_best = if psi_s1 >= n { row0(m) } else { f64::INFINITY };

        let buf_width = band.max_width() + 2;
        let mut prev = Vec::new();
        prev.try_reserve_exact(buf_width)
            .map_err(|_| DtwError::GridAllocation { cells: buf_width })?;
        prev.resize(buf_width, f64::INFINITY);
        let mut curr = prev.clone();
        let mut prev_start = 0usize;

        for i in 1..=n {
            curr.fill(f64::INFINITY);
            let range = band.row(i);
            let curr_start = range.start;
            let mut row_min = f64::INFINITY;

            for j in range.clone() {
                let sc = cfg.step_cost.eval(a[i - 1], b[j - 1]);

                let diag = if i == 1 {
                    row0(j - 1)
                } else if j == 1 {
                    col0(i - 1)
                } else {
                    read_banded(&prev, prev_start, j - 1)
                };
                let vert = if i == 1 {
                    row0(j)
                } else {
                    read_banded(&prev, prev_start, j)
                };
                let horz = if j == 1 {
                    col0(i)
                } else if j > curr_start {
                    curr[j - curr_start]
                } else {
                    f64::INFINITY
                };

                let val = sc
                    + diag
                        .min(vert + cfg.penalty_s1)
                        .min(horz + cfg.penalty_s2);
                curr[j - curr_start + 1] = val;
                row_min = row_min.min(val);
            }

            if n - i <= psi_s1 {
                let v = if m == 0 {
                    col0(i)
                } else if range.contains(&m) {
                    curr[m - curr_start + 1]
                } else {
                    f64::INFINITY
                };
                endpoint_best = endpoint_best.min(v);
            }

            // Every path not yet accounted for either crosses this row
            // (bounded below by row_min) or ends at a relaxed endpoint
            // already folded into endpoint_best. Rows i < psi_s1 are exempt:
            // a later path may still enter through the relaxed column 0.
            if let Some(c) = cutoff
                && i < n
                && i >= psi_s1
                && row_min > c
                && endpoint_best > c
            {
                debug!(row = i, "early abandonment: cutoff unreachable");
                return Ok(f64::INFINITY);
            }

            std::mem::swap(&mut prev, &mut curr);
            prev_start = curr_start;
        }

        // After the final swap `prev` holds row n. Fold in the endpoints
        // (n, m-k) permitted by the second sequence's relaxation.
        let final_range = if n > 0 { band.row(n) } else { 0..0 };
        for k in 0..=psi_s2.min(m) {
            let j = m - k;
            let v = if j == 0 {
                col0(n)
            } else if n == 0 {
                row0(j)
            } else if final_range.contains(&j) {
                prev[j - prev_start + 1]
            } else {
                f64::INFINITY
            };
            endpoint_best = endpoint_best.min(v);
        }

        Ok(endpoint_best)
    }

    /// Tracked fill into a materialized grid, recording the chosen
    /// predecessor per cell. Tie-break: diagonal, then vertical, then
    /// horizontal.
    fn fill_grid(&self, a: &[f64], b: &[f64], grid: &mut CostGrid) {
        let cfg = &self.cfg;
        let (n, m) = grid.shape();
        let cutoff = grid.cutoff();

        let mut endpoint_best = if cfg.psi_s1 >= n {
            grid.get(0, m)
        } else {
            f64::INFINITY
        };

        for i in 1..=n {
            let range = grid.row_range(i);
            let mut row_min = f64::INFINITY;

            for j in range {
                let sc = cfg.step_cost.eval(a[i - 1], b[j - 1]);
                let diag = grid.get(i - 1, j - 1);
                let vert = grid.get(i - 1, j) + cfg.penalty_s1;
                let horz = grid.get(i, j - 1) + cfg.penalty_s2;

                let (best, dir) = if diag <= vert && diag <= horz {
                    (diag, DIR_DIAGONAL)
                } else if vert <= horz {
                    (vert, DIR_VERTICAL)
                } else {
                    (horz, DIR_HORIZONTAL)
                };

                grid.set(i, j, sc + best, dir);
                row_min = row_min.min(sc + best);
            }

            if n - i <= cfg.psi_s1 {
                endpoint_best = endpoint_best.min(grid.get(i, m));
            }

            // Same abandonment rule as the rolling fill; abandoned rows keep
            // their initial infinite cells.
            if let Some(c) = cutoff
                && i < n
                && i >= cfg.psi_s1
                && row_min > c
                && endpoint_best > c
            {
                debug!(row = i, "early abandonment: cutoff unreachable");
                grid.mark_pruned();
                break;
            }
        }
    }
}

fn read_banded(buffer: &[f64], start: usize, col: usize) -> f64 {
    if col < start {
        return f64::INFINITY;
    }
    let slot = col - start + 1;
    if slot < buffer.len() {
        buffer[slot]
    } else {
        f64::INFINITY
    }
}
