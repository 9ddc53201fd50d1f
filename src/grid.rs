//! Banded accumulated-cost grid storage and path recovery.

use crate::band::Band;
use crate::distance::DtwDistance;
use crate::error::DtwError;
use crate::path::{WarpingPath, WarpingStep};
use crate::stepcost::StepCost;

pub(crate) const DIR_DIAGONAL: u8 = 0;
pub(crate) const DIR_VERTICAL: u8 = 1;
pub(crate) const DIR_HORIZONTAL: u8 = 2;

/// Whether a grid fill records traceback directions for path recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traceback {
    /// Record a direction byte per cell; enables [`CostGrid::best_path`].
    Enabled,
    /// Skip direction recording; only the distance can be extracted.
    Disabled,
}

/// Filled accumulated-cost grid for one sequence pair.
///
/// Conceptually (n+1) x (m+1); physically only in-band cells of rows `1..=n`
/// are materialized. Row 0 and column 0 are virtual boundary cells encoding
/// the psi start relaxation: `(0, j)` is zero for `j <= psi_s2`, `(i, 0)` is
/// zero for `i <= psi_s1`, everything else outside the band reads as
/// infinity.
#[derive(Debug)]
pub struct CostGrid {
    n: usize,
    m: usize,
    band: Band,
    offsets: Vec<usize>,
    cells: Vec<f64>,
    dirs: Option<Vec<u8>>,
    psi_s1: usize,
    psi_s2: usize,
    step_cost: StepCost,
    cutoff: Option<f64>,
    pruned: bool,
}

impl CostGrid {
    /// Allocate an all-infinity grid for the given band.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::GridAllocation`] | Cell count overflows or memory cannot be reserved |
    pub(crate) fn try_new(
        n: usize,
        m: usize,
        band: Band,
        traceback: Traceback,
        psi_s1: usize,
        psi_s2: usize,
        step_cost: StepCost,
        cutoff: Option<f64>,
    ) -> Result<Self, DtwError> {
        debug_assert_eq!(band.n_rows(), n);

        let mut offsets = Vec::with_capacity(n + 1);
        offsets.push(0usize);
        let mut total = 0usize;
        for i in 1..=n {
            total = total
                .checked_add(band.row(i).len())
                .ok_or(DtwError::GridAllocation { cells: usize::MAX })?;
            offsets.push(total);
        }

        let mut cells = Vec::new();
        cells
            .try_reserve_exact(total)
            .map_err(|_| DtwError::GridAllocation { cells: total })?;
        cells.resize(total, f64::INFINITY);

        let dirs = match traceback {
            Traceback::Enabled => {
                let mut d = Vec::new();
                d.try_reserve_exact(total)
                    .map_err(|_| DtwError::GridAllocation { cells: total })?;
                d.resize(total, DIR_DIAGONAL);
                Some(d)
            }
            Traceback::Disabled => None,
        };

        Ok(Self {
            n,
            m,
            band,
            offsets,
            cells,
            dirs,
            psi_s1,
            psi_s2,
            step_cost,
            cutoff,
            pruned: false,
        })
    }

    /// Return the grid shape as `(n, m)` sequence lengths.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.n, self.m)
    }

    /// Return true if the fill abandoned rows because of the cutoff.
    #[must_use]
    pub fn is_pruned(&self) -> bool {
        self.pruned
    }

    /// Return true if the grid carries traceback directions.
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.dirs.is_some()
    }

    pub(crate) fn row_range(&self, i: usize) -> std::ops::Range<usize> {
        self.band.row(i)
    }

    pub(crate) fn mark_pruned(&mut self) {
        self.pruned = true;
    }

    pub(crate) fn cutoff(&self) -> Option<f64> {
        self.cutoff
    }

    fn idx(&self, i: usize, j: usize) -> Option<usize> {
        let range = self.band.row(i);
        if range.contains(&j) {
            Some(self.offsets[i - 1] + (j - range.start))
        } else {
            None
        }
    }

    /// Read cell `(i, j)`, including the virtual boundary row and column.
    pub(crate) fn get(&self, i: usize, j: usize) -> f64 {
        if i == 0 {
            return if j <= self.psi_s2 { 0.0 } else { f64::INFINITY };
        }
        if j == 0 {
            return if i <= self.psi_s1 { 0.0 } else { f64::INFINITY };
        }
        match self.idx(i, j) {
            Some(k) => self.cells[k],
            None => f64::INFINITY,
        }
    }

    /// Write cell `(i, j)` with its accumulated cost and chosen direction.
    pub(crate) fn set(&mut self, i: usize, j: usize, value: f64, dir: u8) {
        let k = self
            .idx(i, j)
            .expect("cell writes stay inside the resolved band");
        self.cells[k] = value;
        if let Some(dirs) = &mut self.dirs {
            dirs[k] = dir;
        }
    }

    /// Minimum accumulated cost over the psi-relaxed endpoint cells, with
    /// the cell that achieved it.
    fn best_endpoint(&self) -> (f64, Option<(usize, usize)>) {
        let mut best = f64::INFINITY;
        let mut best_cell = None;

        for k in 0..=self.psi_s2.min(self.m) {
            let j = self.m - k;
            let v = self.get(self.n, j);
            if v < best {
                best = v;
                best_cell = Some((self.n, j));
            }
        }
        for k in 0..=self.psi_s1.min(self.n) {
            let i = self.n - k;
            let v = self.get(i, self.m);
            if v < best {
                best = v;
                best_cell = Some((i, self.m));
            }
        }
        (best, best_cell)
    }

    /// Raw extracted cost after applying the cutoff, if any.
    fn extracted_raw(&self) -> (f64, Option<(usize, usize)>) {
        let (raw, cell) = self.best_endpoint();
        match self.cutoff {
            Some(c) if raw > c => (f64::INFINITY, None),
            _ => (raw, cell),
        }
    }

    /// Extract the distance from the filled grid.
    #[must_use]
    pub fn distance(&self) -> DtwDistance {
        let (raw, _) = self.extracted_raw();
        DtwDistance::new(self.step_cost.finalize(raw))
    }

    /// Recover the optimal warping path by backtracking from the best
    /// endpoint. Returns an empty path when no alignment is reachable.
    ///
    /// Tie-break is deterministic: diagonal, then vertical, then horizontal,
    /// fixed at fill time, so identical grids always yield identical paths.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::PathNotTracked`] | The grid was filled with [`Traceback::Disabled`] |
    pub fn best_path(&self) -> Result<WarpingPath, DtwError> {
        let dirs = self.dirs.as_ref().ok_or(DtwError::PathNotTracked)?;

        let (raw, cell) = self.extracted_raw();
        let Some((mut i, mut j)) = cell else {
            return Ok(WarpingPath::new(Vec::new()));
        };
        // A boundary endpoint means the relaxation skipped everything.
        if !raw.is_finite() || i == 0 || j == 0 {
            return Ok(WarpingPath::new(Vec::new()));
        }

        let mut steps = Vec::new();
        loop {
            steps.push(WarpingStep { a: i - 1, b: j - 1 });
            let k = self
                .idx(i, j)
                .expect("finite path cells are materialized in the band");
            match dirs[k] {
                DIR_DIAGONAL => {
                    if i == 1 || j == 1 {
                        break;
                    }
                    i -= 1;
                    j -= 1;
                }
                DIR_VERTICAL => {
                    if i == 1 {
                        break;
                    }
                    i -= 1;
                }
                DIR_HORIZONTAL => {
                    if j == 1 {
                        break;
                    }
                    j -= 1;
                }
                _ => unreachable!("invalid direction byte"),
            }
        }
        steps.reverse();
        Ok(WarpingPath::new(steps))
    }
}
