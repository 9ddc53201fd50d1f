//! Dynamic Time Warping distance computation.
//!
//! Pure math library — zero I/O. Aligns two numeric sequences of possibly
//! unequal length by a minimum-cost nonlinear warping and reports the
//! resulting distance, with:
//!
//! - direction-specific step penalties (`penalty_s1` for expanding the first
//!   sequence, `penalty_s2` for the second; the legacy symmetric `penalty`
//!   resolves to both),
//! - a scaled band constraint (`window`) and an index-drift cap (`max_step`),
//! - psi boundary relaxation (leading/trailing samples skipped for free),
//! - early abandonment against a `max_dist` threshold,
//! - optimal warping-path recovery,
//! - rayon-parallel all-pairs distance matrices.
//!
//! ## Quick start
//! ```
//! use warpdist::{Dtw, DtwSettings, Sequence};
//!
//! let a = Sequence::new(vec![0.0, 1.0, 2.0]).unwrap();
//! let b = Sequence::new(vec![0.0, 2.0]).unwrap();
//!
//! let dtw = Dtw::new(DtwSettings::new().with_penalty_s1(2.0)).unwrap();
//! let dist = dtw.distance(a.as_view(), b.as_view()).unwrap();
//! assert!((dist.value() - 3.0_f64.sqrt()).abs() < 1e-10);
//! ```
//!
//! An infinite [`DtwDistance`] is a normal outcome (the constraints left no
//! reachable alignment, or early abandonment fired) and is always
//! distinguishable from genuine failures, which surface as [`DtwError`].

mod band;
mod distance;
mod dtw;
mod error;
mod grid;
mod matrix;
mod path;
mod series;
mod settings;
mod stepcost;

pub use distance::DtwDistance;
pub use dtw::Dtw;
pub use error::{DtwError, SettingsError};
pub use grid::{CostGrid, Traceback};
pub use matrix::DistanceMatrix;
pub use path::{WarpingPath, WarpingStep};
pub use series::{Sequence, SequenceView};
pub use settings::DtwSettings;
pub use stepcost::StepCost;
