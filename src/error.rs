//! Error types for DTW configuration and computation.

/// Errors from validating a [`DtwSettings`](crate::DtwSettings) value.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Returned when a numeric setting is negative or NaN.
    #[error("setting `{field}` must be non-negative and not NaN, got {value}")]
    NegativeField {
        /// Name of the offending settings field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// Errors from DTW distance computation, path recovery, and batch evaluation.
///
/// Exceeding `max_dist` is *not* an error: it yields an infinite
/// [`DtwDistance`](crate::DtwDistance) so callers can distinguish an
/// abandoned computation from a genuine failure by value, not by error type.
#[derive(Debug, thiserror::Error)]
pub enum DtwError {
    /// Wraps a settings validation failure.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Returned when the sequence lengths differ by more than `max_length_diff`.
    ///
    /// This is a precondition failure, distinct from the "no reachable
    /// alignment" outcome which yields an infinite distance instead.
    #[error("sequence length difference {diff} exceeds max_length_diff {max}")]
    LengthMismatch {
        /// Absolute difference of the two sequence lengths.
        diff: usize,
        /// The configured `max_length_diff` bound.
        max: usize,
    },

    /// Returned when a sequence contains NaN, infinity, or negative infinity.
    #[error("sequence contains non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found.
        index: usize,
    },

    /// Returned when a warping path is requested from a grid that was filled
    /// without traceback directions. No partial path is ever returned.
    #[error("warping path requested from a grid filled without traceback")]
    PathNotTracked,

    /// Returned when the banded cost grid cannot be allocated.
    #[error("cost grid of {cells} cells exceeds available memory")]
    GridAllocation {
        /// Number of in-band cells the grid would require.
        cells: usize,
    },

    /// Returned when the worker pool for a distance matrix cannot be built.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
