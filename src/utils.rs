//! Numeric helpers shared by the learning dynamics

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1};

/// Absolute tolerance used when checking that probabilities sum to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-8;

/// Calculate Shannon entropy from a probability distribution.
///
/// The Shannon entropy is calculated as: H = -Σ(p * ln(p)) for p > 0
///
/// # Examples
///
/// ```
/// use crld::utils::shannon_entropy;
///
/// let entropy = shannon_entropy(vec![0.5, 0.5]);
/// assert!((entropy - std::f64::consts::LN_2).abs() < 0.001);
///
/// let entropy = shannon_entropy(vec![1.0, 0.0, 0.0]);
/// assert!(entropy.abs() < 0.001);
/// ```
pub fn shannon_entropy<I>(probabilities: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    probabilities
        .into_iter()
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

/// Fallback behavior when weight normalization fails (zero or negative total).
#[derive(Debug, Clone, Copy)]
pub enum NormalizationFallback {
    /// Return None if normalization fails
    None,
    /// Fall back to uniform distribution
    Uniform,
}

/// Normalize weights to probabilities that sum to 1.0 with configurable fallback.
///
/// # Examples
///
/// ```
/// use crld::utils::{normalize_weights_with_options, NormalizationFallback};
///
/// let normalized = normalize_weights_with_options(
///     vec![1.0, 2.0, 1.0],
///     NormalizationFallback::None,
/// ).unwrap();
/// assert_eq!(normalized, vec![0.25, 0.5, 0.25]);
///
/// let normalized = normalize_weights_with_options(
///     vec![0.0, 0.0, 0.0],
///     NormalizationFallback::Uniform,
/// ).unwrap();
/// assert_eq!(normalized, vec![1.0/3.0, 1.0/3.0, 1.0/3.0]);
/// ```
pub fn normalize_weights_with_options<I>(
    weights: I,
    fallback: NormalizationFallback,
) -> Option<Vec<f64>>
where
    I: IntoIterator<Item = f64>,
{
    let weights_vec: Vec<f64> = weights.into_iter().collect();

    if weights_vec.is_empty() {
        return match fallback {
            NormalizationFallback::None => None,
            NormalizationFallback::Uniform => Some(vec![]),
        };
    }

    let sum: f64 = weights_vec.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        return match fallback {
            NormalizationFallback::None => None,
            NormalizationFallback::Uniform => {
                let uniform = 1.0 / weights_vec.len() as f64;
                Some(vec![uniform; weights_vec.len()])
            }
        };
    }

    Some(weights_vec.iter().map(|&w| w / sum).collect())
}

/// Whether `value` is within [`PROBABILITY_TOLERANCE`] of `target`.
pub fn is_close(value: f64, target: f64) -> bool {
    (value - target).abs() <= PROBABILITY_TOLERANCE
}

/// Whether every element of `values` is (numerically) zero.
pub fn all_close_to_zero(values: ArrayView1<'_, f64>) -> bool {
    values.iter().all(|&v| is_close(v, 0.0))
}

/// Normalize `exponents` through a max-shifted exponential.
///
/// Entries equal to `f64::NEG_INFINITY` receive zero probability. If every
/// entry is `NEG_INFINITY` the result is uniform.
pub fn softmax(exponents: &[f64]) -> Vec<f64> {
    let max = exponents
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return vec![1.0 / exponents.len() as f64; exponents.len()];
    }
    let weights: Vec<f64> = exponents.iter().map(|&v| (v - max).exp()).collect();
    normalize_weights_with_options(weights, NormalizationFallback::Uniform).unwrap_or_default()
}

/// Pivots below this magnitude mark a singular system.
const SINGULAR_PIVOT: f64 = 1e-14;

/// Solve the dense linear system `a · x = b` by LU decomposition with
/// partial pivoting.
///
/// Returns `None` when the matrix is singular or not square.
pub fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    if a.dim() != (n, n) {
        return None;
    }
    let lu = DMatrix::from_fn(n, n, |row, col| a[[row, col]]).lu();
    if lu.u().diagonal().iter().any(|pivot| pivot.abs() < SINGULAR_PIVOT) {
        return None;
    }
    let x = lu.solve(&DVector::from_iterator(n, b.iter().copied()))?;
    Some(x.iter().copied().collect())
}
