//! Correlated Brownian baskets via Cholesky decomposition
//!
//! Given a correlation matrix C = Uᵀ U with U upper-triangular, a row vector
//! of independent normals Z becomes correlated as Z·U, since
//! Cov(Z·U) = Uᵀ Cov(Z) U = C when the draws share one variance.

use rand::Rng;
use tracing::debug;

use crate::brownian::BrownianMotion;
use crate::error::{Result, SimulationError};
use crate::parameters::ModelParameters;

const SYMMETRY_TOLERANCE: f64 = 1e-9;
const PIVOT_TOLERANCE: f64 = 1e-10;

fn check_finite(values: &[f64]) -> Result<()> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(v) => Err(SimulationError::invalid(
            "correlation matrix",
            format!("entries must be finite, got {}", v),
        )),
        None => Ok(()),
    }
}

/// Square, symmetric correlation matrix stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    values: Vec<f64>,
    dim: usize,
}

impl CorrelationMatrix {
    /// Builds a matrix from row-major values
    ///
    /// Only shape and symmetry are checked here; positive semi-definiteness
    /// is checked by [`CorrelationMatrix::cholesky_upper`].
    ///
    /// # Example
    /// ```
    /// use synthetic_market::CorrelationMatrix;
    ///
    /// let matrix = CorrelationMatrix::new(&[1.0, 0.5, 0.5, 1.0], 2).unwrap();
    /// assert_eq!(matrix.dim(), 2);
    /// ```
    pub fn new(values: &[f64], dim: usize) -> Result<Self> {
        if values.len() != dim * dim {
            return Err(SimulationError::DimensionMismatch {
                what: "correlation matrix entries",
                expected: dim * dim,
                actual: values.len(),
            });
        }
        check_finite(values)?;
        for row in 0..dim {
            for col in (row + 1)..dim {
                if (values[row * dim + col] - values[col * dim + row]).abs() > SYMMETRY_TOLERANCE {
                    return Err(SimulationError::NotSymmetric { row, col });
                }
            }
        }
        Ok(Self {
            values: values.to_vec(),
            dim,
        })
    }

    /// Builds a matrix from nested rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let dim = rows.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != dim) {
            return Err(SimulationError::DimensionMismatch {
                what: "correlation matrix row",
                expected: dim,
                actual: bad.len(),
            });
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::new(&flat, dim)
    }

    /// Identity matrix: n uncorrelated assets.
    pub fn identity(dim: usize) -> Self {
        Self::equicorrelated(dim, 0.0)
    }

    /// Unit diagonal with every off-diagonal entry equal to `rho`.
    pub fn equicorrelated(dim: usize, rho: f64) -> Self {
        let mut values = vec![rho; dim * dim];
        for i in 0..dim {
            values[i * dim + i] = 1.0;
        }
        Self { values, dim }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.dim + col]
    }

    /// Upper-triangular factor U with Uᵀ U = C
    ///
    /// Zero pivots are accepted so that singular but positive semi-definite
    /// matrices (e.g. perfectly correlated assets) still factorize; the
    /// corresponding row of U is left at zero.
    ///
    /// # Errors
    /// [`SimulationError::NotPositiveSemiDefinite`] when a pivot is negative,
    /// or when a zero pivot leaves a non-zero residual in its row.
    /// [`SimulationError::InvalidParameter`] for NaN or infinite entries.
    pub fn cholesky_upper(&self) -> Result<CholeskyFactor> {
        check_finite(&self.values)?;
        let n = self.dim;
        let scale = (0..n).map(|i| self.get(i, i).abs()).fold(1.0, f64::max);
        let tol = PIVOT_TOLERANCE * scale;
        let mut u = vec![0.0_f64; n * n];

        for i in 0..n {
            let pivot = self.get(i, i) - (0..i).map(|k| u[k * n + i].powi(2)).sum::<f64>();
            if pivot < -tol {
                return Err(SimulationError::NotPositiveSemiDefinite { pivot: i, value: pivot });
            }
            let diag = if pivot > tol { pivot.sqrt() } else { 0.0 };
            u[i * n + i] = diag;

            for j in (i + 1)..n {
                let residual = self.get(i, j) - (0..i).map(|k| u[k * n + i] * u[k * n + j]).sum::<f64>();
                if diag > 0.0 {
                    u[i * n + j] = residual / diag;
                } else if residual.abs() > tol.sqrt() {
                    return Err(SimulationError::NotPositiveSemiDefinite { pivot: i, value: pivot });
                }
            }
        }

        Ok(CholeskyFactor { values: u, dim: n })
    }
}

/// Upper-triangular Cholesky factor of a [`CorrelationMatrix`]
#[derive(Debug, Clone, PartialEq)]
pub struct CholeskyFactor {
    values: Vec<f64>,
    dim: usize,
}

impl CholeskyFactor {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.dim + col]
    }

    /// Correlates one row of independent draws: returns z·U.
    pub fn correlate(&self, z: &[f64]) -> Vec<f64> {
        let n = self.dim;
        (0..n)
            .map(|col| (0..=col).map(|k| z[k] * self.values[k * n + col]).sum())
            .collect()
    }
}

/// Builds a basket of `n` correlated Brownian increment paths
///
/// Draws an `all_time × n` matrix of N(0, sqrt(Δ)·σ) values, right-multiplies
/// it by the upper Cholesky factor of `correlation_matrix` and returns the
/// columns. The output is increments, not price levels.
///
/// # Errors
/// - [`SimulationError::DimensionMismatch`] when `n` differs from the matrix size
/// - [`SimulationError::NotPositiveSemiDefinite`] when factorization fails
pub fn get_correlated_geometric_brownian_motions<R: Rng>(
    params: &ModelParameters,
    correlation_matrix: &CorrelationMatrix,
    n: usize,
    rng: &mut R,
) -> Result<Vec<Vec<f64>>> {
    if correlation_matrix.dim() != n {
        return Err(SimulationError::DimensionMismatch {
            what: "number of assets",
            expected: correlation_matrix.dim(),
            actual: n,
        });
    }
    let factor = correlation_matrix.cholesky_upper()?;
    let bm = BrownianMotion::new(params.sqrt_delta_sigma())?;

    let mut paths = vec![Vec::with_capacity(params.all_time); n];
    for _ in 0..params.all_time {
        let uncorrelated = bm.increments(rng, n);
        for (path, value) in paths.iter_mut().zip(factor.correlate(&uncorrelated)) {
            path.push(value);
        }
    }

    debug!(assets = n, steps = params.all_time, "built correlated basket");
    Ok(paths)
}

/// Pearson sample correlation over the common prefix of `a` and `b`.
///
/// Returns 0.0 when either series has no variance.
pub fn sample_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a > 0.0 && var_b > 0.0 {
        cov / (var_a.sqrt() * var_b.sqrt())
    } else {
        0.0
    }
}
