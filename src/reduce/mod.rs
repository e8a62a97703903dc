//! Dimensionality reduction: N×D embedding vectors in, N×3 coordinates out.
//!
//! The pipeline only sees the [`Reducer`] trait; [`Tsne`] is the production
//! implementation, tests substitute cheap stand-ins.

pub mod octree;
pub mod pca;
pub mod tsne;

use thiserror::Error;

/// One reduced point.
pub type Coord = [f64; 3];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReduceError {
    #[error("no samples to reduce")]
    EmptyInput,
    #[error("vectors have zero dimensions")]
    ZeroDimension,
    #[error("row {row} has {got} dimensions, expected {expected}")]
    DimensionMismatch { row: usize, expected: usize, got: usize },
    #[error("perplexity ({perplexity}) must be less than the number of samples ({samples})")]
    PerplexityTooLarge { perplexity: f64, samples: usize },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Starting layout of the optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Init {
    /// Small isotropic Gaussian noise.
    Random,
    /// Projection on the top principal components.
    Pca,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Solver {
    /// Dense affinities and O(N²) gradients.
    Exact,
    /// Sparse nearest-neighbour affinities and an octree for repulsion.
    BarnesHut { theta: f64 },
}

/// t-SNE hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TsneConfig {
    pub perplexity: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub early_exaggeration: f64,
    /// Iterations run with exaggerated affinities and low momentum.
    pub exaggeration_iter: usize,
    pub init: Init,
    pub solver: Solver,
    /// `None` draws a fresh seed from the OS on every run.
    pub seed: Option<u64>,
}

impl Default for TsneConfig {
    fn default() -> Self {
        Self {
            perplexity: 30.0,
            learning_rate: 200.0,
            max_iter: 1000,
            early_exaggeration: 12.0,
            exaggeration_iter: 250,
            init: Init::Pca,
            solver: Solver::BarnesHut { theta: 0.5 },
            seed: None,
        }
    }
}

impl TsneConfig {
    /// Check the parameters against a matrix of `samples` rows and `dims` columns.
    pub fn validate(&self, samples: usize, dims: usize) -> Result<(), ReduceError> {
        if samples == 0 {
            return Err(ReduceError::EmptyInput);
        }
        if dims == 0 {
            return Err(ReduceError::ZeroDimension);
        }
        if !(self.perplexity > 0.0) {
            return Err(ReduceError::InvalidParameter(format!(
                "perplexity must be positive, got {}",
                self.perplexity
            )));
        }
        if self.perplexity >= samples as f64 {
            return Err(ReduceError::PerplexityTooLarge {
                perplexity: self.perplexity,
                samples,
            });
        }
        if !(self.learning_rate > 0.0) {
            return Err(ReduceError::InvalidParameter(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.max_iter == 0 {
            return Err(ReduceError::InvalidParameter("max_iter must be at least 1".into()));
        }
        if let Solver::BarnesHut { theta } = self.solver {
            if !(0.0..=1.0).contains(&theta) {
                return Err(ReduceError::InvalidParameter(format!(
                    "theta must lie in [0, 1], got {theta}"
                )));
            }
        }
        Ok(())
    }
}

/// Shape of a row-major matrix, rejecting ragged rows.
pub fn matrix_shape(matrix: &[Vec<f64>]) -> Result<(usize, usize), ReduceError> {
    let first = matrix.first().ok_or(ReduceError::EmptyInput)?;
    let dims = first.len();
    for (row, v) in matrix.iter().enumerate() {
        if v.len() != dims {
            return Err(ReduceError::DimensionMismatch {
                row,
                expected: dims,
                got: v.len(),
            });
        }
    }
    Ok((matrix.len(), dims))
}

// ---------------------------------------------------------------------------
// Reducer seam
// ---------------------------------------------------------------------------

pub trait Reducer {
    /// Map every row of `matrix` to a 3D coordinate, preserving order.
    fn reduce(&self, matrix: &[Vec<f64>], config: &TsneConfig) -> Result<Vec<Coord>, ReduceError>;
}

/// The t-SNE reducer.
#[derive(Debug, Default, Clone, Copy)]
pub struct Tsne;

impl Reducer for Tsne {
    fn reduce(&self, matrix: &[Vec<f64>], config: &TsneConfig) -> Result<Vec<Coord>, ReduceError> {
        tsne::fit_transform(matrix, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perplexity_must_be_below_sample_count() {
        let config = TsneConfig { perplexity: 20.0, ..TsneConfig::default() };
        assert_eq!(
            config.validate(20, 4),
            Err(ReduceError::PerplexityTooLarge { perplexity: 20.0, samples: 20 })
        );
        assert!(config.validate(21, 4).is_ok());
    }

    #[test]
    fn zero_dimensions_and_empty_input_fail() {
        let config = TsneConfig::default();
        assert_eq!(config.validate(0, 4), Err(ReduceError::EmptyInput));
        assert_eq!(config.validate(100, 0), Err(ReduceError::ZeroDimension));
    }

    #[test]
    fn bad_parameters_fail() {
        let bad_theta = TsneConfig { solver: Solver::BarnesHut { theta: 1.5 }, ..TsneConfig::default() };
        assert!(matches!(bad_theta.validate(100, 2), Err(ReduceError::InvalidParameter(_))));

        let no_iter = TsneConfig { max_iter: 0, ..TsneConfig::default() };
        assert!(matches!(no_iter.validate(100, 2), Err(ReduceError::InvalidParameter(_))));

        let nan_lr = TsneConfig { learning_rate: f64::NAN, ..TsneConfig::default() };
        assert!(matches!(nan_lr.validate(100, 2), Err(ReduceError::InvalidParameter(_))));
    }

    #[test]
    fn ragged_matrix_is_rejected() {
        let m = vec![vec![1.0, 2.0], vec![1.0]];
        assert_eq!(
            matrix_shape(&m),
            Err(ReduceError::DimensionMismatch { row: 1, expected: 2, got: 1 })
        );
        assert_eq!(matrix_shape(&[]), Err(ReduceError::EmptyInput));
    }
}
