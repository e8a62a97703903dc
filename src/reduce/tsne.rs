//! t-distributed Stochastic Neighbor Embedding into three dimensions.
//!
//! Gaussian affinities are calibrated per point to the requested perplexity,
//! then a Student-t layout is fitted by gradient descent with momentum and
//! per-coordinate adaptive gains. The first `exaggeration_iter` iterations
//! multiply affinities by `early_exaggeration`.
//!
//! Work that runs on the rayon pool only produces per-row values which are
//! then reduced sequentially, so a seeded run is bit-for-bit reproducible.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;

use super::octree::{squared_distance, Octree};
use super::{matrix_shape, pca, Coord, Init, ReduceError, Solver, TsneConfig};

const PERPLEXITY_TOLERANCE: f64 = 1e-5;
const PERPLEXITY_STEPS: usize = 100;
const INITIAL_MOMENTUM: f64 = 0.5;
const FINAL_MOMENTUM: f64 = 0.8;
const MIN_GAIN: f64 = 0.01;
/// Standard deviation of the starting layout.
const INIT_SCALE: f64 = 1e-4;
const LOG_EVERY: usize = 50;

/// Symmetric joint probabilities in the input space.
enum Affinities {
    Dense(Vec<Vec<f64>>),
    /// Row `i` lists `(j, p_ij)` for the neighbours of `i`.
    Sparse(Vec<Vec<(usize, f64)>>),
}

/// Run t-SNE on a row-major matrix.
pub fn fit_transform(matrix: &[Vec<f64>], config: &TsneConfig) -> Result<Vec<Coord>, ReduceError> {
    let (n, dims) = matrix_shape(matrix)?;
    config.validate(n, dims)?;
    if n == 1 {
        return Ok(vec![[0.0; 3]]);
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let distances = pairwise_squared_distances(matrix);
    let affinities = match config.solver {
        Solver::Exact => Affinities::Dense(dense_affinities(&distances, config.perplexity)),
        Solver::BarnesHut { .. } => Affinities::Sparse(sparse_affinities(&distances, config.perplexity)),
    };
    drop(distances);

    let mut embedding = initial_embedding(matrix, config.init, &mut rng);
    optimize(&affinities, &mut embedding, config);
    Ok(embedding)
}

fn pairwise_squared_distances(matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
    (0..matrix.len())
        .into_par_iter()
        .map(|i| {
            matrix
                .iter()
                .map(|other| {
                    matrix[i]
                        .iter()
                        .zip(other)
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum::<f64>()
                })
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Affinities
// ---------------------------------------------------------------------------

/// Conditional probabilities `p_{j|i}` over the given candidate distances,
/// with the Gaussian precision found by bisection so that the entropy of the
/// row equals `ln(perplexity)`.
fn conditional_row(distances: &[f64], perplexity: f64) -> Vec<f64> {
    if distances.is_empty() {
        return Vec::new();
    }
    // Shifting by the minimum leaves the normalised row unchanged and keeps
    // exp() away from underflow.
    let d_min = distances.iter().copied().fold(f64::INFINITY, f64::min);
    let shifted: Vec<f64> = distances.iter().map(|d| d - d_min).collect();

    let target = perplexity.ln();
    let mut beta = 1.0;
    let mut beta_min = f64::NEG_INFINITY;
    let mut beta_max = f64::INFINITY;
    let mut row = vec![0.0; shifted.len()];

    for _ in 0..PERPLEXITY_STEPS {
        let mut sum_p = 0.0;
        for (p, d) in row.iter_mut().zip(&shifted) {
            *p = (-d * beta).exp();
            sum_p += *p;
        }
        if sum_p == 0.0 {
            sum_p = f64::EPSILON;
        }
        let mut weighted = 0.0;
        for (p, d) in row.iter_mut().zip(&shifted) {
            *p /= sum_p;
            weighted += d * *p;
        }
        let entropy = sum_p.ln() + beta * weighted;
        let diff = entropy - target;
        if diff.abs() <= PERPLEXITY_TOLERANCE {
            break;
        }
        if diff > 0.0 {
            beta_min = beta;
            beta = if beta_max.is_infinite() { beta * 2.0 } else { 0.5 * (beta + beta_max) };
        } else {
            beta_max = beta;
            beta = if beta_min.is_infinite() { beta / 2.0 } else { 0.5 * (beta + beta_min) };
        }
    }
    row
}

fn dense_affinities(distances: &[Vec<f64>], perplexity: f64) -> Vec<Vec<f64>> {
    let n = distances.len();
    let conditional: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let others: Vec<f64> = (0..n).filter(|&j| j != i).map(|j| distances[i][j]).collect();
            let mut row = conditional_row(&others, perplexity);
            row.insert(i, 0.0);
            row
        })
        .collect();

    let total: f64 = (0..n)
        .map(|i| (0..n).map(|j| conditional[i][j] + conditional[j][i]).sum::<f64>())
        .sum::<f64>()
        .max(f64::EPSILON);

    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        0.0
                    } else {
                        ((conditional[i][j] + conditional[j][i]) / total).max(f64::EPSILON)
                    }
                })
                .collect()
        })
        .collect()
}

fn sparse_affinities(distances: &[Vec<f64>], perplexity: f64) -> Vec<Vec<(usize, f64)>> {
    let n = distances.len();
    let k = (n - 1).min((3.0 * perplexity + 1.0) as usize);

    let conditional: Vec<Vec<(usize, f64)>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut neighbours: Vec<usize> = (0..n).filter(|&j| j != i).collect();
            neighbours.sort_by(|&a, &b| distances[i][a].total_cmp(&distances[i][b]).then(a.cmp(&b)));
            neighbours.truncate(k);
            let d: Vec<f64> = neighbours.iter().map(|&j| distances[i][j]).collect();
            neighbours.into_iter().zip(conditional_row(&d, perplexity)).collect()
        })
        .collect();

    let mut symmetric: Vec<std::collections::BTreeMap<usize, f64>> = vec![Default::default(); n];
    for (i, row) in conditional.iter().enumerate() {
        for &(j, p) in row {
            *symmetric[i].entry(j).or_insert(0.0) += p;
            *symmetric[j].entry(i).or_insert(0.0) += p;
        }
    }
    let total: f64 = symmetric
        .iter()
        .map(|row| row.values().sum::<f64>())
        .sum::<f64>()
        .max(f64::EPSILON);

    symmetric
        .into_iter()
        .map(|row| row.into_iter().map(|(j, p)| (j, (p / total).max(f64::EPSILON))).collect())
        .collect()
}

// ---------------------------------------------------------------------------
// Optimisation
// ---------------------------------------------------------------------------

fn initial_embedding(matrix: &[Vec<f64>], init: Init, rng: &mut StdRng) -> Vec<Coord> {
    if init == Init::Pca {
        let projected = pca::project(matrix, rng);
        let n = projected.len() as f64;
        let mean = projected.iter().map(|p| p[0]).sum::<f64>() / n;
        let std = (projected.iter().map(|p| (p[0] - mean).powi(2)).sum::<f64>() / n).sqrt();
        if std > 0.0 {
            let scale = INIT_SCALE / std;
            return projected.into_iter().map(|p| p.map(|v| v * scale)).collect();
        }
        debug!("PCA initialisation degenerate, falling back to random");
    }
    (0..matrix.len())
        .map(|_| [0, 1, 2].map(|_| INIT_SCALE * rng.sample::<f64, _>(StandardNormal)))
        .collect()
}

fn optimize(affinities: &Affinities, embedding: &mut [Coord], config: &TsneConfig) {
    let n = embedding.len();
    let mut update = vec![[0.0; 3]; n];
    let mut gains = vec![[1.0_f64; 3]; n];
    let theta = match config.solver {
        Solver::BarnesHut { theta } => theta,
        Solver::Exact => 0.0,
    };

    for iter in 0..config.max_iter {
        let exploring = iter < config.exaggeration_iter;
        let exaggeration = if exploring { config.early_exaggeration } else { 1.0 };
        let momentum = if exploring { INITIAL_MOMENTUM } else { FINAL_MOMENTUM };

        let grad = match affinities {
            Affinities::Dense(p) => exact_gradient(p, embedding, exaggeration),
            Affinities::Sparse(p) => barnes_hut_gradient(p, embedding, exaggeration, theta),
        };

        for i in 0..n {
            for k in 0..3 {
                let g = grad[i][k];
                if update[i][k] * g < 0.0 {
                    gains[i][k] += 0.2;
                } else {
                    gains[i][k] = (gains[i][k] * 0.8).max(MIN_GAIN);
                }
                update[i][k] = momentum * update[i][k] - config.learning_rate * gains[i][k] * g;
                embedding[i][k] += update[i][k];
            }
        }

        if (iter + 1) % LOG_EVERY == 0 {
            let norm = grad.iter().flatten().map(|g| g * g).sum::<f64>().sqrt();
            debug!("t-SNE iteration {}: gradient norm {norm:.7}", iter + 1);
        }
    }
}

fn exact_gradient(p: &[Vec<f64>], y: &[Coord], exaggeration: f64) -> Vec<Coord> {
    let n = y.len();
    let num: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (0..n)
                .map(|j| if i == j { 0.0 } else { 1.0 / (1.0 + squared_distance(&y[i], &y[j])) })
                .collect()
        })
        .collect();
    let z = num
        .iter()
        .map(|row| row.iter().sum::<f64>())
        .sum::<f64>()
        .max(f64::EPSILON);

    (0..n)
        .into_par_iter()
        .map(|i| {
            let mut g = [0.0; 3];
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mult = (exaggeration * p[i][j] - num[i][j] / z) * num[i][j];
                for k in 0..3 {
                    g[k] += mult * (y[i][k] - y[j][k]);
                }
            }
            g.map(|v| 4.0 * v)
        })
        .collect()
}

fn barnes_hut_gradient(p: &[Vec<(usize, f64)>], y: &[Coord], exaggeration: f64, theta: f64) -> Vec<Coord> {
    let tree = Octree::build(y);
    let repulsive: Vec<(f64, Coord)> = (0..y.len())
        .into_par_iter()
        .map(|i| tree.repulsion(i, theta))
        .collect();
    let z = repulsive.iter().map(|(q, _)| q).sum::<f64>().max(f64::EPSILON);

    (0..y.len())
        .into_par_iter()
        .map(|i| {
            let mut g = [0.0; 3];
            for &(j, p_ij) in &p[i] {
                let q = 1.0 / (1.0 + squared_distance(&y[i], &y[j]));
                let mult = exaggeration * p_ij * q;
                for k in 0..3 {
                    g[k] += mult * (y[i][k] - y[j][k]);
                }
            }
            let rep = repulsive[i].1;
            [0, 1, 2].map(|k| 4.0 * (g[k] - rep[k] / z))
        })
        .collect()
}
