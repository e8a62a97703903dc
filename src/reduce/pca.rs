use rand::Rng;
use rand_distr::StandardNormal;

use super::Coord;

const POWER_ITERATIONS: usize = 300;
const TOLERANCE: f64 = 1e-10;

/// Project `matrix` on its top three principal components.
///
/// Components are found by power iteration on `XᵀX` with deflation. The
/// starting vectors are drawn from `rng`, so component signs depend on it.
/// Components beyond the rank of the data come out as zeros.
pub fn project<R: Rng + ?Sized>(matrix: &[Vec<f64>], rng: &mut R) -> Vec<Coord> {
    let n = matrix.len();
    let dims = matrix.first().map_or(0, Vec::len);
    if n == 0 || dims == 0 {
        return vec![[0.0; 3]; n];
    }

    let mut mean = vec![0.0; dims];
    for row in matrix {
        for (m, v) in mean.iter_mut().zip(row) {
            *m += v;
        }
    }
    for m in &mut mean {
        *m /= n as f64;
    }
    let centered: Vec<Vec<f64>> = matrix
        .iter()
        .map(|row| row.iter().zip(&mean).map(|(v, m)| v - m).collect())
        .collect();

    let mut components: Vec<Vec<f64>> = Vec::with_capacity(3);
    for _ in 0..3 {
        let mut v: Vec<f64> = (0..dims).map(|_| rng.sample(StandardNormal)).collect();
        orthogonalize(&mut v, &components);
        if normalize(&mut v) == 0.0 {
            components.push(vec![0.0; dims]);
            continue;
        }
        for _ in 0..POWER_ITERATIONS {
            let mut next = gram_product(&centered, &v);
            orthogonalize(&mut next, &components);
            if normalize(&mut next) < TOLERANCE {
                // No variance left in this direction.
                v = vec![0.0; dims];
                break;
            }
            let delta: f64 = next.iter().zip(&v).map(|(a, b)| (a - b).abs()).sum();
            v = next;
            if delta < TOLERANCE {
                break;
            }
        }
        components.push(v);
    }

    centered
        .iter()
        .map(|row| [0, 1, 2].map(|c| dot(row, &components[c])))
        .collect()
}

/// `Xᵀ (X v)` for a row-major `X`.
fn gram_product(x: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; v.len()];
    for row in x {
        let s = dot(row, v);
        for (o, r) in out.iter_mut().zip(row) {
            *o += s * r;
        }
    }
    out
}

fn orthogonalize(v: &mut [f64], basis: &[Vec<f64>]) {
    for b in basis {
        let p = dot(v, b);
        for (x, y) in v.iter_mut().zip(b) {
            *x -= p * y;
        }
    }
}

/// Scale `v` to unit length and return its previous norm.
fn normalize(v: &mut [f64]) -> f64 {
    let norm = dot(v, v).sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    norm
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn recovers_dominant_axis() {
        // Points spread along (1, 1, 0, 0) with small noise elsewhere.
        let mut rng = StdRng::seed_from_u64(7);
        let matrix: Vec<Vec<f64>> = (0..40)
            .map(|i| {
                let t = i as f64 - 20.0;
                let e: f64 = rng.gen_range(-0.01..0.01);
                vec![t, t, e, 0.5 * e]
            })
            .collect();

        let projected = project(&matrix, &mut rng);
        assert_eq!(projected.len(), 40);
        // First component carries almost all variance.
        let var = |c: usize| projected.iter().map(|p| p[c] * p[c]).sum::<f64>();
        assert!(var(0) > 1000.0 * var(1));
        assert!((projected[39][0].abs() - 19.5 * 2f64.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn rank_deficient_input_yields_zero_components() {
        let matrix = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let mut rng = StdRng::seed_from_u64(1);
        let projected = project(&matrix, &mut rng);
        assert_eq!(projected.len(), 2);
        for p in &projected {
            assert!(p[0].is_finite());
            assert!(p[2].abs() < 1e-9);
        }
    }
}
