use super::Coord;

/// Subdivision stops here; coincident points share a leaf.
const MAX_DEPTH: usize = 48;

#[derive(Debug, Clone)]
struct Node {
    center: Coord,
    half_width: f64,
    center_of_mass: Coord,
    mass: usize,
    /// Index of the first of eight consecutive children.
    first_child: Option<usize>,
    /// Points stored in a leaf.
    points: Vec<usize>,
}

impl Node {
    fn new(center: Coord, half_width: f64) -> Self {
        Node {
            center,
            half_width,
            center_of_mass: [0.0; 3],
            mass: 0,
            first_child: None,
            points: Vec::new(),
        }
    }

    fn octant(&self, p: &Coord) -> usize {
        (0..3).fold(0, |acc, k| acc | (usize::from(p[k] >= self.center[k]) << k))
    }
}

/// Barnes-Hut space partitioning over a 3D embedding.
#[derive(Debug, Clone)]
pub struct Octree<'a> {
    points: &'a [Coord],
    nodes: Vec<Node>,
}

impl<'a> Octree<'a> {
    pub fn build(points: &'a [Coord]) -> Self {
        let mut lo = [f64::INFINITY; 3];
        let mut hi = [f64::NEG_INFINITY; 3];
        for p in points {
            for k in 0..3 {
                lo[k] = lo[k].min(p[k]);
                hi[k] = hi[k].max(p[k]);
            }
        }
        let (center, half_width) = if points.is_empty() {
            ([0.0; 3], 1.0)
        } else {
            let center = [0, 1, 2].map(|k| 0.5 * (lo[k] + hi[k]));
            let extent = (0..3).map(|k| hi[k] - lo[k]).fold(0.0, f64::max);
            (center, 0.5 * extent + 1e-5)
        };

        let mut tree = Octree {
            points,
            nodes: vec![Node::new(center, half_width)],
        };
        for i in 0..points.len() {
            tree.insert(0, i, 0);
        }
        tree
    }

    fn insert(&mut self, node: usize, idx: usize, depth: usize) {
        let p = self.points[idx];
        {
            let n = &mut self.nodes[node];
            let m = n.mass as f64;
            for k in 0..3 {
                n.center_of_mass[k] = (n.center_of_mass[k] * m + p[k]) / (m + 1.0);
            }
            n.mass += 1;
        }

        if let Some(first) = self.nodes[node].first_child {
            let child = first + self.nodes[node].octant(&p);
            self.insert(child, idx, depth + 1);
            return;
        }

        if self.nodes[node].points.is_empty() || depth >= MAX_DEPTH {
            self.nodes[node].points.push(idx);
            return;
        }

        // Occupied leaf: split and push everything one level down.
        let first = self.subdivide(node);
        let residents = std::mem::take(&mut self.nodes[node].points);
        for j in residents.into_iter().chain(std::iter::once(idx)) {
            let child = first + self.nodes[node].octant(&self.points[j]);
            self.insert(child, j, depth + 1);
        }
    }

    fn subdivide(&mut self, node: usize) -> usize {
        let first = self.nodes.len();
        let Node { center, half_width, .. } = self.nodes[node];
        let quarter = 0.5 * half_width;
        for octant in 0..8 {
            let child_center = [0, 1, 2].map(|k| {
                if octant & (1 << k) != 0 {
                    center[k] + quarter
                } else {
                    center[k] - quarter
                }
            });
            self.nodes.push(Node::new(child_center, quarter));
        }
        self.nodes[node].first_child = Some(first);
        first
    }

    /// Repulsive term for point `i`.
    ///
    /// Returns `(Σ qᵢⱼ, Σ qᵢⱼ² (yᵢ - yⱼ))` with `qᵢⱼ = 1 / (1 + |yᵢ - yⱼ|²)`,
    /// summarising any cell whose width over distance is below `theta`.
    pub fn repulsion(&self, i: usize, theta: f64) -> (f64, Coord) {
        let yi = self.points[i];
        let mut sum_q = 0.0;
        let mut force = [0.0; 3];
        let mut stack = vec![0usize];

        while let Some(node) = stack.pop() {
            let n = &self.nodes[node];
            if n.mass == 0 {
                continue;
            }
            match n.first_child {
                None => {
                    for &j in &n.points {
                        if j == i {
                            continue;
                        }
                        accumulate(&yi, &self.points[j], 1.0, &mut sum_q, &mut force);
                    }
                }
                Some(first) => {
                    let d2 = squared_distance(&yi, &n.center_of_mass);
                    let width = 2.0 * n.half_width;
                    if d2 > 0.0 && width * width < theta * theta * d2 {
                        accumulate(&yi, &n.center_of_mass, n.mass as f64, &mut sum_q, &mut force);
                    } else {
                        stack.extend(first..first + 8);
                    }
                }
            }
        }
        (sum_q, force)
    }
}

fn accumulate(yi: &Coord, yj: &Coord, mass: f64, sum_q: &mut f64, force: &mut Coord) {
    let q = 1.0 / (1.0 + squared_distance(yi, yj));
    *sum_q += mass * q;
    let mult = mass * q * q;
    for k in 0..3 {
        force[k] += mult * (yi[k] - yj[k]);
    }
}

pub fn squared_distance(a: &Coord, b: &Coord) -> f64 {
    (0..3).map(|k| (a[k] - b[k]) * (a[k] - b[k])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(points: &[Coord], i: usize) -> (f64, Coord) {
        let mut sum_q = 0.0;
        let mut force = [0.0; 3];
        for (j, yj) in points.iter().enumerate() {
            if j != i {
                accumulate(&points[i], yj, 1.0, &mut sum_q, &mut force);
            }
        }
        (sum_q, force)
    }

    fn grid() -> Vec<Coord> {
        let mut pts = Vec::new();
        for x in 0..4 {
            for y in 0..4 {
                for z in 0..3 {
                    pts.push([x as f64 * 0.7, y as f64 * 1.3 - 2.0, z as f64 * 0.4]);
                }
            }
        }
        pts
    }

    #[test]
    fn theta_zero_matches_brute_force() {
        let pts = grid();
        let tree = Octree::build(&pts);
        for i in [0, 7, 20, pts.len() - 1] {
            let (q_tree, f_tree) = tree.repulsion(i, 0.0);
            let (q_exact, f_exact) = brute_force(&pts, i);
            assert!((q_tree - q_exact).abs() < 1e-9);
            for k in 0..3 {
                assert!((f_tree[k] - f_exact[k]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn approximation_stays_close() {
        let pts = grid();
        let tree = Octree::build(&pts);
        let (q_tree, _) = tree.repulsion(5, 0.5);
        let (q_exact, _) = brute_force(&pts, 5);
        assert!((q_tree - q_exact).abs() / q_exact < 0.05);
    }

    #[test]
    fn coincident_points_do_not_recurse_forever() {
        let pts = vec![[1.0, 1.0, 1.0]; 5];
        let tree = Octree::build(&pts);
        let (q, f) = tree.repulsion(0, 0.5);
        assert!((q - 4.0).abs() < 1e-12);
        assert_eq!(f, [0.0; 3]);
    }
}
