// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Seeded 3-D simplex noise backends.

use std::sync::Arc;

use ndarray::Array3;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Evaluates 3-D coherent noise over coordinate grids.
pub trait SimplexBackend: Send {
    /// Seed the backend was built from.
    fn seed(&self) -> u64;

    /// Noise at every `(x, y, z)` of the grid, indexed `[z][y][x]`.
    fn noise3_array(&self, xs: &[f64], ys: &[f64], zs: &[f64]) -> Array3<f64>;
}

/// Builds a backend for a seed.
pub type SimplexFactory = Arc<dyn Fn(u64) -> Box<dyn SimplexBackend> + Send + Sync>;

/// Factory producing [`SimplexLattice`] backends.
pub fn default_simplex_factory() -> SimplexFactory {
    Arc::new(|seed| Box::new(SimplexLattice::new(seed)) as Box<dyn SimplexBackend>)
}

const GRAD3: [[f64; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

const F3: f64 = 1.0 / 3.0;
const G3: f64 = 1.0 / 6.0;

/// Classic skewed-lattice simplex noise with a ChaCha-shuffled permutation
/// table. Inputs are shifted by a seed-dependent sub-cell offset so integer
/// grids never land on lattice vertices, where the field vanishes.
#[derive(Clone, Debug)]
pub struct SimplexLattice {
    seed: u64,
    perm: [u8; 512],
    offset: [f64; 3],
}

impl SimplexLattice {
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(&mut rng);
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        let offset = [rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>()];
        Self { seed, perm, offset }
    }

    #[inline]
    fn hash(&self, i: i64, j: i64, k: i64) -> usize {
        let (i, j, k) = ((i & 255) as usize, (j & 255) as usize, (k & 255) as usize);
        let p = &self.perm;
        p[i + p[j + p[k] as usize] as usize] as usize % 12
    }

    /// Noise value in roughly `[-1, 1]` at one point.
    pub fn noise3(&self, x: f64, y: f64, z: f64) -> f64 {
        let (x, y, z) = (x + self.offset[0], y + self.offset[1], z + self.offset[2]);
        let s = (x + y + z) * F3;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let k = (z + s).floor();
        let t = (i + j + k) * G3;
        let x0 = x - (i - t);
        let y0 = y - (j - t);
        let z0 = z - (k - t);

        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let corners = [
            (0, 0, 0, x0, y0, z0),
            (
                i1,
                j1,
                k1,
                x0 - i1 as f64 + G3,
                y0 - j1 as f64 + G3,
                z0 - k1 as f64 + G3,
            ),
            (
                i2,
                j2,
                k2,
                x0 - i2 as f64 + 2.0 * G3,
                y0 - j2 as f64 + 2.0 * G3,
                z0 - k2 as f64 + 2.0 * G3,
            ),
            (1, 1, 1, x0 - 1.0 + 3.0 * G3, y0 - 1.0 + 3.0 * G3, z0 - 1.0 + 3.0 * G3),
        ];

        let (ii, jj, kk) = (i as i64, j as i64, k as i64);
        let mut total = 0.0;
        for (di, dj, dk, cx, cy, cz) in corners {
            let falloff = 0.6 - cx * cx - cy * cy - cz * cz;
            if falloff > 0.0 {
                let g = GRAD3[self.hash(ii + di, jj + dj, kk + dk)];
                let f2 = falloff * falloff;
                total += f2 * f2 * (g[0] * cx + g[1] * cy + g[2] * cz);
            }
        }
        32.0 * total
    }
}

impl SimplexBackend for SimplexLattice {
    fn seed(&self) -> u64 {
        self.seed
    }

    fn noise3_array(&self, xs: &[f64], ys: &[f64], zs: &[f64]) -> Array3<f64> {
        Array3::from_shape_fn((zs.len(), ys.len(), xs.len()), |(z, y, x)| {
            self.noise3(xs[x], ys[y], zs[z])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(n: usize) -> Vec<f64> {
        (0..n).map(|v| v as f64).collect()
    }

    #[test]
    fn array_is_indexed_z_y_x() {
        let lattice = SimplexLattice::new(4);
        let grid = lattice.noise3_array(&coords(5), &coords(3), &coords(2));
        assert_eq!(grid.dim(), (2, 3, 5));
        assert_eq!(grid[[1, 2, 4]], lattice.noise3(4.0, 2.0, 1.0));
    }

    #[test]
    fn seeds_select_distinct_fields() {
        let a = SimplexLattice::new(1).noise3_array(&coords(8), &coords(8), &coords(2));
        let b = SimplexLattice::new(2).noise3_array(&coords(8), &coords(8), &coords(2));
        let c = SimplexLattice::new(1).noise3_array(&coords(8), &coords(8), &coords(2));
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn values_are_bounded_and_not_degenerate() {
        let grid = SimplexLattice::new(9).noise3_array(&coords(16), &coords(16), &coords(4));
        assert!(grid.iter().all(|v| v.abs() <= 1.5));
        let zeros = grid.iter().filter(|v| v.abs() < 1e-12).count();
        assert!(zeros < grid.len() / 10);
    }

    #[test]
    fn factory_reports_its_seed() {
        let factory = default_simplex_factory();
        assert_eq!(factory(17).seed(), 17);
    }
}
