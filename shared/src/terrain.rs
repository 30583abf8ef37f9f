//! Procedural hills for the terrain ground layout.
//!
//! Three octaves of `sin(x) * cos(z)` plus a small random jitter. The jitter comes from a
//! seeded generator so the same seed always yields the same ground (and the same collider).

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    rapier::ColliderShapeDef,
    types::Vec3,
};

/// Square grid of terrain heights centered on the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Heightmap {
    /// Samples per side (`segments + 1`).
    pub samples: usize,
    /// Row-major heights; rows run along Z, columns along X.
    pub heights: Vec<f32>,
    /// Total X/Z extent (meters).
    pub size: f32,
}

impl Heightmap {
    pub fn generate(seed: u64, segments: usize, size: f32, amplitude: f32) -> Self {
        let samples = segments.max(1) + 1;
        let cell = size / (samples - 1) as f32;
        let half = (samples - 1) as f32 * 0.5;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut heights = Vec::with_capacity(samples * samples);
        for i in 0..samples {
            let z = (i as f32 - half) * cell;
            for j in 0..samples {
                let x = (j as f32 - half) * cell;
                let hills = (x / 40.0).sin() * (z / 40.0).cos()
                    + 0.5 * (x / 20.0).sin() * (z / 20.0).cos()
                    + 0.25 * (x / 10.0).sin() * (z / 10.0).cos();
                let jitter: f32 = rng.gen_range(0.0..0.1);
                heights.push(amplitude * (hills + jitter));
            }
        }

        Self {
            samples,
            heights,
            size,
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        (row < self.samples && col < self.samples)
            .then(|| self.heights[row * self.samples + col])
    }

    /// Bilinearly interpolated height at world `(x, z)`, clamped to the grid.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let last = (self.samples - 1) as f32;
        let to_grid = |v: f32| ((v / self.size + 0.5) * last).clamp(0.0, last);
        let (gx, gz) = (to_grid(x), to_grid(z));
        let (c0, r0) = (gx.floor() as usize, gz.floor() as usize);
        let (c1, r1) = ((c0 + 1).min(self.samples - 1), (r0 + 1).min(self.samples - 1));
        let (tx, tz) = (gx - c0 as f32, gz - r0 as f32);

        let h = |r, c| self.get(r, c).unwrap_or(0.0);
        let top = h(r0, c0) * (1.0 - tx) + h(r0, c1) * tx;
        let bottom = h(r1, c0) * (1.0 - tx) + h(r1, c1) * tx;
        top * (1.0 - tz) + bottom * tz
    }

    /// Highest sample.
    pub fn max_height(&self) -> f32 {
        self.heights.iter().copied().fold(f32::MIN, f32::max)
    }

    pub fn shape(&self) -> ColliderShapeDef {
        ColliderShapeDef::HeightField {
            rows: self.samples,
            cols: self.samples,
            heights: self.heights.clone(),
            size: self.size,
        }
    }

    /// Grid vertex positions (row-major) for building a render mesh.
    pub fn vertices(&self) -> Vec<Vec3> {
        let last = (self.samples - 1) as f32;
        (0..self.samples)
            .flat_map(|i| (0..self.samples).map(move |j| (i, j)))
            .map(|(i, j)| {
                Vec3::new(
                    (j as f32 / last - 0.5) * self.size,
                    self.heights[i * self.samples + j],
                    (i as f32 / last - 0.5) * self.size,
                )
            })
            .collect()
    }
}
