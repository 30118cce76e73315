//! Overlap repulsion between touching particles.
//!
//! Two particles overlap when their center distance is smaller than the sum of
//! their radii. Each receives a push away from the other along the separation
//! axis, proportional to the overlap depth times the intensity. Forces are
//! computed per particle (both members of a pair visit each other), so the
//! pair stays symmetric without writing outside the caller's id range.

use crate::forces::{separation, InteractionForce};
use crate::simulation::neighborhood_grid::{NeighborhoodGrid, MAX_DIMENSION};
use crate::simulation::particle_system::ParticleView;

/// Below this distance two centers are treated as coincident.
const COINCIDENT_DISTANCE: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct CollisionForce {
    intensity: f32,
}

impl CollisionForce {
    pub fn new(intensity: f32) -> Self {
        Self { intensity }
    }
}

impl Default for CollisionForce {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl InteractionForce for CollisionForce {
    fn name(&self) -> &str {
        "collision"
    }

    fn intensity(&self) -> f32 {
        self.intensity
    }

    fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    fn apply(
        &self,
        begin: usize,
        end: usize,
        grid: &NeighborhoodGrid,
        particles: &ParticleView<'_>,
        forces: &mut [f32],
    ) {
        let d = particles.dimension;
        let mut delta = [0.0f32; MAX_DIMENSION];
        let delta = &mut delta[..d];

        for id in begin..end {
            if particles.is_inert(id) {
                continue;
            }
            let radius = particles.radius(id);
            let out = &mut forces[(id - begin) * d..(id - begin + 1) * d];

            grid.for_each_neighbor(particles.position(id), |other| {
                let other = other as usize;
                if other == id || particles.is_inert(other) {
                    return;
                }
                let distance = separation(particles, id, other, delta);
                let overlap = radius + particles.radius(other) - distance;
                if overlap <= 0.0 {
                    return;
                }

                let magnitude = self.intensity * overlap;
                if distance > COINCIDENT_DISTANCE {
                    for axis in 0..d {
                        out[axis] -= magnitude * delta[axis] / distance;
                    }
                } else {
                    // Coincident centers: split along the first axis by id order.
                    out[0] += if id < other { -magnitude } else { magnitude };
                }
            });
        }
    }
}
