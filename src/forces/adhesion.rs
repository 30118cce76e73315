//! Short-range attraction between nearly touching particles.

use crate::forces::{separation, InteractionForce};
use crate::simulation::neighborhood_grid::{NeighborhoodGrid, MAX_DIMENSION};
use crate::simulation::particle_system::ParticleView;

/// Pulls neighbors together while their gap lies inside a contact band.
///
/// With `contact = r_a + r_b`, a pair whose center distance lies in
/// `(contact, contact * (1 + band)]` attracts with magnitude
/// `intensity * (distance - contact)`. Overlapping pairs are left to
/// [`CollisionForce`](crate::forces::CollisionForce).
#[derive(Debug, Clone, PartialEq)]
pub struct AdhesionForce {
    intensity: f32,
    band: f32,
}

impl AdhesionForce {
    /// # Arguments
    /// * `intensity` - Attraction per unit of gap
    /// * `band` - Width of the contact band relative to the summed radii
    pub fn new(intensity: f32, band: f32) -> Self {
        Self {
            intensity,
            band: band.max(0.0),
        }
    }

    pub fn band(&self) -> f32 {
        self.band
    }
}

impl InteractionForce for AdhesionForce {
    fn name(&self) -> &str {
        "adhesion"
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
                let contact = radius + particles.radius(other);
                if distance <= contact || distance > contact * (1.0 + self.band) {
                    return;
                }
                let magnitude = self.intensity * (distance - contact);
                for axis in 0..d {
                    out[axis] += magnitude * delta[axis] / distance;
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(positions: &[f32], radii: &[f32], force: &AdhesionForce) -> Vec<f32> {
        let velocities = vec![0.0; positions.len()];
        let particles = ParticleView {
            dimension: 2,
            active_count: radii.len(),
            positions,
            velocities: &velocities,
            radii,
        };
        let mut grid = NeighborhoodGrid::uniform(2, 8, 8);
        grid.update(positions, radii.len());
        let mut forces = vec![0.0; positions.len()];
        force.apply(0, radii.len(), &grid, &particles, &mut forces);
        forces
    }

    #[test]
    fn pair_inside_the_band_attracts() {
        let forces = run(&[0.40, 0.5, 0.51, 0.5], &[0.05, 0.05], &AdhesionForce::new(1.0, 0.2));
        // gap = 0.11 - 0.10
        assert!((forces[0] - 0.01).abs() < 1e-6);
        assert!((forces[2] + 0.01).abs() < 1e-6);
    }

    #[test]
    fn pair_beyond_the_band_is_ignored() {
        let forces = run(&[0.40, 0.5, 0.55, 0.5], &[0.05, 0.05], &AdhesionForce::new(1.0, 0.2));
        assert!(forces.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn overlapping_pair_is_ignored() {
        let forces = run(&[0.40, 0.5, 0.45, 0.5], &[0.05, 0.05], &AdhesionForce::new(1.0, 0.2));
        assert!(forces.iter().all(|&f| f == 0.0));
    }
}
