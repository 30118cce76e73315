use crate::forces::ExternalForce;
use crate::simulation::neighborhood_grid::MAX_DIMENSION;
use crate::simulation::particle_system::ParticleView;

/// Constant push along one direction (gravity, flow).
#[derive(Debug, Clone, PartialEq)]
pub struct UniformForce {
    direction: [f32; MAX_DIMENSION],
    intensity: f32,
}

impl UniformForce {
    /// `direction` is used as given; it is not normalized.
    pub fn new(direction: &[f32], intensity: f32) -> Self {
        let mut dir = [0.0; MAX_DIMENSION];
        let n = direction.len().min(MAX_DIMENSION);
        dir[..n].copy_from_slice(&direction[..n]);
        Self {
            direction: dir,
            intensity,
        }
    }
}

impl ExternalForce for UniformForce {
    fn name(&self) -> &str {
        "uniform"
    }

    fn intensity(&self) -> f32 {
        self.intensity
    }

    fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    fn apply(&self, begin: usize, end: usize, particles: &ParticleView<'_>, forces: &mut [f32]) {
        let d = particles.dimension;
        for id in begin..end {
            if particles.is_inert(id) {
                continue;
            }
            let out = &mut forces[(id - begin) * d..(id - begin + 1) * d];
            for axis in 0..d {
                out[axis] += self.intensity * self.direction[axis];
            }
        }
    }
}
