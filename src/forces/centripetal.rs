use crate::forces::ExternalForce;
use crate::simulation::neighborhood_grid::MAX_DIMENSION;
use crate::simulation::particle_system::ParticleView;

/// Pulls every particle toward a fixed center, proportionally to its offset.
#[derive(Debug, Clone, PartialEq)]
pub struct CentripetalForce {
    center: [f32; MAX_DIMENSION],
    intensity: f32,
}

impl CentripetalForce {
    pub fn new(center: &[f32], intensity: f32) -> Self {
        let mut c = [0.0; MAX_DIMENSION];
        let n = center.len().min(MAX_DIMENSION);
        c[..n].copy_from_slice(&center[..n]);
        Self {
            center: c,
            intensity,
        }
    }

    pub fn center(&self) -> &[f32] {
        &self.center
    }
}

impl ExternalForce for CentripetalForce {
    fn name(&self) -> &str {
        "centripetal"
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
            let position = particles.position(id);
            let out = &mut forces[(id - begin) * d..(id - begin + 1) * d];
            for axis in 0..d {
                out[axis] += self.intensity * (self.center[axis] - position[axis]);
            }
        }
    }
}
