//! Keeps particles inside an iso-surface.
//!
//! A particle with `distance > 0` (outside) is pushed along the inward
//! gradient with magnitude `intensity * distance`. Particles inside the shape
//! feel nothing.

use crate::forces::ExternalForce;
use crate::geometry::IsoSurface;
use crate::simulation::particle_system::ParticleView;

#[derive(Debug, Clone)]
pub struct SurfaceConstraintForce {
    surface: Box<dyn IsoSurface>,
    intensity: f32,
}

impl SurfaceConstraintForce {
    pub fn new(surface: Box<dyn IsoSurface>, intensity: f32) -> Self {
        Self { surface, intensity }
    }

    pub fn surface(&self) -> &dyn IsoSurface {
        self.surface.as_ref()
    }

    pub fn set_surface(&mut self, surface: Box<dyn IsoSurface>) {
        self.surface = surface;
    }
}

impl ExternalForce for SurfaceConstraintForce {
    fn name(&self) -> &str {
        "surface_constraint"
    }

    fn intensity(&self) -> f32 {
        self.intensity
    }

    fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    fn apply(&self, begin: usize, end: usize, particles: &ParticleView<'_>, forces: &mut [f32]) {
        let d = particles.dimension;
        // The accumulator protocol mutates the surface; each worker gets its own copy.
        let mut surface = self.surface.box_clone();

        for id in begin..end {
            if particles.is_inert(id) {
                continue;
            }
            let distance = surface.evaluate(particles.position(id));
            if distance <= 0.0 {
                continue;
            }
            let out = &mut forces[(id - begin) * d..(id - begin + 1) * d];
            for axis in 0..d {
                out[axis] += surface.normalized_gradient(axis) * self.intensity * distance;
            }
        }
    }
}
