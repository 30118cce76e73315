//! Force Field Module
//!
//! Force fields add velocity deltas to a per-step force accumulator. Two
//! capabilities exist and every field implements exactly one of them:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          ForceField                          │
//! │   ┌──────────────────────────┐  ┌─────────────────────────┐  │
//! │   │ External(ExternalForce)  │  │ Interaction(            │  │
//! │   │  depends on one particle │  │   InteractionForce)     │  │
//! │   │  and global parameters   │  │  visits grid neighbors  │  │
//! │   └──────────────────────────┘  └─────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!          │                                   │
//!   ┌──────┴──────┬──────────────┐      ┌──────┴──────┐
//!   ▼             ▼              ▼      ▼             ▼
//! Centripetal  Uniform  SurfaceConstraint Collision  Adhesion
//! ```
//!
//! # Range contract
//!
//! `apply(begin, end, ..)` receives the accumulator slice of exactly the
//! particles `[begin, end)` (`(end - begin) * dimension` values) and only
//! writes there. It reads the published snapshot through [`ParticleView`], so
//! disjoint ranges can be processed on different rayon workers and the result
//! does not depend on how the range was split.
//!
//! Inert particles (radius 0) neither receive nor exert interaction forces.
//!
//! # Thread Safety
//!
//! Both traits require `Send + Sync`; fields are shared read-only between
//! workers while a step runs.

pub mod adhesion;
pub mod centripetal;
pub mod collision;
pub mod surface_constraint;
pub mod uniform;

pub use adhesion::AdhesionForce;
pub use centripetal::CentripetalForce;
pub use collision::CollisionForce;
pub use surface_constraint::SurfaceConstraintForce;
pub use uniform::UniformForce;

use crate::simulation::neighborhood_grid::NeighborhoodGrid;
use crate::simulation::particle_system::ParticleView;

/// A force that depends only on the particle it acts on.
pub trait ExternalForce: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    fn intensity(&self) -> f32;

    fn set_intensity(&mut self, intensity: f32);

    /// Add this field's contribution for particles `[begin, end)` into `forces`.
    fn apply(&self, begin: usize, end: usize, particles: &ParticleView<'_>, forces: &mut [f32]);
}

/// A force between a particle and its neighbors in the grid.
pub trait InteractionForce: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    fn intensity(&self) -> f32;

    fn set_intensity(&mut self, intensity: f32);

    /// Add this field's contribution for particles `[begin, end)` into `forces`.
    ///
    /// Candidates come from `grid.for_each_neighbor`; only particles in the
    /// own or adjacent grid cells are ever considered.
    fn apply(
        &self,
        begin: usize,
        end: usize,
        grid: &NeighborhoodGrid,
        particles: &ParticleView<'_>,
        forces: &mut [f32],
    );
}

/// A force field tagged with its capability.
#[derive(Debug)]
pub enum ForceField {
    External(Box<dyn ExternalForce>),
    Interaction(Box<dyn InteractionForce>),
}

impl ForceField {
    pub fn external(force: impl ExternalForce + 'static) -> Self {
        Self::External(Box::new(force))
    }

    pub fn interaction(force: impl InteractionForce + 'static) -> Self {
        Self::Interaction(Box::new(force))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::External(force) => force.name(),
            Self::Interaction(force) => force.name(),
        }
    }

    pub fn intensity(&self) -> f32 {
        match self {
            Self::External(force) => force.intensity(),
            Self::Interaction(force) => force.intensity(),
        }
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        match self {
            Self::External(force) => force.set_intensity(intensity),
            Self::Interaction(force) => force.set_intensity(intensity),
        }
    }

    /// Fields with zero intensity are skipped by the dispatcher.
    pub fn is_enabled(&self) -> bool {
        self.intensity() != 0.0
    }
}

/// Separation of `other` from `id` and their center distance.
///
/// Shared by the pairwise fields; writes `other - id` into `delta`.
#[inline]
pub(crate) fn separation(
    particles: &ParticleView<'_>,
    id: usize,
    other: usize,
    delta: &mut [f32],
) -> f32 {
    let a = particles.position(id);
    let b = particles.position(other);
    let mut squared = 0.0;
    for axis in 0..delta.len() {
        delta[axis] = b[axis] - a[axis];
        squared += delta[axis] * delta[axis];
    }
    squared.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_intensity_disables_a_field() {
        let mut field = ForceField::external(UniformForce::new(&[0.0, -1.0], 0.5));
        assert!(field.is_enabled());
        field.set_intensity(0.0);
        assert!(!field.is_enabled());
        assert_eq!(field.name(), "uniform");
    }
}
