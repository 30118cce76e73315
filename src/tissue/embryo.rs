//! A tissue growing inside an iso-surface.

use crate::forces::{ForceField, SurfaceConstraintForce};
use crate::geometry::IsoSurface;
use crate::simulation::error::{SimulationError, SimulationResult};
use crate::tissue::{Tissue, TissueConfig};

/// Tissue constrained to the inside of a shape (the egg shell, the embryo
/// boundary). The constraint is an ordinary external force field registered
/// after the collision field.
#[derive(Debug)]
pub struct Embryo {
    tissue: Tissue,
    surface: Box<dyn IsoSurface>,
    constraint_index: usize,
}

impl Embryo {
    /// # Arguments
    /// * `config` - Tissue configuration
    /// * `surface` - Boundary shape; its dimension must match `config.dimension`
    /// * `constraint_intensity` - Push-back per unit of distance outside the surface
    pub fn new(
        config: TissueConfig,
        surface: Box<dyn IsoSurface>,
        constraint_intensity: f32,
    ) -> SimulationResult<Self> {
        if surface.dimension() != config.dimension {
            return Err(SimulationError::DimensionMismatch {
                expected: config.dimension,
                actual: surface.dimension(),
            });
        }
        let mut tissue = Tissue::new(config)?;
        let constraint_index = tissue.add_force_field(ForceField::external(
            SurfaceConstraintForce::new(surface.clone(), constraint_intensity),
        ));

        Ok(Self {
            tissue,
            surface,
            constraint_index,
        })
    }

    pub fn surface(&self) -> &dyn IsoSurface {
        self.surface.as_ref()
    }

    /// Current push-back of the surface constraint.
    pub fn constraint_intensity(&self) -> f32 {
        self.tissue
            .force_fields()
            .get(self.constraint_index)
            .map_or(0.0, ForceField::intensity)
    }

    /// Replace the boundary shape; takes effect from the next step.
    ///
    /// The constraint keeps its current intensity.
    pub fn set_surface(&mut self, surface: Box<dyn IsoSurface>) -> SimulationResult<()> {
        let dimension = self.tissue.config().dimension;
        if surface.dimension() != dimension {
            return Err(SimulationError::DimensionMismatch {
                expected: dimension,
                actual: surface.dimension(),
            });
        }
        let intensity = self.constraint_intensity();
        self.tissue.replace_force_field(
            self.constraint_index,
            ForceField::external(SurfaceConstraintForce::new(surface.clone(), intensity)),
        );
        self.surface = surface;
        Ok(())
    }

    /// The surface constraint's position in the tissue's force field list.
    pub fn constraint_index(&self) -> usize {
        self.constraint_index
    }

    pub fn tissue(&self) -> &Tissue {
        &self.tissue
    }

    pub fn tissue_mut(&mut self) -> &mut Tissue {
        &mut self.tissue
    }

    /// Add `count` particles at the surface's reference point.
    ///
    /// Particles after the first get the division jitter so that collision can
    /// separate them.
    pub fn seed(&mut self, center: &[f32], count: usize) -> SimulationResult<()> {
        if count == 0 {
            return Ok(());
        }
        let first = self.tissue.add_particle(center)? as usize;
        let jitter = self.tissue.config().division_jitter;
        for _ in 1..count {
            self.tissue.particles_mut().clone_particle(first, jitter)?;
        }
        Ok(())
    }

    pub fn step(&mut self, dt: f32) -> SimulationResult<()> {
        self.tissue.step(dt)
    }

    pub fn simulation_steps(&mut self, steps: usize, dt: f32) -> SimulationResult<()> {
        self.tissue.simulation_steps(steps, dt)
    }
}
