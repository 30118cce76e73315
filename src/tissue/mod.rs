//! # Tissue Growth
//!
//! A [`Tissue`] drives a [`ParticleSystem`] through developmental time:
//! scheduled division rounds, force fields, morphogen operators and the
//! simulation clock.
//!
//! ## Step order
//!
//! ```text
//! ┌────────────────┐   ┌──────────────┐   ┌──────────────┐   ┌───────────┐
//! │ division check │──►│ grid rebuild │──►│ force fields │──►│ integrate │
//! └────────────────┘   └──────────────┘   └──────────────┘   └─────┬─────┘
//!                                                                  │
//!                      ┌───────────────┐   ┌──────────────────┐    │
//!                      │ clock.advance │◄──│ operators (swap) │◄───┘
//!                      └───────────────┘   └──────────────────┘
//! ```
//!
//! ## Division schedule
//!
//! A round fires at the start of every step whose index is a multiple of
//! `division_period_steps`, beginning with step 0, until `max_generations`
//! rounds have happened. Running `period * g` steps therefore performs `g`
//! rounds, and the population reaches `initial * 2^max_generations` and stays
//! there (the tissue is then [`TissueState::Steady`]).
//!
//! Force fields are applied in registration order; the built-in collision
//! field is always first. Operators run once per step in registration order.

pub mod config;
pub mod division;
pub mod embryo;

pub use config::{ConfigError, TissueConfig};
pub use division::{division_round, DivisionEvent};
pub use embryo::Embryo;

use crate::forces::{CollisionForce, ForceField};
use crate::morphogen::{FieldId, MorphogenOperator, ScalarField};
use crate::simulation::clock::SimulationClock;
use crate::simulation::error::{SimulationError, SimulationResult};
use crate::simulation::particle_system::ParticleSystem;

/// Developmental phase of a tissue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TissueState {
    /// Between division rounds
    Growing,
    /// A division round happened in the current step
    Dividing,
    /// All division rounds are done
    Steady,
}

/// A growing population of particles with its fields, operators and clock.
#[derive(Debug)]
pub struct Tissue {
    config: TissueConfig,
    system: ParticleSystem,
    force_fields: Vec<ForceField>,
    operators: Vec<Box<dyn MorphogenOperator>>,
    clock: SimulationClock,
    generation: u32,
    state: TissueState,
}

impl Tissue {
    pub fn new(config: TissueConfig) -> SimulationResult<Self> {
        config.validate()?;
        let mut system =
            ParticleSystem::new(config.dimension, config.max_particles, config.physics.clone())?;
        for name in &config.morphogens {
            system.add_field(name);
        }
        let collision = ForceField::interaction(CollisionForce::new(
            config.physics.collision_intensity,
        ));
        let state = if config.max_generations == 0 {
            TissueState::Steady
        } else {
            TissueState::Growing
        };

        Ok(Self {
            config,
            system,
            force_fields: vec![collision],
            operators: Vec::new(),
            clock: SimulationClock::new(),
            generation: 0,
            state,
        })
    }

    pub fn config(&self) -> &TissueConfig {
        &self.config
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.system
    }

    pub fn particles_mut(&mut self) -> &mut ParticleSystem {
        &mut self.system
    }

    pub fn add_particle(&mut self, position: &[f32]) -> SimulationResult<u32> {
        self.system.add_particle(position)
    }

    pub fn state(&self) -> TissueState {
        self.state
    }

    /// Division rounds performed so far.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn add_morphogen(&mut self, name: &str) -> FieldId {
        self.system.add_field(name)
    }

    pub fn morphogen(&self, name: &str) -> SimulationResult<&ScalarField> {
        self.system.field_by_name(name)
    }

    pub fn morphogen_mut(&mut self, name: &str) -> SimulationResult<&mut ScalarField> {
        let id = self.system.field_id(name)?;
        self.system
            .field_mut(id)
            .ok_or_else(|| SimulationError::UnknownField { name: name.into() })
    }

    /// Append an operator; it runs after every operator added before it.
    pub fn add_operator(&mut self, operator: Box<dyn MorphogenOperator>) -> SimulationResult<()> {
        self.system.fields().check_operator(operator.as_ref())?;
        self.operators.push(operator);
        Ok(())
    }

    pub fn operators(&self) -> &[Box<dyn MorphogenOperator>] {
        &self.operators
    }

    /// Append a force field and return its position in the field list.
    pub fn add_force_field(&mut self, field: ForceField) -> usize {
        self.force_fields.push(field);
        self.force_fields.len() - 1
    }

    pub fn force_fields(&self) -> &[ForceField] {
        &self.force_fields
    }

    pub fn force_field_mut(&mut self, index: usize) -> Option<&mut ForceField> {
        self.force_fields.get_mut(index)
    }

    pub(crate) fn replace_force_field(&mut self, index: usize, field: ForceField) {
        if let Some(slot) = self.force_fields.get_mut(index) {
            *slot = field;
        }
    }

    /// Run `steps` full steps of length `dt`.
    pub fn simulation_steps(&mut self, steps: usize, dt: f32) -> SimulationResult<()> {
        for _ in 0..steps {
            self.step(dt)?;
        }
        Ok(())
    }

    /// Run one full step.
    pub fn step(&mut self, dt: f32) -> SimulationResult<()> {
        self.check_division()?;

        self.system.update_neighborhood_cells();
        self.system.apply_force_fields(&self.force_fields)?;
        self.system.simulation_steps(1, dt);
        for operator in &self.operators {
            self.system.apply_operator(operator.as_ref(), dt)?;
        }
        self.clock.advance(dt as f64);

        log::debug!(
            "Step {}: {} particles ({} live), generation {}, {:?}",
            self.clock.step_index,
            self.system.active_count(),
            self.system.live_count(),
            self.generation,
            self.state
        );
        Ok(())
    }

    fn check_division(&mut self) -> SimulationResult<()> {
        if self.state == TissueState::Steady {
            return Ok(());
        }
        if self.clock.step_index % self.config.division_period_steps != 0 {
            self.state = TissueState::Growing;
            return Ok(());
        }

        let before = self.system.active_count();
        let events = division_round(
            &mut self.system,
            self.config.shrink_factor(),
            self.config.division_jitter,
        )?;
        self.generation += 1;
        self.state = TissueState::Dividing;
        log::info!(
            "Division round {} at step {}: {} -> {} particles",
            self.generation,
            self.clock.step_index,
            before,
            before + events.len()
        );

        if self.generation >= self.config.max_generations {
            self.state = TissueState::Steady;
            log::info!(
                "Division ceiling reached after {} generations ({} particles)",
                self.generation,
                self.system.active_count()
            );
        }
        Ok(())
    }
}
