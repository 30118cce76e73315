//! # Particle System
//!
//! Owns every per-particle buffer of a tissue and advances them in time.
//!
//! ## Step protocol
//!
//! ```text
//! update_neighborhood_cells()     rebuild grid from current positions
//!          │
//! apply_force_field(..) × k       add deltas into the force accumulator
//!          │
//! simulation_steps(1, dt)         v' = v·(1 - drag) + F
//!                                 x' = x + v'·dt
//!                                 r' = r + clamp(t - r, ±rate·dt)
//!                                 swap all buffers, clear accumulator
//!          │
//! apply_operator(..) × m          morphogen operators, swap per operator
//! ```
//!
//! ## Force accumulator
//!
//! The **next** velocity buffer doubles as the accumulator: force fields add
//! into it, integration folds the damped current velocity in, and after the
//! swap the (now stale) next buffer is zeroed for the active range. No
//! separate force array exists.
//!
//! ## Particle lifecycle
//!
//! Ids are dense and stable: particle `i` always lives at slot `i`. Removal
//! does not compact the arrays; a removed particle gets target radius 0,
//! shrinks to radius 0 and is then inert (ignored by every force field).
//!
//! ## Parallelism
//!
//! Above [`PhysicsConfig::parallel_threshold`] active particles, force fields,
//! operators and integration split their id range into disjoint chunks and run
//! them on rayon. Each particle's result only depends on the published
//! snapshot, so both paths produce identical values.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use rayon::prelude::*;

use crate::forces::{ExternalForce, ForceField, InteractionForce};
use crate::morphogen::{FieldId, MorphogenOperator, OperatorContext, ScalarField, ScalarFields};
use crate::simulation::double_buffer::AttributeStore;
use crate::simulation::error::{check_range, SimulationError, SimulationResult};
use crate::simulation::neighborhood_grid::{GridStats, NeighborhoodGrid};
use crate::simulation::physics_config::PhysicsConfig;

/// Particles per rayon work item.
const PARALLEL_CHUNK: usize = 256;

/// Read-only view of the published particle snapshot.
///
/// Slices cover the full capacity; only ids below `active_count` are meaningful.
#[derive(Debug, Clone, Copy)]
pub struct ParticleView<'a> {
    pub dimension: usize,
    pub active_count: usize,
    pub positions: &'a [f32],
    pub velocities: &'a [f32],
    pub radii: &'a [f32],
}

impl<'a> ParticleView<'a> {
    #[inline]
    pub fn position(&self, id: usize) -> &'a [f32] {
        &self.positions[id * self.dimension..(id + 1) * self.dimension]
    }

    #[inline]
    pub fn velocity(&self, id: usize) -> &'a [f32] {
        &self.velocities[id * self.dimension..(id + 1) * self.dimension]
    }

    #[inline]
    pub fn radius(&self, id: usize) -> f32 {
        self.radii[id]
    }

    /// A particle with zero radius takes no part in interactions.
    #[inline]
    pub fn is_inert(&self, id: usize) -> bool {
        self.radii[id] <= 0.0
    }
}

/// Squared center distance of particles `u` and `v` in a flattened position buffer.
pub fn compute_squared_distance(dimension: usize, positions: &[f32], u: usize, v: usize) -> f32 {
    let a = &positions[u * dimension..(u + 1) * dimension];
    let b = &positions[v * dimension..(v + 1) * dimension];
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Center distance of particles `u` and `v`.
pub fn compute_distance(dimension: usize, positions: &[f32], u: usize, v: usize) -> f32 {
    compute_squared_distance(dimension, positions, u, v).sqrt()
}

/// Run `kernel(begin, end, out)` over `[begin, end)`, split into rayon chunks
/// when the range exceeds `threshold`. `out` holds `stride` values per id.
fn for_each_chunk<F>(
    threshold: usize,
    stride: usize,
    begin: usize,
    end: usize,
    out: &mut [f32],
    kernel: F,
) where
    F: Fn(usize, usize, &mut [f32]) + Sync + Send,
{
    if end - begin > threshold && stride > 0 {
        out.par_chunks_mut(PARALLEL_CHUNK * stride)
            .enumerate()
            .for_each(|(k, chunk)| {
                let chunk_begin = begin + k * PARALLEL_CHUNK;
                kernel(chunk_begin, chunk_begin + chunk.len() / stride, chunk);
            });
    } else {
        kernel(begin, end, out);
    }
}

/// Double-buffered particle population with a neighborhood grid and scalar fields.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    dimension: usize,
    max_particles: usize,
    active_count: usize,
    time_step_index: u64,
    config: PhysicsConfig,
    attributes: AttributeStore,
    grid: NeighborhoodGrid,
    fields: ScalarFields,
    rng: ChaCha12Rng,
}

impl ParticleSystem {
    /// Create an empty system.
    ///
    /// # Arguments
    /// * `dimension` - 2 or 3
    /// * `max_particles` - Fixed capacity of every buffer
    /// * `config` - Physics parameters, validated here
    pub fn new(
        dimension: usize,
        max_particles: usize,
        config: PhysicsConfig,
    ) -> SimulationResult<Self> {
        if !(2..=3).contains(&dimension) {
            return Err(SimulationError::InvalidConfig(format!(
                "dimension must be 2 or 3, got {dimension}"
            )));
        }
        if max_particles == 0 {
            return Err(SimulationError::InvalidConfig(
                "max_particles must be positive".into(),
            ));
        }
        config.validate()?;

        let grid = NeighborhoodGrid::uniform(
            dimension,
            config.grid_cells_per_axis,
            config.max_particles_per_cell,
        );
        let rng = ChaCha12Rng::seed_from_u64(config.seed);

        Ok(Self {
            dimension,
            max_particles,
            active_count: 0,
            time_step_index: 0,
            attributes: AttributeStore::new(dimension, max_particles),
            grid,
            fields: ScalarFields::new(),
            rng,
            config,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn max_particles(&self) -> usize {
        self.max_particles
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn time_step_index(&self) -> u64 {
        self.time_step_index
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn grid(&self) -> &NeighborhoodGrid {
        &self.grid
    }

    pub fn grid_stats(&self) -> GridStats {
        self.grid.stats()
    }

    /// Current positions of the active particles (`dimension` floats each).
    pub fn positions(&self) -> &[f32] {
        &self.attributes.positions.current()[..self.active_count * self.dimension]
    }

    pub fn velocities(&self) -> &[f32] {
        &self.attributes.velocities.current()[..self.active_count * self.dimension]
    }

    pub fn radii(&self) -> &[f32] {
        &self.attributes.radii.current()[..self.active_count]
    }

    pub fn target_radii(&self) -> &[f32] {
        &self.attributes.target_radii.current()[..self.active_count]
    }

    /// Snapshot view used by force fields and operators.
    pub fn view(&self) -> ParticleView<'_> {
        ParticleView {
            dimension: self.dimension,
            active_count: self.active_count,
            positions: self.attributes.positions.current(),
            velocities: self.attributes.velocities.current(),
            radii: self.attributes.radii.current(),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    fn check_id(&self, id: usize) -> SimulationResult<()> {
        if id >= self.active_count {
            return Err(SimulationError::UnknownParticle {
                id,
                active: self.active_count,
            });
        }
        Ok(())
    }

    fn check_coordinates(&self, coordinates: &[f32]) -> SimulationResult<()> {
        if coordinates.len() != self.dimension {
            return Err(SimulationError::DimensionMismatch {
                expected: self.dimension,
                actual: coordinates.len(),
            });
        }
        Ok(())
    }

    fn reserve_slot(&self) -> SimulationResult<usize> {
        if self.active_count >= self.max_particles {
            return Err(SimulationError::CapacityExceeded {
                capacity: self.max_particles,
            });
        }
        Ok(self.active_count)
    }

    /// Zero velocity in both buffers, which also clears the slot's accumulator.
    fn reset_velocity(&mut self, id: usize) {
        let d = self.dimension;
        for index in id * d..(id + 1) * d {
            self.attributes.velocities.set_both(index, 0.0);
        }
    }

    /// Append a particle at rest with the default radius.
    pub fn add_particle(&mut self, position: &[f32]) -> SimulationResult<u32> {
        self.check_coordinates(position)?;
        let id = self.reserve_slot()?;
        let d = self.dimension;

        self.attributes.positions.current_mut()[id * d..(id + 1) * d].copy_from_slice(position);
        self.reset_velocity(id);
        self.attributes.radii.current_mut()[id] = self.config.default_radius;
        self.attributes.target_radii.current_mut()[id] = self.config.default_radius;

        self.active_count += 1;
        Ok(id as u32)
    }

    /// Append a copy of particle `id`.
    ///
    /// The copy shares radius, target radius and every scalar field value with
    /// its source, starts at rest, and is displaced by a uniform random offset
    /// in `[-jitter, jitter]` per axis.
    pub fn clone_particle(&mut self, id: usize, jitter: f32) -> SimulationResult<u32> {
        self.check_id(id)?;
        if !jitter.is_finite() {
            return Err(SimulationError::InvalidConfig(format!(
                "division jitter must be finite, got {jitter}"
            )));
        }
        let child = self.reserve_slot()?;
        let d = self.dimension;

        self.attributes.copy_particle(id, child);
        let jitter = jitter.abs();
        if jitter > 0.0 {
            let position = &mut self.attributes.positions.current_mut()[child * d..(child + 1) * d];
            for x in position {
                *x += self.rng.random_range(-jitter..=jitter);
            }
        }
        self.reset_velocity(child);
        self.fields.copy_value_all(id, child);

        self.active_count += 1;
        Ok(child as u32)
    }

    /// Schedule particle `id` for removal: it shrinks to zero and becomes inert.
    pub fn remove_particle(&mut self, id: usize) -> SimulationResult<()> {
        self.check_id(id)?;
        self.attributes.target_radii.current_mut()[id] = 0.0;
        Ok(())
    }

    /// Removal was requested for `id`.
    pub fn is_removed(&self, id: usize) -> bool {
        id < self.active_count && self.attributes.target_radii.current()[id] <= 0.0
    }

    /// `id` has shrunk to nothing and no longer interacts.
    pub fn is_inert(&self, id: usize) -> bool {
        id < self.active_count && self.attributes.radii.current()[id] <= 0.0
    }

    /// Active particles not scheduled for removal.
    pub fn live_count(&self) -> usize {
        self.target_radii().iter().filter(|&&t| t > 0.0).count()
    }

    pub fn position(&self, id: usize) -> SimulationResult<&[f32]> {
        self.check_id(id)?;
        let d = self.dimension;
        Ok(&self.attributes.positions.current()[id * d..(id + 1) * d])
    }

    pub fn set_position(&mut self, id: usize, position: &[f32]) -> SimulationResult<()> {
        self.check_id(id)?;
        self.check_coordinates(position)?;
        let d = self.dimension;
        self.attributes.positions.current_mut()[id * d..(id + 1) * d].copy_from_slice(position);
        Ok(())
    }

    pub fn velocity(&self, id: usize) -> SimulationResult<&[f32]> {
        self.check_id(id)?;
        let d = self.dimension;
        Ok(&self.attributes.velocities.current()[id * d..(id + 1) * d])
    }

    /// Set the current velocity. Forces already accumulated for this step are kept.
    pub fn set_velocity(&mut self, id: usize, velocity: &[f32]) -> SimulationResult<()> {
        self.check_id(id)?;
        self.check_coordinates(velocity)?;
        let d = self.dimension;
        self.attributes.velocities.current_mut()[id * d..(id + 1) * d].copy_from_slice(velocity);
        Ok(())
    }

    pub fn radius(&self, id: usize) -> SimulationResult<f32> {
        self.check_id(id)?;
        Ok(self.attributes.radii.current()[id])
    }

    pub fn set_radius(&mut self, id: usize, radius: f32) -> SimulationResult<()> {
        self.check_id(id)?;
        self.attributes.radii.current_mut()[id] = radius.max(0.0);
        Ok(())
    }

    pub fn target_radius(&self, id: usize) -> SimulationResult<f32> {
        self.check_id(id)?;
        Ok(self.attributes.target_radii.current()[id])
    }

    pub fn set_target_radius(&mut self, id: usize, radius: f32) -> SimulationResult<()> {
        self.check_id(id)?;
        self.attributes.target_radii.current_mut()[id] = radius.max(0.0);
        Ok(())
    }

    // ========================================================================
    // Scalar fields
    // ========================================================================

    /// Register a scalar field (or look up an existing one with this name).
    pub fn add_field(&mut self, name: &str) -> FieldId {
        self.fields.add(name, self.max_particles)
    }

    pub fn field_id(&self, name: &str) -> SimulationResult<FieldId> {
        self.fields.id_of(name)
    }

    pub fn field(&self, id: FieldId) -> Option<&ScalarField> {
        self.fields.get(id)
    }

    pub fn field_mut(&mut self, id: FieldId) -> Option<&mut ScalarField> {
        self.fields.get_mut(id)
    }

    pub fn field_by_name(&self, name: &str) -> SimulationResult<&ScalarField> {
        self.fields.by_name(name)
    }

    pub fn fields(&self) -> &ScalarFields {
        &self.fields
    }

    /// Run `operator` over every active particle and publish its target field.
    pub fn apply_operator(
        &mut self,
        operator: &dyn MorphogenOperator,
        dt: f32,
    ) -> SimulationResult<()> {
        self.apply_operator_range(operator, 0, self.active_count, dt)
    }

    /// Run `operator` over `[begin, end)`. Other active particles keep their value.
    pub fn apply_operator_range(
        &mut self,
        operator: &dyn MorphogenOperator,
        begin: usize,
        end: usize,
        dt: f32,
    ) -> SimulationResult<()> {
        check_range(begin, end, self.active_count)?;
        self.fields.check_operator(operator)?;
        let target = operator.target();
        let active = self.active_count;
        let threshold = self.config.parallel_threshold;

        let particles = ParticleView {
            dimension: self.dimension,
            active_count: active,
            positions: self.attributes.positions.current(),
            velocities: self.attributes.velocities.current(),
            radii: self.attributes.radii.current(),
        };
        let (fields, next) = self.fields.split_target(target)?;
        let current = fields.current(target);
        next[..begin].copy_from_slice(&current[..begin]);
        next[end..active].copy_from_slice(&current[end..active]);

        let context = OperatorContext {
            particles,
            grid: &self.grid,
            fields,
            dt,
        };
        for_each_chunk(threshold, 1, begin, end, &mut next[begin..end], |b, e, out| {
            operator.apply(b, e, &context, out)
        });

        if let Some(field) = self.fields.get_mut(target) {
            field.swap();
        }
        Ok(())
    }

    // ========================================================================
    // Forces
    // ========================================================================

    /// Rebuild the neighborhood grid from current positions.
    pub fn update_neighborhood_cells(&mut self) {
        self.grid
            .update(self.attributes.positions.current(), self.active_count);
    }

    /// Accumulate one force field over every active particle.
    pub fn apply_force_field(&mut self, field: &ForceField) -> SimulationResult<()> {
        self.apply_force_field_range(field, 0, self.active_count)
    }

    /// Accumulate several force fields in order.
    pub fn apply_force_fields(&mut self, fields: &[ForceField]) -> SimulationResult<()> {
        for field in fields {
            self.apply_force_field(field)?;
        }
        Ok(())
    }

    /// Accumulate one force field over `[begin, end)`. Disabled fields are skipped.
    pub fn apply_force_field_range(
        &mut self,
        field: &ForceField,
        begin: usize,
        end: usize,
    ) -> SimulationResult<()> {
        check_range(begin, end, self.active_count)?;
        if !field.is_enabled() {
            return Ok(());
        }
        match field {
            ForceField::External(force) => self.apply_external_range(force.as_ref(), begin, end),
            ForceField::Interaction(force) => {
                self.apply_interaction_range(force.as_ref(), begin, end)
            }
        }
    }

    pub fn apply_external_range(
        &mut self,
        force: &dyn ExternalForce,
        begin: usize,
        end: usize,
    ) -> SimulationResult<()> {
        check_range(begin, end, self.active_count)?;
        let d = self.dimension;
        let threshold = self.config.parallel_threshold;

        let (velocities, accumulator) = self.attributes.velocities.split();
        let particles = ParticleView {
            dimension: d,
            active_count: self.active_count,
            positions: self.attributes.positions.current(),
            velocities,
            radii: self.attributes.radii.current(),
        };
        let out = &mut accumulator[begin * d..end * d];
        for_each_chunk(threshold, d, begin, end, out, |b, e, out| {
            force.apply(b, e, &particles, out)
        });
        Ok(())
    }

    pub fn apply_interaction_range(
        &mut self,
        force: &dyn InteractionForce,
        begin: usize,
        end: usize,
    ) -> SimulationResult<()> {
        check_range(begin, end, self.active_count)?;
        let d = self.dimension;
        let threshold = self.config.parallel_threshold;

        let (velocities, accumulator) = self.attributes.velocities.split();
        let particles = ParticleView {
            dimension: d,
            active_count: self.active_count,
            positions: self.attributes.positions.current(),
            velocities,
            radii: self.attributes.radii.current(),
        };
        let grid = &self.grid;
        let out = &mut accumulator[begin * d..end * d];
        for_each_chunk(threshold, d, begin, end, out, |b, e, out| {
            force.apply(b, e, grid, &particles, out)
        });
        Ok(())
    }

    /// Forces accumulated so far for this step.
    pub fn accumulated_forces(&self) -> &[f32] {
        &self.attributes.velocities.next()[..self.active_count * self.dimension]
    }

    // ========================================================================
    // Integration
    // ========================================================================

    /// Advance `steps` times by `dt`.
    ///
    /// Forces accumulated before the call act on the first step only.
    pub fn simulation_steps(&mut self, steps: usize, dt: f32) {
        for _ in 0..steps {
            self.integrate(dt);
        }
    }

    fn integrate(&mut self, dt: f32) {
        let n = self.active_count;
        let len = n * self.dimension;
        let keep = 1.0 - self.config.drag;
        let clamp = self.config.clamp_to_domain;
        let max_change = (self.config.radius_relaxation_rate * dt).abs();
        let parallel = n > self.config.parallel_threshold;
        let attributes = &mut self.attributes;

        {
            let (v_cur, v_next) = attributes.velocities.split();
            let (x_cur, x_next) = attributes.positions.split();
            let kernel = |((v_new, x_new), (v_old, x_old)): ((&mut f32, &mut f32), (&f32, &f32))| {
                let v = *v_old * keep + *v_new;
                let x = *x_old + v * dt;
                *v_new = v;
                *x_new = if clamp { x.clamp(0.0, 1.0) } else { x };
            };
            if parallel {
                v_next[..len]
                    .par_iter_mut()
                    .zip(x_next[..len].par_iter_mut())
                    .zip(v_cur[..len].par_iter().zip(x_cur[..len].par_iter()))
                    .for_each(&kernel);
            } else {
                v_next[..len]
                    .iter_mut()
                    .zip(x_next[..len].iter_mut())
                    .zip(v_cur[..len].iter().zip(x_cur[..len].iter()))
                    .for_each(&kernel);
            }
        }

        {
            let (r_cur, r_next) = attributes.radii.split();
            let targets = attributes.target_radii.current();
            for id in 0..n {
                let r = r_cur[id];
                r_next[id] = (r + (targets[id] - r).clamp(-max_change, max_change)).max(0.0);
            }
        }
        attributes.target_radii.copy_current_to_next(0, n);

        attributes.swap_all();
        attributes.velocities.next_mut()[..len].fill(0.0);
        self.time_step_index += 1;
    }
}
