//! # Morphogens: Per-Particle Scalar Fields
//!
//! A morphogen is one double-buffered `f32` per particle slot (a chemical
//! concentration, a differentiation flag, an age). Fields are registered by
//! name on the particle system, which keeps them in step with the particle
//! lifecycle: cloning a particle copies every field value.
//!
//! ## Operators
//!
//! A [`MorphogenOperator`] computes a field's next values from the published
//! snapshot (particles, grid, every field's current values) and writes the
//! next buffer of its target field. The target is swapped right after the
//! operator finishes, so operators registered later observe the result of
//! earlier ones within the same step.
//!
//! ```text
//!  op 1 ─► write next(A) ─► swap(A) ─► op 2 ─► write next(B) ─► swap(B) ─► ...
//! ```

pub mod operators;

pub use operators::{DecayOperator, DiffusionOperator, RegionSourceOperator, ThresholdOperator};

use crate::simulation::double_buffer::DoubleBuffer;
use crate::simulation::error::{SimulationError, SimulationResult};
use crate::simulation::neighborhood_grid::NeighborhoodGrid;
use crate::simulation::particle_system::ParticleView;

/// Index of a registered scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub usize);

/// A named, double-buffered per-particle value.
#[derive(Debug, Clone)]
pub struct ScalarField {
    name: String,
    buffer: DoubleBuffer,
}

impl ScalarField {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            buffer: DoubleBuffer::new(capacity),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value(&self, id: usize) -> f32 {
        self.buffer.current()[id]
    }

    /// Set a value in both buffers, so it is visible now and after the next swap.
    pub fn set_value(&mut self, id: usize, value: f32) {
        self.buffer.set_both(id, value);
    }

    pub fn copy_value(&mut self, src: usize, dst: usize) {
        let value = self.value(src);
        self.buffer.set_both(dst, value);
    }

    pub fn current(&self) -> &[f32] {
        self.buffer.current()
    }

    pub fn next_mut(&mut self) -> &mut [f32] {
        self.buffer.next_mut()
    }

    pub fn split(&mut self) -> (&[f32], &mut [f32]) {
        self.buffer.split()
    }

    pub fn swap(&mut self) {
        self.buffer.swap();
    }
}

/// Registry of scalar fields in registration order.
#[derive(Debug, Clone, Default)]
pub struct ScalarFields {
    fields: Vec<ScalarField>,
}

impl ScalarFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field, or return the id of an existing field with that name.
    pub fn add(&mut self, name: &str, capacity: usize) -> FieldId {
        if let Some(index) = self.fields.iter().position(|f| f.name == name) {
            return FieldId(index);
        }
        self.fields.push(ScalarField::new(name, capacity));
        FieldId(self.fields.len() - 1)
    }

    pub fn id_of(&self, name: &str) -> SimulationResult<FieldId> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .map(FieldId)
            .ok_or_else(|| SimulationError::UnknownField { name: name.into() })
    }

    pub fn get(&self, id: FieldId) -> Option<&ScalarField> {
        self.fields.get(id.0)
    }

    pub fn get_mut(&mut self, id: FieldId) -> Option<&mut ScalarField> {
        self.fields.get_mut(id.0)
    }

    pub fn by_name(&self, name: &str) -> SimulationResult<&ScalarField> {
        let id = self.id_of(name)?;
        Ok(&self.fields[id.0])
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScalarField> {
        self.fields.iter()
    }

    /// Fails with `UnknownField` unless `id` is registered.
    pub fn check(&self, id: FieldId) -> SimulationResult<()> {
        if id.0 < self.fields.len() {
            Ok(())
        } else {
            Err(SimulationError::UnknownField {
                name: format!("#{}", id.0),
            })
        }
    }

    /// Every field `operator` reads or writes is registered.
    pub fn check_operator(&self, operator: &dyn MorphogenOperator) -> SimulationResult<()> {
        self.check(operator.target())?;
        operator.inputs().into_iter().try_for_each(|id| self.check(id))
    }

    /// Copy every field's value of `src` onto `dst`.
    pub fn copy_value_all(&mut self, src: usize, dst: usize) {
        for field in &mut self.fields {
            field.copy_value(src, dst);
        }
    }

    /// Read access to every field plus write access to `target`'s next buffer.
    pub(crate) fn split_target(
        &mut self,
        target: FieldId,
    ) -> SimulationResult<(FieldsView<'_>, &mut [f32])> {
        self.check(target)?;
        let (before, rest) = self.fields.split_at_mut(target.0);
        let (target_field, after) = rest.split_at_mut(1);
        let (target_current, target_next) = target_field[0].split();
        Ok((
            FieldsView {
                before,
                target: target.0,
                target_current,
                after,
            },
            target_next,
        ))
    }
}

/// Current values of every registered field, borrowed while one field is written.
#[derive(Debug, Clone, Copy)]
pub struct FieldsView<'a> {
    before: &'a [ScalarField],
    target: usize,
    target_current: &'a [f32],
    after: &'a [ScalarField],
}

impl<'a> FieldsView<'a> {
    /// Current values of field `id`.
    ///
    /// # Panics
    /// If `id` is not registered. Operators listing `id` in
    /// [`MorphogenOperator::inputs`] are checked before they run.
    pub fn current(&self, id: FieldId) -> &'a [f32] {
        use std::cmp::Ordering;
        match id.0.cmp(&self.target) {
            Ordering::Less => self.before[id.0].current(),
            Ordering::Equal => self.target_current,
            Ordering::Greater => self.after[id.0 - self.target - 1].current(),
        }
    }
}

/// Read-only inputs of a morphogen operator.
#[derive(Debug, Clone, Copy)]
pub struct OperatorContext<'a> {
    pub particles: ParticleView<'a>,
    pub grid: &'a NeighborhoodGrid,
    pub fields: FieldsView<'a>,
    /// Length of the step being completed.
    pub dt: f32,
}

/// Computes a field's next values.
pub trait MorphogenOperator: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Field whose next buffer this operator writes.
    fn target(&self) -> FieldId;

    /// Other fields read through [`FieldsView::current`].
    fn inputs(&self) -> Vec<FieldId> {
        Vec::new()
    }

    /// Write next values of particles `[begin, end)` into `out`
    /// (`out[k]` belongs to particle `begin + k`). Every slot must be written.
    fn apply(&self, begin: usize, end: usize, context: &OperatorContext<'_>, out: &mut [f32]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_a_name_twice_returns_the_same_field() {
        let mut fields = ScalarFields::new();
        let a = fields.add("bmp", 8);
        let b = fields.add("wnt", 8);
        assert_ne!(a, b);
        assert_eq!(fields.add("bmp", 8), a);
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn unknown_names_are_reported() {
        let fields = ScalarFields::new();
        assert_eq!(
            fields.id_of("nodal"),
            Err(SimulationError::UnknownField {
                name: "nodal".into()
            })
        );
    }

    #[test]
    fn set_value_is_visible_before_and_after_swap() {
        let mut field = ScalarField::new("age", 4);
        field.set_value(2, 3.5);
        assert_eq!(field.value(2), 3.5);
        field.swap();
        assert_eq!(field.value(2), 3.5);
    }

    #[test]
    fn copy_value_all_copies_every_field() {
        let mut fields = ScalarFields::new();
        let a = fields.add("a", 4);
        let b = fields.add("b", 4);
        fields.get_mut(a).unwrap().set_value(0, 1.0);
        fields.get_mut(b).unwrap().set_value(0, 2.0);

        fields.copy_value_all(0, 3);

        assert_eq!(fields.get(a).unwrap().value(3), 1.0);
        assert_eq!(fields.get(b).unwrap().value(3), 2.0);
    }

    #[test]
    fn unregistered_ids_are_reported() {
        let mut fields = ScalarFields::new();
        let a = fields.add("a", 2);
        assert_eq!(fields.check(a), Ok(()));
        assert_eq!(
            fields.check(FieldId(3)),
            Err(SimulationError::UnknownField { name: "#3".into() })
        );
        assert!(fields.split_target(FieldId(1)).is_err());
    }

    #[test]
    fn split_target_exposes_other_fields_read_only() {
        let mut fields = ScalarFields::new();
        let a = fields.add("a", 2);
        let b = fields.add("b", 2);
        let c = fields.add("c", 2);
        fields.get_mut(a).unwrap().set_value(0, 1.0);
        fields.get_mut(b).unwrap().set_value(0, 2.0);
        fields.get_mut(c).unwrap().set_value(0, 3.0);

        let (view, next) = fields.split_target(b).unwrap();
        assert_eq!(view.current(a)[0], 1.0);
        assert_eq!(view.current(b)[0], 2.0);
        assert_eq!(view.current(c)[0], 3.0);
        next[0] = 20.0;

        let field = fields.get_mut(b).unwrap();
        assert_eq!(field.value(0), 2.0);
        field.swap();
        assert_eq!(field.value(0), 20.0);
    }
}
