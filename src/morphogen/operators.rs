//! Built-in morphogen operators.

use crate::geometry::IsoSurface;
use crate::morphogen::{FieldId, MorphogenOperator, OperatorContext};
use crate::simulation::particle_system::compute_distance;

/// Exponential decay: `v' = v * exp(-rate * dt)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayOperator {
    target: FieldId,
    rate: f32,
}

impl DecayOperator {
    pub fn new(target: FieldId, rate: f32) -> Self {
        Self { target, rate }
    }
}

impl MorphogenOperator for DecayOperator {
    fn name(&self) -> &str {
        "decay"
    }

    fn target(&self) -> FieldId {
        self.target
    }

    fn apply(&self, begin: usize, end: usize, context: &OperatorContext<'_>, out: &mut [f32]) {
        let current = context.fields.current(self.target);
        let factor = (-self.rate * context.dt).exp();
        for (slot, id) in out.iter_mut().zip(begin..end) {
            *slot = current[id] * factor;
        }
    }
}

/// Relaxes each value toward the mean of the particles it touches.
///
/// Two live particles are in contact when their center distance is at most
/// `contact_factor * (r_a + r_b)`. Candidates come from the neighborhood grid.
/// The relaxation weight `rate * dt` is capped at 1.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionOperator {
    target: FieldId,
    rate: f32,
    contact_factor: f32,
}

impl DiffusionOperator {
    pub fn new(target: FieldId, rate: f32) -> Self {
        Self {
            target,
            rate,
            contact_factor: 1.1,
        }
    }

    pub fn with_contact_factor(mut self, contact_factor: f32) -> Self {
        self.contact_factor = contact_factor;
        self
    }
}

impl MorphogenOperator for DiffusionOperator {
    fn name(&self) -> &str {
        "diffusion"
    }

    fn target(&self) -> FieldId {
        self.target
    }

    fn apply(&self, begin: usize, end: usize, context: &OperatorContext<'_>, out: &mut [f32]) {
        let particles = &context.particles;
        let current = context.fields.current(self.target);
        let weight = (self.rate * context.dt).clamp(0.0, 1.0);

        for (slot, id) in out.iter_mut().zip(begin..end) {
            *slot = current[id];
            if particles.is_inert(id) {
                continue;
            }

            let radius = particles.radius(id);
            let mut sum = 0.0;
            let mut count = 0u32;
            context.grid.for_each_neighbor(particles.position(id), |other| {
                let other = other as usize;
                if other == id || particles.is_inert(other) {
                    return;
                }
                let reach = self.contact_factor * (radius + particles.radius(other));
                let distance =
                    compute_distance(particles.dimension, particles.positions, id, other);
                if distance <= reach {
                    sum += current[other];
                    count += 1;
                }
            });

            if count > 0 {
                let mean = sum / count as f32;
                *slot += weight * (mean - current[id]);
            }
        }
    }
}

/// Pins the value of particles inside an iso-surface.
#[derive(Debug, Clone)]
pub struct RegionSourceOperator {
    target: FieldId,
    region: Box<dyn IsoSurface>,
    value: f32,
}

impl RegionSourceOperator {
    pub fn new(target: FieldId, region: Box<dyn IsoSurface>, value: f32) -> Self {
        Self {
            target,
            region,
            value,
        }
    }
}

impl MorphogenOperator for RegionSourceOperator {
    fn name(&self) -> &str {
        "region_source"
    }

    fn target(&self) -> FieldId {
        self.target
    }

    fn apply(&self, begin: usize, end: usize, context: &OperatorContext<'_>, out: &mut [f32]) {
        let current = context.fields.current(self.target);
        let mut region = self.region.box_clone();
        for (slot, id) in out.iter_mut().zip(begin..end) {
            let inside = !context.particles.is_inert(id)
                && region.evaluate(context.particles.position(id)) <= 0.0;
            *slot = if inside { self.value } else { current[id] };
        }
    }
}

/// Binary property derived from another field: `high` where
/// `source >= threshold`, `low` elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdOperator {
    target: FieldId,
    source: FieldId,
    threshold: f32,
    low: f32,
    high: f32,
}

impl ThresholdOperator {
    pub fn new(target: FieldId, source: FieldId, threshold: f32) -> Self {
        Self {
            target,
            source,
            threshold,
            low: 0.0,
            high: 1.0,
        }
    }

    pub fn with_levels(mut self, low: f32, high: f32) -> Self {
        self.low = low;
        self.high = high;
        self
    }
}

impl MorphogenOperator for ThresholdOperator {
    fn name(&self) -> &str {
        "threshold"
    }

    fn target(&self) -> FieldId {
        self.target
    }

    fn inputs(&self) -> Vec<FieldId> {
        vec![self.source]
    }

    fn apply(&self, begin: usize, end: usize, context: &OperatorContext<'_>, out: &mut [f32]) {
        let source = context.fields.current(self.source);
        for (slot, id) in out.iter_mut().zip(begin..end) {
            *slot = if source[id] >= self.threshold {
                self.high
            } else {
                self.low
            };
        }
    }
}
