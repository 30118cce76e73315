//! Instance data for external renderers.
//!
//! The simulation never draws. A renderer reads the published snapshot
//! through these helpers and uploads the packed records as an instance buffer
//! (one sphere impostor per particle). 2D tissues are placed on the `z = 0`
//! plane.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::morphogen::FieldId;
use crate::simulation::particle_system::ParticleSystem;

/// One sphere, laid out for direct upload (32 bytes, 16-byte aligned rows).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub radius: f32,
    /// Scalar field value used for coloring, 0 when no field is selected
    pub value: f32,
    /// Particle id, stored as float for shader-side picking
    pub id: f32,
    pub _padding: [f32; 2],
}

/// Position of particle `id` lifted to 3D.
#[inline]
fn position_3d(system: &ParticleSystem, positions: &[f32], id: usize) -> Vec3 {
    let d = system.dimension();
    let p = &positions[id * d..(id + 1) * d];
    Vec3::new(p[0], p[1], if d > 2 { p[2] } else { 0.0 })
}

/// Fill `out` with one instance per particle that is not inert.
///
/// `out` is cleared first so callers can reuse the allocation across frames.
/// If `field` is not registered, values are 0.
pub fn build_instances(
    system: &ParticleSystem,
    field: Option<FieldId>,
    out: &mut Vec<ParticleInstance>,
) {
    out.clear();
    let positions = system.positions();
    let radii = system.radii();
    let values = field.and_then(|id| system.field(id)).map(|f| f.current());

    for id in 0..system.active_count() {
        if radii[id] <= 0.0 {
            continue;
        }
        out.push(ParticleInstance {
            position: position_3d(system, positions, id).to_array(),
            radius: radii[id],
            value: values.map_or(0.0, |v| v[id]),
            id: id as f32,
            _padding: [0.0; 2],
        });
    }
}

/// Current positions as `Vec3`, inert particles included.
pub fn positions_vec3(system: &ParticleSystem) -> Vec<Vec3> {
    let positions = system.positions();
    (0..system.active_count())
        .map(|id| position_3d(system, positions, id))
        .collect()
}

/// Axis-aligned bounds of the live particles (centers padded by radius).
pub fn bounds(system: &ParticleSystem) -> Option<(Vec3, Vec3)> {
    let positions = system.positions();
    let radii = system.radii();
    (0..system.active_count())
        .filter(|&id| radii[id] > 0.0)
        .map(|id| {
            let center = position_3d(system, positions, id);
            let r = Vec3::splat(radii[id]);
            (center - r, center + r)
        })
        .reduce(|(min_a, max_a), (min_b, max_b)| (min_a.min(min_b), max_a.max(max_b)))
}

/// Raw bytes of an instance slice, ready for a GPU buffer write.
pub fn as_bytes(instances: &[ParticleInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::PhysicsConfig;

    fn system() -> ParticleSystem {
        let config = PhysicsConfig {
            default_radius: 0.1,
            ..Default::default()
        };
        let mut system = ParticleSystem::new(2, 8, config).unwrap();
        system.add_particle(&[0.2, 0.3]).unwrap();
        system.add_particle(&[0.6, 0.7]).unwrap();
        system
    }

    #[test]
    fn instance_is_32_bytes() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 32);
    }

    #[test]
    fn flat_tissue_lies_on_the_z_plane() {
        let system = system();
        let mut instances = Vec::new();
        build_instances(&system, None, &mut instances);
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[1].position, [0.6, 0.7, 0.0]);
        assert_eq!(instances[1].radius, 0.1);
        assert_eq!(as_bytes(&instances).len(), 64);
    }

    #[test]
    fn field_values_are_exported() {
        let mut system = system();
        let field = system.add_field("fate");
        system.field_mut(field).unwrap().set_value(1, 0.75);
        let mut instances = Vec::new();
        build_instances(&system, Some(field), &mut instances);
        assert_eq!(instances[0].value, 0.0);
        assert_eq!(instances[1].value, 0.75);
    }

    #[test]
    fn inert_particles_are_skipped() {
        let mut system = system();
        system.set_radius(0, 0.0).unwrap();
        let mut instances = Vec::new();
        build_instances(&system, None, &mut instances);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].id, 1.0);
        assert_eq!(positions_vec3(&system).len(), 2);
    }

    #[test]
    fn bounds_cover_every_sphere() {
        let (min, max) = bounds(&system()).unwrap();
        assert!(min.abs_diff_eq(Vec3::new(0.1, 0.2, -0.1), 1e-6));
        assert!(max.abs_diff_eq(Vec3::new(0.7, 0.8, 0.1), 1e-6));
    }
}
