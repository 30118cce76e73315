pub mod instances;

pub use instances::{as_bytes, bounds, build_instances, positions_vec3, ParticleInstance};
