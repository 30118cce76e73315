//! Particle storage, neighborhood search and time integration.

pub mod clock;
pub mod double_buffer;
pub mod error;
pub mod neighborhood_grid;
pub mod odometer;
pub mod particle_system;
pub mod physics_config;

pub use clock::{Sequence, SimulationClock, TriggerId};
pub use double_buffer::{AttributeStore, DoubleBuffer};
pub use error::{SimulationError, SimulationResult};
pub use neighborhood_grid::{GridStats, NeighborhoodGrid};
pub use particle_system::{
    compute_distance, compute_squared_distance, ParticleSystem, ParticleView,
};
pub use physics_config::PhysicsConfig;
