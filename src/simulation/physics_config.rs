use serde::{Deserialize, Serialize};

use crate::simulation::error::SimulationError;

/// Physics configuration for deterministic simulation
///
/// Fixed at particle-system construction. Identical configurations (including
/// the seed) produce bit-identical runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fraction of velocity removed each step (`v' = v * (1 - drag) + forces`)
    pub drag: f32,

    /// Intensity of the built-in overlap repulsion
    pub collision_intensity: f32,

    /// Maximum radius change per unit of time while relaxing toward the target radius
    pub radius_relaxation_rate: f32,

    /// Radius given to particles created with `add_particle`
    pub default_radius: f32,

    /// Neighborhood grid resolution along each axis
    pub grid_cells_per_axis: usize,

    /// Capacity of each grid cell's particle list
    pub max_particles_per_cell: usize,

    /// Seed of the jitter RNG used when cloning particles
    pub seed: u64,

    /// Active particle count above which force fields run on rayon
    pub parallel_threshold: usize,

    /// Clamp integrated positions into the unit cube
    pub clamp_to_domain: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            drag: 0.8,
            collision_intensity: 0.5,
            radius_relaxation_rate: 0.001,
            default_radius: 0.02,
            grid_cells_per_axis: 32,
            max_particles_per_cell: 32,
            seed: 12345,
            parallel_threshold: 500,
            clamp_to_domain: true,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(0.0..1.0).contains(&self.drag) {
            return Err(SimulationError::InvalidConfig(format!(
                "drag must be within [0, 1), got {}",
                self.drag
            )));
        }
        if self.radius_relaxation_rate < 0.0 {
            return Err(SimulationError::InvalidConfig(
                "radius_relaxation_rate must not be negative".into(),
            ));
        }
        if self.default_radius < 0.0 {
            return Err(SimulationError::InvalidConfig(
                "default_radius must not be negative".into(),
            ));
        }
        if self.grid_cells_per_axis == 0 || self.max_particles_per_cell == 0 {
            return Err(SimulationError::InvalidConfig(
                "grid needs at least one cell per axis and one slot per cell".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PhysicsConfig::default().validate().is_ok());
    }

    #[test]
    fn drag_of_one_is_rejected() {
        let config = PhysicsConfig {
            drag: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn partial_ron_falls_back_to_defaults() {
        let config: PhysicsConfig = ron::from_str("(drag: 0.5, seed: 7)").unwrap();
        assert_eq!(config.drag, 0.5);
        assert_eq!(config.seed, 7);
        assert_eq!(config.grid_cells_per_axis, 32);
    }
}
