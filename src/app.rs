//! Headless simulation runner.
//!
//! Reads an optional RON run description from the first command-line
//! argument, grows an embryo inside an ellipsoid and logs the population as
//! it develops. Set `RUST_LOG=debug` for per-step output.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geometry::Ellipsoid;
use crate::rendering;
use crate::simulation::error::SimulationError;
use crate::tissue::{ConfigError, Embryo, TissueConfig, TissueState};

/// Boundary ellipsoid of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub center: Vec<f32>,
    pub radius: f32,
    /// Relative diameters per axis
    pub axes: Vec<f32>,
    /// Push-back per unit of distance outside the surface
    pub intensity: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            center: vec![0.5, 0.5, 0.5],
            radius: 0.4,
            axes: vec![2.0, 1.5, 1.5],
            intensity: 0.05,
        }
    }
}

impl SurfaceConfig {
    /// Check that the first `dimension` entries describe a proper ellipsoid.
    pub fn validate(&self, dimension: usize) -> Result<(), SimulationError> {
        if self.center.len() < dimension || self.axes.len() < dimension {
            return Err(SimulationError::DimensionMismatch {
                expected: dimension,
                actual: self.center.len().min(self.axes.len()),
            });
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "surface radius must be positive, got {}",
                self.radius
            )));
        }
        if let Some(axis) = self.axes[..dimension]
            .iter()
            .find(|a| !(a.is_finite() && **a > 0.0))
        {
            return Err(SimulationError::InvalidConfig(format!(
                "surface axes must be positive, got {axis}"
            )));
        }
        if !self.center[..dimension].iter().all(|c| c.is_finite()) {
            return Err(SimulationError::InvalidConfig(
                "surface center must be finite".into(),
            ));
        }
        if !self.intensity.is_finite() {
            return Err(SimulationError::InvalidConfig(format!(
                "surface intensity must be finite, got {}",
                self.intensity
            )));
        }
        Ok(())
    }
}

/// Everything the runner needs, loadable from a RON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub tissue: TissueConfig,
    pub surface: SurfaceConfig,
    pub initial_particles: usize,
    pub steps: usize,
    pub dt: f32,
    /// Log a population summary every this many steps (0 disables)
    pub log_every: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tissue: TissueConfig::default(),
            surface: SurfaceConfig::default(),
            initial_particles: 1,
            steps: 1000,
            dt: 1.0,
            log_every: 100,
        }
    }
}

impl RunConfig {
    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(contents)?;
        config.tissue.validate()?;
        config.surface.validate(config.tissue.dimension)?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }
}

/// Error type for a headless run.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),
}

/// Final state of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub steps: u64,
    pub particles: usize,
    pub live_particles: usize,
    pub generation: u32,
    pub state: TissueState,
    pub overflow_events: u64,
}

/// Build the embryo described by `config` and run it to completion.
pub fn run_simulation(config: &RunConfig) -> Result<RunSummary, AppError> {
    let dimension = config.tissue.dimension;
    let surface = &config.surface;
    surface.validate(dimension)?;
    let ellipsoid = Ellipsoid::new(dimension, surface.radius, &surface.center, &surface.axes);

    let mut embryo = Embryo::new(config.tissue.clone(), Box::new(ellipsoid), surface.intensity)?;
    embryo.seed(&surface.center[..dimension], config.initial_particles)?;

    log::info!(
        "Growing {}D embryo: {} initial particles, {} steps, capacity {}",
        dimension,
        config.initial_particles,
        config.steps,
        config.tissue.max_particles
    );

    for step in 0..config.steps {
        embryo.step(config.dt)?;
        if config.log_every > 0 && (step + 1) % config.log_every == 0 {
            log_population(&embryo);
        }
    }
    log_population(&embryo);

    let tissue = embryo.tissue();
    let particles = tissue.particles();
    Ok(RunSummary {
        steps: tissue.clock().step_index,
        particles: particles.active_count(),
        live_particles: particles.live_count(),
        generation: tissue.generation(),
        state: tissue.state(),
        overflow_events: particles.grid_stats().overflow_events,
    })
}

fn log_population(embryo: &Embryo) {
    let tissue = embryo.tissue();
    let particles = tissue.particles();
    let stats = particles.grid_stats();
    match rendering::bounds(particles) {
        Some((min, max)) => log::info!(
            "t = {:.1}: {} particles, generation {}, {:?}, extent {:.3?}, max cell occupancy {}",
            tissue.clock().time,
            particles.active_count(),
            tissue.generation(),
            tissue.state(),
            (max - min).to_array(),
            stats.max_occupancy
        ),
        None => log::info!("t = {:.1}: no live particles", tissue.clock().time),
    }
}

/// Entry point of the `bio-tissue` binary.
pub fn run() {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match RunConfig::load(&path) {
            Ok(config) => {
                log::info!("Loaded run configuration from {}", path);
                config
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => RunConfig::default(),
    };

    match run_simulation(&config) {
        Ok(summary) => log::info!(
            "Finished after {} steps: {} particles ({} live), {} generations, {:?}",
            summary.steps,
            summary.particles,
            summary.live_particles,
            summary.generation,
            summary.state
        ),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_run_reaches_steady_state() {
        let config = RunConfig::from_ron_str(
            "(
                tissue: (dimension: 2, max_particles: 64, division_period_steps: 5, max_generations: 3),
                surface: (center: [0.5, 0.5], radius: 0.3, axes: [2.0, 2.0]),
                initial_particles: 2,
                steps: 20,
                dt: 0.5,
                log_every: 0,
            )",
        )
        .unwrap();

        let summary = run_simulation(&config).unwrap();
        assert_eq!(summary.steps, 20);
        assert_eq!(summary.particles, 16);
        assert_eq!(summary.generation, 3);
        assert_eq!(summary.state, TissueState::Steady);
    }

    #[test]
    fn short_surface_description_is_rejected() {
        let config = RunConfig {
            surface: SurfaceConfig {
                center: vec![0.5],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            run_simulation(&config),
            Err(AppError::Simulation(SimulationError::DimensionMismatch { .. }))
        ));
    }

    #[test]
    fn degenerate_surface_is_an_error() {
        let degenerate = [
            SurfaceConfig {
                radius: 0.0,
                ..Default::default()
            },
            SurfaceConfig {
                axes: vec![2.0, -1.0, 1.5],
                ..Default::default()
            },
            SurfaceConfig {
                intensity: f32::NAN,
                ..Default::default()
            },
        ];
        for surface in degenerate {
            let config = RunConfig {
                surface,
                steps: 1,
                ..Default::default()
            };
            assert!(matches!(
                run_simulation(&config),
                Err(AppError::Simulation(SimulationError::InvalidConfig(_)))
            ));
        }
    }

    #[test]
    fn run_file_with_zero_radius_is_rejected() {
        assert!(matches!(
            RunConfig::from_ron_str("(surface: (radius: 0.0))"),
            Err(ConfigError::Invalid(SimulationError::InvalidConfig(_)))
        ));
    }
}
