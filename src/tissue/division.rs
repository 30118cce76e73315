// Cell division logic

use crate::simulation::error::{SimulationError, SimulationResult};
use crate::simulation::particle_system::ParticleSystem;

/// One parent/child pair produced by a division round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DivisionEvent {
    pub parent: u32,
    pub child: u32,
}

/// Divide every live particle once.
///
/// Each parent's target radius is multiplied by `shrink_factor` and the parent
/// is then cloned, so the child inherits the reduced target radius together
/// with every scalar field value. Radii are left alone and relax toward the
/// new target during integration.
///
/// Particles scheduled for removal do not divide. Children are appended in
/// parent id order; children of this round do not divide again in it.
///
/// # Errors
/// `CapacityExceeded` if the round does not fit. Capacity is checked up front,
/// so a failed round leaves the population untouched.
pub fn division_round(
    system: &mut ParticleSystem,
    shrink_factor: f32,
    jitter: f32,
) -> SimulationResult<Vec<DivisionEvent>> {
    let parents: Vec<usize> = (0..system.active_count())
        .filter(|&id| !system.is_removed(id))
        .collect();

    if system.active_count() + parents.len() > system.max_particles() {
        return Err(SimulationError::CapacityExceeded {
            capacity: system.max_particles(),
        });
    }

    let mut events = Vec::with_capacity(parents.len());
    for parent in parents {
        let target = system.target_radius(parent)?;
        system.set_target_radius(parent, target * shrink_factor)?;
        let child = system.clone_particle(parent, jitter)?;
        events.push(DivisionEvent {
            parent: parent as u32,
            child,
        });
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::PhysicsConfig;

    fn system(capacity: usize) -> ParticleSystem {
        let config = PhysicsConfig {
            default_radius: 0.04,
            ..Default::default()
        };
        ParticleSystem::new(2, capacity, config).unwrap()
    }

    #[test]
    fn every_live_particle_divides_once() {
        let mut system = system(16);
        system.add_particle(&[0.3, 0.3]).unwrap();
        system.add_particle(&[0.7, 0.7]).unwrap();

        let events = division_round(&mut system, 0.5, 0.0).unwrap();

        assert_eq!(
            events,
            vec![
                DivisionEvent { parent: 0, child: 2 },
                DivisionEvent { parent: 1, child: 3 },
            ]
        );
        assert_eq!(system.active_count(), 4);
        for id in 0..4 {
            assert!((system.target_radius(id).unwrap() - 0.02).abs() < 1e-7);
            assert!((system.radius(id).unwrap() - 0.04).abs() < 1e-7);
        }
    }

    #[test]
    fn removed_particles_do_not_divide() {
        let mut system = system(16);
        system.add_particle(&[0.3, 0.3]).unwrap();
        system.add_particle(&[0.7, 0.7]).unwrap();
        system.remove_particle(0).unwrap();

        let events = division_round(&mut system, 0.5, 0.0).unwrap();
        assert_eq!(events, vec![DivisionEvent { parent: 1, child: 2 }]);
    }

    #[test]
    fn round_that_does_not_fit_changes_nothing() {
        let mut system = system(3);
        system.add_particle(&[0.3, 0.3]).unwrap();
        system.add_particle(&[0.7, 0.7]).unwrap();

        assert_eq!(
            division_round(&mut system, 0.5, 0.0),
            Err(SimulationError::CapacityExceeded { capacity: 3 })
        );
        assert_eq!(system.active_count(), 2);
        assert_eq!(system.target_radius(0), Ok(0.04));
    }
}
