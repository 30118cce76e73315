//! Population growth stops at the generation ceiling.

use bio_tissue::simulation::PhysicsConfig;
use bio_tissue::tissue::{Tissue, TissueConfig, TissueState};

fn tissue(max_particles: usize, period: u64, generations: u32) -> Tissue {
    Tissue::new(TissueConfig {
        dimension: 2,
        max_particles,
        division_period_steps: period,
        max_generations: generations,
        physics: PhysicsConfig {
            default_radius: 0.05,
            ..Default::default()
        },
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn fourteen_generations_every_500_steps() {
    // Collision disabled: only the schedule is under test here.
    let mut tissue = Tissue::new(TissueConfig {
        dimension: 2,
        max_particles: 1 << 14,
        division_period_steps: 500,
        max_generations: 14,
        physics: PhysicsConfig {
            collision_intensity: 0.0,
            ..Default::default()
        },
        ..Default::default()
    })
    .unwrap();
    tissue.add_particle(&[0.5, 0.5]).unwrap();

    tissue.simulation_steps(500 * 14, 1.0).unwrap();
    assert_eq!(tissue.particles().active_count(), 1 << 14);
    assert_eq!(tissue.generation(), 14);
    assert_eq!(tissue.state(), TissueState::Steady);

    tissue.simulation_steps(500, 1.0).unwrap();
    assert_eq!(tissue.particles().active_count(), 1 << 14);
    assert_eq!(tissue.particles().live_count(), 1 << 14);
}

#[test]
fn population_doubles_once_per_round() {
    let mut tissue = tissue(1 << 10, 2, 10);
    tissue.add_particle(&[0.5, 0.5]).unwrap();

    for generation in 1..=10u32 {
        tissue.simulation_steps(2, 0.1).unwrap();
        assert_eq!(tissue.generation(), generation);
        assert_eq!(tissue.particles().active_count(), 1 << generation);
    }
    assert_eq!(tissue.state(), TissueState::Steady);

    tissue.simulation_steps(10, 0.1).unwrap();
    assert_eq!(tissue.particles().active_count(), 1 << 10);
}

#[test]
fn slow_schedule_reaches_the_same_ceiling() {
    let initial = 3;
    let generations = 3;
    let period = 500;
    let mut tissue = tissue(64, period, generations);
    for i in 0..initial {
        tissue.add_particle(&[0.3 + 0.2 * i as f32, 0.5]).unwrap();
    }

    tissue
        .simulation_steps(period as usize * generations as usize, 1.0)
        .unwrap();
    assert_eq!(tissue.particles().active_count(), initial << generations);

    tissue.simulation_steps(2 * period as usize, 1.0).unwrap();
    assert_eq!(tissue.particles().active_count(), initial << generations);
    assert_eq!(tissue.generation(), generations);
}

#[test]
fn children_inherit_the_shrunken_target_radius() {
    let mut tissue = tissue(16, 10, 1);
    tissue.add_particle(&[0.5, 0.5]).unwrap();
    tissue.step(0.1).unwrap();

    let expected = 0.05 * std::f32::consts::FRAC_1_SQRT_2;
    let particles = tissue.particles();
    for id in 0..2 {
        assert!((particles.target_radius(id).unwrap() - expected).abs() < 1e-6);
    }
}
