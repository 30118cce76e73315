//! # bio-tissue: Particle Dynamics for Developing Tissue
//!
//! Simulates biological tissue as a population of interacting spheres in the
//! unit cube `[0, 1)^D` (`D` = 2 or 3). Cells divide on a schedule, push each
//! other apart, stay inside an embryo boundary and carry per-cell chemical
//! signals (morphogens) that diffuse and decay.
//!
//! ## Architecture Overview
//!
//! ### 1. Simulation Engine ([`simulation`])
//!
//! - [`simulation::DoubleBuffer`] - Every attribute exists as *current* and *next*; a step reads one and writes the other
//! - [`simulation::NeighborhoodGrid`] - Bounded-list uniform grid, rebuilt each step
//! - [`simulation::ParticleSystem`] - Particle lifecycle, force accumulation and integration
//! - [`simulation::SimulationClock`] / [`simulation::Sequence`] - Explicit time and triggers
//!
//! **Key Design**: Structure-of-Arrays buffers with an O(1) swap as the only
//! publication point, so parallel workers never observe a half-written step.
//!
//! ### 2. Force Fields ([`forces`])
//!
//! External fields act per particle (centripetal, uniform, surface
//! constraint); interaction fields visit grid neighbors (collision, adhesion).
//!
//! ### 3. Morphogens ([`morphogen`])
//!
//! Named per-particle scalar fields and the operators that update them
//! (decay, diffusion, region sources, thresholds).
//!
//! ### 4. Tissue Growth ([`tissue`])
//!
//! [`tissue::Tissue`] composes the above into a developmental step with a
//! division schedule; [`tissue::Embryo`] adds an [`geometry::IsoSurface`]
//! boundary.
//!
//! ### 5. Render Export ([`rendering`])
//!
//! `bytemuck`-packed instance records and `glam` positions for an external
//! viewer. The crate itself is headless.
//!
//! ## Data Flow
//!
//! ```text
//! division → grid rebuild → force fields → integrate + swap → operators → clock
//! ```
//!
//! ## Dependencies
//!
//! - **Math**: `glam` (render export), `bytemuck` (safe transmutation)
//! - **Concurrency**: `rayon` (parallel id ranges)
//! - **Randomness**: `rand` + `rand_chacha` (seeded division jitter)
//! - **Serialization**: `serde` + `ron` (configuration files)
//! - **Errors and logging**: `thiserror`, `log`, `env_logger`

pub mod app;
pub mod forces;
pub mod geometry;
pub mod morphogen;
pub mod rendering;
pub mod simulation;
pub mod tissue;
