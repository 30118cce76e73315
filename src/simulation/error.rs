use thiserror::Error;

/// Failures of particle lifecycle and step operations.
///
/// Every variant is raised before any "next" buffer is written, so a failed
/// call leaves the published state untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Adding or cloning would exceed the fixed particle capacity.
    #[error("particle capacity exceeded (max {capacity} particles)")]
    CapacityExceeded { capacity: usize },

    /// An id range is reversed or extends past the active particles.
    #[error("invalid particle range [{begin}, {end}) for {active} active particles")]
    InvalidRange {
        begin: usize,
        end: usize,
        active: usize,
    },

    /// A particle id does not refer to an active particle.
    #[error("particle {id} is not active ({active} active particles)")]
    UnknownParticle { id: usize, active: usize },

    /// A coordinate slice does not match the simulation dimension.
    #[error("expected {expected} coordinates, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A scalar field name or id is not registered.
    #[error("unknown scalar field '{name}'")]
    UnknownField { name: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SimulationResult<T> = Result<T, SimulationError>;

/// Validate a `[begin, end)` id range against the active particle count.
pub(crate) fn check_range(begin: usize, end: usize, active: usize) -> SimulationResult<()> {
    if begin > end || end > active {
        return Err(SimulationError::InvalidRange { begin, end, active });
    }
    Ok(())
}
