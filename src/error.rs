use thiserror::Error;

use crate::driver::Stage;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SphError {
    #[error("spawn counts must be positive, got {0:?}")]
    InvalidSpawnCount([u32; 3]),

    #[error("particle count {count} is not a multiple of the group width {width}")]
    GroupWidthMismatch { count: usize, width: usize },

    #[error("substrate runs groups of {substrate} but the config asks for {configured}")]
    SubstrateWidthMismatch { configured: usize, substrate: usize },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("could not allocate storage for {0} particles")]
    Allocation(usize),

    #[error("particle index {index} out of range (capacity {capacity})")]
    IndexOutOfRange { index: usize, capacity: usize },

    #[error("spawner produced {got} particles but the store holds {capacity}")]
    CapacityMismatch { got: usize, capacity: usize },

    #[error("missing substrate resource: {0}")]
    MissingResource(String),

    #[error("{stage:?} stage failed: {reason}")]
    Dispatch { stage: Stage, reason: String },

    #[error("simulation halted after a failed dispatch")]
    Faulted,
}

impl SphError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub(crate) fn positive(name: &'static str, value: f32) -> Result<(), SphError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SphError::invalid(name, format!("must be positive, got {value}")))
    }
}
