use std::f32::consts::PI;

use glam::Vec3;

use crate::error::{SphError, positive};

/// Smoothing radius and the powers the kernels need, computed once so the hot
/// loops never call `powi`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelRadii {
    pub radius: f32,
    pub radius2: f32,
    pub radius3: f32,
    pub radius4: f32,
    pub radius5: f32,
    pub pi: f32,
}

impl KernelRadii {
    pub fn new(radius: f32) -> Self {
        let radius2 = radius * radius;
        let radius3 = radius2 * radius;
        let radius4 = radius3 * radius;
        let radius5 = radius4 * radius;
        Self {
            radius,
            radius2,
            radius3,
            radius4,
            radius5,
            pi: PI,
        }
    }
}

/// Constants that hold for the whole run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsParams {
    pub particle_mass: f32,
    pub viscosity: f32, // negative = drag
    pub gas_constant: f32,
    pub resting_density: f32,
    pub bound_damping: f32, // negative = bounce
    pub gravity: Vec3,
    pub radii: KernelRadii,
}

/// The subset re-pushed before every step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickParams {
    pub box_size: Vec3,
    pub timestep: f32,
    pub sphere_pos: Vec3,
    pub sphere_radius: f32, // 0 disables the collider
}

impl TickParams {
    /// Rejects tick values the boundary clamp cannot contain particles with.
    pub fn validate(&self) -> Result<(), SphError> {
        positive("timestep", self.timestep)?;
        if !self.box_size.is_finite() || self.box_size.min_element() <= 0.0 {
            return Err(SphError::invalid("box_size", "every axis must be positive"));
        }
        if !self.sphere_pos.is_finite() {
            return Err(SphError::invalid("sphere_pos", "must be finite"));
        }
        if !(self.sphere_radius.is_finite() && self.sphere_radius >= 0.0) {
            return Err(SphError::invalid("sphere_radius", "must be zero or positive"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphParams {
    pub physics: PhysicsParams,
    pub tick: TickParams,
}

impl SphParams {
    #[inline]
    pub fn half_box(&self) -> Vec3 {
        self.tick.box_size * 0.5
    }
}
