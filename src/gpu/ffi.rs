use bytemuck::{Pod, Zeroable};

use crate::params::SphParams;

// must match `@workgroup_size` in sph.wgsl
pub const WORKGROUP_SIZE: u32 = 100;

/// Uniform block for sph.wgsl. Every vec3 is followed by a scalar so the
/// struct has no implicit padding under WGSL's uniform layout rules.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuSimParams {
    pub gravity: [f32; 3],
    pub particle_mass: f32,
    pub box_size: [f32; 3],
    pub timestep: f32,
    pub sphere_pos: [f32; 3],
    pub sphere_radius: f32,
    pub viscosity: f32,
    pub gas_constant: f32,
    pub resting_density: f32,
    pub bound_damping: f32,
    pub radius: f32,
    pub radius2: f32,
    pub radius3: f32,
    pub radius4: f32,
    pub radius5: f32,
    pub pi: f32,
    pub particle_count: u32,
    pub _pad: f32,
}

impl GpuSimParams {
    pub fn new(params: &SphParams, particle_count: u32) -> Self {
        let physics = &params.physics;
        let tick = &params.tick;
        let radii = &physics.radii;
        Self {
            gravity: physics.gravity.to_array(),
            particle_mass: physics.particle_mass,
            box_size: tick.box_size.to_array(),
            timestep: tick.timestep,
            sphere_pos: tick.sphere_pos.to_array(),
            sphere_radius: tick.sphere_radius,
            viscosity: physics.viscosity,
            gas_constant: physics.gas_constant,
            resting_density: physics.resting_density,
            bound_damping: physics.bound_damping,
            radius: radii.radius,
            radius2: radii.radius2,
            radius3: radii.radius3,
            radius4: radii.radius4,
            radius5: radii.radius5,
            pi: radii.pi,
            particle_count,
            _pad: 0.0,
        }
    }

    pub fn workgroups(&self) -> u32 {
        self.particle_count.div_ceil(WORKGROUP_SIZE)
    }
}
