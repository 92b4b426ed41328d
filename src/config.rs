use bevy::prelude::Resource;
use glam::{UVec3, Vec3};

use crate::error::{SphError, positive};
use crate::params::{KernelRadii, PhysicsParams, SphParams, TickParams};
use crate::spawner::Spawner;

pub const DEFAULT_GROUP_WIDTH: u32 = 100;

/// Everything needed to start a run. `Default` gives the reference setup:
/// 1000 particles dropped into a 4 x 10 x 3 box.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    // spawning
    pub spawn_counts: UVec3,
    pub spawn_origin: Vec3,
    pub particle_radius: f32,
    pub jitter: f32,
    pub seed: u64,

    // physics
    pub smoothing_radius: f32,
    pub particle_mass: f32,
    pub viscosity: f32,
    pub gas_constant: f32,
    pub resting_density: f32,
    pub bound_damping: f32,
    pub gravity: Vec3,

    // per tick
    pub timestep: f32,
    pub box_size: Vec3,
    pub sphere_pos: Vec3,
    pub sphere_radius: f32,

    pub group_width: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            spawn_counts: UVec3::splat(10),
            spawn_origin: Vec3::new(-0.5, 0.0, -0.5),
            particle_radius: 0.05,
            jitter: 0.2,
            seed: 0,

            smoothing_radius: 0.1,
            particle_mass: 1.0,
            viscosity: -0.003,
            gas_constant: 2.0,
            resting_density: 1.0,
            bound_damping: -0.3,
            gravity: Vec3::new(0.0, -9.81, 0.0),

            timestep: 0.007,
            box_size: Vec3::new(4.0, 10.0, 3.0),
            sphere_pos: Vec3::ZERO,
            sphere_radius: 0.0,

            group_width: DEFAULT_GROUP_WIDTH,
        }
    }
}

impl SimulationConfig {
    pub fn with_spawn(mut self, counts: UVec3, origin: Vec3) -> Self {
        self.spawn_counts = counts;
        self.spawn_origin = origin;
        self
    }

    pub fn with_particle_radius(mut self, radius: f32, jitter: f32) -> Self {
        self.particle_radius = radius;
        self.jitter = jitter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_box(mut self, box_size: Vec3) -> Self {
        self.box_size = box_size;
        self
    }

    pub fn with_collider(mut self, pos: Vec3, radius: f32) -> Self {
        self.sphere_pos = pos;
        self.sphere_radius = radius;
        self
    }

    pub fn with_group_width(mut self, width: u32) -> Self {
        self.group_width = width;
        self
    }

    pub fn particle_count(&self) -> usize {
        self.spawn_counts.x as usize * self.spawn_counts.y as usize * self.spawn_counts.z as usize
    }

    /// Rejects anything the substrate cannot run. Called by the driver before
    /// a single particle is allocated.
    pub fn validate(&self) -> Result<(), SphError> {
        let c = self.spawn_counts;
        if c.x == 0 || c.y == 0 || c.z == 0 {
            return Err(SphError::InvalidSpawnCount(c.to_array()));
        }
        if self.group_width == 0 {
            return Err(SphError::invalid("group_width", "must be positive"));
        }
        let count = self.particle_count();
        let width = self.group_width as usize;
        if count % width != 0 {
            return Err(SphError::GroupWidthMismatch { count, width });
        }

        positive("smoothing_radius", self.smoothing_radius)?;
        positive("particle_radius", self.particle_radius)?;
        positive("particle_mass", self.particle_mass)?;
        if !(self.jitter >= 0.0) {
            return Err(SphError::invalid("jitter", "must be zero or positive"));
        }
        self.params().tick.validate()?;
        if !(-1.0..=0.0).contains(&self.bound_damping) {
            return Err(SphError::invalid("bound_damping", "expected a value in [-1, 0]"));
        }
        Ok(())
    }

    pub fn spawner(&self) -> Spawner {
        Spawner {
            counts: self.spawn_counts,
            origin: self.spawn_origin,
            particle_radius: self.particle_radius,
            jitter: self.jitter,
            seed: self.seed,
        }
    }

    pub fn params(&self) -> SphParams {
        SphParams {
            physics: PhysicsParams {
                particle_mass: self.particle_mass,
                viscosity: self.viscosity,
                gas_constant: self.gas_constant,
                resting_density: self.resting_density,
                bound_damping: self.bound_damping,
                gravity: self.gravity,
                radii: KernelRadii::new(self.smoothing_radius),
            },
            tick: TickParams {
                box_size: self.box_size,
                timestep: self.timestep,
                sphere_pos: self.sphere_pos,
                sphere_radius: self.sphere_radius,
            },
        }
    }
}

