use bevy::log::{debug, error, info};
use glam::Vec3;

use crate::config::SimulationConfig;
use crate::error::SphError;
use crate::params::{SphParams, TickParams};
use crate::particle::{Particle, ParticleStore};

/// The three passes of a step, in dispatch order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    DensityPressure,
    Forces,
    Integrate,
}

impl Stage {
    pub const PIPELINE: [Stage; 3] = [Stage::DensityPressure, Stage::Forces, Stage::Integrate];

    // entry point names of the compute kernels
    pub fn entry_point(self) -> &'static str {
        match self {
            Stage::DensityPressure => "compute_density_pressure",
            Stage::Forces => "compute_forces",
            Stage::Integrate => "integrate",
        }
    }
}

/// Whatever actually runs the per-particle math. `run_stage` must not return
/// until the stage has finished for every particle; that return is the barrier
/// the next stage relies on.
pub trait ComputeSubstrate {
    fn group_width(&self) -> usize;

    /// Called once with the spawned particles before the first step.
    fn upload(&mut self, _particles: &[Particle], _params: &SphParams) -> Result<(), SphError> {
        Ok(())
    }

    /// Called before the first stage of every step with the values that may
    /// change between ticks.
    fn push_tick(&mut self, _tick: &TickParams) -> Result<(), SphError> {
        Ok(())
    }

    fn run_stage(
        &mut self,
        stage: Stage,
        particles: &mut [Particle],
        params: &SphParams,
    ) -> Result<(), SphError>;
}

/// Snapshot for overlays and logging.
#[derive(Clone, Debug, PartialEq)]
pub struct DebugView {
    pub particle_count: usize,
    pub steps: u64,
    pub box_size: Vec3,
    pub sphere_pos: Vec3,
    pub sphere_radius: f32,
    pub min_density: f32,
    pub max_density: f32,
    pub max_speed: f32,
    pub kinetic_energy: f32,
    pub faulted: bool,
}

pub struct SimulationDriver<S: ComputeSubstrate> {
    store: ParticleStore,
    params: SphParams,
    substrate: S,
    steps: u64,
    faulted: bool,
}

impl<S: ComputeSubstrate> SimulationDriver<S> {
    pub fn initialize(config: &SimulationConfig, mut substrate: S) -> Result<Self, SphError> {
        config.validate()?;

        let count = config.particle_count();
        let width = substrate.group_width();
        if width == 0 || count % width != 0 {
            return Err(SphError::GroupWidthMismatch { count, width });
        }
        if width != config.group_width as usize {
            return Err(SphError::SubstrateWidthMismatch {
                configured: config.group_width as usize,
                substrate: width,
            });
        }

        let spawned = config.spawner().spawn()?;
        let mut store = ParticleStore::with_capacity(count)?;
        store.fill(&spawned)?;

        let params = config.params();
        substrate.upload(store.read_all(), &params)?;

        info!(
            "sph: {} particles ({}x{}x{}), h = {}, group width {}",
            count,
            config.spawn_counts.x,
            config.spawn_counts.y,
            config.spawn_counts.z,
            config.smoothing_radius,
            width
        );

        Ok(Self {
            store,
            params,
            substrate,
            steps: 0,
            faulted: false,
        })
    }

    /// Advances one fixed step of length `dt`. A bad `dt` is rejected before
    /// anything is pushed and does not fault the driver.
    pub fn step(&mut self, dt: f32) -> Result<(), SphError> {
        if self.faulted {
            return Err(SphError::Faulted);
        }
        self.update_tick(|tick| tick.timestep = dt)?;

        if let Err(err) = self.substrate.push_tick(&self.params.tick) {
            self.faulted = true;
            error!("sph step {} could not push tick parameters: {err}", self.steps);
            return Err(err);
        }

        for stage in Stage::PIPELINE {
            if let Err(err) = self
                .substrate
                .run_stage(stage, self.store.as_mut_slice(), &self.params)
            {
                // state now mixes two stages, nothing after this is trustworthy
                self.faulted = true;
                error!("sph step {} aborted: {err}", self.steps);
                return Err(err);
            }
        }

        self.steps += 1;
        if self.steps % 500 == 0 {
            debug!("sph step {}: ke = {:.4}", self.steps, self.kinetic_energy());
        }
        Ok(())
    }

    pub fn step_n(&mut self, n: usize) -> Result<(), SphError> {
        let dt = self.params.tick.timestep;
        for _ in 0..n {
            self.step(dt)?;
        }
        Ok(())
    }

    pub fn set_box_size(&mut self, box_size: Vec3) -> Result<(), SphError> {
        self.update_tick(|tick| tick.box_size = box_size)
    }

    /// A radius of 0 switches the collider off.
    pub fn set_collider(&mut self, pos: Vec3, radius: f32) -> Result<(), SphError> {
        self.update_tick(|tick| {
            tick.sphere_pos = pos;
            tick.sphere_radius = radius;
        })
    }

    // the old values stay in place when the new ones are rejected
    fn update_tick(&mut self, f: impl FnOnce(&mut TickParams)) -> Result<(), SphError> {
        let mut tick = self.params.tick;
        f(&mut tick);
        tick.validate()?;
        self.params.tick = tick;
        Ok(())
    }

    pub fn params(&self) -> &SphParams {
        &self.params
    }

    pub fn particles(&self) -> &[Particle] {
        self.store.read_all()
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    pub fn substrate_mut(&mut self) -> &mut S {
        &mut self.substrate
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub fn kinetic_energy(&self) -> f32 {
        let m = self.params.physics.particle_mass;
        self.store
            .read_all()
            .iter()
            .map(|p| 0.5 * m * p.velocity().length_squared())
            .sum()
    }

    /// Gravitational potential energy measured from `floor_y`.
    pub fn potential_energy(&self, floor_y: f32) -> f32 {
        let m = self.params.physics.particle_mass;
        let g = self.params.physics.gravity.length();
        self.store
            .read_all()
            .iter()
            .map(|p| m * g * (p.position[1] - floor_y))
            .sum()
    }

    pub fn debug_view(&self) -> DebugView {
        let (mut min_density, mut max_density, mut max_speed) = (f32::MAX, f32::MIN, 0.0f32);
        for p in self.store.read_all() {
            min_density = min_density.min(p.density);
            max_density = max_density.max(p.density);
            max_speed = max_speed.max(p.velocity().length());
        }
        if self.store.is_empty() {
            min_density = 0.0;
            max_density = 0.0;
        }

        DebugView {
            particle_count: self.store.len(),
            steps: self.steps,
            box_size: self.params.tick.box_size,
            sphere_pos: self.params.tick.sphere_pos,
            sphere_radius: self.params.tick.sphere_radius,
            min_density,
            max_density,
            max_speed,
            kinetic_energy: self.kinetic_energy(),
            faulted: self.faulted,
        }
    }
}
