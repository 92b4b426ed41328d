use glam::Vec3;
use rayon::prelude::*;

use crate::boundary;
use crate::config::SimulationConfig;
use crate::cpu::kernels::{DENSITY_EPSILON, poly6, spiky_gradient, viscosity_laplacian};
use crate::cpu::neighbors::NeighborGrid;
use crate::driver::{ComputeSubstrate, Stage};
use crate::error::SphError;
use crate::params::SphParams;
use crate::particle::Particle;

/// Runs the three stages on the CPU with rayon. Each rayon job covers at least
/// `group_width` particles, the same grouping a GPU dispatch would use.
///
/// Density and forces read from the particles as they were when the stage
/// started and write into a side buffer that is committed afterwards, so no
/// particle ever sees a neighbour's half-finished update.
pub struct CpuSubstrate {
    group_width: usize,
    grid: Option<NeighborGrid>,
}

impl CpuSubstrate {
    pub fn new(group_width: usize) -> Self {
        Self {
            group_width,
            grid: None,
        }
    }

    /// Groups particles the way `config.group_width` asks for.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.group_width as usize)
    }

    fn density_pressure(&mut self, particles: &mut [Particle], params: &SphParams) {
        let physics = &params.physics;
        let radii = &physics.radii;

        // positions only change in integration, so the grid is reused by the force stage
        let grid = NeighborGrid::build(particles, radii.radius);
        let snapshot: &[Particle] = particles;

        let rho_p: Vec<(f32, f32)> = (0..snapshot.len())
            .into_par_iter()
            .with_min_len(self.group_width)
            .map(|i| {
                let origin = snapshot[i].position();
                let mut sum = 0.0;
                grid.for_each_candidate(origin, |j| {
                    let d2 = (origin - snapshot[j].position()).length_squared();
                    sum += poly6(d2, radii);
                });
                let density = sum * physics.particle_mass + DENSITY_EPSILON;
                let pressure = physics.gas_constant * (density - physics.resting_density);
                (density, pressure)
            })
            .collect();

        for (p, (density, pressure)) in particles.iter_mut().zip(rho_p) {
            p.density = density;
            p.pressure = pressure;
        }
        self.grid = Some(grid);
    }

    fn forces(&mut self, particles: &mut [Particle], params: &SphParams) {
        let physics = &params.physics;
        let radii = &physics.radii;
        let grid = match self.grid.take() {
            Some(grid) => grid,
            None => NeighborGrid::build(particles, radii.radius),
        };
        let snapshot: &[Particle] = particles;
        let mass2 = physics.particle_mass * physics.particle_mass;

        let forces: Vec<Vec3> = (0..snapshot.len())
            .into_par_iter()
            .with_min_len(self.group_width)
            .map(|i| {
                let pi = &snapshot[i];
                let origin = pi.position();
                let vel_i = pi.velocity();
                let pressure_term_i = pi.pressure / (pi.density * pi.density);

                let mut pressure = Vec3::ZERO;
                let mut visc = Vec3::ZERO;
                grid.for_each_candidate(origin, |j| {
                    if i == j {
                        return;
                    }
                    let pj = &snapshot[j];
                    let r = origin - pj.position();
                    let dist = r.length();
                    if dist >= radii.radius || dist == 0.0 {
                        return;
                    }
                    let dir = r / dist;

                    // pressure gradient, symmetric form
                    let pressure_term_j = pj.pressure / (pj.density * pj.density);
                    pressure += mass2
                        * spiky_gradient(dist, dir, radii)
                        * (pressure_term_i + pressure_term_j);

                    // viscous diffusion towards the neighbour's velocity
                    visc += physics.viscosity * mass2 * (pj.velocity() - vel_i) / pj.density
                        * viscosity_laplacian(dist, radii);
                });

                physics.gravity * physics.particle_mass - pressure + visc
            })
            .collect();

        for (p, f) in particles.iter_mut().zip(forces) {
            p.set_force(f);
        }
    }

    fn integrate(&self, particles: &mut [Particle], params: &SphParams) {
        let dt = params.tick.timestep;
        particles
            .par_iter_mut()
            .with_min_len(self.group_width)
            .for_each(|p| {
                let mut vel = p.velocity() + p.force() / p.density * dt;
                let mut pos = p.position() + vel * dt;
                boundary::apply(&mut pos, &mut vel, params);
                p.set_velocity(vel);
                p.set_position(pos);
            });
    }
}

impl ComputeSubstrate for CpuSubstrate {
    fn group_width(&self) -> usize {
        self.group_width
    }

    fn run_stage(
        &mut self,
        stage: Stage,
        particles: &mut [Particle],
        params: &SphParams,
    ) -> Result<(), SphError> {
        match stage {
            Stage::DensityPressure => self.density_pressure(particles, params),
            Stage::Forces => self.forces(particles, params),
            Stage::Integrate => {
                // a zero density would turn the whole step into NaNs
                if particles.iter().any(|p| !(p.density > 0.0)) {
                    return Err(SphError::Dispatch {
                        stage,
                        reason: "integration before density was computed".into(),
                    });
                }
                self.integrate(particles, params)
            }
        }
        Ok(())
    }
}
