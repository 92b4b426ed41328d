use crate::driver::{ComputeSubstrate, Stage};
use crate::error::SphError;
use crate::gpu::ffi::{GpuSimParams, WORKGROUP_SIZE};
use crate::params::{SphParams, TickParams};
use crate::particle::Particle;

/// Main-world side of the GPU path. It never touches particle data after the
/// upload: stages are recorded here and dispatched by the render graph, and the
/// GPU copy stays authoritative (no readback).
#[derive(Default)]
pub struct GpuSubstrate {
    uniform: Option<GpuSimParams>,
    pending: Vec<Stage>,
}

/// Everything the render world needs for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GpuFrame {
    pub uniform: Option<GpuSimParams>,
    pub stages: Vec<Stage>,
}

impl GpuSubstrate {
    pub fn uniform(&self) -> Option<&GpuSimParams> {
        self.uniform.as_ref()
    }

    /// Hands over the stages recorded since the last call. The uniform is kept
    /// so later frames still see the latest tick values.
    pub fn take_frame(&mut self) -> GpuFrame {
        GpuFrame {
            uniform: self.uniform,
            stages: std::mem::take(&mut self.pending),
        }
    }
}

impl ComputeSubstrate for GpuSubstrate {
    fn group_width(&self) -> usize {
        WORKGROUP_SIZE as usize
    }

    fn upload(&mut self, particles: &[Particle], params: &SphParams) -> Result<(), SphError> {
        let count = u32::try_from(particles.len())
            .map_err(|_| SphError::invalid("particle_count", "does not fit a u32 dispatch"))?;
        self.uniform = Some(GpuSimParams::new(params, count));
        Ok(())
    }

    fn push_tick(&mut self, tick: &TickParams) -> Result<(), SphError> {
        let Some(uniform) = self.uniform.as_mut() else {
            return Err(SphError::MissingResource("sph uniform (upload never ran)".into()));
        };
        uniform.box_size = tick.box_size.to_array();
        uniform.timestep = tick.timestep;
        uniform.sphere_pos = tick.sphere_pos.to_array();
        uniform.sphere_radius = tick.sphere_radius;
        Ok(())
    }

    fn run_stage(
        &mut self,
        stage: Stage,
        particles: &mut [Particle],
        _params: &SphParams,
    ) -> Result<(), SphError> {
        let expected = self.uniform.map(|u| u.particle_count as usize);
        if expected != Some(particles.len()) {
            return Err(SphError::Dispatch {
                stage,
                reason: format!(
                    "{} particles on the host, {:?} on the device",
                    particles.len(),
                    expected
                ),
            });
        }
        self.pending.push(stage);
        Ok(())
    }
}
