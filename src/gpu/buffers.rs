use bevy::ecs::error::BevyError;
use bevy::prelude::*;
use bevy::render::render_resource::{
    BindGroup, BindGroupEntry, Buffer, BufferInitDescriptor, BufferUsages,
};
use bevy::render::renderer::{RenderDevice, RenderQueue};
use bevy::render::{Extract, ExtractSchedule, Render, RenderApp, RenderSet};

use crate::config::SimulationConfig;
use crate::debug::draw_debug_view;
use crate::driver::{SimulationDriver, Stage};
use crate::error::SphError;
use crate::gpu::pipeline::{
    SphPipelines, SphPipelinesReady, add_sph_node_to_graph, check_sph_pipelines,
    sph_pipelines_ready,
};
use crate::gpu::substrate::GpuSubstrate;

// ==================== resources ======================================

#[derive(Resource)]
pub struct SphSimulation(pub SimulationDriver<GpuSubstrate>);

/// Moves the collider sphere with its entity. Only the first one found is used.
#[derive(Component, Clone, Copy, Debug)]
pub struct SphereCollider {
    pub radius: f32,
}

#[derive(Resource)]
pub struct ParticleBuffers {
    pub particle_buffer: Buffer,
    pub params_buffer: Buffer,
    pub num_particles: u32,
}

// stages recorded by this frame's step, handed to the render world
#[derive(Resource, Default)]
pub struct PendingDispatch(pub Vec<Stage>);

// Rendering world copies
#[derive(Resource, Clone)]
pub struct ExtractedParticleBuffers {
    pub particle_buffer: Buffer,
    pub params_buffer: Buffer,
    pub num_particles: u32,
}

#[derive(Resource, Clone, Default)]
pub struct ExtractedDispatch(pub Vec<Stage>);

#[derive(Resource)]
pub struct SphBindGroup(pub BindGroup);

// =====================================================================

// ========================== systems ==================================

// Startup systems that have to run only once

fn init_simulation(
    mut commands: Commands,
    config: Option<Res<SimulationConfig>>,
) -> Result<(), BevyError> {
    let config = config.map(|c| (*c).clone()).unwrap_or_default();
    let driver = SimulationDriver::initialize(&config, GpuSubstrate::default())?;
    commands.insert_resource(SphSimulation(driver));
    Ok(())
}

fn init_gpu_buffers(
    mut commands: Commands,
    render_device: Res<RenderDevice>,
    sim: Res<SphSimulation>,
) -> Result<(), BevyError> {
    let Some(uniform) = sim.0.substrate().uniform().copied() else {
        return Err(SphError::MissingResource("sph uniform".into()).into());
    };

    // the only host -> device copy of particle data
    let particle_buffer = render_device.create_buffer_with_data(&BufferInitDescriptor {
        label: Some("sph_particles"),
        contents: sim.0.store().as_bytes(),
        usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
    });
    let params_buffer = render_device.create_buffer_with_data(&BufferInitDescriptor {
        label: Some("sph_params"),
        contents: bytemuck::bytes_of(&uniform),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });

    info!(
        "sph buffers: {} particles, {} bytes",
        uniform.particle_count,
        sim.0.store().as_bytes().len()
    );

    commands.insert_resource(ParticleBuffers {
        particle_buffer,
        params_buffer,
        num_particles: uniform.particle_count,
    });
    Ok(())
}

// Update systems that have to run per frame

fn track_colliders(
    mut sim: ResMut<SphSimulation>,
    colliders: Query<(&SphereCollider, &GlobalTransform)>,
) {
    let Some((collider, transform)) = colliders.iter().next() else {
        return;
    };
    let t = transform.translation();
    if let Err(err) = sim.0.set_collider(glam::Vec3::new(t.x, t.y, t.z), collider.radius) {
        warn_once!("sph collider ignored: {err}");
    }
}

fn step_simulation(
    mut sim: ResMut<SphSimulation>,
    buffers: Option<Res<ParticleBuffers>>,
    render_queue: Res<RenderQueue>,
    mut pending: ResMut<PendingDispatch>,
) -> Result<(), BevyError> {
    let Some(buffers) = buffers else {
        return Ok(());
    };

    let dt = sim.0.params().tick.timestep;
    sim.0.step(dt)?;

    // tick values go up every frame, particles never do
    let frame = sim.0.substrate_mut().take_frame();
    if let Some(uniform) = frame.uniform {
        render_queue.write_buffer(&buffers.params_buffer, 0, bytemuck::bytes_of(&uniform));
    }
    pending.0 = frame.stages;
    Ok(())
}

fn draw_sph_gizmos(mut gizmos: Gizmos, sim: Res<SphSimulation>) {
    draw_debug_view(&mut gizmos, &sim.0.debug_view());
}

// Extract systems that send from App to Render

fn extract_particle_buffers(
    mut commands: Commands,
    buffers: Extract<Option<Res<ParticleBuffers>>>,
) {
    let Some(buffers) = buffers.as_ref() else {
        return;
    };
    commands.insert_resource(ExtractedParticleBuffers {
        particle_buffer: buffers.particle_buffer.clone(),
        params_buffer: buffers.params_buffer.clone(),
        num_particles: buffers.num_particles,
    });
}

fn extract_dispatch(mut commands: Commands, pending: Extract<Res<PendingDispatch>>) {
    commands.insert_resource(ExtractedDispatch(pending.0.clone()));
}

// Systems in Render

fn prepare_sph_bind_group(
    mut commands: Commands,
    render_device: Res<RenderDevice>,
    pipelines: Res<SphPipelines>,
    buffers: Option<Res<ExtractedParticleBuffers>>,
) {
    let Some(buffers) = buffers else {
        return;
    };
    let bind_group = render_device.create_bind_group(
        Some("sph_bind_group"),
        &pipelines.layout,
        &[
            BindGroupEntry {
                binding: 0,
                resource: buffers.particle_buffer.as_entire_binding(),
            },
            BindGroupEntry {
                binding: 1,
                resource: buffers.params_buffer.as_entire_binding(),
            },
        ],
    );
    commands.insert_resource(SphBindGroup(bind_group));
}

// =====================================================================

// Plugin

/// Runs the simulation on the GPU. Reads `SimulationConfig` if present,
/// otherwise starts from the reference setup.
#[derive(Default)]
pub struct GpuSphPlugin {
    pub debug_gizmos: bool,
}

impl Plugin for GpuSphPlugin {
    fn build(&self, app: &mut App) {
        // App
        app.init_resource::<PendingDispatch>()
            .add_systems(Startup, (init_simulation, init_gpu_buffers).chain())
            .add_systems(
                Update,
                (track_colliders, step_simulation.run_if(sph_pipelines_ready)).chain(),
            );
        if self.debug_gizmos {
            app.add_systems(Update, draw_sph_gizmos.after(step_simulation));
        }

        // one flag, shared by both worlds
        let ready = SphPipelinesReady::default();
        app.insert_resource(ready.clone());

        // Render
        let render_app = app.sub_app_mut(RenderApp);
        render_app
            .insert_resource(ready)
            .add_systems(
                ExtractSchedule,
                (extract_particle_buffers, extract_dispatch),
            )
            .add_systems(
                Render,
                (
                    check_sph_pipelines.in_set(RenderSet::Prepare),
                    prepare_sph_bind_group.in_set(RenderSet::PrepareBindGroups),
                ),
            );

        add_sph_node_to_graph(render_app);
    }

    fn finish(&self, app: &mut App) {
        // RenderDevice only exists once the renderer is up
        app.sub_app_mut(RenderApp).init_resource::<SphPipelines>();
    }
}
