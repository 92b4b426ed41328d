/* node layout follows bevy's compute_shader_game_of_life example, one compute
pass per stage so every stage sees the previous one fully written */

use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bevy::ecs::error::BevyError;
use bevy::prelude::*;
use bevy::render::graph::CameraDriverLabel;
use bevy::render::render_graph::{
    Node, NodeRunError, RenderGraph, RenderGraphContext, RenderLabel,
};
use bevy::render::render_resource::{
    BindGroupLayout, BindGroupLayoutEntry, BindingType, BufferBindingType,
    CachedComputePipelineId, CachedPipelineState, ComputePassDescriptor,
    ComputePipelineDescriptor, PipelineCache, PushConstantRange, ShaderDefVal, ShaderStages,
};
use bevy::render::renderer::{RenderContext, RenderDevice};

use crate::driver::Stage;
use crate::error::SphError;
use crate::gpu::buffers::{ExtractedDispatch, ExtractedParticleBuffers, SphBindGroup};
use crate::gpu::ffi::WORKGROUP_SIZE;

pub const SHADER_ASSET_PATH: &str = "shaders/sph.wgsl";

#[derive(Resource)]
pub struct SphPipelines {
    pub layout: BindGroupLayout,
    pub stages: [(Stage, CachedComputePipelineId); 3],
}

impl FromWorld for SphPipelines {
    fn from_world(world: &mut World) -> Self {
        let render_device = world.resource::<RenderDevice>();
        // 0 = particles (rw storage), 1 = sim params (uniform)
        let layout = render_device.create_bind_group_layout(
            Some("sph_bind_group_layout"),
            &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::COMPUTE,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::COMPUTE,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        );

        let shader: Handle<Shader> = world.resource::<AssetServer>().load(SHADER_ASSET_PATH);
        let pipeline_cache = world.resource::<PipelineCache>();

        let stages = Stage::PIPELINE.map(|stage| {
            let desc = ComputePipelineDescriptor {
                label: Some(format!("sph_{}_pipeline", stage.entry_point()).into()),
                layout: vec![layout.clone()],
                push_constant_ranges: Vec::<PushConstantRange>::new(),
                shader: shader.clone(),
                shader_defs: Vec::<ShaderDefVal>::new(),
                entry_point: Cow::from(stage.entry_point()),
                zero_initialize_workgroup_memory: false,
            };
            (stage, pipeline_cache.queue_compute_pipeline(desc))
        });

        Self { layout, stages }
    }
}

/// Set by the render world once all three kernels compiled. The same flag sits
/// in the main world so the simulation does not step into dropped frames.
#[derive(Resource, Clone, Default)]
pub struct SphPipelinesReady(Arc<AtomicBool>);

impl SphPipelinesReady {
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn mark_ready(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Run condition for main world systems that must wait for the kernels.
pub fn sph_pipelines_ready(ready: Option<Res<SphPipelinesReady>>) -> bool {
    ready.is_some_and(|r| r.get())
}

/// A kernel that fails to compile stops the app; there is no CPU fallback.
pub fn check_sph_pipelines(
    pipelines: Res<SphPipelines>,
    cache: Res<PipelineCache>,
    ready: Res<SphPipelinesReady>,
) -> Result<(), BevyError> {
    if ready.get() {
        return Ok(());
    }

    let mut all_ok = true;
    for &(stage, id) in &pipelines.stages {
        match cache.get_compute_pipeline_state(id) {
            CachedPipelineState::Ok(_) => {}
            CachedPipelineState::Err(err) => {
                error!("sph {} pipeline ERROR: {err:?}", stage.entry_point());
                return Err(SphError::MissingResource(format!(
                    "compute kernel `{}` in {SHADER_ASSET_PATH}",
                    stage.entry_point()
                ))
                .into());
            }
            _ => all_ok = false,
        }
    }

    if all_ok {
        info!("sph pipelines READY");
        ready.mark_ready();
    }
    Ok(())
}

#[derive(Debug, Hash, PartialEq, Eq, Clone, RenderLabel)]
pub struct SphPassLabel;

#[derive(Default)]
struct SphNode;

impl Node for SphNode {
    fn run(
        &self,
        _graph: &mut RenderGraphContext,
        render_context: &mut RenderContext,
        world: &World,
    ) -> Result<(), NodeRunError> {
        let Some(pipelines) = world.get_resource::<SphPipelines>() else { return Ok(()); };
        let Some(bind_group) = world.get_resource::<SphBindGroup>() else { return Ok(()); };
        let Some(buffers) = world.get_resource::<ExtractedParticleBuffers>() else { return Ok(()); };
        let Some(dispatch) = world.get_resource::<ExtractedDispatch>() else { return Ok(()); };
        if dispatch.0.is_empty() || buffers.num_particles == 0 {
            return Ok(());
        }

        // all three kernels or nothing, a half step would corrupt the particles
        let cache = world.resource::<PipelineCache>();
        let mut compiled = Vec::with_capacity(pipelines.stages.len());
        for &(stage, id) in &pipelines.stages {
            let Some(pipeline) = cache.get_compute_pipeline(id) else { return Ok(()); };
            compiled.push((stage, pipeline));
        }

        let workgroups = buffers.num_particles.div_ceil(WORKGROUP_SIZE);

        for &stage in &dispatch.0 {
            let Some(&(_, pipeline)) = compiled.iter().find(|(s, _)| *s == stage) else {
                continue;
            };
            let mut pass = render_context
                .command_encoder()
                .begin_compute_pass(&ComputePassDescriptor {
                    label: Some(stage.entry_point()),
                    timestamp_writes: None,
                });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group.0, &[]);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }

        Ok(())
    }
}

pub fn add_sph_node_to_graph(render_app: &mut bevy::app::SubApp) {
    let mut graph = render_app.world_mut().resource_mut::<RenderGraph>();
    graph.add_node(SphPassLabel, SphNode::default());
    graph.add_node_edge(SphPassLabel, CameraDriverLabel);
}
