use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use sph_fluid::SimulationConfig;
use sph_fluid::gpu::buffers::{GpuSphPlugin, SphSimulation, SphereCollider};

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, FrameTimeDiagnosticsPlugin::default()))
        .insert_resource(ClearColor(Color::Srgba(
            bevy::color::palettes::css::DARK_SLATE_GRAY,
        )))
        // 10k particles, one dispatch group per 100
        .insert_resource(
            SimulationConfig::default()
                .with_spawn(glam::UVec3::new(25, 20, 20), glam::Vec3::new(-1.2, -1.0, -1.0)),
        )
        .add_plugins(GpuSphPlugin { debug_gizmos: true })
        .add_systems(Startup, setup)
        .add_systems(Update, (orbit_collider, log_fps))
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 1.0, 9.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        Transform::from_xyz(0.0, -3.0, 0.0),
        SphereCollider { radius: 0.6 },
    ));
}

fn orbit_collider(time: Res<Time>, mut query: Query<&mut Transform, With<SphereCollider>>) {
    let angle = time.elapsed_secs() * 0.8;
    for mut transform in &mut query {
        transform.translation = Vec3::new(1.2 * angle.sin(), -3.0, 0.8 * angle.cos());
    }
}

fn log_fps(
    diagnostics: Res<DiagnosticsStore>,
    sim: Option<Res<SphSimulation>>,
    mut frames: Local<u32>,
) {
    *frames += 1;
    if *frames % 120 != 0 {
        return;
    }
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|d| d.smoothed())
        .unwrap_or(0.0);
    let steps = sim.map(|s| s.0.steps()).unwrap_or(0);
    info!("fps {fps:.1}, {steps} sph steps dispatched");
}
