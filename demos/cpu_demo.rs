use bevy::ecs::error::BevyError;
use bevy::prelude::*;
use sph_fluid::debug::{draw_debug_view, to_bevy};
use sph_fluid::{CpuSubstrate, SimulationConfig, SimulationDriver, SphError};

#[derive(Resource)]
struct Sim(SimulationDriver<CpuSubstrate>);

#[derive(Component)]
struct ParticleVisual(usize);

#[derive(Component)]
struct Collider {
    radius: f32,
    speed: f32, // radians per second
}

const RENDER_RADIUS: f32 = 0.04;
const COLLIDER_RADIUS: f32 = 0.6;

fn main() -> Result<(), SphError> {
    let config = SimulationConfig::default()
        .with_collider(glam::Vec3::new(0.0, -3.0, 0.0), COLLIDER_RADIUS);
    let sim = SimulationDriver::initialize(&config, CpuSubstrate::from_config(&config))?;

    App::new()
        .add_plugins(DefaultPlugins)
        .insert_resource(Sim(sim))
        .insert_resource(config)
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (move_collider, sph_step, sync_particles, draw_overlay).chain(),
        )
        .run();
    Ok(())
}

fn setup(
    mut commands: Commands,
    sim: Res<Sim>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 1.0, 9.0).looking_at(Vec3::new(0.0, -1.5, 0.0), Vec3::Y),
    ));
    commands.spawn((
        PointLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0),
    ));

    // one shared mesh, one entity per particle
    let mesh = meshes.add(Sphere::new(RENDER_RADIUS));
    let water = materials.add(Color::srgb(0.0, 0.6, 1.0));
    for (i, p) in sim.0.particles().iter().enumerate() {
        commands.spawn((
            Mesh3d(mesh.clone()),
            MeshMaterial3d(water.clone()),
            Transform::from_translation(to_bevy(p.position())),
            ParticleVisual(i),
        ));
    }

    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(COLLIDER_RADIUS))),
        MeshMaterial3d(materials.add(Color::srgb(1.0, 0.5, 0.0))),
        Transform::from_xyz(0.0, -3.0, 0.0),
        Collider {
            radius: COLLIDER_RADIUS,
            speed: 0.8,
        },
    ));
}

fn move_collider(
    time: Res<Time>,
    mut sim: ResMut<Sim>,
    mut query: Query<(&Collider, &mut Transform)>,
) -> Result<(), BevyError> {
    for (collider, mut transform) in &mut query {
        let angle = time.elapsed_secs() * collider.speed;
        transform.translation = Vec3::new(1.2 * angle.sin(), -3.0, 0.8 * angle.cos());
        let t = transform.translation;
        sim.0
            .set_collider(glam::Vec3::new(t.x, t.y, t.z), collider.radius)?;
    }
    Ok(())
}

fn sph_step(mut sim: ResMut<Sim>, config: Res<SimulationConfig>) -> Result<(), BevyError> {
    sim.0.step(config.timestep)?;
    Ok(())
}

fn sync_particles(sim: Res<Sim>, mut query: Query<(&ParticleVisual, &mut Transform)>) {
    let particles = sim.0.particles();
    for (visual, mut transform) in query.iter_mut() {
        transform.translation = to_bevy(particles[visual.0].position());
    }
}

fn draw_overlay(mut gizmos: Gizmos, sim: Res<Sim>) {
    draw_debug_view(&mut gizmos, &sim.0.debug_view());
}
