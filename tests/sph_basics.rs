use glam::{UVec3, Vec3};
use sph_fluid::particle::PARTICLE_SIZE;
use sph_fluid::spawner::Spawner;
use sph_fluid::{Particle, ParticleStore, SimulationConfig, SphError};

fn spawner(counts: UVec3, radius: f32, jitter: f32, seed: u64) -> Spawner {
    Spawner {
        counts,
        origin: Vec3::ZERO,
        particle_radius: radius,
        jitter,
        seed,
    }
}

#[test]
fn spawn_count_and_zeroed_fields() {
    let s = Spawner {
        origin: Vec3::new(-1.0, 0.5, 2.0),
        ..spawner(UVec3::new(3, 4, 5), 0.1, 0.5, 7)
    };
    let particles = s.spawn().unwrap();
    assert_eq!(particles.len(), 60); // 3 * 4 * 5

    for (i, p) in particles.iter().enumerate() {
        assert_eq!(p.pressure, 0.0);
        assert_eq!(p.density, 0.0);
        assert_eq!(p.current_force, [0.0; 3]);
        assert_eq!(p.velocity, [0.0; 3]);

        // x outer, y middle, z inner
        let (x, y, z) = (i / 20, (i / 5) % 4, i % 5);
        let nominal = s.origin + Vec3::new(x as f32, y as f32, z as f32) * 0.2;
        let offset = (p.position() - nominal).length();
        assert!(offset <= 0.1 * 0.5 + 1e-5, "particle {i} moved {offset}");
    }
}

#[test]
fn two_by_two_cube_without_jitter() {
    let particles = spawner(UVec3::splat(2), 0.1, 0.0, 0).spawn().unwrap();
    let expected = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 0.2),
        Vec3::new(0.0, 0.2, 0.0),
        Vec3::new(0.0, 0.2, 0.2),
        Vec3::new(0.2, 0.0, 0.0),
        Vec3::new(0.2, 0.0, 0.2),
        Vec3::new(0.2, 0.2, 0.0),
        Vec3::new(0.2, 0.2, 0.2),
    ];
    assert_eq!(particles.len(), 8);
    for (p, e) in particles.iter().zip(expected) {
        assert!((p.position() - e).length() < 1e-6);
        assert_eq!(p.velocity(), Vec3::ZERO);
    }
}

#[test]
fn same_seed_same_positions() {
    let a = spawner(UVec3::new(4, 4, 4), 0.05, 1.0, 42).spawn().unwrap();
    let b = spawner(UVec3::new(4, 4, 4), 0.05, 1.0, 42).spawn().unwrap();
    let c = spawner(UVec3::new(4, 4, 4), 0.05, 1.0, 43).spawn().unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn zero_axis_is_rejected() {
    let err = spawner(UVec3::new(4, 0, 4), 0.1, 0.0, 0).spawn().unwrap_err();
    assert_eq!(err, SphError::InvalidSpawnCount([4, 0, 4]));
}

#[test]
fn particle_is_44_packed_bytes() {
    assert_eq!(std::mem::size_of::<Particle>(), PARTICLE_SIZE);

    let p = Particle {
        pressure: 1.0,
        density: 2.0,
        current_force: [3.0, 4.0, 5.0],
        velocity: [6.0, 7.0, 8.0],
        position: [9.0, 10.0, 11.0],
    };
    let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&p));
    assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
}

#[test]
fn store_is_fixed_capacity() {
    let mut store = ParticleStore::with_capacity(8).unwrap();
    assert_eq!(store.len(), 8);
    assert!(store.read_all().iter().all(|p| *p == Particle::default()));
    assert_eq!(store.as_bytes().len(), 8 * PARTICLE_SIZE);

    store.write(3, Particle::at(Vec3::ONE)).unwrap();
    assert_eq!(store.read_all()[3].position(), Vec3::ONE);
    assert_eq!(store.positions().nth(3), Some(Vec3::ONE));

    assert_eq!(
        store.write(8, Particle::default()),
        Err(SphError::IndexOutOfRange { index: 8, capacity: 8 })
    );
    assert_eq!(
        store.fill(&[Particle::default(); 4]),
        Err(SphError::CapacityMismatch { got: 4, capacity: 8 })
    );
    assert_eq!(store.capacity(), 8);
}

#[test]
fn config_validation() {
    assert!(SimulationConfig::default().validate().is_ok());

    let odd = SimulationConfig::default().with_spawn(UVec3::new(3, 3, 3), Vec3::ZERO);
    assert_eq!(
        odd.validate(),
        Err(SphError::GroupWidthMismatch { count: 27, width: 100 })
    );
    assert!(odd.clone().with_group_width(27).validate().is_ok());

    let flat = SimulationConfig::default().with_box(Vec3::new(4.0, 0.0, 3.0));
    assert!(matches!(
        flat.validate(),
        Err(SphError::InvalidParameter { name: "box_size", .. })
    ));

    let mut bad_dt = SimulationConfig::default();
    bad_dt.timestep = 0.0;
    assert!(matches!(
        bad_dt.validate(),
        Err(SphError::InvalidParameter { name: "timestep", .. })
    ));
}

#[test]
fn radius_powers_are_cached() {
    let params = SimulationConfig::default().params();
    let k = params.physics.radii;
    assert_eq!(k.radius, 0.1);
    let close = |a: f32, b: f32| ((a - b) / b).abs() < 1e-5;
    assert!(close(k.radius2, 1e-2));
    assert!(close(k.radius3, 1e-3));
    assert!(close(k.radius4, 1e-4));
    assert!(close(k.radius5, 1e-5));
    assert_eq!(k.pi, std::f32::consts::PI);
}
