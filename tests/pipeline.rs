use glam::{UVec3, Vec3};
use sph_fluid::cpu::kernels::{DENSITY_EPSILON, poly6};
use sph_fluid::params::{SphParams, TickParams};
use sph_fluid::{
    ComputeSubstrate, CpuSubstrate, Particle, SimulationConfig, SimulationDriver, SphError, Stage,
};

// records what the driver asks for, then defers to the CPU path
struct Recording {
    inner: CpuSubstrate,
    stages: Vec<Stage>,
    ticks: Vec<TickParams>,
    fail_at: Option<(usize, Stage)>,
}

impl Recording {
    fn new(width: usize) -> Self {
        Self {
            inner: CpuSubstrate::new(width),
            stages: Vec::new(),
            ticks: Vec::new(),
            fail_at: None,
        }
    }
}

impl ComputeSubstrate for Recording {
    fn group_width(&self) -> usize {
        self.inner.group_width()
    }

    fn push_tick(&mut self, tick: &TickParams) -> Result<(), SphError> {
        self.ticks.push(*tick);
        Ok(())
    }

    fn run_stage(
        &mut self,
        stage: Stage,
        particles: &mut [Particle],
        params: &SphParams,
    ) -> Result<(), SphError> {
        if self.fail_at == Some((self.ticks.len(), stage)) {
            return Err(SphError::Dispatch {
                stage,
                reason: "out of device memory".into(),
            });
        }
        self.stages.push(stage);
        self.inner.run_stage(stage, particles, params)
    }
}

fn small_config() -> SimulationConfig {
    SimulationConfig::default()
        .with_spawn(UVec3::new(5, 4, 5), Vec3::new(-0.2, 0.0, -0.2))
        .with_group_width(20)
}

#[test]
fn zero_steps_leave_spawn_untouched() {
    let config = small_config();
    let driver = SimulationDriver::initialize(&config, CpuSubstrate::new(20)).unwrap();
    let spawned = config.spawner().spawn().unwrap();
    assert_eq!(driver.particles(), spawned.as_slice());
    assert_eq!(driver.steps(), 0);
}

#[test]
fn stages_run_in_order_after_tick_push() {
    let config = small_config();
    let mut driver = SimulationDriver::initialize(&config, Recording::new(20)).unwrap();

    driver.step(0.005).unwrap();
    driver.set_box_size(Vec3::new(3.0, 8.0, 3.0)).unwrap();
    driver.set_collider(Vec3::new(0.0, -1.0, 0.0), 0.5).unwrap();
    driver.step(0.004).unwrap();

    let rec = driver.substrate();
    assert_eq!(rec.stages, [Stage::PIPELINE, Stage::PIPELINE].concat());
    assert_eq!(rec.ticks.len(), 2);
    assert_eq!(rec.ticks[0].timestep, 0.005);
    assert_eq!(rec.ticks[0].box_size, Vec3::new(4.0, 10.0, 3.0));
    assert_eq!(rec.ticks[1].timestep, 0.004);
    assert_eq!(rec.ticks[1].box_size, Vec3::new(3.0, 8.0, 3.0));
    assert_eq!(rec.ticks[1].sphere_radius, 0.5);
    assert_eq!(driver.steps(), 2);
}

#[test]
fn failed_dispatch_halts_the_driver() {
    let config = small_config();
    let mut rec = Recording::new(20);
    // second step, force stage
    rec.fail_at = Some((2, Stage::Forces));
    let mut driver = SimulationDriver::initialize(&config, rec).unwrap();

    driver.step(0.007).unwrap();
    let err = driver.step(0.007).unwrap_err();
    assert!(matches!(err, SphError::Dispatch { stage: Stage::Forces, .. }));
    assert!(driver.is_faulted());
    assert!(driver.debug_view().faulted);

    let frozen = driver.particles().to_vec();
    assert_eq!(driver.step(0.007), Err(SphError::Faulted));
    assert_eq!(driver.particles(), frozen.as_slice());
    assert_eq!(driver.steps(), 1);
}

#[test]
fn group_width_must_divide_count() {
    let config = small_config().with_spawn(UVec3::new(3, 3, 3), Vec3::ZERO);
    let err = SimulationDriver::initialize(&config, CpuSubstrate::new(20)).err();
    assert_eq!(err, Some(SphError::GroupWidthMismatch { count: 27, width: 20 }));

    // config agrees, substrate does not
    let config = small_config();
    let err = SimulationDriver::initialize(&config, CpuSubstrate::new(30)).err();
    assert_eq!(err, Some(SphError::GroupWidthMismatch { count: 100, width: 30 }));
}

#[test]
fn substrate_width_must_match_config() {
    // 100 particles split fine into 50s, but the config asked for 20
    let config = small_config();
    let err = SimulationDriver::initialize(&config, CpuSubstrate::new(50)).err();
    assert_eq!(
        err,
        Some(SphError::SubstrateWidthMismatch {
            configured: 20,
            substrate: 50
        })
    );

    let driver =
        SimulationDriver::initialize(&config, CpuSubstrate::from_config(&config)).unwrap();
    assert_eq!(driver.substrate().group_width(), 20);
}

#[test]
fn bad_tick_values_are_rejected_without_side_effects() {
    let config = small_config();
    let mut driver = SimulationDriver::initialize(&config, Recording::new(20)).unwrap();
    driver.step(0.007).unwrap();
    let before = driver.particles().to_vec();
    let tick = driver.params().tick;

    for dt in [f32::NAN, 0.0, -0.007, f32::INFINITY] {
        assert!(
            matches!(
                driver.step(dt),
                Err(SphError::InvalidParameter { name: "timestep", .. })
            ),
            "dt {dt} accepted"
        );
    }
    for size in [Vec3::new(-4.0, 10.0, 3.0), Vec3::new(4.0, f32::NAN, 3.0)] {
        assert!(matches!(
            driver.set_box_size(size),
            Err(SphError::InvalidParameter { name: "box_size", .. })
        ));
    }
    assert!(matches!(
        driver.set_collider(Vec3::new(f32::NAN, 0.0, 0.0), 0.5),
        Err(SphError::InvalidParameter { name: "sphere_pos", .. })
    ));
    for radius in [-1.0, f32::NAN] {
        assert!(matches!(
            driver.set_collider(Vec3::ZERO, radius),
            Err(SphError::InvalidParameter { name: "sphere_radius", .. })
        ));
    }

    // nothing was pushed or run, and the driver is still usable
    assert_eq!(driver.params().tick, tick);
    assert_eq!(driver.particles(), before.as_slice());
    assert_eq!(driver.substrate().ticks.len(), 1);
    assert_eq!(driver.steps(), 1);
    assert!(!driver.is_faulted());

    driver.step(0.007).unwrap();
    let half = config.box_size * 0.5;
    for p in driver.particles() {
        assert!(p.position().is_finite());
        assert!(p.position().abs().cmple(half).all());
    }
}

#[test]
fn lone_particle_at_rest_density_feels_nothing() {
    let base = SimulationConfig::default();
    let k = base.params().physics.radii;
    let mut config = base
        .with_spawn(UVec3::ONE, Vec3::new(0.3, 0.2, -0.1))
        .with_particle_radius(0.05, 0.0)
        .with_group_width(1);
    config.gravity = Vec3::ZERO;
    config.viscosity = 0.0;
    config.resting_density = config.particle_mass * poly6(0.0, &k) + DENSITY_EPSILON;

    let mut driver = SimulationDriver::initialize(&config, CpuSubstrate::new(1)).unwrap();
    driver.step_n(10).unwrap();

    let p = driver.particles()[0];
    assert!(p.pressure.abs() < 1e-3, "pressure {}", p.pressure);
    assert!(p.force().length() < 1e-6);
    assert!((p.position() - Vec3::new(0.3, 0.2, -0.1)).length() < 1e-6);
}

#[test]
fn symmetric_cube_at_rest_density_is_in_equilibrium() {
    // 2x2x2 cube, spacing 0.06 < h, so every particle sees the same neighbours
    let mut config = SimulationConfig::default()
        .with_spawn(UVec3::splat(2), Vec3::new(-0.03, -0.03, -0.03))
        .with_particle_radius(0.03, 0.0)
        .with_group_width(8);
    config.gravity = Vec3::ZERO;
    config.viscosity = 0.0;

    let mut particles = config.spawner().spawn().unwrap();
    let mut params = config.params();
    let mut cpu = CpuSubstrate::new(8);

    // measure the lattice density, then declare it the rest density
    cpu.run_stage(Stage::DensityPressure, &mut particles, &params).unwrap();
    let rho = particles[0].density;
    assert!(rho > 0.0);
    for p in &particles {
        assert!(((p.density - rho) / rho).abs() < 1e-5);
    }
    params.physics.resting_density = rho;

    cpu.run_stage(Stage::DensityPressure, &mut particles, &params).unwrap();
    cpu.run_stage(Stage::Forces, &mut particles, &params).unwrap();
    for p in &particles {
        assert!(p.pressure.abs() < 1e-2 * rho, "pressure {}", p.pressure);
        assert!(p.force().length() < 1e-2, "force {:?}", p.force());
    }
}

#[test]
fn compressed_pair_pushes_apart() {
    let mut config = SimulationConfig::default()
        .with_spawn(UVec3::new(2, 1, 1), Vec3::ZERO)
        .with_particle_radius(0.02, 0.0)
        .with_group_width(2);
    config.gravity = Vec3::ZERO;

    let mut driver = SimulationDriver::initialize(&config, CpuSubstrate::new(2)).unwrap();
    driver.step(0.007).unwrap();

    let [a, b] = [driver.particles()[0], driver.particles()[1]];
    assert!(a.density > 0.0 && b.density > 0.0);
    assert!(a.force().x < 0.0, "left particle pushed left");
    assert!(b.force().x > 0.0, "right particle pushed right");
    assert!(b.position().x - a.position().x > 0.04);
}

#[test]
fn particles_stay_in_box_and_out_of_sphere() {
    let sphere = Vec3::new(0.0, -2.0, 0.0);
    // spawned entirely inside the collider
    let config = SimulationConfig::default()
        .with_spawn(UVec3::new(10, 10, 10), Vec3::new(-0.45, -2.45, -0.45))
        .with_collider(sphere, 1.0);
    let mut driver =
        SimulationDriver::initialize(&config, CpuSubstrate::from_config(&config)).unwrap();
    let half = Vec3::new(2.0, 5.0, 1.5);

    for step in 0..200 {
        // sweep the collider sideways a little
        let moving = sphere + Vec3::new(0.002 * step as f32, 0.0, 0.0);
        driver.set_collider(moving, 1.0).unwrap();
        driver.step(0.007).unwrap();

        for (i, p) in driver.particles().iter().enumerate() {
            let pos = p.position();
            assert!(pos.is_finite(), "step {step} particle {i} is {pos:?}");
            assert!(pos.abs().cmple(half).all(), "step {step} particle {i} left the box");
            assert!(
                (pos - moving).length() >= 1.0 - 1e-4,
                "step {step} particle {i} inside the sphere"
            );
        }
    }
}

#[test]
fn particles_spawned_past_a_wall_are_clamped() {
    let config = SimulationConfig::default()
        .with_spawn(UVec3::new(10, 10, 1), Vec3::new(1.8, 0.0, 0.0))
        .with_particle_radius(0.05, 0.0);
    let mut driver =
        SimulationDriver::initialize(&config, CpuSubstrate::from_config(&config)).unwrap();

    driver.step(0.007).unwrap();
    for p in driver.particles() {
        assert!(p.position[0] <= 2.0);
    }
}
