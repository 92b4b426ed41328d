use glam::{UVec3, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SphError;
use crate::particle::Particle;

/// Fills a block of `counts` cells, one particle diameter apart, each nudged by
/// a random direction scaled by `particle_radius * jitter`.
#[derive(Clone, Debug, PartialEq)]
pub struct Spawner {
    pub counts: UVec3,
    pub origin: Vec3,
    pub particle_radius: f32,
    pub jitter: f32,
    pub seed: u64,
}

impl Spawner {
    pub fn spawn(&self) -> Result<Vec<Particle>, SphError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        spawn_with(
            self.counts,
            self.origin,
            self.particle_radius,
            self.jitter,
            &mut rng,
        )
    }
}

pub fn spawn_with<R: Rng + ?Sized>(
    counts: UVec3,
    origin: Vec3,
    particle_radius: f32,
    jitter: f32,
    rng: &mut R,
) -> Result<Vec<Particle>, SphError> {
    if counts.x == 0 || counts.y == 0 || counts.z == 0 {
        return Err(SphError::InvalidSpawnCount(counts.to_array()));
    }

    let n = counts.x as usize * counts.y as usize * counts.z as usize;
    let spacing = 2.0 * particle_radius;
    let offset_scale = particle_radius * jitter;

    let mut particles = Vec::with_capacity(n);
    for x in 0..counts.x {
        for y in 0..counts.y {
            for z in 0..counts.z {
                let base = origin + Vec3::new(x as f32, y as f32, z as f32) * spacing;
                let offset = if offset_scale > 0.0 {
                    unit_direction(rng) * offset_scale
                } else {
                    Vec3::ZERO
                };
                particles.push(Particle::at(base + offset));
            }
        }
    }
    Ok(particles)
}

// rejection sample the unit ball, then project onto the sphere
fn unit_direction<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        let len2 = v.length_squared();
        if len2 > 1e-6 && len2 <= 1.0 {
            return v / len2.sqrt();
        }
    }
}
