use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::error::SphError;

/// One fluid element, laid out exactly as the compute kernels read it:
/// 11 tightly packed `f32`s, 44 bytes, no padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Particle {
    // not using glam so the layout stays WGSL compatible
    pub pressure: f32,
    pub density: f32,
    pub current_force: [f32; 3],
    pub velocity: [f32; 3],
    pub position: [f32; 3],
}

pub const PARTICLE_SIZE: usize = 44;

const _: () = assert!(std::mem::size_of::<Particle>() == PARTICLE_SIZE);

impl Particle {
    pub fn at(position: Vec3) -> Self {
        Self {
            position: position.to_array(),
            ..Self::zeroed()
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        Vec3::from_array(self.velocity)
    }

    #[inline]
    pub fn force(&self) -> Vec3 {
        Vec3::from_array(self.current_force)
    }

    #[inline]
    pub fn set_position(&mut self, p: Vec3) {
        self.position = p.to_array();
    }

    #[inline]
    pub fn set_velocity(&mut self, v: Vec3) {
        self.velocity = v.to_array();
    }

    #[inline]
    pub fn set_force(&mut self, f: Vec3) {
        self.current_force = f.to_array();
    }
}

/// Fixed-capacity particle array. The length is decided once and never changes.
#[derive(Clone, Debug)]
pub struct ParticleStore {
    particles: Vec<Particle>,
}

impl ParticleStore {
    pub fn with_capacity(capacity: usize) -> Result<Self, SphError> {
        let mut particles = Vec::new();
        particles
            .try_reserve_exact(capacity)
            .map_err(|_| SphError::Allocation(capacity))?;
        particles.resize(capacity, Particle::zeroed());
        Ok(Self { particles })
    }

    pub fn write(&mut self, index: usize, particle: Particle) -> Result<(), SphError> {
        let capacity = self.particles.len();
        let slot = self
            .particles
            .get_mut(index)
            .ok_or(SphError::IndexOutOfRange { index, capacity })?;
        *slot = particle;
        Ok(())
    }

    /// Copies a full spawn into the store; the count has to match the capacity.
    pub fn fill(&mut self, spawned: &[Particle]) -> Result<(), SphError> {
        if spawned.len() != self.particles.len() {
            return Err(SphError::CapacityMismatch {
                got: spawned.len(),
                capacity: self.particles.len(),
            });
        }
        self.particles.copy_from_slice(spawned);
        Ok(())
    }

    pub fn read_all(&self) -> &[Particle] {
        &self.particles
    }

    // wire format handed to the substrate
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.particles)
    }

    pub fn positions(&self) -> impl ExactSizeIterator<Item = Vec3> + '_ {
        self.particles.iter().map(Particle::position)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}
