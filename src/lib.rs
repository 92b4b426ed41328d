pub mod boundary;
pub mod config;
pub mod debug;
pub mod driver;
pub mod error;
pub mod params;
pub mod particle;
pub mod spawner;

pub mod cpu {
    pub mod kernels;
    pub mod neighbors;
    pub mod substrate;
}

pub mod gpu {
    pub mod ffi;
    pub mod buffers;
    pub mod pipeline;
    pub mod substrate;
}

pub use config::SimulationConfig;
pub use cpu::substrate::CpuSubstrate;
pub use driver::{ComputeSubstrate, DebugView, SimulationDriver, Stage};
pub use error::SphError;
pub use particle::{Particle, ParticleStore};
