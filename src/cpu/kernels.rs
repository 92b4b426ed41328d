// 3D SPH kernels written against the cached radius powers
use glam::Vec3;

use crate::params::KernelRadii;

// keeps density strictly positive so integration can divide by it
pub const DENSITY_EPSILON: f32 = 1e-6;

/// poly6, 315 / (64 pi h^3) * (1 - r^2/h^2)^3
#[inline]
pub fn poly6(dist2: f32, k: &KernelRadii) -> f32 {
    if dist2 >= k.radius2 {
        return 0.0;
    }
    let x = 1.0 - dist2 / k.radius2;
    315.0 / (64.0 * k.pi * k.radius3) * x * x * x
}

/// first derivative of the spiky kernel, -45 / (pi h^4) * (1 - r/h)^2
#[inline]
pub fn spiky_first_derivative(dist: f32, k: &KernelRadii) -> f32 {
    if dist >= k.radius {
        return 0.0;
    }
    let x = 1.0 - dist / k.radius;
    -45.0 / (k.pi * k.radius4) * x * x
}

/// viscosity laplacian, 45 / (pi h^5) * (1 - r/h)
#[inline]
pub fn viscosity_laplacian(dist: f32, k: &KernelRadii) -> f32 {
    if dist >= k.radius {
        return 0.0;
    }
    let x = 1.0 - dist / k.radius;
    45.0 / (k.pi * k.radius5) * x
}

#[inline]
pub fn spiky_gradient(dist: f32, direction: Vec3, k: &KernelRadii) -> Vec3 {
    spiky_first_derivative(dist, k) * direction
}
