// reflective containment applied at the end of integration
use glam::Vec3;

use crate::params::SphParams;

/// Box first, then the sphere, then a position-only box clamp so a sphere that
/// pokes through a wall can never push a particle out of the container.
pub fn apply(position: &mut Vec3, velocity: &mut Vec3, params: &SphParams) {
    let damping = params.physics.bound_damping;
    let half = params.half_box();

    clamp_box(position, velocity, half, damping);

    let radius = params.tick.sphere_radius;
    if radius > 0.0 {
        push_out_of_sphere(position, velocity, params.tick.sphere_pos, radius, damping);
        *position = position.clamp(-half, half);
    }
}

pub fn clamp_box(position: &mut Vec3, velocity: &mut Vec3, half: Vec3, damping: f32) {
    for axis in 0..3 {
        if position[axis] < -half[axis] {
            position[axis] = -half[axis];
            velocity[axis] *= damping;
        } else if position[axis] > half[axis] {
            position[axis] = half[axis];
            velocity[axis] *= damping;
        }
    }
}

pub fn push_out_of_sphere(
    position: &mut Vec3,
    velocity: &mut Vec3,
    center: Vec3,
    radius: f32,
    damping: f32,
) {
    let offset = *position - center;
    let dist2 = offset.length_squared();
    if dist2 >= radius * radius {
        return;
    }

    // dead centre has no normal, pick up
    let normal = if dist2 > 0.0 {
        offset / dist2.sqrt()
    } else {
        Vec3::Y
    };

    *position = center + normal * radius;
    let v_n = velocity.dot(normal) * normal;
    *velocity = *velocity - v_n + v_n * damping;
}
