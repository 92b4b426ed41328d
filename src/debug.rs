// gizmo overlay for the container and the collider
use bevy::math::Isometry3d;
use bevy::prelude::*;

use crate::driver::DebugView;

const BOX_COLOR: Color = Color::srgb(0.9, 0.9, 0.9);
const COLLIDER_COLOR: Color = Color::srgb(1.0, 0.5, 0.0);
const FAULT_COLOR: Color = Color::srgb(1.0, 0.1, 0.1);

// glam (simulation) and bevy's math live on different glam versions
#[inline]
pub fn to_bevy(v: glam::Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub fn draw_debug_view(gizmos: &mut Gizmos, view: &DebugView) {
    let box_color = if view.faulted { FAULT_COLOR } else { BOX_COLOR };
    gizmos.cuboid(Transform::from_scale(to_bevy(view.box_size)), box_color);

    if view.sphere_radius > 0.0 {
        gizmos.sphere(
            Isometry3d::from_translation(to_bevy(view.sphere_pos)),
            view.sphere_radius,
            COLLIDER_COLOR,
        );
    }
}
