use autophys_core::types::{Isometry, Vec3, Mat3};
use glam::Mat3A;
use crate::aabb::Aabb;

/// Collision shape. The demo's shape set is small and fixed, so a tagged
/// variant beats virtual dispatch here.
#[derive(Copy, Clone, Debug)]
pub enum Shape {
    Sphere { r: f32 },
    Box { hx: f32, hy: f32, hz: f32 },
}

impl Shape {
    /// Malformed shape parameters are a programmer error; fail at setup time.
    pub fn validate(&self) {
        match *self {
            Shape::Sphere { r } => assert!(r > 0.0, "sphere radius must be positive, got {r}"),
            Shape::Box { hx, hy, hz } => assert!(
                hx > 0.0 && hy > 0.0 && hz > 0.0,
                "box half-extents must be positive, got ({hx}, {hy}, {hz})"
            ),
        }
    }
}

#[inline]
pub fn aabb_of(shape: &Shape, xf: &Isometry) -> Aabb {
    match *shape {
        Shape::Sphere { r } => Aabb::from_center_half_extents(xf.pos, Vec3::splat(r)),
        Shape::Box { hx, hy, hz } => {
            let he = Vec3::new(hx, hy, hz);
            let rot = Mat3A::from_quat(xf.rot);
            let m = Mat3::from_cols(rot.x_axis.abs(), rot.y_axis.abs(), rot.z_axis.abs());
            let world_he = m * he;
            Aabb::from_center_half_extents(xf.pos, world_he)
        }
    }
}
