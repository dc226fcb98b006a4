use autophys_core::types::{Isometry, Vec3, Velocity};
use autophys_core::{iso, BodyId, Scalar};
use autophys_dynamics::Bodies;
use glam::Quat;

pub const WHEEL_COUNT: usize = 4;
/// Drive force and steering both go to the front axle (wheel indices 0, 1).
/// Fixed design parameter of the demo's simplified car model.
pub const FRONT_AXLE: [usize; 2] = [0, 1];
/// Steering clamp; values beyond this are clamped, not rejected.
pub const MAX_STEER: Scalar = core::f32::consts::FRAC_PI_6;

/// Wheel geometry, mount offsets and suspension / tire parameters.
/// Offsets are in chassis space: attach point, steering axis, suspension
/// (down) direction.
#[derive(Copy, Clone, Debug)]
pub struct WheelParams {
    /// Wheel attach point in chassis space.
    pub local_pos: Vec3,
    /// Steering rotation axis in chassis space (e.g., +Y).
    pub axis: Vec3,
    /// Suspension/down axis in chassis space (e.g., -Y).
    pub susp_dir: Vec3,
    /// Suspension rest length (m).
    pub rest_len: Scalar,
    /// Spring rate (N/m) along `susp_dir`.
    pub k_spring: Scalar,
    /// Damping (N·s/m) along `susp_dir`.
    pub k_damp: Scalar,
    /// Wheel radius (m).
    pub radius: Scalar,
    /// Longitudinal friction coefficient.
    pub mu_long: Scalar,
    /// Lateral friction coefficient.
    pub mu_lat: Scalar,
    /// Angular damping for the wheel body, in [0,1).
    pub ang_damping: Scalar,
}

/// One wheel actuator: a body plus its persistent actuation state.
#[derive(Copy, Clone, Debug)]
pub struct Wheel {
    pub params: WheelParams,
    pub body: BodyId,
    force: Scalar,
    steer: Scalar,
    spin: Scalar,
}

impl Wheel {
    pub fn new(params: WheelParams, body: BodyId) -> Self {
        assert!(params.radius > 0.0, "wheel radius must be positive");
        assert!(params.rest_len >= 0.0, "suspension rest length must be non-negative");
        Self { params, body, force: 0.0, steer: 0.0, spin: 0.0 }
    }
    #[inline] pub fn force(&self) -> Scalar { self.force }
    #[inline] pub fn steer(&self) -> Scalar { self.steer }
}

/// Ground sample under a wheel mount: surface height and contact normal.
#[derive(Copy, Clone, Debug)]
pub struct GroundHit {
    pub y: Scalar,
    pub normal: Vec3,
}

/// Per-wheel result of one actuation pass, for stats and the event ledger.
#[derive(Copy, Clone, Debug, Default)]
pub struct WheelContact {
    pub in_contact: bool,
    pub compression: Scalar,
    pub f_susp: Scalar,
    pub f_long: Scalar,
    pub f_lat: Scalar,
}

/// Chassis body + four index-addressed wheel actuators.
/// Indices are stable identifiers: 0 front-left, 1 front-right,
/// 2 rear-left, 3 rear-right.
pub struct Vehicle {
    chassis: BodyId,
    mass: Scalar,
    wheels: [Wheel; WHEEL_COUNT],
}

impl Vehicle {
    pub fn new(chassis: BodyId, mass: Scalar, wheels: [Wheel; WHEEL_COUNT]) -> Self {
        assert!(mass > 0.0, "chassis mass must be positive, got {mass}");
        Self { chassis, mass, wheels }
    }

    #[inline] pub fn chassis(&self) -> BodyId { self.chassis }
    #[inline] pub fn mass(&self) -> Scalar { self.mass }
    #[inline] pub fn wheels(&self) -> &[Wheel; WHEEL_COUNT] { &self.wheels }

    /// Set the persistent drive force (N) for one wheel.
    /// `wheel_index >= 4` is a programmer error.
    pub fn set_wheel_force(&mut self, force: Scalar, wheel_index: usize) {
        assert!(wheel_index < WHEEL_COUNT, "wheel index {wheel_index} out of range");
        self.wheels[wheel_index].force = force;
    }

    /// Set the persistent steering angle (rad) for one wheel, clamped to
    /// ±`MAX_STEER`. Same index contract as `set_wheel_force`.
    pub fn set_steering_value(&mut self, angle: Scalar, wheel_index: usize) {
        assert!(wheel_index < WHEEL_COUNT, "wheel index {wheel_index} out of range");
        self.wheels[wheel_index].steer = angle.clamp(-MAX_STEER, MAX_STEER);
    }

    /// One actuation pass. For every wheel: probe the ground under the mount
    /// along the suspension direction, derive spring/damper + tire forces,
    /// sum force and moment onto the chassis, then re-seat the wheel body on
    /// its mount (position pinned to the suspension travel, orientation
    /// following chassis yaw + steer + roll).
    ///
    /// `ground(x, z)` samples the highest static surface under a world XZ
    /// position. Chassis local frame: +Z forward, +X lateral, +Y up.
    pub fn apply_forces<G>(
        &mut self,
        bodies: &mut Bodies,
        gravity: Vec3,
        ground: G,
        dt: Scalar,
    ) -> [WheelContact; WHEEL_COUNT]
    where
        G: Fn(Scalar, Scalar) -> Option<GroundHit>,
    {
        let pose = bodies.pose(self.chassis.0);
        let vel = bodies.vel(self.chassis.0);
        let g_mag = gravity.length();

        let mut force_sum = Vec3::ZERO;
        let mut torque_sum = Vec3::ZERO;
        let mut contacts = [WheelContact::default(); WHEEL_COUNT];

        for (i, wheel) in self.wheels.iter_mut().enumerate() {
            let wp = wheel.params;
            let anchor = pose.pos + pose.rot * wp.local_pos;
            let dir_w = (pose.rot * wp.susp_dir).normalize_or_zero();
            let cast_len = wp.rest_len + wp.radius;

            let steer_q = Quat::from_axis_angle(wp.axis.into(), wheel.steer);
            let fwd_w = pose.rot * (steer_q * Vec3::Z);
            let lat_w = pose.rot * (steer_q * Vec3::X);

            // Suspension travel from the anchor to the wheel center.
            let mut travel = wp.rest_len;

            if let Some(hit) = ground(anchor.x, anchor.z) {
                let y_bottom = anchor.y - cast_len;
                if y_bottom <= hit.y {
                    // Compression along the suspension axis.
                    let x = (hit.y - y_bottom).clamp(0.0, cast_len);
                    travel = (wp.rest_len - x).max(0.0);

                    let r = anchor - pose.pos;
                    let v_anchor = vel.lin + vel.ang.cross(r);
                    // Positive while compressing: dir_w points down, so a
                    // sinking anchor projects positively onto it.
                    let v_rel = v_anchor.dot(dir_w);
                    // Suspension only pushes; the damper adds force while
                    // compressing and sheds it while rebounding.
                    let f_susp = (wp.k_spring * x + wp.k_damp * v_rel).max(0.0);

                    let v_lat = v_anchor.dot(lat_w);
                    let quarter_weight = 0.25 * self.mass * g_mag;
                    let fmax_long = wp.mu_long * quarter_weight;
                    let fmax_lat = wp.mu_lat * quarter_weight;
                    let f_long = wheel.force.clamp(-fmax_long, fmax_long);
                    // Cornering spring capped by the lateral friction cone.
                    let f_lat = (-v_lat * self.mass).clamp(-fmax_lat, fmax_lat);

                    let n_w = hit.normal.normalize_or_zero();
                    let f = n_w * f_susp + fwd_w * f_long + lat_w * f_lat;
                    force_sum += f;
                    torque_sum += r.cross(f);

                    contacts[i] = WheelContact { in_contact: true, compression: x, f_susp, f_long, f_lat };
                }
            }

            // Mount re-seat: the wheel body rides on its mount.
            let wheel_pos = anchor + dir_w * travel;
            let r = wheel_pos - pose.pos;
            let v_at = vel.lin + vel.ang.cross(r);
            let roll_rate = v_at.dot(fwd_w) / wp.radius;
            wheel.spin = (wheel.spin + roll_rate * dt) % core::f32::consts::TAU;

            let roll_q = Quat::from_axis_angle(glam::Vec3::X, wheel.spin);
            let wheel_rot = (pose.rot * steer_q * roll_q).normalize();
            bodies.set_pose(wheel.body.0, iso(wheel_pos, wheel_rot));
            bodies.set_vel(wheel.body.0, Velocity { lin: v_at, ang: lat_w * roll_rate });
        }

        bodies.apply_impulse(self.chassis.0, force_sum * dt);
        bodies.apply_angular_impulse(self.chassis.0, torque_sum * dt);
        contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autophys_core::{quat_identity, vec3};
    use autophys_dynamics::BodyDesc;

    fn wheel_params(x: Scalar, z: Scalar) -> WheelParams {
        WheelParams {
            local_pos: vec3(x, -0.3, z),
            axis: vec3(0.0, 1.0, 0.0),
            susp_dir: vec3(0.0, -1.0, 0.0),
            rest_len: 0.3,
            k_spring: 8000.0,
            // Critical damping for the 5 kg corner load on an 8000 N/m spring.
            k_damp: 400.0,
            radius: 0.25,
            mu_long: 0.9,
            mu_lat: 0.9,
            ang_damping: 0.4,
        }
    }

    fn rig() -> (Bodies, Vehicle) {
        let mut bodies = Bodies::with_capacity(5);
        // Chassis center sits at suspension rest height minus a small preload.
        let chassis = bodies.add(BodyDesc {
            pose: iso(vec3(0.0, 0.83, 0.0), quat_identity()),
            vel: Velocity::default(),
            inv_mass: 1.0 / 20.0,
            dynamic: true,
        });
        let mounts = [(-1.1, 1.4), (1.1, 1.4), (-1.1, -1.4), (1.1, -1.4)];
        let wheels = mounts.map(|(x, z)| {
            let body = bodies.add(BodyDesc {
                pose: Isometry::default(),
                vel: Velocity::default(),
                inv_mass: 1.0,
                dynamic: true,
            });
            Wheel::new(wheel_params(x, z), BodyId(body))
        });
        (bodies, Vehicle::new(BodyId(chassis), 20.0, wheels))
    }

    fn flat_ground(_x: Scalar, _z: Scalar) -> Option<GroundHit> {
        Some(GroundHit { y: 0.0, normal: vec3(0.0, 1.0, 0.0) })
    }

    const G: Vec3 = Vec3::new(0.0, -9.82, 0.0);
    const DT: Scalar = 1.0 / 60.0;

    #[test] fn force_and_steer_default_to_zero() {
        let (_, v) = rig();
        for w in v.wheels() {
            assert_eq!(w.force(), 0.0);
            assert_eq!(w.steer(), 0.0);
        }
    }

    #[test] fn actuation_persists_until_changed() {
        let (mut bodies, mut v) = rig();
        v.set_wheel_force(120.0, 0);
        for _ in 0..10 {
            v.apply_forces(&mut bodies, G, flat_ground, DT);
            assert_eq!(v.wheels()[0].force(), 120.0);
        }
        v.set_wheel_force(0.0, 0);
        assert_eq!(v.wheels()[0].force(), 0.0);
    }

    #[test] fn steering_is_clamped() {
        let (_, mut v) = rig();
        v.set_steering_value(1.0, 1);
        assert!((v.wheels()[1].steer() - MAX_STEER).abs() < 1e-6);
        v.set_steering_value(-1.0, 1);
        assert!((v.wheels()[1].steer() + MAX_STEER).abs() < 1e-6);
        v.set_steering_value(0.1, 1);
        assert!((v.wheels()[1].steer() - 0.1).abs() < 1e-6);
    }

    #[test]
    #[should_panic]
    fn wheel_index_out_of_range_panics() {
        let (_, mut v) = rig();
        v.set_wheel_force(10.0, 4);
    }

    #[test] fn suspension_pushes_up_when_compressed() {
        let (mut bodies, mut v) = rig();
        let before = bodies.vel(v.chassis().0).lin.y;
        let contacts = v.apply_forces(&mut bodies, G, flat_ground, DT);
        assert!(contacts.iter().all(|c| c.in_contact));
        assert!(bodies.vel(v.chassis().0).lin.y > before);
    }

    #[test] fn damper_opposes_suspension_motion() {
        // Same compression, opposite vertical motion: sinking must produce
        // more suspension force than rebounding, never less.
        let f_susp_with_vy = |vy: Scalar| {
            let (mut bodies, mut v) = rig();
            bodies.set_vel(v.chassis().0, Velocity { lin: vec3(0.0, vy, 0.0), ang: Vec3::ZERO });
            v.apply_forces(&mut bodies, G, flat_ground, DT)[0].f_susp
        };
        let sinking = f_susp_with_vy(-1.0);
        let steady = f_susp_with_vy(0.0);
        let rebounding = f_susp_with_vy(1.0);
        assert!(sinking > steady, "damper does not resist compression: {sinking} <= {steady}");
        assert!(rebounding < steady, "damper does not resist rebound: {rebounding} >= {steady}");
    }

    #[test] fn drive_force_accelerates_forward() {
        let (mut bodies, mut v) = rig();
        for i in FRONT_AXLE { v.set_wheel_force(200.0, i); }
        for _ in 0..30 {
            v.apply_forces(&mut bodies, G, flat_ground, DT);
        }
        assert!(bodies.vel(v.chassis().0).lin.z > 0.1);
    }

    #[test] fn steered_drive_pulls_laterally() {
        let (mut bodies, mut v) = rig();
        for i in FRONT_AXLE {
            v.set_wheel_force(200.0, i);
            v.set_steering_value(MAX_STEER, i);
        }
        v.apply_forces(&mut bodies, G, flat_ground, DT);
        assert!(bodies.vel(v.chassis().0).lin.x > 0.0);
    }

    #[test] fn wheels_reseat_on_mounts() {
        let (mut bodies, mut v) = rig();
        v.apply_forces(&mut bodies, G, flat_ground, DT);
        let chassis = bodies.pose(v.chassis().0);
        for w in v.wheels() {
            let p = bodies.pose(w.body.0).pos;
            let anchor = chassis.pos + chassis.rot * w.params.local_pos;
            assert!((p.x - anchor.x).abs() < 1e-5);
            assert!((p.z - anchor.z).abs() < 1e-5);
            assert!(p.y <= anchor.y);
        }
    }
}
