use autophys_core::types::{Isometry, Velocity, Vec3};
use autophys_core::{Scalar, Quat};

/// Input descriptor when creating a body.
#[derive(Copy, Clone, Debug)]
pub struct BodyDesc {
    pub pose: Isometry,
    pub vel: Velocity,
    pub inv_mass: Scalar,
    pub dynamic: bool,
}

/// SoA body storage with deterministic ID = index semantics.
/// Bodies are created at world setup and live for the life of the world.
pub struct Bodies {
    pos: Vec<Vec3>,
    rot: Vec<Quat>,
    linvel: Vec<Vec3>,
    angvel: Vec<Vec3>,
    inv_mass: Vec<Scalar>,
    dynamic: Vec<bool>,
    // Per-body angular damping coefficient in [0,1); wheel bodies use this.
    ang_damping: Vec<Scalar>,
}

impl Bodies {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            pos:      Vec::with_capacity(cap),
            rot:      Vec::with_capacity(cap),
            linvel:   Vec::with_capacity(cap),
            angvel:   Vec::with_capacity(cap),
            inv_mass: Vec::with_capacity(cap),
            dynamic:  Vec::with_capacity(cap),
            ang_damping: Vec::with_capacity(cap),
        }
    }

    pub fn add(&mut self, desc: BodyDesc) -> u32 {
        self.pos.push(desc.pose.pos);
        self.rot.push(desc.pose.rot);
        self.linvel.push(desc.vel.lin);
        self.angvel.push(desc.vel.ang);
        self.inv_mass.push(desc.inv_mass);
        self.dynamic.push(desc.dynamic);
        self.ang_damping.push(0.0);
        (self.pos.len() as u32) - 1
    }

    #[inline] pub fn len(&self) -> usize { self.pos.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.pos.is_empty() }

    /// Semi-implicit Euler over all dynamic bodies: gravity into linear
    /// velocity, angular damping, then position and small-angle orientation.
    pub fn integrate_all(&mut self, gravity: Vec3, dt: Scalar) {
        for i in 0..self.len() {
            if !self.dynamic[i] || self.inv_mass[i] == 0.0 { continue; }
            self.linvel[i] += gravity * dt;
            let d = self.ang_damping[i];
            if d > 0.0 {
                self.angvel[i] *= (1.0 - d).clamp(0.0, 1.0).powf(dt);
            }
            self.pos[i] += self.linvel[i] * dt;
            let w = self.angvel[i];
            if w.length_squared() > 0.0 {
                self.apply_orientation_delta(i as u32, w * dt);
            }
        }
    }

    // -------- Accessors used by world/solver/hash --------
    #[inline] pub fn pose(&self, id: u32) -> Isometry {
        let i = id as usize;
        Isometry { pos: self.pos[i], rot: self.rot[i] }
    }
    #[inline] pub fn set_pose(&mut self, id: u32, iso: Isometry) {
        let i = id as usize;
        self.pos[i] = iso.pos;
        self.rot[i] = iso.rot;
    }

    #[inline] pub fn vel(&self, id: u32) -> Velocity {
        let i = id as usize;
        Velocity { lin: self.linvel[i], ang: self.angvel[i] }
    }
    #[inline] pub fn set_vel(&mut self, id: u32, v: Velocity) {
        let i = id as usize;
        self.linvel[i] = v.lin;
        self.angvel[i] = v.ang;
    }

    #[inline] pub fn inv_mass_of(&self, id: u32) -> Scalar { self.inv_mass[id as usize] }
    #[inline] pub fn is_dynamic(&self, id: u32) -> bool { self.dynamic[id as usize] }

    pub fn set_ang_damping(&mut self, id: u32, d: Scalar) {
        assert!((0.0..1.0).contains(&d), "angular damping must be in [0,1), got {d}");
        self.ang_damping[id as usize] = d;
    }

    // -------- Impulses / deltas --------
    #[inline] pub fn apply_impulse(&mut self, id: u32, j: Vec3) {
        let i = id as usize;
        let im = self.inv_mass[i];
        if im != 0.0 { self.linvel[i] += j * im; }
    }

    /// Add a position delta (already scaled for this body).
    #[inline] pub fn apply_position_delta(&mut self, id: u32, dp: Vec3) {
        let i = id as usize;
        self.pos[i] += dp;
    }

    /// Apply an angular impulse τ_impulse (world space) with the isotropic
    /// inverse-inertia fallback: Δω = inv_mass * τ.
    pub fn apply_angular_impulse(&mut self, id: u32, tau_impulse: Vec3) {
        let i = id as usize;
        if self.inv_mass[i] == 0.0 { return; }
        self.angvel[i] += tau_impulse * self.inv_mass[i];
    }

    /// Small-angle orientation correction (world space). Deterministic, stable.
    pub fn apply_orientation_delta(&mut self, id: u32, dtheta_world: Vec3) {
        let i = id as usize;
        let ang2 = dtheta_world.length_squared();
        if ang2 <= 0.0 { return; }
        let dq = Quat::from_xyzw(dtheta_world.x * 0.5, dtheta_world.y * 0.5, dtheta_world.z * 0.5, 1.0).normalize();
        self.rot[i] = (dq * self.rot[i]).normalize();
    }

    // Iterator for hashing in stable order
    pub fn indices(&self) -> impl ExactSizeIterator<Item = u32> + '_ {
        0..(self.len() as u32)
    }
}

impl Default for Bodies {
    fn default() -> Self { Self::with_capacity(0) }
}
