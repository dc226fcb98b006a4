//! The physics world: body/collider/vehicle registration and the fixed-step
//! advance. `step` must be called with a constant dt (see `FIXED_DT`); the
//! resulting body transforms are bit-for-bit reproducible for identical
//! setup and actuation sequences, checkable via `step_hash`.

use autophys_collision::pairs_sap;
use autophys_core::{
    hash_quat, hash_vec3, BodyId, ColliderId, Isometry, Scalar, StepHasher, StepStage, StepStats,
    Vec3, Velocity,
};
use autophys_dynamics::{Bodies, BodyDesc};
use autophys_geom::{aabb_of, Aabb, MassProps, Material, Shape};
use autophys_materials as mats;
use autophys_vehicle::{GroundHit, Vehicle};
use autophys_viz::{DebugSettings, Ledger, LedgerEvent, ScheduleRecorder};

pub use autophys_core::time::FIXED_DT;

/* ---------------- Collider & Contact ---------------- */
#[derive(Copy, Clone, Debug)]
pub struct Collider {
    pub body: BodyId,
    pub shape: Shape,
    pub aabb: Aabb,
    pub material: Material,
}

#[derive(Copy, Clone, Debug)]
struct Contact {
    a_collider: usize,
    b_collider: usize,
    normal: Vec3, // from A -> B
    depth: Scalar,
}

/* ---------------- Builder ---------------- */
pub struct WorldBuilder {
    pub bodies: usize,
    pub colliders: usize,
}

impl WorldBuilder {
    pub fn new() -> Self { Self { bodies: 64, colliders: 64 } }

    pub fn with_capacity(mut self, bodies: usize, colliders: usize) -> Self {
        self.bodies = bodies;
        self.colliders = colliders;
        self
    }

    pub fn build(self) -> World {
        World::with_capacity(self.bodies, self.colliders)
    }
}

impl Default for WorldBuilder {
    fn default() -> Self { Self::new() }
}

/* ---------------- World ---------------- */
pub struct World {
    pub gravity: Vec3,

    schedule: ScheduleRecorder,
    bodies: Bodies,
    colliders: Vec<Collider>,

    // At most one vehicle; its bodies are excluded from self-collision.
    vehicle: Option<Vehicle>,
    vehicle_bodies: Vec<BodyId>,

    tick: u64,
    debug: DebugSettings,
    ledger: Ledger,
}

impl World {
    pub fn with_capacity(bodies: usize, colliders: usize) -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.82, 0.0),
            schedule: ScheduleRecorder::new(),
            bodies: Bodies::with_capacity(bodies),
            colliders: Vec::with_capacity(colliders),
            vehicle: None,
            vehicle_bodies: Vec::new(),
            tick: 0,
            debug: DebugSettings::default(),
            ledger: Ledger::new(4096),
        }
    }

    /* ---------- Debug / helpers ---------- */
    pub fn set_debug(&mut self, cfg: DebugSettings) { self.debug = cfg; }
    pub fn set_gravity(&mut self, g: Vec3) { self.gravity = g; }
    #[inline] pub fn tick_index(&self) -> u64 { self.tick }
    pub fn num_bodies(&self) -> u32 { self.bodies.len() as u32 }

    pub fn body_pose(&self, id: BodyId) -> Isometry { self.bodies.pose(id.0) }
    pub fn body_vel(&self, id: BodyId) -> Velocity { self.bodies.vel(id.0) }

    /// Deterministically set a body's pose at a tick boundary.
    /// Call only outside `World::step()` to keep hashes stable.
    pub fn set_body_pose(&mut self, id: BodyId, pose: Isometry) {
        self.bodies.set_pose(id.0, pose);
        for c in &mut self.colliders {
            if c.body == id {
                c.aabb = aabb_of(&c.shape, &pose);
            }
        }
    }
    pub fn set_body_vel(&mut self, id: BodyId, vel: Velocity) {
        self.bodies.set_vel(id.0, vel);
    }

    pub fn for_each_collider<F: FnMut(u32, BodyId, &Shape, &Aabb)>(&self, mut f: F) {
        for (i, c) in self.colliders.iter().enumerate() {
            f(i as u32, c.body, &c.shape, &c.aabb);
        }
    }

    /* ---------- World composition ---------- */
    /// Register a body. Ids are dense indices handed out by the store, so a
    /// body cannot be registered twice.
    pub fn add_body(&mut self, pose: Isometry, vel: Velocity, mass: MassProps, dynamic: bool) -> BodyId {
        let inv_mass = if dynamic { mass.inv_mass } else { 0.0 };
        BodyId(self.bodies.add(BodyDesc { pose, vel, inv_mass, dynamic }))
    }

    pub fn set_ang_damping(&mut self, id: BodyId, d: Scalar) {
        self.bodies.set_ang_damping(id.0, d);
    }

    pub fn add_collider(&mut self, body: BodyId, shape: Shape, material: Material) -> ColliderId {
        assert!((body.0 as usize) < self.bodies.len(), "collider for unknown {body}");
        shape.validate();
        let pose = self.bodies.pose(body.0);
        let aabb = aabb_of(&shape, &pose);
        let id = self.colliders.len() as u32;
        self.colliders.push(Collider { body, shape, aabb, material });
        ColliderId(id)
    }

    /// Register the vehicle: its chassis and wheel bodies become actuated
    /// each step, and collisions among them are filtered out.
    pub fn add_vehicle(&mut self, vehicle: Vehicle) {
        assert!(self.vehicle.is_none(), "a vehicle is already registered");
        assert!((vehicle.chassis().0 as usize) < self.bodies.len(), "vehicle chassis not in world");
        self.vehicle_bodies.push(vehicle.chassis());
        for w in vehicle.wheels() {
            assert!((w.body.0 as usize) < self.bodies.len(), "wheel body not in world");
            self.vehicle_bodies.push(w.body);
        }
        self.vehicle = Some(vehicle);
    }

    pub fn vehicle(&self) -> Option<&Vehicle> { self.vehicle.as_ref() }
    pub fn vehicle_mut(&mut self) -> Option<&mut Vehicle> { self.vehicle.as_mut() }

    #[inline]
    fn is_vehicle_internal_pair(&self, a: BodyId, b: BodyId) -> bool {
        self.vehicle_bodies.contains(&a) && self.vehicle_bodies.contains(&b)
    }

    /* ---------- Step ---------- */
    pub fn step(&mut self, dt: Scalar) -> StepStats {
        self.schedule.clear();
        self.ledger.clear();
        self.tick = self.tick.wrapping_add(1);

        // Integrate: gravity, angular damping, position + orientation.
        self.schedule.push(StepStage::Integrate);
        self.bodies.integrate_all(self.gravity, dt);
        let g = self.gravity;
        for i in 0..(self.bodies.len() as u32) {
            if self.bodies.is_dynamic(i) && self.bodies.inv_mass_of(i) > 0.0 {
                let dv = g * dt;
                self.ledger.push(LedgerEvent::Integrate {
                    id: i,
                    a: [g.x, g.y, g.z],
                    dv: [dv.x, dv.y, dv.z],
                });
            }
        }

        // Vehicle actuation: consumes the current persistent force/steer state.
        let mut wheels_on_ground = 0u32;
        if let Some(v) = self.vehicle.as_mut() {
            self.schedule.push(StepStage::VehicleForces);
            let ground: Vec<Aabb> = self
                .colliders
                .iter()
                .filter(|c| {
                    matches!(c.shape, Shape::Box { .. }) && self.bodies.inv_mass_of(c.body.0) == 0.0
                })
                .map(|c| c.aabb)
                .collect();
            let contacts =
                v.apply_forces(&mut self.bodies, g, |x, z| probe_ground(&ground, x, z), dt);
            for (i, c) in contacts.iter().enumerate() {
                if !c.in_contact { continue; }
                wheels_on_ground += 1;
                self.ledger.push(LedgerEvent::WheelContact {
                    wheel: i as u32,
                    compression: c.compression,
                    f_susp: c.f_susp,
                    f_long: c.f_long,
                    f_lat: c.f_lat,
                });
            }
        }

        // Update AABBs (pre)
        self.schedule.push(StepStage::UpdateAabbsPre);
        for idx in 0..self.colliders.len() {
            let b = self.colliders[idx].body;
            let shape = self.colliders[idx].shape;
            let pose = self.bodies.pose(b.0);
            self.colliders[idx].aabb = aabb_of(&shape, &pose);
        }

        // Broadphase (SAP)
        self.schedule.push(StepStage::BroadphaseSap);
        let aabbs: Vec<Aabb> = self.colliders.iter().map(|c| c.aabb).collect();
        let pairs = pairs_sap(&aabbs);

        // Narrowphase
        self.schedule.push(StepStage::Narrowphase);
        let mut contacts = Vec::new();
        for (i, j) in pairs.iter().copied() {
            let a = self.colliders[i].body;
            let b = self.colliders[j].body;
            if a == b { continue; }
            if self.is_vehicle_internal_pair(a, b) { continue; }
            if let Some(c) = self.contact_box_box(i, j)       { contacts.push(c); continue; }
            if let Some(c) = self.contact_sphere_sphere(i, j) { contacts.push(c); continue; }
            if let Some(c) = self.contact_sphere_box(i, j)    { contacts.push(c); continue; }
        }

        // Ensure final orientation is A -> B (robust against future edits)
        for c in &mut contacts {
            let a = self.colliders[c.a_collider].body;
            let b = self.colliders[c.b_collider].body;
            let pa = self.bodies.pose(a.0).pos;
            let pb = self.bodies.pose(b.0).pos;
            if c.normal.dot(pb - pa) < 0.0 {
                c.normal = -c.normal;
            }
        }

        // Quantize normals and depths (kill ulp jitter)
        let q = 1.0e-6f32;
        for c in &mut contacts {
            let x = (c.normal.x / q).round() * q;
            let y = (c.normal.y / q).round() * q;
            let z = (c.normal.z / q).round() * q;
            let len = (x * x + y * y + z * z).sqrt();
            c.normal = if len > 1.0e-20 {
                Vec3::new(x / len, y / len, z / len)
            } else {
                Vec3::new(0.0, 1.0, 0.0)
            };
            c.depth = (c.depth / q).round() * q;
        }

        // Solve
        self.schedule.push(StepStage::Solve);
        let contacts_len = contacts.len() as u32;
        if contacts_len > 0 {
            self.solve_contacts(&contacts);

            self.schedule.push(StepStage::UpdateAabbsPost);
            for idx in 0..self.colliders.len() {
                let b = self.colliders[idx].body;
                let shape = self.colliders[idx].shape;
                let pose = self.bodies.pose(b.0);
                self.colliders[idx].aabb = aabb_of(&shape, &pose);
            }
        }

        // Degeneracy guard: never let a non-finite transform propagate.
        for i in 0..(self.bodies.len() as u32) {
            if !self.bodies.is_dynamic(i) { continue; }
            let pose = self.bodies.pose(i);
            let vel = self.bodies.vel(i);
            if pose.pos.is_finite() && pose.rot.is_finite() && vel.lin.is_finite() && vel.ang.is_finite() {
                continue;
            }
            self.ledger.push(LedgerEvent::NanGuard { id: i });
            let pos = Vec3::new(
                if pose.pos.x.is_finite() { pose.pos.x } else { 0.0 },
                if pose.pos.y.is_finite() { pose.pos.y } else { 0.0 },
                if pose.pos.z.is_finite() { pose.pos.z } else { 0.0 },
            );
            let rot = if pose.rot.is_finite() { pose.rot } else { autophys_core::quat_identity() };
            self.bodies.set_pose(i, Isometry { pos, rot });
            self.bodies.set_vel(i, Velocity::default());
        }

        if self.debug.print_every != 0 && (self.tick as u32) % self.debug.print_every == 0 {
            self.print_debug_block(&contacts);
        }
        if self.debug.json_every != 0 && (self.tick as u32) % self.debug.json_every == 0 {
            let _ = self.ledger.write_jsonl("out", self.tick);
        }

        StepStats { pairs_tested: pairs.len() as u32, contacts: contacts_len, wheels_on_ground }
    }

    pub fn step_hash(&self) -> [u8; 32] {
        let mut h = StepHasher::new();
        h.update_bytes(&self.tick.to_le_bytes());
        h.update_bytes(&self.schedule.digest());
        for i in self.bodies.indices() {
            let pose = self.bodies.pose(i);
            let vel = self.bodies.vel(i);
            h.update_bytes(&i.to_le_bytes());
            hash_vec3(&mut h, &pose.pos);
            hash_quat(&mut h, &pose.rot);
            hash_vec3(&mut h, &vel.lin);
            hash_vec3(&mut h, &vel.ang);
        }
        h.finalize()
    }

    /* ---------- Contacts ---------- */
    fn contact_box_box(&self, ci: usize, cj: usize) -> Option<Contact> {
        let a = &self.colliders[ci];
        let b = &self.colliders[cj];
        match (a.shape, b.shape) {
            (Shape::Box { .. }, Shape::Box { .. }) => {}
            _ => return None,
        }
        let aa = a.aabb; let bb = b.aabb;
        if !aa.overlaps(&bb) { return None; }
        let ca = (aa.min + aa.max) * 0.5;
        let cb = (bb.min + bb.max) * 0.5;
        let px = (aa.max.x - bb.min.x).min(bb.max.x - aa.min.x);
        let py = (aa.max.y - bb.min.y).min(bb.max.y - aa.min.y);
        let pz = (aa.max.z - bb.min.z).min(bb.max.z - aa.min.z);
        let (mut normal, depth) = if px <= py && px <= pz {
            let dir = if cb.x > ca.x { 1.0 } else { -1.0 }; (Vec3::new(dir, 0.0, 0.0), px)
        } else if py <= pz {
            let dir = if cb.y > ca.y { 1.0 } else { -1.0 }; (Vec3::new(0.0, dir, 0.0), py)
        } else {
            let dir = if cb.z > ca.z { 1.0 } else { -1.0 }; (Vec3::new(0.0, 0.0, dir), pz)
        };
        if depth <= 0.0 { return None; }
        let n_len = normal.length(); if n_len == 0.0 { return None; }
        normal /= n_len;
        Some(Contact { a_collider: ci, b_collider: cj, normal, depth })
    }

    fn contact_sphere_sphere(&self, ci: usize, cj: usize) -> Option<Contact> {
        let a = &self.colliders[ci];
        let b = &self.colliders[cj];
        let (ra, rb) = match (a.shape, b.shape) {
            (Shape::Sphere { r: r1 }, Shape::Sphere { r: r2 }) => (r1, r2),
            _ => return None,
        };
        let pa = self.bodies.pose(a.body.0).pos;
        let pb = self.bodies.pose(b.body.0).pos;
        let d = pb - pa;
        let dist2 = d.length_squared();
        let rsum = ra + rb;
        if dist2 >= rsum * rsum { return None; }
        let dist = dist2.sqrt();
        let normal = if dist > 1.0e-6 { d / dist } else { Vec3::new(1.0, 0.0, 0.0) };
        let depth = rsum - dist;
        Some(Contact { a_collider: ci, b_collider: cj, normal, depth })
    }

    fn contact_sphere_box(&self, ci: usize, cj: usize) -> Option<Contact> {
        let (si, bi) = match (self.colliders[ci].shape, self.colliders[cj].shape) {
            (Shape::Sphere { .. }, Shape::Box { .. }) => (ci, cj),
            (Shape::Box { .. }, Shape::Sphere { .. }) => (cj, ci),
            _ => return None,
        };
        let s = &self.colliders[si]; let b = &self.colliders[bi];
        let r = match s.shape { Shape::Sphere { r } => r, _ => unreachable!() };
        let ps = self.bodies.pose(s.body.0).pos;
        let bb = b.aabb;
        let q = clamp_vec3(ps, bb.min, bb.max);
        let mut n = ps - q; // box -> sphere
        let dist = n.length(); if dist >= r { return None; }
        if dist > 1.0e-6 { n /= dist; } else { n = Vec3::new(0.0, 1.0, 0.0); }
        let depth = r - dist;
        // n is BOX -> SPHERE; A is the SPHERE, B is the BOX
        let normal = -n;
        Some(Contact { a_collider: si, b_collider: bi, normal, depth })
    }

    /* ---------- Solver (normal + friction) ---------- */
    fn solve_contacts(&mut self, contacts: &[Contact]) {
        let iterations = 12;
        let slop = 0.010;
        let beta = 0.10;

        for _ in 0..iterations {
            for c in contacts {
                let ai = self.colliders[c.a_collider].body.0;
                let bi = self.colliders[c.b_collider].body.0;
                if ai == bi { continue; }

                let inv_a = self.bodies.inv_mass_of(ai);
                let inv_b = self.bodies.inv_mass_of(bi);
                if inv_a + inv_b == 0.0 { continue; }

                // Effective pair properties (order-independent, deterministic)
                let ma = self.colliders[c.a_collider].material;
                let mb = self.colliders[c.b_collider].material;
                let pair = mats::pair_props(ma.id, mb.id);

                let va = self.bodies.vel(ai);
                let vb = self.bodies.vel(bi);
                let n = c.normal;
                let rel_v_n = (vb.lin - va.lin).dot(n);

                // Normal impulse
                let mut jn = 0.0;
                if rel_v_n < 0.0 {
                    jn = -(1.0 + pair.restitution) * rel_v_n / (inv_a + inv_b);
                    let imp_n = n * jn;
                    self.bodies.apply_impulse(ai, -imp_n);
                    self.bodies.apply_impulse(bi, imp_n);
                    self.ledger.push(LedgerEvent::ImpulseN { a: ai, b: bi, jn });
                }

                // Positional correction (split impulse style)
                let corr = (c.depth - slop).max(0.0) * beta;
                if corr > 0.0 {
                    let denom = inv_a + inv_b;
                    let corr_vec = n * (corr / denom);
                    self.bodies.apply_position_delta(ai, -corr_vec * inv_a);
                    self.bodies.apply_position_delta(bi, corr_vec * inv_b);
                    self.ledger.push(LedgerEvent::PosCorr { a: ai, b: bi, corr });
                }

                // Friction (2 tangents)
                if jn > 0.0 || c.depth > slop {
                    let va2 = self.bodies.vel(ai);
                    let vb2 = self.bodies.vel(bi);
                    let vrel = vb2.lin - va2.lin;
                    let v_n = n * vrel.dot(n);
                    let v_t = vrel - v_n;

                    let (t1, t2) = orthonormal_basis(n);
                    let vt1 = v_t.dot(t1);
                    let vt2 = v_t.dot(t2);

                    let denom = inv_a + inv_b;
                    if denom > 0.0 {
                        // desired impulses that would zero tangential velocity
                        let jt1_des = -vt1 / denom;
                        let jt2_des = -vt2 / denom;
                        let jt_des_len = (jt1_des * jt1_des + jt2_des * jt2_des).sqrt();

                        // Speed-dependent kinetic coefficient; static cone from pair.mu_s
                        let vt_mag = v_t.length();
                        let mu_k_eff = mats::mu_dynamic(&pair, vt_mag);
                        let jt_max_static = pair.mu_s * jn;

                        let (jt1, jt2) = if jt_des_len <= jt_max_static || jn == 0.0 {
                            // stick region
                            (jt1_des, jt2_des)
                        } else {
                            // slip region capped by kinetic cone
                            let jt_max_kin = mu_k_eff * jn;
                            let scale = if jt_des_len > 1.0e-9 { jt_max_kin / jt_des_len } else { 0.0 };
                            (jt1_des * scale, jt2_des * scale)
                        };

                        let jt_vec = t1 * jt1 + t2 * jt2;
                        self.bodies.apply_impulse(ai, -jt_vec);
                        self.bodies.apply_impulse(bi, jt_vec);
                        if jt1 != 0.0 || jt2 != 0.0 {
                            self.ledger.push(LedgerEvent::ImpulseT { a: ai, b: bi, jt1, jt2 });
                        }
                    }
                }
            }
        }
    }

    /* ---------- Debug printer ---------- */
    fn print_debug_block(&self, contacts: &[Contact]) {
        println!("--- debug @ tick {} ---", self.tick);

        if self.debug.show_energy {
            let mut ke = 0.0f32;
            for i in 0..(self.bodies.len() as u32) {
                let im = self.bodies.inv_mass_of(i);
                if im > 0.0 {
                    let m = 1.0 / im;
                    let v = self.bodies.vel(i).lin;
                    ke += 0.5 * m * v.length_squared();
                }
            }
            println!("energy: KE_total = {ke:.6}");
        }

        if self.debug.show_bodies {
            let mut lines = 0usize;
            for i in 0..(self.bodies.len() as u32) {
                let p = self.bodies.pose(i).pos;
                let v = self.bodies.vel(i).lin;
                println!("body {:3}  pos=({:+.3},{:+.3},{:+.3})  vel=({:+.3},{:+.3},{:+.3})",
                         i, p.x, p.y, p.z, v.x, v.y, v.z);
                lines += 1; if lines >= self.debug.max_lines { break; }
            }
        }

        if self.debug.show_contacts {
            if contacts.is_empty() {
                println!("contacts: (none)");
            } else {
                let mut shown = 0usize;
                for c in contacts.iter() {
                    println!("contact  cA={} cB={}  n=({:+.3},{:+.3},{:+.3})  depth={:.5}",
                             c.a_collider, c.b_collider, c.normal.x, c.normal.y, c.normal.z, c.depth);
                    shown += 1; if shown >= self.debug.max_lines { break; }
                }
            }
        }
    }
}

/// Highest static box surface under a world XZ position; the wheel contact
/// query. Flat road, so the normal is +Y.
fn probe_ground(ground: &[Aabb], x: Scalar, z: Scalar) -> Option<GroundHit> {
    let mut best: Option<Scalar> = None;
    for a in ground {
        if a.contains_xz(x, z) {
            best = Some(best.map_or(a.max.y, |top: Scalar| top.max(a.max.y)));
        }
    }
    best.map(|y| GroundHit { y, normal: Vec3::Y })
}

/* ---------- helpers ---------- */
#[inline] fn clampf(x: f32, lo: f32, hi: f32) -> f32 { x.max(lo).min(hi) }
#[inline] fn clamp_vec3(p: Vec3, mn: Vec3, mx: Vec3) -> Vec3 {
    Vec3::new(clampf(p.x, mn.x, mx.x), clampf(p.y, mn.y, mx.y), clampf(p.z, mn.z, mx.z))
}
fn orthonormal_basis(n: Vec3) -> (Vec3, Vec3) {
    let ax = n.x.abs(); let ay = n.y.abs(); let az = n.z.abs();
    let base = if ax <= ay && ax <= az { Vec3::new(1.0, 0.0, 0.0) }
    else if ay <= az        { Vec3::new(0.0, 1.0, 0.0) }
    else                    { Vec3::new(0.0, 0.0, 1.0) };
    let t1 = (base.cross(n)).normalize_or_zero();
    let t2 = n.cross(t1);
    (t1, t2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autophys_core::{iso, quat_identity, vec3};
    use autophys_vehicle::{Wheel, WheelParams, FRONT_AXLE, MAX_STEER};

    const DT: Scalar = FIXED_DT;

    fn road_world() -> (World, BodyId) {
        let mut w = WorldBuilder::new().with_capacity(16, 16).build();
        let ground = w.add_body(
            iso(vec3(0.0, -0.5, 0.0), quat_identity()),
            Velocity::default(),
            MassProps::infinite(),
            false,
        );
        w.add_collider(ground, Shape::Box { hx: 7.5, hy: 0.5, hz: 250.0 }, Material::asphalt());
        (w, ground)
    }

    fn car_wheel_params(x: Scalar, z: Scalar) -> WheelParams {
        WheelParams {
            local_pos: vec3(x, -0.4, z),
            axis: vec3(0.0, 1.0, 0.0),
            susp_dir: vec3(0.0, -1.0, 0.0),
            rest_len: 0.3,
            k_spring: 8000.0,
            k_damp: 400.0,
            radius: 0.25,
            mu_long: 0.9,
            mu_lat: 0.9,
            ang_damping: 0.4,
        }
    }

    fn spawn_car(w: &mut World) -> BodyId {
        let chassis = w.add_body(
            iso(vec3(0.0, 0.93, 0.0), quat_identity()),
            Velocity::default(),
            MassProps::from_mass(20.0),
            true,
        );
        w.add_collider(chassis, Shape::Box { hx: 1.0, hy: 0.4, hz: 2.0 }, Material::default());

        let mounts = [(-1.3, 1.4), (1.3, 1.4), (-1.3, -1.4), (1.3, -1.4)];
        let wheels = mounts.map(|(x, z)| {
            let params = car_wheel_params(x, z);
            let body = w.add_body(
                iso(vec3(x, 0.25, z), quat_identity()),
                Velocity::default(),
                MassProps::from_sphere(params.radius, 1100.0),
                true,
            );
            w.add_collider(body, Shape::Sphere { r: params.radius }, Material::rubber());
            w.set_ang_damping(body, params.ang_damping);
            Wheel::new(params, body)
        });
        w.add_vehicle(Vehicle::new(chassis, 20.0, wheels));
        chassis
    }

    #[test] fn static_ground_never_moves() {
        let (mut w, ground) = road_world();
        let before = w.body_pose(ground);
        let _chassis = spawn_car(&mut w);
        for _ in 0..120 {
            w.step(DT);
        }
        let after = w.body_pose(ground);
        assert_eq!(before.pos, after.pos);
        assert_eq!(before.rot, after.rot);
    }

    #[test] fn dropped_chassis_settles_at_half_extent() {
        // Bare chassis, no vehicle: the contact solver alone brings it to
        // rest on the slab.
        let (mut w, _) = road_world();
        let chassis = w.add_body(
            iso(vec3(0.0, 0.6, 0.0), quat_identity()),
            Velocity::default(),
            MassProps::from_mass(20.0),
            true,
        );
        w.add_collider(chassis, Shape::Box { hx: 1.0, hy: 0.4, hz: 2.0 }, Material::default());

        for _ in 0..90 {
            w.step(DT);
        }
        let pose = w.body_pose(chassis);
        let vel = w.body_vel(chassis);
        assert!((pose.pos.y - 0.4).abs() < 0.03, "rest height {}", pose.pos.y);
        assert!(vel.lin.y.abs() < 0.05, "vertical velocity {}", vel.lin.y);
        assert!(pose.pos.x.abs() < 1e-4 && pose.pos.z.abs() < 1e-4);
    }

    #[test] fn identical_runs_hash_identically() {
        let run = || {
            let (mut w, _) = road_world();
            spawn_car(&mut w);
            let mut hashes = Vec::new();
            for step in 0..90 {
                if step == 10 {
                    let v = w.vehicle_mut().unwrap();
                    for i in FRONT_AXLE {
                        v.set_wheel_force(300.0, i);
                        v.set_steering_value(0.2, i);
                    }
                }
                w.step(DT);
                hashes.push(w.step_hash());
            }
            hashes
        };
        assert_eq!(run(), run());
    }

    #[test] fn wheel_force_persists_across_steps() {
        let (mut w, _) = road_world();
        let chassis = spawn_car(&mut w);
        // Let the suspension settle first.
        for _ in 0..60 { w.step(DT); }
        w.vehicle_mut().unwrap().set_wheel_force(300.0, 0);

        let start = w.body_vel(chassis).lin.z;
        let mut prev = start;
        for _ in 0..10 {
            w.step(DT);
            let vz = w.body_vel(chassis).lin.z;
            // Forward speed never drops beyond suspension jitter, and the
            // stored force survives every step untouched.
            assert!(vz > prev - 5e-3, "drive force decayed: {vz} vs {prev}");
            assert_eq!(w.vehicle().unwrap().wheels()[0].force(), 300.0);
            prev = vz;
        }
        assert!(prev - start > 0.2, "no net acceleration: {start} -> {prev}");
    }

    #[test] fn car_settles_with_zero_drive() {
        // The full vehicle at rest: suspension carries the chassis at a
        // stable height with no residual vertical motion or drift.
        let (mut w, _) = road_world();
        let chassis = spawn_car(&mut w);
        for _ in 0..180 { w.step(DT); }

        let pose = w.body_pose(chassis);
        let vel = w.body_vel(chassis);
        // Equilibrium: each spring carries a quarter of the weight,
        // 196.4 N / (4 * 8000 N/m) of compression below ride height.
        assert!((pose.pos.y - 0.944).abs() < 0.02, "rest height {}", pose.pos.y);
        assert!(vel.lin.y.abs() < 0.05, "vertical velocity {}", vel.lin.y);
        assert!(pose.pos.x.abs() < 1e-3 && pose.pos.z.abs() < 1e-3,
                "horizontal drift ({}, {})", pose.pos.x, pose.pos.z);

        // And it stays put.
        let y0 = pose.pos.y;
        for _ in 0..60 { w.step(DT); }
        assert!((w.body_pose(chassis).pos.y - y0).abs() < 0.01);
    }

    #[test] fn released_force_stops_accelerating() {
        let (mut w, _) = road_world();
        let chassis = spawn_car(&mut w);
        for _ in 0..60 { w.step(DT); }
        for i in FRONT_AXLE { w.vehicle_mut().unwrap().set_wheel_force(300.0, i); }
        for _ in 0..30 { w.step(DT); }
        for i in FRONT_AXLE { w.vehicle_mut().unwrap().set_wheel_force(0.0, i); }

        let before = w.body_vel(chassis).lin.z;
        for _ in 0..5 { w.step(DT); }
        let after = w.body_vel(chassis).lin.z;
        assert!((after - before).abs() < 0.01, "residual drive: {before} -> {after}");
    }

    #[test] fn steered_drive_displaces_laterally() {
        let lateral = |steer: Scalar| {
            let (mut w, _) = road_world();
            let chassis = spawn_car(&mut w);
            for _ in 0..60 { w.step(DT); }
            let v = w.vehicle_mut().unwrap();
            for i in FRONT_AXLE {
                v.set_wheel_force(500.0, i);
                v.set_steering_value(steer, i);
            }
            for _ in 0..120 { w.step(DT); }
            w.body_pose(chassis).pos.x
        };
        let left = lateral(MAX_STEER);
        let right = lateral(-MAX_STEER);
        assert!(left > 0.01, "expected +x displacement, got {left}");
        assert!(right < -0.01, "expected -x displacement, got {right}");
    }

    #[test] fn wheels_report_ground_contact() {
        let (mut w, _) = road_world();
        spawn_car(&mut w);
        let stats = w.step(DT);
        assert_eq!(stats.wheels_on_ground, 4);
    }

    #[test]
    #[should_panic]
    fn second_vehicle_rejected() {
        let (mut w, _) = road_world();
        spawn_car(&mut w);
        spawn_car(&mut w);
    }

    #[test] fn non_finite_body_is_guarded() {
        let (mut w, _) = road_world();
        let b = w.add_body(
            iso(vec3(0.0, 5.0, 0.0), quat_identity()),
            Velocity { lin: vec3(f32::NAN, 0.0, 0.0), ang: Vec3::ZERO },
            MassProps::from_mass(1.0),
            true,
        );
        w.step(DT);
        let pose = w.body_pose(b);
        let vel = w.body_vel(b);
        assert!(pose.pos.is_finite());
        assert!(vel.lin.is_finite());
    }
}
