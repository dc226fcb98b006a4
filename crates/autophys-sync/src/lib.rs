//! Keyboard actuation and the per-frame driver.
//!
//! Key events arrive on an mpsc channel and are drained once per frame,
//! before the physics step, so a frame sees a consistent actuation state no
//! matter when the events were produced. After the step, body transforms are
//! copied onto their paired visual nodes. Actuation is persistent: a held key
//! keeps its force applied every step until the release event zeroes it.

use std::sync::mpsc::{self, Receiver, Sender};

use autophys_core::{BodyId, Isometry, Scalar};
use autophys_vehicle::{Vehicle, FRONT_AXLE, MAX_STEER};
use autophys_world::{World, FIXED_DT};

pub use autophys_core::StepStats;

/* ---------------- Keys ---------------- */
/// The fixed key set the demo listens for. Two control axes:
/// throttle (W / ArrowUp forward, S / ArrowDown reverse) and
/// steering (A / ArrowLeft left, D / ArrowRight right).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Key {
    W,
    A,
    S,
    D,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KeyEvent {
    Down(Key),
    Up(Key),
}

/* ---------------- Input controller ---------------- */
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum AxisState {
    Idle,
    Positive,
    Negative,
}

/// Translates key events into persistent force/steer commands on the front
/// axle. Per axis, the last key pressed wins; any release returns the axis
/// to neutral. Repeated key-down while active re-applies the same value.
pub struct InputController {
    rx: Receiver<KeyEvent>,
    throttle: AxisState,
    steering: AxisState,
    max_force: Scalar,
}

impl InputController {
    pub fn new(max_force: Scalar) -> (Sender<KeyEvent>, Self) {
        assert!(max_force > 0.0, "max drive force must be positive, got {max_force}");
        let (tx, rx) = mpsc::channel();
        (
            tx,
            Self { rx, throttle: AxisState::Idle, steering: AxisState::Idle, max_force },
        )
    }

    /// Drain all queued events and apply the resulting actuation state to the
    /// vehicle. Call once per frame, before the physics step.
    pub fn drain(&mut self, vehicle: &mut Vehicle) {
        while let Ok(ev) = self.rx.try_recv() {
            self.handle(ev, vehicle);
        }
    }

    fn handle(&mut self, ev: KeyEvent, vehicle: &mut Vehicle) {
        use Key::*;
        match ev {
            KeyEvent::Down(W) | KeyEvent::Down(ArrowUp) => {
                self.throttle = AxisState::Positive;
                self.apply_throttle(vehicle);
            }
            KeyEvent::Down(S) | KeyEvent::Down(ArrowDown) => {
                self.throttle = AxisState::Negative;
                self.apply_throttle(vehicle);
            }
            KeyEvent::Up(W) | KeyEvent::Up(ArrowUp) | KeyEvent::Up(S) | KeyEvent::Up(ArrowDown) => {
                self.throttle = AxisState::Idle;
                self.apply_throttle(vehicle);
            }
            KeyEvent::Down(A) | KeyEvent::Down(ArrowLeft) => {
                self.steering = AxisState::Positive;
                self.apply_steering(vehicle);
            }
            KeyEvent::Down(D) | KeyEvent::Down(ArrowRight) => {
                self.steering = AxisState::Negative;
                self.apply_steering(vehicle);
            }
            KeyEvent::Up(A) | KeyEvent::Up(ArrowLeft) | KeyEvent::Up(D) | KeyEvent::Up(ArrowRight) => {
                self.steering = AxisState::Idle;
                self.apply_steering(vehicle);
            }
        }
    }

    fn apply_throttle(&self, vehicle: &mut Vehicle) {
        let f = match self.throttle {
            AxisState::Idle => 0.0,
            AxisState::Positive => self.max_force,
            AxisState::Negative => -self.max_force,
        };
        for i in FRONT_AXLE {
            vehicle.set_wheel_force(f, i);
        }
    }

    fn apply_steering(&self, vehicle: &mut Vehicle) {
        let a = match self.steering {
            AxisState::Idle => 0.0,
            AxisState::Positive => MAX_STEER,
            AxisState::Negative => -MAX_STEER,
        };
        for i in FRONT_AXLE {
            vehicle.set_steering_value(a, i);
        }
    }
}

/* ---------------- Sync loop ---------------- */
/// A renderable transform, paired 1:1 with a body. The loop only writes; the
/// node is never authoritative over the physics state.
pub trait VisualNode {
    fn set_transform(&mut self, pose: Isometry);
}

struct Binding<N> {
    body: BodyId,
    node: Option<N>,
}

/// The frame driver: drain input, step the world by the fixed dt, copy
/// transforms. The copy always runs after the step completes, so a node
/// never observes a half-updated body.
pub struct SyncLoop<N: VisualNode> {
    bindings: Vec<Binding<N>>,
}

impl<N: VisualNode> SyncLoop<N> {
    pub fn new() -> Self {
        Self { bindings: Vec::new() }
    }

    /// Reserve a sync slot for a body. The visual node may not exist yet
    /// (asset loads complete asynchronously); until `attach`, the slot is
    /// skipped during the copy.
    pub fn bind(&mut self, body: BodyId) -> usize {
        self.bindings.push(Binding { body, node: None });
        self.bindings.len() - 1
    }

    pub fn attach(&mut self, slot: usize, node: N) {
        assert!(slot < self.bindings.len(), "unknown sync slot {slot}");
        self.bindings[slot].node = Some(node);
    }

    pub fn node(&self, slot: usize) -> Option<&N> {
        self.bindings.get(slot).and_then(|b| b.node.as_ref())
    }

    /// One animation frame: input, step, copy.
    pub fn run_frame(&mut self, world: &mut World, input: &mut InputController) -> StepStats {
        if let Some(vehicle) = world.vehicle_mut() {
            input.drain(vehicle);
        }
        let stats = world.step(FIXED_DT);
        for b in &mut self.bindings {
            if let Some(node) = b.node.as_mut() {
                node.set_transform(world.body_pose(b.body));
            }
        }
        stats
    }
}

impl<N: VisualNode> Default for SyncLoop<N> {
    fn default() -> Self {
        Self::new()
    }
}
