//! Four-wheel vehicle actuation.
//!
//! A `Vehicle` owns a chassis body id and exactly four wheel actuators.
//! Wheel drive force and steering angle are *persistent* state: a held key
//! produces continuous acceleration and a released key must explicitly zero
//! the value. Each physics tick the vehicle probes the ground under every
//! wheel mount, derives suspension/tire forces and applies them to the
//! chassis, then re-seats the wheel bodies on their mounts.

mod vehicle;

pub use vehicle::{
    GroundHit, Vehicle, Wheel, WheelContact, WheelParams,
    FRONT_AXLE, MAX_STEER, WHEEL_COUNT,
};
