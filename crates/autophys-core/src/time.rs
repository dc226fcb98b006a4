/// Simulation runs on a constant step, decoupled from render frame timing.
pub const FIXED_DT: f32 = 1.0 / 60.0;

#[derive(Copy, Clone, Debug, Default)]
pub struct StepStats {
    pub pairs_tested: u32,
    pub contacts: u32,
    pub wheels_on_ground: u32,
}
