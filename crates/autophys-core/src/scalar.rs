/// Simulation scalar. The whole engine runs in f32; see `DeterminismContract`.
pub type Scalar = f32;
