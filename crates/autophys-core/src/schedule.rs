use crate::StepHasher;

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum StepStage {
    Integrate = 1,
    VehicleForces = 2,
    UpdateAabbsPre = 3,
    BroadphaseSap = 4,
    Narrowphase = 5,
    Solve = 6,
    UpdateAabbsPost = 7,
}

pub fn schedule_digest(stages: &[StepStage]) -> [u8; 32] {
    let mut h = StepHasher::new();
    for s in stages { h.update_bytes(&[*s as u8]); }
    h.finalize()
}
