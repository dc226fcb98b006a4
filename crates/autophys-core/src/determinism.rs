#[derive(Copy, Clone, Debug)]
pub struct DeterminismContract {
    pub fixed_dt: f32,
    pub float: &'static str,
    pub fma: bool,
    pub iterations: u32,
    pub stable_sorts: bool,
}

impl DeterminismContract {
    pub fn default_contract() -> Self {
        Self {
            fixed_dt: crate::time::FIXED_DT,
            float: "f32",
            fma: false,
            iterations: 12,
            stable_sorts: true,
        }
    }
}
