use autophys_core::{schedule_digest, StepStage};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Default)]
pub struct ScheduleRecorder { stages: Vec<StepStage> }

impl ScheduleRecorder {
    pub fn new() -> Self { Self { stages: Vec::new() } }
    pub fn push(&mut self, s: StepStage) { self.stages.push(s); }
    pub fn clear(&mut self) { self.stages.clear(); }
    pub fn digest(&self) -> [u8; 32] { schedule_digest(&self.stages) }
}

/// Debug output cadence and verbosity. Zero cadence disables a channel.
#[derive(Copy, Clone, Debug, Default)]
pub struct DebugSettings {
    pub print_every: u32,
    pub json_every: u32,
    pub show_bodies: bool,
    pub show_contacts: bool,
    pub show_energy: bool,
    pub max_lines: usize,
}

/// Per-tick provenance events, dumped as JSONL on the debug cadence.
#[derive(Copy, Clone, Debug, Serialize)]
#[serde(tag = "ev")]
pub enum LedgerEvent {
    Integrate { id: u32, a: [f32; 3], dv: [f32; 3] },
    WheelContact { wheel: u32, compression: f32, f_susp: f32, f_long: f32, f_lat: f32 },
    ImpulseN { a: u32, b: u32, jn: f32 },
    ImpulseT { a: u32, b: u32, jt1: f32, jt2: f32 },
    PosCorr { a: u32, b: u32, corr: f32 },
    NanGuard { id: u32 },
}

/// Bounded event log; cleared every step, drained to disk on demand.
pub struct Ledger {
    events: Vec<LedgerEvent>,
    cap: usize,
}

impl Ledger {
    pub fn new(cap: usize) -> Self {
        Self { events: Vec::with_capacity(cap), cap }
    }
    pub fn push(&mut self, e: LedgerEvent) {
        if self.events.len() < self.cap { self.events.push(e); }
    }
    pub fn clear(&mut self) { self.events.clear(); }
    pub fn iter(&self) -> impl Iterator<Item = &LedgerEvent> { self.events.iter() }
    pub fn len(&self) -> usize { self.events.len() }
    pub fn is_empty(&self) -> bool { self.events.is_empty() }

    /// Append this tick's events to `<dir>/ledger-<tick>.jsonl`.
    pub fn write_jsonl(&self, dir: &str, tick: u64) -> std::io::Result<()> {
        std::fs::create_dir_all(dir)?;
        let path = Path::new(dir).join(format!("ledger-{tick:08}.jsonl"));
        let mut f = std::fs::File::create(path)?;
        for e in &self.events {
            let line = serde_json::to_string(e).map_err(std::io::Error::other)?;
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
